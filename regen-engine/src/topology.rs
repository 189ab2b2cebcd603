//! Editable face-list connectivity used by the collapse loop.

use std::collections::BTreeSet;

use regen_core::{Face, Mesh, Position};

use crate::soup::has_directed;

/// Third vertex of `face` when `a` and `b` are two of its corners.
pub(crate) fn apex(face: &Face, a: u32, b: u32) -> u32 {
    face.iter().copied().find(|&v| v != a && v != b).unwrap_or(a)
}

/// Faces around a candidate edge `a -> b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeLink {
    /// Apex of the face containing the directed edge `a -> b`.
    pub left: Option<u32>,
    /// Apex of the face containing the directed edge `b -> a`.
    pub right: Option<u32>,
}

pub(crate) struct Connectivity {
    pub positions: Vec<Position>,
    pub faces: Vec<Face>,
    pub face_alive: Vec<bool>,
    pub vertex_faces: Vec<Vec<usize>>,
    pub vertex_alive: Vec<bool>,
    pub alive_vertices: usize,
    pub alive_faces: usize,
}

impl Connectivity {
    pub fn new(mesh: &Mesh) -> Self {
        let mut vertex_faces = vec![Vec::new(); mesh.vertices.len()];
        for (fi, f) in mesh.faces.iter().enumerate() {
            for &v in f {
                vertex_faces[v as usize].push(fi);
            }
        }
        Self {
            positions: mesh.vertices.clone(),
            faces: mesh.faces.clone(),
            face_alive: vec![true; mesh.faces.len()],
            vertex_faces,
            vertex_alive: vec![true; mesh.vertices.len()],
            alive_vertices: mesh.vertices.len(),
            alive_faces: mesh.faces.len(),
        }
    }

    pub fn position(&self, v: u32) -> Position {
        self.positions[v as usize]
    }

    pub fn faces_of(&self, v: u32) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .copied()
            .filter(|&fi| self.face_alive[fi])
    }

    pub fn neighbors(&self, v: u32) -> BTreeSet<u32> {
        self.faces_of(v)
            .flat_map(|fi| self.faces[fi])
            .filter(|&n| n != v)
            .collect()
    }

    pub fn edge_faces(&self, a: u32, b: u32) -> Vec<usize> {
        self.faces_of(a)
            .filter(|&fi| self.faces[fi].contains(&b))
            .collect()
    }

    pub fn is_boundary_vertex(&self, v: u32) -> bool {
        self.neighbors(v)
            .into_iter()
            .any(|n| self.edge_faces(v, n).len() == 1)
    }

    /// Every live undirected edge as `(min, max)`, sorted.
    pub fn edges(&self) -> BTreeSet<(u32, u32)> {
        let mut edges = BTreeSet::new();
        for (fi, f) in self.faces.iter().enumerate() {
            if !self.face_alive[fi] {
                continue;
            }
            for i in 0..3 {
                let (a, b) = (f[i], f[(i + 1) % 3]);
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges
    }

    /// Left/right apexes of edge `a -> b`, `None` unless the edge carries one
    /// or two consistently wound faces.
    pub fn edge_link(&self, a: u32, b: u32) -> Option<EdgeLink> {
        let faces = self.edge_faces(a, b);
        if faces.is_empty() || faces.len() > 2 {
            return None;
        }
        let mut link = EdgeLink { left: None, right: None };
        for fi in faces {
            let f = &self.faces[fi];
            let slot = if has_directed(f, a, b) { &mut link.left } else { &mut link.right };
            if slot.is_some() {
                return None;
            }
            *slot = Some(apex(f, a, b));
        }
        Some(link)
    }

    /// Merges `remove` into `keep`, dropping the faces they share.
    pub fn collapse(&mut self, keep: u32, remove: u32) {
        let removed_faces: Vec<usize> = self.faces_of(remove).collect();
        for fi in removed_faces {
            if self.faces[fi].contains(&keep) {
                self.face_alive[fi] = false;
                self.alive_faces -= 1;
            } else {
                for v in self.faces[fi].iter_mut() {
                    if *v == remove {
                        *v = keep;
                    }
                }
                self.vertex_faces[keep as usize].push(fi);
            }
        }
        self.vertex_faces[remove as usize].clear();
        self.vertex_alive[remove as usize] = false;
        self.alive_vertices -= 1;
        self.vertex_faces[keep as usize].retain(|&fi| self.face_alive[fi]);
    }

    /// Compacts the live part into a standalone mesh, preserving index order.
    pub fn snapshot(&self) -> Mesh {
        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut vertices = Vec::with_capacity(self.alive_vertices);
        for (i, &p) in self.positions.iter().enumerate() {
            if self.vertex_alive[i] {
                remap[i] = vertices.len() as u32;
                vertices.push(p);
            }
        }
        let faces = self
            .faces
            .iter()
            .zip(&self.face_alive)
            .filter(|(_, alive)| **alive)
            .map(|(f, _)| [remap[f[0] as usize], remap[f[1] as usize], remap[f[2] as usize]])
            .collect();
        Mesh { vertices, faces }
    }
}
