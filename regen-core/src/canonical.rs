use std::collections::HashMap;

use crate::{Face, Mesh, Position};

// Y-up to Z-up and back.
fn to_z_up(p: &Position) -> Position {
    [p[2], p[0], p[1]]
}

fn to_y_up(p: &Position) -> Position {
    [p[1], p[2], p[0]]
}

/// Rotates a face so its smallest index comes first, keeping the winding.
fn rotate_min_first(face: Face) -> Face {
    let start = (0..3).min_by_key(|&i| face[i]).unwrap_or(0);
    [face[start], face[(start + 1) % 3], face[(start + 2) % 3]]
}

/// Deterministic vertex/face ordering of a quantized mesh.
///
/// Vertices are stably sorted in Z-up space with the last axis as the most
/// significant key; faces are rotated min-index-first and stably sorted by
/// `(1st, 2nd, 3rd)` index. Two meshes with the same vertex and face sets
/// produce identical output. Face indices must be in range (see
/// [`Mesh::validate`]).
pub fn canonicalize(mesh: &Mesh) -> Mesh {
    let z_up: Vec<Position> = mesh.vertices.iter().map(to_z_up).collect();

    let mut order: Vec<usize> = (0..z_up.len()).collect();
    order.sort_by_key(|&i| {
        let p = z_up[i];
        (p[2], p[1], p[0])
    });

    let mut new_index = vec![0u32; order.len()];
    for (new_i, &old_i) in order.iter().enumerate() {
        new_index[old_i] = new_i as u32;
    }

    let mut faces: Vec<Face> = mesh
        .faces
        .iter()
        .map(|f| {
            rotate_min_first([
                new_index[f[0] as usize],
                new_index[f[1] as usize],
                new_index[f[2] as usize],
            ])
        })
        .collect();
    faces.sort();

    let vertices = order.iter().map(|&i| to_y_up(&z_up[i])).collect();
    Mesh { vertices, faces }
}

/// Exact structural equality up to vertex/face enumeration.
///
/// A mesh with an out-of-range face index never compares equal.
pub fn meshes_equal(a: &Mesh, b: &Mesh) -> bool {
    if a.vertex_count() != b.vertex_count() || a.face_count() != b.face_count() {
        return false;
    }
    if a.validate().is_err() || b.validate().is_err() {
        return false;
    }
    canonicalize(a) == canonicalize(b)
}

/// Merges vertices sharing an exact position and drops faces that collapse
/// onto fewer than three distinct vertices. Unreferenced vertices are kept.
pub fn weld(mesh: &Mesh) -> Mesh {
    let mut first_index: HashMap<Position, u32> = HashMap::with_capacity(mesh.vertices.len());
    let mut vertices = Vec::with_capacity(mesh.vertices.len());
    let mut remap = Vec::with_capacity(mesh.vertices.len());

    for &p in &mesh.vertices {
        let idx = *first_index.entry(p).or_insert_with(|| {
            vertices.push(p);
            (vertices.len() - 1) as u32
        });
        remap.push(idx);
    }

    let faces = mesh
        .faces
        .iter()
        .map(|f| [remap[f[0] as usize], remap[f[1] as usize], remap[f[2] as usize]])
        .filter(|f| f[0] != f[1] && f[1] != f[2] && f[2] != f[0])
        .collect();

    Mesh { vertices, faces }
}
