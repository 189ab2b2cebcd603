//! Polygon soup repair and manifold checks run before any topological edit.

use std::collections::{HashMap, HashSet, VecDeque};

use regen_core::{weld, Face, Mesh, RegenError, RegenResult};

pub(crate) fn has_directed(face: &Face, a: u32, b: u32) -> bool {
    (0..3).any(|i| face[i] == a && face[(i + 1) % 3] == b)
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Merges duplicate points, drops degenerate and duplicate faces and
/// removes points no face references.
pub(crate) fn repair(mesh: &Mesh) -> Mesh {
    let welded = weld(mesh);

    let mut seen = HashSet::with_capacity(welded.faces.len());
    let faces: Vec<Face> = welded
        .faces
        .into_iter()
        .filter(|f| {
            let mut key = *f;
            key.sort_unstable();
            seen.insert(key)
        })
        .collect();

    let mut referenced = vec![false; welded.vertices.len()];
    for f in &faces {
        for &v in f {
            referenced[v as usize] = true;
        }
    }

    let mut remap = vec![u32::MAX; welded.vertices.len()];
    let mut vertices = Vec::with_capacity(welded.vertices.len());
    for (i, p) in welded.vertices.iter().enumerate() {
        if referenced[i] {
            remap[i] = vertices.len() as u32;
            vertices.push(*p);
        }
    }

    let faces = faces
        .iter()
        .map(|f| [remap[f[0] as usize], remap[f[1] as usize], remap[f[2] as usize]])
        .collect();
    Mesh { vertices, faces }
}

/// Makes the winding consistent across every edge.
///
/// In strict mode any inconsistency is an error; otherwise faces are
/// flipped by flood fill from the first face of each component.
pub(crate) fn orient(faces: &mut [Face], strict: bool) -> RegenResult<()> {
    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::with_capacity(faces.len() * 3 / 2);
    for (fi, f) in faces.iter().enumerate() {
        for i in 0..3 {
            edge_faces.entry(edge_key(f[i], f[(i + 1) % 3])).or_default().push(fi);
        }
    }
    if let Some((edge, list)) = edge_faces.iter().find(|(_, list)| list.len() > 2) {
        return Err(RegenError::Engine(format!(
            "non-manifold edge {:?} shared by {} faces",
            edge,
            list.len()
        )));
    }

    let mut visited = vec![false; faces.len()];
    let mut queue = VecDeque::new();
    for seed in 0..faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(fi) = queue.pop_front() {
            let f = faces[fi];
            for i in 0..3 {
                let (a, b) = (f[i], f[(i + 1) % 3]);
                for &gi in &edge_faces[&edge_key(a, b)] {
                    if gi == fi {
                        continue;
                    }
                    let agrees = has_directed(&faces[gi], b, a);
                    if visited[gi] {
                        if !agrees {
                            return Err(RegenError::Engine("mesh is not orientable".into()));
                        }
                        continue;
                    }
                    if !agrees {
                        if strict {
                            return Err(RegenError::Engine(format!(
                                "faces {} and {} disagree on winding",
                                fi, gi
                            )));
                        }
                        faces[gi].swap(1, 2);
                    }
                    visited[gi] = true;
                    queue.push_back(gi);
                }
            }
        }
    }
    Ok(())
}

/// Every vertex fan must be a single open chain or a single cycle.
pub(crate) fn check_vertex_fans(mesh: &Mesh) -> RegenResult<()> {
    let mut wedges: Vec<Vec<(u32, u32)>> = vec![Vec::new(); mesh.vertices.len()];
    for f in &mesh.faces {
        for i in 0..3 {
            wedges[f[i] as usize].push((f[(i + 1) % 3], f[(i + 2) % 3]));
        }
    }

    for (v, fan) in wedges.iter().enumerate() {
        if fan.is_empty() {
            continue;
        }
        let next: HashMap<u32, u32> = fan.iter().copied().collect();
        if next.len() != fan.len() {
            return Err(RegenError::Engine(format!("vertex {} has a folded fan", v)));
        }
        let ends: HashSet<u32> = fan.iter().map(|w| w.1).collect();
        let starts: Vec<u32> = fan.iter().map(|w| w.0).filter(|a| !ends.contains(a)).collect();
        if starts.len() > 1 {
            return Err(RegenError::Engine(format!("vertex {} is a non-manifold pinch", v)));
        }

        let first = starts.first().copied().unwrap_or(fan[0].0);
        let mut current = first;
        let mut steps = 0;
        while let Some(&b) = next.get(&current) {
            steps += 1;
            current = b;
            if current == first || steps > fan.len() {
                break;
            }
        }
        if steps != fan.len() {
            return Err(RegenError::Engine(format!("vertex {} has a split fan", v)));
        }
    }
    Ok(())
}

/// Structural checks shared by collapse and split inputs.
pub(crate) fn check_manifold(mesh: &mut Mesh, strict: bool) -> RegenResult<()> {
    mesh.validate()?;
    orient(&mut mesh.faces, strict)?;
    check_vertex_fans(mesh)
}
