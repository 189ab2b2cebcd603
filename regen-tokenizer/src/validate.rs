use regen_core::{meshes_equal, Mesh, PositionMap, SplitEngine};

use crate::decoder::Decoder;
use crate::recorder::CollapseResult;

/// Merges `v_t` into `v_s` on an indexed mesh.
///
/// The freed slot is filled by the last vertex so indices stay dense, and
/// faces left with a repeated index are dropped.
pub fn collapse_quantized_mesh(mesh: &Mesh, v_s: u32, v_t: u32) -> Mesh {
    let mut vertices = mesh.vertices.clone();
    let last = vertices.len().saturating_sub(1) as u32;

    let faces = mesh
        .faces
        .iter()
        .map(|f| {
            f.map(|v| {
                let v = if v == v_t { v_s } else { v };
                if v == last && v_t != last { v_t } else { v }
            })
        })
        .filter(|f| f[0] != f[1] && f[1] != f[2] && f[2] != f[0])
        .collect();

    if (v_t as usize) < vertices.len() {
        vertices.swap_remove(v_t as usize);
    }
    Mesh { vertices, faces }
}

/// Forward oracle: replays every split from the base mesh and compares each
/// intermediate mesh with the recorded ground truth.
pub fn validate_split_sequence<E>(result: &CollapseResult, engine: &E) -> bool
where
    E: SplitEngine + ?Sized,
{
    if result.splits.len() != result.split_snapshots.len() {
        return false;
    }

    let mut decoder = Decoder::new(engine, result.base.clone());
    for (step, (op, truth)) in result.splits.iter().zip(&result.split_snapshots).enumerate() {
        let Ok(positions) = op.positions(&result.full.vertices) else {
            return false;
        };
        if !decoder.apply(&positions) {
            log::debug!("forward validation: split {} rejected", step);
            return false;
        }
        if !meshes_equal(decoder.mesh(), truth) {
            log::debug!("forward validation: mesh differs after split {}", step);
            return false;
        }
    }
    meshes_equal(decoder.mesh(), &result.full)
}

/// Backward oracle: collapses the detailed mesh op by op with plain index
/// arithmetic, comparing against the recorded ground truth in reverse.
pub fn validate_collapse_sequence(result: &CollapseResult) -> bool {
    if result.splits.len() != result.split_snapshots.len() {
        return false;
    }

    // [full, ..., base] without the leading full mesh
    let truth: Vec<&Mesh> = std::iter::once(&result.base)
        .chain(&result.split_snapshots)
        .rev()
        .skip(1)
        .collect();

    let all_vertices = &result.full.vertices;
    let mut current = result.full.clone();
    for (step, op) in result.splits.iter().rev().enumerate() {
        if op.v_l.is_none() && op.v_r.is_none() {
            return false;
        }
        let (Some(&s), Some(&t)) = (
            all_vertices.get(op.v_s as usize),
            all_vertices.get(op.v_t as usize),
        ) else {
            return false;
        };

        let map = PositionMap::new(&current.vertices);
        let (Some(v_s), Some(v_t)) = (map.get(&s), map.get(&t)) else {
            return false;
        };

        let before = current.vertex_count();
        current = collapse_quantized_mesh(&current, v_s, v_t);
        if current.vertex_count() + 1 != before {
            log::warn!("backward validation: collapse {} did not remove one vertex", step);
            return false;
        }
        if !meshes_equal(&current, truth[step]) {
            log::debug!("backward validation: mesh differs after collapse {}", step);
            return false;
        }
    }
    true
}
