use std::collections::HashMap;

use regen_core::{Mesh, Position, RegenError, RegenResult};

use crate::soup::check_manifold;

fn rejected(msg: impl Into<String>) -> RegenError {
    RegenError::Engine(msg.into())
}

/// Inverse of an edge collapse on an indexed mesh.
///
/// Around `v_s` every incident face `(v_s, a, b)` is a wedge `a -> b`.
/// The wedges running from `v_l` up to `v_r` are handed to the new vertex
/// `v_t`, then `(v_t, v_s, v_l)` and `(v_s, v_t, v_r)` are added. Without
/// `v_r` the run ends at the border; without `v_l` it starts there.
pub(crate) fn vertex_split(
    mesh: &Mesh,
    v_s: u32,
    v_l: Option<u32>,
    v_r: Option<u32>,
    v_t: Position,
) -> RegenResult<Mesh> {
    let n = mesh.vertices.len() as u32;
    if v_s >= n || v_l.is_some_and(|v| v >= n) || v_r.is_some_and(|v| v >= n) {
        return Err(rejected("split index out of range"));
    }
    if v_l == Some(v_s) || v_r == Some(v_s) || (v_l.is_some() && v_l == v_r) {
        return Err(rejected("split vertices must be distinct"));
    }
    if v_l.is_none() && v_r.is_none() {
        return Err(rejected("split needs at least one link vertex"));
    }
    if mesh.vertices.contains(&v_t) {
        return Err(rejected(format!("position {:?} already has a vertex", v_t)));
    }

    let mut result = mesh.clone();
    check_manifold(&mut result, true)?;

    // start -> (face, end) for the fan around v_s
    let mut wedges: HashMap<u32, (usize, u32)> = HashMap::new();
    let mut ends = Vec::new();
    for (fi, f) in result.faces.iter().enumerate() {
        if let Some(i) = f.iter().position(|&v| v == v_s) {
            let (a, b) = (f[(i + 1) % 3], f[(i + 2) % 3]);
            wedges.insert(a, (fi, b));
            ends.push(b);
        }
    }
    let is_neighbor = |v: u32| wedges.contains_key(&v) || ends.contains(&v);
    if v_l.is_some_and(|v| !is_neighbor(v)) {
        return Err(rejected("v_l is not adjacent to v_s"));
    }
    if v_r.is_some_and(|v| !is_neighbor(v)) {
        return Err(rejected("v_r is not adjacent to v_s"));
    }

    let start = match v_l {
        Some(l) => l,
        None => wedges
            .keys()
            .copied()
            .find(|a| !ends.contains(a))
            .ok_or_else(|| rejected("v_s has no border to split from"))?,
    };

    let mut moved = Vec::new();
    let mut current = start;
    while Some(current) != v_r {
        let Some(&(fi, b)) = wedges.get(&current) else {
            if v_r.is_some() {
                return Err(rejected("fan around v_s never reaches v_r"));
            }
            break;
        };
        moved.push(fi);
        current = b;
        if current == start || moved.len() > wedges.len() {
            return Err(rejected("fan around v_s is closed but a link is missing"));
        }
    }

    let t = n;
    result.vertices.push(v_t);
    for fi in moved {
        for v in result.faces[fi].iter_mut() {
            if *v == v_s {
                *v = t;
            }
        }
    }
    if let Some(l) = v_l {
        result.faces.push([t, v_s, l]);
    }
    if let Some(r) = v_r {
        result.faces.push([v_s, t, r]);
    }
    Ok(result)
}
