//! Integration tests for regen-core.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use regen_core::quantize::{MAX_POS_TOKENS, dequantize, normalize, quantize, quantize_mesh};
use regen_core::{
    ABSENT, Mesh, PositionMap, RegenError, VertexSplitOp, canonicalize, meshes_equal, weld,
};

fn corner_tetrahedron() -> Mesh {
    Mesh::new(
        vec![[0, 0, 0], [127, 0, 0], [0, 127, 0], [0, 0, 127]],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

/// Shuffles vertices and faces and rotates every face, keeping the mesh.
fn relabel(mesh: &Mesh, seed: u64) -> Mesh {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..mesh.vertices.len()).collect();
    order.shuffle(&mut rng);

    let mut new_index = vec![0u32; order.len()];
    for (new_i, &old_i) in order.iter().enumerate() {
        new_index[old_i] = new_i as u32;
    }
    let vertices = order.iter().map(|&i| mesh.vertices[i]).collect();
    let mut faces: Vec<[u32; 3]> = mesh
        .faces
        .iter()
        .enumerate()
        .map(|(k, f)| {
            let f = f.map(|v| new_index[v as usize]);
            let r = k % 3;
            [f[r], f[(r + 1) % 3], f[(r + 2) % 3]]
        })
        .collect();
    faces.shuffle(&mut rng);
    Mesh::new(vertices, faces)
}

// ─── Quantizer Tests ──────────────────────────────────────────

#[test]
fn normalize_fits_largest_axis_to_bound() {
    let v = normalize(&[[0.0, 0.0, 0.0], [2.0, 1.0, 0.5]], 1.0).unwrap();
    assert_eq!(v[0], [-1.0, -0.5, -0.25]);
    assert_eq!(v[1], [1.0, 0.5, 0.25]);
}

#[test]
fn quantize_covers_full_range() {
    let q = quantize(&[[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]], 128).unwrap();
    assert_eq!(q, vec![[0, 0, 0], [127, 127, 127], [64, 64, 64]]);
}

#[test]
fn quantize_clamps_out_of_range() {
    let q = quantize(&[[-3.0, 0.99999, 5.0]], 16).unwrap();
    assert_eq!(q, vec![[0, 15, 15]]);
}

#[test]
fn quantize_stays_on_the_grid_for_any_resolution() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut points: Vec<[f64; 3]> = (0..500)
        .map(|_| {
            let mut p = [0.0; 3];
            for c in p.iter_mut() {
                *c = rng.gen_range(-1.5..1.5);
            }
            p
        })
        .collect();
    points.push([-1.0, 1.0, 0.0]);
    points.push([f64::NAN, f64::INFINITY, f64::NEG_INFINITY]);

    for n in [1, 2, 3, 16, 127, 128, 1024, MAX_POS_TOKENS] {
        let q = quantize(&points, n).unwrap();
        assert_eq!(q.len(), points.len());
        assert!(q.iter().flatten().all(|&c| c < n), "n = {}", n);
        if n == 1 {
            assert!(q.iter().flatten().all(|&c| c == 0));
        }
    }
}

#[test]
fn dequantize_stays_within_one_bin() {
    let mut rng = StdRng::seed_from_u64(3);
    let points: Vec<[f64; 3]> = (0..200)
        .map(|_| {
            let mut p = [0.0; 3];
            for c in p.iter_mut() {
                *c = rng.gen_range(-1.0..1.0);
            }
            p
        })
        .collect();
    let n = 64;
    let back = dequantize(&quantize(&points, n).unwrap(), n);
    for (p, b) in points.iter().zip(&back) {
        for k in 0..3 {
            assert!((p[k] - b[k]).abs() <= 1.0 / n as f64 + 1e-12);
        }
    }
}

#[test]
fn degenerate_bounds_are_rejected() {
    assert!(matches!(normalize(&[], 1.0), Err(RegenError::DegenerateBounds)));
    assert!(matches!(
        normalize(&[[1.0, 2.0, 3.0], [1.0, 2.0, 3.0]], 1.0),
        Err(RegenError::DegenerateBounds)
    ));
    assert!(matches!(
        normalize(&[[0.0, 0.0, 0.0], [f64::INFINITY, 0.0, 0.0]], 1.0),
        Err(RegenError::DegenerateBounds)
    ));
}

#[test]
fn zero_tokens_is_invalid_config() {
    assert!(matches!(
        quantize(&[[0.0, 0.0, 0.0]], 0),
        Err(RegenError::InvalidConfig(_))
    ));
}

#[test]
fn oversized_grid_is_invalid_config() {
    assert!(quantize(&[[0.0, 0.0, 0.0]], MAX_POS_TOKENS).is_ok());
    assert!(matches!(
        quantize(&[[0.0, 0.0, 0.0]], MAX_POS_TOKENS + 1),
        Err(RegenError::InvalidConfig(_))
    ));
    assert!(matches!(
        quantize_mesh(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], &[], u32::MAX),
        Err(RegenError::InvalidConfig(_))
    ));
}

#[test]
fn quantize_mesh_checks_face_indices() {
    let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let mesh = quantize_mesh(&vertices, &[[0, 1, 2]], 128).unwrap();
    assert_eq!(mesh.vertices, vec![[0, 0, 64], [127, 0, 64], [0, 127, 64]]);
    assert!(matches!(
        quantize_mesh(&vertices, &[[0, 1, 3]], 128),
        Err(RegenError::InvalidMesh(_))
    ));
}

// ─── Canonicalizer Tests ──────────────────────────────────────

#[test]
fn canonical_order_uses_y_then_x_then_z() {
    let mesh = Mesh::new(vec![[1, 0, 0], [0, 1, 0], [0, 0, 1]], vec![[0, 1, 2]]);
    let c = canonicalize(&mesh);
    assert_eq!(c.vertices, vec![[0, 0, 1], [1, 0, 0], [0, 1, 0]]);
    assert_eq!(c.faces, vec![[0, 1, 2]]);
}

#[test]
fn canonical_faces_start_at_min_index_and_keep_winding() {
    let mesh = Mesh::new(
        vec![[0, 0, 0], [1, 0, 0], [2, 0, 0], [3, 0, 0]],
        vec![[3, 2, 1], [2, 0, 3]],
    );
    let c = canonicalize(&mesh);
    assert_eq!(c.faces, vec![[0, 3, 2], [1, 3, 2]]);
}

#[test]
fn canonicalize_is_idempotent() {
    let c = canonicalize(&corner_tetrahedron());
    assert_eq!(canonicalize(&c), c);
}

#[test]
fn canonical_form_ignores_enumeration() {
    let mesh = corner_tetrahedron();
    let expected = canonicalize(&mesh);
    for seed in 0..8 {
        assert_eq!(canonicalize(&relabel(&mesh, seed)), expected);
    }
}

#[test]
fn meshes_equal_respects_winding() {
    let mesh = corner_tetrahedron();
    assert!(meshes_equal(&mesh, &relabel(&mesh, 11)));

    let mut flipped = mesh.clone();
    flipped.faces[0].swap(1, 2);
    assert!(!meshes_equal(&mesh, &flipped));

    let mut shorter = mesh.clone();
    shorter.faces.pop();
    assert!(!meshes_equal(&mesh, &shorter));
}

#[test]
fn meshes_with_out_of_range_faces_are_never_equal() {
    let mesh = corner_tetrahedron();
    let mut broken = mesh.clone();
    broken.faces[0] = [0, 1, 999];
    assert!(!meshes_equal(&mesh, &broken));
    assert!(!meshes_equal(&broken, &mesh));
    assert!(!meshes_equal(&broken, &broken));
}

#[test]
fn weld_merges_duplicates_and_drops_degenerate_faces() {
    let mesh = Mesh::new(
        vec![[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 0, 0], [5, 5, 5]],
        vec![[0, 1, 2], [2, 3, 0], [0, 1, 3]],
    );
    let w = weld(&mesh);
    assert_eq!(w.vertices, vec![[0, 0, 0], [1, 0, 0], [0, 1, 0], [5, 5, 5]]);
    assert_eq!(w.faces, vec![[0, 1, 2], [2, 1, 0]]);
}

// ─── Mesh & Ops Tests ─────────────────────────────────────────

#[test]
fn validate_rejects_out_of_range_faces() {
    let mesh = Mesh::new(vec![[0, 0, 0], [1, 0, 0]], vec![[0, 1, 2]]);
    assert!(matches!(mesh.validate(), Err(RegenError::InvalidMesh(_))));
    assert!(corner_tetrahedron().validate().is_ok());
}

#[test]
fn polygon_soup_repeats_shared_vertices() {
    let soup = corner_tetrahedron().polygon_soup();
    assert_eq!(soup.len(), 4);
    assert_eq!(soup[0], [[0, 0, 0], [0, 127, 0], [127, 0, 0]]);
}

#[test]
fn position_map_keeps_last_index() {
    let map = PositionMap::new(&[[1, 1, 1], [2, 2, 2], [1, 1, 1]]);
    assert_eq!(map.get(&[1, 1, 1]), Some(2));
    assert_eq!(map.get(&[2, 2, 2]), Some(1));
    assert!(!map.contains(&[3, 3, 3]));
    assert_eq!(map.len(), 2);
}

#[test]
fn split_op_rows_use_absent_sentinel() {
    let op = VertexSplitOp { v_s: 3, v_l: None, v_r: Some(1), v_t: 7 };
    assert_eq!(op.to_row(), [3, ABSENT, 1, 7]);
    assert_eq!(VertexSplitOp::from_row([3, ABSENT, 1, 7]).unwrap(), op);
}

#[test]
fn split_op_rows_reject_bad_indices() {
    assert!(VertexSplitOp::from_row([0, ABSENT, ABSENT, 1]).is_err());
    assert!(VertexSplitOp::from_row([-2, 1, 2, 3]).is_err());
    assert!(VertexSplitOp::from_row([0, 1, 2, -5]).is_err());
}

#[test]
fn split_op_positions_resolve_against_global_vertices() {
    let vertices = corner_tetrahedron().vertices;
    let op = VertexSplitOp { v_s: 0, v_l: Some(1), v_r: None, v_t: 3 };
    let p = op.positions(&vertices).unwrap();
    assert_eq!(p.v_s, [0, 0, 0]);
    assert_eq!(p.v_l, Some([127, 0, 0]));
    assert_eq!(p.v_r, None);
    assert_eq!(p.v_t, [0, 0, 127]);

    let bad = VertexSplitOp { v_s: 9, ..op };
    assert!(matches!(bad.positions(&vertices), Err(RegenError::InvalidMesh(_))));
}
