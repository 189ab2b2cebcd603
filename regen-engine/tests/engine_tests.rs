//! Integration tests for regen-engine.

use regen_core::{
    CollapseConfig, CollapseEngine, CollapseStep, MAX_POS_TOKENS, Mesh, RegenError, SplitEngine,
    meshes_equal,
};
use regen_engine::TopologyEngine;

fn tetrahedron() -> Mesh {
    Mesh::new(
        vec![[0, 0, 0], [127, 0, 0], [0, 127, 0], [0, 0, 127]],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

fn quad() -> Mesh {
    Mesh::new(
        vec![[0, 0, 64], [127, 0, 64], [127, 127, 64], [0, 127, 64]],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

/// Undoes one recorded collapse on its own snapshot.
fn undo(engine: &TopologyEngine, step: &CollapseStep) -> Mesh {
    let snapshot = step.snapshot.as_ref().unwrap();
    let map = snapshot.position_map();
    let (mut s, mut t, mut l, mut r) = (step.v_s, step.v_t, step.v_l, step.v_r);
    if step.placement == t {
        std::mem::swap(&mut s, &mut t);
        std::mem::swap(&mut l, &mut r);
    }
    engine
        .split(
            snapshot,
            map.get(&s).unwrap(),
            l.map(|p| map.get(&p).unwrap()),
            r.map(|p| map.get(&p).unwrap()),
            t,
        )
        .unwrap()
}

// ─── Collapse Tests ───────────────────────────────────────────

#[test]
fn tetrahedron_folds_into_two_sided_triangle() {
    let engine = TopologyEngine::new();
    let record = engine.collapse(&tetrahedron(), &CollapseConfig::default()).unwrap();

    assert_eq!(record.cleaned, tetrahedron());
    assert_eq!(record.steps.len(), 1);
    assert_eq!(record.stats.collapsed, 1);

    let step = &record.steps[0];
    assert!(step.v_l.is_some() && step.v_r.is_some());
    assert!(step.placement == step.v_s || step.placement == step.v_t);

    let base = step.snapshot.as_ref().unwrap();
    assert_eq!(base.vertex_count(), 3);
    assert_eq!(base.face_count(), 2);
    // same corners, opposite winding
    let [a, b, c] = base.faces[0];
    let reversed = [[a, c, b], [c, b, a], [b, a, c]];
    assert!(reversed.contains(&base.faces[1]));
}

#[test]
fn open_quad_collapses_along_its_border() {
    let engine = TopologyEngine::new();
    let record = engine.collapse(&quad(), &CollapseConfig::default()).unwrap();

    assert_eq!(record.steps.len(), 1);
    let step = &record.steps[0];
    assert!(step.v_l.is_some() != step.v_r.is_some());

    let base = step.snapshot.as_ref().unwrap();
    assert_eq!(base.vertex_count(), 3);
    assert_eq!(base.face_count(), 1);
}

#[test]
fn snapshots_are_only_kept_on_request() {
    let engine = TopologyEngine::new();
    let config = CollapseConfig { record_full_info: false, ..Default::default() };
    let record = engine.collapse(&tetrahedron(), &config).unwrap();
    assert!(record.steps.iter().all(|s| s.snapshot.is_none()));
}

#[test]
fn repair_drops_duplicates_and_isolated_points() {
    let mut mesh = tetrahedron();
    mesh.vertices.push([50, 50, 50]);
    mesh.faces.push([2, 1, 0]);
    let record = TopologyEngine::new()
        .collapse(&mesh, &CollapseConfig::default())
        .unwrap();
    assert_eq!(record.cleaned, tetrahedron());
}

#[test]
fn sharp_threshold_locks_every_edge_of_a_tetrahedron() {
    let config = CollapseConfig { sharp_angle_threshold: 179.0, ..Default::default() };
    let record = TopologyEngine::new().collapse(&tetrahedron(), &config).unwrap();
    assert_eq!(record.stats.num_sharp_edges, 6);
    assert!(record.steps.is_empty());
}

#[test]
fn free_placement_is_not_supported() {
    let config = CollapseConfig { no_placement: false, ..Default::default() };
    assert!(matches!(
        TopologyEngine::new().collapse(&tetrahedron(), &config),
        Err(RegenError::InvalidConfig(_))
    ));
}

// ─── Input Validation Tests ───────────────────────────────────

#[test]
fn strict_mode_rejects_inconsistent_winding() {
    let mesh = Mesh::new(quad().vertices, vec![[0, 1, 2], [0, 3, 2]]);
    let engine = TopologyEngine::new();
    assert!(matches!(
        engine.collapse(&mesh, &CollapseConfig::default()),
        Err(RegenError::Engine(_))
    ));

    let lenient = CollapseConfig { strict: false, ..Default::default() };
    let record = engine.collapse(&mesh, &lenient).unwrap();
    assert_eq!(record.cleaned.faces, vec![[0, 1, 2], [0, 2, 3]]);
}

#[test]
fn non_manifold_edge_is_rejected() {
    let mesh = Mesh::new(
        vec![[0, 0, 0], [10, 0, 0], [5, 10, 0], [5, 0, 10], [5, 10, 10]],
        vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]],
    );
    assert!(matches!(
        TopologyEngine::new().collapse(&mesh, &CollapseConfig::default()),
        Err(RegenError::Engine(_))
    ));
}

#[test]
fn out_of_range_faces_are_rejected() {
    let mesh = Mesh::new(vec![[0, 0, 0], [1, 0, 0]], vec![[0, 1, 2]]);
    assert!(matches!(
        TopologyEngine::new().collapse(&mesh, &CollapseConfig::default()),
        Err(RegenError::InvalidMesh(_))
    ));
}

#[test]
fn coordinates_beyond_the_position_grid_are_rejected() {
    let engine = TopologyEngine::new();
    let far = MAX_POS_TOKENS - 1;
    let edge = Mesh::new(
        vec![[0, 0, 0], [far, 0, 0], [0, far, 0], [0, 0, far]],
        tetrahedron().faces,
    );
    assert!(engine.collapse(&edge, &CollapseConfig::default()).is_ok());

    let beyond = Mesh::new(
        vec![[0, 0, 0], [u32::MAX, 0, 0], [0, u32::MAX, 0], [0, 0, u32::MAX]],
        tetrahedron().faces,
    );
    assert!(matches!(
        engine.collapse(&beyond, &CollapseConfig::default()),
        Err(RegenError::InvalidMesh(_))
    ));
}

// ─── Split Tests ──────────────────────────────────────────────

#[test]
fn split_undoes_tetrahedron_collapse() {
    let engine = TopologyEngine::new();
    let record = engine.collapse(&tetrahedron(), &CollapseConfig::default()).unwrap();
    let restored = undo(&engine, &record.steps[0]);
    assert!(meshes_equal(&restored, &tetrahedron()));
}

#[test]
fn split_undoes_border_collapse() {
    let engine = TopologyEngine::new();
    let record = engine.collapse(&quad(), &CollapseConfig::default()).unwrap();
    let restored = undo(&engine, &record.steps[0]);
    assert!(meshes_equal(&restored, &quad()));
}

#[test]
fn split_appends_the_new_vertex() {
    // Fan of vertex 0 on the quad is the open chain 1 -> 2 -> 3.
    let split = TopologyEngine::new()
        .split(&quad(), 0, None, Some(2), [64, 0, 64])
        .unwrap();
    assert_eq!(split.vertex_count(), 5);
    assert_eq!(split.vertices[4], [64, 0, 64]);
    assert_eq!(split.faces, vec![[4, 1, 2], [0, 2, 3], [0, 4, 2]]);
}

#[test]
fn split_rejects_invalid_requests() {
    let engine = TopologyEngine::new();
    let tet = tetrahedron();
    let fresh = [9, 9, 9];

    // no link
    assert!(engine.split(&tet, 0, None, None, fresh).is_err());
    // existing position
    assert!(engine.split(&tet, 0, Some(1), Some(2), [0, 0, 127]).is_err());
    // out of range
    assert!(engine.split(&tet, 7, Some(1), Some(2), fresh).is_err());
    // repeated link
    assert!(engine.split(&tet, 0, Some(1), Some(1), fresh).is_err());
    // closed fan needs both links
    assert!(engine.split(&tet, 0, Some(1), None, fresh).is_err());
    // not adjacent
    assert!(engine.split(&quad(), 1, Some(3), None, fresh).is_err());
}
