use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashSet};

use glam::DVec3;
use regen_core::{
    CollapseConfig, CollapseRecord, CollapseStats, CollapseStep, MAX_POS_TOKENS, Mesh, Position,
    RegenError, RegenResult,
};

use crate::quadric::{cost, vertex_quadrics};
use crate::soup::{check_manifold, repair};
use crate::topology::{Connectivity, EdgeLink};
use crate::TopologyEngine;

/// Queued edge `(a, b)` with `a < b`. Stale once either endpoint's stamp moves.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    a: u32,
    b: u32,
    keep: u32,
    stamps: (u32, u32),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.a.cmp(&other.a))
            .then(self.b.cmp(&other.b))
    }
}

struct CollapseState {
    conn: Connectivity,
    quadrics: Vec<glam::DMat4>,
    stamps: Vec<u32>,
    constrained: HashSet<(u32, u32)>,
    heap: BinaryHeap<Reverse<Candidate>>,
}

impl CollapseState {
    fn candidate(&self, a: u32, b: u32) -> Candidate {
        let q = self.quadrics[a as usize] + self.quadrics[b as usize];
        let cost_a = cost(&q, self.conn.position(a));
        let cost_b = cost(&q, self.conn.position(b));
        // Ties stay on the first endpoint.
        let (cost, keep) = if cost_a > cost_b { (cost_b, b) } else { (cost_a, a) };
        Candidate {
            cost,
            a,
            b,
            keep,
            stamps: (self.stamps[a as usize], self.stamps[b as usize]),
        }
    }

    fn is_current(&self, c: &Candidate) -> bool {
        self.conn.vertex_alive[c.a as usize]
            && self.conn.vertex_alive[c.b as usize]
            && c.stamps == (self.stamps[c.a as usize], self.stamps[c.b as usize])
    }

    /// Link condition plus the local checks that keep the result a valid
    /// two-manifold with at least one triangle.
    fn collapsible_link(&self, a: u32, b: u32, keep: u32) -> Option<EdgeLink> {
        let conn = &self.conn;
        if conn.alive_vertices <= 3 {
            return None;
        }
        let link = conn.edge_link(a, b)?;
        let apexes: BTreeSet<u32> = link.left.into_iter().chain(link.right).collect();

        let common: BTreeSet<u32> = conn
            .neighbors(a)
            .intersection(&conn.neighbors(b))
            .copied()
            .collect();
        if common != apexes {
            return None;
        }

        let interior = link.left.is_some() && link.right.is_some();
        if interior && conn.is_boundary_vertex(a) && conn.is_boundary_vertex(b) {
            return None;
        }
        if apexes.iter().any(|&v| conn.faces_of(v).count() < 2) {
            return None;
        }

        let remove = if keep == a { b } else { a };
        if self.creates_duplicate_face(keep, remove) || self.flips_normal(keep, remove) {
            return None;
        }
        Some(link)
    }

    /// A closed tetrahedron may fold into a two-sided triangle; anywhere
    /// else a repeated vertex set would leave a non-manifold edge.
    fn creates_duplicate_face(&self, keep: u32, remove: u32) -> bool {
        if self.conn.alive_vertices == 4 {
            return false;
        }
        let existing: HashSet<[u32; 3]> = self
            .conn
            .faces_of(keep)
            .map(|fi| sorted(self.conn.faces[fi]))
            .collect();
        self.conn
            .faces_of(remove)
            .filter(|&fi| !self.conn.faces[fi].contains(&keep))
            .any(|fi| {
                let moved = self.conn.faces[fi].map(|v| if v == remove { keep } else { v });
                existing.contains(&sorted(moved))
            })
    }

    fn flips_normal(&self, keep: u32, remove: u32) -> bool {
        let target = self.conn.position(keep);
        self.conn
            .faces_of(remove)
            .filter(|&fi| !self.conn.faces[fi].contains(&keep))
            .any(|fi| {
                let f = self.conn.faces[fi];
                let before = f.map(|v| self.conn.position(v));
                let after = f.map(|v| if v == remove { target } else { self.conn.position(v) });
                dot(normal(&before), normal(&after)) < 0
            })
    }

    fn push_edges_around(&mut self, v: u32) {
        let mut touched = self.conn.neighbors(v);
        touched.insert(v);
        for &t in &touched {
            self.stamps[t as usize] += 1;
        }

        let mut edges = BTreeSet::new();
        for &t in &touched {
            for n in self.conn.neighbors(t) {
                edges.insert((t.min(n), t.max(n)));
            }
        }
        for (a, b) in edges {
            let c = self.candidate(a, b);
            self.heap.push(Reverse(c));
        }
    }
}

fn sorted(mut f: [u32; 3]) -> [u32; 3] {
    f.sort_unstable();
    f
}

fn normal(p: &[Position; 3]) -> [i64; 3] {
    let d = |i: usize, k: usize| p[i][k] as i64 - p[0][k] as i64;
    let (u, w) = ([d(1, 0), d(1, 1), d(1, 2)], [d(2, 0), d(2, 1), d(2, 2)]);
    [
        u[1] * w[2] - u[2] * w[1],
        u[2] * w[0] - u[0] * w[2],
        u[0] * w[1] - u[1] * w[0],
    ]
}

fn dot(a: [i64; 3], b: [i64; 3]) -> i128 {
    let p = |k: usize| a[k] as i128 * b[k] as i128;
    p(0) + p(1) + p(2)
}

fn to_vec(p: Position) -> DVec3 {
    DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
}

/// Signed dihedral angle in degrees between faces `(a, b, c)` and `(a, b, d)`.
fn approximate_dihedral_angle(a: Position, b: Position, c: Position, d: Position) -> f64 {
    let (a, b, c, d) = (to_vec(a), to_vec(b), to_vec(c), to_vec(d));
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let abad = ab.cross(ad);
    let x = ab.cross(ac).dot(abad);
    let y = ab.length() * ac.dot(abad);
    y.atan2(x).to_degrees()
}

fn detect_sharp_edges(conn: &Connectivity, threshold: f64) -> HashSet<(u32, u32)> {
    let mut constrained = HashSet::new();
    for (a, b) in conn.edges() {
        let Some(link) = conn.edge_link(a, b) else {
            continue;
        };
        let sharp = match (link.left, link.right) {
            (Some(c), Some(d)) => {
                let angle = approximate_dihedral_angle(
                    conn.position(a),
                    conn.position(b),
                    conn.position(c),
                    conn.position(d),
                );
                angle.abs() < threshold
            }
            _ => true,
        };
        if sharp {
            constrained.insert((a, b));
        }
    }
    constrained
}

pub(crate) fn collapse_with_record(
    engine: &TopologyEngine,
    mesh: &Mesh,
    config: &CollapseConfig,
) -> RegenResult<CollapseRecord> {
    if !config.no_placement {
        return Err(RegenError::InvalidConfig(
            "the topology engine only places collapsed vertices on an edge endpoint".into(),
        ));
    }
    mesh.validate()?;
    if let Some(p) = mesh.vertices.iter().find(|p| p.iter().any(|&c| c >= MAX_POS_TOKENS)) {
        return Err(RegenError::InvalidMesh(format!(
            "vertex {:?} lies outside the {} position grid",
            p, MAX_POS_TOKENS
        )));
    }

    let mut cleaned = repair(mesh);
    check_manifold(&mut cleaned, config.strict)?;
    if cleaned.face_count() == 0 {
        return Err(RegenError::Engine("mesh has no valid faces".into()));
    }

    let conn = Connectivity::new(&cleaned);
    let quadrics = vertex_quadrics(&conn, engine.boundary_weight);
    let constrained = if config.sharp_angle_threshold > 0.0 {
        detect_sharp_edges(&conn, config.sharp_angle_threshold)
    } else {
        HashSet::new()
    };

    let mut stats = CollapseStats {
        num_sharp_edges: constrained.len(),
        ..Default::default()
    };
    let mut state = CollapseState {
        stamps: vec![0; conn.positions.len()],
        conn,
        quadrics,
        constrained,
        heap: BinaryHeap::new(),
    };
    for (a, b) in state.conn.edges() {
        let c = state.candidate(a, b);
        state.heap.push(Reverse(c));
        stats.collected += 1;
    }

    let mut steps = Vec::new();
    loop {
        if state.conn.alive_faces <= config.target_faces
            && state.conn.alive_vertices <= config.target_vertices
        {
            break;
        }
        let Some(Reverse(c)) = state.heap.pop() else {
            break;
        };
        if !state.is_current(&c) {
            continue;
        }
        stats.processed += 1;

        let link = if state.constrained.contains(&(c.a, c.b)) {
            None
        } else {
            state.collapsible_link(c.a, c.b, c.keep)
        };
        let Some(link) = link else {
            stats.non_collapsable += 1;
            continue;
        };

        let remove = if c.keep == c.a { c.b } else { c.a };
        let conn = &state.conn;
        let mut step = CollapseStep {
            v_s: conn.position(c.b),
            v_t: conn.position(c.a),
            placement: conn.position(c.keep),
            v_l: link.left.map(|v| conn.position(v)),
            v_r: link.right.map(|v| conn.position(v)),
            snapshot: None,
        };

        state.conn.collapse(c.keep, remove);
        let merged = state.quadrics[remove as usize];
        state.quadrics[c.keep as usize] += merged;
        state.constrained = state
            .constrained
            .iter()
            .map(|&(x, y)| {
                let x = if x == remove { c.keep } else { x };
                let y = if y == remove { c.keep } else { y };
                (x.min(y), x.max(y))
            })
            .filter(|(x, y)| x != y)
            .collect();
        stats.collapsed += 1;

        if config.record_full_info {
            step.snapshot = Some(state.conn.snapshot());
        }
        log::trace!(
            "collapsed {:?} into {:?} ({} vertices left)",
            step.v_t,
            step.v_s,
            state.conn.alive_vertices
        );
        steps.push(step);
        state.push_edges_around(c.keep);
    }

    log::debug!(
        "edge collapse: {} collected, {} processed, {} collapsed, {} rejected",
        stats.collected,
        stats.processed,
        stats.collapsed,
        stats.non_collapsable
    );

    Ok(CollapseRecord { cleaned, steps, stats })
}
