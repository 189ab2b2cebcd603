use serde::{Deserialize, Serialize};

use crate::{Mesh, Position, RegenResult};

/// Options passed to a [`CollapseEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseConfig {
    /// Stop once the mesh has at most this many vertices...
    pub target_vertices: usize,
    /// ...and at most this many faces.
    pub target_faces: usize,
    /// The collapsed vertex must land on one of the edge endpoints.
    pub no_placement: bool,
    /// Dihedral angle in degrees below which edges are locked.
    /// Any value `<= 0` disables sharp-edge detection.
    pub sharp_angle_threshold: f64,
    /// Reject inputs that need guessing (e.g. inconsistent winding)
    /// instead of repairing them.
    pub strict: bool,
    /// Record a full mesh snapshot after every collapse.
    pub record_full_info: bool,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            target_vertices: 3,
            target_faces: 1,
            no_placement: true,
            sharp_angle_threshold: -1.0,
            strict: true,
            record_full_info: true,
        }
    }
}

/// One recorded collapse: `v_t` merges into `v_s` and the triangles
/// `(v_t, v_s, v_l)` / `(v_s, v_t, v_r)` disappear.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapseStep {
    pub v_s: Position,
    pub v_t: Position,
    /// Where the merged vertex ended up.
    pub placement: Position,
    pub v_l: Option<Position>,
    pub v_r: Option<Position>,
    /// Mesh right after this collapse, when full recording is enabled.
    pub snapshot: Option<Mesh>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseStats {
    pub collected: usize,
    pub processed: usize,
    pub collapsed: usize,
    pub non_collapsable: usize,
    pub num_sharp_edges: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollapseRecord {
    /// The repaired input mesh every step position refers to.
    pub cleaned: Mesh,
    pub steps: Vec<CollapseStep>,
    pub stats: CollapseStats,
}

pub trait CollapseEngine {
    /// Simplify `mesh` by successive edge collapses, recording every step.
    /// An input the engine cannot handle consistently is an error.
    fn collapse(&self, mesh: &Mesh, config: &CollapseConfig) -> RegenResult<CollapseRecord>;
}

pub trait SplitEngine {
    /// Insert one vertex at `v_t` by splitting `v_s` along its links.
    /// Indices refer to `mesh`; at least one link must be present.
    fn split(
        &self,
        mesh: &Mesh,
        v_s: u32,
        v_l: Option<u32>,
        v_r: Option<u32>,
        v_t: Position,
    ) -> RegenResult<Mesh>;
}
