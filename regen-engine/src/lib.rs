mod soup;
mod topology;
mod quadric;
mod collapse;
mod split;

use regen_core::{CollapseConfig, CollapseEngine, CollapseRecord, Mesh, Position, RegenResult, SplitEngine};

/// Reference simplification engine working directly on quantized meshes.
///
/// Collapses follow Garland-Heckbert costs with endpoint-only placement and
/// are reported the way a half-edge engine sees them: `v_t` is the first
/// endpoint of the edge, `v_s` the second, and the placement is whichever
/// endpoint survived.
#[derive(Clone, Copy, Debug)]
pub struct TopologyEngine {
    /// Weight of the border constraint planes (Garland-Heckbert `dm`).
    pub boundary_weight: f64,
}

impl Default for TopologyEngine {
    fn default() -> Self {
        Self { boundary_weight: 100.0 }
    }
}

impl TopologyEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollapseEngine for TopologyEngine {
    fn collapse(&self, mesh: &Mesh, config: &CollapseConfig) -> RegenResult<CollapseRecord> {
        collapse::collapse_with_record(self, mesh, config)
    }
}

impl SplitEngine for TopologyEngine {
    fn split(
        &self,
        mesh: &Mesh,
        v_s: u32,
        v_l: Option<u32>,
        v_r: Option<u32>,
        v_t: Position,
    ) -> RegenResult<Mesh> {
        split::vertex_split(mesh, v_s, v_l, v_r, v_t)
    }
}
