use regen_core::quantize::quantize_mesh;
use regen_core::{
    canonicalize, weld, CollapseConfig, CollapseEngine, Face, Mesh, Position, PositionMap, RegenError,
    RegenResult, VertexSplitOp,
};

use crate::dataset::DatasetRow;

/// A recorded simplification turned into a replayable split sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct CollapseResult {
    /// Most simplified mesh, the decoder's starting point.
    pub base: Mesh,
    /// Splits from `base` back to `full`, indexed into `full.vertices`.
    pub splits: Vec<VertexSplitOp>,
    /// The detailed mesh the engine actually simplified.
    pub full: Mesh,
    /// Ground truth after each split, `split_snapshots[i]` follows `splits[i]`.
    pub split_snapshots: Vec<Mesh>,
}

impl CollapseResult {
    pub fn to_row(&self, uid: impl Into<String>) -> DatasetRow {
        DatasetRow::new(uid, &self.full, &self.base, &self.splits)
    }
}

fn resolve(map: &PositionMap, p: &Position, step: usize, what: &str) -> RegenResult<u32> {
    map.get(p).ok_or_else(|| RegenError::Resolution {
        step,
        what: format!("{} {:?} is not a vertex of the detailed mesh", what, p),
    })
}

/// Runs the engine on an already quantized mesh and converts its collapse
/// record into a base mesh plus split sequence.
///
/// The input is welded and canonicalized first so the engine sees the same
/// mesh however the caller enumerated vertices and faces.
pub fn record_quantized<E>(mesh: &Mesh, engine: &E, config: &CollapseConfig) -> RegenResult<CollapseResult>
where
    E: CollapseEngine + ?Sized,
{
    if !config.record_full_info {
        return Err(RegenError::InvalidConfig(
            "recording needs a snapshot after every collapse".into(),
        ));
    }

    let input = canonicalize(&weld(mesh));
    let record = engine.collapse(&input, config)?;

    let full = record.cleaned;
    let map = full.position_map();

    let mut collapses = Vec::with_capacity(record.steps.len());
    let mut snapshots = Vec::with_capacity(record.steps.len() + 1);
    snapshots.push(full.clone());

    for (step, item) in record.steps.into_iter().enumerate() {
        let mut v_s = resolve(&map, &item.v_s, step, "v_s")?;
        let mut v_t = resolve(&map, &item.v_t, step, "v_t")?;
        let placement = resolve(&map, &item.placement, step, "placement")?;
        let mut v_l = item.v_l.map(|p| resolve(&map, &p, step, "v_l")).transpose()?;
        let mut v_r = item.v_r.map(|p| resolve(&map, &p, step, "v_r")).transpose()?;

        if v_l.is_none() && v_r.is_none() {
            return Err(RegenError::BothLinksAbsent { step });
        }
        // Normalize so the placement is always the surviving vertex.
        if placement == v_t {
            std::mem::swap(&mut v_s, &mut v_t);
            std::mem::swap(&mut v_l, &mut v_r);
        }
        collapses.push(VertexSplitOp { v_s, v_l, v_r, v_t });

        let snapshot = item.snapshot.ok_or_else(|| {
            RegenError::Engine(format!("collapse step {} carries no snapshot", step))
        })?;
        snapshots.push(snapshot);
    }

    collapses.reverse();
    snapshots.reverse();
    let mut snapshots = snapshots.into_iter();
    let base = snapshots.next().unwrap_or_else(|| full.clone());

    Ok(CollapseResult {
        base,
        splits: collapses,
        full,
        split_snapshots: snapshots.collect(),
    })
}

/// Normalizes, quantizes and records a raw mesh.
pub fn quantized_edge_collapse<E>(
    vertices: &[[f64; 3]],
    faces: &[Face],
    num_pos_tokens: u32,
    engine: &E,
    config: &CollapseConfig,
) -> RegenResult<CollapseResult>
where
    E: CollapseEngine + ?Sized,
{
    let mesh = quantize_mesh(vertices, faces, num_pos_tokens)?;
    record_quantized(&mesh, engine, config)
}
