use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use regen_core::{
    CollapseConfig, CollapseEngine, Face, Mesh, Position, RegenError, RegenResult, SplitEngine,
    VertexSplitOp,
};

use crate::recorder::{quantized_edge_collapse, CollapseResult};
use crate::tokenize::{tokenize, TokenizerConfig};
use crate::validate::{validate_collapse_sequence, validate_split_sequence};

/// One stored training example. Indices are signed so `-1` can mark an
/// absent link in `vsplit_seq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub uid: String,
    pub vertices: Vec<[i32; 3]>,
    pub faces: Vec<[i32; 3]>,
    pub init_vertices: Vec<[i32; 3]>,
    pub init_faces: Vec<[i32; 3]>,
    pub vsplit_seq: Vec<[i32; 4]>,
}

fn to_signed(rows: &[[u32; 3]]) -> Vec<[i32; 3]> {
    rows.iter().map(|r| r.map(|v| v as i32)).collect()
}

fn to_unsigned(rows: &[[i32; 3]], what: &str) -> RegenResult<Vec<[u32; 3]>> {
    rows.iter()
        .map(|r| {
            if r.iter().any(|&v| v < 0) {
                return Err(RegenError::InvalidMesh(format!("{} row {:?} is negative", what, r)));
            }
            Ok(r.map(|v| v as u32))
        })
        .collect()
}

fn mesh_from_rows(vertices: &[[i32; 3]], faces: &[[i32; 3]]) -> RegenResult<Mesh> {
    let vertices: Vec<Position> = to_unsigned(vertices, "vertex")?;
    let faces: Vec<Face> = to_unsigned(faces, "face")?;
    let mesh = Mesh::new(vertices, faces);
    mesh.validate()?;
    Ok(mesh)
}

impl DatasetRow {
    pub fn new(uid: impl Into<String>, full: &Mesh, base: &Mesh, splits: &[VertexSplitOp]) -> Self {
        Self {
            uid: uid.into(),
            vertices: to_signed(&full.vertices),
            faces: to_signed(&full.faces),
            init_vertices: to_signed(&base.vertices),
            init_faces: to_signed(&base.faces),
            vsplit_seq: splits.iter().map(VertexSplitOp::to_row).collect(),
        }
    }

    pub fn full_mesh(&self) -> RegenResult<Mesh> {
        mesh_from_rows(&self.vertices, &self.faces)
    }

    pub fn base_mesh(&self) -> RegenResult<Mesh> {
        mesh_from_rows(&self.init_vertices, &self.init_faces)
    }

    pub fn splits(&self) -> RegenResult<Vec<VertexSplitOp>> {
        self.vsplit_seq.iter().map(|&row| VertexSplitOp::from_row(row)).collect()
    }

    pub fn tokens(&self, config: &TokenizerConfig) -> RegenResult<Vec<u32>> {
        let full = self.full_mesh()?;
        tokenize(&full.vertices, &self.base_mesh()?, &self.splits()?, config)
    }
}

/// Unquantized input mesh as loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMesh {
    pub uid: String,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub num_pos_tokens: u32,
    /// Replay every recorded sequence forward before keeping it.
    pub validate: bool,
    /// Also run the backward collapse oracle.
    pub validate_collapse: bool,
    pub collapse: CollapseConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            num_pos_tokens: 128,
            validate: true,
            validate_collapse: false,
            collapse: CollapseConfig::default(),
        }
    }
}

fn record<E>(raw: &RawMesh, engine: &E, config: &DatasetConfig) -> RegenResult<CollapseResult>
where
    E: CollapseEngine + SplitEngine + ?Sized,
{
    let result = quantized_edge_collapse(
        &raw.vertices,
        &raw.faces,
        config.num_pos_tokens,
        engine,
        &config.collapse,
    )?;
    if result.splits.is_empty() {
        return Err(RegenError::Engine("mesh is already at the simplification target".into()));
    }
    Ok(result)
}

/// Records, validates and converts one example. Failures are logged and
/// turn into `None`.
pub fn build_row<E>(raw: &RawMesh, engine: &E, config: &DatasetConfig) -> Option<DatasetRow>
where
    E: CollapseEngine + SplitEngine + ?Sized,
{
    let result = match record(raw, engine, config) {
        Ok(result) => result,
        Err(e @ (RegenError::Resolution { .. } | RegenError::BothLinksAbsent { .. })) => {
            log::warn!("{}: inconsistent collapse record: {}", raw.uid, e);
            return None;
        }
        Err(e) => {
            log::debug!("{}: skipped: {}", raw.uid, e);
            return None;
        }
    };

    if config.validate && !validate_split_sequence(&result, engine) {
        log::warn!("{}: split sequence does not replay", raw.uid);
        return None;
    }
    if config.validate_collapse && !validate_collapse_sequence(&result) {
        log::warn!("{}: collapse sequence does not replay", raw.uid);
        return None;
    }
    Some(result.to_row(raw.uid.clone()))
}

/// Builds rows for every raw mesh in parallel, skipping failing examples.
/// Row order follows the input order.
pub fn build_dataset<E>(raws: &[RawMesh], engine: &E, config: &DatasetConfig) -> Vec<DatasetRow>
where
    E: CollapseEngine + SplitEngine + Sync + ?Sized,
{
    let rows: Vec<DatasetRow> = raws
        .par_iter()
        .filter_map(|raw| build_row(raw, engine, config))
        .collect();

    log::info!(
        "built {} rows from {} meshes ({} skipped)",
        rows.len(),
        raws.len(),
        raws.len() - rows.len()
    );
    rows
}
