use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{RegenError, RegenResult};

/// Quantized vertex position, each axis in `[0, num_pos_tokens - 1]`.
pub type Position = [u32; 3];

/// Three vertex indices, winding significant.
pub type Face = [u32; 3];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Position>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(vertices: Vec<Position>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Checks that every face index points at an existing vertex.
    pub fn validate(&self) -> RegenResult<()> {
        let n = self.vertices.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            if face.iter().any(|&v| v >= n) {
                return Err(RegenError::InvalidMesh(format!(
                    "face {} {:?} references a vertex outside 0..{}",
                    i, face, n
                )));
            }
        }
        Ok(())
    }

    /// Unindexed per-face vertex positions, shared vertices repeated.
    pub fn polygon_soup(&self) -> Vec<[Position; 3]> {
        self.faces
            .iter()
            .map(|f| {
                [
                    self.vertices[f[0] as usize],
                    self.vertices[f[1] as usize],
                    self.vertices[f[2] as usize],
                ]
            })
            .collect()
    }

    pub fn position_map(&self) -> PositionMap {
        PositionMap::new(&self.vertices)
    }
}

/// Exact position -> vertex index lookup for one mesh snapshot.
///
/// When a position occurs more than once the last index wins, which matches
/// building the map by iterating the vertex array in order.
#[derive(Clone, Debug, Default)]
pub struct PositionMap {
    indices: HashMap<Position, u32>,
}

impl PositionMap {
    pub fn new(vertices: &[Position]) -> Self {
        let mut indices = HashMap::with_capacity(vertices.len());
        for (i, &p) in vertices.iter().enumerate() {
            indices.insert(p, i as u32);
        }
        Self { indices }
    }

    pub fn get(&self, position: &Position) -> Option<u32> {
        self.indices.get(position).copied()
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.indices.contains_key(position)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
