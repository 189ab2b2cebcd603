use serde::{Deserialize, Serialize};

use crate::{Position, RegenError, RegenResult};

/// Sentinel for an absent link vertex in exchanged rows.
pub const ABSENT: i32 = -1;

/// One vertex split, indexed into the full detailed vertex array.
///
/// Splitting `v_s` introduces `v_t` and restores the triangles
/// `(v_t, v_s, v_l)` and `(v_s, v_t, v_r)` for whichever links are present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexSplitOp {
    pub v_s: u32,
    pub v_l: Option<u32>,
    pub v_r: Option<u32>,
    pub v_t: u32,
}

impl VertexSplitOp {
    pub fn to_row(&self) -> [i32; 4] {
        let link = |v: Option<u32>| v.map_or(ABSENT, |v| v as i32);
        [self.v_s as i32, link(self.v_l), link(self.v_r), self.v_t as i32]
    }

    pub fn from_row(row: [i32; 4]) -> RegenResult<Self> {
        let index = |v: i32| -> RegenResult<u32> {
            u32::try_from(v).map_err(|_| {
                RegenError::InvalidMesh(format!("vertex split {:?} has a negative index", row))
            })
        };
        let link = |v: i32| -> RegenResult<Option<u32>> {
            if v == ABSENT { Ok(None) } else { index(v).map(Some) }
        };

        let op = Self {
            v_s: index(row[0])?,
            v_l: link(row[1])?,
            v_r: link(row[2])?,
            v_t: index(row[3])?,
        };
        if op.v_l.is_none() && op.v_r.is_none() {
            return Err(RegenError::InvalidMesh(format!(
                "vertex split {:?} has no link vertex",
                row
            )));
        }
        Ok(op)
    }

    /// Looks the op up in the global vertex array.
    pub fn positions(&self, all_vertices: &[Position]) -> RegenResult<SplitPositions> {
        let get = |v: u32| -> RegenResult<Position> {
            all_vertices.get(v as usize).copied().ok_or_else(|| {
                RegenError::InvalidMesh(format!(
                    "vertex split references vertex {} of {}",
                    v,
                    all_vertices.len()
                ))
            })
        };
        Ok(SplitPositions {
            v_s: get(self.v_s)?,
            v_l: self.v_l.map(get).transpose()?,
            v_r: self.v_r.map(get).transpose()?,
            v_t: get(self.v_t)?,
        })
    }
}

/// A vertex split expressed by positions, as carried by the token stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPositions {
    pub v_s: Position,
    pub v_l: Option<Position>,
    pub v_r: Option<Position>,
    pub v_t: Position,
}
