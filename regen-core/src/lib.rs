pub mod error;
pub mod mesh;
pub mod quantize;
pub mod canonical;
pub mod ops;
pub mod engine;

pub use error::{RegenError, RegenResult};
pub use mesh::{Face, Mesh, Position, PositionMap};
pub use quantize::MAX_POS_TOKENS;
pub use canonical::{canonicalize, meshes_equal, weld};
pub use ops::{SplitPositions, VertexSplitOp, ABSENT};
pub use engine::{CollapseConfig, CollapseEngine, CollapseRecord, CollapseStats, CollapseStep, SplitEngine};
