//! Vertex-split tokenization of quantized triangle meshes.
//!
//! A mesh is simplified by recorded edge collapses; the most simplified mesh
//! and the reversed collapse sequence (a list of vertex splits) become a flat
//! token stream, and replaying the splits restores the detailed mesh exactly.

pub mod recorder;
pub mod tokenize;
pub mod decoder;
pub mod validate;
pub mod dataset;

pub use recorder::{quantized_edge_collapse, record_quantized, CollapseResult};
pub use tokenize::{detokenize, parse_tokens, tokenize, tokenize_mesh, TokenizedMesh, TokenizerConfig};
pub use decoder::Decoder;
pub use validate::{collapse_quantized_mesh, validate_collapse_sequence, validate_split_sequence};
pub use dataset::{build_dataset, build_row, DatasetConfig, DatasetRow, RawMesh};
