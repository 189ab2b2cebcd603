use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegenError {
    /// The simplification engine refused the input or an operation.
    #[error("Engine rejected operation: {0}")]
    Engine(String),

    /// A recorded position has no vertex in the current snapshot.
    #[error("Resolution failed at step {step}: {what}")]
    Resolution { step: usize, what: String },

    #[error("Collapse step {step} has neither a left nor a right link vertex")]
    BothLinksAbsent { step: usize },

    #[error("Vertex split {step} was rejected during replay")]
    SplitRejected { step: usize },

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Normalization needs a bounding box with a positive, finite extent.
    #[error("Bounding box is degenerate (zero or non-finite extent)")]
    DegenerateBounds,

    #[error("Malformed token stream: {0}")]
    MalformedTokens(String),
}

pub type RegenResult<T> = Result<T, RegenError>;
