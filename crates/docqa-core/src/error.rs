use thiserror::Error;

/// Every failure the pipeline can surface. Each variant is terminal for the
/// operation in progress: no partial ingest is persisted and no partial
/// answer is returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Ingest failed: {0}")]
    Ingest(String),

    #[error("Embedding provider error: {message}")]
    EmbeddingProvider { message: String },

    #[error("Generation provider error: {message}")]
    GenerationProvider { message: String },

    #[error("Index not initialized: {0}")]
    IndexNotInitialized(String),

    #[error("Dimension mismatch: index has dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt persisted state: {0}")]
    CorruptState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Ingest interrupted after {completed}/{total} chunks")]
    Interrupted { completed: usize, total: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::EmbeddingProvider { message: message.into() }
    }

    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::GenerationProvider { message: message.into() }
    }

    /// Short name of the failure class, for callers that log or display the
    /// kind separately from the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "ingest",
            Self::EmbeddingProvider { .. } => "embedding_provider",
            Self::GenerationProvider { .. } => "generation_provider",
            Self::IndexNotInitialized(_) => "index_not_initialized",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::CorruptState(_) => "corrupt_state",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Interrupted { .. } => "interrupted",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
