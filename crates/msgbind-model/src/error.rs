//! Model error types.

/// Errors raised while loading a description or resolving types.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A type reference names nothing known to the universe.
    #[error("unknown type '{name}' referenced from {context}")]
    UnknownType { name: String, context: String },

    /// A short type name matches types in several namespaces.
    #[error("ambiguous type '{name}' referenced from {context} (candidates: {})", candidates.join(", "))]
    AmbiguousType {
        name: String,
        context: String,
        candidates: Vec<String>,
    },

    /// A type reference string could not be parsed.
    #[error("invalid type reference '{input}': {detail}")]
    InvalidTypeRef { input: String, detail: String },

    /// The description is structurally invalid.
    #[error("invalid API description: {detail}")]
    InvalidDescription { detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Stable diagnostic code.
    pub fn code(&self) -> u32 {
        match self {
            ModelError::UnknownType { .. } => 1060,
            ModelError::AmbiguousType { .. } => 1061,
            ModelError::InvalidTypeRef { .. } => 1062,
            ModelError::InvalidDescription { .. }
            | ModelError::Toml(_)
            | ModelError::Json(_) => 1064,
            ModelError::Io(_) => 1070,
        }
    }
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
