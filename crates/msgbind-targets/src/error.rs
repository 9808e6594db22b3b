//! Error types for target operations.

/// Errors that can occur while resolving targets.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// An architecture name did not match any known architecture.
    #[error("unknown architecture '{name}'")]
    UnknownArch {
        /// The name that failed to parse.
        name: String,
    },

    /// A platform name did not match any known platform.
    #[error("unknown platform '{name}' (expected ios, tvos, watchos or macos)")]
    UnknownPlatform {
        /// The name that failed to parse.
        name: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
