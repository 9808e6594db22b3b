//! Binding errors and the warning sink.

use std::fmt;
use std::path::PathBuf;

use msgbind_model::ModelError;

/// A fatal generation error.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// A structural or unsupported-construct error with a stable code.
    #[error("{message}")]
    Binding {
        code: u32,
        message: String,
        /// The type or member the error is about, when known.
        culprit: Option<String>,
    },

    /// Description loading or type resolution failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Writing a generated file failed.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BindingError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        BindingError::Binding {
            code,
            message: message.into(),
            culprit: None,
        }
    }

    /// Attach the offending type or member.
    pub fn with_culprit(self, who: impl Into<String>) -> Self {
        match self {
            BindingError::Binding { code, message, .. } => BindingError::Binding {
                code,
                message,
                culprit: Some(who.into()),
            },
            other => other,
        }
    }

    /// Append context to the message, keeping the code.
    pub fn context(self, suffix: impl fmt::Display) -> Self {
        match self {
            BindingError::Binding {
                code,
                message,
                culprit,
            } => BindingError::Binding {
                code,
                message: format!("{message} {suffix}"),
                culprit,
            },
            other => other,
        }
    }

    /// Stable diagnostic code (printed as `BI{code}`).
    pub fn code(&self) -> u32 {
        match self {
            BindingError::Binding { code, .. } => *code,
            BindingError::Model(e) => e.code(),
            BindingError::Io { .. } => 1070,
        }
    }

    pub fn culprit(&self) -> Option<&str> {
        match self {
            BindingError::Binding { culprit, .. } => culprit.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for generation.
pub type Result<T> = std::result::Result<T, BindingError>;

/// A non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Warning {
    pub code: u32,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning BI{}: {}", self.code, self.message)
    }
}

/// Warnings collected during one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, code: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code = format!("BI{code}"), "{message}");
        self.warnings.push(Warning { code, message });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_culprit() {
        let e = BindingError::new(1038, "conflict").with_culprit("Demo.Widget.foo");
        assert_eq!(e.code(), 1038);
        assert_eq!(e.culprit(), Some("Demo.Widget.foo"));
        assert_eq!(e.to_string(), "conflict");
    }

    #[test]
    fn context_keeps_code() {
        let e = BindingError::new(1017, "Do not know how to make a signature for Foo")
            .context("in method `Bar'");
        assert_eq!(e.code(), 1017);
        assert!(e.to_string().ends_with("in method `Bar'"));
    }

    #[test]
    fn model_errors_keep_their_codes() {
        let e: BindingError = ModelError::UnknownType {
            name: "Nope".into(),
            context: "Demo.Widget".into(),
        }
        .into();
        assert_eq!(e.code(), 1060);
    }

    #[test]
    fn warnings_accumulate() {
        let mut d = Diagnostics::new();
        assert!(d.is_empty());
        d.warn(1103, "Widget has no namespace");
        assert_eq!(d.warnings().len(), 1);
        assert_eq!(d.warnings()[0].to_string(), "warning BI1103: Widget has no namespace");
    }
}
