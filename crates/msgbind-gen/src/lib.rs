//! Binding generator engine.
//!
//! Turns a resolved API description into C# glue that sends Objective-C
//! messages: per-type wrapper classes, deduplicated native entry points,
//! callback trampolines and protocol interfaces.
//!
//! ## Modules
//!
//! - [`options`]: Per-run configuration
//! - [`namespace`]: Namespace sets and type-name formatting
//! - [`registry`]: Marshaling rules for handle-backed types
//! - [`abi`]: Struct-return and enum-width decisions per architecture
//! - [`callable`]: Methods and property accessors as one callable shape
//! - [`marshal`]: Native encodings and argument expressions
//! - [`messaging`]: Entry-point synthesis and interning
//! - [`trampoline`]: Callback bridges, memoized by delegate type
//! - [`gather`]: Type contracts including model and protocol members
//! - [`hierarchy`]: Base-type graph and appearance propagation
//! - [`member`]: Visibility and modifier decision table
//! - [`validate`]: Structural checks run before generation
//! - [`emit`]: Text emission for every output unit
//! - [`output`]: Collision-safe output naming and file writing
//! - [`pipeline`]: Whole-run orchestration
//! - [`report`]: Generation report

/// Format and write one line through a [`emit::CodeWriter`].
macro_rules! emit {
    ($w:expr, $($arg:tt)*) => {
        $w.line(&format!($($arg)*))
    };
}

pub mod abi;
pub mod callable;
pub mod context;
pub mod emit;
pub mod error;
pub mod gather;
pub mod hierarchy;
pub mod marshal;
pub mod member;
pub mod messaging;
pub mod namespace;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod trampoline;
pub mod validate;

// Re-export key types for convenience
pub use context::GenContext;
pub use error::{BindingError, Diagnostics, Result, Warning};
pub use options::GeneratorOptions;
pub use pipeline::{generate, generate_files, GenerationOutput};
pub use report::{GeneratedFile, GenerationReport};
pub use validate::validate;
