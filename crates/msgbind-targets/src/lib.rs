//! Architecture and platform models for Objective-C binding generation.
//!
//! A binding is compiled once but runs on several CPU architectures. Each
//! architecture has its own rule for when a value-type return must go
//! through the struct-return (`_stret`) message-send entry point, and its
//! own pointer width.
//!
//! ## Modules
//!
//! - [`arch`]: CPU architectures, pointer widths and struct-return thresholds
//! - [`platform`]: Apple platforms and the architectures they ship on
//! - [`error`]: Parse errors for architecture and platform names

pub mod arch;
pub mod error;
pub mod platform;

// Re-export key types for convenience
pub use arch::{Arch, StretRule};
pub use error::TargetError;
pub use platform::ApplePlatform;
