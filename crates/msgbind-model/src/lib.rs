//! API description model and type universe for Objective-C binding generation.
//!
//! An API description is a structured graph of types and members, loaded
//! from TOML or JSON. The [`TypeUniverse`] combines it with the builtin
//! framework types for a platform and resolves every textual type reference
//! into a semantic [`Ty`].
//!
//! ## Modules
//!
//! - [`primitive`]: Builtin scalar types and their sizes
//! - [`typeref`]: Textual type references (`out NSError`, `string[]`, `Action<NSString>`)
//! - [`descriptor`]: Type, member, enum, struct and delegate descriptors
//! - [`description`]: Loading a complete API description
//! - [`ty`]: Resolved semantic types
//! - [`builtin`]: Framework types known without being described
//! - [`universe`]: Name resolution over described and builtin types
//! - [`layout`]: Native size of value types per architecture

pub mod builtin;
pub mod description;
pub mod descriptor;
pub mod error;
pub mod layout;
pub mod primitive;
pub mod ty;
pub mod typeref;
pub mod universe;

// Re-export key types for convenience
pub use description::ApiDescription;
pub use descriptor::{
    DelegateDescriptor, EnumDescriptor, EventArgsDescriptor, MemberDescriptor, MethodDescriptor,
    ParamDescriptor, PropertyDescriptor, StructDescriptor, TypeDescriptor,
};
pub use error::ModelError;
pub use primitive::Primitive;
pub use ty::{QualName, Ty};
pub use typeref::{RefKind, TypeRef};
pub use universe::TypeUniverse;
