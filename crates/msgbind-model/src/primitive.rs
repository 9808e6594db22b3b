//! Builtin scalar types.

use std::fmt;

use msgbind_targets::Arch;
use serde::{Deserialize, Serialize};

/// A scalar type with a fixed native representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Char,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    NInt,
    NUInt,
    NFloat,
    IntPtr,
    UIntPtr,
}

impl Primitive {
    /// Every primitive, in declaration order.
    pub const ALL: [Primitive; 17] = [
        Primitive::Bool,
        Primitive::Char,
        Primitive::SByte,
        Primitive::Byte,
        Primitive::Short,
        Primitive::UShort,
        Primitive::Int,
        Primitive::UInt,
        Primitive::Long,
        Primitive::ULong,
        Primitive::Float,
        Primitive::Double,
        Primitive::NInt,
        Primitive::NUInt,
        Primitive::NFloat,
        Primitive::IntPtr,
        Primitive::UIntPtr,
    ];

    /// The name used when the type is written in generated source.
    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::SByte => "sbyte",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::UShort => "ushort",
            Primitive::Int => "int",
            Primitive::UInt => "uint",
            Primitive::Long => "long",
            Primitive::ULong => "ulong",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::NInt => "nint",
            Primitive::NUInt => "nuint",
            Primitive::NFloat => "nfloat",
            Primitive::IntPtr => "IntPtr",
            Primitive::UIntPtr => "UIntPtr",
        }
    }

    /// The runtime type name (`Int64`, `Double`, `nint`).
    pub fn clr_name(self) -> &'static str {
        match self {
            Primitive::Bool => "Boolean",
            Primitive::Char => "Char",
            Primitive::SByte => "SByte",
            Primitive::Byte => "Byte",
            Primitive::Short => "Int16",
            Primitive::UShort => "UInt16",
            Primitive::Int => "Int32",
            Primitive::UInt => "UInt32",
            Primitive::Long => "Int64",
            Primitive::ULong => "UInt64",
            Primitive::Float => "Single",
            Primitive::Double => "Double",
            Primitive::NInt => "nint",
            Primitive::NUInt => "nuint",
            Primitive::NFloat => "nfloat",
            Primitive::IntPtr => "IntPtr",
            Primitive::UIntPtr => "UIntPtr",
        }
    }

    /// Name used inside synthesized entry-point names.
    ///
    /// A handful of scalars keep their keyword; the rest use the runtime name.
    pub fn signature_name(self) -> &'static str {
        match self {
            Primitive::Int
            | Primitive::Short
            | Primitive::Byte
            | Primitive::Float
            | Primitive::Bool => self.keyword(),
            _ => self.clr_name(),
        }
    }

    /// Parse a keyword, a runtime name or a `System.`-qualified runtime name.
    pub fn from_name(name: &str) -> Option<Primitive> {
        let bare = name.strip_prefix("System.").unwrap_or(name);
        Primitive::ALL
            .into_iter()
            .find(|p| p.keyword() == bare || p.clr_name() == bare)
    }

    /// Native size in bytes on the given architecture.
    pub fn size(self, arch: Arch) -> u64 {
        match self {
            Primitive::Bool | Primitive::SByte | Primitive::Byte => 1,
            // char is UTF-16 on the managed side
            Primitive::Char | Primitive::Short | Primitive::UShort => 2,
            Primitive::Int | Primitive::UInt | Primitive::Float => 4,
            Primitive::Long | Primitive::ULong | Primitive::Double => 8,
            Primitive::NInt
            | Primitive::NUInt
            | Primitive::NFloat
            | Primitive::IntPtr
            | Primitive::UIntPtr => arch.pointer_size(),
        }
    }

    /// Scalars that are passed to the native side unchanged.
    pub fn is_direct_native(self) -> bool {
        matches!(
            self,
            Primitive::Int | Primitive::Long | Primitive::Byte | Primitive::Short
        )
    }

    /// Whether the type is an integer (including native-width integers).
    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            Primitive::Bool | Primitive::Float | Primitive::Double | Primitive::NFloat
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
