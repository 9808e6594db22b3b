//! Resolved semantic types.

use std::fmt;

use crate::primitive::Primitive;
use crate::typeref::RefKind;

/// A namespace-qualified type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualName {
    pub namespace: Option<String>,
    pub name: String,
}

impl QualName {
    pub fn new(namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
        }
    }

    /// Split `A.B.C` into namespace `A.B` and name `C`.
    pub fn parse(full: &str) -> Self {
        match full.rsplit_once('.') {
            Some((ns, name)) => Self::new(Some(ns), name),
            None => Self::new(None, full),
        }
    }

    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A type after name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Void,
    Primitive(Primitive),
    String,
    /// An NSObject-derived wrapper class.
    Class(QualName),
    /// A protocol interface (`IFoo`); `name` holds the interface name.
    Protocol(QualName),
    /// A handle-backed type that is not an NSObject.
    NativeObject(QualName),
    DictionaryContainer(QualName),
    Struct(QualName),
    Enum(QualName),
    Delegate { name: QualName, args: Vec<Ty> },
    GenericParam(String),
    /// A managed type with no native representation.
    Opaque(QualName),
    Array(Box<Ty>),
    ByRef { kind: RefKind, elem: Box<Ty> },
}

impl Ty {
    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Void)
    }

    /// NSObject subclasses and protocol interfaces.
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Ty::Class(_) | Ty::Protocol(_))
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self, Ty::Primitive(_) | Ty::Struct(_) | Ty::Enum(_))
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self, Ty::ByRef { .. })
    }

    pub fn is_delegate(&self) -> bool {
        matches!(self, Ty::Delegate { .. })
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Ty::String)
    }

    /// Element type of an array.
    pub fn element(&self) -> Option<&Ty> {
        match self {
            Ty::Array(e) => Some(e),
            _ => None,
        }
    }

    /// Target of a by-reference type.
    pub fn referent(&self) -> Option<(RefKind, &Ty)> {
        match self {
            Ty::ByRef { kind, elem } => Some((*kind, elem)),
            _ => None,
        }
    }

    /// The qualified name of a named type.
    pub fn qual_name(&self) -> Option<&QualName> {
        match self {
            Ty::Class(q)
            | Ty::Protocol(q)
            | Ty::NativeObject(q)
            | Ty::DictionaryContainer(q)
            | Ty::Struct(q)
            | Ty::Enum(q)
            | Ty::Opaque(q) => Some(q),
            Ty::Delegate { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Full name used for registry lookups and diagnostics.
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => f.write_str("void"),
            Ty::Primitive(p) => write!(f, "{}", p.keyword()),
            Ty::String => f.write_str("string"),
            Ty::GenericParam(n) => f.write_str(n),
            Ty::Array(e) => write!(f, "{e}[]"),
            Ty::ByRef { kind, elem } => write!(f, "{} {elem}", kind.keyword()),
            Ty::Delegate { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    let parts: Vec<String> = args.iter().map(Ty::to_string).collect();
                    write!(f, "<{}>", parts.join(", "))?;
                }
                Ok(())
            }
            Ty::Class(q)
            | Ty::Protocol(q)
            | Ty::NativeObject(q)
            | Ty::DictionaryContainer(q)
            | Ty::Struct(q)
            | Ty::Enum(q)
            | Ty::Opaque(q) => write!(f, "{q}"),
        }
    }
}
