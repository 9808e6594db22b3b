//! Textual type references.
//!
//! Descriptors refer to types with short strings such as `NSString`,
//! `Foundation.NSString`, `string[]`, `out NSError` or
//! `System.Action<NSString>`. This module parses them with a small
//! hand-written recursive-descent parser.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Passing mode of a by-reference parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Out,
    Ref,
}

impl RefKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RefKind::Out => "out",
            RefKind::Ref => "ref",
        }
    }
}

/// An unresolved reference to a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// A (possibly qualified) name with optional generic arguments.
    Named { name: String, args: Vec<TypeRef> },
    /// Single-dimension array.
    Array(Box<TypeRef>),
    /// `out T` or `ref T`; only valid at the outermost level.
    ByRef { kind: RefKind, elem: Box<TypeRef> },
}

impl TypeRef {
    /// A plain name without generic arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn void() -> Self {
        TypeRef::named("void")
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Named { name, args } if name == "void" && args.is_empty())
    }

    /// Parse a type reference string.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser {
            input,
            chars: input.char_indices().peekable(),
        };
        parser.skip_ws();
        let by_ref = parser.by_ref_prefix();
        let inner = parser.inner()?;
        parser.skip_ws();
        if let Some((pos, c)) = parser.chars.next() {
            return Err(parser.error(format!("unexpected '{c}' at offset {pos}")));
        }
        Ok(match by_ref {
            Some(kind) => TypeRef::ByRef {
                kind,
                elem: Box::new(inner),
            },
            None => inner,
        })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array(elem) => write!(f, "{elem}[]"),
            TypeRef::ByRef { kind, elem } => write!(f, "{} {elem}", kind.keyword()),
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, detail: String) -> ModelError {
        ModelError::InvalidTypeRef {
            input: self.input.to_string(),
            detail,
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn by_ref_prefix(&mut self) -> Option<RefKind> {
        let rest = self.chars.peek().map(|(pos, _)| &self.input[*pos..])?;
        let kind = if rest.starts_with("out ") {
            RefKind::Out
        } else if rest.starts_with("ref ") {
            RefKind::Ref
        } else {
            return None;
        };
        for _ in 0..4 {
            self.chars.next();
        }
        self.skip_ws();
        Some(kind)
    }

    fn ident(&mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            let ok = if out.is_empty() {
                c.is_alphabetic() || c == '_' || c == '@'
            } else {
                c.is_alphanumeric() || c == '_'
            };
            if !ok {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        if out.is_empty() {
            return Err(self.error("expected a type name".to_string()));
        }
        Ok(out)
    }

    fn inner(&mut self) -> Result<TypeRef> {
        let mut name = self.ident()?;
        while matches!(self.chars.peek(), Some((_, '.'))) {
            self.chars.next();
            name.push('.');
            name.push_str(&self.ident()?);
        }

        let mut args = Vec::new();
        self.skip_ws();
        if matches!(self.chars.peek(), Some((_, '<'))) {
            self.chars.next();
            loop {
                self.skip_ws();
                args.push(self.inner()?);
                self.skip_ws();
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, '>')) => break,
                    _ => return Err(self.error("unterminated generic argument list".to_string())),
                }
            }
        }

        let mut ty = TypeRef::Named { name, args };
        loop {
            self.skip_ws();
            if !matches!(self.chars.peek(), Some((_, '['))) {
                break;
            }
            self.chars.next();
            match self.chars.next() {
                Some((_, ']')) => ty = TypeRef::Array(Box::new(ty)),
                _ => return Err(self.error("only single-dimension arrays are supported".to_string())),
            }
        }
        Ok(ty)
    }
}
