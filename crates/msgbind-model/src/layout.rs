//! Native size of value types per architecture.
//!
//! Struct layout follows C rules: each field is placed at its natural
//! alignment (capped at the word size) and the total is padded to the
//! largest field alignment. A declared `size` overrides the computation.

use msgbind_targets::Arch;

use crate::error::{ModelError, Result};
use crate::ty::Ty;
use crate::universe::{Scope, TypeUniverse};

/// Size and alignment of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSize {
    /// Size in bytes.
    pub size_bytes: u64,
    /// Required alignment in bytes.
    pub alignment_bytes: u64,
}

const MAX_NESTING: usize = 32;

fn align_up(offset: u64, align: u64) -> u64 {
    if align <= 1 {
        offset
    } else {
        offset.div_ceil(align) * align
    }
}

/// Size of a value type on `arch`.
///
/// Returns `None` for types that are not passed by value (classes, strings,
/// arrays, delegates).
pub fn value_size(universe: &TypeUniverse, ty: &Ty, arch: Arch) -> Result<Option<TypeSize>> {
    size_at(universe, ty, arch, 0)
}

fn size_at(universe: &TypeUniverse, ty: &Ty, arch: Arch, depth: usize) -> Result<Option<TypeSize>> {
    let word = arch.pointer_size();
    match ty {
        Ty::Primitive(p) => {
            let bytes = p.size(arch);
            Ok(Some(TypeSize {
                size_bytes: bytes,
                alignment_bytes: bytes.min(word),
            }))
        }
        Ty::Enum(q) => {
            let Some(e) = universe.enum_descriptor(q) else {
                return Err(ModelError::UnknownType {
                    name: q.full_name(),
                    context: "enum layout".to_string(),
                });
            };
            // native enums narrow with the pointer width
            let bytes = if e.native {
                word
            } else {
                e.underlying.size(arch)
            };
            Ok(Some(TypeSize {
                size_bytes: bytes,
                alignment_bytes: bytes.min(word),
            }))
        }
        Ty::Struct(q) => {
            if depth > MAX_NESTING {
                return Err(ModelError::InvalidDescription {
                    detail: format!("struct '{q}' contains itself"),
                });
            }
            let Some(s) = universe.struct_descriptor(q) else {
                return Err(ModelError::UnknownType {
                    name: q.full_name(),
                    context: "struct layout".to_string(),
                });
            };
            let context = s.full_name();
            let scope = Scope::new(s.namespace.as_deref(), &context);

            let mut offset = 0u64;
            let mut max_align = 1u64;
            for field in &s.fields {
                let field_ty = universe.resolve(&field.ty, &scope)?;
                let field_size = match size_at(universe, &field_ty, arch, depth + 1)? {
                    Some(sz) => sz,
                    // handles and object references occupy a pointer
                    None => TypeSize {
                        size_bytes: word,
                        alignment_bytes: word,
                    },
                };
                offset = align_up(offset, field_size.alignment_bytes);
                offset += field_size.size_bytes;
                max_align = max_align.max(field_size.alignment_bytes);
            }

            match s.size {
                Some(declared) => Ok(Some(TypeSize {
                    size_bytes: declared,
                    alignment_bytes: max_align.min(word),
                })),
                None => Ok(Some(TypeSize {
                    size_bytes: align_up(offset, max_align),
                    alignment_bytes: max_align,
                })),
            }
        }
        _ => Ok(None),
    }
}
