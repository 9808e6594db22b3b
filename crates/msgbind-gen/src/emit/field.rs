//! Properties bound to exported native symbols, and the library handles
//! they are looked up in.

use std::path::Path;

use msgbind_model::descriptor::FieldBinding;
use msgbind_model::{Primitive, PropertyDescriptor, Ty, TypeDescriptor};

use crate::callable::resolve_in;
use crate::context::GenContext;
use crate::emit::CodeWriter;
use crate::error::{BindingError, Result};

/// How a symbol of a given type is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Cached `NSString` constant.
    StringConstant,
    /// Cached `NSArray` behind an indirection.
    Array,
    /// `Dlfcn.Get{0}` / `Dlfcn.Set{0}`.
    Scalar(&'static str),
    /// Any other struct, read in place; never writable.
    Blittable,
}

fn field_kind(ty: &Ty) -> Option<FieldKind> {
    let kind = match ty {
        Ty::Class(q) if q.namespace.as_deref() == Some("Foundation") && q.name == "NSString" => FieldKind::StringConstant,
        Ty::Class(q) if q.name == "NSArray" => FieldKind::Array,
        Ty::Primitive(p) => FieldKind::Scalar(match p {
            Primitive::Int => "Int32",
            Primitive::Double => "Double",
            Primitive::Float => "Float",
            Primitive::IntPtr => "IntPtr",
            Primitive::Long => "Int64",
            Primitive::NInt => "NInt",
            Primitive::NUInt => "NUInt",
            Primitive::NFloat => "NFloat",
            _ => return None,
        }),
        Ty::Struct(q) if q.name == "CGSize" => FieldKind::Scalar("CGSize"),
        Ty::Struct(_) => FieldKind::Blittable,
        _ => return None,
    };
    Some(kind)
}

fn setter_suffix(kind: FieldKind) -> Option<&'static str> {
    match kind {
        FieldKind::StringConstant => Some("String"),
        FieldKind::Array => Some("Array"),
        FieldKind::Scalar(suffix) => Some(suffix),
        FieldKind::Blittable => None,
    }
}

/// Resolve (and remember) the library identifier a field is read from.
fn library_name(ctx: &mut GenContext<'_>, unit: &TypeDescriptor, p: &PropertyDescriptor, fb: &FieldBinding) -> Result<String> {
    let (name, path) = match fb.library.as_deref().or(unit.library.as_deref()) {
        Some(lib) => {
            let file = Path::new(lib)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| lib.to_string());
            (file.replace('.', ""), Some(lib.to_string()))
        }
        None if ctx.options.third_party => {
            return Err(BindingError::new(
                1042,
                format!("Missing library for field {} (e.g. \"__Internal\")", p.name),
            )
            .with_culprit(format!("{}.{}", unit.full_name(), p.name)));
        }
        None => {
            let ns = unit.namespace.as_deref().unwrap_or_default();
            (ctx.ns.strip_prefix(ns).replace('.', ""), None)
        }
    };
    ctx.libraries.entry(name.clone()).or_insert(path);
    Ok(name)
}

/// Generate a field property of `unit`.
pub fn generate_field(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    unit: &TypeDescriptor,
    p: &PropertyDescriptor,
    fb: &FieldBinding,
) -> Result<()> {
    let culprit = format!("{}.{}", unit.full_name(), p.name);
    let ty = resolve_in(ctx.universe, unit, &p.ty)?;
    let formatted = ctx.format(unit.namespace.as_deref(), &ty);
    let Some(kind) = field_kind(&ty) else {
        return Err(if ty.is_string() {
            BindingError::new(1013, "Unsupported type for Fields (string), you probably meant NSString")
        } else {
            BindingError::new(1014, format!("Unsupported type for Fields: {formatted}"))
        }
        .with_culprit(culprit));
    };
    let setter = setter_suffix(kind).filter(|_| p.can_write());
    if p.can_write() && setter.is_none() {
        return Err(BindingError::new(
            1021,
            format!("Unsupported type for read/write Fields: {formatted} for {culprit}"),
        )
        .with_culprit(culprit));
    }

    let lib = library_name(ctx, unit, p, fb)?;
    let shown = ctx.libraries.get(&lib).cloned().flatten().unwrap_or_else(|| lib.clone());
    let sym = &fb.symbol;
    let name = &p.name;
    let handle = format!("Libraries.{lib}.Handle");

    if !ty.is_value_type() {
        w.line("[CompilerGenerated]");
        emit!(w, "static {formatted} _{name};");
    }
    emit!(w, "[Field (\"{sym}\",  \"{shown}\")]");
    let visibility = if p.internal { "internal" } else { "public" };
    emit!(w, "{visibility} static unsafe {formatted} {name} {{");
    {
        let _i = w.indent();
        w.line("get {");
        {
            let _i = w.indent();
            match kind {
                FieldKind::StringConstant => {
                    emit!(w, "if (_{name} == null)\n\t_{name} = Dlfcn.GetStringConstant ({handle}, \"{sym}\");");
                    emit!(w, "return _{name};");
                }
                FieldKind::Array => {
                    emit!(
                        w,
                        "if (_{name} == null)\n\t_{name} = Runtime.GetNSObject<NSArray> (Dlfcn.GetIndirect ({handle}, \"{sym}\"));"
                    );
                    emit!(w, "return _{name};");
                }
                FieldKind::Scalar(suffix) => emit!(w, "return Dlfcn.Get{suffix} ({handle}, \"{sym}\");"),
                FieldKind::Blittable => emit!(w, "return *(({formatted} *) Dlfcn.dlsym ({handle}, \"{sym}\"));"),
            }
        }
        w.line("}");
        if let Some(setter) = setter {
            w.line("set {");
            emit!(w, "\tDlfcn.Set{setter} ({handle}, \"{sym}\", value);");
            w.line("}");
        }
    }
    w.line("}");
    w.blank();
    Ok(())
}

/// Render the `Libraries` class body (inside the namespace block).
pub fn render_libraries(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    let third_party = ctx.options.third_party;
    w.line("[CompilerGenerated]");
    w.block("static partial class Libraries", |w| {
        for (name, path) in &ctx.libraries {
            w.block(&format!("static public class {name}"), |w| match path.as_deref() {
                _ if third_party && name == "__Internal" => {
                    w.line("static public readonly IntPtr Handle = Dlfcn.dlopen (null, 0);");
                }
                Some(path) if third_party => {
                    emit!(w, "static public readonly IntPtr Handle = Dlfcn.dlopen (\"{path}\", 0);");
                }
                _ => emit!(w, "static public readonly IntPtr Handle = Dlfcn.dlopen (Constants.{name}Library, 0);"),
            });
        }
    });
}
