//! Entry-point synthesis and interning.
//!
//! Every message send goes through a typed native entry point whose name
//! encodes the marshaled return and parameter types
//! (`IntPtr_objc_msgSend_IntPtr_int`). Entry points are interned by name so
//! that any number of call sites with the same shape share one declaration.

use std::collections::HashMap;

use msgbind_model::Ty;

use crate::abi::{has_native_enum_in_signature, need_stret};
use crate::callable::Callable;
use crate::context::GenContext;
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::marshal::{is_array_element, marshal_type, unsupported_parameter, EnumMode, Naming};

const LIBOBJC: &str = "LIBOBJC_DYLIB";

/// One interned native entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    /// The `[DllImport]` attribute line.
    pub attribute: String,
    /// The `extern` declaration line.
    pub declaration: String,
}

/// Interned entry points in registration order.
#[derive(Debug, Default)]
pub struct EntryPoints {
    entries: Vec<EntryPoint>,
    by_name: HashMap<String, usize>,
}

impl EntryPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry point with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Insert unless already present; returns whether it was new.
    pub fn intern(&mut self, entry: EntryPoint) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        tracing::debug!(entry_point = %entry.name, "registered entry point");
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Handle-returning entry points used by generated constructors of
    /// third-party bindings.
    pub fn register_handle_entry_points(&mut self) {
        for (name, export, extra) in [
            ("IntPtr_objc_msgSend", "objc_msgSend", ""),
            ("IntPtr_objc_msgSendSuper", "objc_msgSendSuper", ""),
            ("IntPtr_objc_msgSend_IntPtr", "objc_msgSend", ", IntPtr arg1"),
            ("IntPtr_objc_msgSendSuper_IntPtr", "objc_msgSendSuper", ", IntPtr arg1"),
        ] {
            self.intern(EntryPoint {
                name: name.to_string(),
                attribute: format!("[DllImport ({LIBOBJC}, EntryPoint=\"{export}\")]"),
                declaration: format!(
                    "public extern static IntPtr {name} (IntPtr receiever, IntPtr selector{extra});"
                ),
            });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryPoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether calls to `callable` go through exception-marshaling wrappers.
pub fn marshals_exceptions(ctx: &GenContext<'_>, callable: &Callable) -> bool {
    ctx.options.marshal_native_exceptions || callable.marshal_native_exceptions
}

/// Entry-point name for `callable` (`send` is `objc_msgSend` or `objc_msgSendSuper`).
pub fn make_sig(
    ctx: &GenContext<'_>,
    send: &str,
    stret: bool,
    callable: &Callable,
    aligned: bool,
    mode: EnumMode,
) -> Result<String> {
    let mut sig = String::new();
    if marshals_exceptions(ctx, callable) {
        sig.push_str("xamarin_");
    }
    let ret = marshal_type(ctx, &callable.returns, false, aligned, Naming::Signature, mode).map_err(|e| {
        e.context(format!("in method `{}'", callable.display_name()))
            .with_culprit(callable.display_name())
    })?;
    sig.push_str(&ret);
    sig.push('_');
    sig.push_str(send);
    if stret {
        sig.push_str("_stret");
    }
    for p in &callable.params {
        if p.ty.element().is_some_and(|elem| !is_array_element(ctx, elem)) {
            return Err(unsupported_parameter(callable, p));
        }
        let t = marshal_type(ctx, &p.ty, p.plain_string, false, Naming::Signature, mode).map_err(|e| {
            e.context(format!("in parameter `{}' from {}", p.name, callable.display_name()))
                .with_culprit(callable.display_name())
        })?;
        sig.push('_');
        sig.push_str(&t.replace(' ', "_"));
    }
    if let Some(directive) = &callable.marshal_directive {
        if let Some(prefix) = directive.prefix.as_deref().filter(|p| !p.is_empty()) {
            sig.insert_str(0, prefix);
        }
        if let Some(suffix) = directive.suffix.as_deref().filter(|s| !s.is_empty()) {
            sig.push_str(suffix);
        }
    }
    Ok(sig)
}

/// Declare the entry point `name` for `callable`, unless it already exists.
pub fn register_method(
    ctx: &mut GenContext<'_>,
    need_stret: bool,
    callable: &Callable,
    name: &str,
    aligned: bool,
    mode: EnumMode,
) -> Result<()> {
    if ctx.entry_points.contains(name) {
        return Ok(());
    }
    let scope = ctx.messaging_scope();
    let mut args = String::new();
    for (i, p) in callable.params.iter().enumerate() {
        let t = marshal_type(ctx, &p.ty, p.plain_string, false, Naming::Source(scope), mode).map_err(|e| {
            e.context(format!("in parameter {} of {}", p.name, callable.display_name()))
        })?;
        args.push_str(&format!(", {t} arg{}", i + 1));
    }

    let export = match (name.contains("objc_msgSendSuper"), need_stret) {
        (true, true) => "objc_msgSendSuper_stret",
        (true, false) => "objc_msgSendSuper",
        (false, true) => "objc_msgSend_stret",
        (false, false) => "objc_msgSend",
    };
    let library = callable
        .marshal_directive
        .as_ref()
        .and_then(|d| d.library.as_deref());
    let attribute = match library {
        Some(lib) => format!("[DllImport (\"{lib}\", EntryPoint=\"{name}\")]"),
        None if name.starts_with("xamarin_") => format!("[DllImport (\"__Internal\", EntryPoint=\"{name}\")]"),
        None => format!("[DllImport ({LIBOBJC}, EntryPoint=\"{export}\")]"),
    };

    let (ret, retval) = if need_stret {
        let retval = if aligned {
            "IntPtr retval, ".to_string()
        } else {
            format!("out {} retval, ", ctx.format(Some(&ctx.ns.core_objc_runtime), &callable.returns))
        };
        ("void".to_string(), retval)
    } else {
        let ret = marshal_type(ctx, &callable.returns, false, false, Naming::Source(scope), mode)?;
        (ret, String::new())
    };
    let declaration =
        format!("public extern static {ret} {name} ({retval}IntPtr receiver, IntPtr selector{args});");
    ctx.entry_points.intern(EntryPoint {
        name: name.to_string(),
        attribute,
        declaration,
    });
    Ok(())
}

/// Enum modes a callable needs call paths for.
pub fn enum_modes(ctx: &GenContext<'_>, callable: &Callable) -> &'static [EnumMode] {
    if has_native_enum_in_signature(ctx.universe, callable) {
        &[EnumMode::Bit32, EnumMode::Bit64]
    } else {
        &[EnumMode::Bit32]
    }
}

/// Register every entry point `callable` can be invoked through.
pub fn declare_invoker(ctx: &mut GenContext<'_>, callable: &Callable) -> Result<()> {
    if callable.wrap {
        return Ok(());
    }
    let stret = need_stret(ctx.universe, &callable.returns, ctx.options.platform)?;
    for &mode in enum_modes(ctx, callable) {
        // 64-bit device never uses stret, so the plain variants always exist
        for send in ["objc_msgSend", "objc_msgSendSuper"] {
            let sig = make_sig(ctx, send, false, callable, false, mode)?;
            register_method(ctx, false, callable, &sig, false, mode)?;
        }
        if stret {
            for send in ["objc_msgSend", "objc_msgSendSuper"] {
                let sig = make_sig(ctx, send, true, callable, false, mode)?;
                register_method(ctx, true, callable, &sig, false, mode)?;
            }
            if callable.align {
                for send in ["objc_msgSend", "objc_msgSendSuper"] {
                    let sig = make_sig(ctx, send, true, callable, true, mode)?;
                    register_method(ctx, true, callable, &sig, true, mode)?;
                }
            }
        }
    }
    Ok(())
}

/// Whether the return of `callable` is void or a constructor's handle.
pub fn returns_value(callable: &Callable) -> bool {
    !callable.is_constructor() && !matches!(callable.returns, Ty::Void)
}

/// Render the `Messaging` unit body (inside the namespace block).
pub fn render(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    w.block("static partial class Messaging", |w| {
        if ctx.options.third_party {
            w.line("static internal System.Reflection.Assembly this_assembly = typeof (Messaging).Assembly;");
            w.blank();
            w.line("const string LIBOBJC_DYLIB = \"/usr/lib/libobjc.dylib\";");
            w.blank();
        }
        for entry in ctx.entry_points.iter() {
            w.line(&entry.attribute);
            w.line(&entry.declaration);
        }
    });
}
