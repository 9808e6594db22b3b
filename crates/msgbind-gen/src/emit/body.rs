//! Bodies of bound methods and property accessors.

use msgbind_model::{Ty, TypeDescriptor};
use msgbind_targets::ApplePlatform;

use crate::abi::{is_native_enum, need_stret};
use crate::callable::Callable;
use crate::context::GenContext;
use crate::emit::invoke::{generate_new_style_invoke, Send, Target};
use crate::emit::lowering::{lower, zero_copy_params, Lowering};
use crate::emit::CodeWriter;
use crate::error::{BindingError, Result};
use crate::marshal::{needs_null_check, needs_ptr_zero_check};
use crate::messaging::{enum_modes, marshals_exceptions};
use crate::namespace::safe_param_name;
use crate::trampoline::make_trampoline;

/// Alignment of the heap buffer used for aligned struct returns.
const ALIGN: usize = 16;
const ALIGN_BITS: u32 = 4;

/// Bookkeeping after the send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOption<'a> {
    None,
    /// Read the result into `ret` before returning it.
    TempReturn,
    /// Keep the returned object alive in the named backing field.
    MarkRetDirty(&'a str),
}

/// Where a body is emitted.
#[derive(Debug, Clone, Copy)]
pub struct BodySite<'a> {
    /// The type whose unit holds the body.
    pub host: &'a TypeDescriptor,
    pub target: Target,
    /// The member can be overridden, so subclasses must go through the super path.
    pub is_virtual: bool,
    /// Interface implementations and extension methods.
    pub force_inline: bool,
}

fn thread_check(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    if ctx.options.platform == ApplePlatform::MacOs {
        emit!(w, "global::{}.NSApplication.EnsureUIThread ();", ctx.ns.get("AppKit"));
    } else {
        emit!(w, "global::{}.UIApplication.EnsureUIThread ();", ctx.ns.get("UIKit"));
    }
}

fn argument_checks(w: &mut CodeWriter, callable: &Callable) {
    for p in callable.params.iter().filter(|p| needs_null_check(callable, p)) {
        let safe = safe_param_name(&p.name);
        emit!(w, "if ({safe} == null)\n\tthrow new ArgumentNullException (\"{safe}\");");
    }
}

/// Lower once per enum mode; every mode must need the same statements.
fn lowerings(ctx: &mut GenContext<'_>, callable: &Callable, null_allowed_override: bool) -> Result<(Lowering, Vec<String>)> {
    let mut all = Vec::new();
    for &mode in enum_modes(ctx, callable) {
        all.push(lower(ctx, callable, null_allowed_override, mode)?);
    }
    if let [a, b] = all.as_slice() {
        if !a.same_statements(b) {
            return Err(BindingError::new(
                1028,
                format!(
                    "Internal sanity check failed: {} lowers differently for 32-bit and 64-bit calls",
                    callable.display_name()
                ),
            )
            .with_culprit(callable.display_name()));
        }
    }
    let args = all.iter().map(|l| l.args.clone()).collect();
    let first = all.into_iter().next().unwrap_or_default();
    Ok((first, args))
}

/// Write the body of `callable` at the current indentation.
pub fn generate_method_body(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    callable: &Callable,
    site: &BodySite<'_>,
    null_allowed_override: bool,
    option: BodyOption<'_>,
) -> Result<()> {
    let ns = callable.ns();
    if ctx.ns.is_ui_namespace(site.host.namespace.as_deref()) && !site.host.thread_safe {
        thread_check(ctx, w);
    }
    argument_checks(w, callable);

    let (lowering, args) = lowerings(ctx, callable, null_allowed_override)?;
    w.fragment(&lowering.by_ref_init);

    let pinned = zero_copy_params(ctx, callable);
    let fixed_scope = if pinned.is_empty() {
        None
    } else {
        let list: Vec<String> = pinned
            .iter()
            .map(|name| format!("_p{name} = {}", safe_param_name(name)))
            .collect();
        emit!(w, "fixed (char * {}){{", list.join(", "));
        Some(w.indent())
    };
    w.fragment(&lowering.convs);

    let returns = &callable.returns;
    let non_void = !callable.is_constructor() && !returns.is_void();
    let stret = need_stret(ctx.universe, returns, ctx.options.platform)?;
    let zero_check = needs_ptr_zero_check(ctx, returns);
    let is_delegate = returns.is_delegate();
    let aligned = callable.align && stret;
    let use_temp_return = (non_void && (stret || !lowering.disposes.is_empty()))
        || callable.factory
        || option != BodyOption::None
        || is_delegate
        || is_native_enum(ctx.universe, returns)
        || (non_void && !lowering.by_ref_processing.is_empty())
        || zero_check;

    let mut trampoline = None;
    if use_temp_return {
        let formatted = ctx.format(ns, returns);
        if is_delegate {
            w.line("IntPtr ret;");
            trampoline = Some(make_trampoline(ctx, returns)?);
        } else if aligned {
            emit!(w, "{formatted} ret = default({formatted});");
            emit!(w, "IntPtr ret_alloced = Marshal.AllocHGlobal (Marshal.SizeOf (typeof ({formatted})) + {ALIGN});");
            emit!(
                w,
                "IntPtr aligned_ret = new IntPtr (((nint) (ret_alloced + {}) >> {ALIGN_BITS}) << {ALIGN_BITS});",
                ALIGN - 1
            );
            w.line("bool aligned_assigned = false;");
        } else if zero_check {
            w.line("IntPtr ret;");
        } else {
            emit!(w, "{formatted} ret;");
        }
    }

    let send = Send {
        callable,
        target: site.target,
        force_inline: site.force_inline,
        assign_to_temp: use_temp_return || !lowering.disposes.is_empty(),
    };
    if (site.is_virtual || callable.is_constructor()) && !ctx.external() && !site.force_inline {
        if ctx.options.third_party && callable.is_constructor() {
            emit!(w, "IsDirectBinding = GetType ().Assembly == {}.this_assembly;", ctx.messaging());
        }
        let null_handle = callable.is_constructor() && marshals_exceptions(ctx, callable);
        let try_scope = if null_handle {
            w.line("try {");
            Some(w.indent())
        } else {
            None
        };
        w.line("if (IsDirectBinding) {");
        {
            let _i = w.indent();
            generate_new_style_invoke(ctx, w, &send, false, &args)?;
        }
        w.line("} else {");
        {
            let _i = w.indent();
            generate_new_style_invoke(ctx, w, &send, true, &args)?;
        }
        w.line("}");
        if let Some(guard) = try_scope {
            drop(guard);
            w.line("} catch {");
            {
                let _i = w.indent();
                w.line("Handle = IntPtr.Zero;");
                w.line("throw;");
            }
            w.line("}");
        }
    } else {
        generate_new_style_invoke(ctx, w, &send, false, &args)?;
    }

    w.fragment(&lowering.disposes);
    if let BodyOption::MarkRetDirty(field) = option {
        w.line("MarkDirty ();");
        emit!(w, "{field} = ret;");
    }
    if callable.factory {
        w.line("ret.Release ();");
    }
    w.fragment(&lowering.by_ref_processing);

    if use_temp_return {
        if let Some(name) = trampoline {
            emit!(w, "return global::{}.Trampolines.NID{name}.Create (ret);", ctx.ns.core_objc_runtime);
        } else if aligned {
            let formatted = ctx.format(ns, returns);
            emit!(w, "if (aligned_assigned)\n\tunsafe {{ ret = *({formatted} *) aligned_ret; }}");
            w.line("Marshal.FreeHGlobal (ret_alloced);");
            w.line("return ret;");
        } else if zero_check {
            let full = match returns {
                Ty::NativeObject(q) | Ty::Class(q) => ctx.ns.global_name(q),
                other => ctx.format(ns, other),
            };
            emit!(w, "return ret == IntPtr.Zero ? null : new {full} (ret);");
        } else {
            w.line("return ret;");
        }
    }
    if let Some(guard) = fixed_scope {
        drop(guard);
        w.line("}");
    }
    Ok(())
}
