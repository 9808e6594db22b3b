//! Property declarations backed by getter and setter sends.

use msgbind_model::descriptor::ArgumentSemantic;
use msgbind_model::{PropertyDescriptor, Ty};

use crate::callable::Callable;
use crate::context::GenContext;
use crate::emit::body::{generate_method_body, BodyOption};
use crate::emit::method::{mentions_delegates, MemberSite};
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::gather::ContractProperty;
use crate::member::{self, Host, MemberFlags};
use crate::namespace::safe_param_name;
use crate::trampoline::make_trampoline;

/// Wrapped objects, and arrays of them, are kept alive by the managed peer.
fn type_needs_backing_field(ty: &Ty) -> bool {
    ty.is_wrapped() || ty.element().is_some_and(Ty::is_wrapped)
}

/// Retaining semantics (and no semantic at all) re-read the value every
/// time instead of caching it.
fn needs_dirty_check(p: &PropertyDescriptor, ty: &Ty) -> bool {
    match p.semantic {
        Some(ArgumentSemantic::Assign | ArgumentSemantic::Weak) => false,
        _ => type_needs_backing_field(ty),
    }
}

pub(crate) fn export_attribute(selector: &str, semantic: Option<ArgumentSemantic>) -> String {
    match semantic {
        Some(s) => format!("[Export (\"{selector}\", ArgumentSemantic.{})]", s.as_str()),
        None => format!("[Export (\"{selector}\")]"),
    }
}

fn write_wrapped(ctx: &GenContext<'_>, w: &mut CodeWriter, used_in: Option<&str>, p: &PropertyDescriptor, ty: &Ty, wrap: &str) {
    let formatted = ctx.format(used_in, ty);
    let wrapped_array = ty.element().filter(|e| e.is_wrapped());
    w.line("get {");
    {
        let _i = w.indent();
        if let Ty::DictionaryContainer(_) = ty {
            emit!(w, "var src = {wrap} != null ? new NSMutableDictionary ({wrap}) : null;");
            emit!(w, "return src == null ? null : new {formatted}(src);");
        } else if let Some(elem) = wrapped_array {
            emit!(w, "return NSArray.FromArray<{}>({wrap} as NSArray);", ctx.format(used_in, elem));
        } else if ty.is_value_type() {
            emit!(w, "return ({formatted}) ({wrap});");
        } else {
            emit!(w, "return {wrap} as {formatted};");
        }
    }
    w.line("}");
    if p.can_write() {
        w.line("set {");
        {
            let _i = w.indent();
            if let Ty::DictionaryContainer(_) = ty {
                emit!(w, "{wrap} = value == null ? null : value.Dictionary;");
            } else if wrapped_array.is_some() {
                emit!(w, "{wrap} = NSArray.FromNSObjects (value);");
            } else {
                emit!(w, "{wrap} = value;");
            }
        }
        w.line("}");
    }
}

/// Generate a property from the contract of `site.unit`. Backing fields
/// that must be cleared on dispose are appended to `dispose_fields`.
pub fn generate_property(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    site: &MemberSite<'_>,
    cp: &ContractProperty<'_>,
    dispose_fields: &mut Vec<String>,
) -> Result<()> {
    let p = cp.property;
    let used_in = site.used_in();
    let getter = Callable::getter(ctx.universe, cp.owner, p)?.hosted_in(used_in);
    let ty = getter.returns.clone();
    let interface_impl = site.host == Host::Wrapper;
    let name = safe_param_name(&p.name);
    tracing::trace!(member = %getter.display_name(), "generating property");

    let mut flags = MemberFlags::property(p).inlined(&cp.origin);
    if p.wrap.is_some() {
        flags.sealed = true;
    }
    let mods = member::modifiers(site.host, site.unit, flags).with_unsafe(mentions_delegates(&getter));
    let formatted = ctx.format(used_in, &ty);

    if let Some(wrap) = p.wrap.as_deref() {
        w.line("[CompilerGenerated]");
        emit!(w, "{mods}{formatted} {name} {{");
        {
            let _i = w.indent();
            write_wrapped(ctx, w, used_in, p, &ty, wrap);
        }
        w.line("}");
        w.blank();
        return Ok(());
    }

    let needs_field = type_needs_backing_field(&ty);
    let dirty_check = needs_dirty_check(p, &ty);
    let backing = (!site.is_model() && needs_field && !interface_impl && !mods.is_static() && !dirty_check)
        .then(|| format!("__mt_{}_var", p.name));
    if let Some(var) = &backing {
        w.line("[CompilerGenerated]");
        emit!(w, "object {var};");
        dispose_fields.push(var.clone());
    }

    let export = !p.sealed;
    w.line("[CompilerGenerated]");
    emit!(w, "{mods}{formatted} {name} {{");
    {
        let _i = w.indent();
        if export {
            if ty.is_delegate() {
                let tramp = make_trampoline(ctx, &ty)?;
                emit!(
                    w,
                    "[return: DelegateProxy (typeof ({}.Trampolines.SD{tramp}))]",
                    ctx.ns.core_objc_runtime
                );
            }
            w.line(&export_attribute(&getter.selector, p.semantic));
        }
        if mods.is_abstract() {
            w.line("get;");
        } else {
            w.line("get {");
            {
                let _i = w.indent();
                if site.is_model() {
                    w.line("throw new ModelNotImplementedException ();");
                } else {
                    let option = match &backing {
                        _ if interface_impl || !needs_field => BodyOption::None,
                        Some(var) => BodyOption::MarkRetDirty(var),
                        None => BodyOption::TempReturn,
                    };
                    let body_site = site.body_site(mods.is_virtual());
                    generate_method_body(ctx, w, &getter, &body_site, false, option)?;
                }
            }
            w.line("}");
            w.blank();
        }

        if p.can_write() {
            let setter = Callable::setter(ctx.universe, cp.owner, p)?.hosted_in(used_in);
            if export {
                w.line(&export_attribute(&setter.selector, p.semantic));
            }
            if mods.is_abstract() {
                w.line("set;");
            } else {
                w.line("set {");
                {
                    let _i = w.indent();
                    if site.is_model() {
                        w.line("throw new ModelNotImplementedException ();");
                    } else {
                        let body_site = site.body_site(mods.is_virtual());
                        generate_method_body(ctx, w, &setter, &body_site, p.null_allowed, BodyOption::None)?;
                        if let Some(var) = &backing {
                            w.line("MarkDirty ();");
                            emit!(w, "{var} = value;");
                        }
                    }
                }
                w.line("}");
            }
        }
    }
    w.line("}");
    w.blank();
    Ok(())
}
