//! Method declarations.
//!
//! [`generate_method`] covers methods and constructors declared on (or
//! inlined into) a type. Property accessors bound as extension methods go
//! through [`generate_callable`] directly.

use msgbind_model::{Ty, TypeDescriptor};

use crate::callable::{Callable, CallableKind};
use crate::context::GenContext;
use crate::emit::body::{generate_method_body, BodyOption, BodySite};
use crate::emit::invoke::Target;
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::gather::ContractMethod;
use crate::member::{self, Host, MemberFlags, Modifiers};
use crate::namespace::{remove_arity, safe_param_name};
use crate::trampoline::make_trampoline;

/// Where a member is declared, and for which unit.
#[derive(Debug, Clone, Copy)]
pub struct MemberSite<'a> {
    pub host: Host,
    /// The type whose unit holds the member.
    pub unit: &'a TypeDescriptor,
    /// The extended type of a category.
    pub category_base: Option<&'a Ty>,
}

impl<'a> MemberSite<'a> {
    pub fn new(host: Host, unit: &'a TypeDescriptor) -> Self {
        Self {
            host,
            unit,
            category_base: None,
        }
    }

    pub fn used_in(&self) -> Option<&'a str> {
        self.unit.namespace.as_deref()
    }

    /// Model members only exist to be overridden.
    pub fn is_model(&self) -> bool {
        self.host == Host::Class && self.unit.model
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.host, Host::Category | Host::Extension)
    }

    pub fn body_site(&self, is_virtual: bool) -> BodySite<'a> {
        BodySite {
            host: self.unit,
            target: if self.is_extension() {
                Target::ExtensionParameter
            } else {
                Target::This
            },
            is_virtual,
            force_inline: matches!(self.host, Host::Extension | Host::Wrapper),
        }
    }
}

/// Declaration details that are not part of the callable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shape<'a> {
    /// Selector of the `[Export]` attribute.
    pub export: Option<&'a str>,
    /// Expression the member forwards to.
    pub wrap: Option<&'a str>,
}

pub fn mentions_delegates(callable: &Callable) -> bool {
    callable.returns.is_delegate() || callable.params.iter().any(|p| p.ty.is_delegate())
}

/// Parameter declarations of `callable`, without the extension receiver.
pub fn parameter_list(ctx: &mut GenContext<'_>, used_in: Option<&str>, callable: &Callable) -> Result<Vec<String>> {
    let last = callable.params.len().saturating_sub(1);
    let mut out = Vec::with_capacity(callable.params.len());
    for (i, p) in callable.params.iter().enumerate() {
        let mut decl = String::new();
        if p.ty.is_delegate() {
            let name = make_trampoline(ctx, &p.ty)?;
            decl.push_str(&format!(
                "[BlockProxy (typeof ({}.Trampolines.NID{name}))] ",
                ctx.ns.core_objc_runtime
            ));
        }
        if i == last && p.params_array && p.ty.element().is_some() {
            decl.push_str("params ");
        }
        decl.push_str(&ctx.format(used_in, &p.ty));
        decl.push(' ');
        decl.push_str(&safe_param_name(&p.name));
        out.push(decl);
    }
    Ok(out)
}

fn declared_name(site: &MemberSite<'_>, callable: &Callable) -> String {
    if callable.is_constructor() {
        return remove_arity(&site.unit.name).to_string();
    }
    if site.is_extension() {
        match callable.kind {
            CallableKind::Getter => {
                if let Some(rest) = callable.name.strip_prefix("get_") {
                    return format!("Get{rest}");
                }
            }
            CallableKind::Setter => {
                if let Some(rest) = callable.name.strip_prefix("set_") {
                    return format!("Set{rest}");
                }
            }
            _ => {}
        }
    }
    callable.name.clone()
}

/// `ReturnType Name (params)`, or `Name (params)` for constructors.
pub fn signature(ctx: &mut GenContext<'_>, site: &MemberSite<'_>, callable: &Callable) -> Result<String> {
    let used_in = site.used_in();
    let mut sig = String::new();
    if !callable.is_constructor() {
        sig.push_str(&ctx.format(used_in, &callable.returns));
        sig.push(' ');
    }
    sig.push_str(&declared_name(site, callable));

    let mut params = Vec::new();
    match (site.host, site.category_base) {
        (Host::Extension, _) => params.push(format!("this {} This", site.unit.interface_name())),
        (Host::Category, Some(base)) if !callable.is_static => {
            params.push(format!("this {} This", ctx.format(used_in, base)));
        }
        _ => {}
    }
    params.extend(parameter_list(ctx, used_in, callable)?);
    sig.push_str(&format!(" ({})", params.join(", ")));
    Ok(sig)
}

/// Attributes preceding the declaration of a method.
pub fn write_attributes(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    site: &MemberSite<'_>,
    callable: &Callable,
    export: Option<&str>,
) -> Result<()> {
    if !callable.is_constructor() && callable.returns.is_delegate() {
        let name = make_trampoline(ctx, &callable.returns)?;
        emit!(
            w,
            "[return: DelegateProxy (typeof ({}.Trampolines.SD{name}))]",
            ctx.ns.core_objc_runtime
        );
    }
    if let Some(sel) = export.filter(|_| site.host != Host::Extension) {
        if callable.variadic {
            emit!(w, "[Export (\"{sel}\", IsVariadic = true)]");
        } else {
            emit!(w, "[Export (\"{sel}\")]");
        }
    }
    Ok(())
}

/// Declare `callable` with `mods` and write its body.
pub fn generate_callable(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    site: &MemberSite<'_>,
    callable: &Callable,
    mods: Modifiers,
    shape: Shape<'_>,
) -> Result<()> {
    write_attributes(ctx, w, site, callable, shape.export)?;
    w.line("[CompilerGenerated]");
    let sig = signature(ctx, site, callable)?;
    if mods.is_abstract() {
        emit!(w, "{mods}{sig};");
        return Ok(());
    }
    emit!(w, "{mods}{sig}");
    if callable.is_constructor() {
        emit!(w, "\t: {}", shape.wrap.unwrap_or("base (NSObjectFlag.Empty)"));
    }
    w.line("{");
    {
        let _i = w.indent();
        if site.is_model() {
            w.line("throw new You_Should_Not_Call_base_In_This_Method ();");
        } else if let Some(wrap) = shape.wrap {
            if !callable.is_constructor() {
                let ret = if callable.returns_void() { "" } else { "return " };
                let this = if site.host == Host::Extension { "This." } else { "" };
                emit!(w, "{ret}{this}{wrap};");
            }
        } else {
            let body_site = site.body_site(mods.is_virtual());
            generate_method_body(ctx, w, callable, &body_site, false, BodyOption::None)?;
        }
    }
    w.line("}");
    w.blank();
    Ok(())
}

/// Generate a method or constructor from the contract of `site.unit`.
pub fn generate_method(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    site: &MemberSite<'_>,
    cm: &ContractMethod<'_>,
) -> Result<()> {
    let m = cm.method;
    let callable = Callable::from_method(ctx.universe, cm.owner, m)?.hosted_in(site.used_in());
    let flags = MemberFlags::method(m).inlined(&cm.origin);
    let mods = member::modifiers(site.host, site.unit, flags).with_unsafe(mentions_delegates(&callable));
    let export = if m.sealed { None } else { m.export.as_deref() };
    tracing::trace!(member = %callable.display_name(), "generating method");
    generate_callable(
        ctx,
        w,
        site,
        &callable,
        mods,
        Shape {
            export,
            wrap: m.wrap.as_deref(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gather::gather;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    const DESC: &str = r#"
[[types]]
name = "Widget"
namespace = "Demo"
base = "NSObject"
members = [
    { kind = "method", name = "Constructor", constructor = true, export = "initWithFrame:", params = [{ name = "frame", type = "CGRect" }] },
    { kind = "method", name = "Reload", export = "reload" },
    { kind = "method", name = "Count", export = "count", returns = "nint", static = true },
    { kind = "method", name = "Run", export = "runWithHandler:", params = [{ name = "handler", type = "System.Action" }] },
    { kind = "method", name = "Log", export = "log:", variadic = true, params = [{ name = "items", type = "NSObject[]", params-array = true }] },
    { kind = "method", name = "Title", wrap = "Describe ()", returns = "string" },
    { kind = "method", name = "Draw", export = "draw", abstract = true },
]

[[types]]
name = "WidgetDelegate"
namespace = "Demo"
base = "NSObject"
model = true
members = [{ kind = "method", name = "DidTap", export = "widgetDidTap:", params = [{ name = "widget", type = "Widget" }] }]

[[types]]
name = "Sizing"
namespace = "Demo"
base = "Widget"
category = true
members = [{ kind = "method", name = "Fit", export = "fit" }]
"#;

    fn universe() -> TypeUniverse {
        TypeUniverse::new(ApiDescription::parse(DESC).unwrap(), ApplePlatform::Ios).unwrap()
    }

    fn render(u: &TypeUniverse, ty: &str, method: &str, host: Host, category_base: Option<&Ty>) -> String {
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(u, &opts);
        let t = u.api_type_by_name(ty).unwrap();
        let contract = gather(u, &opts, t).unwrap();
        let cm = contract.methods.iter().find(|m| m.method.name == method).unwrap();
        let site = MemberSite {
            host,
            unit: t,
            category_base,
        };
        let mut w = CodeWriter::new();
        generate_method(&mut ctx, &mut w, &site, cm).unwrap();
        w.into_string()
    }

    fn class(u: &TypeUniverse, ty: &str, method: &str) -> String {
        render(u, ty, method, Host::Class, None)
    }

    #[test]
    fn instance_methods_are_virtual_and_exported() {
        let u = universe();
        let text = class(&u, "Demo.Widget", "Reload");
        assert!(text.starts_with(
            "[Export (\"reload\")]\n[CompilerGenerated]\npublic virtual void Reload ()\n{\n\tif (IsDirectBinding) {\n"
        ));
        assert!(text.ends_with("\t}\n}\n\n"));
    }

    #[test]
    fn constructors_chain_to_the_flag_constructor() {
        let u = universe();
        let text = class(&u, "Demo.Widget", "Constructor");
        assert!(text.starts_with(
            "[Export (\"initWithFrame:\")]\n[CompilerGenerated]\npublic Widget (CGRect frame)\n\t: base (NSObjectFlag.Empty)\n{\n"
        ));
        assert!(text.contains("InitializeHandle (global::ObjCRuntime.Messaging.IntPtr_objc_msgSend_CGRect (this.Handle, selInitWithFrameHandle, frame), \"initWithFrame:\");"));
    }

    #[test]
    fn static_methods_send_to_the_class() {
        let u = universe();
        let text = class(&u, "Demo.Widget", "Count");
        assert_eq!(
            text,
            "[Export (\"count\")]\n\
             [CompilerGenerated]\n\
             public static nint Count ()\n\
             {\n\
             \treturn global::ObjCRuntime.Messaging.nint_objc_msgSend (class_ptr, selCountHandle);\n\
             }\n\n"
        );
    }

    #[test]
    fn delegate_parameters_are_proxied() {
        let u = universe();
        let text = class(&u, "Demo.Widget", "Run");
        assert!(text.contains(
            "public unsafe virtual void Run ([BlockProxy (typeof (ObjCRuntime.Trampolines.NIDAction))] global::System.Action handler)"
        ));
    }

    #[test]
    fn variadic_params_arrays() {
        let u = universe();
        let text = class(&u, "Demo.Widget", "Log");
        assert!(text.starts_with("[Export (\"log:\", IsVariadic = true)]\n"));
        assert!(text.contains("public virtual void Log (params NSObject[] items)"));
    }

    #[test]
    fn wrapped_and_abstract_methods() {
        let u = universe();
        let text = class(&u, "Demo.Widget", "Title");
        assert_eq!(text, "[CompilerGenerated]\npublic virtual string Title ()\n{\n\treturn Describe ();\n}\n\n");
        let text = class(&u, "Demo.Widget", "Draw");
        assert_eq!(text, "[Export (\"draw\")]\n[CompilerGenerated]\npublic abstract void Draw ();\n");
    }

    #[test]
    fn model_members_throw() {
        let u = universe();
        let text = class(&u, "Demo.WidgetDelegate", "DidTap");
        assert!(text.ends_with("{\n\tthrow new You_Should_Not_Call_base_In_This_Method ();\n}\n\n"));
    }

    #[test]
    fn category_methods_extend_the_base() {
        let u = universe();
        let base = Ty::Class(msgbind_model::QualName::parse("Demo.Widget"));
        let text = render(&u, "Demo.Sizing", "Fit", Host::Category, Some(&base));
        assert!(text.contains("public static void Fit (this Widget This)\n{\n"));
        assert!(text.contains("void_objc_msgSend (This.Handle, selFitHandle);"));
        assert!(!text.contains("IsDirectBinding"));
    }

    #[test]
    fn extension_accessors_are_renamed() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let unit = TypeDescriptor {
            name: "Sizable".to_string(),
            namespace: Some("Demo".to_string()),
            protocol: true,
            ..TypeDescriptor::default()
        };
        let prop = msgbind_model::PropertyDescriptor {
            export: Some("scale".to_string()),
            ..msgbind_model::PropertyDescriptor::new("Scale", msgbind_model::TypeRef::named("double"))
        };
        let getter = Callable::getter(&u, &unit, &prop).unwrap();
        let site = MemberSite::new(Host::Extension, &unit);
        let mods = member::modifiers(Host::Extension, &unit, MemberFlags::property(&prop));
        let mut w = CodeWriter::new();
        generate_callable(&mut ctx, &mut w, &site, &getter, mods, Shape::default()).unwrap();
        assert_eq!(
            w.into_string(),
            "[CompilerGenerated]\n\
             public static double GetScale (this ISizable This)\n\
             {\n\
             \treturn global::ObjCRuntime.Messaging.Double_objc_msgSend (This.Handle, Selector.GetHandle (\"scale\"));\n\
             }\n\n"
        );
    }
}
