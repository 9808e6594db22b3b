//! Protocol artifacts: the `[Protocol]` interface, an extension class for
//! optional members and the wrapper class used for foreign handles.

use msgbind_model::universe::Scope;
use msgbind_model::{MethodDescriptor, PropertyDescriptor, QualName, TypeDescriptor};

use crate::callable::Callable;
use crate::context::GenContext;
use crate::emit::method::{
    generate_callable, generate_method, mentions_delegates, signature, write_attributes, MemberSite, Shape,
};
use crate::emit::property::{export_attribute, generate_property};
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::gather::{protocol_requirements, ContractMethod, Origin};
use crate::member::{self, Host, MemberFlags};
use crate::trampoline::make_trampoline;

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn method_member_attribute(ctx: &GenContext<'_>, unit: &TypeDescriptor, m: &MethodDescriptor) -> Result<String> {
    let callable = Callable::from_method(ctx.universe, unit, m)?;
    let used_in = unit.namespace.as_deref();
    let mut attr = format!(
        "[ProtocolMember (IsRequired = {}, IsProperty = false, IsStatic = {}, Name = \"{}\", Selector = \"{}\"",
        bool_str(m.is_abstract),
        bool_str(m.is_static),
        m.name,
        callable.selector
    );
    if !callable.returns_void() {
        attr.push_str(&format!(", ReturnType = typeof ({})", ctx.format(used_in, &callable.returns)));
    }
    if !callable.params.is_empty() {
        let types: Vec<String> = callable
            .params
            .iter()
            .map(|p| {
                let ty = p.ty.referent().map_or(&p.ty, |(_, t)| t);
                format!("typeof ({})", ctx.format(used_in, ty))
            })
            .collect();
        let by_ref: Vec<&str> = callable.params.iter().map(|p| bool_str(p.ty.is_by_ref())).collect();
        attr.push_str(&format!(
            ", ParameterType = new Type [] {{ {} }}, ParameterByRef = new bool [] {{ {} }}",
            types.join(", "),
            by_ref.join(", ")
        ));
        if callable.variadic {
            attr.push_str(", IsVariadic = true");
        }
    }
    attr.push_str(")]");
    Ok(attr)
}

fn property_member_attribute(ctx: &GenContext<'_>, unit: &TypeDescriptor, p: &PropertyDescriptor) -> Result<String> {
    let getter = Callable::getter(ctx.universe, unit, p)?;
    let mut attr = format!(
        "[ProtocolMember (IsRequired = {}, IsProperty = true, IsStatic = {}, Name = \"{}\", Selector = \"{}\", PropertyType = typeof ({}), GetterSelector = \"{}\"",
        bool_str(p.is_abstract),
        bool_str(p.is_static),
        p.name,
        p.export.as_deref().unwrap_or_default(),
        ctx.format(unit.namespace.as_deref(), &getter.returns),
        getter.selector
    );
    if p.can_write() {
        attr.push_str(&format!(", SetterSelector = \"{}\"", p.setter_selector().unwrap_or_default()));
    }
    attr.push_str(&format!(
        ", ArgumentSemantic = ArgumentSemantic.{})]",
        p.semantic.map_or("None", |s| s.as_str())
    ));
    Ok(attr)
}

/// Interfaces of the protocols `unit` inherits, sorted.
fn inherited_interfaces(ctx: &GenContext<'_>, unit: &TypeDescriptor) -> Result<Vec<String>> {
    let context = unit.full_name();
    let scope = Scope::new(unit.namespace.as_deref(), &context);
    let mut out = Vec::new();
    for name in &unit.protocols {
        if let Some(p) = ctx.universe.resolve_protocol(name, &scope)? {
            let iface = QualName::new(p.namespace.as_deref(), p.interface_name());
            out.push(ctx.ns.format_name(unit.namespace.as_deref(), &iface));
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}

fn write_interface(ctx: &mut GenContext<'_>, w: &mut CodeWriter, unit: &TypeDescriptor, visibility: &str) -> Result<()> {
    let site = MemberSite::new(Host::Interface, unit);
    let used_in = site.used_in();
    let mut header = format!("{visibility} interface {} : INativeObject, IDisposable", unit.interface_name());
    for iface in inherited_interfaces(ctx, unit)? {
        header.push_str(", ");
        header.push_str(&iface);
    }
    w.line(&header);
    w.line("{");
    {
        let _i = w.indent();
        for m in unit.methods().filter(|m| m.is_abstract && !m.is_static && !m.unavailable) {
            let callable = Callable::from_method(ctx.universe, unit, m)?;
            w.line("[CompilerGenerated]");
            write_attributes(ctx, w, &site, &callable, m.export.as_deref())?;
            w.line("[Preserve (Conditional = true)]");
            let unsafe_mod = if mentions_delegates(&callable) { "unsafe " } else { "" };
            let sig = signature(ctx, &site, &callable)?;
            emit!(w, "{unsafe_mod}{sig};");
            w.blank();
        }
        for p in unit.properties().filter(|p| p.is_abstract && !p.is_static && !p.unavailable) {
            let getter = Callable::getter(ctx.universe, unit, p)?;
            w.line("[Preserve (Conditional = true)]");
            let unsafe_mod = if getter.returns.is_delegate() { "unsafe " } else { "" };
            emit!(w, "{unsafe_mod}{} {} {{", ctx.format(used_in, &getter.returns), p.name);
            {
                let _i = w.indent();
                if getter.returns.is_delegate() {
                    let tramp = make_trampoline(ctx, &getter.returns)?;
                    emit!(
                        w,
                        "[return: DelegateProxy (typeof ({}.Trampolines.SD{tramp}))]",
                        ctx.ns.core_objc_runtime
                    );
                }
                w.line(&export_attribute(&getter.selector, p.semantic));
                w.line("get;");
                if p.can_write() {
                    let setter = p.setter_selector().unwrap_or_default();
                    w.line(&export_attribute(&setter, p.semantic));
                    w.line("set;");
                }
            }
            w.line("}");
            w.blank();
        }
    }
    w.line("}");
    w.blank();
    Ok(())
}

/// Optional instance members become extension methods on the interface;
/// properties turn into `Get`/`Set` method pairs.
fn write_extensions(ctx: &mut GenContext<'_>, w: &mut CodeWriter, unit: &TypeDescriptor, visibility: &str) -> Result<()> {
    let methods: Vec<&MethodDescriptor> = unit
        .methods()
        .filter(|m| !m.is_abstract && !m.is_static && !m.unavailable && !m.constructor)
        .collect();
    let properties: Vec<&PropertyDescriptor> = unit
        .properties()
        .filter(|p| !p.is_abstract && !p.is_static && !p.unavailable)
        .collect();
    if methods.is_empty() && properties.is_empty() {
        return Ok(());
    }

    let site = MemberSite::new(Host::Extension, unit);
    emit!(w, "{visibility} static partial class {}_Extensions {{", unit.name);
    {
        let _i = w.indent();
        for m in methods {
            let cm = ContractMethod {
                owner: unit,
                method: m,
                origin: Origin::Declared,
            };
            generate_method(ctx, w, &site, &cm)?;
        }
        for p in properties {
            let flags = MemberFlags::property(p);
            let getter = Callable::getter(ctx.universe, unit, p)?;
            let mods = member::modifiers(Host::Extension, unit, flags).with_unsafe(mentions_delegates(&getter));
            w.line("[Preserve (Conditional = true)]");
            generate_callable(ctx, w, &site, &getter, mods, Shape::default())?;
            if p.can_write() {
                let setter = Callable::setter(ctx.universe, unit, p)?;
                let mods = member::modifiers(Host::Extension, unit, flags).with_unsafe(mentions_delegates(&setter));
                w.line("[Preserve (Conditional = true)]");
                generate_callable(ctx, w, &site, &setter, mods, Shape::default())?;
            }
        }
    }
    w.line("}");
    w.blank();
    Ok(())
}

/// The wrapper implements every required member of the protocol and of
/// the protocols it inherits, each once.
fn write_wrapper(ctx: &mut GenContext<'_>, w: &mut CodeWriter, unit: &TypeDescriptor) -> Result<()> {
    let name = &unit.name;
    let site = MemberSite::new(Host::Wrapper, unit);
    let required = protocol_requirements(ctx.universe, unit)?;

    emit!(w, "internal sealed class {name}Wrapper : BaseWrapper, {} {{", unit.interface_name());
    {
        let _i = w.indent();
        emit!(w, "public {name}Wrapper (IntPtr handle)\n\t: base (handle, false)\n{{\n}}");
        w.blank();
        w.line("[Preserve (Conditional = true)]");
        emit!(w, "public {name}Wrapper (IntPtr handle, bool owns)\n\t: base (handle, owns)\n{{\n}}");
        w.blank();

        for cm in &required.methods {
            generate_method(ctx, w, &site, cm)?;
        }
        let mut ignored = Vec::new();
        for cp in &required.properties {
            generate_property(ctx, w, &site, cp, &mut ignored)?;
        }
    }
    w.line("}");
    Ok(())
}

/// Generate the protocol artifacts of `unit`, inside its namespace block.
pub fn generate_protocol(ctx: &mut GenContext<'_>, w: &mut CodeWriter, unit: &TypeDescriptor) -> Result<()> {
    let visibility = if unit.internal { "internal" } else { "public" };
    tracing::debug!(protocol = %unit.full_name(), "generating protocol interface");

    let informal = if unit.informal { ", IsInformal = true" } else { "" };
    emit!(
        w,
        "[Protocol (Name = \"{}\", WrapperType = typeof ({}Wrapper){informal})]",
        unit.native_name(),
        unit.name
    );
    for m in unit.methods().filter(|m| !m.unavailable && !m.constructor) {
        w.line(&method_member_attribute(ctx, unit, m)?);
    }
    for p in unit.properties().filter(|p| !p.unavailable) {
        w.line(&property_member_attribute(ctx, unit, p)?);
    }

    write_interface(ctx, w, unit, visibility)?;
    write_extensions(ctx, w, unit, visibility)?;
    write_wrapper(ctx, w, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    const DESC: &str = r#"
[[types]]
name = "Node"
namespace = "Demo"
protocol = true
members = [{ kind = "property", name = "Identifier", type = "NSString", export = "identifier", abstract = true, readonly = true }]

[[types]]
name = "Drawable"
namespace = "Demo"
protocol = true
register = "DMDrawable"
protocols = ["Node"]
members = [
    { kind = "method", name = "Draw", export = "drawInRect:", abstract = true, params = [{ name = "rect", type = "CGRect" }] },
    { kind = "method", name = "Prepare", export = "prepare" },
    { kind = "method", name = "Create", export = "create", static = true, returns = "NSObject" },
    { kind = "property", name = "Opacity", type = "nfloat", export = "opacity" },
    { kind = "property", name = "Visible", type = "bool", export = "visible", abstract = true, semantic = "assign" },
]
"#;

    fn render() -> String {
        let u = TypeUniverse::new(ApiDescription::parse(DESC).unwrap(), ApplePlatform::Ios).unwrap();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let unit = u.api_type_by_name("Demo.Drawable").unwrap();
        let mut w = CodeWriter::new();
        generate_protocol(&mut ctx, &mut w, unit).unwrap();
        w.into_string()
    }

    #[test]
    fn protocol_attribute_lists_every_member() {
        let text = render();
        assert!(text.starts_with("[Protocol (Name = \"DMDrawable\", WrapperType = typeof (DrawableWrapper))]\n"));
        assert!(text.contains(
            "[ProtocolMember (IsRequired = true, IsProperty = false, IsStatic = false, Name = \"Draw\", Selector = \"drawInRect:\", ParameterType = new Type [] { typeof (CGRect) }, ParameterByRef = new bool [] { false })]\n"
        ));
        assert!(text.contains("Name = \"Create\", Selector = \"create\", ReturnType = typeof (NSObject))]"));
        assert!(text.contains("IsStatic = true, Name = \"Create\""));
        assert!(text.contains(
            "[ProtocolMember (IsRequired = false, IsProperty = true, IsStatic = false, Name = \"Opacity\", Selector = \"opacity\", PropertyType = typeof (nfloat), GetterSelector = \"opacity\", SetterSelector = \"setOpacity:\", ArgumentSemantic = ArgumentSemantic.None)]\n"
        ));
    }

    #[test]
    fn interface_declares_required_members() {
        let text = render();
        assert!(text.contains("public interface IDrawable : INativeObject, IDisposable, INode\n{\n"));
        assert!(text.contains(
            "\t[CompilerGenerated]\n\t[Export (\"drawInRect:\")]\n\t[Preserve (Conditional = true)]\n\tvoid Draw (CGRect rect);\n\n"
        ));
        assert!(text.contains(
            "\t[Preserve (Conditional = true)]\n\tbool Visible {\n\t\t[Export (\"visible\", ArgumentSemantic.Assign)]\n\t\tget;\n\t\t[Export (\"setVisible:\", ArgumentSemantic.Assign)]\n\t\tset;\n\t}\n"
        ));
        assert!(!text.contains("void Prepare ();"));
    }

    #[test]
    fn optional_members_become_extension_methods() {
        let text = render();
        assert!(text.contains("public static partial class Drawable_Extensions {\n"));
        assert!(text.contains("\tpublic static void Prepare (this IDrawable This)\n"));
        assert!(text.contains("\tpublic static nfloat GetOpacity (this IDrawable This)\n"));
        assert!(text.contains("\tpublic static void SetOpacity (this IDrawable This, nfloat value)\n"));
        assert!(text.contains("Selector.GetHandle (\"prepare\")"));
        assert!(!text.contains("Create (this"));
    }

    #[test]
    fn wrapper_implements_inherited_requirements() {
        let text = render();
        let wrapper = &text[text.find("internal sealed class DrawableWrapper").unwrap()..];
        assert!(wrapper.starts_with(
            "internal sealed class DrawableWrapper : BaseWrapper, IDrawable {\n\tpublic DrawableWrapper (IntPtr handle)\n\t\t: base (handle, false)\n\t{\n\t}\n\n\t[Preserve (Conditional = true)]\n\tpublic DrawableWrapper (IntPtr handle, bool owns)\n\t\t: base (handle, owns)\n\t{\n\t}\n\n"
        ));
        assert!(wrapper.contains("public void Draw (CGRect rect)\n"));
        assert!(wrapper.contains("public bool Visible {\n"));
        assert!(wrapper.contains("public NSString Identifier {\n"));
        assert!(!wrapper.contains("Prepare"));
        assert!(wrapper.ends_with("}\n"));
    }

    fn diamond(p3_members: &str) -> String {
        format!(
            r#"
[[types]]
name = "P1"
namespace = "Demo"
protocol = true
members = [{{ kind = "method", name = "Foo", export = "foo", returns = "int", abstract = true }}]

[[types]]
name = "P2"
namespace = "Demo"
protocol = true
members = [{{ kind = "method", name = "Foo", export = "foo", returns = "int", abstract = true }}]

[[types]]
name = "P3"
namespace = "Demo"
protocol = true
protocols = ["P1", "P2"]
members = [{p3_members}]
"#
        )
    }

    fn generate_p3(input: &str) -> Result<String> {
        let u = TypeUniverse::new(ApiDescription::parse(input).unwrap(), ApplePlatform::Ios).unwrap();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let unit = u.api_type_by_name("Demo.P3").unwrap();
        let mut w = CodeWriter::new();
        generate_protocol(&mut ctx, &mut w, unit)?;
        Ok(w.into_string())
    }

    #[test]
    fn wrapper_generates_shared_requirements_once() {
        let text = generate_p3(&diamond("")).unwrap();
        let wrapper = &text[text.find("internal sealed class P3Wrapper").unwrap()..];
        assert_eq!(wrapper.matches("public int Foo ()").count(), 1);

        // a redeclaration with the same signature is still one member
        let text = generate_p3(&diamond(
            r#"{ kind = "method", name = "Foo", export = "foo", returns = "int", abstract = true }"#,
        ))
        .unwrap();
        let wrapper = &text[text.find("internal sealed class P3Wrapper").unwrap()..];
        assert_eq!(wrapper.matches("public int Foo ()").count(), 1);
    }

    #[test]
    fn wrapper_rejects_disagreeing_requirements() {
        let err = generate_p3(&diamond("").replacen("returns = \"int\"", "returns = \"string\"", 1)).unwrap_err();
        assert_eq!(err.code(), 1038);
        assert_eq!(err.culprit(), Some("Demo.P3.Foo"));

        let err = generate_p3(&diamond(
            r#"{ kind = "method", name = "Foo", export = "foo", returns = "long", abstract = true }"#,
        ))
        .unwrap_err();
        assert_eq!(err.code(), 1038);
        assert_eq!(err.culprit(), Some("Demo.P3.Foo"));
    }
}
