//! Whole generated types: the wrapper class of a declared type, with its
//! selector fields, constructors, members, appearance proxy and
//! notification helpers.

use msgbind_model::universe::Scope;
use msgbind_model::{PropertyDescriptor, QualName, Ty, TypeDescriptor, TypeRef};

use crate::callable::{resolve_in, Callable};
use crate::context::GenContext;
use crate::emit::field::generate_field;
use crate::emit::method::{generate_callable, generate_method, mentions_delegates, MemberSite, Shape};
use crate::emit::notification::generate_notifications;
use crate::emit::property::generate_property;
use crate::emit::protocol::generate_protocol;
use crate::emit::{write_header, CodeWriter};
use crate::error::Result;
use crate::gather::{gather, Contract};
use crate::member::{self, Host, MemberFlags};
use crate::namespace::remove_arity;

/// Per-type facts that shape the class declaration.
struct ClassKind<'a> {
    unit: &'a TypeDescriptor,
    visibility: &'static str,
    /// Static holder class: `[Static]` types and categories.
    is_static: bool,
    /// Resolved base, unless the class is static or partial.
    base: Option<Ty>,
    /// The extended type of a category.
    category_base: Option<Ty>,
}

impl<'a> ClassKind<'a> {
    fn new(ctx: &GenContext<'_>, unit: &'a TypeDescriptor) -> Result<Self> {
        let resolved = match &unit.base {
            Some(b) => Some(resolve_in(ctx.universe, unit, b)?),
            None => None,
        };
        let is_static = unit.is_static || unit.category;
        let (base, category_base) = if unit.category {
            (None, resolved)
        } else if is_static || unit.partial {
            (None, None)
        } else {
            (resolved, None)
        };
        Ok(Self {
            unit,
            visibility: if unit.internal { "internal" } else { "public" },
            is_static,
            base,
            category_base,
        })
    }

    fn name(&self) -> &str {
        remove_arity(&self.unit.name)
    }

    fn host(&self) -> Host {
        if self.unit.category {
            Host::Category
        } else {
            Host::Class
        }
    }

    fn site(&self) -> MemberSite<'_> {
        MemberSite {
            host: self.host(),
            unit: self.unit,
            category_base: self.category_base.as_ref(),
        }
    }

    /// Native class the `class_ptr` handle is looked up by.
    fn native_class(&self, ctx: &GenContext<'_>) -> String {
        match &self.category_base {
            Some(Ty::Class(q)) => ctx
                .universe
                .api_type(q)
                .map_or_else(|| q.name.clone(), |t| t.native_name().to_string()),
            _ => self.unit.native_name().to_string(),
        }
    }
}

/// `Name<T, U>` and its `where` clauses.
fn class_name(ctx: &GenContext<'_>, unit: &TypeDescriptor) -> Result<(String, String)> {
    let name = remove_arity(&unit.name).to_string();
    if unit.generic_params.is_empty() {
        return Ok((name, String::new()));
    }
    let used_in = unit.namespace.as_deref();
    let names: Vec<&str> = unit.generic_params.iter().map(|g| g.name.as_str()).collect();
    let mut wheres = String::new();
    for g in &unit.generic_params {
        let constraint = match &g.constraint {
            None => "NSObject".to_string(),
            Some(c) => match resolve_in(ctx.universe, unit, &TypeRef::named(c))? {
                Ty::Protocol(q) => {
                    let iface = ctx
                        .universe
                        .api_type(&q)
                        .map_or_else(|| format!("I{}", q.name), TypeDescriptor::interface_name);
                    format!("NSObject, {}", ctx.ns.format_name(used_in, &QualName::new(q.namespace.as_deref(), iface)))
                }
                other => ctx.format(used_in, &other),
            },
        };
        wheres.push_str(&format!("\n\twhere {} : {constraint}", g.name));
    }
    Ok((format!("{name}<{}>", names.join(", ")), wheres))
}

/// Base first, then the protocol's own interface, then the sorted
/// interfaces of the conformed protocols.
fn implements_list(ctx: &GenContext<'_>, kind: &ClassKind<'_>) -> Result<Vec<String>> {
    let unit = kind.unit;
    let used_in = unit.namespace.as_deref();
    let context = unit.full_name();
    let scope = Scope::new(used_in, &context);
    let mut list = Vec::new();
    for name in &unit.protocols {
        if let Some(p) = ctx.universe.resolve_protocol(name, &scope)? {
            let iface = ctx
                .ns
                .format_name(used_in, &QualName::new(p.namespace.as_deref(), p.interface_name()));
            if !list.contains(&iface) {
                list.push(iface);
            }
        }
    }
    list.sort();
    if unit.protocol {
        list.insert(0, unit.interface_name());
    }
    if let Some(base) = &kind.base {
        if unit.name != "NSObject" {
            list.insert(0, ctx.format(used_in, base));
        }
    }
    Ok(list)
}

fn init_binding_line(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    if ctx.options.third_party {
        emit!(w, "IsDirectBinding = GetType ().Assembly == {}.this_assembly;", ctx.messaging());
    }
}

fn mark_dirty_if_derived(ctx: &GenContext<'_>, w: &mut CodeWriter, unit: &TypeDescriptor) {
    if unit.name == "CALayer" && unit.namespace.as_deref().map(|ns| ctx.ns.get(ns)) == Some(ctx.ns.get("CoreAnimation")) {
        w.line("MarkDirtyIfDerived ();");
    }
}

fn write_direct_or_super(ctx: &GenContext<'_>, w: &mut CodeWriter, suffix: &str, args: &str, selector: &str) {
    let messaging = ctx.messaging();
    w.line("if (IsDirectBinding) {");
    emit!(
        w,
        "\tInitializeHandle ({messaging}.IntPtr_objc_msgSend{suffix} (this.Handle, {args}), \"{selector}\");"
    );
    w.line("} else {");
    emit!(
        w,
        "\tInitializeHandle ({messaging}.IntPtr_objc_msgSendSuper{suffix} (this.SuperHandle, {args}), \"{selector}\");"
    );
    w.line("}");
}

/// The `init`, `initWithCoder:`, flag and handle constructors.
fn write_constructors(ctx: &GenContext<'_>, w: &mut CodeWriter, kind: &ClassKind<'_>) {
    let unit = kind.unit;
    let name = kind.name();
    let inline = ctx.options.inline_selectors || ctx.options.third_party;
    let core = &ctx.ns.core_objc_runtime;
    let init = if inline {
        format!("global::{core}.Selector.GetHandle (\"init\")")
    } else {
        format!("global::{core}.Selector.Init")
    };
    let visibility = if unit.is_abstract { "protected" } else { "public" };

    w.line("[CompilerGenerated]");
    w.line("[EditorBrowsable (EditorBrowsableState.Advanced)]");
    w.line("[Export (\"init\")]");
    emit!(w, "{visibility} {name} () : base (NSObjectFlag.Empty)");
    w.line("{");
    {
        let _i = w.indent();
        if ctx.external() {
            emit!(
                w,
                "InitializeHandle ({}.IntPtr_objc_msgSend (this.Handle, {init}), \"init\");",
                ctx.messaging()
            );
        } else {
            init_binding_line(ctx, w);
            write_direct_or_super(ctx, w, "", &init, "init");
            mark_dirty_if_derived(ctx, w, unit);
        }
    }
    w.line("}");
    w.blank();

    let full = unit.full_name();
    let nscoding = ctx.universe.conforms_to(&full, "NSCoding") || ctx.universe.conforms_to(&full, "INSCoding");
    if nscoding && !ctx.external() {
        let coder = if inline {
            "Selector.GetHandle (\"initWithCoder:\")"
        } else {
            "Selector.InitWithCoder"
        };
        w.line("[CompilerGenerated]");
        w.line("[DesignatedInitializer]");
        w.line("[EditorBrowsable (EditorBrowsableState.Advanced)]");
        w.line("[Export (\"initWithCoder:\")]");
        emit!(w, "{visibility} {name} (NSCoder coder) : base (NSObjectFlag.Empty)");
        w.line("{");
        {
            let _i = w.indent();
            init_binding_line(ctx, w);
            w.blank();
            write_direct_or_super(ctx, w, "_IntPtr", &format!("{coder}, coder.Handle"), "initWithCoder:");
            mark_dirty_if_derived(ctx, w, unit);
        }
        w.line("}");
        w.blank();
    }

    for (decl, base) in [
        (format!("protected {name} (NSObjectFlag t)"), "t"),
        (format!("protected internal {name} (IntPtr handle)"), "handle"),
    ] {
        w.line("[CompilerGenerated]");
        w.line("[EditorBrowsable (EditorBrowsableState.Advanced)]");
        emit!(w, "{decl} : base ({base})");
        w.line("{");
        {
            let _i = w.indent();
            init_binding_line(ctx, w);
            mark_dirty_if_derived(ctx, w, unit);
        }
        w.line("}");
        w.blank();
    }
}

/// Category properties cannot be extension properties; they become
/// `Get`/`Set` extension method pairs.
fn write_category_property(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    site: &MemberSite<'_>,
    p: &PropertyDescriptor,
) -> Result<()> {
    let flags = MemberFlags::property(p);
    let getter = Callable::getter(ctx.universe, site.unit, p)?;
    let mods = member::modifiers(Host::Category, site.unit, flags).with_unsafe(mentions_delegates(&getter));
    let shape = Shape {
        export: Some(&getter.selector),
        wrap: None,
    };
    generate_callable(ctx, w, site, &getter, mods, shape)?;
    if p.can_write() {
        let setter = Callable::setter(ctx.universe, site.unit, p)?;
        let mods = member::modifiers(Host::Category, site.unit, flags).with_unsafe(mentions_delegates(&setter));
        let shape = Shape {
            export: Some(&setter.selector),
            wrap: None,
        };
        generate_callable(ctx, w, site, &setter, mods, shape)?;
    }
    Ok(())
}

fn write_dispose(w: &mut CodeWriter, fields: &mut [String]) {
    fields.sort();
    w.line("[CompilerGenerated]");
    w.line("protected override void Dispose (bool disposing)");
    w.line("{");
    {
        let _i = w.indent();
        w.line("base.Dispose (disposing);");
        w.line("if (Handle == IntPtr.Zero) {");
        for f in fields.iter() {
            emit!(w, "\t{f} = null;");
        }
        w.line("}");
    }
    w.line("}");
}

/// The nested appearance proxy and the static accessors returning it.
fn write_appearance(ctx: &mut GenContext<'_>, w: &mut CodeWriter, kind: &ClassKind<'_>, contract: &Contract<'_>) -> Result<()> {
    let unit = kind.unit;
    let name = kind.name();
    let full = unit.full_name();
    let parent = ctx.hierarchy.parent(&full).map(str::to_string);
    let inherited = parent.as_deref().is_some_and(|p| ctx.hierarchy.has_appearance(p));
    let base_class = match parent.as_deref().filter(|_| inherited) {
        Some(p) => {
            let (ns, short) = p.rsplit_once('.').map_or((None, p), |(ns, short)| (Some(ns), short));
            let short = remove_arity(short);
            match ns {
                Some(ns) => format!("global::{}.{short}.{short}Appearance", ctx.ns.get(ns)),
                None => format!("global::{short}.{short}Appearance"),
            }
        }
        None => "UIAppearance".to_string(),
    };
    let appearance = format!("{name}Appearance");
    let new = if inherited { "new " } else { "" };

    emit!(w, "public partial class {appearance} : {base_class} {{");
    {
        let _i = w.indent();
        emit!(w, "protected internal {appearance} (IntPtr handle) : base (handle) {{}}");
        w.blank();
        let site = kind.site();
        let mut ignored = Vec::new();
        let methods = contract.methods.iter().filter(|cm| cm.method.appearance);
        for cm in methods {
            generate_method(ctx, w, &site, cm)?;
        }
        let properties = contract
            .properties
            .iter()
            .filter(|cp| cp.property.appearance && cp.property.field.is_none());
        for cp in properties {
            generate_property(ctx, w, &site, cp, &mut ignored)?;
        }
    }
    w.line("}");
    w.blank();

    let selector = if ctx.options.inline_selectors {
        format!("{}.Selector.GetHandle (\"appearance\")", ctx.ns.core_objc_runtime)
    } else {
        "UIAppearance.SelectorAppearance".to_string()
    };
    let messaging = ctx.messaging();
    emit!(w, "public static {new}{appearance} Appearance {{");
    emit!(
        w,
        "\tget {{ return new {appearance} ({messaging}.IntPtr_objc_msgSend (class_ptr, {selector})); }}"
    );
    w.line("}");
    w.blank();
    emit!(w, "public static {new}{appearance} GetAppearance<T> () where T: {name} {{");
    emit!(
        w,
        "\treturn new {appearance} ({messaging}.IntPtr_objc_msgSend (Class.GetHandle (typeof (T)), {selector}));"
    );
    w.line("}");
    w.blank();
    emit!(w, "public static {new}{appearance} AppearanceWhenContainedIn (params Type [] containers)");
    w.line("{");
    emit!(w, "\treturn new {appearance} (UIAppearance.GetAppearance (class_ptr, containers));");
    w.line("}");
    w.blank();
    let traits = [
        ("GetAppearance (UITraitCollection traits)", "class_ptr, traits"),
        (
            "GetAppearance (UITraitCollection traits, params Type [] containers)",
            "class_ptr, traits, containers",
        ),
        (
            "GetAppearance<T> (UITraitCollection traits)",
            "Class.GetHandle (typeof (T)), traits",
        ),
        (
            "GetAppearance<T> (UITraitCollection traits, params Type [] containers)",
            "Class.GetHandle (typeof (T)), traits, containers",
        ),
    ];
    for (decl, args) in traits {
        let constraint = if decl.starts_with("GetAppearance<T>") {
            format!(" where T: {name}")
        } else {
            String::new()
        };
        emit!(w, "public static {new}{appearance} {decl}{constraint} {{");
        emit!(w, "\treturn new {appearance} (UIAppearance.GetAppearance ({args}));");
        w.line("}");
        w.blank();
    }
    Ok(())
}

/// Members, fields, dispose, appearance and notifications, in that order.
fn write_members(ctx: &mut GenContext<'_>, w: &mut CodeWriter, kind: &ClassKind<'_>, contract: &Contract<'_>) -> Result<()> {
    let unit = kind.unit;
    let site = kind.site();
    let mut dispose_fields = Vec::new();

    for cm in &contract.methods {
        generate_method(ctx, w, &site, cm)?;
    }

    let mut fields: Vec<&PropertyDescriptor> = Vec::new();
    for cp in &contract.properties {
        let p = cp.property;
        if p.field.is_some() {
            fields.push(p);
            continue;
        }
        if kind.host() == Host::Category {
            write_category_property(ctx, w, &site, p)?;
        } else {
            generate_property(ctx, w, &site, cp, &mut dispose_fields)?;
        }
    }

    fields.sort_by(|a, b| a.name.cmp(&b.name));
    for p in &fields {
        if let Some(fb) = &p.field {
            generate_field(ctx, w, unit, p, fb)?;
        }
    }

    if !kind.is_static && !dispose_fields.is_empty() {
        write_dispose(w, &mut dispose_fields);
    }

    if ctx.hierarchy.has_appearance(&unit.full_name()) {
        write_appearance(ctx, w, kind, contract)?;
    }

    let notifications: Vec<&PropertyDescriptor> = fields.into_iter().filter(|p| p.notification.is_some()).collect();
    if !notifications.is_empty() {
        w.blank();
        generate_notifications(ctx, w, unit, &notifications)?;
    }
    Ok(())
}

/// Generate the class of `unit`, inside its namespace block.
pub fn generate_class(ctx: &mut GenContext<'_>, w: &mut CodeWriter, unit: &TypeDescriptor) -> Result<()> {
    let kind = ClassKind::new(ctx, unit)?;
    let contract = gather(ctx.universe, ctx.options, unit)?;
    ctx.selectors.reset();
    tracing::debug!(type_name = %unit.full_name(), "generating class");

    let mut members = CodeWriter::new();
    write_members(ctx, &mut members, &kind, &contract)?;

    let class_mod = if kind.is_static {
        "static "
    } else if unit.partial {
        ""
    } else {
        if unit.protocol {
            w.line("[Protocol]");
        }
        emit!(w, "[Register(\"{}\", {})]", unit.native_name(), !unit.model);
        if unit.is_abstract {
            "abstract "
        } else {
            ""
        }
    };
    if unit.model {
        w.line("[Model]");
    }

    let (name, wheres) = class_name(ctx, unit)?;
    let implements = implements_list(ctx, &kind)?;
    let mut header = format!("{} unsafe {class_mod}partial class {name}", kind.visibility);
    if !implements.is_empty() {
        header.push_str(" : ");
        header.push_str(&implements.join(", "));
    }
    header.push_str(&wheres);
    header.push_str(" {");
    w.line(&header);
    {
        let _i = w.indent();
        if !unit.model && !unit.partial && !ctx.options.inline_selectors {
            let mut fields = ctx.selectors.fields();
            fields.sort();
            for (sel, field) in fields {
                w.line("[CompilerGenerated]");
                emit!(w, "const string {field} = \"{sel}\";");
                emit!(w, "static readonly IntPtr {field}Handle = Selector.GetHandle (\"{sel}\");");
            }
        }
        w.blank();

        if (!(kind.is_static || unit.partial) || unit.category) && !unit.model {
            w.line("[CompilerGenerated]");
            emit!(w, "static readonly IntPtr class_ptr = Class.GetHandle (\"{}\");", kind.native_class(ctx));
            w.blank();
        }

        if !kind.is_static && !unit.partial {
            if !unit.model && !ctx.external() {
                let dispatch = if unit.name == "NSObject" { "virtual" } else { "override" };
                emit!(w, "public {dispatch} IntPtr ClassHandle {{ get {{ return class_ptr; }} }}");
                w.blank();
            }
            if unit.name != "NSObject" {
                write_constructors(ctx, w, &kind);
            }
        }

        w.fragment(members.as_str());
    }
    emit!(w, "}} /* class {} */", kind.name());
    Ok(())
}

/// Generate the complete unit of one declared type: protocol artifacts
/// first, then the class unless the protocol has no base type.
pub fn generate_type(ctx: &mut GenContext<'_>, unit: &TypeDescriptor) -> Result<String> {
    let mut w = CodeWriter::new();
    write_header(ctx, &mut w);
    let namespace = unit.namespace.as_deref().map(|ns| ctx.ns.get(ns));

    let mut sections: Vec<String> = Vec::new();
    if unit.protocol {
        let mut body = CodeWriter::new();
        generate_protocol(ctx, &mut body, unit)?;
        sections.push(body.into_string());
    }
    if !unit.protocol || unit.base.is_some() {
        let mut body = CodeWriter::new();
        generate_class(ctx, &mut body, unit)?;
        sections.push(body.into_string());
    }

    for section in sections {
        match &namespace {
            Some(ns) => {
                emit!(w, "namespace {ns} {{");
                {
                    let _i = w.indent();
                    w.fragment(&section);
                }
                w.line("}");
            }
            None => w.raw(&section),
        }
    }
    Ok(w.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    const DESC: &str = r#"
[[types]]
name = "Widget"
namespace = "Demo"
base = "NSObject"
protocols = ["NSCoding", "Drawable"]
members = [
    { kind = "method", name = "Reload", export = "reload" },
    { kind = "property", name = "Delegate", type = "NSObject", export = "delegate", semantic = "assign" },
    { kind = "property", name = "ChangedNotification", type = "NSString", static = true, readonly = true, field = { symbol = "DWChangedNotification" }, notification = {} },
]

[[types]]
name = "Drawable"
namespace = "Demo"
protocol = true
members = [{ kind = "method", name = "Draw", export = "draw", abstract = true }]

[[types]]
name = "Shape"
namespace = "Demo"
protocol = true
base = "NSObject"
model = true
members = [{ kind = "method", name = "Area", export = "area", returns = "double" }]

[[types]]
name = "Sizing"
namespace = "Demo"
base = "Widget"
category = true
members = [
    { kind = "method", name = "Fit", export = "fit" },
    { kind = "property", name = "Scale", type = "nfloat", export = "scale" },
]

[[types]]
name = "Button"
namespace = "Demo"
base = "NSObject"
protocols = ["UIAppearance"]
members = [{ kind = "property", name = "Tint", type = "UIColor", export = "tint", appearance = true, semantic = "retain" }]

[[types]]
name = "RoundButton"
namespace = "Demo"
base = "Button"
abstract = true

[[types]]
name = "Box"
namespace = "Demo"
base = "NSObject"
generic-params = [{ name = "T" }]
"#;

    fn render_with(opts: &GeneratorOptions, ty: &str) -> String {
        let u = TypeUniverse::new(ApiDescription::parse(DESC).unwrap(), ApplePlatform::Ios).unwrap();
        let mut ctx = GenContext::new(&u, opts);
        for t in u.types() {
            ctx.hierarchy.register(&u, &t.full_name()).unwrap();
        }
        let unit = u.api_type_by_name(ty).unwrap();
        generate_type(&mut ctx, unit).unwrap()
    }

    fn render(ty: &str) -> String {
        render_with(&GeneratorOptions::default(), ty)
    }

    #[test]
    fn classes_register_and_implement_protocols() {
        let text = render("Demo.Widget");
        assert!(text.starts_with("//\n// Auto-generated by msgbind, do not edit\n"));
        assert!(text.contains(
            "namespace Demo {\n\t[Register(\"Widget\", true)]\n\tpublic unsafe partial class Widget : NSObject, IDrawable {\n"
        ));
        assert!(text.contains(
            "\t\t[CompilerGenerated]\n\t\tconst string selDraw = \"draw\";\n\t\tstatic readonly IntPtr selDrawHandle = Selector.GetHandle (\"draw\");\n"
        ));
        let draw = text.find("const string selDraw").unwrap();
        let reload = text.find("const string selReload").unwrap();
        assert!(draw < reload);
        assert!(text.contains("\t\tstatic readonly IntPtr class_ptr = Class.GetHandle (\"Widget\");\n"));
        assert!(text.contains("\t\tpublic override IntPtr ClassHandle { get { return class_ptr; } }\n"));
        assert!(text.contains("\t\tpublic virtual void Draw ()\n"));
        assert!(text.ends_with("\t} /* class Widget */\n}\n"));
    }

    #[test]
    fn constructors_cover_init_coder_flag_and_handle() {
        let text = render("Demo.Widget");
        assert!(text.contains(
            "\t\t[Export (\"init\")]\n\t\tpublic Widget () : base (NSObjectFlag.Empty)\n\t\t{\n\t\t\tif (IsDirectBinding) {\n\t\t\t\tInitializeHandle (global::ObjCRuntime.Messaging.IntPtr_objc_msgSend (this.Handle, global::ObjCRuntime.Selector.Init), \"init\");\n\t\t\t} else {\n\t\t\t\tInitializeHandle (global::ObjCRuntime.Messaging.IntPtr_objc_msgSendSuper (this.SuperHandle, global::ObjCRuntime.Selector.Init), \"init\");\n\t\t\t}\n\t\t}\n"
        ));
        assert!(text.contains("\t\tpublic Widget (NSCoder coder) : base (NSObjectFlag.Empty)\n"));
        assert!(text.contains("IntPtr_objc_msgSend_IntPtr (this.Handle, Selector.InitWithCoder, coder.Handle), \"initWithCoder:\");"));
        assert!(text.contains("\t\tprotected Widget (NSObjectFlag t) : base (t)\n\t\t{\n\t\t}\n"));
        assert!(text.contains("\t\tprotected internal Widget (IntPtr handle) : base (handle)\n\t\t{\n\t\t}\n"));
    }

    #[test]
    fn backing_fields_are_cleared_on_dispose() {
        let text = render("Demo.Widget");
        assert!(text.contains(
            "\t\tprotected override void Dispose (bool disposing)\n\t\t{\n\t\t\tbase.Dispose (disposing);\n\t\t\tif (Handle == IntPtr.Zero) {\n\t\t\t\t__mt_Delegate_var = null;\n\t\t\t}\n\t\t}\n"
        ));
    }

    #[test]
    fn fields_and_notifications_follow_members() {
        let text = render("Demo.Widget");
        let field = text.find("[Field (\"DWChangedNotification\"").unwrap();
        let notifications = text.find("public static partial class Notifications").unwrap();
        let dispose = text.find("Dispose (bool disposing)").unwrap();
        assert!(field < dispose && dispose < notifications);
        assert!(text.contains("ObserveChanged (EventHandler<NSNotificationEventArgs> handler)"));
    }

    #[test]
    fn third_party_constructors_set_direct_binding() {
        let opts = GeneratorOptions {
            third_party: true,
            ..GeneratorOptions::default()
        };
        let text = render_with(&opts, "Demo.Widget");
        assert!(text.contains(
            "\t\t\tIsDirectBinding = GetType ().Assembly == global::ObjCRuntime.Messaging.this_assembly;\n\t\t\tif (IsDirectBinding) {\n"
        ));
        assert!(text.contains("global::ObjCRuntime.Selector.GetHandle (\"init\")"));
    }

    #[test]
    fn protocol_models_get_interface_and_class() {
        let text = render("Demo.Shape");
        let iface = text.find("public interface IShape").unwrap();
        let class = text.find("[Protocol]\n\t[Register(\"Shape\", false)]\n\t[Model]\n\tpublic unsafe partial class Shape : NSObject, IShape {").unwrap();
        assert!(iface < class);
        assert!(text.contains("throw new You_Should_Not_Call_base_In_This_Method ();"));
        assert!(!text.contains("class_ptr ="));

        let text = render("Demo.Drawable");
        assert!(text.contains("interface IDrawable"));
        assert!(!text.contains("partial class Drawable "));
    }

    #[test]
    fn categories_are_static_extension_classes() {
        let text = render("Demo.Sizing");
        assert!(text.contains("\tpublic unsafe static partial class Sizing {\n"));
        assert!(text.contains("\t\tstatic readonly IntPtr class_ptr = Class.GetHandle (\"Widget\");\n"));
        assert!(text.contains("\t\tpublic static void Fit (this Widget This)\n"));
        assert!(text.contains("\t\tpublic static nfloat GetScale (this Widget This)\n"));
        assert!(text.contains("\t\tpublic static void SetScale (this Widget This, nfloat value)\n"));
        assert!(!text.contains("ClassHandle"));
        assert!(!text.contains("NSObjectFlag t"));
    }

    #[test]
    fn appearance_proxies_follow_the_hierarchy() {
        let text = render("Demo.Button");
        assert!(text.contains("\t\tpublic partial class ButtonAppearance : UIAppearance {\n"));
        assert!(text.contains("\t\t\tprotected internal ButtonAppearance (IntPtr handle) : base (handle) {}\n"));
        assert!(text.contains("\t\t\tpublic virtual UIColor Tint {\n"));
        assert!(text.contains(
            "\t\tpublic static ButtonAppearance Appearance {\n\t\t\tget { return new ButtonAppearance (global::ObjCRuntime.Messaging.IntPtr_objc_msgSend (class_ptr, UIAppearance.SelectorAppearance)); }\n\t\t}\n"
        ));

        let text = render("Demo.RoundButton");
        assert!(text.contains("\tpublic unsafe abstract partial class RoundButton : Button {\n"));
        assert!(text.contains("\t\tpublic partial class RoundButtonAppearance : global::Demo.Button.ButtonAppearance {\n"));
        assert!(text.contains("\t\tpublic static new RoundButtonAppearance Appearance {\n"));
        assert!(text.contains("\t\tprotected RoundButton () : base (NSObjectFlag.Empty)\n"));
    }

    #[test]
    fn generic_classes_constrain_to_nsobject() {
        let text = render("Demo.Box");
        assert!(text.contains("\tpublic unsafe partial class Box<T> : NSObject\n\t\twhere T : NSObject {\n"));
        assert!(text.contains("\t\tpublic Box () : base (NSObjectFlag.Empty)\n"));
    }
}
