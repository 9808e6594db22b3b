//! Native encodings and argument expressions.
//!
//! [`marshal_type`] decides how a managed type appears in an entry-point
//! signature, [`marshal_parameter`] how an argument is passed at a call
//! site, and [`returns_wrappers`] how a raw native return is turned back
//! into a managed value.

use msgbind_model::{Primitive, Ty};

use crate::abi::is_native_enum;
use crate::callable::{Callable, CallableKind, Param};
use crate::context::GenContext;
use crate::error::{BindingError, Result};
use crate::namespace::safe_param_name;

/// Width used for native enums at one call path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumMode {
    /// 32-bit ABIs: native enums narrowed to `int`/`uint`.
    Bit32,
    /// 64-bit ABIs: native enums at their declared width.
    Bit64,
    /// Pointer-sized values (`nint`/`nuint`), as seen by callbacks.
    NativeBits,
}

/// How type names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming<'a> {
    /// Short runtime names, as used inside entry-point names.
    Signature,
    /// Source spelling relative to a namespace.
    Source(Option<&'a str>),
}

fn enum_underlying(ctx: &GenContext<'_>, ty: &Ty) -> Option<(Primitive, bool)> {
    match ty {
        Ty::Enum(q) => ctx.universe.enum_descriptor(q).map(|e| (e.underlying, e.native)),
        _ => None,
    }
}

/// `nint` or `nuint` for a native enum.
pub fn native_enum_type(ctx: &GenContext<'_>, ty: &Ty) -> Result<&'static str> {
    match enum_underlying(ctx, ty) {
        Some((Primitive::Long, _)) => Ok("nint"),
        Some((Primitive::ULong, _)) => Ok("nuint"),
        _ => Err(BindingError::new(1029, format!("Internal error: invalid enum type '{ty}'"))),
    }
}

fn primitive_name(p: Primitive, naming: Naming<'_>) -> String {
    match naming {
        Naming::Signature => p.signature_name().to_string(),
        Naming::Source(_) => p.keyword().to_string(),
    }
}

/// The scalar an enum or primitive is passed as.
pub fn primitive_type(ctx: &GenContext<'_>, ty: &Ty, naming: Naming<'_>, mode: EnumMode) -> Result<String> {
    match ty {
        Ty::Void => Ok("void".to_string()),
        Ty::Primitive(p) => Ok(primitive_name(*p, naming)),
        Ty::Enum(_) => {
            let Some((mut underlying, native)) = enum_underlying(ctx, ty) else {
                return Ok(primitive_name(Primitive::Int, naming));
            };
            if native {
                if !matches!(underlying, Primitive::Long | Primitive::ULong) {
                    return Err(BindingError::new(
                        1026,
                        format!("`{ty}`: Enums attributed with [Native] must have an underlying type of `long` or `ulong`"),
                    ));
                }
                match mode {
                    EnumMode::Bit32 => {
                        underlying = if underlying == Primitive::Long {
                            Primitive::Int
                        } else {
                            Primitive::UInt
                        };
                    }
                    EnumMode::Bit64 => {}
                    EnumMode::NativeBits => {
                        return Err(BindingError::new(
                            1029,
                            format!("Internal error: invalid enum mode for type '{ty}'"),
                        ));
                    }
                }
            }
            Ok(primitive_name(underlying, naming))
        }
        Ty::Struct(q) => Ok(match naming {
            Naming::Signature => q.name.clone(),
            Naming::Source(ns) => ctx.format(ns, ty),
        }),
        other => Ok(ctx.format(None, other)),
    }
}

/// Whether an array of `elem` crosses as an `NSArray` handle. Value-type
/// elements have no array marshaling.
pub fn is_array_element(ctx: &GenContext<'_>, elem: &Ty) -> bool {
    match elem {
        Ty::String | Ty::Class(_) | Ty::Protocol(_) | Ty::NativeObject(_) | Ty::GenericParam(_) => true,
        other => ctx.registry.lookup(other).is_some(),
    }
}

/// The error for a parameter no marshaling rule covers.
pub fn unsupported_parameter(callable: &Callable, param: &Param) -> BindingError {
    BindingError::new(
        1002,
        format!("Unknown kind {} {} in method '{}'", param.ty, param.name, callable.display_name()),
    )
    .with_culprit(callable.display_name())
}

/// Type of a value in an entry-point signature (`UIView` becomes `IntPtr`).
pub fn marshal_type(
    ctx: &GenContext<'_>,
    ty: &Ty,
    plain_string: bool,
    aligned: bool,
    naming: Naming<'_>,
    mode: EnumMode,
) -> Result<String> {
    if aligned {
        return Ok("IntPtr".to_string());
    }
    match ty {
        Ty::Enum(_) => return primitive_type(ctx, ty, naming, mode),
        Ty::Class(_) | Ty::Protocol(_) => return Ok("IntPtr".to_string()),
        Ty::Primitive(_) => return primitive_type(ctx, ty, naming, mode),
        Ty::String => {
            return Ok(if plain_string { "string" } else { "IntPtr" }.to_string());
        }
        _ => {}
    }
    if let Some(entry) = ctx.registry.lookup(ty) {
        return Ok(entry.encoding.to_string());
    }
    match ty {
        Ty::Struct(_) => primitive_type(ctx, ty, naming, mode),
        Ty::Array(elem) if is_array_element(ctx, elem) => Ok("IntPtr".to_string()),
        Ty::ByRef { kind, elem } if elem.is_value_type() => {
            let name = match (naming, elem.as_ref()) {
                (Naming::Signature, Ty::Primitive(p)) => p.clr_name().to_string(),
                (Naming::Signature, Ty::Struct(q) | Ty::Enum(q)) => q.name.clone(),
                (Naming::Source(ns), e) => ctx.format(ns, e),
                (Naming::Signature, e) => e.to_string(),
            };
            Ok(format!("{} {name}", kind.keyword()))
        }
        Ty::Delegate { .. } | Ty::DictionaryContainer(_) => Ok("IntPtr".to_string()),
        Ty::ByRef { .. } => Ok("ref IntPtr".to_string()),
        Ty::GenericParam(_) => Ok("IntPtr".to_string()),
        Ty::Void => Ok("void".to_string()),
        other => Err(BindingError::new(
            1017,
            format!("Do not know how to make a signature for {other}"),
        )),
    }
}

/// Whether `param` is passed as a stack-allocated native string.
pub fn is_zero_copy(ctx: &GenContext<'_>, callable: &Callable, param: &Param) -> bool {
    param.ty.is_string()
        && !param.plain_string
        && ctx.options.zero_copy_strings
        && !callable.disable_zero_copy
        && !param.disable_zero_copy
}

fn or_null(name: &str, nullable: bool, access: String) -> String {
    if nullable {
        format!("{name} == null ? IntPtr.Zero : {access}")
    } else {
        access
    }
}

/// The argument expression passed to the entry point for `param`.
pub fn marshal_parameter(
    ctx: &GenContext<'_>,
    callable: &Callable,
    param: &Param,
    null_allowed_override: bool,
    mode: EnumMode,
) -> Result<String> {
    let raw = param.name.as_str();
    let safe = safe_param_name(raw);
    let nullable = null_allowed_override || param.null_allowed;
    let ty = &param.ty;

    if let Ty::ByRef { elem, .. } = ty {
        if !elem.is_value_type() {
            return Ok(format!("ref {safe}Value"));
        }
    }
    if ty.is_wrapped() {
        return Ok(or_null(&safe, nullable, format!("{safe}.Handle")));
    }
    if let Ty::Enum(_) = ty {
        if mode != EnumMode::NativeBits {
            return Ok(format!("({}){safe}", primitive_type(ctx, ty, Naming::Signature, mode)?));
        }
        if is_native_enum(ctx.universe, ty) {
            let cast = native_enum_type(ctx, ty)?;
            let wide = if cast == "nint" { "long" } else { "ulong" };
            return Ok(format!("({cast}) ({wide}) {safe}"));
        }
    }
    if let Ty::Primitive(p) = ty {
        if p.is_direct_native() {
            return Ok(safe);
        }
    }
    if ty.is_string() {
        if param.plain_string {
            return Ok(safe);
        }
        if is_zero_copy(ctx, callable, param) {
            return Ok(or_null(raw, nullable, format!("(IntPtr)(&_s{raw})")));
        }
        return Ok(format!("ns{raw}"));
    }
    if ty.is_value_type() {
        return Ok(safe);
    }
    if let Some(entry) = ctx.registry.lookup(ty) {
        return Ok(or_null(&safe, nullable, entry.nativize(&safe)));
    }
    match ty {
        Ty::Array(elem) if is_array_element(ctx, elem) => {
            Ok(or_null(&format!("nsa_{raw}"), nullable, format!("nsa_{raw}.Handle")))
        }
        Ty::ByRef { kind, .. } => Ok(format!("{} {safe}", kind.keyword())),
        Ty::Delegate { .. } => Ok(format!("(IntPtr) block_ptr_{raw}")),
        Ty::DictionaryContainer(_) => Ok(or_null(&safe, nullable, format!("{safe}.Dictionary.Handle"))),
        Ty::GenericParam(_) => Ok(or_null(&safe, nullable, format!("{safe}.Handle"))),
        _ => Err(unsupported_parameter(callable, param)),
    }
}

/// Whether the caller must reject a null argument for `param`.
pub fn needs_null_check(callable: &Callable, param: &Param) -> bool {
    if param.ty.is_by_ref() || param.null_allowed {
        return false;
    }
    if callable.kind == CallableKind::Setter && callable.null_allowed {
        return false;
    }
    if param.ty.is_wrapped() {
        return true;
    }
    !param.ty.is_value_type()
}

/// Text wrapped around a native call to produce the managed return value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnWrappers {
    pub cast_a: String,
    pub cast_b: String,
    /// Statements run after the call, on the temporary `ret`.
    pub postproc: Option<String>,
}

impl ReturnWrappers {
    fn new(cast_a: impl Into<String>, cast_b: impl Into<String>) -> Self {
        Self {
            cast_a: cast_a.into(),
            cast_b: cast_b.into(),
            postproc: None,
        }
    }
}

/// Sentinel fix-up for a native enum read through a 32-bit path: the
/// narrowed all-ones (or max) value is widened back when the enum declares it.
fn enum_sentinel(ctx: &GenContext<'_>, callable: &Callable, mode: EnumMode) -> Option<String> {
    if mode != EnumMode::Bit32 || !is_native_enum(ctx.universe, &callable.returns) {
        return None;
    }
    let (underlying, _) = enum_underlying(ctx, &callable.returns)?;
    let (ty, ity, max) = if underlying == Primitive::ULong {
        ("ulong", "uint", u64::MAX as i128)
    } else {
        ("long", "int", i64::MAX as i128)
    };
    let declared = match &callable.returns {
        Ty::Enum(q) => ctx.universe.enum_descriptor(q)?,
        _ => return None,
    };
    if !declared.contains_value(max) {
        return None;
    }
    let name = ctx.format(callable.ns(), &callable.returns);
    let mut text = format!("if (({ty}) ret == ({ty}) {ity}.MaxValue) ret = ({name}) {ty}.MaxValue;");
    if ty == "long" {
        text.push_str(&format!(
            "\nelse if (({ty}) ret == ({ty}) {ity}.MinValue) ret = ({name}) {ty}.MinValue;"
        ));
    }
    Some(text)
}

/// How the raw native return of `callable` becomes the managed value.
pub fn returns_wrappers(ctx: &GenContext<'_>, callable: &Callable, mode: EnumMode) -> ReturnWrappers {
    let ns = callable.ns();
    let ret = &callable.returns;
    let postproc = enum_sentinel(ctx, callable, mode);

    let mut w = if let Ty::Enum(_) = ret {
        ReturnWrappers::new(format!("({}) ", ctx.format(ns, ret)), "")
    } else if let Some(entry) = ctx.registry.lookup(ret) {
        if entry.has_custom_create {
            ReturnWrappers::new(entry.create.clone(), ")")
        } else {
            ReturnWrappers::default()
        }
    } else {
        match ret {
            Ty::Protocol(_) => ReturnWrappers::new(
                format!(" Runtime.GetINativeObject<{}> (", ctx.format(ns, ret)),
                ", false)",
            ),
            Ty::Class(_) => {
                ReturnWrappers::new(format!(" Runtime.GetNSObject<{}> (", ctx.format(ns, ret)), ")")
            }
            Ty::GenericParam(name) => {
                ReturnWrappers::new(format!(" Runtime.GetINativeObject<{name}> ("), ", false)")
            }
            Ty::String => ReturnWrappers::new("NSString.FromHandle (", ")"),
            Ty::DictionaryContainer(_) => ReturnWrappers::new(
                format!("new {} (Runtime.GetNSObject<NSDictionary> (", ctx.format(ns, ret)),
                "))",
            ),
            Ty::Array(elem) => {
                let cast_a = match elem.as_ref() {
                    Ty::String => "NSArray.StringArrayFromHandle (".to_string(),
                    e => match e.qual_name() {
                        Some(q)
                            if q.namespace.as_deref().is_some_and(|n| {
                                ctx.ns.conflicting_with_types.contains(&ctx.ns.get(n))
                            }) =>
                        {
                            format!("NSArray.ArrayFromHandle<{}>(", ctx.ns.global_name(q))
                        }
                        _ => format!("NSArray.ArrayFromHandle<{}>(", ctx.format(ns, e)),
                    },
                };
                ReturnWrappers::new(cast_a, ")")
            }
            _ => ReturnWrappers::default(),
        }
    };
    w.postproc = postproc;
    w
}

/// A registry-marshaled return without a custom factory is read into an
/// `IntPtr` and checked for zero before wrapping.
pub fn needs_ptr_zero_check(ctx: &GenContext<'_>, ty: &Ty) -> bool {
    ctx.registry
        .lookup(ty)
        .is_some_and(|entry| !entry.has_custom_create)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, QualName, RefKind, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    const DESC: &str = r#"
[[enums]]
name = "Mask"
namespace = "Demo"
underlying = "ulong"
native = true
values = [{ name = "None", value = 0 }, { name = "All", value = "0xffffffffffffffff" }]

[[enums]]
name = "Level"
namespace = "Demo"
underlying = "long"
native = true
values = [{ name = "Low", value = 0 }]

[[enums]]
name = "Narrow"
namespace = "Demo"
underlying = "int"
native = true

[[enums]]
name = "Plain"
namespace = "Demo"
underlying = "uint"

[[structs]]
name = "Pair"
namespace = "Demo"
fields = [{ name = "a", type = "int" }, { name = "b", type = "int" }]

[[external]]
name = "Sheet"
namespace = "Demo"
kind = "native-object"
"#;

    fn universe() -> TypeUniverse {
        TypeUniverse::new(ApiDescription::parse(DESC).unwrap(), ApplePlatform::Ios).unwrap()
    }

    fn e(name: &str) -> Ty {
        Ty::Enum(QualName::parse(name))
    }

    fn sig(ctx: &GenContext<'_>, ty: &Ty, mode: EnumMode) -> Result<String> {
        marshal_type(ctx, ty, false, false, Naming::Signature, mode)
    }

    fn method(returns: Ty, params: Vec<Param>) -> Callable {
        Callable::from_signature("Foo", Some("Demo".to_string()), returns, params)
    }

    #[test]
    fn signature_names() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);
        assert_eq!(sig(&ctx, &Ty::Primitive(Primitive::Double), EnumMode::Bit32).unwrap(), "Double");
        assert_eq!(sig(&ctx, &Ty::Primitive(Primitive::Int), EnumMode::Bit32).unwrap(), "int");
        assert_eq!(sig(&ctx, &Ty::Primitive(Primitive::NInt), EnumMode::Bit32).unwrap(), "nint");
        assert_eq!(sig(&ctx, &Ty::String, EnumMode::Bit32).unwrap(), "IntPtr");
        assert_eq!(
            marshal_type(&ctx, &Ty::String, true, false, Naming::Signature, EnumMode::Bit32).unwrap(),
            "string"
        );
        assert_eq!(sig(&ctx, &Ty::Struct(QualName::parse("Demo.Pair")), EnumMode::Bit32).unwrap(), "Pair");
        assert_eq!(
            sig(&ctx, &Ty::NativeObject(QualName::parse("Demo.Sheet")), EnumMode::Bit32).unwrap(),
            "IntPtr"
        );
        let out_int = Ty::ByRef {
            kind: RefKind::Out,
            elem: Box::new(Ty::Primitive(Primitive::Int)),
        };
        assert_eq!(sig(&ctx, &out_int, EnumMode::Bit32).unwrap(), "out Int32");
        assert_eq!(
            marshal_type(&ctx, &out_int, false, false, Naming::Source(None), EnumMode::Bit32).unwrap(),
            "out int"
        );
        let out_obj = Ty::ByRef {
            kind: RefKind::Out,
            elem: Box::new(Ty::Class(QualName::parse("Foundation.NSError"))),
        };
        assert_eq!(sig(&ctx, &out_obj, EnumMode::Bit32).unwrap(), "ref IntPtr");
    }

    #[test]
    fn native_enums_narrow_on_32_bit() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);
        assert_eq!(sig(&ctx, &e("Demo.Mask"), EnumMode::Bit32).unwrap(), "UInt32");
        assert_eq!(sig(&ctx, &e("Demo.Mask"), EnumMode::Bit64).unwrap(), "UInt64");
        assert_eq!(sig(&ctx, &e("Demo.Level"), EnumMode::Bit32).unwrap(), "int");
        assert_eq!(sig(&ctx, &e("Demo.Plain"), EnumMode::Bit64).unwrap(), "UInt32");
        assert_eq!(sig(&ctx, &e("Demo.Narrow"), EnumMode::Bit32).unwrap_err().code(), 1026);
        assert_eq!(sig(&ctx, &e("Demo.Mask"), EnumMode::NativeBits).unwrap_err().code(), 1029);
    }

    #[test]
    fn opaque_types_have_no_signature() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);
        let err = sig(&ctx, &Ty::Opaque(QualName::parse("System.Uri")), EnumMode::Bit32).unwrap_err();
        assert_eq!(err.code(), 1017);
        assert!(err.to_string().contains("System.Uri"));
    }

    #[test]
    fn arrays_need_object_or_string_elements() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);
        let array = |elem: Ty| Ty::Array(Box::new(elem));

        let objects = [
            Ty::String,
            Ty::Class(QualName::parse("UIKit.UIView")),
            Ty::NativeObject(QualName::parse("Demo.Sheet")),
        ];
        for elem in objects {
            assert_eq!(sig(&ctx, &array(elem), EnumMode::Bit32).unwrap(), "IntPtr");
        }
        let values = [Ty::Primitive(Primitive::Int), Ty::Struct(QualName::parse("Demo.Pair")), e("Demo.Plain")];
        for elem in values {
            assert_eq!(sig(&ctx, &array(elem), EnumMode::Bit32).unwrap_err().code(), 1017);
        }

        let c = method(Ty::Void, Vec::new());
        let values = Param::new("values", array(Ty::Primitive(Primitive::Double)));
        let err = marshal_parameter(&ctx, &c, &values, false, EnumMode::Bit32).unwrap_err();
        assert_eq!(err.code(), 1002);
        assert_eq!(err.culprit(), Some("Foo.Foo"));
        assert!(err.to_string().contains("values"));
    }

    #[test]
    fn parameter_expressions() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);
        let c = method(Ty::Void, Vec::new());

        let mut view = Param::new("view", Ty::Class(QualName::parse("UIKit.UIView")));
        assert_eq!(marshal_parameter(&ctx, &c, &view, false, EnumMode::Bit32).unwrap(), "view.Handle");
        view.null_allowed = true;
        assert_eq!(
            marshal_parameter(&ctx, &c, &view, false, EnumMode::Bit32).unwrap(),
            "view == null ? IntPtr.Zero : view.Handle"
        );

        let title = Param::new("title", Ty::String);
        assert_eq!(marshal_parameter(&ctx, &c, &title, false, EnumMode::Bit32).unwrap(), "nstitle");

        let mask = Param::new("mask", e("Demo.Mask"));
        assert_eq!(marshal_parameter(&ctx, &c, &mask, false, EnumMode::Bit32).unwrap(), "(UInt32)mask");
        assert_eq!(
            marshal_parameter(&ctx, &c, &mask, false, EnumMode::NativeBits).unwrap(),
            "(nuint) (ulong) mask"
        );

        let items = Param::new("items", Ty::Array(Box::new(Ty::String)));
        assert_eq!(marshal_parameter(&ctx, &c, &items, false, EnumMode::Bit32).unwrap(), "nsa_items.Handle");

        let handler = Param::new("handler", Ty::Delegate {
            name: QualName::parse("System.Action"),
            args: Vec::new(),
        });
        assert_eq!(
            marshal_parameter(&ctx, &c, &handler, false, EnumMode::Bit32).unwrap(),
            "(IntPtr) block_ptr_handler"
        );

        let error = Param::new("error", Ty::ByRef {
            kind: RefKind::Out,
            elem: Box::new(Ty::Class(QualName::parse("Foundation.NSError"))),
        });
        assert_eq!(marshal_parameter(&ctx, &c, &error, false, EnumMode::Bit32).unwrap(), "ref errorValue");

        let sheet = Param::new("sheet", Ty::NativeObject(QualName::parse("Demo.Sheet")));
        assert_eq!(marshal_parameter(&ctx, &c, &sheet, false, EnumMode::Bit32).unwrap(), "sheet.Handle");

        let kw = Param::new("object", Ty::Class(QualName::parse("Foundation.NSObject")));
        assert_eq!(marshal_parameter(&ctx, &c, &kw, false, EnumMode::Bit32).unwrap(), "@object.Handle");
    }

    #[test]
    fn zero_copy_strings() {
        let u = universe();
        let opts = GeneratorOptions {
            zero_copy_strings: true,
            ..GeneratorOptions::default()
        };
        let ctx = GenContext::new(&u, &opts);
        let mut c = method(Ty::Void, Vec::new());
        c.disable_zero_copy = false;
        let mut title = Param::new("title", Ty::String);
        assert!(is_zero_copy(&ctx, &c, &title));
        assert_eq!(marshal_parameter(&ctx, &c, &title, false, EnumMode::Bit32).unwrap(), "(IntPtr)(&_stitle)");
        title.disable_zero_copy = true;
        assert!(!is_zero_copy(&ctx, &c, &title));
    }

    #[test]
    fn null_checks() {
        let c = method(Ty::Void, Vec::new());
        let view = Param::new("view", Ty::Class(QualName::parse("UIKit.UIView")));
        assert!(needs_null_check(&c, &view));
        assert!(!needs_null_check(&c, &Param::new("n", Ty::Primitive(Primitive::Int))));
        assert!(needs_null_check(&c, &Param::new("s", Ty::String)));

        let mut setter = c.clone();
        setter.kind = CallableKind::Setter;
        setter.null_allowed = true;
        assert!(!needs_null_check(&setter, &view));
    }

    #[test]
    fn enum_sentinel_and_cast() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);

        let mask = method(e("Demo.Mask"), Vec::new());
        let w = returns_wrappers(&ctx, &mask, EnumMode::Bit32);
        assert_eq!(w.cast_a, "(Mask) ");
        assert_eq!(
            w.postproc.as_deref(),
            Some("if ((ulong) ret == (ulong) uint.MaxValue) ret = (Mask) ulong.MaxValue;")
        );
        assert!(returns_wrappers(&ctx, &mask, EnumMode::Bit64).postproc.is_none());

        let level = method(e("Demo.Level"), Vec::new());
        assert!(returns_wrappers(&ctx, &level, EnumMode::Bit32).postproc.is_none());
    }

    #[test]
    fn object_returns() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let ctx = GenContext::new(&u, &opts);

        let view = method(Ty::Class(QualName::parse("UIKit.UIView")), Vec::new());
        let w = returns_wrappers(&ctx, &view, EnumMode::Bit32);
        assert_eq!(w.cast_a, " Runtime.GetNSObject<global::UIKit.UIView> (");
        assert_eq!(w.cast_b, ")");

        let s = method(Ty::String, Vec::new());
        assert_eq!(returns_wrappers(&ctx, &s, EnumMode::Bit32).cast_a, "NSString.FromHandle (");

        let strings = method(Ty::Array(Box::new(Ty::String)), Vec::new());
        assert_eq!(
            returns_wrappers(&ctx, &strings, EnumMode::Bit32).cast_a,
            "NSArray.StringArrayFromHandle ("
        );

        let sheet = Ty::NativeObject(QualName::parse("Demo.Sheet"));
        let w = returns_wrappers(&ctx, &method(sheet.clone(), Vec::new()), EnumMode::Bit32);
        assert_eq!(w, ReturnWrappers::default());
        assert!(needs_ptr_zero_check(&ctx, &sheet));

        let sel = Ty::NativeObject(QualName::parse("ObjCRuntime.Selector"));
        let w = returns_wrappers(&ctx, &method(sel.clone(), Vec::new()), EnumMode::Bit32);
        assert_eq!(w.cast_a, "Selector.FromHandle (");
        assert!(!needs_ptr_zero_check(&ctx, &sel));
    }
}
