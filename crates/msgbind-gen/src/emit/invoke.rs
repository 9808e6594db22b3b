//! Message-send statements.
//!
//! [`generate_invoke`] writes one send through one entry point.
//! [`generate_new_style_invoke`] picks the entry points at run time when
//! the architectures disagree about struct returns or enum widths.

use crate::abi::{has_native_enum_in_signature, stret_info};
use crate::callable::Callable;
use crate::context::{selector_field, GenContext};
use crate::emit::CodeWriter;
use crate::error::Result;
use crate::marshal::{returns_wrappers, EnumMode, ReturnWrappers};
use crate::messaging::{make_sig, returns_value};

/// Receiver spelling for a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `this` (or `class_ptr` for static members).
    This,
    /// The `This` parameter of a category or protocol extension method.
    ExtensionParameter,
}

/// What is being sent and how the result is consumed.
#[derive(Debug, Clone, Copy)]
pub struct Send<'a> {
    pub callable: &'a Callable,
    pub target: Target,
    /// Look the selector up at the call site even when handles are cached.
    pub force_inline: bool,
    /// Store the result in the temporary `ret` instead of returning it.
    pub assign_to_temp: bool,
}

/// Write a single send of `send.callable` with the lowered `args`.
pub fn generate_invoke(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    send: &Send<'_>,
    stret: bool,
    supercall: bool,
    args: &str,
    aligned: bool,
    mode: EnumMode,
) -> Result<()> {
    let callable = send.callable;
    let target = match send.target {
        Target::This => "this",
        Target::ExtensionParameter => "This",
    };
    let handle = if supercall { ".SuperHandle" } else { ".Handle" };
    let send_kind = if supercall { "objc_msgSendSuper" } else { "objc_msgSend" };
    let sig = format!(
        "{}.{}",
        ctx.messaging(),
        make_sig(ctx, send_kind, stret, callable, aligned, mode)?
    );
    let sel = selector_field(ctx, &callable.selector, send.force_inline);
    let receiver = if callable.is_static {
        "class_ptr".to_string()
    } else {
        format!("{target}{handle}")
    };

    if stret {
        let ret = if aligned { "aligned_ret" } else { "out ret" };
        emit!(w, "{sig} ({ret}, {receiver}, {sel}{args});");
        if aligned {
            w.line("aligned_assigned = true;");
        }
        return Ok(());
    }

    let returns = returns_value(callable);
    let wrappers = if returns {
        returns_wrappers(ctx, callable, mode)
    } else if callable.is_constructor() {
        ReturnWrappers {
            cast_a: "InitializeHandle (".to_string(),
            cast_b: format!(", \"{}\")", callable.selector),
            postproc: None,
        }
    } else {
        Default::default()
    };
    let assign = match (returns, send.assign_to_temp) {
        (false, _) => "",
        (true, true) => "ret = ",
        (true, false) => "return ",
    };
    emit!(
        w,
        "{assign}{}{sig} ({receiver}, {sel}{args}){};",
        wrappers.cast_a,
        wrappers.cast_b
    );
    if let Some(post) = &wrappers.postproc {
        w.line(post);
    }
    Ok(())
}

fn branch(
    w: &mut CodeWriter,
    header: &str,
    body: impl FnOnce(&mut CodeWriter) -> Result<()>,
) -> Result<()> {
    w.line(header);
    let _i = w.indent();
    body(w)
}

/// Write the sends for every call path of `send.callable`. `args` holds the
/// 32-bit lowering first and, for signatures with native enums, the
/// 64-bit lowering second.
pub fn generate_new_style_invoke(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    send: &Send<'_>,
    supercall: bool,
    args: &[String],
) -> Result<()> {
    let callable = send.callable;
    let stret = stret_info(ctx.universe, &callable.returns, ctx.options.platform)?;
    let dual_enum = has_native_enum_in_signature(ctx.universe, callable);
    let is_stret_multi = stret.any();
    let need_multi_path = is_stret_multi || dual_enum;
    let index64 = usize::from(dual_enum);
    let args32 = args.first().map(String::as_str).unwrap_or_default();
    let args64 = args.get(index64).map(String::as_str).unwrap_or(args32);

    if ctx.options.only_desktop() {
        if need_multi_path {
            branch(w, "if (IntPtr.Size == 8) {", |w| {
                generate_invoke(ctx, w, send, stret.x64, supercall, args64, false, EnumMode::Bit64)
            })?;
            branch(w, "} else {", |w| {
                generate_invoke(ctx, w, send, stret.x86, supercall, args32, false, EnumMode::Bit32)
            })?;
            w.line("}");
        } else {
            generate_invoke(ctx, w, send, stret.x86, supercall, args32, false, EnumMode::Bit32)?;
        }
        return Ok(());
    }

    let aligned = callable.align;
    if is_stret_multi {
        branch(w, "if (Runtime.Arch == Arch.DEVICE) {", |w| {
            branch(w, "if (IntPtr.Size == 8) {", |w| {
                generate_invoke(ctx, w, send, false, supercall, args64, false, EnumMode::Bit64)
            })?;
            branch(w, "} else {", |w| {
                generate_invoke(ctx, w, send, stret.arm, supercall, args32, aligned && stret.arm, EnumMode::Bit32)
            })?;
            w.line("}");
            Ok(())
        })?;
        branch(w, "} else if (IntPtr.Size == 8) {", |w| {
            generate_invoke(ctx, w, send, stret.x64, supercall, args64, aligned && stret.x64, EnumMode::Bit64)
        })?;
        branch(w, "} else {", |w| {
            generate_invoke(ctx, w, send, stret.x86, supercall, args32, aligned && stret.x86, EnumMode::Bit32)
        })?;
        w.line("}");
    } else if dual_enum {
        branch(w, "if (IntPtr.Size == 8) {", |w| {
            generate_invoke(ctx, w, send, false, supercall, args64, false, EnumMode::Bit64)
        })?;
        branch(w, "} else {", |w| {
            generate_invoke(ctx, w, send, false, supercall, args32, false, EnumMode::Bit32)
        })?;
        w.line("}");
    } else {
        generate_invoke(ctx, w, send, false, supercall, args32, false, EnumMode::Bit32)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Param;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, Primitive, QualName, Ty, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    const DESC: &str = r#"
[[structs]]
name = "Twelve"
namespace = "Demo"
size = 12

[[enums]]
name = "Mode"
namespace = "Demo"
underlying = "long"
native = true
"#;

    fn universe(platform: ApplePlatform) -> TypeUniverse {
        TypeUniverse::new(ApiDescription::parse(DESC).unwrap(), platform).unwrap()
    }

    fn method(selector: &str, returns: Ty, params: Vec<Param>) -> Callable {
        let mut c = Callable::from_signature("Foo", Some("Demo".to_string()), returns, params);
        c.selector = selector.to_string();
        c
    }

    fn send(c: &Callable) -> Send<'_> {
        Send {
            callable: c,
            target: Target::This,
            force_inline: false,
            assign_to_temp: false,
        }
    }

    #[test]
    fn plain_instance_send_returns_wrapped_value() {
        let u = universe(ApplePlatform::Ios);
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let c = method("superview", Ty::Class(QualName::parse("UIKit.UIView")), Vec::new());
        let mut w = CodeWriter::new();
        generate_new_style_invoke(&mut ctx, &mut w, &send(&c), false, &[String::new()]).unwrap();
        assert_eq!(
            w.as_str(),
            "return  Runtime.GetNSObject<global::UIKit.UIView> (global::ObjCRuntime.Messaging.IntPtr_objc_msgSend (this.Handle, selSuperviewHandle));\n"
        );
        assert_eq!(ctx.selectors.fields(), [("superview", "selSuperview")]);
    }

    #[test]
    fn supercalls_and_statics_change_the_receiver() {
        let u = universe(ApplePlatform::Ios);
        let opts = GeneratorOptions {
            inline_selectors: true,
            ..GeneratorOptions::default()
        };
        let mut ctx = GenContext::new(&u, &opts);
        let c = method("setCount:", Ty::Void, vec![Param::new("n", Ty::Primitive(Primitive::Int))]);
        let mut w = CodeWriter::new();
        generate_invoke(&mut ctx, &mut w, &send(&c), false, true, ", n", false, EnumMode::Bit32).unwrap();
        assert_eq!(
            w.as_str(),
            "global::ObjCRuntime.Messaging.void_objc_msgSendSuper_int (this.SuperHandle, Selector.GetHandle (\"setCount:\"), n);\n"
        );

        let mut s = c.clone();
        s.is_static = true;
        let mut w = CodeWriter::new();
        generate_invoke(&mut ctx, &mut w, &send(&s), false, false, ", n", false, EnumMode::Bit32).unwrap();
        assert!(w.as_str().contains("(class_ptr, Selector.GetHandle"));
    }

    #[test]
    fn constructors_initialize_the_handle() {
        let u = universe(ApplePlatform::Ios);
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let mut c = method(
            "initWithName:",
            Ty::Primitive(Primitive::IntPtr),
            vec![Param::new("name", Ty::String)],
        );
        c.kind = crate::callable::CallableKind::Constructor;
        let mut w = CodeWriter::new();
        generate_invoke(&mut ctx, &mut w, &send(&c), false, false, ", nsname", false, EnumMode::Bit32).unwrap();
        assert_eq!(
            w.as_str(),
            "InitializeHandle (global::ObjCRuntime.Messaging.IntPtr_objc_msgSend_IntPtr (this.Handle, selInitWithNameHandle, nsname), \"initWithName:\");\n"
        );
    }

    #[test]
    fn disagreeing_stret_emits_every_path() {
        let u = universe(ApplePlatform::Ios);
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let c = method("bounds", Ty::Struct(QualName::parse("Demo.Twelve")), Vec::new());
        let mut s = send(&c);
        s.assign_to_temp = true;
        let mut w = CodeWriter::new();
        generate_new_style_invoke(&mut ctx, &mut w, &s, false, &[String::new()]).unwrap();
        let text = w.into_string();
        assert_eq!(
            text,
            "if (Runtime.Arch == Arch.DEVICE) {\n\
             \tif (IntPtr.Size == 8) {\n\
             \t\tret = global::ObjCRuntime.Messaging.Twelve_objc_msgSend (this.Handle, selBoundsHandle);\n\
             \t} else {\n\
             \t\tglobal::ObjCRuntime.Messaging.Twelve_objc_msgSend_stret (out ret, this.Handle, selBoundsHandle);\n\
             \t}\n\
             } else if (IntPtr.Size == 8) {\n\
             \tret = global::ObjCRuntime.Messaging.Twelve_objc_msgSend (this.Handle, selBoundsHandle);\n\
             } else {\n\
             \tglobal::ObjCRuntime.Messaging.Twelve_objc_msgSend_stret (out ret, this.Handle, selBoundsHandle);\n\
             }\n"
        );
    }

    #[test]
    fn native_enums_split_by_pointer_size() {
        let u = universe(ApplePlatform::Ios);
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let c = method("setMode:", Ty::Void, vec![Param::new("mode", Ty::Enum(QualName::parse("Demo.Mode")))]);
        let mut w = CodeWriter::new();
        let args = [", (int)mode".to_string(), ", (Int64)mode".to_string()];
        generate_new_style_invoke(&mut ctx, &mut w, &send(&c), false, &args).unwrap();
        let text = w.into_string();
        assert!(text.starts_with("if (IntPtr.Size == 8) {\n\tglobal::ObjCRuntime.Messaging.void_objc_msgSend_Int64 (this.Handle, selSetModeHandle, (Int64)mode);\n} else {\n"));
        assert!(text.contains("void_objc_msgSend_int (this.Handle, selSetModeHandle, (int)mode);"));
    }

    #[test]
    fn desktop_only_has_intel_paths() {
        let u = universe(ApplePlatform::MacOs);
        let opts = GeneratorOptions::for_platform(ApplePlatform::MacOs);
        let mut ctx = GenContext::new(&u, &opts);
        let c = method("bounds", Ty::Struct(QualName::parse("Demo.Twelve")), Vec::new());
        let mut s = send(&c);
        s.assign_to_temp = true;
        let mut w = CodeWriter::new();
        generate_new_style_invoke(&mut ctx, &mut w, &s, false, &[String::new()]).unwrap();
        let text = w.into_string();
        assert!(!text.contains("Arch.DEVICE"));
        assert!(text.starts_with("if (IntPtr.Size == 8) {\n\tret = "));
        assert!(text.contains("} else {\n\tglobal::ObjCRuntime.Messaging.Twelve_objc_msgSend_stret (out ret,"));
    }
}
