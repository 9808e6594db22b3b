//! Lowering of managed arguments into native call arguments.
//!
//! For each parameter this produces the argument expression plus any
//! statements that must run before the call (conversions, by-ref slots)
//! and after it (releases, by-ref reconstruction).

use msgbind_model::Ty;

use crate::callable::{Callable, Param};
use crate::context::GenContext;
use crate::error::{BindingError, Result};
use crate::marshal::{is_zero_copy, marshal_parameter, EnumMode};
use crate::namespace::safe_param_name;
use crate::trampoline::make_trampoline;

/// The pieces of a lowered call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lowering {
    /// Argument list, each argument prefixed with `, `.
    pub args: String,
    pub convs: String,
    pub disposes: String,
    pub by_ref_processing: String,
    pub by_ref_init: String,
}

impl Lowering {
    /// Whether two lowerings need the same surrounding statements.
    pub fn same_statements(&self, other: &Lowering) -> bool {
        self.convs == other.convs
            && self.disposes == other.disposes
            && self.by_ref_processing == other.by_ref_processing
            && self.by_ref_init == other.by_ref_init
    }
}

fn push_line(buf: &mut String, text: &str) {
    buf.push_str(text);
    buf.push('\n');
}

fn lower_string(ctx: &GenContext<'_>, callable: &Callable, p: &Param, nullable: bool, out: &mut Lowering) {
    let raw = &p.name;
    let safe = safe_param_name(raw);
    if is_zero_copy(ctx, callable, p) {
        let core = &ctx.ns.core_objc_runtime;
        push_line(&mut out.convs, &format!("{core}.NSStringStruct _s{raw};"));
        push_line(&mut out.convs, &format!("_s{raw}.ClassPtr = {core}.NSStringStruct.ReferencePtr;"));
        push_line(
            &mut out.convs,
            &format!("_s{raw}.Flags = 0x010007d1; // RefCount=1, Unicode, InlineContents = 0, DontFreeContents"),
        );
        push_line(&mut out.convs, &format!("_s{raw}.UnicodePtr = _p{raw};"));
        if nullable {
            push_line(&mut out.convs, &format!("_s{raw}.Length = {safe} == null ? 0 : {safe}.Length;"));
        } else {
            push_line(&mut out.convs, &format!("_s{raw}.Length = {safe}.Length;"));
        }
        push_line(
            &mut out.disposes,
            &format!("if (_s{raw}.Flags != 0x010007d1) throw new Exception (\"String was retained, not copied\");"),
        );
    } else {
        push_line(&mut out.convs, &format!("var ns{raw} = NSString.CreateNative ({safe});"));
        push_line(&mut out.disposes, &format!("NSString.ReleaseNative (ns{raw});"));
    }
}

fn lower_array(p: &Param, elem: &Ty, nullable: bool, out: &mut Lowering) {
    let raw = &p.name;
    let safe = safe_param_name(raw);
    let factory = if elem.is_string() { "FromStrings" } else { "FromNSObjects" };
    if nullable {
        push_line(
            &mut out.convs,
            &format!("var nsa_{raw} = {safe} == null ? null : NSArray.{factory} ({safe});"),
        );
        push_line(&mut out.disposes, &format!("if (nsa_{raw} != null)\n\tnsa_{raw}.Dispose ();"));
    } else {
        push_line(&mut out.convs, &format!("var nsa_{raw} = NSArray.{factory} ({safe});"));
        push_line(&mut out.disposes, &format!("nsa_{raw}.Dispose ();"));
    }
}

fn lower_delegate(ctx: &mut GenContext<'_>, p: &Param, out: &mut Lowering) -> Result<()> {
    let raw = &p.name;
    let safe = safe_param_name(raw);
    let trampoline = make_trampoline(ctx, &p.ty)?;
    let handler = format!("Trampolines.SD{trampoline}.Handler");

    push_line(&mut out.convs, &format!("BlockLiteral *block_ptr_{raw};"));
    push_line(&mut out.convs, &format!("BlockLiteral block_{raw};"));
    let extra = if p.null_allowed {
        push_line(&mut out.convs, &format!("if ({safe} == null){{"));
        push_line(&mut out.convs, &format!("\tblock_ptr_{raw} = null;"));
        push_line(&mut out.convs, "} else {");
        "\t"
    } else {
        ""
    };
    push_line(&mut out.convs, &format!("{extra}block_{raw} = new BlockLiteral ();"));
    push_line(&mut out.convs, &format!("{extra}block_ptr_{raw} = &block_{raw};"));
    push_line(&mut out.convs, &format!("{extra}block_{raw}.SetupBlock ({handler}, {safe});"));
    if p.null_allowed {
        push_line(&mut out.convs, "}");
        push_line(&mut out.disposes, &format!("if (block_ptr_{raw} != null)"));
    }
    push_line(&mut out.disposes, &format!("{extra}block_ptr_{raw}->CleanupBlock ();"));
    Ok(())
}

/// Managed value rebuilt from a by-ref handle slot.
fn by_ref_reconstruct(ctx: &GenContext<'_>, callable: &Callable, elem: &Ty, slot: &str) -> String {
    match elem {
        Ty::String => format!("NSString.FromHandle ({slot})"),
        Ty::Protocol(_) => format!(
            "Runtime.GetINativeObject<{}> ({slot}, false)",
            ctx.format(callable.ns(), elem)
        ),
        _ => match ctx.registry.lookup(elem).filter(|_| !matches!(elem, Ty::Class(_))) {
            Some(entry) => entry.reconstruct(slot),
            None => format!("Runtime.GetNSObject<{}> ({slot})", ctx.format(callable.ns(), elem)),
        },
    }
}

/// Lower every parameter of `callable`.
pub fn lower(
    ctx: &mut GenContext<'_>,
    callable: &Callable,
    null_allowed_override: bool,
    mode: EnumMode,
) -> Result<Lowering> {
    let mut out = Lowering::default();
    for p in &callable.params {
        if let Ty::Opaque(_) = p.ty {
            return Err(BindingError::new(
                1020,
                format!(
                    "Unsupported type {} used on exported method {}",
                    p.ty,
                    callable.display_name()
                ),
            )
            .with_culprit(callable.display_name()));
        }
        out.args.push_str(", ");
        out.args.push_str(&marshal_parameter(ctx, callable, p, null_allowed_override, mode)?);

        let nullable = null_allowed_override || p.null_allowed;
        match &p.ty {
            Ty::String if !p.plain_string => lower_string(ctx, callable, p, nullable, &mut out),
            Ty::Array(elem) => lower_array(p, elem, nullable, &mut out),
            Ty::Delegate { .. } => lower_delegate(ctx, p, &mut out)?,
            _ => {}
        }

        if let Ty::ByRef { elem, .. } = &p.ty {
            if !elem.is_value_type() {
                let safe = safe_param_name(&p.name);
                push_line(&mut out.by_ref_init, &format!("IntPtr {safe}Value = IntPtr.Zero;"));
                let slot = format!("{safe}Value");
                let value = by_ref_reconstruct(ctx, callable, elem, &slot);
                out.by_ref_processing.push('\n');
                out.by_ref_processing
                    .push_str(&format!("{safe} = {slot} != IntPtr.Zero ? {value} : null;"));
            }
        }
    }
    Ok(out)
}

/// Parameters pinned for zero-copy string marshaling.
pub fn zero_copy_params(ctx: &GenContext<'_>, callable: &Callable) -> Vec<String> {
    callable
        .params
        .iter()
        .filter(|p| is_zero_copy(ctx, callable, p))
        .map(|p| p.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, QualName, RefKind, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    fn universe() -> TypeUniverse {
        TypeUniverse::new(ApiDescription::parse("").unwrap(), ApplePlatform::Ios).unwrap()
    }

    fn method(params: Vec<Param>) -> Callable {
        Callable::from_signature("Foo", Some("Demo".to_string()), Ty::Void, params)
    }

    #[test]
    fn strings_are_copied_and_released() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let c = method(vec![Param::new("title", Ty::String)]);
        let l = lower(&mut ctx, &c, false, EnumMode::Bit32).unwrap();
        assert_eq!(l.args, ", nstitle");
        assert_eq!(l.convs, "var nstitle = NSString.CreateNative (title);\n");
        assert_eq!(l.disposes, "NSString.ReleaseNative (nstitle);\n");
    }

    #[test]
    fn zero_copy_strings_use_a_stack_header() {
        let u = universe();
        let opts = GeneratorOptions {
            zero_copy_strings: true,
            ..GeneratorOptions::default()
        };
        let mut ctx = GenContext::new(&u, &opts);
        let mut c = method(vec![Param::new("title", Ty::String)]);
        c.disable_zero_copy = false;
        let l = lower(&mut ctx, &c, false, EnumMode::Bit32).unwrap();
        assert_eq!(l.args, ", (IntPtr)(&_stitle)");
        assert!(l.convs.starts_with("ObjCRuntime.NSStringStruct _stitle;\n"));
        assert!(l.convs.contains("_stitle.UnicodePtr = _ptitle;"));
        assert!(l.disposes.contains("String was retained, not copied"));
        assert_eq!(zero_copy_params(&ctx, &c), ["title"]);
    }

    #[test]
    fn nullable_arrays_probe_before_dispose() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let mut items = Param::new("items", Ty::Array(Box::new(Ty::Class(QualName::parse("UIKit.UIView")))));
        items.null_allowed = true;
        let l = lower(&mut ctx, &method(vec![items]), false, EnumMode::Bit32).unwrap();
        assert_eq!(l.args, ", nsa_items == null ? IntPtr.Zero : nsa_items.Handle");
        assert_eq!(l.convs, "var nsa_items = items == null ? null : NSArray.FromNSObjects (items);\n");
        assert_eq!(l.disposes, "if (nsa_items != null)\n\tnsa_items.Dispose ();\n");
    }

    #[test]
    fn blocks_are_set_up_and_cleaned() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let action = Ty::Delegate {
            name: QualName::parse("System.Action"),
            args: Vec::new(),
        };
        let mut handler = Param::new("handler", action);
        handler.null_allowed = true;
        let l = lower(&mut ctx, &method(vec![handler]), false, EnumMode::Bit32).unwrap();
        assert!(l.convs.contains("\tblock_handler.SetupBlock (Trampolines.SDAction.Handler, handler);\n"));
        assert!(l.convs.contains("if (handler == null){\n\tblock_ptr_handler = null;\n} else {\n"));
        assert_eq!(l.disposes, "if (block_ptr_handler != null)\n\tblock_ptr_handler->CleanupBlock ();\n");
        assert_eq!(ctx.trampolines.len(), 1);
    }

    #[test]
    fn by_ref_objects_are_boxed() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let error = Param::new("error", Ty::ByRef {
            kind: RefKind::Out,
            elem: Box::new(Ty::Class(QualName::parse("Foundation.NSError"))),
        });
        let l = lower(&mut ctx, &method(vec![error]), false, EnumMode::Bit32).unwrap();
        assert_eq!(l.args, ", ref errorValue");
        assert_eq!(l.by_ref_init, "IntPtr errorValue = IntPtr.Zero;\n");
        assert_eq!(
            l.by_ref_processing,
            "\nerror = errorValue != IntPtr.Zero ? Runtime.GetNSObject<NSError> (errorValue) : null;"
        );
    }

    #[test]
    fn opaque_types_are_rejected() {
        let u = universe();
        let opts = GeneratorOptions::default();
        let mut ctx = GenContext::new(&u, &opts);
        let uri = Param::new("uri", Ty::Opaque(QualName::parse("System.Uri")));
        let err = lower(&mut ctx, &method(vec![uri]), false, EnumMode::Bit32).unwrap_err();
        assert_eq!(err.code(), 1020);
        assert_eq!(err.culprit(), Some("Foo.Foo"));
    }
}
