//! Notification observers and the event-args types they hand out.

use msgbind_model::universe::Scope;
use msgbind_model::{EventArgsDescriptor, Primitive, PropertyDescriptor, QualName, Ty, TypeDescriptor};

use crate::context::GenContext;
use crate::emit::CodeWriter;
use crate::error::{BindingError, Result};

/// `DidChangeNotification` is observed through `ObserveDidChange`.
fn notification_name(property: &str) -> &str {
    property.strip_suffix("Notification").unwrap_or(property)
}

fn library_for(ctx: &GenContext<'_>, ea: &EventArgsDescriptor, library: Option<&str>) -> String {
    if ctx.options.third_party {
        return "__Internal".to_string();
    }
    match library {
        Some(lib) => lib.replace('.', ""),
        None => {
            let ns = ea.namespace.as_deref().unwrap_or_default();
            ctx.ns.strip_prefix(ns).replace('.', "")
        }
    }
}

/// Record an event-args type for `EventArgs.g.cs`, together with the
/// libraries its keys are looked up in.
fn use_event_args(ctx: &mut GenContext<'_>, ea: &EventArgsDescriptor) {
    if !ctx.notification_args.insert(ea.full_name()) {
        return;
    }
    for p in ea.properties.iter().filter(|p| !p.constant_string) {
        let lib = library_for(ctx, ea, p.library.as_deref());
        let path = (lib == "__Internal").then(|| lib.clone());
        ctx.libraries.entry(lib).or_insert(path);
    }
}

/// The nested `Notifications` class of `unit`. `props` are the
/// notification fields, in name order.
pub fn generate_notifications(
    ctx: &mut GenContext<'_>,
    w: &mut CodeWriter,
    unit: &TypeDescriptor,
    props: &[&PropertyDescriptor],
) -> Result<()> {
    let used_in = unit.namespace.as_deref();
    let context = unit.full_name();
    let scope = Scope::new(used_in, &context);
    let universe = ctx.universe;

    w.line("//\n// Notifications\n//");
    w.line("public static partial class Notifications {");
    {
        let _i = w.indent();
        for p in props {
            let Some(binding) = &p.notification else { continue };
            let event_args = match binding.event_args.as_deref() {
                Some(name) => {
                    let ea = universe.resolve_event_args(name, &scope)?;
                    use_event_args(ctx, ea);
                    ctx.ns.format_name(used_in, &QualName::new(ea.namespace.as_deref(), ea.name.clone()))
                }
                None => "NSNotificationEventArgs".to_string(),
            };
            let center = binding.center.as_deref().unwrap_or("NSNotificationCenter.DefaultCenter");
            w.blank();
            emit!(
                w,
                "public static NSObject Observe{} (EventHandler<{event_args}> handler)",
                notification_name(&p.name)
            );
            w.line("{");
            emit!(
                w,
                "\treturn {center}.AddObserver ({}, notification => handler (null, new {event_args} (notification)));",
                p.name
            );
            w.line("}");
        }
    }
    w.line("}");
    Ok(())
}

fn number(cast: &str, accessor: &str) -> String {
    format!("using (var nsn = Runtime.GetNSObject<NSNumber> (value))\n\treturn {cast}nsn.{accessor};")
}

fn number_accessor(p: Primitive) -> Option<&'static str> {
    Some(match p {
        Primitive::Int => "Int32Value",
        Primitive::UInt => "UInt32Value",
        Primitive::Long => "Int64Value",
        Primitive::ULong => "UInt64Value",
        Primitive::Short => "Int16Value",
        Primitive::UShort => "UInt16Value",
        Primitive::SByte => "SByteValue",
        Primitive::Byte => "ByteValue",
        Primitive::Bool => "BoolValue",
        Primitive::NInt => "NIntValue",
        Primitive::NUInt => "NUIntValue",
        Primitive::Double => "DoubleValue",
        Primitive::Float => "FloatValue",
        _ => return None,
    })
}

/// Statement turning the user-info `value` into a `ty`.
fn extraction(ctx: &GenContext<'_>, used_in: Option<&str>, ty: &Ty) -> Option<String> {
    let stmt = match ty {
        Ty::Array(e) if e.is_wrapped() => format!("return NSArray.ArrayFromHandle<{}> (value);", ctx.format(used_in, e)),
        Ty::Array(e) if e.is_string() => "return NSArray.StringArrayFromHandle (value);".to_string(),
        t if t.is_wrapped() => format!("return Runtime.GetNSObject<{}> (value);", ctx.format(used_in, t)),
        Ty::String => "return NSString.FromHandle (value);".to_string(),
        Ty::Struct(q) if q.namespace.as_deref() == Some("CoreGraphics") => {
            let accessor = match q.name.as_str() {
                "CGPoint" => "CGPointValue",
                "CGSize" => "CGSizeValue",
                "CGRect" => "CGRectValue",
                _ => return None,
            };
            format!("using (var nsv = Runtime.GetNSObject<NSValue> (value))\n\treturn nsv.{accessor};")
        }
        Ty::Primitive(p) => number("", number_accessor(*p)?),
        Ty::Enum(q) => {
            let underlying = ctx.universe.enum_descriptor(q)?.underlying;
            let cast = format!("({}) ", ctx.format(used_in, ty));
            number(&cast, number_accessor(underlying)?)
        }
        _ => return None,
    };
    Some(stmt)
}

fn render_one(ctx: &GenContext<'_>, w: &mut CodeWriter, ea: &EventArgsDescriptor) -> Result<()> {
    let used_in = ea.namespace.as_deref();
    let full = ea.full_name();
    let scope = Scope::new(used_in, &full);
    emit!(w, "public partial class {} : NSNotificationEventArgs {{", ea.name);
    {
        let _class = w.indent();
        emit!(w, "public {} (NSNotification notification) : base (notification)\n{{\n}}", ea.name);
        w.blank();

        let mut counter = 0;
        for p in &ea.properties {
            let culprit = format!("{full}.{}", p.name);
            let Some(key) = p.key.as_deref() else {
                return Err(BindingError::new(1010, format!("No key on {culprit} property")).with_culprit(culprit));
            };
            let ty = ctx.universe.resolve(&p.ty, &scope)?;
            let formatted = ctx.format(used_in, &ty);
            let Some(extract) = extraction(ctx, used_in, &ty) else {
                return Err(BindingError::new(
                    1011,
                    format!("Do not know how to extract type {formatted} from an NSDictionary"),
                )
                .with_culprit(culprit));
            };
            let nullable = if ty.is_value_type() && p.null_allowed { "?" } else { "" };
            let visibility = if p.internal { "internal" } else { "public" };
            let user_info_check = if p.probe_presence {
                Some("if (Notification.UserInfo == null)\n\treturn false;")
            } else if p.null_allowed {
                Some("if (Notification.UserInfo == null)\n\treturn null;")
            } else {
                None
            };

            let lookup = if p.constant_string {
                None
            } else {
                let kn = format!("k{counter}");
                counter += 1;
                let lib = library_for(ctx, ea, p.library.as_deref());
                emit!(w, "[Field (\"{key}\", \"{lib}\")]");
                emit!(w, "static IntPtr {kn};");
                w.blank();
                w.line("[CompilerGenerated]");
                Some((kn, lib))
            };
            emit!(w, "{visibility} {formatted}{nullable} {} {{", p.name);
            {
                let _prop = w.indent();
                w.line("get {");
                {
                    let _get = w.indent();
                    w.line("IntPtr value;");
                    match &lookup {
                        None => {
                            emit!(w, "using (var str = new NSString (\"{key}\")){{");
                            {
                                let _using = w.indent();
                                if let Some(check) = user_info_check {
                                    w.line(check);
                                }
                                w.line("value = Notification.UserInfo.LowlevelObjectForKey (str.Handle);");
                            }
                            w.line("}");
                        }
                        Some((kn, lib)) => {
                            emit!(
                                w,
                                "if ({kn} == IntPtr.Zero)\n\t{kn} = {}.Dlfcn.GetIntPtr (Libraries.{lib}.Handle, \"{key}\");",
                                ctx.ns.core_objc_runtime
                            );
                            if let Some(check) = user_info_check {
                                w.line(check);
                            }
                            emit!(w, "value = Notification.UserInfo.LowlevelObjectForKey ({kn});");
                        }
                    }
                    w.blank();
                    if p.probe_presence {
                        w.line("return value != IntPtr.Zero;");
                    } else {
                        if p.null_allowed {
                            w.line("if (value == IntPtr.Zero)\n\treturn null;");
                        } else if let Some(elem) = ty.element() {
                            emit!(w, "if (value == IntPtr.Zero)\n\treturn new {} [0];", ctx.format(used_in, elem));
                        } else {
                            emit!(w, "if (value == IntPtr.Zero)\n\treturn default({formatted});");
                        }
                        w.line(&extract);
                    }
                }
                w.line("}");
            }
            w.line("}");
            w.blank();
        }
    }
    w.line("}");
    Ok(())
}

/// Render `EventArgs.g.cs` after the preamble: one class per event-args
/// type referenced by a notification.
pub fn render_event_args(ctx: &GenContext<'_>, w: &mut CodeWriter) -> Result<()> {
    for full in &ctx.notification_args {
        let Some(ea) = ctx.universe.event_args(full) else { continue };
        match ea.namespace.as_deref() {
            Some(ns) => {
                emit!(w, "namespace {} {{", ctx.ns.get(ns));
                {
                    let _i = w.indent();
                    render_one(ctx, w, ea)?;
                }
                w.line("}");
            }
            None => render_one(ctx, w, ea)?,
        }
    }
    Ok(())
}
