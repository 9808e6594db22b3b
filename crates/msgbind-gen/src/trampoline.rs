//! Callback bridges between native blocks and managed delegates.
//!
//! Each delegate type used as a callback gets one bridge pair, memoized by
//! the delegate type:
//!
//! - `SD{name}`: a native-callable shim that recovers the managed delegate
//!   from the block literal and invokes it;
//! - `NID{name}`: a managed wrapper around a copied native block, exposing
//!   the block as a managed delegate.
//!
//! Bridges are registered while types are generated and rendered once into
//! `ObjCRuntime/Trampolines.g.cs`.

use std::collections::{HashMap, HashSet};

use msgbind_model::{QualName, Ty};

use crate::abi::is_native_enum;
use crate::callable::{Callable, Param};
use crate::context::GenContext;
use crate::emit::lowering::lower;
use crate::emit::CodeWriter;
use crate::error::{BindingError, Result};
use crate::marshal::{native_enum_type, returns_wrappers, EnumMode};
use crate::namespace::safe_param_name;

/// Namespace the bridges are declared in, for type-name formatting.
const SCOPE: Option<&str> = Some("ObjCRuntime");

/// One synthesized bridge pair.
#[derive(Debug, Clone)]
pub struct TrampolineInfo {
    /// The delegate type this bridge was made for.
    pub key: String,
    /// Base name; the generated types are `D{name}`, `SD{name}` and `NID{name}`.
    pub name: String,
    pub user_delegate: String,
    /// Return type of the native-facing delegate.
    pub return_type: String,
    /// Return type of the managed delegate.
    pub managed_return: String,
    /// Statement converting `{0}` into the native return; `None` when void.
    pub return_format: Option<String>,
    /// Native-facing parameter list, starting with `IntPtr block`.
    pub parameters: String,
    /// Arguments passed to the managed delegate.
    pub invoke: String,
    pub clear: Vec<String>,
    pub convert: Vec<String>,
    pub postconvert: Vec<String>,
    pub default_value: Option<String>,
    /// Managed signature of the block wrapper's `Invoke`.
    pub invoker: Callable,
    invoker_body: Option<String>,
}

impl TrampolineInfo {
    pub fn delegate_name(&self) -> String {
        format!("D{}", self.name)
    }

    pub fn static_name(&self) -> String {
        format!("SD{}", self.name)
    }

    pub fn native_invoker_name(&self) -> String {
        format!("NID{}", self.name)
    }

    pub fn is_void(&self) -> bool {
        self.return_format.is_none()
    }
}

/// Bridges registered during one run.
#[derive(Debug, Default)]
pub struct Trampolines {
    infos: Vec<TrampolineInfo>,
    by_key: HashMap<String, usize>,
    generic_versions: HashMap<String, usize>,
    names: HashSet<String>,
}

impl Trampolines {
    pub fn get(&self, key: &str) -> Option<&TrampolineInfo> {
        self.by_key.get(key).map(|i| &self.infos[*i])
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Bridges ordered by delegate type.
    pub fn sorted(&self) -> Vec<&TrampolineInfo> {
        let mut all: Vec<&TrampolineInfo> = self.infos.iter().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    fn unique_name(&mut self, delegate: &QualName, generic: bool) -> String {
        let base = delegate.name.replace('`', "Arity");
        let mut name = if generic {
            let version = self.generic_versions.entry(delegate.full_name()).or_insert(0);
            let name = format!("{base}V{version}");
            *version += 1;
            name
        } else {
            base
        };
        if self.names.contains(&name) {
            let stem = name.clone();
            let mut n = 1;
            while self.names.contains(&name) {
                name = format!("{stem}{n}");
                n += 1;
            }
        }
        self.names.insert(name.clone());
        name
    }
}

struct ParamBridge {
    declared: String,
    invoke: String,
}

fn bridge_param(
    ctx: &mut GenContext<'_>,
    delegate: &str,
    param: &Param,
    clear: &mut Vec<String>,
    convert: &mut Vec<String>,
    postconvert: &mut Vec<String>,
) -> Result<ParamBridge> {
    let safe = safe_param_name(&param.name);
    let handle = |invoke: String| ParamBridge {
        declared: format!("IntPtr {safe}"),
        invoke,
    };
    let ty = &param.ty;
    match ty {
        Ty::Protocol(_) => Ok(handle(format!(
            " Runtime.GetINativeObject<{}> ({safe}, false)",
            ctx.format(SCOPE, ty)
        ))),
        Ty::Class(_) => Ok(handle(format!(" Runtime.GetNSObject<{}> ({safe})", ctx.format(SCOPE, ty)))),
        Ty::NativeObject(q) => Ok(handle(match ctx.registry.lookup(ty) {
            Some(entry) => entry.reconstruct(&safe),
            None => format!("new {} ({safe})", ctx.ns.global_name(q)),
        })),
        Ty::ByRef { kind, elem } => {
            let keyword = kind.keyword();
            if elem.is_value_type() {
                let elem_name = ctx.format(SCOPE, elem);
                if keyword == "out" {
                    clear.push(format!("{safe} = default ({elem_name});"));
                }
                let marshal = if matches!(elem.as_ref(), Ty::Primitive(msgbind_model::Primitive::Bool)) {
                    "[System.Runtime.InteropServices.MarshalAs (System.Runtime.InteropServices.UnmanagedType.I1)] "
                } else {
                    ""
                };
                return Ok(ParamBridge {
                    declared: format!("{marshal}{keyword} {elem_name} {safe}"),
                    invoke: format!("{keyword} {safe}"),
                });
            }
            let elem_name = ctx.format(SCOPE, elem);
            let local = format!("obj_{}", param.name);
            if keyword == "out" {
                clear.push(format!("{safe} = IntPtr.Zero;"));
                convert.push(format!("{elem_name} {local};"));
            } else {
                let value = match elem.as_ref() {
                    Ty::String => format!("NSString.FromHandle ({safe})"),
                    Ty::Protocol(_) => format!("Runtime.GetINativeObject<{elem_name}> ({safe}, false)"),
                    _ => format!("Runtime.GetNSObject<{elem_name}> ({safe})"),
                };
                convert.push(format!("var {local} = {value};"));
            }
            if elem.is_string() {
                postconvert.push(format!("{safe} = NSString.CreateNative ({local}, true);"));
            } else {
                postconvert.push(format!("{safe} = {local} == null ? IntPtr.Zero : {local}.Handle;"));
            }
            Ok(ParamBridge {
                declared: format!("ref IntPtr {safe}"),
                invoke: format!("{keyword} {local}"),
            })
        }
        Ty::Enum(_) if is_native_enum(ctx.universe, ty) => {
            let native = native_enum_type(ctx, ty)?;
            let wide = if native == "nint" { "long" } else { "ulong" };
            Ok(ParamBridge {
                declared: format!("{native} {safe}"),
                invoke: format!("({}) ({wide}) {safe}", ctx.format(SCOPE, ty)),
            })
        }
        t if t.is_value_type() => Ok(ParamBridge {
            declared: format!("{} {safe}", ctx.format(SCOPE, t)),
            invoke: safe.clone(),
        }),
        Ty::Array(elem) if elem.is_string() => Ok(handle(format!("NSArray.StringArrayFromHandle ({safe})"))),
        Ty::String => Ok(handle(format!("NSString.FromHandle ({safe})"))),
        Ty::Array(elem) if elem.is_wrapped() => Ok(handle(format!(
            "NSArray.ArrayFromHandle<{}> ({safe})",
            ctx.format(SCOPE, elem)
        ))),
        Ty::Delegate { .. } => {
            if param.block_callback {
                let nested = make_trampoline(ctx, ty)?;
                return Ok(handle(format!("NID{nested}.Create ({safe})")));
            }
            if !param.ccallback {
                ctx.diagnostics.warn(
                    1116,
                    format!(
                        "The parameter {safe} in {delegate} does not contain a [CCallback] or [BlockCallback] attribute, defaulting to CCallback"
                    ),
                );
            }
            let name = ctx.format(SCOPE, ty);
            Ok(handle(format!(
                "({name}) Marshal.GetDelegateForFunctionPointer ({safe}, typeof ({name}))"
            )))
        }
        other => Err(BindingError::new(
            1001,
            format!("Do not know how to make a trampoline for {other} {}", param.name),
        )
        .with_culprit(delegate.to_string())),
    }
}

fn return_bridge(ctx: &GenContext<'_>, ret: &Ty) -> Result<(String, Option<String>)> {
    Ok(match ret {
        Ty::Void => ("void".to_string(), None),
        Ty::Array(e) if e.is_wrapped() => (
            "IntPtr".to_string(),
            Some("return NSArray.FromNSObjects({0}).Handle;".to_string()),
        ),
        t if t.is_wrapped() || matches!(t, Ty::NativeObject(_)) => (
            "IntPtr".to_string(),
            Some("return {0} != null ? {0}.Handle : IntPtr.Zero;".to_string()),
        ),
        Ty::String => (
            "IntPtr".to_string(),
            Some("return NSString.CreateNative ({0}, true);".to_string()),
        ),
        t if is_native_enum(ctx.universe, t) => {
            let native = native_enum_type(ctx, t)?;
            let wide = if native == "nint" { "long" } else { "ulong" };
            (native.to_string(), Some(format!("return ({native}) ({wide}) {{0}};")))
        }
        t => (ctx.format(SCOPE, t), Some("return {0};".to_string())),
    })
}

/// Register the bridge for a delegate type (once) and return its base name.
pub fn make_trampoline(ctx: &mut GenContext<'_>, ty: &Ty) -> Result<String> {
    let Ty::Delegate { name, args } = ty else {
        return Err(BindingError::new(1001, format!("Do not know how to make a trampoline for {ty}")));
    };
    let key = ty.to_string();
    if let Some(info) = ctx.trampolines.get(&key) {
        return Ok(info.name.clone());
    }

    let universe = ctx.universe;
    let sig = universe.delegate_signature(name, args)?;
    if universe
        .description()
        .delegates
        .iter()
        .any(|d| d.full_name() == sig.descriptor.full_name())
    {
        ctx.support_delegates.insert(sig.descriptor.full_name());
    }

    let user_delegate = ctx.format(SCOPE, ty);
    let (return_type, return_format) = return_bridge(ctx, &sig.returns)?;
    let managed_return = ctx.format(SCOPE, &sig.returns);

    let mut params = Vec::with_capacity(sig.params.len());
    for (pd, pty) in &sig.params {
        let mut p = Param::new(pd.name.clone(), pty.clone());
        p.null_allowed = pd.null_allowed;
        p.plain_string = pd.plain_string;
        p.block_callback = pd.block_callback;
        p.ccallback = pd.ccallback;
        params.push(p);
    }

    let mut declared = vec!["IntPtr block".to_string()];
    let mut invoke = Vec::new();
    let (mut clear, mut convert, mut postconvert) = (Vec::new(), Vec::new(), Vec::new());
    for p in &params {
        let bridge = bridge_param(ctx, &key, p, &mut clear, &mut convert, &mut postconvert)?;
        declared.push(bridge.declared);
        invoke.push(bridge.invoke);
    }

    let tname = ctx.trampolines.unique_name(name, !args.is_empty());
    let invoker = Callable::from_signature(user_delegate.clone(), SCOPE.map(str::to_string), sig.returns.clone(), params);
    tracing::debug!(delegate = %key, trampoline = %tname, "synthesized trampoline");

    let info = TrampolineInfo {
        key: key.clone(),
        name: tname.clone(),
        user_delegate,
        return_type,
        managed_return,
        return_format,
        parameters: declared.join(", "),
        invoke: invoke.join(", "),
        clear,
        convert,
        postconvert,
        default_value: sig.descriptor.default_value.clone(),
        invoker,
        invoker_body: None,
    };
    let t = &mut ctx.trampolines;
    t.by_key.insert(key, t.infos.len());
    t.infos.push(info);
    Ok(tname)
}

fn invoker_body(ctx: &mut GenContext<'_>, invoker: &Callable) -> Result<String> {
    let lowering = lower(ctx, invoker, true, EnumMode::NativeBits)?;
    let returns = !invoker.returns_void();
    let wrappers = if returns {
        returns_wrappers(ctx, invoker, EnumMode::NativeBits)
    } else {
        Default::default()
    };
    let mut w = CodeWriter::new();
    w.fragment(&lowering.by_ref_init);
    w.fragment(&lowering.convs);
    emit!(
        w,
        "{}{}invoker (blockPtr{}){};",
        if returns { "var ret = " } else { "" },
        wrappers.cast_a,
        lowering.args,
        wrappers.cast_b
    );
    w.fragment(&lowering.disposes);
    w.fragment(&lowering.by_ref_processing);
    if returns {
        w.line("return ret;");
    }
    Ok(w.into_string())
}

/// Lower every registered invoker. Lowering may register further bridges
/// (delegate-typed parameters), so this runs until the table stops growing.
pub fn prepare(ctx: &mut GenContext<'_>) -> Result<()> {
    let mut i = 0;
    while i < ctx.trampolines.infos.len() {
        if ctx.trampolines.infos[i].invoker_body.is_none() {
            let invoker = ctx.trampolines.infos[i].invoker.clone();
            let body = invoker_body(ctx, &invoker)?;
            ctx.trampolines.infos[i].invoker_body = Some(body);
        }
        i += 1;
    }
    Ok(())
}

fn render_forward(w: &mut CodeWriter, ti: &TrampolineInfo) {
    let d = ti.delegate_name();
    let sd = ti.static_name();
    w.blank();
    w.line("[UnmanagedFunctionPointerAttribute (CallingConvention.Cdecl)]");
    emit!(w, "[UserDelegateType (typeof ({}))]", ti.user_delegate);
    emit!(w, "internal delegate {} {d} ({});", ti.return_type, ti.parameters);
    w.blank();
    w.line("//\n// This class bridges native block invocations that call into C#\n//");
    w.block(&format!("static internal class {sd}"), |w| {
        emit!(w, "static internal readonly {d} Handler = Invoke;");
        w.blank();
        emit!(w, "[MonoPInvokeCallback (typeof ({d}))]");
        w.block(&format!("static unsafe {} Invoke ({})", ti.return_type, ti.parameters), |w| {
            w.line("var descriptor = (BlockLiteral *) block;");
            emit!(w, "var del = ({}) (descriptor->Target);", ti.user_delegate);
            for c in &ti.clear {
                w.line(c);
            }
            let call = format!("del ({})", ti.invoke);
            match &ti.return_format {
                None => w.block("if (del != null)", |w| {
                    for c in &ti.convert {
                        w.line(c);
                    }
                    emit!(w, "{call};");
                    for c in &ti.postconvert {
                        w.line(c);
                    }
                }),
                Some(format) => {
                    emit!(w, "{} retval;", ti.managed_return);
                    w.line("if (del != null) {");
                    {
                        let _i = w.indent();
                        for c in &ti.convert {
                            w.line(c);
                        }
                        emit!(w, "retval = {call};");
                        for c in &ti.postconvert {
                            w.line(c);
                        }
                    }
                    w.line("} else {");
                    {
                        let _i = w.indent();
                        match &ti.default_value {
                            Some(value) => emit!(w, "retval = {value};"),
                            None => emit!(
                                w,
                                "throw new InvalidOperationException (\"No managed delegate is attached to this {} block\");",
                                ti.user_delegate
                            ),
                        }
                    }
                    w.line("}");
                    w.line(&format.replace("{0}", "retval"));
                }
            }
        });
    });
    w.fragment(&format!("/* class {sd} */"));
}

fn render_native_invoker(w: &mut CodeWriter, ti: &TrampolineInfo, params: &str) {
    let d = ti.delegate_name();
    let nid = ti.native_invoker_name();
    let user = &ti.user_delegate;
    w.blank();
    w.block(&format!("internal class {nid}"), |w| {
        w.line("IntPtr blockPtr;");
        emit!(w, "{d} invoker;");
        w.blank();
        w.line("[Preserve (Conditional=true)]");
        emit!(w, "public unsafe {nid} (BlockLiteral *block)");
        w.line("{");
        {
            let _i = w.indent();
            w.line("blockPtr = _Block_copy ((IntPtr) block);");
            emit!(w, "invoker = block->GetDelegateForBlock<{d}> ();");
        }
        w.line("}");
        w.blank();
        w.line("[Preserve (Conditional=true)]");
        emit!(w, "~{nid} ()");
        w.line("{");
        {
            let _i = w.indent();
            w.line("_Block_release (blockPtr);");
        }
        w.line("}");
        w.blank();
        w.line("[Preserve (Conditional=true)]");
        emit!(w, "public unsafe static {user} Create (IntPtr block)");
        w.line("{");
        {
            let _i = w.indent();
            w.line("if (block == IntPtr.Zero)\n\treturn null;");
            w.block("if (BlockLiteral.IsManagedBlock (block))", |w| {
                emit!(w, "var existing_delegate = ((BlockLiteral *) block)->Target as {user};");
                w.line("if (existing_delegate != null)\n\treturn existing_delegate;");
            });
            emit!(w, "return new {nid} ((BlockLiteral *) block).Invoke;");
        }
        w.line("}");
        w.blank();
        w.line("[Preserve (Conditional=true)]");
        emit!(w, "unsafe {} Invoke ({params})", ti.managed_return);
        w.line("{");
        {
            let _i = w.indent();
            w.fragment(ti.invoker_body.as_deref().unwrap_or_default());
        }
        w.line("}");
    });
    w.fragment(&format!("/* class {nid} */"));
}

/// Managed parameter list of a callable (`NSString title, out int count`).
pub fn managed_parameters(ctx: &GenContext<'_>, callable: &Callable) -> String {
    callable
        .params
        .iter()
        .map(|p| format!("{} {}", ctx.format(callable.ns(), &p.ty), safe_param_name(&p.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the `Trampolines` class body (inside the namespace block).
/// [`prepare`] must have run first.
pub fn render(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    w.blank();
    w.line("[CompilerGenerated]");
    w.block("static partial class Trampolines", |w| {
        w.blank();
        w.line("[DllImport (\"/usr/lib/libobjc.dylib\")]");
        w.line("static extern IntPtr _Block_copy (IntPtr ptr);");
        w.blank();
        w.line("[DllImport (\"/usr/lib/libobjc.dylib\")]");
        w.line("static extern void _Block_release (IntPtr ptr);");
        for ti in ctx.trampolines.sorted() {
            render_forward(w, ti);
            let params = managed_parameters(ctx, &ti.invoker);
            render_native_invoker(w, ti, &params);
        }
    });
}
