//! Declarations of the described delegate types that callbacks refer to.

use std::collections::BTreeMap;

use msgbind_model::universe::Scope;
use msgbind_model::{DelegateDescriptor, QualName};

use crate::context::GenContext;
use crate::emit::CodeWriter;
use crate::error::{BindingError, Result};
use crate::namespace::safe_param_name;

fn declaration(ctx: &GenContext<'_>, d: &DelegateDescriptor) -> Result<String> {
    let full = d.full_name();
    let ns = d.namespace.as_deref();
    let scope = Scope::new(ns, &full).with_generics(&d.generic_params);
    let returns = ctx.universe.resolve(&d.returns, &scope)?;
    let params = d
        .params
        .iter()
        .map(|p| {
            let ty = ctx.universe.resolve(&p.ty, &scope)?;
            Ok(format!("{} {}", ctx.format(ns, &ty), safe_param_name(&p.name)))
        })
        .collect::<Result<Vec<_>>>()?;
    let generics = if d.generic_params.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = d.generic_params.iter().map(|g| g.name.as_str()).collect();
        format!("<{}>", names.join(", "))
    };
    Ok(format!(
        "public delegate {} {}{generics} ({});",
        ctx.format(ns, &returns),
        d.name,
        params.join(", ")
    ))
}

/// Render every delegate in `ctx.support_delegates`, one namespace block
/// per declaring namespace.
pub fn render_support_delegates(ctx: &GenContext<'_>, w: &mut CodeWriter) -> Result<()> {
    let mut by_namespace: BTreeMap<Option<&str>, Vec<&DelegateDescriptor>> = BTreeMap::new();
    for full in &ctx.support_delegates {
        if full == "System.Action" || full.starts_with("System.Func") {
            continue;
        }
        let d = ctx
            .universe
            .delegate_descriptor(&QualName::parse(full))
            .ok_or_else(|| BindingError::new(1001, format!("Unknown delegate type {full}")))?;
        by_namespace.entry(d.namespace.as_deref()).or_default().push(d);
    }

    for (ns, delegates) in by_namespace {
        let lines = delegates
            .into_iter()
            .map(|d| declaration(ctx, d))
            .collect::<Result<Vec<_>>>()?;
        match ns {
            Some(ns) => {
                w.block(&format!("namespace {}", ctx.ns.get(ns)), |w| {
                    for line in &lines {
                        w.line(line);
                    }
                });
            }
            None => {
                for line in &lines {
                    w.line(line);
                }
            }
        }
        w.blank();
    }
    Ok(())
}
