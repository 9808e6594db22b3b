//! Whole-run orchestration.
//!
//! A run validates the description, walks the types in name order, and
//! only then renders the shared units, because entry points, trampolines,
//! library handles and event-args types are collected while types are
//! emitted.

use std::time::{Duration, Instant};

use msgbind_model::{TypeDescriptor, TypeUniverse};

use crate::callable::Callable;
use crate::context::GenContext;
use crate::emit::class::generate_type;
use crate::emit::delegates::render_support_delegates;
use crate::emit::field::render_libraries;
use crate::emit::notification::render_event_args;
use crate::emit::{write_header, CodeWriter};
use crate::error::{Result, Warning};
use crate::gather::gather;
use crate::messaging::{self, declare_invoker};
use crate::options::GeneratorOptions;
use crate::output::{write_units, OutputNames, OutputUnit};
use crate::report::GenerationReport;
use crate::trampoline;
use crate::validate::validate;

/// Everything one run produced, before anything touches the disk.
#[derive(Debug)]
pub struct GenerationOutput {
    /// Units in generation order: one per type, then the shared units.
    pub units: Vec<OutputUnit>,
    pub warnings: Vec<Warning>,
    pub entry_points: usize,
    pub trampolines: usize,
    pub elapsed: Duration,
}

impl GenerationOutput {
    pub fn unit(&self, path: &str) -> Option<&OutputUnit> {
        self.units.iter().find(|u| u.path == std::path::Path::new(path))
    }
}

/// Register the entry points every member of `ty` is sent through.
fn declare_members(ctx: &mut GenContext<'_>, ty: &TypeDescriptor) -> Result<()> {
    let universe = ctx.universe;
    let contract = gather(universe, ctx.options, ty)?;
    for cm in &contract.methods {
        let callable = Callable::from_method(universe, cm.owner, cm.method)?;
        declare_invoker(ctx, &callable)?;
    }
    for cp in &contract.properties {
        let p = cp.property;
        if p.field.is_some() || p.wrap.is_some() {
            continue;
        }
        declare_invoker(ctx, &Callable::getter(universe, cp.owner, p)?)?;
        if p.can_write() {
            declare_invoker(ctx, &Callable::setter(universe, cp.owner, p)?)?;
        }
    }
    Ok(())
}

/// A shared unit declared in an already-resolved namespace.
fn shared_unit(ctx: &GenContext<'_>, namespace: &str, body: impl FnOnce(&mut CodeWriter)) -> String {
    let mut w = CodeWriter::new();
    write_header(ctx, &mut w);
    w.block(&format!("namespace {namespace}"), body);
    w.into_string()
}

/// Run the generator over every type of `universe`, in memory.
pub fn generate(universe: &TypeUniverse, options: &GeneratorOptions) -> Result<GenerationOutput> {
    let started = Instant::now();
    let mut ctx = GenContext::new(universe, options);
    validate(universe, &mut ctx.diagnostics)?;

    let mut types: Vec<&TypeDescriptor> = universe.types().iter().filter(|t| !t.unavailable).collect();
    types.sort_by_key(|t| t.full_name());

    for ty in &types {
        ctx.hierarchy.register(universe, &ty.full_name())?;
    }
    for ty in &types {
        declare_members(&mut ctx, ty)?;
    }

    let mut names = OutputNames::new();
    let mut units = Vec::with_capacity(types.len() + 5);
    for ty in &types {
        let contents = generate_type(&mut ctx, ty)?;
        let path = names.for_type(&ctx.ns, ty);
        tracing::debug!(type_name = %ty.full_name(), path = %path.display(), "generated type");
        units.push(OutputUnit { path, contents });
    }

    trampoline::prepare(&mut ctx)?;

    let runtime = Some("ObjCRuntime");
    if !ctx.entry_points.is_empty() {
        let contents = shared_unit(&ctx, &ctx.ns.objc_runtime, |w| messaging::render(&ctx, w));
        units.push(OutputUnit {
            path: names.allocate(&ctx.ns, runtime, "Messaging"),
            contents,
        });
    }
    if !ctx.trampolines.is_empty() {
        let contents = shared_unit(&ctx, &ctx.ns.core_objc_runtime, |w| trampoline::render(&ctx, w));
        units.push(OutputUnit {
            path: names.allocate(&ctx.ns, runtime, "Trampolines"),
            contents,
        });
    }
    if !ctx.libraries.is_empty() {
        let contents = shared_unit(&ctx, &ctx.ns.core_objc_runtime, |w| render_libraries(&ctx, w));
        units.push(OutputUnit {
            path: names.allocate(&ctx.ns, runtime, "Libraries"),
            contents,
        });
    }
    if !ctx.notification_args.is_empty() {
        let mut w = CodeWriter::new();
        write_header(&ctx, &mut w);
        render_event_args(&ctx, &mut w)?;
        units.push(OutputUnit {
            path: names.allocate(&ctx.ns, runtime, "EventArgs"),
            contents: w.into_string(),
        });
    }
    if !ctx.support_delegates.is_empty() {
        let mut w = CodeWriter::new();
        write_header(&ctx, &mut w);
        render_support_delegates(&ctx, &mut w)?;
        units.push(OutputUnit {
            path: names.allocate(&ctx.ns, None, "SupportDelegates"),
            contents: w.into_string(),
        });
    }

    let output = GenerationOutput {
        units,
        entry_points: ctx.entry_points.len(),
        trampolines: ctx.trampolines.len(),
        warnings: ctx.diagnostics.into_warnings(),
        elapsed: started.elapsed(),
    };
    tracing::info!(
        types = types.len(),
        units = output.units.len(),
        entry_points = output.entry_points,
        trampolines = output.trampolines,
        warnings = output.warnings.len(),
        elapsed = ?output.elapsed,
        "generation finished"
    );
    Ok(output)
}

/// Generate and write every unit below `options.basedir`.
pub fn generate_files(universe: &TypeUniverse, options: &GeneratorOptions) -> Result<GenerationReport> {
    let output = generate(universe, options)?;
    let files = write_units(&options.basedir, &output.units)?;
    Ok(GenerationReport {
        files,
        entry_points: output.entry_points,
        trampolines: output.trampolines,
        warnings: output.warnings,
        elapsed: output.elapsed,
    })
}
