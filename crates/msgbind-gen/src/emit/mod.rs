//! Text emission for every output unit.
//!
//! Member bodies are produced by [`body`] on top of [`lowering`] and
//! [`invoke`]; [`method`], [`property`] and [`field`] wrap them in
//! declarations; [`class`] and [`protocol`] assemble whole types. The
//! shared `ObjCRuntime` units live in [`delegates`], [`notification`],
//! [`crate::messaging`] and [`crate::trampoline`].

pub mod body;
pub mod class;
pub mod delegates;
pub mod field;
pub mod invoke;
pub mod lowering;
pub mod method;
pub mod notification;
pub mod property;
pub mod protocol;
pub mod writer;

pub use writer::CodeWriter;

use crate::context::GenContext;

/// Write the standard preamble of a generated unit.
pub fn write_header(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    w.line("//\n// Auto-generated by msgbind, do not edit\n//\n// We keep references to objects, so warning 414 is expected");
    w.blank();
    w.line("#pragma warning disable 414");
    w.blank();
    for ns in ctx.ns.usings() {
        emit!(w, "using {ns};");
    }
    w.blank();
}

/// A complete unit: preamble plus `namespace {ns} { ... }`.
pub fn unit(ctx: &GenContext<'_>, namespace: Option<&str>, body: impl FnOnce(&mut CodeWriter)) -> String {
    let mut w = CodeWriter::new();
    write_header(ctx, &mut w);
    match namespace {
        Some(ns) => w.block(&format!("namespace {}", ctx.ns.get(ns)), body),
        None => body(&mut w),
    }
    w.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use msgbind_model::{ApiDescription, TypeUniverse};
    use msgbind_targets::ApplePlatform;

    #[test]
    fn units_carry_usings_and_namespace() {
        let u = TypeUniverse::new(ApiDescription::default(), ApplePlatform::Ios).unwrap();
        let opts = GeneratorOptions {
            namespace_prefix: Some("Xamarin".to_string()),
            ..GeneratorOptions::default()
        };
        let ctx = GenContext::new(&u, &opts);
        let text = unit(&ctx, Some("Demo"), |w| w.line("class X {}"));
        assert!(text.starts_with("//\n// Auto-generated by msgbind, do not edit\n"));
        assert!(text.contains("using System;\n"));
        assert!(text.contains("using Xamarin.Foundation;\n"));
        assert!(text.contains("namespace Xamarin.Demo {\n\tclass X {}\n}\n"));
        let system = text.find("using System;").unwrap();
        let foundation = text.find("using Xamarin.Foundation;").unwrap();
        assert!(system < foundation);
    }
}
