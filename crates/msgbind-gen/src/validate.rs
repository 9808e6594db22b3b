//! Structural checks run over the whole description before generation.

use msgbind_model::{MethodDescriptor, PropertyDescriptor, TypeDescriptor, TypeUniverse};

use crate::error::{BindingError, Diagnostics, Result};

/// Characters that cannot appear in a native selector.
const INVALID_SELECTOR_CHARS: &[char] = &['*', '^', '(', ')'];

fn check_selector(owner: &TypeDescriptor, member: &str, selector: Option<&str>) -> Result<()> {
    let Some(selector) = selector else {
        return Ok(());
    };
    let culprit = format!("{}.{member}", owner.full_name());
    if selector.is_empty() {
        return Err(BindingError::new(1024, format!("No selector specified for member '{culprit}'"))
            .with_culprit(culprit));
    }
    if selector.contains(INVALID_SELECTOR_CHARS) {
        return Err(BindingError::new(
            1063,
            format!("Export attribute contains invalid selector name: {selector}"),
        )
        .with_culprit(culprit));
    }
    Ok(())
}

fn validate_method(owner: &TypeDescriptor, m: &MethodDescriptor, diagnostics: &mut Diagnostics) -> Result<()> {
    let full = owner.full_name();
    let culprit = format!("{full}.{}", m.name);
    check_selector(owner, &m.name, m.export.as_deref())?;
    check_selector(owner, &m.name, m.bind.as_deref())?;

    match (m.selector(), &m.wrap) {
        (None, _) if m.constructor => {
            return Err(BindingError::new(
                1009,
                format!("No selector specified for method `{full}.{}'", m.name),
            )
            .with_culprit(culprit));
        }
        (None, None) => {
            return Err(BindingError::new(
                1012,
                format!("No Export or Bind attribute defined on {full}.{}", m.name),
            )
            .with_culprit(culprit));
        }
        _ => {}
    }

    if m.no_default_value && m.is_abstract {
        return Err(BindingError::new(
            1019,
            format!("Cannot use [NoDefaultValue] on abstract method `{full}.{}'", m.name),
        )
        .with_culprit(culprit));
    }
    if m.no_default_value && m.default_value.is_some() {
        return Err(BindingError::new(
            1019,
            format!("Cannot use both [NoDefaultValue] and [DefaultValue] on method `{full}.{}'", m.name),
        )
        .with_culprit(culprit));
    }

    if let (Some(selector), None) = (m.export.as_deref(), &m.wrap) {
        if !m.variadic {
            let slots = selector.matches(':').count();
            if slots != m.params.len() {
                diagnostics.warn(
                    1105,
                    format!(
                        "Potential selector/argument mismatch [Export (\"{selector}\")] has {slots} arguments and {full}.{} has {} arguments",
                        m.name,
                        m.params.len()
                    ),
                );
            }
        }
    }
    Ok(())
}

fn validate_property(owner: &TypeDescriptor, p: &PropertyDescriptor) -> Result<()> {
    let full = owner.full_name();
    let culprit = format!("{full}.{}", p.name);
    if p.thread_static && !p.is_static {
        return Err(
            BindingError::new(1008, "[IsThreadStatic] is only valid on properties that are also [Static]")
                .with_culprit(culprit),
        );
    }
    for selector in [p.export.as_deref(), p.bind.as_deref(), p.getter.as_deref(), p.setter.as_deref()] {
        check_selector(owner, &p.name, selector)?;
    }
    if p.export.is_none() && p.bind.is_none() && p.wrap.is_none() && p.field.is_none() {
        return Err(
            BindingError::new(1018, format!("No [Export] attribute on property {full}.{}", p.name))
                .with_culprit(culprit),
        );
    }
    Ok(())
}

fn validate_type(universe: &TypeUniverse, t: &TypeDescriptor, diagnostics: &mut Diagnostics) -> Result<()> {
    let full = t.full_name();
    if t.namespace.is_none() {
        diagnostics.warn(
            1103,
            format!("'{full}' does not live under a namespace; namespaces are a highly recommended .NET best practice"),
        );
    }
    if t.is_static && t.protocol {
        return Err(
            BindingError::new(1025, format!("[Static] and [Protocol] are mutually exclusive ({full})"))
                .with_culprit(full),
        );
    }
    if t.category && t.model {
        return Err(BindingError::new(1022, "Category classes can not use the [Model] attribute").with_culprit(full));
    }
    if universe.base_of(&full)?.as_deref() == Some(full.as_str()) {
        return Err(BindingError::new(
            1030,
            format!("{full} cannot have [BaseType(typeof({full}))] as it creates a circular dependency"),
        )
        .with_culprit(full));
    }
    for m in t.methods().filter(|m| !m.unavailable) {
        validate_method(t, m, diagnostics)?;
    }
    for p in t.properties().filter(|p| !p.unavailable) {
        validate_property(t, p)?;
    }
    Ok(())
}

/// Check every declared type, in name order. Fatal problems stop at the
/// first one; advisories go to `diagnostics`.
pub fn validate(universe: &TypeUniverse, diagnostics: &mut Diagnostics) -> Result<()> {
    let mut types: Vec<&TypeDescriptor> = universe.types().iter().collect();
    types.sort_by_key(|t| t.full_name());
    for t in types {
        validate_type(universe, t, diagnostics)?;
    }
    tracing::debug!(types = universe.types().len(), warnings = diagnostics.warnings().len(), "description validated");
    Ok(())
}
