//! State shared by every stage of one generation run.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use msgbind_model::{Ty, TypeUniverse};

use crate::error::Diagnostics;
use crate::hierarchy::Hierarchy;
use crate::messaging::EntryPoints;
use crate::namespace::NamespaceManager;
use crate::options::GeneratorOptions;
use crate::registry::MarshalRegistry;
use crate::trampoline::Trampolines;

/// Generation context threaded through every component call.
///
/// Configuration (`universe`, `options`, `ns`, `registry`) is fixed at
/// construction. The tables below it are populated in type order and only
/// rendered once every type has been processed.
pub struct GenContext<'u> {
    pub universe: &'u TypeUniverse,
    pub options: &'u GeneratorOptions,
    pub ns: NamespaceManager,
    pub registry: MarshalRegistry,
    pub entry_points: EntryPoints,
    pub trampolines: Trampolines,
    pub hierarchy: Hierarchy,
    pub diagnostics: Diagnostics,
    /// Selector fields of the type being emitted.
    pub selectors: SelectorNames,
    /// Library identifier to an explicit path (`None` for framework libraries).
    pub libraries: BTreeMap<String, Option<String>>,
    /// Event-args types referenced by notifications.
    pub notification_args: BTreeSet<String>,
    /// Described delegate types referenced by callbacks.
    pub support_delegates: BTreeSet<String>,
}

impl<'u> GenContext<'u> {
    pub fn new(universe: &'u TypeUniverse, options: &'u GeneratorOptions) -> Self {
        let ns = NamespaceManager::new(
            options.namespace_prefix.as_deref(),
            options.objc_runtime_namespace.as_deref(),
            options.platform,
        );
        let registry = MarshalRegistry::new(universe, &ns);
        let mut entry_points = EntryPoints::new();
        if options.third_party {
            entry_points.register_handle_entry_points();
        }
        Self {
            universe,
            options,
            ns,
            registry,
            entry_points,
            trampolines: Trampolines::default(),
            hierarchy: Hierarchy::default(),
            diagnostics: Diagnostics::new(),
            selectors: SelectorNames::default(),
            libraries: BTreeMap::new(),
            notification_args: BTreeSet::new(),
            support_delegates: BTreeSet::new(),
        }
    }

    /// Format `ty` as written from code in namespace `used_in`.
    pub fn format(&self, used_in: Option<&str>, ty: &Ty) -> String {
        self.ns.format_type(used_in, ty)
    }

    /// Namespace the `Messaging` class is declared in, unprefixed.
    pub fn messaging_scope(&self) -> Option<&str> {
        Some(
            self.options
                .objc_runtime_namespace
                .as_deref()
                .unwrap_or("ObjCRuntime"),
        )
    }

    /// `global::Ns.Messaging`.
    pub fn messaging(&self) -> String {
        format!("global::{}", self.ns.messaging)
    }

    /// Whether member bodies may use super-call paths.
    pub fn external(&self) -> bool {
        self.options.external
    }
}

/// Selector field names for one emitted type.
#[derive(Debug, Default)]
pub struct SelectorNames {
    by_selector: BTreeMap<String, String>,
    used: HashSet<String>,
    order: Vec<String>,
}

impl SelectorNames {
    /// Forget the previous type's selectors.
    pub fn reset(&mut self) {
        self.by_selector.clear();
        self.used.clear();
        self.order.clear();
    }

    /// Base name for a selector (`selTitleForState` for `titleForState:`).
    /// A different selector that maps to the same name gets a numeric suffix.
    pub fn base_name(&mut self, selector: &str) -> String {
        if let Some(name) = self.by_selector.get(selector) {
            return name.clone();
        }
        let mut base = String::from("sel");
        let mut up = true;
        for c in selector.chars() {
            if c == ':' {
                up = true;
            } else if c.is_ascii_alphanumeric() || c == '_' {
                if up {
                    base.push(c.to_ascii_uppercase());
                    up = false;
                } else {
                    base.push(c);
                }
            }
        }
        let mut name = base.clone();
        let mut n = 1;
        while self.used.contains(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        self.used.insert(name.clone());
        self.by_selector.insert(selector.to_string(), name.clone());
        self.order.push(selector.to_string());
        name
    }

    /// Selectors in first-use order with their base names.
    pub fn fields(&self) -> Vec<(&str, &str)> {
        self.order
            .iter()
            .filter_map(|s| self.by_selector.get(s).map(|n| (s.as_str(), n.as_str())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Expression yielding the selector handle at a call site.
pub fn selector_field(ctx: &mut GenContext<'_>, selector: &str, force_inline: bool) -> String {
    if ctx.options.inline_selectors || force_inline {
        format!("Selector.GetHandle (\"{selector}\")")
    } else {
        format!("{}Handle", ctx.selectors.base_name(selector))
    }
}
