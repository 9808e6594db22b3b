//! Marshaling rules for handle-backed types that are not NSObjects.
//!
//! Each entry records how a managed value becomes a native handle and how
//! a returned handle becomes a managed value again. Lookup is by exact
//! qualified name.

use std::collections::HashMap;

use msgbind_model::{builtin, Ty, TypeUniverse};
use msgbind_model::descriptor::ExternalKind;

use crate::namespace::NamespaceManager;

/// How one handle-backed type crosses the native boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalEntry {
    /// Full name of the managed type.
    pub type_name: String,
    /// Native encoding used in entry-point names.
    pub encoding: &'static str,
    /// Expression template producing the native value; `{0}` is the argument.
    pub param: String,
    /// Call prefix reconstructing a managed value; closed by `)`.
    pub create: String,
    /// Whether `create` is a custom factory rather than a plain constructor.
    pub has_custom_create: bool,
}

impl MarshalEntry {
    fn handle(type_name: String, create: String, has_custom_create: bool) -> Self {
        Self {
            type_name,
            encoding: "IntPtr",
            param: "{0}.Handle".to_string(),
            create,
            has_custom_create,
        }
    }

    /// Native expression for the managed value `value`.
    pub fn nativize(&self, value: &str) -> String {
        self.param.replace("{0}", value)
    }

    /// Managed expression rebuilt from the native expression `native`.
    pub fn reconstruct(&self, native: &str) -> String {
        format!("{}{native})", self.create)
    }
}

/// Custom factories for types whose handles must not be wrapped directly.
fn custom_create(full: &str, ns: &NamespaceManager) -> Option<String> {
    let create = match full {
        "ObjCRuntime.Selector" => "Selector.FromHandle (".to_string(),
        "AudioToolbox.MusicSequence" => format!("global::{}.MusicSequence.Lookup (", ns.get("AudioToolbox")),
        "AddressBook.ABPerson" => "(ABPerson) ABRecord.FromHandle(".to_string(),
        "AddressBook.ABRecord" => "ABRecord.FromHandle(".to_string(),
        "MediaToolbox.MTAudioProcessingTap" => format!("{}.MTAudioProcessingTap.FromHandle(", ns.get("MediaToolbox")),
        "CoreMedia.CMFormatDescription" => "CMFormatDescription.Create (".to_string(),
        _ => return None,
    };
    Some(create)
}

/// Append-only table built once per run.
#[derive(Debug, Default)]
pub struct MarshalRegistry {
    entries: Vec<MarshalEntry>,
    by_name: HashMap<String, usize>,
}

impl MarshalRegistry {
    /// Register the builtin handle types of the platform plus every
    /// handle-backed external the description declares.
    pub fn new(universe: &TypeUniverse, ns: &NamespaceManager) -> Self {
        let mut registry = Self::default();
        registry.add(MarshalEntry::handle(
            "Foundation.NSObject".to_string(),
            "Runtime.GetNSObject (".to_string(),
            true,
        ));

        let mut names: Vec<String> = builtin::native_handles(universe.platform())
            .map(|h| h.full_name())
            .collect();
        names.extend(
            universe
                .description()
                .externals
                .iter()
                .filter(|e| e.kind == ExternalKind::NativeObject)
                .map(|e| e.full_name()),
        );

        for full in names {
            let entry = match custom_create(&full, ns) {
                Some(create) => MarshalEntry::handle(full, create, true),
                None => {
                    let create = format!("new {} (", ns.global_name(&msgbind_model::QualName::parse(&full)));
                    MarshalEntry::handle(full, create, false)
                }
            };
            registry.add(entry);
        }
        tracing::debug!(entries = registry.entries.len(), "marshal registry built");
        registry
    }

    fn add(&mut self, entry: MarshalEntry) {
        if self.by_name.contains_key(&entry.type_name) {
            return;
        }
        self.by_name.insert(entry.type_name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn lookup_name(&self, full: &str) -> Option<&MarshalEntry> {
        self.by_name.get(full).map(|i| &self.entries[*i])
    }

    /// Rule for a resolved type. Only handle-backed types are registered;
    /// wrapped classes are handled before the registry is consulted.
    pub fn lookup(&self, ty: &Ty) -> Option<&MarshalEntry> {
        match ty {
            Ty::NativeObject(q) | Ty::Class(q) => self.lookup_name(&q.full_name()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
