//! Name resolution over described and builtin types.

use std::collections::HashMap;

use msgbind_targets::ApplePlatform;

use crate::builtin;
use crate::description::ApiDescription;
use crate::descriptor::{
    DelegateDescriptor, EnumDescriptor, EventArgsDescriptor, ExternalDescriptor, ExternalKind,
    GenericParam, StructDescriptor, TypeDescriptor,
};
use crate::error::{ModelError, Result};
use crate::primitive::Primitive;
use crate::ty::{QualName, Ty};
use crate::typeref::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Api(usize),
    Interface(usize),
    Enum(usize),
    Struct(usize),
    Delegate(usize),
    EventArgs(usize),
    External(usize),
}

/// Where a type reference appears, for short-name preference and diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Namespace of the referencing declaration.
    pub namespace: Option<&'a str>,
    /// Generic parameters visible at the reference.
    pub generics: &'a [GenericParam],
    /// Human-readable location (`Demo.Widget.Foo`).
    pub context: &'a str,
}

impl<'a> Scope<'a> {
    pub fn new(namespace: Option<&'a str>, context: &'a str) -> Self {
        Self {
            namespace,
            generics: &[],
            context,
        }
    }

    pub fn with_generics(mut self, generics: &'a [GenericParam]) -> Self {
        self.generics = generics;
        self
    }
}

/// A delegate's invoke signature with generic arguments substituted.
#[derive(Debug, Clone)]
pub struct DelegateSignature<'u> {
    pub descriptor: &'u DelegateDescriptor,
    pub returns: Ty,
    pub params: Vec<(&'u crate::descriptor::ParamDescriptor, Ty)>,
}

/// Every type a binding may mention, indexed by full and short name.
#[derive(Debug)]
pub struct TypeUniverse {
    platform: ApplePlatform,
    description: ApiDescription,
    structs: Vec<StructDescriptor>,
    delegates: Vec<DelegateDescriptor>,
    externals: Vec<ExternalDescriptor>,
    by_full: HashMap<String, Symbol>,
    by_short: HashMap<String, Vec<String>>,
}

fn arity_key(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_string()
    } else {
        format!("{name}`{arity}")
    }
}

impl TypeUniverse {
    /// Index a description together with the builtin types of `platform`.
    pub fn new(description: ApiDescription, platform: ApplePlatform) -> Result<Self> {
        let mut structs = builtin::structs(platform);
        structs.extend(description.structs.iter().cloned());
        let mut delegates = builtin::delegates();
        delegates.extend(description.delegates.iter().cloned());
        let mut externals = builtin::externals(platform);
        externals.extend(description.externals.iter().cloned());

        let mut universe = Self {
            platform,
            description,
            structs,
            delegates,
            externals,
            by_full: HashMap::new(),
            by_short: HashMap::new(),
        };
        universe.index()?;
        tracing::debug!(
            platform = %platform,
            symbols = universe.by_full.len(),
            "type universe indexed"
        );
        Ok(universe)
    }

    fn insert(&mut self, namespace: Option<&str>, short: String, sym: Symbol, builtin: bool) -> Result<()> {
        let full = match namespace {
            Some(ns) => format!("{ns}.{short}"),
            None => short.clone(),
        };
        if let Some(previous) = self.by_full.get(&full) {
            // described types may shadow builtins of the same name
            if builtin || !matches!(previous, Symbol::External(_) | Symbol::Struct(_) | Symbol::Delegate(_)) {
                return Err(ModelError::InvalidDescription {
                    detail: format!("'{full}' is declared more than once"),
                });
            }
        } else {
            self.by_short.entry(short).or_default().push(full.clone());
        }
        self.by_full.insert(full, sym);
        Ok(())
    }

    fn index(&mut self) -> Result<()> {
        let builtin_structs = builtin::structs(self.platform).len();
        let builtin_delegates = builtin::delegates().len();
        let builtin_externals = builtin::externals(self.platform).len();

        let externals: Vec<(Option<String>, String)> = self
            .externals
            .iter()
            .map(|e| (e.namespace.clone(), e.name.clone()))
            .collect();
        for (i, (ns, name)) in externals.into_iter().enumerate() {
            self.insert(ns.as_deref(), name, Symbol::External(i), i < builtin_externals)?;
        }

        let structs: Vec<(Option<String>, String)> = self
            .structs
            .iter()
            .map(|s| (s.namespace.clone(), s.name.clone()))
            .collect();
        for (i, (ns, name)) in structs.into_iter().enumerate() {
            self.insert(ns.as_deref(), name, Symbol::Struct(i), i < builtin_structs)?;
        }

        let delegates: Vec<(Option<String>, String)> = self
            .delegates
            .iter()
            .map(|d| (d.namespace.clone(), arity_key(&d.name, d.generic_params.len())))
            .collect();
        for (i, (ns, name)) in delegates.into_iter().enumerate() {
            self.insert(ns.as_deref(), name, Symbol::Delegate(i), i < builtin_delegates)?;
        }

        let enums: Vec<(Option<String>, String)> = self
            .description
            .enums
            .iter()
            .map(|e| (e.namespace.clone(), e.name.clone()))
            .collect();
        for (i, (ns, name)) in enums.into_iter().enumerate() {
            self.insert(ns.as_deref(), name, Symbol::Enum(i), false)?;
        }

        let event_args: Vec<(Option<String>, String)> = self
            .description
            .event_args
            .iter()
            .map(|e| (e.namespace.clone(), e.name.clone()))
            .collect();
        for (i, (ns, name)) in event_args.into_iter().enumerate() {
            self.insert(ns.as_deref(), name, Symbol::EventArgs(i), false)?;
        }

        let types: Vec<(Option<String>, String, bool)> = self
            .description
            .types
            .iter()
            .map(|t| (t.namespace.clone(), t.name.clone(), t.protocol))
            .collect();
        for (i, (ns, name, protocol)) in types.into_iter().enumerate() {
            self.insert(ns.as_deref(), name.clone(), Symbol::Api(i), false)?;
            if protocol {
                self.insert(ns.as_deref(), format!("I{name}"), Symbol::Interface(i), false)?;
            }
        }
        Ok(())
    }

    pub fn platform(&self) -> ApplePlatform {
        self.platform
    }

    pub fn description(&self) -> &ApiDescription {
        &self.description
    }

    /// Declared API types, in declaration order.
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.description.types
    }

    pub fn event_args_types(&self) -> &[EventArgsDescriptor] {
        &self.description.event_args
    }

    fn lookup(&self, key: &str, scope: &Scope<'_>) -> Result<Option<(Symbol, String)>> {
        if let Some(sym) = self.by_full.get(key) {
            return Ok(Some((*sym, key.to_string())));
        }
        if key.contains('.') {
            return Ok(None);
        }
        let Some(candidates) = self.by_short.get(key) else {
            return Ok(None);
        };
        let chosen = if candidates.len() == 1 {
            candidates[0].clone()
        } else {
            let local = scope
                .namespace
                .map(|ns| format!("{ns}.{key}"))
                .filter(|full| candidates.contains(full));
            match local {
                Some(full) => full,
                None => {
                    let mut sorted = candidates.clone();
                    sorted.sort();
                    return Err(ModelError::AmbiguousType {
                        name: key.to_string(),
                        context: scope.context.to_string(),
                        candidates: sorted,
                    });
                }
            }
        };
        Ok(self.by_full.get(&chosen).map(|sym| (*sym, chosen)))
    }

    /// Resolve a type reference.
    pub fn resolve(&self, ty: &TypeRef, scope: &Scope<'_>) -> Result<Ty> {
        match ty {
            TypeRef::Array(elem) => Ok(Ty::Array(Box::new(self.resolve(elem, scope)?))),
            TypeRef::ByRef { kind, elem } => Ok(Ty::ByRef {
                kind: *kind,
                elem: Box::new(self.resolve(elem, scope)?),
            }),
            TypeRef::Named { name, args } => self.resolve_named(name, args, scope),
        }
    }

    fn resolve_named(&self, name: &str, args: &[TypeRef], scope: &Scope<'_>) -> Result<Ty> {
        if args.is_empty() {
            if scope.generics.iter().any(|g| g.name == name) {
                return Ok(Ty::GenericParam(name.to_string()));
            }
            match name {
                "void" | "System.Void" => return Ok(Ty::Void),
                "string" | "String" | "System.String" => return Ok(Ty::String),
                "object" => return Ok(Ty::Opaque(QualName::new(Some("System"), "Object"))),
                _ => {}
            }
            if let Some(p) = Primitive::from_name(name) {
                return Ok(Ty::Primitive(p));
            }
        }

        let key = arity_key(name, args.len());
        let Some((sym, full)) = self.lookup(&key, scope)? else {
            return Err(ModelError::UnknownType {
                name: TypeRef::Named {
                    name: name.to_string(),
                    args: args.to_vec(),
                }
                .to_string(),
                context: scope.context.to_string(),
            });
        };
        let qual = QualName::parse(&full);

        if !args.is_empty() && !matches!(sym, Symbol::Delegate(_)) {
            return Err(ModelError::InvalidTypeRef {
                input: name.to_string(),
                detail: "only delegate types take generic arguments".to_string(),
            });
        }

        Ok(match sym {
            Symbol::Api(i) => {
                let t = &self.description.types[i];
                if t.protocol && t.base.is_none() {
                    Ty::Protocol(QualName::new(t.namespace.as_deref(), t.interface_name()))
                } else {
                    Ty::Class(qual)
                }
            }
            Symbol::Interface(_) => Ty::Protocol(qual),
            Symbol::Enum(_) => Ty::Enum(qual),
            Symbol::Struct(_) => Ty::Struct(qual),
            Symbol::Delegate(_) => {
                let resolved = args
                    .iter()
                    .map(|a| self.resolve(a, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ty::Delegate {
                    name: qual,
                    args: resolved,
                }
            }
            Symbol::EventArgs(_) => Ty::Opaque(qual),
            Symbol::External(i) => match self.externals[i].kind {
                ExternalKind::Object => Ty::Class(qual),
                ExternalKind::NativeObject => Ty::NativeObject(qual),
                ExternalKind::DictionaryContainer => Ty::DictionaryContainer(qual),
                ExternalKind::Opaque => Ty::Opaque(qual),
            },
        })
    }

    /// Find a declared API type by qualified name.
    pub fn api_type(&self, qual: &QualName) -> Option<&TypeDescriptor> {
        match self.by_full.get(&qual.full_name())? {
            Symbol::Api(i) | Symbol::Interface(i) => Some(&self.description.types[*i]),
            _ => None,
        }
    }

    /// Find a declared API type by full name.
    pub fn api_type_by_name(&self, full: &str) -> Option<&TypeDescriptor> {
        self.api_type(&QualName::parse(full))
    }

    pub fn enum_descriptor(&self, qual: &QualName) -> Option<&EnumDescriptor> {
        match self.by_full.get(&qual.full_name())? {
            Symbol::Enum(i) => Some(&self.description.enums[*i]),
            _ => None,
        }
    }

    pub fn struct_descriptor(&self, qual: &QualName) -> Option<&StructDescriptor> {
        match self.by_full.get(&qual.full_name())? {
            Symbol::Struct(i) => Some(&self.structs[*i]),
            _ => None,
        }
    }

    pub fn delegate_descriptor(&self, qual: &QualName) -> Option<&DelegateDescriptor> {
        match self.by_full.get(&qual.full_name())? {
            Symbol::Delegate(i) => Some(&self.delegates[*i]),
            _ => None,
        }
    }

    pub fn event_args(&self, full: &str) -> Option<&EventArgsDescriptor> {
        match self.by_full.get(full)? {
            Symbol::EventArgs(i) => Some(&self.description.event_args[*i]),
            _ => None,
        }
    }

    /// Resolve an event-args type name relative to a namespace.
    pub fn resolve_event_args(&self, name: &str, scope: &Scope<'_>) -> Result<&EventArgsDescriptor> {
        match self.lookup(name, scope)? {
            Some((Symbol::EventArgs(i), _)) => Ok(&self.description.event_args[i]),
            _ => Err(ModelError::UnknownType {
                name: name.to_string(),
                context: scope.context.to_string(),
            }),
        }
    }

    /// Resolve a protocol listed by a type. Builtin native protocols that
    /// are not described yield `None`.
    pub fn resolve_protocol(&self, name: &str, scope: &Scope<'_>) -> Result<Option<&TypeDescriptor>> {
        let bare = name.strip_prefix('I').filter(|rest| {
            rest.starts_with(|c: char| c.is_uppercase()) && self.by_short.contains_key(*rest)
        });
        for candidate in [Some(name), bare].into_iter().flatten() {
            if let Some((Symbol::Api(i) | Symbol::Interface(i), _)) = self.lookup(candidate, scope)? {
                let t = &self.description.types[i];
                if t.protocol {
                    return Ok(Some(t));
                }
            }
        }
        if builtin::PROTOCOLS.contains(&name) {
            return Ok(None);
        }
        Err(ModelError::UnknownType {
            name: name.to_string(),
            context: scope.context.to_string(),
        })
    }

    /// Full name of the base type of a class (described or builtin).
    pub fn base_of(&self, full: &str) -> Result<Option<String>> {
        match self.by_full.get(full) {
            Some(Symbol::Api(i)) => {
                let t = &self.description.types[*i];
                let Some(base) = &t.base else {
                    return Ok(None);
                };
                let context = t.full_name();
                let scope = Scope::new(t.namespace.as_deref(), &context);
                match self.resolve(base, &scope)? {
                    Ty::Class(q) | Ty::Opaque(q) | Ty::NativeObject(q) => Ok(Some(q.full_name())),
                    other => Err(ModelError::InvalidDescription {
                        detail: format!("base type of '{context}' must be a class, found '{other}'"),
                    }),
                }
            }
            Some(Symbol::External(i)) => {
                let e = &self.externals[*i];
                let Some(base) = &e.base else {
                    return Ok(None);
                };
                match self.lookup(base, &Scope::new(e.namespace.as_deref(), base))? {
                    Some((_, full)) => Ok(Some(full)),
                    None => Ok(Some(base.clone())),
                }
            }
            _ => Ok(None),
        }
    }

    /// Protocol names listed by a class (described or builtin).
    pub fn protocol_names(&self, full: &str) -> Vec<String> {
        match self.by_full.get(full) {
            Some(Symbol::Api(i)) => self.description.types[*i].protocols.clone(),
            Some(Symbol::External(i)) => self.externals[*i].protocols.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether `full` is `ancestor` or inherits from it.
    pub fn inherits_from(&self, full: &str, ancestor: &str) -> bool {
        let mut current = Some(full.to_string());
        let mut steps = 0;
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            steps += 1;
            if steps > 64 {
                return false;
            }
            current = self.base_of(&name).ok().flatten();
        }
        false
    }

    /// Whether the class or one of its ancestors lists `protocol`.
    pub fn conforms_to(&self, full: &str, protocol: &str) -> bool {
        let mut current = Some(full.to_string());
        let mut steps = 0;
        while let Some(name) = current {
            if self.protocol_names(&name).iter().any(|p| p == protocol) {
                return true;
            }
            steps += 1;
            if steps > 64 {
                return false;
            }
            current = self.base_of(&name).ok().flatten();
        }
        false
    }

    /// A delegate's invoke signature with generic arguments substituted.
    pub fn delegate_signature(&self, name: &QualName, args: &[Ty]) -> Result<DelegateSignature<'_>> {
        let descriptor = self
            .delegate_descriptor(name)
            .ok_or_else(|| ModelError::UnknownType {
                name: name.full_name(),
                context: "delegate signature".to_string(),
            })?;
        let context = descriptor.full_name();
        let scope = Scope::new(descriptor.namespace.as_deref(), &context)
            .with_generics(&descriptor.generic_params);
        let bindings: HashMap<&str, &Ty> = descriptor
            .generic_params
            .iter()
            .map(|g| g.name.as_str())
            .zip(args.iter())
            .collect();

        let returns = substitute(self.resolve(&descriptor.returns, &scope)?, &bindings);
        let params = descriptor
            .params
            .iter()
            .map(|p| Ok((p, substitute(self.resolve(&p.ty, &scope)?, &bindings))))
            .collect::<Result<Vec<_>>>()?;
        Ok(DelegateSignature {
            descriptor,
            returns,
            params,
        })
    }
}

fn substitute(ty: Ty, bindings: &HashMap<&str, &Ty>) -> Ty {
    match ty {
        Ty::GenericParam(ref n) => match bindings.get(n.as_str()) {
            Some(bound) => (*bound).clone(),
            None => ty,
        },
        Ty::Array(elem) => Ty::Array(Box::new(substitute(*elem, bindings))),
        Ty::ByRef { kind, elem } => Ty::ByRef {
            kind,
            elem: Box::new(substitute(*elem, bindings)),
        },
        Ty::Delegate { name, args } => Ty::Delegate {
            name,
            args: args.into_iter().map(|a| substitute(a, bindings)).collect(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe(input: &str) -> TypeUniverse {
        TypeUniverse::new(ApiDescription::parse(input).unwrap(), ApplePlatform::Ios).unwrap()
    }

    const SAMPLE: &str = r#"
[[types]]
name = "Widget"
namespace = "Demo"
base = "UIView"
protocols = ["P1", "NSCoding"]

[[types]]
name = "P1"
namespace = "Demo"
protocol = true

[[types]]
name = "Gadget"
namespace = "Other"
base = "NSObject"

[[types]]
name = "Gadget"
namespace = "Demo"
base = "Demo.Widget"

[[enums]]
name = "Mode"
namespace = "Demo"
underlying = "long"
native = true

[[delegates]]
name = "Completion"
namespace = "Demo"
params = [{ name = "error", type = "NSError" }]
"#;

    fn scope<'a>(ns: &'a str) -> Scope<'a> {
        Scope::new(Some(ns), "test")
    }

    #[test]
    fn resolve_primitives_and_strings() {
        let u = universe(SAMPLE);
        let s = scope("Demo");
        assert_eq!(u.resolve(&TypeRef::named("int"), &s).unwrap(), Ty::Primitive(Primitive::Int));
        assert_eq!(u.resolve(&TypeRef::named("string"), &s).unwrap(), Ty::String);
        assert_eq!(u.resolve(&TypeRef::void(), &s).unwrap(), Ty::Void);
    }

    #[test]
    fn resolve_classes_protocols_and_handles() {
        let u = universe(SAMPLE);
        let s = scope("Demo");
        assert_eq!(
            u.resolve(&TypeRef::named("NSString"), &s).unwrap(),
            Ty::Class(QualName::parse("Foundation.NSString"))
        );
        assert_eq!(
            u.resolve(&TypeRef::named("IP1"), &s).unwrap(),
            Ty::Protocol(QualName::parse("Demo.IP1"))
        );
        assert_eq!(
            u.resolve(&TypeRef::named("P1"), &s).unwrap(),
            Ty::Protocol(QualName::parse("Demo.IP1"))
        );
        assert_eq!(
            u.resolve(&TypeRef::named("CGColor"), &s).unwrap(),
            Ty::NativeObject(QualName::parse("CoreGraphics.CGColor"))
        );
        assert_eq!(
            u.resolve(&TypeRef::named("Mode"), &s).unwrap(),
            Ty::Enum(QualName::parse("Demo.Mode"))
        );
    }

    #[test]
    fn short_names_prefer_local_namespace() {
        let u = universe(SAMPLE);
        assert_eq!(
            u.resolve(&TypeRef::named("Gadget"), &scope("Demo")).unwrap(),
            Ty::Class(QualName::parse("Demo.Gadget"))
        );
        let err = u
            .resolve(&TypeRef::named("Gadget"), &scope("Elsewhere"))
            .unwrap_err();
        assert_eq!(err.code(), 1061);
    }

    #[test]
    fn unknown_type_names_context() {
        let u = universe(SAMPLE);
        let err = u
            .resolve(&TypeRef::named("Nope"), &Scope::new(Some("Demo"), "Demo.Widget.Foo"))
            .unwrap_err();
        assert_eq!(err.code(), 1060);
        assert!(err.to_string().contains("Demo.Widget.Foo"));
    }

    #[test]
    fn generic_delegates_by_arity() {
        let u = universe(SAMPLE);
        let t = TypeRef::parse("Action<NSString>").unwrap();
        let ty = u.resolve(&t, &scope("Demo")).unwrap();
        let Ty::Delegate { name, args } = &ty else {
            panic!("expected a delegate, got {ty:?}");
        };
        assert_eq!(name.full_name(), "System.Action`1");
        let sig = u.delegate_signature(name, args).unwrap();
        assert_eq!(sig.params[0].1, Ty::Class(QualName::parse("Foundation.NSString")));
        assert!(sig.returns.is_void());
    }

    #[test]
    fn generic_params_in_scope() {
        let u = universe(SAMPLE);
        let generics = vec![GenericParam {
            name: "T".into(),
            constraint: None,
        }];
        let s = scope("Demo").with_generics(&generics);
        assert_eq!(
            u.resolve(&TypeRef::named("T"), &s).unwrap(),
            Ty::GenericParam("T".into())
        );
    }

    #[test]
    fn inheritance_and_conformance() {
        let u = universe(SAMPLE);
        assert_eq!(u.base_of("Demo.Widget").unwrap().as_deref(), Some("UIKit.UIView"));
        assert!(u.inherits_from("Demo.Gadget", "Foundation.NSObject"));
        assert!(u.conforms_to("Demo.Gadget", "UIAppearance"));
        assert!(u.conforms_to("Demo.Widget", "NSCoding"));
        assert!(!u.conforms_to("Other.Gadget", "NSCoding"));
    }

    #[test]
    fn protocols_resolve_to_descriptors() {
        let u = universe(SAMPLE);
        let s = scope("Demo");
        assert_eq!(u.resolve_protocol("P1", &s).unwrap().unwrap().name, "P1");
        assert_eq!(u.resolve_protocol("IP1", &s).unwrap().unwrap().name, "P1");
        assert!(u.resolve_protocol("NSCoding", &s).unwrap().is_none());
        assert!(u.resolve_protocol("Missing", &s).is_err());
    }

    #[test]
    fn described_types_shadow_builtins() {
        let u = universe(
            r#"
[[structs]]
name = "CGPoint"
namespace = "CoreGraphics"
size = 24
"#,
        );
        let q = QualName::parse("CoreGraphics.CGPoint");
        assert_eq!(u.struct_descriptor(&q).unwrap().size, Some(24));
    }
}
