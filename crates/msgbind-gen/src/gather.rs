//! Type contracts: the members generated for one type.
//!
//! A contract starts with the type's own members. Classes additionally pull
//! in members of a model base type (unless only public API is visible) and
//! inline the members of every protocol they conform to; protocols pull in
//! the members of the protocols they inherit. The same selector reached
//! through several protocols is generated once, and only when every
//! declaration agrees on its signature.

use std::collections::{HashMap, HashSet};

use msgbind_model::universe::Scope;
use msgbind_model::{MethodDescriptor, PropertyDescriptor, RefKind, Ty, TypeDescriptor, TypeUniverse};

use crate::callable::resolve_in;
use crate::error::{BindingError, Result};
use crate::options::GeneratorOptions;

/// Where a contract member comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Declared,
    /// Injected from a model base type.
    Model(String),
    /// Inlined from a protocol; `required` when the protocol marks it abstract.
    Protocol { name: String, required: bool },
}

impl Origin {
    pub fn is_inlined(&self) -> bool {
        !matches!(self, Origin::Declared)
    }
}

#[derive(Debug, Clone)]
pub struct ContractMethod<'u> {
    /// The type that declares the member.
    pub owner: &'u TypeDescriptor,
    pub method: &'u MethodDescriptor,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub struct ContractProperty<'u> {
    pub owner: &'u TypeDescriptor,
    pub property: &'u PropertyDescriptor,
    pub origin: Origin,
}

/// Ordered members of one type: constructors first, then by name.
#[derive(Debug, Clone, Default)]
pub struct Contract<'u> {
    pub methods: Vec<ContractMethod<'u>>,
    pub properties: Vec<ContractProperty<'u>>,
}

/// Every protocol `ty` conforms to or inherits, depth first, each once.
/// Builtin protocols with no description are skipped.
pub fn all_protocols<'u>(universe: &'u TypeUniverse, ty: &'u TypeDescriptor) -> Result<Vec<&'u TypeDescriptor>> {
    let mut out: Vec<&'u TypeDescriptor> = Vec::new();
    let mut seen = HashSet::from([ty.full_name()]);
    let mut stack: Vec<&'u TypeDescriptor> = vec![ty];
    while let Some(current) = stack.pop() {
        let context = current.full_name();
        let scope = Scope::new(current.namespace.as_deref(), &context);
        let mut found = Vec::new();
        for name in &current.protocols {
            if let Some(p) = universe.resolve_protocol(name, &scope)? {
                if seen.insert(p.full_name()) {
                    found.push(p);
                }
            }
        }
        out.extend(found.iter().copied());
        stack.extend(found.into_iter().rev());
    }
    Ok(out)
}

fn conflict(code: u32, host: &TypeDescriptor, member: &str, message: String) -> BindingError {
    BindingError::new(code, message).with_culprit(format!("{}.{member}", host.full_name()))
}

/// Check that two declarations of one selector agree on their signature.
fn check_same_signature(
    universe: &TypeUniverse,
    host: &TypeDescriptor,
    selector: &str,
    first: (&TypeDescriptor, &MethodDescriptor),
    other: (&TypeDescriptor, &MethodDescriptor),
) -> Result<()> {
    let (fo, fm) = first;
    let (oo, om) = other;
    if resolve_in(universe, fo, &fm.returns)? != resolve_in(universe, oo, &om.returns)? {
        return Err(conflict(
            1038,
            host,
            &fm.name,
            format!(
                "The selector {} on type {} is found multiple times with different return types.",
                fm.name, host.name
            ),
        ));
    }
    if fm.params.len() != om.params.len() {
        return Err(conflict(
            1039,
            host,
            &fm.name,
            format!(
                "The selector {selector} on type {} is found multiple times with different argument length {} : {}.",
                host.name,
                fm.params.len(),
                om.params.len()
            ),
        ));
    }
    for (i, (a, b)) in fm.params.iter().zip(&om.params).enumerate() {
        let ta = resolve_in(universe, fo, &a.ty)?;
        let tb = resolve_in(universe, oo, &b.ty)?;
        let is_out = |t: &Ty| matches!(t, Ty::ByRef { kind: RefKind::Out, .. });
        if is_out(&ta) != is_out(&tb) {
            return Err(conflict(
                1040,
                host,
                &fm.name,
                format!(
                    "The selector {selector} on type {} is found multiple times with different argument out states on argument {i}.",
                    host.name
                ),
            ));
        }
        if ta != tb {
            return Err(conflict(
                1041,
                host,
                &fm.name,
                format!(
                    "The selector {selector} on type {} is found multiple times with different argument types on argument {i} - {ta} : {tb}.",
                    host.name
                ),
            ));
        }
    }
    Ok(())
}

/// Pick the one declaration of a property reached through several protocols.
fn choose_property<'a, 'u>(
    universe: &TypeUniverse,
    host: &TypeDescriptor,
    group: &'a [(&'u TypeDescriptor, &'u PropertyDescriptor)],
) -> Result<&'a (&'u TypeDescriptor, &'u PropertyDescriptor)> {
    let (fo, fp) = group[0];
    let first_ty = resolve_in(universe, fo, &fp.ty)?;
    for (o, p) in &group[1..] {
        let ty = resolve_in(universe, o, &p.ty)?;
        if ty != first_ty {
            return Err(conflict(
                1037,
                host,
                &fp.name,
                format!(
                    "The selector {} on type {} is found multiple times with different property types: {first_ty} and {ty}.",
                    fp.name, host.name
                ),
            ));
        }
    }
    // a read-write declaration satisfies read-only ones
    if let Some(rw) = group.iter().find(|(_, p)| p.can_write()) {
        return Ok(rw);
    }
    Ok(&group[0])
}

/// Gather the contract of `ty`. Unavailable members are dropped before any
/// de-duplication, so an unavailable declaration never hides a protocol one.
pub fn gather<'u>(
    universe: &'u TypeUniverse,
    options: &GeneratorOptions,
    ty: &'u TypeDescriptor,
) -> Result<Contract<'u>> {
    let mut contract = Contract::default();
    // selector to the arity of the member already bound to it
    let mut bound_selectors: HashMap<&str, usize> = HashMap::new();
    let mut bound_properties: HashSet<&str> = HashSet::new();

    for m in ty.methods().filter(|m| !m.unavailable) {
        if let Some(sel) = m.selector() {
            bound_selectors.insert(sel, m.params.len());
        }
        contract.methods.push(ContractMethod {
            owner: ty,
            method: m,
            origin: Origin::Declared,
        });
    }
    for p in ty.properties().filter(|p| !p.unavailable) {
        bound_properties.insert(&p.name);
        contract.properties.push(ContractProperty {
            owner: ty,
            property: p,
            origin: Origin::Declared,
        });
    }

    if !options.public_only && !ty.protocol && !ty.category {
        let model = universe
            .base_of(&ty.full_name())?
            .and_then(|base| universe.api_type_by_name(&base))
            .filter(|b| b.model);
        if let Some(model) = model {
            let origin = Origin::Model(model.full_name());
            for m in model.methods().filter(|m| !m.unavailable && !m.constructor) {
                let Some(sel) = m.selector() else { continue };
                if !bound_selectors.contains_key(sel) {
                    bound_selectors.insert(sel, m.params.len());
                    contract.methods.push(ContractMethod {
                        owner: model,
                        method: m,
                        origin: origin.clone(),
                    });
                }
            }
            for p in model.properties().filter(|p| !p.unavailable) {
                if bound_properties.insert(&p.name) {
                    contract.properties.push(ContractProperty {
                        owner: model,
                        property: p,
                        origin: origin.clone(),
                    });
                }
            }
        }
    }

    if !ty.category {
        let protocols = all_protocols(universe, ty)?;

        let mut generated: HashMap<&str, (&TypeDescriptor, &MethodDescriptor)> = HashMap::new();
        for &proto in &protocols {
            for m in proto.methods().filter(|m| !m.unavailable && !m.constructor) {
                let Some(sel) = m.selector() else { continue };
                if let Some(&arity) = bound_selectors.get(sel) {
                    if arity != m.params.len() {
                        return Err(conflict(
                            1039,
                            ty,
                            &m.name,
                            format!(
                                "The selector {sel} on type {} is found multiple times with different argument length {arity} : {}.",
                                ty.name,
                                m.params.len()
                            ),
                        ));
                    }
                    continue;
                }
                if let Some(first) = generated.get(sel) {
                    check_same_signature(universe, ty, sel, *first, (proto, m))?;
                    continue;
                }
                generated.insert(sel, (proto, m));
                contract.methods.push(ContractMethod {
                    owner: proto,
                    method: m,
                    origin: Origin::Protocol {
                        name: proto.full_name(),
                        required: m.is_abstract,
                    },
                });
            }
        }

        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<(&TypeDescriptor, &PropertyDescriptor)>> = HashMap::new();
        for &proto in &protocols {
            for p in proto.properties().filter(|p| !p.unavailable) {
                if bound_properties.contains(p.name.as_str()) {
                    continue;
                }
                let group = groups.entry(&p.name).or_default();
                if group.is_empty() {
                    order.push(&p.name);
                }
                group.push((proto, p));
            }
        }
        for name in order {
            let group = &groups[name];
            let (owner, property) = *choose_property(universe, ty, group)?;
            contract.properties.push(ContractProperty {
                owner,
                property,
                origin: Origin::Protocol {
                    name: owner.full_name(),
                    required: property.is_abstract,
                },
            });
        }
    }

    contract
        .methods
        .sort_by(|a, b| (!a.method.constructor, &a.method.name).cmp(&(!b.method.constructor, &b.method.name)));
    contract.properties.sort_by(|a, b| a.property.name.cmp(&b.property.name));
    tracing::debug!(
        type_name = %ty.full_name(),
        methods = contract.methods.len(),
        properties = contract.properties.len(),
        "gathered contract"
    );
    Ok(contract)
}

/// Required instance members of protocol `proto` and of every protocol it
/// inherits: what a wrapper for an unknown conforming handle implements.
/// Each selector and property name appears once, and every declaration
/// reached more than once must agree, including one `proto` redeclares.
pub fn protocol_requirements<'u>(universe: &'u TypeUniverse, proto: &'u TypeDescriptor) -> Result<Contract<'u>> {
    let mut sources = vec![proto];
    sources.extend(all_protocols(universe, proto)?);

    let mut contract = Contract::default();
    let mut methods: HashMap<&str, (&TypeDescriptor, &MethodDescriptor)> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<(&TypeDescriptor, &PropertyDescriptor)>> = HashMap::new();

    for &source in &sources {
        let origin = Origin::Protocol {
            name: source.full_name(),
            required: true,
        };
        for m in source.methods().filter(|m| m.is_abstract && !m.is_static && !m.unavailable) {
            let key = m.selector().unwrap_or(m.name.as_str());
            if let Some(first) = methods.get(key) {
                check_same_signature(universe, proto, key, *first, (source, m))?;
                continue;
            }
            methods.insert(key, (source, m));
            contract.methods.push(ContractMethod {
                owner: source,
                method: m,
                origin: origin.clone(),
            });
        }
        for p in source.properties().filter(|p| p.is_abstract && !p.is_static && !p.unavailable) {
            let group = groups.entry(&p.name).or_default();
            if group.is_empty() {
                order.push(&p.name);
            }
            group.push((source, p));
        }
    }
    for name in order {
        let (owner, property) = *choose_property(universe, proto, &groups[name])?;
        contract.properties.push(ContractProperty {
            owner,
            property,
            origin: Origin::Protocol {
                name: owner.full_name(),
                required: true,
            },
        });
    }
    Ok(contract)
}
