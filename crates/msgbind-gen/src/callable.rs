//! Methods, constructors and property accessors as one callable shape.
//!
//! Everything downstream of gathering (marshaling, entry points, body
//! emission) works on a [`Callable`], so a property getter and a method
//! returning the same type take exactly the same path.

use msgbind_model::descriptor::{GenericParam, MarshalDirective};
use msgbind_model::universe::Scope;
use msgbind_model::{
    MethodDescriptor, ParamDescriptor, Primitive, PropertyDescriptor, Ty, TypeDescriptor, TypeRef,
    TypeUniverse,
};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Method,
    Constructor,
    Getter,
    Setter,
}

/// One resolved parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
    pub null_allowed: bool,
    pub plain_string: bool,
    pub block_callback: bool,
    pub ccallback: bool,
    pub params_array: bool,
    pub disable_zero_copy: bool,
}

impl Param {
    fn resolve(universe: &TypeUniverse, p: &ParamDescriptor, scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            name: p.name.clone(),
            ty: universe.resolve(&p.ty, scope)?,
            null_allowed: p.null_allowed,
            plain_string: p.plain_string,
            block_callback: p.block_callback,
            ccallback: p.ccallback,
            params_array: p.params_array,
            disable_zero_copy: p.disable_zero_copy,
        })
    }

    /// A parameter with default flags.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            null_allowed: false,
            plain_string: false,
            block_callback: false,
            ccallback: false,
            params_array: false,
            disable_zero_copy: false,
        }
    }
}

/// A member that is invoked through a native message send.
#[derive(Debug, Clone)]
pub struct Callable {
    pub name: String,
    pub kind: CallableKind,
    /// Full name of the declaring type, for diagnostics.
    pub declaring_type: String,
    /// Namespace type names are formatted relative to.
    pub namespace: Option<String>,
    pub selector: String,
    pub returns: Ty,
    /// The return value (or the property) may be null.
    pub null_allowed: bool,
    pub params: Vec<Param>,
    pub is_static: bool,
    pub align: bool,
    pub factory: bool,
    pub variadic: bool,
    pub marshal_native_exceptions: bool,
    pub marshal_directive: Option<MarshalDirective>,
    pub disable_zero_copy: bool,
    /// Bound by delegation to another member; no entry point of its own.
    pub wrap: bool,
}

fn scope_for<'a>(owner: &'a TypeDescriptor, context: &'a str) -> Scope<'a> {
    Scope::new(owner.namespace.as_deref(), context).with_generics(&owner.generic_params)
}

impl Callable {
    pub fn from_method(universe: &TypeUniverse, owner: &TypeDescriptor, m: &MethodDescriptor) -> Result<Self> {
        let context = format!("{}.{}", owner.full_name(), m.name);
        let scope = scope_for(owner, &context);
        let params = m
            .params
            .iter()
            .map(|p| Param::resolve(universe, p, &scope))
            .collect::<Result<Vec<_>>>()?;
        // constructors send `init*` and get the new handle back
        let returns = if m.constructor {
            Ty::Primitive(Primitive::IntPtr)
        } else {
            universe.resolve(&m.returns, &scope)?
        };
        Ok(Self {
            name: m.name.clone(),
            kind: if m.constructor {
                CallableKind::Constructor
            } else {
                CallableKind::Method
            },
            declaring_type: owner.full_name(),
            namespace: owner.namespace.clone(),
            selector: m.selector().unwrap_or_default().to_string(),
            returns,
            null_allowed: m.null_allowed,
            params,
            is_static: m.is_static,
            align: m.align,
            factory: m.factory,
            variadic: m.variadic,
            marshal_native_exceptions: m.marshal_native_exceptions,
            marshal_directive: m.marshal_directive.clone(),
            disable_zero_copy: m.disable_zero_copy || owner.disable_zero_copy,
            wrap: m.wrap.is_some(),
        })
    }

    fn accessor(
        universe: &TypeUniverse,
        owner: &TypeDescriptor,
        p: &PropertyDescriptor,
        kind: CallableKind,
    ) -> Result<Self> {
        let context = format!("{}.{}", owner.full_name(), p.name);
        let scope = scope_for(owner, &context);
        let ty = universe.resolve(&p.ty, &scope)?;
        let (name, selector, returns, params) = match kind {
            CallableKind::Setter => {
                let mut value = Param::new("value", ty);
                value.null_allowed = p.null_allowed;
                (
                    format!("set_{}", p.name),
                    p.setter_selector().unwrap_or_default(),
                    Ty::Void,
                    vec![value],
                )
            }
            _ => (
                format!("get_{}", p.name),
                p.getter_selector().unwrap_or_default().to_string(),
                ty,
                Vec::new(),
            ),
        };
        Ok(Self {
            name,
            kind,
            declaring_type: owner.full_name(),
            namespace: owner.namespace.clone(),
            selector,
            returns,
            null_allowed: p.null_allowed,
            params,
            is_static: p.is_static,
            align: false,
            factory: false,
            variadic: false,
            marshal_native_exceptions: p.marshal_native_exceptions,
            marshal_directive: None,
            disable_zero_copy: p.disable_zero_copy || owner.disable_zero_copy,
            wrap: p.wrap.is_some(),
        })
    }

    pub fn getter(universe: &TypeUniverse, owner: &TypeDescriptor, p: &PropertyDescriptor) -> Result<Self> {
        Self::accessor(universe, owner, p, CallableKind::Getter)
    }

    pub fn setter(universe: &TypeUniverse, owner: &TypeDescriptor, p: &PropertyDescriptor) -> Result<Self> {
        Self::accessor(universe, owner, p, CallableKind::Setter)
    }

    /// A callable built from a delegate's invoke signature.
    pub fn from_signature(
        name: impl Into<String>,
        namespace: Option<String>,
        returns: Ty,
        params: Vec<Param>,
    ) -> Self {
        let name = name.into();
        Self {
            declaring_type: name.clone(),
            name,
            kind: CallableKind::Method,
            namespace,
            selector: String::new(),
            returns,
            null_allowed: false,
            params,
            is_static: false,
            align: false,
            factory: false,
            variadic: false,
            marshal_native_exceptions: false,
            marshal_directive: None,
            disable_zero_copy: true,
            wrap: false,
        }
    }

    /// Format type names relative to a different namespace (protocol
    /// members inlined into a conforming class).
    pub fn hosted_in(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace.map(str::to_string);
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == CallableKind::Constructor
    }

    pub fn is_setter(&self) -> bool {
        self.kind == CallableKind::Setter
    }

    pub fn returns_void(&self) -> bool {
        self.returns.is_void()
    }

    pub fn ns(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `Type.Member`, as used in diagnostics.
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

/// Resolve a standalone type reference in the scope of a type.
pub fn resolve_in(universe: &TypeUniverse, owner: &TypeDescriptor, ty: &TypeRef) -> Result<Ty> {
    let context = owner.full_name();
    let scope = Scope::new(owner.namespace.as_deref(), &context).with_generics(&owner.generic_params);
    Ok(universe.resolve(ty, &scope)?)
}

/// Generic parameters rendered as `<T, U>`, or nothing.
pub fn generic_suffix(params: &[GenericParam]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = params.iter().map(|g| g.name.as_str()).collect();
        format!("<{}>", names.join(", "))
    }
}
