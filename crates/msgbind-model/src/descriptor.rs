//! Descriptors for the declared API surface.
//!
//! Every flag that drives generation is a plain field. Members are a tagged
//! union of methods and properties so that each stage can pattern match on
//! the kind instead of probing for optional attributes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::primitive::Primitive;
use crate::typeref::TypeRef;

/// A declared class, protocol or category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TypeDescriptor {
    pub name: String,
    pub namespace: Option<String>,
    /// Base type; protocols without a base only produce interface artifacts.
    pub base: Option<TypeRef>,
    /// Implemented (or, for protocols, inherited) protocols by name.
    pub protocols: Vec<String>,
    /// Native class or protocol name when it differs from `name`.
    pub register: Option<String>,
    pub protocol: bool,
    pub category: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub model: bool,
    pub partial: bool,
    pub internal: bool,
    pub informal: bool,
    pub unavailable: bool,
    pub thread_safe: bool,
    pub disable_zero_copy: bool,
    /// Default library for field constants declared on this type.
    pub library: Option<String>,
    pub generic_params: Vec<GenericParam>,
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// `Namespace.Name`, or just `Name` when no namespace is declared.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// The name registered with the native runtime.
    pub fn native_name(&self) -> &str {
        self.register.as_deref().unwrap_or(&self.name)
    }

    /// The interface name generated for a protocol (`IFoo` for `Foo`).
    pub fn interface_name(&self) -> String {
        format!("I{}", self.name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.members.iter().filter_map(|m| match m {
            MemberDescriptor::Method(m) => Some(m),
            MemberDescriptor::Property(_) => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.members.iter().filter_map(|m| match m {
            MemberDescriptor::Property(p) => Some(p),
            MemberDescriptor::Method(_) => None,
        })
    }
}

/// A generic parameter with an optional constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GenericParam {
    pub name: String,
    #[serde(default)]
    pub constraint: Option<String>,
}

/// A method or property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MemberDescriptor {
    Method(MethodDescriptor),
    Property(PropertyDescriptor),
}

impl MemberDescriptor {
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Method(m) => &m.name,
            MemberDescriptor::Property(p) => &p.name,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        match self {
            MemberDescriptor::Method(m) => m.unavailable,
            MemberDescriptor::Property(p) => p.unavailable,
        }
    }
}

/// Native-side overrides for the entry point used by a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MarshalDirective {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub library: Option<String>,
}

/// A bound method or constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub export: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub wrap: Option<String>,
    #[serde(default = "TypeRef::void")]
    pub returns: TypeRef,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default, rename = "override")]
    pub is_override: bool,
    #[serde(default, rename = "new")]
    pub is_new: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub constructor: bool,
    /// Static factory returning a freshly created handle.
    #[serde(default)]
    pub factory: bool,
    #[serde(default)]
    pub variadic: bool,
    /// Struct return that must be read through an aligned buffer.
    #[serde(default)]
    pub align: bool,
    /// The return value may be null.
    #[serde(default)]
    pub null_allowed: bool,
    #[serde(default)]
    pub marshal_native_exceptions: bool,
    #[serde(default)]
    pub marshal_directive: Option<MarshalDirective>,
    /// Value returned by protocol callbacks when the handler is missing.
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub no_default_value: bool,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub disable_zero_copy: bool,
    /// Exposed on the type's appearance proxy.
    #[serde(default)]
    pub appearance: bool,
}

impl MethodDescriptor {
    /// A method with only a name, for building descriptors programmatically.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            export: None,
            bind: None,
            wrap: None,
            returns: TypeRef::void(),
            params: Vec::new(),
            is_static: false,
            is_abstract: false,
            sealed: false,
            is_override: false,
            is_new: false,
            internal: false,
            protected: false,
            constructor: false,
            factory: false,
            variadic: false,
            align: false,
            null_allowed: false,
            marshal_native_exceptions: false,
            marshal_directive: None,
            default_value: None,
            no_default_value: false,
            unavailable: false,
            disable_zero_copy: false,
            appearance: false,
        }
    }

    /// The selector used for dispatch (`bind` overrides `export`).
    pub fn selector(&self) -> Option<&str> {
        self.bind.as_deref().or(self.export.as_deref())
    }
}

/// Semantic of the object reference held by a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentSemantic {
    Assign,
    Copy,
    Retain,
    Strong,
    Weak,
}

impl ArgumentSemantic {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgumentSemantic::Assign => "Assign",
            ArgumentSemantic::Copy => "Copy",
            ArgumentSemantic::Retain => "Retain",
            ArgumentSemantic::Strong => "Strong",
            ArgumentSemantic::Weak => "Weak",
        }
    }
}

/// A property bound to an exported native symbol rather than a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldBinding {
    pub symbol: String,
    #[serde(default)]
    pub library: Option<String>,
}

/// Marks a field property as a notification name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NotificationBinding {
    /// Event-args type passed to observers.
    pub event_args: Option<String>,
    /// Expression for the notification center, default center when absent.
    pub center: Option<String>,
}

/// A bound property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub export: Option<String>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub wrap: Option<String>,
    /// Getter selector override.
    #[serde(default)]
    pub getter: Option<String>,
    /// Setter selector override.
    #[serde(default)]
    pub setter: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub semantic: Option<ArgumentSemantic>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default, rename = "override")]
    pub is_override: bool,
    #[serde(default, rename = "new")]
    pub is_new: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub null_allowed: bool,
    #[serde(default)]
    pub thread_static: bool,
    #[serde(default)]
    pub field: Option<FieldBinding>,
    #[serde(default)]
    pub notification: Option<NotificationBinding>,
    #[serde(default)]
    pub marshal_native_exceptions: bool,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub disable_zero_copy: bool,
    #[serde(default)]
    pub appearance: bool,
}

impl PropertyDescriptor {
    /// A read-write property with only a name and a type.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            export: None,
            bind: None,
            wrap: None,
            getter: None,
            setter: None,
            readonly: false,
            semantic: None,
            is_static: false,
            is_abstract: false,
            sealed: false,
            is_override: false,
            is_new: false,
            internal: false,
            protected: false,
            null_allowed: false,
            thread_static: false,
            field: None,
            notification: None,
            marshal_native_exceptions: false,
            unavailable: false,
            disable_zero_copy: false,
            appearance: false,
        }
    }

    /// Selector used by the getter.
    pub fn getter_selector(&self) -> Option<&str> {
        self.getter
            .as_deref()
            .or(self.bind.as_deref())
            .or(self.export.as_deref())
    }

    /// Selector used by the setter: an explicit override, or
    /// `set` + capitalized getter selector + `:`.
    pub fn setter_selector(&self) -> Option<String> {
        if let Some(s) = &self.setter {
            return Some(s.clone());
        }
        let export = self.export.as_deref()?;
        let mut chars = export.chars();
        let first = chars.next()?;
        Some(format!("set{}{}:", first.to_uppercase(), chars.as_str()))
    }

    pub fn can_write(&self) -> bool {
        !self.readonly
    }
}

/// One parameter of a method or delegate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub null_allowed: bool,
    /// Pass a managed string through unchanged instead of as an NSString.
    #[serde(default)]
    pub plain_string: bool,
    /// Delegate parameter that receives a native block.
    #[serde(default)]
    pub block_callback: bool,
    /// Delegate parameter that receives a C function pointer.
    #[serde(default)]
    pub ccallback: bool,
    #[serde(default, rename = "params")]
    pub params_array: bool,
    #[serde(default)]
    pub disable_zero_copy: bool,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
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

/// An enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnumDescriptor {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_underlying")]
    pub underlying: Primitive,
    /// Native width: 64-bit on 64-bit ABIs, narrowed on 32-bit ones.
    #[serde(default)]
    pub native: bool,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

fn default_underlying() -> Primitive {
    Primitive::Int
}

impl EnumDescriptor {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn contains_value(&self, value: i128) -> bool {
        self.values.iter().any(|v| v.value == value)
    }
}

/// One named enum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(deserialize_with = "deserialize_enum_literal")]
    pub value: i128,
}

/// Enum literals may be integers or strings (`"0xffffffffffffffff"`,
/// `"18446744073709551615"`, `"-1"`), since TOML integers stop at `i64`.
fn deserialize_enum_literal<'de, D>(deserializer: D) -> std::result::Result<i128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Literal {
        Int(i64),
        Text(String),
    }

    match Literal::deserialize(deserializer)? {
        Literal::Int(v) => Ok(i128::from(v)),
        Literal::Text(s) => parse_enum_literal(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a decimal or `0x` hexadecimal enum literal.
pub fn parse_enum_literal(s: &str) -> std::result::Result<i128, String> {
    let t = s.trim().replace('_', "");
    let (neg, digits) = match t.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, t.clone()),
    };
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i128::from_str_radix(hex, 16)
    } else {
        digits.parse::<i128>()
    }
    .map_err(|e| format!("invalid enum literal '{s}': {e}"))?;
    Ok(if neg { -magnitude } else { magnitude })
}

/// A value type with named fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StructDescriptor {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub fields: Vec<StructField>,
    /// Declared native size in bytes, overriding the computed layout.
    #[serde(default)]
    pub size: Option<u64>,
}

impl StructDescriptor {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// A callback (delegate) type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DelegateDescriptor {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "TypeRef::void")]
    pub returns: TypeRef,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    #[serde(default)]
    pub generic_params: Vec<GenericParam>,
    /// Value returned by the native-to-managed bridge when no handler is set.
    #[serde(default)]
    pub default_value: Option<String>,
}

impl DelegateDescriptor {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

/// An event-args type populated from a notification's user info.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventArgsDescriptor {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub properties: Vec<EventArgsProperty>,
}

impl EventArgsDescriptor {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventArgsProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// User-info key: a field symbol, or a literal string when `constant-string` is set.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub constant_string: bool,
    #[serde(default)]
    pub null_allowed: bool,
    /// Return whether the key is present instead of its value.
    #[serde(default)]
    pub probe_presence: bool,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub library: Option<String>,
}

/// How an externally bound type is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalKind {
    /// NSObject subclass.
    Object,
    /// Handle-backed type that is not an NSObject.
    NativeObject,
    /// Strongly typed dictionary wrapper.
    DictionaryContainer,
    /// Managed type with no native representation.
    Opaque,
}

/// A type bound elsewhere that the description refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExternalDescriptor {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub kind: ExternalKind,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
}

impl ExternalDescriptor {
    pub fn full_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

fn qualify(namespace: &Option<String>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setter_selector_defaults_from_export() {
        let mut p = PropertyDescriptor::new("Title", TypeRef::named("NSString"));
        p.export = Some("title".into());
        assert_eq!(p.getter_selector(), Some("title"));
        assert_eq!(p.setter_selector().as_deref(), Some("setTitle:"));

        p.setter = Some("assignTitle:".into());
        assert_eq!(p.setter_selector().as_deref(), Some("assignTitle:"));
    }

    #[test]
    fn bind_overrides_export_for_dispatch() {
        let mut m = MethodDescriptor::new("Foo");
        m.export = Some("foo".into());
        m.bind = Some("fooWithBar".into());
        assert_eq!(m.selector(), Some("fooWithBar"));
    }

    #[test]
    fn enum_literals() {
        assert_eq!(parse_enum_literal("0xffffffffffffffff").unwrap(), u64::MAX as i128);
        assert_eq!(parse_enum_literal("-1").unwrap(), -1);
        assert_eq!(parse_enum_literal("9_223_372_036_854_775_807").unwrap(), i64::MAX as i128);
        assert!(parse_enum_literal("zz").is_err());
    }

    #[test]
    fn members_are_tagged() {
        let toml = r#"
name = "Widget"
namespace = "Demo"
base = "NSObject"

[[members]]
kind = "method"
name = "Foo"
export = "foo"
returns = "int"

[[members]]
kind = "property"
name = "Title"
type = "string"
export = "title"
readonly = true
"#;
        let t: TypeDescriptor = toml::from_str(toml).unwrap();
        assert_eq!(t.full_name(), "Demo.Widget");
        assert_eq!(t.methods().count(), 1);
        let p = t.properties().next().unwrap();
        assert!(!p.can_write());
        assert_eq!(t.methods().next().unwrap().returns.to_string(), "int");
    }

    #[test]
    fn enum_values_accept_strings_and_integers() {
        let toml = r#"
name = "Mode"
underlying = "ulong"
native = true
values = [
    { name = "None", value = 0 },
    { name = "All", value = "0xffffffffffffffff" },
]
"#;
        let e: EnumDescriptor = toml::from_str(toml).unwrap();
        assert_eq!(e.underlying, Primitive::ULong);
        assert!(e.contains_value(u64::MAX as i128));
    }
}
