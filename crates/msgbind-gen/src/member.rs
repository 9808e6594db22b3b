//! Visibility and modifiers of generated members.
//!
//! Every combination of member flags and emission site is resolved here, in
//! one table, instead of at each emitter.

use std::fmt;

use msgbind_model::{MethodDescriptor, PropertyDescriptor, TypeDescriptor};

use crate::gather::Origin;

/// Where a member is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// A class, including members inlined from models and protocols.
    Class,
    /// The static class holding a category's extension methods.
    Category,
    /// A protocol interface.
    Interface,
    /// The static class holding a protocol's optional members.
    Extension,
    /// The wrapper class implementing a protocol interface.
    Wrapper,
}

/// The flags of a member that affect its modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberFlags {
    pub is_static: bool,
    pub is_abstract: bool,
    pub sealed: bool,
    pub is_override: bool,
    pub is_new: bool,
    pub internal: bool,
    pub protected: bool,
    pub constructor: bool,
}

impl MemberFlags {
    pub fn method(m: &MethodDescriptor) -> Self {
        Self {
            is_static: m.is_static,
            is_abstract: m.is_abstract,
            sealed: m.sealed,
            is_override: m.is_override,
            is_new: m.is_new,
            internal: m.internal,
            protected: m.protected,
            constructor: m.constructor,
        }
    }

    pub fn property(p: &PropertyDescriptor) -> Self {
        Self {
            is_static: p.is_static,
            is_abstract: p.is_abstract,
            sealed: p.sealed,
            is_override: p.is_override,
            is_new: p.is_new,
            internal: p.internal,
            protected: p.protected,
            constructor: false,
        }
    }

    /// Members copied from another contract are never abstract where they
    /// land, and never override anything.
    pub fn inlined(mut self, origin: &Origin) -> Self {
        if origin.is_inlined() {
            self.is_abstract = false;
            self.is_override = false;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Non-virtual instance member or constructor.
    Plain,
    Static,
    Virtual,
    Abstract,
    Override,
}

/// Resolved modifiers, rendered as a declaration prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    /// `None` inside interfaces.
    pub visibility: Option<&'static str>,
    /// Delegates appear in the signature.
    pub is_unsafe: bool,
    pub is_new: bool,
    pub dispatch: Dispatch,
}

impl Modifiers {
    pub fn is_virtual(&self) -> bool {
        matches!(self.dispatch, Dispatch::Virtual | Dispatch::Override)
    }

    pub fn is_abstract(&self) -> bool {
        self.dispatch == Dispatch::Abstract
    }

    pub fn is_static(&self) -> bool {
        self.dispatch == Dispatch::Static
    }

    pub fn with_unsafe(mut self, is_unsafe: bool) -> Self {
        self.is_unsafe = is_unsafe;
        self
    }
}

impl fmt::Display for Modifiers {
    /// `public new virtual `, with a trailing space unless empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.visibility {
            write!(f, "{v} ")?;
        }
        if self.is_unsafe {
            f.write_str("unsafe ")?;
        }
        if self.is_new {
            f.write_str("new ")?;
        }
        match self.dispatch {
            Dispatch::Plain => Ok(()),
            Dispatch::Static => f.write_str("static "),
            Dispatch::Virtual => f.write_str("virtual "),
            Dispatch::Abstract => f.write_str("abstract "),
            Dispatch::Override => f.write_str("override "),
        }
    }
}

/// Resolve the modifiers of a member with `flags`, declared in `owner`, emitted at `host`.
pub fn modifiers(host: Host, owner: &TypeDescriptor, flags: MemberFlags) -> Modifiers {
    let visibility = if flags.internal {
        "internal"
    } else if flags.protected && host == Host::Class {
        "protected"
    } else {
        "public"
    };
    let (visibility, dispatch) = match host {
        Host::Interface => (None, Dispatch::Plain),
        Host::Category | Host::Extension => (Some(visibility), Dispatch::Static),
        Host::Wrapper => (Some("public"), Dispatch::Plain),
        Host::Class => {
            let dispatch = if flags.constructor {
                Dispatch::Plain
            } else if flags.is_static || owner.is_static {
                Dispatch::Static
            } else if flags.sealed {
                Dispatch::Plain
            } else if flags.is_abstract {
                Dispatch::Abstract
            } else if flags.is_override {
                Dispatch::Override
            } else {
                Dispatch::Virtual
            };
            (Some(visibility), dispatch)
        }
    };
    Modifiers {
        visibility,
        is_unsafe: false,
        is_new: flags.is_new && matches!(host, Host::Class),
        dispatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> TypeDescriptor {
        TypeDescriptor {
            name: "Widget".to_string(),
            namespace: Some("Demo".to_string()),
            ..TypeDescriptor::default()
        }
    }

    fn render(host: Host, flags: MemberFlags) -> String {
        modifiers(host, &owner(), flags).to_string()
    }

    #[test]
    fn class_members_default_to_virtual() {
        assert_eq!(render(Host::Class, MemberFlags::default()), "public virtual ");
        let ctor = MemberFlags {
            constructor: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Class, ctor), "public ");
    }

    #[test]
    fn static_category_and_extension_members_are_never_virtual() {
        let stat = MemberFlags {
            is_static: true,
            is_override: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Class, stat), "public static ");
        assert_eq!(render(Host::Category, MemberFlags::default()), "public static ");
        assert_eq!(render(Host::Extension, MemberFlags::default()), "public static ");

        let mut static_owner = owner();
        static_owner.is_static = true;
        assert!(modifiers(Host::Class, &static_owner, MemberFlags::default()).is_static());
    }

    #[test]
    fn flags_resolve_in_priority_order() {
        let sealed = MemberFlags {
            sealed: true,
            is_abstract: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Class, sealed), "public ");
        let abs = MemberFlags {
            is_abstract: true,
            is_override: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Class, abs), "public abstract ");
        let ovr = MemberFlags {
            is_override: true,
            internal: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Class, ovr), "internal override ");
        let new = MemberFlags {
            is_new: true,
            protected: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Class, new), "protected new virtual ");
        let mods = modifiers(Host::Class, &owner(), new).with_unsafe(true);
        assert_eq!(mods.to_string(), "protected unsafe new virtual ");
    }

    #[test]
    fn interfaces_and_wrappers() {
        let abs = MemberFlags {
            is_abstract: true,
            is_new: true,
            ..MemberFlags::default()
        };
        assert_eq!(render(Host::Interface, abs), "");
        assert_eq!(render(Host::Wrapper, abs), "public ");
    }

    #[test]
    fn inlined_members_drop_abstract() {
        let abs = MemberFlags {
            is_abstract: true,
            ..MemberFlags::default()
        };
        let origin = Origin::Protocol {
            name: "Demo.P".to_string(),
            required: true,
        };
        assert_eq!(render(Host::Class, abs.inlined(&origin)), "public virtual ");
        assert_eq!(render(Host::Class, abs.inlined(&Origin::Declared)), "public abstract ");
    }
}
