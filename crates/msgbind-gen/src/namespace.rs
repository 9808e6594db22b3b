//! Namespace configuration and type-name formatting.

use std::collections::BTreeSet;

use msgbind_model::{QualName, Ty};
use msgbind_targets::ApplePlatform;

/// C# keywords that cannot be used as parameter names unescaped.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// A parameter name usable in generated source (`@params` for `params`).
pub fn safe_param_name(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("@{name}")
    } else {
        name.to_string()
    }
}

/// Drop a generic arity suffix (`Action`1` becomes `Action`).
pub fn remove_arity(name: &str) -> &str {
    match name.find('`') {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Namespaces known to the generator for one run.
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    prefix: Option<String>,
    /// Where the core messaging lives.
    pub core_objc_runtime: String,
    /// Where this binding's `Messaging` class lives.
    pub objc_runtime: String,
    /// `{objc_runtime}.Messaging`.
    pub messaging: String,
    pub standard: BTreeSet<String>,
    pub ui: BTreeSet<String>,
    pub implicit: BTreeSet<String>,
    /// Namespaces that are also type names and must be written fully qualified.
    pub conflicting_with_types: BTreeSet<String>,
}

impl NamespaceManager {
    pub fn new(prefix: Option<&str>, custom_objc_runtime: Option<&str>, platform: ApplePlatform) -> Self {
        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        let get = |ns: &str| match &prefix {
            Some(p) => format!("{p}.{ns}"),
            None => ns.to_string(),
        };

        let core_objc_runtime = get("ObjCRuntime");
        let objc_runtime = custom_objc_runtime
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| core_objc_runtime.clone());
        let messaging = format!("{objc_runtime}.Messaging");

        let standard = ["Foundation", "ObjCRuntime", "CoreGraphics"]
            .iter()
            .map(|ns| get(ns))
            .collect();

        let ui: Vec<&str> = match platform {
            ApplePlatform::MacOs => vec!["AppKit"],
            ApplePlatform::WatchOs => vec!["UIKit"],
            ApplePlatform::TvOs => vec![
                "UIKit", "Twitter", "GameKit", "NewsstandKit", "iAd", "QuickLook", "EventKitUI",
                "AddressBookUI", "MessageUI", "PhotosUI", "HealthKitUI",
            ],
            ApplePlatform::Ios => vec![
                "UIKit", "Twitter", "GameKit", "NewsstandKit", "iAd", "QuickLook", "EventKitUI",
                "AddressBookUI", "MapKit", "MessageUI", "PhotosUI", "HealthKitUI",
            ],
        };
        let ui = ui.into_iter().map(get).collect();

        let mut implicit: BTreeSet<String> = [
            "System",
            "System.Runtime.CompilerServices",
            "System.Runtime.InteropServices",
            "System.Diagnostics",
            "System.ComponentModel",
            "System.Threading.Tasks",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mut framework = vec!["CoreFoundation", "Foundation", "ObjCRuntime", "CoreGraphics", "SceneKit", "CoreLocation"];
        let watch = platform == ApplePlatform::WatchOs;
        if !watch {
            framework.extend(["AudioUnit", "CoreAnimation", "CoreVideo", "CoreMedia", "Security", "AVFoundation", "ModelIO", "Metal"]);
        }
        match platform {
            ApplePlatform::MacOs => framework.extend(["OpenGL", "QTKit", "AppKit"]),
            ApplePlatform::Ios => framework.extend([
                "CoreMotion", "MapKit", "UIKit", "NewsstandKit", "GLKit", "QuickLook", "AddressBook",
            ]),
            ApplePlatform::TvOs => framework.extend(["UIKit", "GLKit"]),
            ApplePlatform::WatchOs => framework.push("UIKit"),
        }
        implicit.extend(framework.into_iter().map(get));

        let conflicting_with_types = [get("AudioUnit")].into_iter().collect();

        Self {
            prefix,
            core_objc_runtime,
            objc_runtime,
            messaging,
            standard,
            ui,
            implicit,
            conflicting_with_types,
        }
    }

    /// Apply the namespace prefix.
    pub fn get(&self, ns: &str) -> String {
        match &self.prefix {
            Some(p) if !ns.starts_with("System") => format!("{p}.{ns}"),
            _ => ns.to_string(),
        }
    }

    /// Strip the prefix again, for output paths.
    pub fn strip_prefix<'a>(&self, ns: &'a str) -> &'a str {
        match &self.prefix {
            Some(p) => ns
                .strip_prefix(p.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(ns),
            None => ns,
        }
    }

    pub fn is_ui_namespace(&self, ns: Option<&str>) -> bool {
        ns.is_some_and(|ns| self.ui.contains(&self.get(ns)))
    }

    /// `using` lines in emission order: `System*` first, then by length.
    pub fn usings(&self) -> Vec<&str> {
        let mut list: Vec<&str> = self.implicit.iter().map(String::as_str).collect();
        list.sort_by(|a, b| {
            let sa = a.starts_with("System");
            let sb = b.starts_with("System");
            sb.cmp(&sa).then(a.len().cmp(&b.len())).then(a.cmp(b))
        });
        list
    }

    /// Format a named type as seen from code in namespace `used_in`.
    pub fn format_name(&self, used_in: Option<&str>, name: &QualName) -> String {
        let bare = remove_arity(&name.name);
        match &name.namespace {
            None => bare.to_string(),
            Some(ns) => {
                let full_ns = self.get(ns);
                if used_in == Some(ns.as_str()) || self.standard.contains(&full_ns) {
                    bare.to_string()
                } else {
                    format!("global::{full_ns}.{bare}")
                }
            }
        }
    }

    /// Format a type as seen from code in namespace `used_in`.
    pub fn format_type(&self, used_in: Option<&str>, ty: &Ty) -> String {
        match ty {
            Ty::Void => "void".to_string(),
            Ty::Primitive(p) => p.keyword().to_string(),
            Ty::String => "string".to_string(),
            Ty::GenericParam(n) => n.clone(),
            Ty::Array(e) => format!("{}[]", self.format_type(used_in, e)),
            Ty::ByRef { kind, elem } => format!("{} {}", kind.keyword(), self.format_type(used_in, elem)),
            Ty::Opaque(q) if q.namespace.as_deref() == Some("System") && q.name == "Object" => {
                "object".to_string()
            }
            Ty::Delegate { name, args } => {
                let base = self.format_name(used_in, name);
                if args.is_empty() {
                    base
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.format_type(used_in, a)).collect();
                    format!("{base}<{}>", args.join(", "))
                }
            }
            Ty::Class(q)
            | Ty::Protocol(q)
            | Ty::NativeObject(q)
            | Ty::DictionaryContainer(q)
            | Ty::Struct(q)
            | Ty::Enum(q)
            | Ty::Opaque(q) => self.format_name(used_in, q),
        }
    }

    /// Fully qualified form (`global::Ns.Name`), used where the short name may
    /// collide with a namespace.
    pub fn global_name(&self, name: &QualName) -> String {
        match &name.namespace {
            Some(ns) => format!("global::{}.{}", self.get(ns), remove_arity(&name.name)),
            None => format!("global::{}", remove_arity(&name.name)),
        }
    }
}
