//! Per-run generator configuration.

use std::path::PathBuf;

use msgbind_targets::ApplePlatform;
use serde::{Deserialize, Serialize};

/// Options fixed for the whole run and passed by reference to every stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorOptions {
    pub platform: ApplePlatform,
    /// Prefix applied to framework namespaces (`Prefix.Foundation`).
    pub namespace_prefix: Option<String>,
    /// Namespace holding the binding's own `Messaging` class.
    pub objc_runtime_namespace: Option<String>,
    /// Binding a third-party library rather than the framework itself.
    pub third_party: bool,
    /// Only public API is visible; model members are not inlined.
    pub public_only: bool,
    /// Look selectors up at each call site instead of caching handles.
    pub inline_selectors: bool,
    /// Pass managed strings as stack-allocated native string headers.
    pub zero_copy_strings: bool,
    /// Types are bound outside the core assembly; no super-call paths.
    pub external: bool,
    /// Route every call through exception-marshaling entry points.
    pub marshal_native_exceptions: bool,
    /// Output directory for generated files.
    pub basedir: PathBuf,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            platform: ApplePlatform::default(),
            namespace_prefix: None,
            objc_runtime_namespace: None,
            third_party: false,
            public_only: false,
            inline_selectors: false,
            zero_copy_strings: false,
            external: false,
            marshal_native_exceptions: false,
            basedir: PathBuf::from("."),
        }
    }
}

impl GeneratorOptions {
    pub fn for_platform(platform: ApplePlatform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    /// Desktop runs only emit Intel call paths.
    pub fn only_desktop(&self) -> bool {
        self.platform.is_desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = GeneratorOptions::default();
        assert_eq!(o.platform, ApplePlatform::Ios);
        assert_eq!(o.basedir, PathBuf::from("."));
        assert!(!o.third_party);
        assert!(!o.only_desktop());
    }

    #[test]
    fn deserialize_partial() {
        let o: GeneratorOptions =
            toml::from_str("platform = \"macos\"\nthird-party = true\ninline-selectors = true").unwrap();
        assert!(o.only_desktop());
        assert!(o.third_party);
        assert!(o.inline_selectors);
        assert!(!o.zero_copy_strings);
    }
}
