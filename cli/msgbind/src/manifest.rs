//! `msgbind.toml` manifest parsing and binding configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use msgbind_gen::GeneratorOptions;
use msgbind_targets::ApplePlatform;
use serde::{Deserialize, Serialize};

pub const MANIFEST_NAME: &str = "msgbind.toml";

/// The top-level manifest of a binding project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingManifest {
    pub binding: BindingConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// What is being bound and how the glue is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingConfig {
    /// Name of the binding; the compiled library is `{name}.dll`.
    pub name: String,
    /// API description (`.toml` or `.json`).
    #[serde(default = "default_api")]
    pub api: PathBuf,
    /// Directory the generated units are written to.
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
    /// Namespace holding the binding's own `Messaging` class.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub platform: Option<ApplePlatform>,
    #[serde(default)]
    pub options: GeneratorOptions,
}

fn default_api() -> PathBuf {
    PathBuf::from("api.toml")
}

fn default_outdir() -> PathBuf {
    PathBuf::from("generated")
}

/// The external C# compiler used by `msgbind build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilerConfig {
    #[serde(default = "default_compiler")]
    pub path: PathBuf,
    /// Base interop library every pass references.
    #[serde(default)]
    pub baselib: Option<PathBuf>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub nostdlib: bool,
    #[serde(default)]
    pub lib_dirs: Vec<PathBuf>,
}

fn default_compiler() -> PathBuf {
    PathBuf::from("csc")
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            path: default_compiler(),
            baselib: None,
            references: Vec::new(),
            defines: Vec::new(),
            nostdlib: false,
            lib_dirs: Vec::new(),
        }
    }
}

/// Hand-written sources compiled alongside the generated units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourcesConfig {
    /// API definition sources checked by the first compiler pass.
    #[serde(default)]
    pub api: Vec<PathBuf>,
    /// Sources needed by both passes.
    #[serde(default)]
    pub core: Vec<PathBuf>,
    /// Sources only needed by the final library.
    #[serde(default)]
    pub extra: Vec<PathBuf>,
    /// Resource arguments passed through to the compiler.
    #[serde(default)]
    pub resources: Vec<String>,
}

impl BindingManifest {
    /// Search upward from `start_dir` for a `msgbind.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest = Self::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing msgbind.toml")
    }

    /// Generator options with the `[binding]` shorthands applied and the
    /// output directory resolved against `project_dir`.
    pub fn generator_options(&self, project_dir: &Path) -> GeneratorOptions {
        let mut options = self.binding.options.clone();
        if let Some(platform) = self.binding.platform {
            options.platform = platform;
        }
        if self.binding.namespace.is_some() {
            options.objc_runtime_namespace = self.binding.namespace.clone();
        }
        options.basedir = project_dir.join(&self.binding.outdir);
        options
    }

    /// Generate the default template for `msgbind init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[binding]
name = "{name}"
api = "api.toml"
outdir = "generated"
platform = "ios"

[binding.options]
third-party = true

[compiler]
path = "csc"
references = []
defines = []

[sources]
api = []
core = []
extra = []
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let manifest = BindingManifest::from_str(
            r#"
[binding]
name = "Widgets"
api = "defs/widgets.json"
outdir = "out"
namespace = "Widgets.Runtime"
platform = "macos"

[binding.options]
third-party = true
inline-selectors = true
namespace-prefix = "Xamarin"

[compiler]
path = "/usr/bin/mcs"
baselib = "lib/Xamarin.Mac.dll"
references = ["System.Drawing"]
defines = ["DEBUG", "MONOMAC"]
nostdlib = true
lib-dirs = ["lib"]

[sources]
api = ["api/Widgets.cs"]
core = ["src/Core.cs"]
extra = ["src/Extra.cs"]
resources = ["-resource:Widgets.a"]
"#,
        )
        .unwrap();
        assert_eq!(manifest.binding.name, "Widgets");
        assert_eq!(manifest.binding.api, PathBuf::from("defs/widgets.json"));
        assert_eq!(manifest.compiler.defines, ["DEBUG", "MONOMAC"]);
        assert!(manifest.compiler.nostdlib);
        assert_eq!(manifest.sources.core, [PathBuf::from("src/Core.cs")]);

        let options = manifest.generator_options(Path::new("/work"));
        assert_eq!(options.platform, ApplePlatform::MacOs);
        assert_eq!(options.objc_runtime_namespace.as_deref(), Some("Widgets.Runtime"));
        assert_eq!(options.namespace_prefix.as_deref(), Some("Xamarin"));
        assert!(options.third_party);
        assert!(options.inline_selectors);
        assert_eq!(options.basedir, PathBuf::from("/work/out"));
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = BindingManifest::from_str("[binding]\nname = \"minimal\"\n").unwrap();
        assert_eq!(manifest.binding.api, PathBuf::from("api.toml"));
        assert_eq!(manifest.binding.outdir, PathBuf::from("generated"));
        assert_eq!(manifest.compiler.path, PathBuf::from("csc"));
        assert!(manifest.sources.api.is_empty());
        let options = manifest.generator_options(Path::new("p"));
        assert_eq!(options.platform, ApplePlatform::Ios);
        assert!(!options.third_party);
    }

    #[test]
    fn reject_invalid_manifest() {
        assert!(BindingManifest::from_str("this is not valid toml [[[").is_err());
        assert!(BindingManifest::from_str("[compiler]\npath = \"csc\"\n").is_err());
        assert!(BindingManifest::from_str("[binding]\nname = \"x\"\nplatform = \"android\"\n").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let manifest = BindingManifest::from_str(&BindingManifest::template("Demo")).unwrap();
        assert_eq!(manifest.binding.name, "Demo");
        assert_eq!(manifest.binding.platform, Some(ApplePlatform::Ios));
        assert!(manifest.binding.options.third_party);
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), "[binding]\nname = \"parent\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found) = BindingManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.binding.name, "parent");
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), "[binding]\n").unwrap();
        let err = BindingManifest::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("msgbind.toml"));
    }
}
