//! `msgbind build`: check the API sources, generate, compile the library.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{resolve, Project};
use crate::compiler;
use crate::manifest::{CompilerConfig, SourcesConfig};

/// Where the temporary API library is compiled.
enum WorkDir {
    Kept(PathBuf),
    Temporary(tempfile::TempDir),
}

impl WorkDir {
    fn path(&self) -> &Path {
        match self {
            WorkDir::Kept(p) => p,
            WorkDir::Temporary(t) => t.path(),
        }
    }
}

fn resolve_sources(dir: &Path, sources: &SourcesConfig) -> SourcesConfig {
    let all = |paths: &[PathBuf]| -> Vec<PathBuf> { paths.iter().map(|p| resolve(dir, p)).collect() };
    SourcesConfig {
        api: all(&sources.api),
        core: all(&sources.core),
        extra: all(&sources.extra),
        resources: sources.resources.clone(),
    }
}

/// Run both compiler passes around generation. `out` defaults to
/// `{name}.dll` in the project directory.
pub fn run(project: &Project, out: Option<&Path>, tmpdir: Option<&Path>) -> Result<PathBuf> {
    let (compiler_config, sources) = match &project.manifest {
        Some(m) => (m.compiler.clone(), resolve_sources(&project.dir, &m.sources)),
        None => (CompilerConfig::default(), SourcesConfig::default()),
    };

    let work = match tmpdir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            WorkDir::Kept(dir.to_path_buf())
        }
        None => WorkDir::Temporary(tempfile::tempdir().context("creating temporary directory")?),
    };

    if !sources.api.is_empty() {
        let temp = work.path().join("temp.dll");
        let args = compiler::api_pass_args(&compiler_config, &sources, &temp);
        compiler::invoke(&compiler_config, &project.dir, &args)?;
    }

    let universe = project.load_universe()?;
    let report = msgbind_gen::generate_files(&universe, &project.options)?;
    for w in &report.warnings {
        eprintln!("{w}");
    }
    tracing::info!("{report}");

    let output = match out {
        Some(p) => resolve(&project.dir, p),
        None => project.dir.join(format!("{}.dll", project.name())),
    };
    let generated: Vec<PathBuf> = report.files.iter().map(|f| f.path.clone()).collect();
    let args = compiler::library_pass_args(&compiler_config, &sources, &generated, &output);
    compiler::invoke(&compiler_config, &project.dir, &args)?;

    println!("Built {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::BindingManifest;

    const API: &str = r#"
[[types]]
name = "Widget"
namespace = "Demo"
base = "NSObject"
members = [{ kind = "method", name = "Refresh", export = "refresh" }]
"#;

    fn project(dir: &Path, compiler: &str, api_sources: &str) -> Project {
        std::fs::write(dir.join("api.toml"), API).unwrap();
        let manifest = BindingManifest::from_str(&format!(
            "[binding]\nname = \"Widgets\"\n\n[compiler]\npath = \"{compiler}\"\n\n[sources]\napi = [{api_sources}]\n"
        ))
        .unwrap();
        let options = manifest.generator_options(dir);
        Project {
            dir: dir.to_path_buf(),
            manifest: Some(manifest),
            api: dir.join("api.toml"),
            options,
        }
    }

    #[test]
    fn successful_passes_produce_the_library_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = project(dir.path(), "true", "\"Widgets.cs\"");
        let output = run(&p, None, Some(&dir.path().join("tmp"))).unwrap();
        assert_eq!(output, dir.path().join("Widgets.dll"));
        assert!(dir.path().join("generated/Demo/Widget.g.cs").is_file());
        assert!(dir.path().join("tmp").is_dir());
    }

    #[test]
    fn failing_api_pass_stops_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let p = project(dir.path(), "false", "\"Widgets.cs\"");
        let err = run(&p, None, None).unwrap_err();
        assert_eq!(err.to_string(), "API binding contains errors.");
        assert!(!dir.path().join("generated").exists());
    }

    #[test]
    fn failing_library_pass_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // no API sources, so only the final pass runs
        let p = project(dir.path(), "false", "");
        let err = run(&p, Some(Path::new("out/W.dll")), None).unwrap_err();
        assert_eq!(err.to_string(), "API binding contains errors.");
        assert!(dir.path().join("generated/Demo/Widget.g.cs").is_file());
    }

    #[test]
    fn sources_resolve_against_the_project() {
        let sources = SourcesConfig {
            api: vec![PathBuf::from("api/A.cs")],
            core: vec![PathBuf::from("/abs/Core.cs")],
            extra: Vec::new(),
            resources: vec!["-resource:x".to_string()],
        };
        let resolved = resolve_sources(Path::new("/proj"), &sources);
        assert_eq!(resolved.api, [PathBuf::from("/proj/api/A.cs")]);
        assert_eq!(resolved.core, [PathBuf::from("/abs/Core.cs")]);
    }
}
