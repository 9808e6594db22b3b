//! `msgbind init`: binding project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{BindingManifest, MANIFEST_NAME};

const API_TEMPLATE: &str = r#"# API description: one [[types]] entry per bound Objective-C type.

[[types]]
name = "Example"
namespace = "Binding"
base = "NSObject"
members = [
    { kind = "method", name = "Reload", export = "reload" },
    { kind = "property", name = "Title", type = "string", export = "title", semantic = "copy" },
]
"#;

/// Create a new binding project in directory `name` below the current
/// directory.
pub fn run(name: &str) -> Result<()> {
    create_project(Path::new(name), name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }
    fs::create_dir_all(project_dir.join("src")).context("creating src/ directory")?;
    fs::write(project_dir.join(MANIFEST_NAME), BindingManifest::template(name))
        .with_context(|| format!("writing {MANIFEST_NAME}"))?;
    fs::write(project_dir.join("api.toml"), API_TEMPLATE).context("writing api.toml")?;
    fs::write(project_dir.join(".gitignore"), "generated/\n").context("writing .gitignore")?;

    println!("Created binding '{name}'");
    println!("  {name}/{MANIFEST_NAME}");
    println!("  {name}/api.toml");
    println!("  {name}/src/");
    println!("  {name}/.gitignore");
    Ok(())
}
