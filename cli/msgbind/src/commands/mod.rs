//! CLI command implementations.

pub mod build;
pub mod check;
pub mod generate;
pub mod init;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use msgbind_gen::GeneratorOptions;
use msgbind_model::{ApiDescription, TypeUniverse};

use crate::manifest::BindingManifest;

/// Everything a command needs to know about the binding being processed,
/// from the manifest with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub manifest: Option<BindingManifest>,
    pub api: PathBuf,
    pub options: GeneratorOptions,
}

impl Project {
    /// Name of the binding, falling back to the description's file stem.
    pub fn name(&self) -> String {
        match &self.manifest {
            Some(m) => m.binding.name.clone(),
            None => self
                .api
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "binding".to_string()),
        }
    }

    /// Load and index the API description.
    pub fn load_universe(&self) -> Result<TypeUniverse> {
        let description = ApiDescription::load(&self.api)
            .with_context(|| format!("loading API description {}", self.api.display()))?;
        Ok(TypeUniverse::new(description, self.options.platform)?)
    }
}

/// Resolve `path` against `dir` unless it is already absolute.
pub fn resolve(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}
