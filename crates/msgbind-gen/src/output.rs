//! Output naming and file writing.
//!
//! Every unit is named `{namespace}/{Name}.g.cs` relative to the output
//! base directory. Names are allocated in generation order; a name that
//! was already handed out gets an incrementing suffix (`Name2.g.cs`,
//! `Name3.g.cs`, ...), so two types that map to the same file never
//! overwrite each other.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use msgbind_model::TypeDescriptor;

use crate::error::{BindingError, Result};
use crate::namespace::NamespaceManager;
use crate::report::GeneratedFile;

/// One generated unit, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Path relative to the output base directory.
    pub path: PathBuf,
    pub contents: String,
}

/// Allocates collision-free unit paths.
#[derive(Debug, Default)]
pub struct OutputNames {
    taken: HashSet<PathBuf>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a path for unit `name` in `namespace` (`None` for the base
    /// directory itself).
    pub fn allocate(&mut self, ns: &NamespaceManager, namespace: Option<&str>, name: &str) -> PathBuf {
        let dir = match namespace.filter(|n| !n.is_empty()) {
            Some(n) => PathBuf::from(ns.strip_prefix(n)),
            None => PathBuf::new(),
        };
        let mut path = dir.join(format!("{name}.g.cs"));
        let mut counter = 2;
        while self.taken.contains(&path) {
            path = dir.join(format!("{name}{counter}.g.cs"));
            counter += 1;
        }
        self.taken.insert(path.clone());
        path
    }

    /// Reserve the path of the unit generated for `ty`.
    pub fn for_type(&mut self, ns: &NamespaceManager, ty: &TypeDescriptor) -> PathBuf {
        let name = if ty.generic_params.is_empty() {
            ty.name.clone()
        } else {
            format!("{}_{}", ty.name, ty.generic_params.len())
        };
        self.allocate(ns, ty.namespace.as_deref(), &name)
    }
}

/// Write `units` below `basedir`, creating directories as needed.
pub fn write_units(basedir: &Path, units: &[OutputUnit]) -> Result<Vec<GeneratedFile>> {
    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = basedir.join(&unit.path);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| BindingError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, &unit.contents).map_err(|source| BindingError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = unit.contents.len(), "wrote unit");
        written.push(GeneratedFile::new(path, unit.contents.as_bytes()));
    }
    Ok(written)
}
