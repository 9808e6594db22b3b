//! `msgbind check`: validate the API description without generating.

use anyhow::Result;
use msgbind_gen::Diagnostics;

use super::Project;

/// Validate the description; returns the number of warnings.
pub fn run(project: &Project) -> Result<usize> {
    let universe = project.load_universe()?;
    let mut diagnostics = Diagnostics::new();
    msgbind_gen::validate(&universe, &mut diagnostics)?;
    for w in diagnostics.warnings() {
        eprintln!("{w}");
    }
    println!(
        "{}: {} types, {} warnings",
        project.api.display(),
        universe.types().len(),
        diagnostics.warnings().len()
    );
    Ok(diagnostics.warnings().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgbind_gen::GeneratorOptions;
    use std::path::Path;

    fn project(dir: &Path, api: &str) -> Project {
        let path = dir.join("api.toml");
        std::fs::write(&path, api).unwrap();
        Project {
            dir: dir.to_path_buf(),
            manifest: None,
            api: path,
            options: GeneratorOptions::default(),
        }
    }

    #[test]
    fn counts_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let p = project(dir.path(), "[[types]]\nname = \"Loose\"\nbase = \"NSObject\"\n");
        assert_eq!(run(&p).unwrap(), 1);
    }

    #[test]
    fn structural_errors_fail() {
        let dir = tempfile::tempdir().unwrap();
        let p = project(
            dir.path(),
            "[[types]]\nname = \"Loop\"\nnamespace = \"Demo\"\nbase = \"Loop\"\n",
        );
        assert!(run(&p).is_err());
    }

    #[test]
    fn missing_description() {
        let dir = tempfile::tempdir().unwrap();
        let p = Project {
            dir: dir.path().to_path_buf(),
            manifest: None,
            api: dir.path().join("missing.toml"),
            options: GeneratorOptions::default(),
        };
        let err = run(&p).unwrap_err();
        assert!(format!("{err:#}").contains("loading API description"));
    }
}
