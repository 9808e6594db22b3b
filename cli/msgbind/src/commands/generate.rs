//! `msgbind generate`: write the generated sources only.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use msgbind_gen::GenerationReport;

use super::Project;

/// Generate every unit below the configured output directory.
pub fn run(project: &Project, report: Option<&str>, sourceonly: Option<&Path>) -> Result<GenerationReport> {
    let universe = project.load_universe()?;
    let generated = msgbind_gen::generate_files(&universe, &project.options)?;
    for w in &generated.warnings {
        eprintln!("{w}");
    }

    if let Some(list) = sourceonly {
        let mut paths: Vec<String> = generated
            .files
            .iter()
            .map(|f| f.path.display().to_string())
            .collect();
        paths.sort();
        let mut content = paths.join("\n");
        content.push('\n');
        fs::write(list, content).with_context(|| format!("writing {}", list.display()))?;
    }

    match report {
        None | Some("human") => println!("Generated {generated}"),
        Some("json") => println!("{}", serde_json::to_string_pretty(&generated)?),
        Some("files") => print!("{}", generated.file_list()),
        Some(other) => bail!("unknown report format '{other}' (expected human, json or files)"),
    }
    Ok(generated)
}
