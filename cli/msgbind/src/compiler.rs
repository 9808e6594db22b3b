//! Command lines for the two external compiler passes.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::manifest::{CompilerConfig, SourcesConfig};

fn path_arg(prefix: &str, path: &Path) -> String {
    format!("{prefix}{}", path.display())
}

fn common_args(compiler: &CompilerConfig, args: &mut Vec<String>) {
    args.extend(compiler.references.iter().map(|r| format!("-r:{r}")));
    if let Some(baselib) = &compiler.baselib {
        args.push(path_arg("-r:", baselib));
    }
    args.extend(compiler.defines.iter().map(|d| format!("-define:{d}")));
    args.extend(compiler.lib_dirs.iter().map(|d| path_arg("-lib:", d)));
    if compiler.nostdlib {
        args.push("-nostdlib".to_string());
    }
    if let Some(dir) = compiler
        .baselib
        .as_deref()
        .and_then(Path::parent)
        .filter(|d| !d.as_os_str().is_empty())
    {
        args.push(path_arg("-lib:", dir));
    }
}

/// Arguments of the first pass, which only checks that the API definition
/// sources compile.
pub fn api_pass_args(compiler: &CompilerConfig, sources: &SourcesConfig, out: &Path) -> Vec<String> {
    // -nowarn:436: definitions in the core sources may shadow the base library
    let mut args: Vec<String> = ["-debug", "-unsafe", "-target:library", "-nowarn:436"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(path_arg("-out:", out));
    common_args(compiler, &mut args);
    // sources go last, or the compiler emits a second assembly
    args.extend(sources.api.iter().map(|p| p.display().to_string()));
    args.extend(sources.core.iter().map(|p| p.display().to_string()));
    args
}

/// Arguments of the final pass over generated, core and extra sources.
pub fn library_pass_args(
    compiler: &CompilerConfig,
    sources: &SourcesConfig,
    generated: &[PathBuf],
    out: &Path,
) -> Vec<String> {
    let mut args = vec!["-unsafe".to_string(), "-target:library".to_string(), path_arg("-out:", out)];
    common_args(compiler, &mut args);
    args.extend(sources.resources.iter().cloned());
    args.extend(generated.iter().map(|p| p.display().to_string()));
    args.extend(sources.core.iter().map(|p| p.display().to_string()));
    args.extend(sources.extra.iter().map(|p| p.display().to_string()));
    args
}

/// Run the compiler in `dir` and wait for it. A non-zero exit status is an
/// error; there is no retry.
pub fn invoke(compiler: &CompilerConfig, dir: &Path, args: &[String]) -> Result<()> {
    tracing::debug!(compiler = %compiler.path.display(), args = %args.join(" "), "invoking compiler");
    let status = Command::new(&compiler.path)
        .args(args)
        .current_dir(dir)
        .env_remove("MONO_PATH")
        .status()
        .with_context(|| format!("failed to invoke compiler {}", compiler.path.display()))?;
    if !status.success() {
        bail!("API binding contains errors.");
    }
    Ok(())
}
