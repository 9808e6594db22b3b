//! msgbind CLI: generate and build Objective-C bindings.

mod commands;
mod compiler;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use msgbind_gen::{BindingError, GeneratorOptions};
use msgbind_model::ModelError;
use msgbind_targets::ApplePlatform;
use tracing_subscriber::EnvFilter;

use commands::{resolve, Project};
use manifest::{BindingManifest, MANIFEST_NAME};

#[derive(Parser)]
#[command(name = "msgbind", version, about = "Objective-C binding generator")]
struct Cli {
    /// Log generation progress (overridden by MSGBIND_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for values otherwise read from msgbind.toml.
#[derive(Args, Debug, Default)]
struct BindingArgs {
    /// API description (.toml or .json)
    #[arg(long)]
    api: Option<PathBuf>,
    /// Output directory for generated sources
    #[arg(long)]
    outdir: Option<PathBuf>,
    /// Target platform (ios, tvos, watchos, macos)
    #[arg(long)]
    platform: Option<ApplePlatform>,
    /// Namespace for the binding's Messaging class
    #[arg(long)]
    ns: Option<String>,
    /// Prefix applied to framework namespaces
    #[arg(long)]
    prefix: Option<String>,
    /// Bind a third-party library rather than a system framework
    #[arg(long)]
    third_party: bool,
    /// Look selectors up at every call site
    #[arg(long)]
    inline_selectors: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new binding project
    Init {
        /// Project name
        name: String,
    },
    /// Generate binding sources without compiling them
    Generate {
        #[command(flatten)]
        binding: BindingArgs,
        /// Report format (human, json, files)
        #[arg(long)]
        report: Option<String>,
        /// Write the sorted list of generated files here
        #[arg(long, value_name = "FILE")]
        sourceonly: Option<PathBuf>,
    },
    /// Check the API sources, generate, and compile the binding library
    Build {
        #[command(flatten)]
        binding: BindingArgs,
        /// Output library (default: {name}.dll)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Keep intermediate files in this directory
        #[arg(long)]
        tmpdir: Option<PathBuf>,
    },
    /// Validate the API description only
    Check {
        #[command(flatten)]
        binding: BindingArgs,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("MSGBIND_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        if let Some(b) = e.downcast_ref::<BindingError>() {
            eprintln!("error BI{}: {b}", b.code());
        } else if let Some(m) = e.downcast_ref::<ModelError>() {
            eprintln!("error BI{}: {e:#}", m.code());
        } else {
            eprintln!("error: {e:#}");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Generate {
            binding,
            report,
            sourceonly,
        } => {
            let project = load_project(&cwd, &binding)?;
            commands::generate::run(&project, report.as_deref(), sourceonly.as_deref())?;
            Ok(())
        }

        Commands::Build { binding, out, tmpdir } => {
            let project = load_project(&cwd, &binding)?;
            commands::build::run(&project, out.as_deref(), tmpdir.as_deref())?;
            Ok(())
        }

        Commands::Check { binding } => {
            let project = load_project(&cwd, &binding)?;
            commands::check::run(&project)?;
            Ok(())
        }
    }
}

/// Combine the nearest manifest (if any) with command-line overrides.
fn load_project(cwd: &Path, args: &BindingArgs) -> anyhow::Result<Project> {
    let (manifest, dir) = match BindingManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => (Some(manifest), dir),
        None => (None, cwd.to_path_buf()),
    };

    let (api, mut options) = match &manifest {
        Some(m) => (resolve(&dir, &m.binding.api), m.generator_options(&dir)),
        None => {
            let Some(api) = &args.api else {
                anyhow::bail!("no {MANIFEST_NAME} found; pass --api or run `msgbind init` first");
            };
            let options = GeneratorOptions {
                basedir: cwd.join("generated"),
                ..GeneratorOptions::default()
            };
            (resolve(cwd, api), options)
        }
    };
    let api = args.api.as_deref().map(|a| resolve(cwd, a)).unwrap_or(api);

    if let Some(outdir) = &args.outdir {
        options.basedir = resolve(cwd, outdir);
    }
    if let Some(platform) = args.platform {
        options.platform = platform;
    }
    if args.ns.is_some() {
        options.objc_runtime_namespace = args.ns.clone();
    }
    if args.prefix.is_some() {
        options.namespace_prefix = args.prefix.clone();
    }
    options.third_party |= args.third_party;
    options.inline_selectors |= args.inline_selectors;

    Ok(Project {
        dir,
        manifest,
        api,
        options,
    })
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Full workflow: init, check, generate.
    #[test]
    fn init_check_generate_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("widgets");
        commands::init::create_project(&project_path, "widgets").unwrap();

        let project = load_project(&project_path.join("src"), &BindingArgs::default()).unwrap();
        assert_eq!(project.dir, project_path);
        assert_eq!(project.api, project_path.join("api.toml"));
        assert!(project.options.third_party);

        assert_eq!(commands::check::run(&project).unwrap(), 0);
        let report = commands::generate::run(&project, Some("files"), None).unwrap();
        assert!(project_path.join("generated/Binding/Example.g.cs").is_file());
        assert!(report
            .files
            .iter()
            .any(|f| f.path.ends_with("ObjCRuntime/Messaging.g.cs")));
    }

    #[test]
    fn flags_override_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("flags");
        commands::init::create_project(&project_path, "flags").unwrap();

        let args = BindingArgs {
            outdir: Some(PathBuf::from("elsewhere")),
            platform: Some(ApplePlatform::MacOs),
            ns: Some("Flags.Runtime".to_string()),
            ..BindingArgs::default()
        };
        let project = load_project(&project_path, &args).unwrap();
        assert_eq!(project.options.basedir, project_path.join("elsewhere"));
        assert_eq!(project.options.platform, ApplePlatform::MacOs);
        assert_eq!(project.options.objc_runtime_namespace.as_deref(), Some("Flags.Runtime"));
    }

    #[test]
    fn without_a_manifest_the_api_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let err = match load_project(dir.path(), &BindingArgs::default()) {
            Ok(_) => return, // a msgbind.toml above the temp dir
            Err(e) => e,
        };
        assert!(err.to_string().contains("--api"));

        let args = BindingArgs {
            api: Some(PathBuf::from("defs.json")),
            ..BindingArgs::default()
        };
        let project = load_project(dir.path(), &args).unwrap();
        assert_eq!(project.api, dir.path().join("defs.json"));
        assert_eq!(project.name(), "defs");
    }
}
