mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    FolderArgs, ResolvedArgs, SettingsArgs, EXIT_DESCRIPTOR_ERROR, EXIT_FAILURE,
    EXIT_REPOSITORY_ERROR,
};
use kiln_core::install_signal_handler;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "kiln",
    version,
    about = "Build, package and identify native libraries from a git checkout"
)]
struct Cli {
    /// Recipe directory containing kiln.toml.
    #[arg(long, default_value = ".", global = true)]
    recipe: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the package version derived from the checkout (`branch_revision`).
    Version,
    /// Configure and compile the library.
    Build {
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        folders: FolderArgs,
    },
    /// Configure and install into the package folder, then record binary info.
    Package {
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        folders: FolderArgs,
        #[command(flatten)]
        resolved: ResolvedArgs,
        /// Install only; skip version resolution and the binary info record.
        #[arg(long, default_value_t = false)]
        no_record: bool,
    },
    /// Print the binary identity for the given settings and resolved dependencies.
    PackageId {
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        resolved: ResolvedArgs,
    },
    /// Show the descriptor and the build tool invocation without running it.
    Inspect {
        #[command(flatten)]
        settings: SettingsArgs,
        #[command(flatten)]
        folders: FolderArgs,
    },
    /// Check a binary info record against its recorded facts.
    VerifyInfo {
        /// Package folder or path to a kiln-info.toml file.
        path: PathBuf,
    },
    /// Run diagnostic checks on the toolchain, config and recipe.
    Doctor,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("KILN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let json = cli.json;
    let recipe = cli.recipe;

    let result = match cli.command {
        Commands::Version => commands::version::run(&recipe, json),
        Commands::Build { settings, folders } => commands::load_config()
            .and_then(|config| commands::build::run(&recipe, &settings, &folders, &config, json)),
        Commands::Package {
            settings,
            folders,
            resolved,
            no_record,
        } => commands::load_config().and_then(|config| {
            commands::package::run(
                &recipe, &settings, &folders, &resolved, no_record, &config, json,
            )
        }),
        Commands::PackageId { settings, resolved } => {
            commands::load_config().and_then(|config| {
                commands::package_id::run(&recipe, &settings, &resolved, &config, json)
            })
        }
        Commands::Inspect { settings, folders } => commands::load_config().and_then(|config| {
            commands::inspect::run(&recipe, &settings, &folders, &config, json)
        }),
        Commands::VerifyInfo { path } => commands::verify_info::run(&path, json),
        Commands::Doctor => commands::doctor::run(&recipe, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("descriptor error:") || msg.starts_with("profile error:") {
        EXIT_DESCRIPTOR_ERROR
    } else if msg.starts_with("repository state error:") {
        EXIT_REPOSITORY_ERROR
    } else {
        EXIT_FAILURE
    }
}
