mod commands;

use cardplane_core::install_signal_handler;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_STORE_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cardplane",
    version,
    about = "Reconcile card resources against deterministic, named decks"
)]
struct Cli {
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
    /// Print the dealing order a seed produces.
    Shuffle {
        /// Deck seed.
        #[arg(allow_negative_numbers = true)]
        seed: i64,
        /// Only print the first N cards.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Validate a manifest without dealing anything.
    Check {
        /// Path to manifest TOML file.
        #[arg(default_value = "cardplane.toml")]
        manifest: PathBuf,
    },
    /// Run reconciliation passes over the cards in a manifest.
    Reconcile {
        /// Path to manifest TOML file.
        #[arg(default_value = "cardplane.toml")]
        manifest: PathBuf,
        /// Number of passes to run.
        #[arg(long, default_value_t = 2)]
        passes: u32,
        /// Drop every deck after the passes and reconcile once more.
        #[arg(long, default_value_t = false)]
        restart: bool,
        /// Request deletion of these cards, then reconcile once more.
        #[arg(long, value_delimiter = ',')]
        delete: Vec<String>,
    },
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
            || msg.contains("broken pipe")
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
            tracing_subscriber::EnvFilter::try_from_env("CARDPLANE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Shuffle { seed, top } => commands::shuffle::run(seed, top, json_output),
        Commands::Check { manifest } => commands::check::run(&manifest, json_output),
        Commands::Reconcile {
            manifest,
            passes,
            restart,
            delete,
        } => commands::reconcile::run(
            &manifest,
            &commands::reconcile::Plan {
                passes,
                restart,
                delete,
            },
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("managed resource is not a")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
