mod cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use memfs_core::config::{MemFsConfig, SnapshotFormat, DEFAULT_SNAPSHOT};

#[derive(Parser)]
#[command(name = "memfs", version, about = "In-memory filesystem shell with snapshot persistence")]
struct Cli {
    /// Snapshot file loaded on start and saved on exit
    #[arg(long, global = true, default_value = DEFAULT_SNAPSHOT)]
    snapshot: PathBuf,

    /// Snapshot layout: compact or pretty
    #[arg(long, global = true, default_value = "compact")]
    format: SnapshotFormat,

    /// Never write the snapshot back
    #[arg(long, global = true)]
    no_save: bool,

    /// Output as JSON instead of human-readable tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (default)
    Shell,
    /// Run command files concurrently, one worker per file
    Batch(cmd::batch::BatchArgs),
    /// Run a single command against the snapshot
    Run(cmd::run::RunArgs),
    /// Show the whole tree with sizes
    Tree,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let config = MemFsConfig::builder(&cli.snapshot)
        .format(cli.format)
        .autosave(!cli.no_save);

    match cli.command {
        None | Some(Commands::Shell) => cmd::shell::run(&config.build()),
        Some(Commands::Batch(args)) => {
            let config = config.log_dir(args.log_dir.clone()).build();
            cmd::batch::run(args, &config, json).await
        }
        Some(Commands::Run(args)) => cmd::run::run(args, &config.build()),
        Some(Commands::Tree) => cmd::tree::run(&config.build(), json),
    }
}
