mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use core_runtime::config::{CoreConfig, DEFAULT_ZONE};
use core_runtime::logging::{init_logging, level_from_verbosity, LogFormat, LoggingConfig};
use provider_icloud_drive::DriveService;

use crate::commands::{cat, get, ls, mkdir, mv, rm, trash};

/// Command-line access to iCloud Drive
#[derive(Parser)]
#[command(name = "icloud")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # List the drive root with details
    icloud --session ~/.config/icloud/session.json ls -l

    # Print a document
    ICLOUD_SESSION=session.json icloud cat pyiCloud/Test/notes.txt

    # Put a trashed item back
    icloud trash recover test_files_1
")]
struct Cli {
    /// Serialized authenticated session
    #[arg(long, value_name = "PATH", env = "ICLOUD_SESSION")]
    session: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormatArg::Compact)]
    log_format: LogFormatArg,

    /// Drive zone
    #[arg(long, default_value = DEFAULT_ZONE)]
    zone: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List folder contents
    Ls(ls::Args),

    /// Write a file's content to stdout
    Cat(cat::Args),

    /// Download a file
    Get(get::Args),

    /// Create a folder
    Mkdir(mkdir::Args),

    /// Rename a file or folder
    Mv(mv::Args),

    /// Move a file or folder to the trash
    Rm(rm::Args),

    /// Inspect and manage the trash
    Trash(trash::Args),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format.into())
            .with_level(level_from_verbosity(cli.verbose)),
    )
    .context("Failed to initialize logging")?;

    let config = CoreConfig::builder()
        .session_path(cli.session.clone())
        .zone(cli.zone.clone())
        .build()
        .context("Invalid configuration")?;

    let drive = DriveService::connect(&config)
        .await
        .with_context(|| format!("Failed to open session {}", cli.session.display()))?;

    match &cli.command {
        Commands::Ls(args) => ls::execute(&drive, args).await,
        Commands::Cat(args) => cat::execute(&drive, args).await,
        Commands::Get(args) => get::execute(&drive, args).await,
        Commands::Mkdir(args) => mkdir::execute(&drive, args).await,
        Commands::Mv(args) => mv::execute(&drive, args).await,
        Commands::Rm(args) => rm::execute(&drive, args).await,
        Commands::Trash(args) => trash::execute(&drive, args).await,
    }
}
