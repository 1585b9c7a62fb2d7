mod commands;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::Outcome;

#[derive(Parser, Debug)]
#[command(name = "cosan", version, about = "Expand path templates and provision directories")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand ~, $NAME and ${NAME} against the environment
    Expand {
        template: OsString,
        /// Treat the input as a pre-template literal path
        #[arg(long)]
        legacy: bool,
    },
    /// Escape $ and ~ in a literal path
    Escape { path: OsString },
    /// Create every directory along a path
    Mkdir {
        path: PathBuf,
        #[arg(long, default_value = "777", value_parser = commands::parse_mode)]
        mode: u32,
    },
    /// Create (if needed) and verify an owner-only directory
    PrivateDir { dir: PathBuf },
    /// Create the directory containing a file path
    EnsureParent { path: PathBuf },
    /// Write a NUL-terminated record to stdout
    Encode {
        value: OsString,
        /// Encode as a display name rather than a path
        #[arg(long)]
        font: bool,
    },
    /// Decode NUL-terminated records from stdin
    Decode {
        /// Scan at most this many bytes per record
        #[arg(long)]
        bound: Option<usize>,
        #[arg(long)]
        font: bool,
    },
    /// Inspect the settings document
    Settings {
        /// Settings file (default: ~/.cosan/settings.json)
        #[arg(long)]
        file: Option<PathBuf>,
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum SettingsAction {
    /// Print the loaded (and upgraded) document
    Show,
    /// Resolve the log file path and create its directory
    LogFile,
    /// Resolve and verify the private directory
    PrivateDir,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(command = ?args.command, "Running command");

    let outcome = match args.command {
        Command::Expand { template, legacy } => commands::expand(&template, legacy),
        Command::Escape { path } => commands::escape(&path),
        Command::Mkdir { path, mode } => commands::mkdir(&path, mode)?,
        Command::PrivateDir { dir } => commands::private_dir(&dir)?,
        Command::EnsureParent { path } => commands::ensure_parent(&path)?,
        Command::Encode { value, font } => commands::encode(&value, font),
        Command::Decode { bound, font } => commands::decode(std::io::stdin().lock(), bound, font)?,
        Command::Settings { file, action } => match action {
            SettingsAction::Show => commands::settings_show(file)?,
            SettingsAction::LogFile => commands::settings_log_file(file)?,
            SettingsAction::PrivateDir => commands::settings_private_dir(file)?,
        },
    };

    let mut stdout = std::io::stdout().lock();
    match outcome {
        Outcome::Json(values) => {
            for value in values {
                stdout.write_all(serde_json::to_string(&value)?.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Outcome::Raw(bytes) => stdout.write_all(&bytes)?,
    }
    stdout.flush()?;

    Ok(())
}
