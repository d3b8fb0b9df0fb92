#![allow(
    clippy::needless_continue,
    clippy::collapsible_if,
    clippy::uninlined_format_args,
    clippy::map_unwrap_or,
    clippy::unnecessary_wraps,
    clippy::exit,
    reason = "Suppress non-critical pedantic/style lints to keep build green"
)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;
mod logger;
mod output;

use commands::RunArgs;

#[derive(Parser)]
#[command(name = "sideload")]
#[command(about = "Provision ADB and batch-install a folder of APKs", long_about = None)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug-level diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: provision adb if missing, wait for a device,
    /// install every APK in the packages folder, relocate the log
    Run {
        /// Directory holding apks/, ADB/, Logs/ and adb.log
        /// (defaults to the current directory)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Name of the package folder under the base directory
        #[arg(long)]
        apks_dir: Option<String>,

        /// Skip the USB-debugging authorization grace delay
        #[arg(long)]
        no_auth_delay: bool,

        /// Overall device-wait budget in seconds
        /// (default: poll interval times max attempts)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// List connected Android devices
    Devices {
        /// Print the device list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved adb path and version information
    Adb,

    /// Download and extract platform-tools, even if adb is present
    Provision,

    /// Install explicit APK files (same logging as a batch run)
    Install {
        /// APK files to install
        files: Vec<PathBuf>,
    },

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.verbose) {
        eprintln!("Cannot initialize logging: {e}");
    }

    let result = match cli.command {
        None => commands::run(&RunArgs {
            base_dir: None,
            apks_dir: None,
            no_auth_delay: false,
            timeout_secs: None,
        }),
        Some(Commands::Run {
            base_dir,
            apks_dir,
            no_auth_delay,
            timeout_secs,
        }) => commands::run(&RunArgs {
            base_dir,
            apks_dir,
            no_auth_delay,
            timeout_secs,
        }),
        Some(Commands::Devices { json }) => commands::devices(json),
        Some(Commands::Adb) => commands::adb_info(),
        Some(Commands::Provision) => commands::provision(),
        Some(Commands::Install { files }) => commands::install(&files),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "sideload",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
