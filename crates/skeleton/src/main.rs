mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use skeleton_core::kernel::constants::{APP_NAME, APP_VERSION};

/// Skeleton: an embeddable application kernel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    ping: bool,

    /// Configuration file (.json, .yaml/.yml or .toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the store databases
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Boot the kernel with the bundled plugins, start it and stop it again
    Run,
    /// Inspect and modify the multi-store
    Store {
        #[command(subcommand)]
        command: cli::StoreCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let configuration = match cli::load_configuration(args.config.as_deref()) {
        Ok(configuration) => configuration,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        None | Some(Commands::Run) => {
            println!("{} v{}", APP_NAME, APP_VERSION);
            cli::run(configuration, args.data_dir).await
        }
        Some(Commands::Store { command }) => cli::store(configuration, args.data_dir, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
