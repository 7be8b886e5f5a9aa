//! Runcell CLI
//!
//! Command-line interface for running code in the sandbox and checking the
//! container runtime.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use runcell::config::load_config;
use runcell::sandbox::{create_executor, ExecutionOptions, ExecutionRequest, ExecutionStatus};
use runcell::{Result, VERSION};

#[derive(Parser)]
#[command(
    name = "runcell",
    author = "Runcell Contributors",
    version = VERSION,
    about = "Runcell - Sandboxed multi-language code execution",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute code in an ephemeral sandbox container
    Run {
        /// Programming language identifier
        language: String,
        /// Source file to run; reads stdin when omitted
        file: Option<PathBuf>,
        /// Wall-clock deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Memory ceiling (e.g. 256m, 1g)
        #[arg(long)]
        memory: Option<String>,
        /// Allow network access inside the sandbox
        #[arg(long)]
        allow_network: bool,
        /// Print the full result as JSON instead of raw streams
        #[arg(long)]
        json: bool,
    },

    /// Check whether the container runtime is reachable
    Status,

    /// List registered languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("runcell=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config()?;
    let executor = create_executor(&config)?;

    match cli.command {
        Commands::Run {
            language,
            file,
            timeout,
            memory,
            allow_network,
            json,
        } => {
            let code = match file {
                Some(path) => std::fs::read_to_string(&path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let mut options = ExecutionOptions::from_config(&config);
            if let Some(secs) = timeout {
                options.timeout = Duration::from_secs(secs);
            }
            if let Some(memory) = memory {
                options.memory_limit = memory;
            }
            if allow_network {
                options.network_disabled = false;
            }

            let request = ExecutionRequest {
                code,
                language,
                options,
            };

            let result = executor.execute(request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", result.stdout);
                eprint!("{}", result.stderr);
                eprintln!(
                    "--- {:?} in {}ms (exit code {})",
                    result.status,
                    result.execution_time.as_millis(),
                    result.exit_code
                );
            }

            if result.status != ExecutionStatus::Completed || result.exit_code != 0 {
                std::process::exit(result.exit_code.clamp(1, 255));
            }
        }

        Commands::Status => {
            if executor.is_available().await {
                println!("container runtime: available");
            } else {
                println!("container runtime: unavailable");
                std::process::exit(1);
            }
        }

        Commands::Languages => {
            for name in executor.supported_languages() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
