use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use bip_falhas::config::Config;
use bip_falhas::observability::metrics;
use bip_falhas::pipeline::process_files;
use bip_falhas::{logging, server};

#[derive(Parser)]
#[command(name = "bip_falhas")]
#[command(about = "Test-station failure and output report normalizer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP backend used by the dashboard
    Serve {
        /// Interface to bind (overrides config and BIP_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Process a failures report and an output report from disk and print the JSON
    Process {
        /// Failures spreadsheet
        #[arg(long)]
        falhas: PathBuf,
        /// Output spreadsheet; its file name carries the report date
        #[arg(long)]
        output: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    let _guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            metrics::init()?;
            info!("Starting BIP-FALHAS backend");
            server::start_server(&config.server).await?;
        }
        Commands::Process {
            falhas,
            output,
            pretty,
        } => {
            let result = tokio::task::spawn_blocking(move || process_files(&falhas, &output))
                .await?;
            match result {
                Ok(result) => println!("{}", result.to_json(pretty)?),
                Err(e) => {
                    error!("Processing failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}
