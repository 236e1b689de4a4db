use anyhow::{Context, Result};
use broadsheet_cli::{build_worker, format_status, init_tracing};
use broadsheet_core::Config;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "process-images")]
#[command(about = "Dither uploaded images into 1-bit PNGs and manage the processing queue")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show processing queue status
    Status {
        /// Output format: json or table (default: table)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Process a specific image by ID, or one batch of eligible images
    Process {
        /// Image ID; processed even if it already failed too often
        id: Option<i64>,
    },
    /// Reset all failed images to pending
    Reset,
    /// Run the background worker until Ctrl+C
    Worker,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let worker = build_worker(&config).await?;

    match cli.command {
        Commands::Status { format } => {
            let status = worker.status().await?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&status)?),
                _ => println!("{}", format_status(&status)),
            }
        }
        Commands::Process { id: Some(id) } => {
            println!("Processing image {}...", id);
            let processed = worker.process_by_id(id).await?;
            println!(
                "Image {} processed successfully ({}x{}, {})",
                id, processed.width, processed.height, processed.processed_path
            );
        }
        Commands::Process { id: None } => {
            println!("Processing all pending images...");
            let count = worker.process_batch().await?;
            println!("Processed {} images", count);
        }
        Commands::Reset => {
            println!("Resetting failed images to pending status...");
            let count = worker.reset_failed().await?;
            println!("Reset {} failed images", count);
        }
        Commands::Worker => {
            println!("Starting image processing worker...");
            println!("Press Ctrl+C to stop");

            let runner = worker.clone();
            let handle = tokio::spawn(async move { runner.run().await });

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            println!("\nShutting down worker...");
            worker.stop();

            handle.await.context("Worker task failed")?;
        }
    }

    Ok(())
}
