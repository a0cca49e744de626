//! chunkvault: chunked file storage
//!
//! Usage:
//!   chunkvault put  report.pdf --mime application/pdf   # chunk + store a file
//!   chunkvault get  report.pdf --output out.pdf          # verify + reassemble
//!   chunkvault list                                      # list stored files
//!   chunkvault status                                    # locations + catalog mode

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use chunkvault::catalog::CatalogMode;
use chunkvault::config::Config;
use chunkvault::manager::FileManager;

#[derive(Parser)]
#[command(name = "chunkvault", about = "Chunked file storage with verified reassembly", version)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply if it is missing.
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a file into chunks and store it.
    Put {
        /// File to upload.
        file: PathBuf,
        /// Catalog name; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        /// Content type recorded in the manifest.
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },
    /// Reassemble a stored file.
    Get {
        name: String,
        /// Where to write the reassembled bytes.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List stored files.
    List,
    /// Print configured locations and catalog mode.
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = ?e, "Command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.config)?;
    let manager = FileManager::from_config(&config)
        .await
        .context("Failed to open storage")?;

    match cli.command {
        Command::Put { file, name, mime } => run_put(&manager, &file, name, &mime).await,
        Command::Get { name, output } => run_get(&manager, &name, &output).await,
        Command::List => {
            run_list(&manager).await;
            Ok(())
        }
        Command::Status => {
            run_status(&manager).await;
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        warn!(path = ?path, "Config file not found, using defaults");
        return Ok(Config::default());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config {path:?}"))
}

async fn run_put(
    manager: &FileManager,
    file: &Path,
    name: Option<String>,
    mime: &str,
) -> anyhow::Result<()> {
    let name = match name {
        Some(n) => n,
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .with_context(|| format!("Cannot derive a name from {file:?}"))?,
    };

    let input = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("Cannot open {file:?}"))?;
    let size = input.metadata().await?.len();

    let manifest = manager.upload(&name, input, size, mime).await?;
    println!("Stored   : {}", manifest.name);
    println!("Size     : {} bytes", manifest.original_size);
    println!("Chunks   : {}", manifest.total_chunks);
    println!("Nodes    : {}", manifest.placement().join(", "));
    Ok(())
}

async fn run_get(manager: &FileManager, name: &str, output: &Path) -> anyhow::Result<()> {
    match manager.export(name, output).await? {
        Some(bytes) => {
            println!("Wrote {bytes} bytes to {}", output.display());
            Ok(())
        }
        None => bail!("File '{name}' not found"),
    }
}

async fn run_list(manager: &FileManager) {
    let files = manager.list().await;
    if files.is_empty() {
        println!("No files stored.");
        return;
    }
    println!("{:<32} {:>12} {:>7}  {:<25} MIME", "NAME", "BYTES", "CHUNKS", "UPLOADED");
    for f in files {
        println!(
            "{:<32} {:>12} {:>7}  {:<25} {}",
            f.name,
            f.size,
            f.total_chunks,
            f.upload_time.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            f.mime_type
        );
    }
}

async fn run_status(manager: &FileManager) {
    let status = manager.status().await;
    let mode = match status.catalog_mode {
        CatalogMode::Durable => "durable",
        CatalogMode::Degraded => "degraded (durable store unreachable, using memory)",
        CatalogMode::FallbackOnly => "memory only",
    };
    println!("=== chunkvault status ===");
    println!("Chunk size : {} bytes", status.chunk_size);
    println!("Locations  : {}", status.locations.join(", "));
    println!("Catalog    : {mode}");
    println!("Files      : {}", status.files);
}
