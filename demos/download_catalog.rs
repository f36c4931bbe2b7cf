//! Catalog download example
//!
//! Downloads the whole majdata catalog with a progress line per item:
//! - Loading configuration from an optional JSON file
//! - Subscribing to events
//! - Running the download with bounded concurrency
//!
//! ```bash
//! cargo run --example download_catalog -- [config.json] [output-dir]
//! RUST_LOG=majdata_dl=debug cargo run --example download_catalog
//! ```

use majdata_dl::{CatalogDownloader, Config, Event};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("majdata_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => Config::from_json_file(&path)?,
        None => Config::default(),
    };
    if let Some(output_dir) = args.next() {
        config.download.output_dir = output_dir.into();
    }

    let downloader = CatalogDownloader::new(config)?;

    let mut events = downloader.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Started { total } => println!("Found {} items", total),
                Event::ItemCompleted {
                    title,
                    completed,
                    total,
                    ..
                } => println!("[{}/{}] ✓ {}", completed, total, title),
                Event::ItemFailed {
                    title,
                    stage,
                    attempts,
                    completed,
                    total,
                    ..
                } => {
                    let stage = stage.map_or_else(|| "unknown".to_string(), |s| s.to_string());
                    println!(
                        "[{}/{}] ✗ {} (failed at {} after {} attempts)",
                        completed, total, title, stage, attempts
                    );
                }
                Event::CatalogUnavailable { error, .. } => {
                    eprintln!("Catalog unavailable: {}", error)
                }
                Event::Finished { succeeded, failed } => {
                    println!("Done: {} downloaded, {} failed", succeeded, failed)
                }
            }
        }
    });

    let summary = downloader.run_configured().await?;
    for outcome in &summary.failed {
        println!("Failed: #{} {}", outcome.item_id, outcome.title);
    }

    Ok(())
}
