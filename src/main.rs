//! Main entry point for the rzip CLI application.
//!
//! This binary is thin glue around the archive-creation engine: it
//! resolves command-line arguments into input paths and an output
//! location, renders the progress fraction the engine reports, and maps
//! the outcome to an exit status.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use rzip::{Cli, DosDateTime, ZipArchiver};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut archiver = ZipArchiver::new()
        .with_level(cli.compression_level())
        .with_timestamp(DosDateTime::EPOCH);
    if cli.keep_partial {
        archiver = archiver.keep_partial_output();
    }

    let bar = if cli.is_quiet() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(1000);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {percent:>3}% {msg}")
                .expect("valid progress template"),
        );
        bar
    };

    let progress_bar = bar.clone();
    archiver
        .create(&cli.files, &cli.output, move |fraction| {
            progress_bar.set_position((fraction * 1000.0) as u64);
        })
        .await
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    bar.finish_and_clear();

    if !cli.is_very_quiet() {
        let size = std::fs::metadata(&cli.output).map(|m| m.len()).unwrap_or(0);
        println!(
            "{}: {} entries, {}",
            cli.output.display(),
            cli.files.len(),
            format_size(size)
        );
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
