use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use crate::chart::QuickChartClient;
use crate::generate::generate;
use crate::load_config::load_config;
use crate::upload::DriveClient;

/// CLI for postings: generate and publish standardised position descriptions.
#[derive(Parser)]
#[clap(
    name = "postings",
    version,
    about = "Generate a standardised job-posting document with an embedded workplan radar chart and upload it to the division's Google Drive folder"
)]
pub struct Cli {
    /// Division or office whose Drive folder receives the generated document
    #[clap(long)]
    pub division: String,

    /// Path to the YAML file containing the position data
    #[clap(long = "yaml_file")]
    pub yaml_file: PathBuf,
}

/// Four pipeline stages: Load, Chart, Assemble, Upload.
fn stage_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(4);
    bar.set_style(
        ProgressStyle::with_template("{bar:24.green} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "postings starting");

    let config = load_config(&cli.division, &cli.yaml_file)?;
    let charts = QuickChartClient::new(config.chart_service_url.clone());
    let drive = DriveClient::new(config.drive_settings.clone());
    let progress = stage_progress_bar();

    println!("Generating posting for division `{}`...", cli.division);
    match generate(&config.generate, &charts, &drive, &progress).await {
        Ok(report) => {
            println!("Generation complete.\nReport:");
            println!("{report:#?}");
            Ok(())
        }
        Err(e) => {
            // Leave the bar at the failed stage rather than clearing it.
            progress.abandon();
            Err(e.into())
        }
    }
}
