//! Coordinating module for the load-chart-assemble-upload pipeline.
//!
//! Stages run strictly in order; the first failure aborts the run. The
//! progress bar advances one tick per completed stage and is left at the
//! failed stage on error.

use std::path::PathBuf;

use indicatif::ProgressBar;
use tracing::{error, info};

use crate::chart::{self, ChartService};
use crate::document;
use crate::error::PipelineError;
use crate::position;
use crate::upload::{self, DriveUploader};

/// Everything one run needs besides the external service clients.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub division: String,
    pub position_file: PathBuf,
    pub charts_dir: PathBuf,
    pub documents_dir: PathBuf,
    pub folders_file: PathBuf,
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct GenerateReport {
    pub title: String,
    pub chart_url: String,
    pub image_path: PathBuf,
    pub document_path: PathBuf,
    pub folder_id: String,
    pub folder_name: String,
    pub uploaded_file_id: String,
}

/// Runs the full pipeline: Load -> Chart -> Assemble -> Upload -> Done.
pub async fn generate<C, U>(
    config: &GenerateConfig,
    charts: &C,
    drive: &U,
    progress: &ProgressBar,
) -> Result<GenerateReport, PipelineError>
where
    C: ChartService + ?Sized,
    U: DriveUploader + ?Sized,
{
    info!(
        division = %config.division,
        position_file = %config.position_file.display(),
        "Starting posting generation pipeline"
    );

    // Stage 1: Load. Required sections are validated here, before any
    // network call is made.
    progress.set_message("loading position data");
    let position = position::load_position(&config.position_file, &config.division)?;
    progress.inc(1);

    // Stage 2: Chart.
    progress.set_message("publishing radar chart");
    let chart = chart::render_chart(charts, &position, &config.charts_dir).await?;
    progress.inc(1);

    // Stage 3: Assemble.
    progress.set_message("assembling document");
    let document_path = document::assemble(&position, &chart, &config.documents_dir)?;
    progress.inc(1);

    // Stage 4: Upload. A failure here leaves the local document untouched.
    progress.set_message("uploading to drive");
    let folder_id = upload::lookup_folder_id(&config.folders_file, &config.division)?;
    let folder = drive.find_folder(&folder_id).await.map_err(|e| {
        error!(error = %e, folder_id = %folder_id, "Drive folder lookup failed");
        e
    })?;
    let uploaded = drive.upload_document(&document_path, &folder).await?;
    progress.inc(1);

    progress.finish_with_message("done");
    info!(
        title = %position.title,
        uploaded_file_id = %uploaded.file_id,
        "Pipeline complete"
    );

    Ok(GenerateReport {
        title: position.title,
        chart_url: chart.url,
        image_path: chart.image_path,
        document_path,
        folder_id: folder.id,
        folder_name: folder.name,
        uploaded_file_id: uploaded.file_id,
    })
}
