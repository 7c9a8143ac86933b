//! Merges CLI arguments, environment variables and credential files into the
//! runtime configuration. Secrets never live in the repository; the settings
//! and credential files are provisioned out-of-band.

use std::env;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::chart::DEFAULT_CHART_SERVICE_URL;
use crate::error::PipelineError;
use crate::generate::GenerateConfig;
use crate::upload::{self, DriveSettings};

const DEFAULT_CHARTS_DIR: &str = "data/charts";
const DEFAULT_DOCUMENTS_DIR: &str = "data/documents";
const DEFAULT_DRIVE_SETTINGS_FILE: &str = "credentials/settings.yaml";
const DEFAULT_FOLDERS_FILE: &str = "data/google_folders.yaml";

/// Fully merged configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub generate: GenerateConfig,
    pub chart_service_url: String,
    pub drive_settings: DriveSettings,
}

fn env_or(var: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(var).unwrap_or_else(|_| default.to_string()))
}

/// Builds the [`AppConfig`] for the given division and position file,
/// reading overrides from the environment and eagerly validating the drive
/// settings file.
pub fn load_config(division: &str, position_file: &Path) -> Result<AppConfig, PipelineError> {
    let chart_service_url =
        env::var("CHART_SERVICE_URL").unwrap_or_else(|_| DEFAULT_CHART_SERVICE_URL.to_string());
    let charts_dir = env_or("CHARTS_DIR", DEFAULT_CHARTS_DIR);
    let documents_dir = env_or("DOCUMENTS_DIR", DEFAULT_DOCUMENTS_DIR);
    let settings_file = env_or("DRIVE_SETTINGS_FILE", DEFAULT_DRIVE_SETTINGS_FILE);
    let folders_file = env_or("FOLDERS_FILE", DEFAULT_FOLDERS_FILE);

    let drive_settings = upload::load_settings(&settings_file)?;

    info!(
        division,
        position_file = %position_file.display(),
        chart_service_url = %chart_service_url,
        charts_dir = %charts_dir.display(),
        documents_dir = %documents_dir.display(),
        folders_file = %folders_file.display(),
        "Configuration loaded and merged"
    );

    Ok(AppConfig {
        generate: GenerateConfig {
            division: division.to_string(),
            position_file: position_file.to_path_buf(),
            charts_dir,
            documents_dir,
            folders_file,
        },
        chart_service_url,
        drive_settings,
    })
}
