use std::env;
use std::fs::write;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::NamedTempFile;

use postings::error::PipelineError;
use postings::load_config::load_config;

const SETTINGS_YAML: &str = "client_secrets_file: credentials/client_secrets.json\n\
credentials_file: credentials/stored_token.json\n\
oauth_scope: https://www.googleapis.com/auth/drive\n";

fn clear_env() {
    for var in [
        "CHART_SERVICE_URL",
        "CHARTS_DIR",
        "DOCUMENTS_DIR",
        "DRIVE_SETTINGS_FILE",
        "FOLDERS_FILE",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_when_env_is_unset() {
    clear_env();
    let settings = NamedTempFile::new().expect("temp file");
    write(settings.path(), SETTINGS_YAML).unwrap();
    env::set_var("DRIVE_SETTINGS_FILE", settings.path());

    let config = load_config("bpio", Path::new("data/position.yaml")).expect("config should load");

    assert_eq!(config.generate.division, "bpio");
    assert_eq!(config.generate.charts_dir, PathBuf::from("data/charts"));
    assert_eq!(config.generate.documents_dir, PathBuf::from("data/documents"));
    assert_eq!(
        config.generate.folders_file,
        PathBuf::from("data/google_folders.yaml")
    );
    assert_eq!(config.chart_service_url, "https://quickchart.io");
    assert_eq!(
        config.drive_settings.oauth_scope,
        "https://www.googleapis.com/auth/drive"
    );
}

#[test]
#[serial]
fn env_overrides_are_merged() {
    clear_env();
    let settings = NamedTempFile::new().expect("temp file");
    write(settings.path(), SETTINGS_YAML).unwrap();
    env::set_var("DRIVE_SETTINGS_FILE", settings.path());
    env::set_var("CHART_SERVICE_URL", "http://localhost:8123");
    env::set_var("CHARTS_DIR", "/tmp/charts");
    env::set_var("FOLDERS_FILE", "/etc/postings/folders.yaml");

    let config = load_config("fleet", Path::new("fleet.yaml")).expect("config should load");

    assert_eq!(config.chart_service_url, "http://localhost:8123");
    assert_eq!(config.generate.charts_dir, PathBuf::from("/tmp/charts"));
    assert_eq!(
        config.generate.folders_file,
        PathBuf::from("/etc/postings/folders.yaml")
    );

    clear_env();
}

#[test]
#[serial]
fn missing_drive_settings_file_is_a_config_error() {
    clear_env();
    env::set_var("DRIVE_SETTINGS_FILE", "does/not/exist.yaml");

    let err = load_config("bpio", Path::new("data/position.yaml")).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));

    clear_env();
}
