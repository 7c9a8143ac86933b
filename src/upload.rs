//! Uploads the generated document into a Google Drive folder.
//!
//! Authentication is non-interactive: a settings file names the OAuth
//! client-secrets file, the stored-token file and the access scope, all
//! provisioned out-of-band. The stored refresh token is exchanged for an
//! access token once per run. Folder routing is a flat division → folder-id
//! mapping file; the folder is verified against the API before upload.
//!
//! The [`DriveUploader`] trait abstracts the remote side so the pipeline can
//! be exercised against mocks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{error, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::PipelineError;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Settings file contents: names the credential files and the OAuth scope.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveSettings {
    pub client_secrets_file: PathBuf,
    pub credentials_file: PathBuf,
    pub oauth_scope: String,
}

/// Loads the drive settings YAML from disk.
pub fn load_settings(path: &Path) -> Result<DriveSettings, PipelineError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        PipelineError::Config(format!(
            "failed to read drive settings file {}: {e}",
            path.display()
        ))
    })?;
    let settings: DriveSettings = serde_yaml::from_str(&raw)
        .map_err(|e| PipelineError::Config(format!("invalid drive settings file: {e}")))?;
    info!(
        client_secrets_file = %settings.client_secrets_file.display(),
        oauth_scope = %settings.oauth_scope,
        "Loaded drive settings"
    );
    Ok(settings)
}

/// One entry in the folder-mapping file.
#[derive(Debug, Deserialize)]
struct FolderEntry {
    folder_id: String,
}

/// Resolves a division name to its Drive folder id from the mapping file.
pub fn lookup_folder_id(folders_file: &Path, division: &str) -> Result<String, PipelineError> {
    let raw = fs::read_to_string(folders_file).map_err(|e| {
        PipelineError::Config(format!(
            "failed to read folder mapping file {}: {e}",
            folders_file.display()
        ))
    })?;
    let mapping: BTreeMap<String, FolderEntry> = serde_yaml::from_str(&raw)
        .map_err(|e| PipelineError::Config(format!("invalid folder mapping file: {e}")))?;

    match mapping.get(division) {
        Some(entry) => {
            info!(division, folder_id = %entry.folder_id, "Resolved drive folder for division");
            Ok(entry.folder_id.clone())
        }
        None => {
            let known: Vec<&str> = mapping.keys().map(String::as_str).collect();
            Err(PipelineError::Config(format!(
                "no folder configured for division `{division}`; known divisions: {}",
                known.join(", ")
            )))
        }
    }
}

/// A verified Drive folder.
#[derive(Debug, Clone)]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
}

/// The remote file created by a successful upload.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_id: String,
    pub name: String,
}

/// Trait for locating the target folder and uploading the document.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DriveUploader: Send + Sync {
    /// Verify the folder exists and return its metadata.
    async fn find_folder(&self, folder_id: &str) -> Result<DriveFolder, PipelineError>;

    /// Upload the document file into the folder, returning the created file.
    async fn upload_document(
        &self,
        document: &Path,
        folder: &DriveFolder,
    ) -> Result<UploadedDocument, PipelineError>;
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: InstalledApp,
}

#[derive(Debug, Deserialize)]
struct InstalledApp {
    client_id: String,
    client_secret: String,
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct StoredToken {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileResponse {
    id: String,
    name: String,
}

/// Google Drive v3 REST implementation of [`DriveUploader`].
pub struct DriveClient {
    http: reqwest::Client,
    settings: DriveSettings,
    api_base: String,
    token: OnceCell<String>,
}

impl DriveClient {
    pub fn new(settings: DriveSettings) -> Self {
        Self::with_api_base(settings, DEFAULT_API_BASE)
    }

    /// Point the client at a different API base. Used by tests.
    pub fn with_api_base(settings: DriveSettings, api_base: impl Into<String>) -> Self {
        DriveClient {
            http: reqwest::Client::new(),
            settings,
            api_base: api_base.into(),
            token: OnceCell::new(),
        }
    }

    /// Exchanges the stored refresh token for an access token, once per run.
    async fn access_token(&self) -> Result<&str, PipelineError> {
        self.token
            .get_or_try_init(|| refresh_access_token(&self.http, &self.settings))
            .await
            .map(String::as_str)
    }
}

async fn refresh_access_token(
    http: &reqwest::Client,
    settings: &DriveSettings,
) -> Result<String, PipelineError> {
    let secrets_raw = fs::read_to_string(&settings.client_secrets_file).map_err(|e| {
        PipelineError::Auth(format!(
            "failed to read client secrets file {}: {e}",
            settings.client_secrets_file.display()
        ))
    })?;
    let secrets: ClientSecrets = serde_json::from_str(&secrets_raw)
        .map_err(|e| PipelineError::Auth(format!("invalid client secrets file: {e}")))?;

    let token_raw = fs::read_to_string(&settings.credentials_file).map_err(|e| {
        PipelineError::Auth(format!(
            "failed to read stored token file {}: {e}",
            settings.credentials_file.display()
        ))
    })?;
    let stored: StoredToken = serde_json::from_str(&token_raw)
        .map_err(|e| PipelineError::Auth(format!("invalid stored token file: {e}")))?;

    info!(token_uri = %secrets.installed.token_uri, "Refreshing drive access token");

    let response = http
        .post(&secrets.installed.token_uri)
        .form(&[
            ("client_id", secrets.installed.client_id.as_str()),
            ("client_secret", secrets.installed.client_secret.as_str()),
            ("refresh_token", stored.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
            ("scope", settings.oauth_scope.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        error!(%status, "Token refresh rejected");
        return Err(PipelineError::Auth(format!(
            "token endpoint rejected refresh with status {status}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| PipelineError::Auth(format!("malformed token response: {e}")))?;

    info!("Drive access token refreshed");
    Ok(token.access_token)
}

#[async_trait]
impl DriveUploader for DriveClient {
    async fn find_folder(&self, folder_id: &str) -> Result<DriveFolder, PipelineError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!(
                "{}/drive/v3/files/{folder_id}?fields=id,name",
                self.api_base
            ))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            error!(folder_id, status = %response.status(), "Drive folder lookup failed");
            return Err(PipelineError::FolderNotFound(folder_id.to_string()));
        }

        let file: DriveFileResponse = response.json().await?;
        info!(folder_id = %file.id, folder_name = %file.name, "Located drive folder");
        Ok(DriveFolder {
            id: file.id,
            name: file.name,
        })
    }

    async fn upload_document(
        &self,
        document: &Path,
        folder: &DriveFolder,
    ) -> Result<UploadedDocument, PipelineError> {
        let token = self.access_token().await?.to_string();
        let file_name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                PipelineError::Config(format!("document path has no file name: {}", document.display()))
            })?;
        let content = fs::read(document)?;

        info!(
            file_name = %file_name,
            folder_id = %folder.id,
            size = content.len(),
            "Uploading document to drive folder"
        );

        // Two-step upload: create metadata with the folder as parent, then
        // send the bytes as media content.
        let created: DriveFileResponse = self
            .http
            .post(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(&token)
            .json(&json!({
                "name": file_name,
                "parents": [folder.id],
            }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                error!(error = ?e, "Drive file metadata creation failed");
                PipelineError::Network(e)
            })?
            .json()
            .await?;

        let updated: DriveFileResponse = self
            .http
            .patch(format!(
                "{}/upload/drive/v3/files/{}?uploadType=media",
                self.api_base, created.id
            ))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(content)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                error!(error = ?e, file_id = %created.id, "Drive media upload failed");
                PipelineError::Network(e)
            })?
            .json()
            .await?;

        info!(file_id = %updated.id, "Document uploaded");
        Ok(UploadedDocument {
            file_id: updated.id,
            name: updated.name,
        })
    }
}
