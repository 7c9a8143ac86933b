//! Error taxonomy for the posting generation pipeline.
//!
//! Every variant is fatal to the run: there are no retries, no partial-result
//! persistence and no rollback. The CLI surfaces the message and exits
//! non-zero; the progress indicator stops at the failed stage.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("position file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse position data: {0}")]
    Parse(String),

    #[error("missing required section `{0}` in position file")]
    MissingSection(&'static str),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("drive folder not found: {0}")]
    FolderNotFound(String),

    #[error("document assembly failed: {0}")]
    Template(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
