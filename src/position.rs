//! Loader for position data files.
//!
//! A position file is a YAML document with sections for the job title, the
//! organization background, a summary and the workplan activities. The loader
//! validates that every required section is present before any network call
//! happens further down the pipeline.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::PipelineError;

/// One workplan entry: a task area, what it produces, and the share of time
/// allocated to it. Allocations are non-negative and used directly as chart
/// magnitudes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Activity {
    pub name: String,
    pub deliverable: String,
    pub allocation: u32,
}

/// The core elements of a work position to be advertised and recruited for.
#[derive(Debug, Clone)]
pub struct Position {
    pub title: String,
    pub division: String,
    pub about_org: String,
    pub summary: String,
    pub expectations: Option<String>,
    pub scope: Option<String>,
    pub activities: Vec<Activity>,
}

/// Raw file shape: everything optional so that missing sections surface as
/// `MissingSection` instead of an opaque serde error.
#[derive(Debug, Deserialize)]
struct PositionFile {
    title: Option<String>,
    about_org: Option<String>,
    summary: Option<String>,
    expectations: Option<String>,
    scope: Option<String>,
    activities: Option<Vec<Activity>>,
}

/// Reads and parses a position YAML file into a [`Position`].
///
/// The division is a labelling/routing argument only; it does not come from
/// the file.
pub fn load_position(path: &Path, division: &str) -> Result<Position, PipelineError> {
    info!(position_file = ?path, division, "Loading position data");

    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    let file: PositionFile =
        serde_yaml::from_str(&raw).map_err(|e| PipelineError::Parse(e.to_string()))?;

    let title = file.title.ok_or(PipelineError::MissingSection("title"))?;
    let about_org = file
        .about_org
        .ok_or(PipelineError::MissingSection("about_org"))?;
    let summary = file.summary.ok_or(PipelineError::MissingSection("summary"))?;
    let activities = file
        .activities
        .ok_or(PipelineError::MissingSection("activities"))?;

    if activities.is_empty() {
        return Err(PipelineError::Parse(
            "activities section must contain at least one entry".to_string(),
        ));
    }

    // The original workplan convention is percentages totalling 100, but no
    // normalization is enforced; an off total is only worth a warning.
    let total: u32 = activities.iter().map(|a| a.allocation).sum();
    if total != 100 {
        warn!(total, title = %title, "workplan allocations do not sum to 100");
    }

    info!(
        title = %title,
        activities = activities.len(),
        "Position data loaded"
    );

    Ok(Position {
        title,
        division: division.to_string(),
        about_org,
        summary,
        expectations: file.expectations,
        scope: file.scope,
        activities,
    })
}
