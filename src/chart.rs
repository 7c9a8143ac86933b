//! Radar-chart generation for a position's workplan.
//!
//! The workplan entries map one-to-one onto the chart series: N activities
//! produce exactly N magnitudes, in file order. Rendering is delegated to an
//! external charting service behind the [`ChartService`] trait; the default
//! implementation talks to the QuickChart HTTP API, which returns both a
//! shareable chart URL and the rendered PNG bytes.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::PipelineError;
use crate::position::Position;

pub const DEFAULT_CHART_SERVICE_URL: &str = "https://quickchart.io";

const FILL_COLOR: &str = "#a1d99b";

/// The data series behind the radar chart: one axis label and one magnitude
/// per workplan activity, in the same order as the position file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<u32>,
}

impl RadarSeries {
    pub fn from_position(position: &Position) -> Self {
        RadarSeries {
            title: position.title.clone(),
            labels: position.activities.iter().map(|a| a.name.clone()).collect(),
            values: position
                .activities
                .iter()
                .map(|a| a.allocation)
                .collect(),
        }
    }

    /// Builds the Chart.js configuration sent to the charting service.
    /// Radial axis runs from zero to the largest magnitude plus five.
    pub fn to_chart_spec(&self) -> Value {
        let axis_max = self.values.iter().max().copied().unwrap_or(0) + 5;
        json!({
            "type": "radar",
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": format!("{} responsibilities", self.title),
                    "data": self.values,
                    "fill": true,
                    "backgroundColor": FILL_COLOR,
                    "borderColor": FILL_COLOR,
                }]
            },
            "options": {
                "legend": { "display": false },
                "title": { "display": true, "text": self.title },
                "scale": {
                    "ticks": { "min": 0, "max": axis_max }
                }
            }
        })
    }
}

/// What the charting service hands back: the shareable page URL and the
/// rendered image.
#[derive(Debug, Clone)]
pub struct PublishedChart {
    pub url: String,
    pub image: Vec<u8>,
}

/// The persisted per-run chart artifact.
#[derive(Debug, Clone)]
pub struct ChartResult {
    pub url: String,
    pub image_path: PathBuf,
}

/// Abstraction over the external charting service, mockable in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ChartService: Send + Sync {
    /// Publish the series as a remote chart, returning its shareable URL and
    /// rendered PNG bytes.
    async fn publish(&self, series: &RadarSeries) -> Result<PublishedChart, PipelineError>;
}

#[derive(Debug, Deserialize)]
struct CreateChartResponse {
    url: String,
}

/// QuickChart-backed implementation of [`ChartService`].
pub struct QuickChartClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuickChartClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        QuickChartClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChartService for QuickChartClient {
    async fn publish(&self, series: &RadarSeries) -> Result<PublishedChart, PipelineError> {
        let spec = series.to_chart_spec();

        info!(title = %series.title, axes = series.labels.len(), "Publishing radar chart");

        let created: CreateChartResponse = self
            .http
            .post(format!("{}/chart/create", self.base_url))
            .json(&json!({ "chart": spec }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                error!(error = ?e, "Chart service rejected chart creation");
                PipelineError::Network(e)
            })?
            .json()
            .await?;

        info!(chart_url = %created.url, "Chart published");

        let image = self
            .http
            .post(format!("{}/chart", self.base_url))
            .json(&json!({
                "chart": spec,
                "format": "png",
                "width": 500,
                "height": 400,
                "backgroundColor": "white",
            }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                error!(error = ?e, "Chart service failed to render PNG");
                PipelineError::Network(e)
            })?
            .bytes()
            .await?
            .to_vec();

        Ok(PublishedChart {
            url: created.url,
            image,
        })
    }
}

/// Builds the series for a position, publishes it through the given service
/// and writes the PNG to a timestamped file under `output_dir`, creating the
/// directory if absent.
pub async fn render_chart<C: ChartService + ?Sized>(
    service: &C,
    position: &Position,
    output_dir: &Path,
) -> Result<ChartResult, PipelineError> {
    let series = RadarSeries::from_position(position);
    let published = service.publish(&series).await?;

    fs::create_dir_all(output_dir)?;
    let timestamp = Local::now().format("%Y-%m-%d");
    let image_path = output_dir.join(format!("{} {}.png", position.title, timestamp));
    fs::write(&image_path, &published.image)?;

    info!(
        image_path = %image_path.display(),
        size = published.image.len(),
        "Wrote chart image"
    );

    Ok(ChartResult {
        url: published.url,
        image_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Activity;

    fn sample_position() -> Position {
        Position {
            title: "Process Improvement Fellow".to_string(),
            division: "bpio".to_string(),
            about_org: "An agency.".to_string(),
            summary: "Improve processes.".to_string(),
            expectations: None,
            scope: None,
            activities: vec![
                Activity {
                    name: "Process mapping".to_string(),
                    deliverable: "Current-state maps".to_string(),
                    allocation: 40,
                },
                Activity {
                    name: "Data analysis".to_string(),
                    deliverable: "KPI dashboards".to_string(),
                    allocation: 35,
                },
                Activity {
                    name: "Stakeholder interviews".to_string(),
                    deliverable: "Findings memos".to_string(),
                    allocation: 25,
                },
            ],
        }
    }

    #[test]
    fn series_has_one_magnitude_per_activity_in_order() {
        let position = sample_position();
        let series = RadarSeries::from_position(&position);

        assert_eq!(series.values, vec![40, 35, 25]);
        assert_eq!(
            series.labels,
            vec!["Process mapping", "Data analysis", "Stakeholder interviews"]
        );
    }

    #[test]
    fn chart_spec_is_a_radar_chart_with_padded_axis() {
        let series = RadarSeries::from_position(&sample_position());
        let spec = series.to_chart_spec();

        assert_eq!(spec["type"], "radar");
        assert_eq!(spec["data"]["labels"].as_array().unwrap().len(), 3);
        assert_eq!(spec["data"]["datasets"][0]["data"][0], 40);
        // axis runs to max magnitude + 5
        assert_eq!(spec["options"]["scale"]["ticks"]["max"], 45);
    }
}
