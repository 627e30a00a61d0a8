//! JSON export of computed views for non-interactive use.

use chrono::{DateTime, Utc};
use dashboard_core::models::{Dataset, View};
use dashboard_core::Result;
use serde::Serialize;
use tracing::warn;

use crate::reader::LoadReport;
use crate::views::{compute_view, ViewOptions, ViewReport};

/// One view's outcome inside an export document.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedView {
    pub slug: &'static str,
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ViewReport>,
    /// Set when the view could not be computed for this dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Top-level document written by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub generated_at: DateTime<Utc>,
    pub load: LoadReport,
    pub options: ViewOptions,
    pub views: Vec<ExportedView>,
}

/// Compute `views` and bundle them with the load diagnostics.
///
/// A view that fails (for example regional profit on an empty extract) is
/// recorded with its error message instead of aborting the export.
pub fn build_export(
    dataset: &Dataset,
    load: &LoadReport,
    options: &ViewOptions,
    views: &[View],
) -> ExportDocument {
    let views = views
        .iter()
        .map(|&view| match compute_view(view, dataset, options) {
            Ok(report) => ExportedView {
                slug: view.slug(),
                title: view.title(),
                report: Some(report),
                error: None,
            },
            Err(e) => {
                warn!("View {} unavailable: {}", view, e);
                ExportedView {
                    slug: view.slug(),
                    title: view.title(),
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    ExportDocument {
        generated_at: Utc::now(),
        load: load.clone(),
        options: options.clone(),
        views,
    }
}

/// Serialize an export document as pretty-printed JSON.
pub fn to_json(document: &ExportDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}
