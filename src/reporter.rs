use std::rc::Rc;

use anyhow::Context as _;
use serde::Serialize;

use crate::fetcher::Transport;
use crate::page::{Document, Element};

/// Elements carrying this class report their checked state.
pub const PROGRESS_CHECK_SELECTOR: &str = ".progress-check";
pub const UPDATE_PROGRESS_PATH: &str = "/update-progress";

/// Body of one `POST /update-progress`. Missing attributes serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub group_id: Option<String>,
    pub concept: Option<String>,
    pub status: bool,
}

impl ProgressUpdate {
    /// Snapshot of a checkbox at event time; attributes are passed through verbatim.
    pub fn from_element(element: &Element) -> Self {
        Self {
            group_id: element.data("group"),
            concept: element.data("concept"),
            status: element.is_checked(),
        }
    }
}

/// Attaches a change listener to every progress checkbox currently in
/// `document`. Returns the number of elements wired.
///
/// Checkboxes inserted later are not picked up.
pub fn bind_progress_checks(
    document: &Document,
    transport: Rc<dyn Transport>,
) -> anyhow::Result<usize> {
    let checks = document.query_all(PROGRESS_CHECK_SELECTOR)?;
    for check in &checks {
        let transport = transport.clone();
        document.on_change(check, move |element| report_change(element, transport.as_ref()));
    }
    tracing::debug!(count = checks.len(), "progress checkboxes bound");
    Ok(checks.len())
}

fn report_change(element: &Element, transport: &dyn Transport) -> anyhow::Result<()> {
    let update = ProgressUpdate::from_element(element);
    let body = serde_json::to_vec(&update).context("encode progress update")?;
    tracing::info!(
        group_id = update.group_id.as_deref().unwrap_or(""),
        concept = update.concept.as_deref().unwrap_or(""),
        status = update.status,
        "reporting progress"
    );
    transport.post_json(UPDATE_PROGRESS_PATH, body)
}
