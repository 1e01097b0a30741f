mod cli;
mod fetcher;
mod page;
mod reporter;
mod storage;
mod theme;

use std::rc::Rc;
use std::time::Duration;

pub use cli::{Action, Args as CliArgs};
pub use fetcher::{HttpTransport, Transport};
pub use page::{Document, Element};
pub use reporter::{
    PROGRESS_CHECK_SELECTOR, ProgressUpdate, UPDATE_PROGRESS_PATH, bind_progress_checks,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{THEME_ATTRIBUTE, THEME_STORAGE_KEY, Theme, restore_theme, toggle_theme};

pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let document = Document::open(&args.page)?;
    let mut storage = FileStore::open(&args.storage)?;

    if !args.no_restore {
        if let Some(theme) = restore_theme(&document, &storage)? {
            tracing::info!(%theme, "restored saved theme");
        }
    }

    let transport = Rc::new(HttpTransport::new(args.base_url.clone(), &args.user_agent)?);
    let bound = bind_progress_checks(&document, transport.clone())?;
    tracing::info!(count = bound, page = %args.page.display(), "page loaded");

    match &args.action {
        Action::ToggleTheme => {
            toggle_theme(&document, &mut storage)?;
            tracing::info!(
                theme = document.root_attribute(THEME_ATTRIBUTE).as_deref().unwrap_or(""),
                storage = %storage.path().display(),
                "theme switched"
            );
        }
        Action::Check {
            group,
            concept,
            uncheck,
        } => {
            let clicked = check_matching(&document, group.as_deref(), concept.as_deref(), !uncheck)?;
            if clicked == 0 {
                tracing::warn!("no progress checkbox needed a click");
            }
        }
        Action::List => list_checks(&document)?,
    }

    let pending = transport
        .settle(Duration::from_millis(args.settle_ms))
        .await;
    tracing::debug!(pending, "outstanding updates settled");

    if let Some(out) = &args.out {
        document.write(out)?;
        tracing::info!(out = %out.display(), "page written");
    }
    Ok(())
}

/// Clicks each matching progress checkbox whose state differs from `checked`.
fn check_matching(
    document: &Document,
    group: Option<&str>,
    concept: Option<&str>,
    checked: bool,
) -> anyhow::Result<usize> {
    let mut clicked = 0;
    for element in document.query_all(PROGRESS_CHECK_SELECTOR)? {
        if group.is_some_and(|g| element.data("group").as_deref() != Some(g)) {
            continue;
        }
        if concept.is_some_and(|c| element.data("concept").as_deref() != Some(c)) {
            continue;
        }
        if element.is_checked() == checked {
            tracing::debug!(
                concept = element.data("concept").as_deref().unwrap_or(""),
                checked,
                "already in requested state"
            );
            continue;
        }
        document.click(&element);
        clicked += 1;
    }
    Ok(clicked)
}

fn list_checks(document: &Document) -> anyhow::Result<()> {
    for element in document.query_all(PROGRESS_CHECK_SELECTOR)? {
        tracing::info!(
            group_id = element.data("group").as_deref().unwrap_or(""),
            concept = element.data("concept").as_deref().unwrap_or(""),
            checked = element.is_checked(),
            "progress checkbox"
        );
    }
    Ok(())
}
