use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
    /// Flip the page theme between light and dark and persist the choice.
    ToggleTheme,
    /// Click progress checkboxes so they end up in the requested state.
    Check {
        /// Only boxes whose `data-group` equals this value.
        #[arg(long)]
        group: Option<String>,
        /// Only boxes whose `data-concept` equals this value.
        #[arg(long)]
        concept: Option<String>,
        /// Uncheck instead of check.
        #[arg(long)]
        uncheck: bool,
    },
    /// Log every progress checkbox with its group, concept and state.
    List,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// HTML page to load.
    #[arg(long)]
    pub page: PathBuf,

    /// JSON file standing in for the browser's local storage.
    #[arg(long, default_value = "studysync-storage.json")]
    pub storage: PathBuf,

    /// Origin of the study-group server; `/update-progress` is resolved against it.
    #[arg(long, default_value = "http://127.0.0.1:5000/")]
    pub base_url: Url,

    /// HTTP User-Agent used for progress updates.
    #[arg(long, default_value = "studysync-page/0.1")]
    pub user_agent: String,

    /// Write the page back here after the action (theme marker, checked states).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Skip applying the stored theme at load.
    #[arg(long)]
    pub no_restore: bool,

    /// How long to let outstanding progress updates finish before exiting.
    #[arg(long, default_value_t = 5000)]
    pub settle_ms: u64,

    #[command(subcommand)]
    pub action: Action,
}
