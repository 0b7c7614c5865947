use crate::workspace::{format_ms, Workspace};
use clap::Subcommand;
use quidle_daemon::Viewer;
use std::path::Path;

#[derive(Subcommand)]
pub enum HistoryCmd {
    /// List recently handled tabs, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget all recently handled tabs
    Clear,
}

pub fn run(cmd: HistoryCmd, root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    let viewer = Viewer::new(&ws.runtime);
    match cmd {
        HistoryCmd::List { json } => list(&viewer, json),
        HistoryCmd::Clear => {
            viewer.clear_history()?;
            println!("History cleared.");
            Ok(())
        }
    }
}

fn list(viewer: &Viewer<'_>, json: bool) -> anyhow::Result<()> {
    let history = viewer.history()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("No recently handled tabs.");
        return Ok(());
    }
    for (i, entry) in history.entries().iter().enumerate() {
        let kind = if entry.tab_id.is_some() { "suspended" } else { "closed" };
        println!(
            "[{i}] {}  {:<9}  {}",
            format_ms(entry.closed_at),
            kind,
            entry.display_title()
        );
        println!("     {}", entry.display_url());
    }
    Ok(())
}

/// `quidle reopen <index>`
pub async fn reopen(root: &Path, index: usize) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    let outcome = Viewer::new(&ws.runtime).reopen_index(index).await?;
    println!("{outcome}");
    Ok(())
}
