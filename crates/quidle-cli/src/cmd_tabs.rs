//! Drive the file-backed tab strip. Each change is reported to the runtime
//! as the matching lifecycle event, the way a browser would.

use crate::workspace::Workspace;
use clap::Subcommand;
use quidle_core::{TabEvent, TabId, TabSnapshot};
use quidle_host::TabHost;
use std::path::Path;

#[derive(Subcommand)]
pub enum TabsCmd {
    /// List open tabs with their last-active time
    List,
    /// Open a new tab
    Open {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        pinned: bool,
        #[arg(long)]
        audible: bool,
        /// Open in the background instead of activating it
        #[arg(long)]
        background: bool,
    },
    /// Make a tab the active tab
    Activate { tab_id: TabId },
    /// Close a tab
    Close { tab_id: TabId },
}

pub async fn run(cmd: TabsCmd, root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    match cmd {
        TabsCmd::List => list(&ws).await,
        TabsCmd::Open {
            url,
            title,
            pinned,
            audible,
            background,
        } => {
            let template = TabSnapshot {
                title,
                pinned,
                audible,
                active: !background,
                ..TabSnapshot::new(0, &url)
            };
            let tab = ws.host.with_strip(|strip| Ok(strip.open(template)))?;
            ws.runtime
                .handle(TabEvent::TabCreated { tab_id: tab.id })
                .await;
            println!("Opened tab {} {}", tab.id, url);
            Ok(())
        }
        TabsCmd::Activate { tab_id } => {
            ws.host.activate(tab_id).await?;
            ws.runtime.handle(TabEvent::TabActivated { tab_id }).await;
            println!("Activated tab {tab_id}");
            Ok(())
        }
        TabsCmd::Close { tab_id } => {
            ws.host.remove(tab_id).await?;
            ws.runtime.handle(TabEvent::TabRemoved { tab_id }).await;
            println!("Closed tab {tab_id}");
            Ok(())
        }
    }
}

async fn list(ws: &Workspace) -> anyhow::Result<()> {
    let tabs = ws.host.query().await?;
    if tabs.is_empty() {
        println!("No open tabs.");
        return Ok(());
    }
    let ledger = ws.runtime.state().ledger()?;
    for tab in &tabs {
        let mut flags = Vec::new();
        if tab.active {
            flags.push("active");
        }
        if tab.pinned {
            flags.push("pinned");
        }
        if tab.audible {
            flags.push("audible");
        }
        if tab.discarded {
            flags.push("discarded");
        }
        let seen = ledger
            .get(tab.id)
            .map(crate::workspace::format_ms)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<24}  {:<20}  {}",
            tab.id,
            seen,
            flags.join(","),
            tab.label()
        );
    }
    println!("\n({} tabs open)", tabs.len());
    Ok(())
}
