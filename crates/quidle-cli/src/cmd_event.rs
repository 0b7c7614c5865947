use crate::workspace::Workspace;
use clap::Subcommand;
use quidle_core::{TabEvent, TabId};
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum EventCmd {
    /// A tab became the active tab
    Activated { tab_id: TabId },
    /// A tab was created
    Created { tab_id: TabId },
    /// A tab changed (only navigation or load completion count as activity)
    Updated {
        tab_id: TabId,
        /// The tab navigated to a new URL
        #[arg(long)]
        url_changed: bool,
        /// The tab finished loading
        #[arg(long)]
        complete: bool,
    },
    /// A tab was closed
    Removed { tab_id: TabId },
    /// A named alarm fired
    Alarm { name: String },
}

impl EventCmd {
    fn into_event(self) -> TabEvent {
        match self {
            EventCmd::Activated { tab_id } => TabEvent::TabActivated { tab_id },
            EventCmd::Created { tab_id } => TabEvent::TabCreated { tab_id },
            EventCmd::Updated {
                tab_id,
                url_changed,
                complete,
            } => TabEvent::TabUpdated {
                tab_id,
                url_changed,
                status_complete: complete,
            },
            EventCmd::Removed { tab_id } => TabEvent::TabRemoved { tab_id },
            EventCmd::Alarm { name } => TabEvent::Alarm { name },
        }
    }
}

// ── Dispatch ──

pub async fn run(cmd: EventCmd, root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    let handled = ws.runtime.handle(cmd.into_event()).await;
    if handled.effects.is_empty() {
        println!("(no effect)");
    }
    for effect in &handled.effects {
        println!("{effect:?}");
    }
    if let Some(outcome) = handled.sweep {
        println!("sweep: {outcome}");
    }
    Ok(())
}
