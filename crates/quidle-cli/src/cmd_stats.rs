use crate::workspace::Workspace;
use clap::Subcommand;
use quidle_daemon::Viewer;
use std::path::Path;

#[derive(Subcommand)]
pub enum StatsCmd {
    /// Show how many tabs have been suspended and closed
    Show,
    /// Reset both counters to zero
    Clear,
}

pub async fn run(cmd: StatsCmd, root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    let viewer = Viewer::new(&ws.runtime);
    match cmd {
        StatsCmd::Show => {
            let counters = viewer.counters()?;
            println!("Open tabs:  {}", viewer.open_tab_count().await?);
            println!("Discarded:  {}", counters.total_discarded);
            println!("Closed:     {}", counters.total_closed);
        }
        StatsCmd::Clear => {
            viewer.clear_counters()?;
            println!("Statistics cleared!");
        }
    }
    Ok(())
}
