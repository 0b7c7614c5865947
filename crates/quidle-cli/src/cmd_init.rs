use crate::workspace::Workspace;
use quidle_core::TabEvent;
use std::path::Path;

/// `quidle init`: create `.quidle/` and run the install routine.
pub async fn execute(root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open(root);
    let fresh = !ws.paths.is_initialized();
    ws.paths.ensure_layout()?;

    ws.runtime.handle(TabEvent::Installed).await;

    let settings = ws.runtime.state().settings()?;
    if fresh {
        println!("Initialized Quidle workspace at {}", ws.paths.quidle_dir.display());
    } else {
        println!("Quidle workspace at {} updated", ws.paths.quidle_dir.display());
    }
    println!(
        "  tab limit {}, inactivity {} min, action {}, {}",
        settings.tab_limit,
        settings.inactivity_minutes,
        settings.action,
        if settings.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
