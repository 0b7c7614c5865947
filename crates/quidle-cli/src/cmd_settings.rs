use crate::workspace::Workspace;
use clap::Subcommand;
use quidle_core::SettingsForm;
use quidle_daemon::Viewer;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum SettingsCmd {
    /// Show current settings, stats and open tab count
    Show,
    /// Validate and save settings (omitted flags keep their current value)
    Save {
        /// Maximum number of open tabs before the sweeper acts
        #[arg(long)]
        tab_limit: Option<String>,
        /// Minutes a tab must be idle before it is eligible
        #[arg(long)]
        inactivity: Option<String>,
        /// Hostname substrings to never touch, separated by commas or newlines
        #[arg(long)]
        whitelist: Option<String>,
        /// Master switch
        #[arg(long)]
        enabled: Option<bool>,
        /// suspend or close
        #[arg(long)]
        action: Option<String>,
    },
}

// ── Dispatch ──

pub async fn run(cmd: SettingsCmd, root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    let viewer = Viewer::new(&ws.runtime);
    match cmd {
        SettingsCmd::Show => show(&viewer).await,
        SettingsCmd::Save {
            tab_limit,
            inactivity,
            whitelist,
            enabled,
            action,
        } => {
            let mut form = SettingsForm::from_settings(&viewer.settings()?);
            if let Some(v) = tab_limit {
                form.tab_limit = v;
            }
            if let Some(v) = inactivity {
                form.inactivity_minutes = v;
            }
            if let Some(v) = whitelist {
                form.whitelist = v;
            }
            if let Some(v) = enabled {
                form.enabled = v;
            }
            if let Some(v) = action {
                form.action = v;
            }
            viewer.save_settings(&form)?;
            println!("Settings saved!");
            show(&viewer).await
        }
    }
}

// ── Command Implementations ──

async fn show(viewer: &Viewer<'_>) -> anyhow::Result<()> {
    let o = viewer.overview().await?;
    println!("enabled          {}", o.settings.enabled);
    println!("tab limit        {}", o.settings.tab_limit);
    println!("inactivity       {} min", o.settings.inactivity_minutes);
    println!("action           {}", o.settings.action);
    if o.settings.whitelist.is_empty() {
        println!("whitelist        (empty)");
    } else {
        println!("whitelist        {}", o.settings.whitelist.join(", "));
    }
    println!("open tabs        {}", o.open_tabs);
    println!("discarded total  {}", o.counters.total_discarded);
    println!("closed total     {}", o.counters.total_closed);
    println!("history entries  {}", o.history.len());
    Ok(())
}
