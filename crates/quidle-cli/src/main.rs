mod cmd_event;
mod cmd_history;
mod cmd_init;
mod cmd_settings;
mod cmd_stats;
mod cmd_sweep;
mod cmd_tabs;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quidle",
    version,
    about = "Keep the tab count in check by suspending or closing idle tabs"
)]
struct Cli {
    /// Data root containing `.quidle/` (defaults to the nearest `.quidle/` above
    /// the current directory, then the per-user data directory)
    #[arg(long, global = true, env = "QUIDLE_DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the workspace, apply default settings and schedule the check alarm
    Init,
    /// Run one sweep now
    Sweep,
    /// Run the periodic check until Ctrl-C
    Run {
        /// Seconds between checks (default: stored alarm, else 60)
        #[arg(long)]
        period_secs: Option<u64>,
        /// Seconds before the first check (default: stored alarm, else 60)
        #[arg(long)]
        delay_secs: Option<u64>,
    },
    /// Deliver a tab lifecycle event
    Event {
        #[command(subcommand)]
        cmd: cmd_event::EventCmd,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        cmd: cmd_settings::SettingsCmd,
    },
    /// Recently handled tabs
    History {
        #[command(subcommand)]
        cmd: cmd_history::HistoryCmd,
    },
    /// Reopen a recently handled tab by its history index
    Reopen {
        /// Index shown by `quidle history list` (0 = newest)
        index: usize,
    },
    /// Suspended / closed counters
    Stats {
        #[command(subcommand)]
        cmd: cmd_stats::StatsCmd,
    },
    /// Inspect or change the tab strip
    Tabs {
        #[command(subcommand)]
        cmd: cmd_tabs::TabsCmd,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = workspace::Workspace::resolve_root(cli.dir.as_deref())?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match cli.cmd {
            Command::Init => cmd_init::execute(&root).await,
            Command::Sweep => cmd_sweep::sweep(&root).await,
            Command::Run {
                period_secs,
                delay_secs,
            } => cmd_sweep::run(&root, period_secs, delay_secs).await,
            Command::Event { cmd } => cmd_event::run(cmd, &root).await,
            Command::Settings { cmd } => cmd_settings::run(cmd, &root).await,
            Command::History { cmd } => cmd_history::run(cmd, &root),
            Command::Reopen { index } => cmd_history::reopen(&root, index).await,
            Command::Stats { cmd } => cmd_stats::run(cmd, &root).await,
            Command::Tabs { cmd } => cmd_tabs::run(cmd, &root).await,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_settings_save_flags() {
        let cli = Cli::try_parse_from([
            "quidle",
            "--dir",
            "/tmp/q",
            "settings",
            "save",
            "--tab-limit",
            "12",
            "--action",
            "close",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/q")));
        assert!(matches!(
            cli.cmd,
            Command::Settings {
                cmd: cmd_settings::SettingsCmd::Save { .. }
            }
        ));
    }
}
