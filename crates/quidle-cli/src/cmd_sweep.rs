use crate::workspace::Workspace;
use quidle_core::{AlarmSpec, CHECK_TABS_ALARM};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `quidle sweep`: run one sweep now.
pub async fn sweep(root: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    match ws.runtime.sweeper().run_once().await {
        Some(outcome) => println!("{outcome}"),
        None => println!("Sweep failed; see log for details."),
    }
    Ok(())
}

/// `quidle run`: fire the check alarm on schedule until Ctrl-C.
pub async fn run(
    root: &Path,
    period_secs: Option<u64>,
    delay_secs: Option<u64>,
) -> anyhow::Result<()> {
    let ws = Workspace::open_existing(root)?;
    let stored = ws.runtime.state().alarm(CHECK_TABS_ALARM)?;
    let base = stored.unwrap_or_default();
    let spec = AlarmSpec {
        delay: delay_secs.map(Duration::from_secs).unwrap_or(base.delay),
        period: period_secs.map(Duration::from_secs).unwrap_or(base.period),
    };

    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    eprintln!(
        "quidle running (first check in {}s, then every {}s). Press Ctrl-C to stop.",
        spec.delay.as_secs(),
        spec.period.as_secs()
    );
    let fired = quidle_daemon::run_alarm(&ws.runtime, spec, cancel).await;
    eprintln!("Stopped after {fired} checks.");
    Ok(())
}

fn ctrlc_cancel(cancel: CancellationToken) {
    let _ = ctrlc::set_handler(move || {
        cancel.cancel();
    });
}
