use crate::runtime::Runtime;
use quidle_core::{AlarmSpec, TabEvent, CHECK_TABS_ALARM};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Fire the check alarm after `spec.delay`, then every `spec.period`, until
/// `cancel` is triggered. A sweep in progress always finishes; cancellation
/// is only observed between ticks. Returns the number of alarms fired.
pub async fn run_alarm(runtime: &Runtime, spec: AlarmSpec, cancel: CancellationToken) -> u64 {
    tokio::select! {
        _ = cancel.cancelled() => return 0,
        _ = tokio::time::sleep(spec.delay) => {}
    }

    let period = spec.period.max(Duration::from_secs(1));
    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut fired = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticks.tick() => {
                fired += 1;
                tracing::debug!(alarm = CHECK_TABS_ALARM, fired, "alarm fired");
                runtime
                    .handle(TabEvent::Alarm {
                        name: CHECK_TABS_ALARM.to_string(),
                    })
                    .await;
            }
        }
    }
    tracing::info!(fired, "alarm stopped");
    fired
}
