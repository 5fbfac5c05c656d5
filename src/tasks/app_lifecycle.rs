//! App lifecycle background task

use futures::stream::StreamExt;
use signal_hook::consts::{SIGUSR1, SIGUSR2};
use signal_hook_tokio::Signals;
use tracing::{error, info};

use crate::state::TimerContext;

/// Forward lifecycle signals to the timer context.
///
/// `SIGUSR1` means the app went to the background, `SIGUSR2` means it came
/// back to the foreground.
pub async fn app_lifecycle_task(context: TimerContext) {
    info!("Starting app lifecycle task");

    let mut signals = match Signals::new([SIGUSR1, SIGUSR2]) {
        Ok(signals) => signals,
        Err(e) => {
            error!("Failed to register lifecycle signals: {}", e);
            return;
        }
    };

    while let Some(signal) = signals.next().await {
        match signal {
            SIGUSR1 => {
                info!("Received SIGUSR1, entering background");
                context.app_did_enter_background();
            }
            SIGUSR2 => {
                info!("Received SIGUSR2, entering foreground");
                context.app_will_enter_foreground();
            }
            other => info!("Ignoring signal: {}", other),
        }
    }
}
