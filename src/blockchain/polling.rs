use crate::service::Synchronizer;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Periodically runs `sync_all` until `shutdown` is cancelled.
///
/// Ticks are sequential: a slow round delays the next one instead of
/// overlapping it. Cancellation also interrupts a round in progress; every
/// completed upsert is already durable and the watermark of an unfinished
/// address stays where it was.
pub async fn start_polling(
    synchronizer: Arc<Synchronizer>,
    period: Duration,
    shutdown: CancellationToken,
) {
    info!("Starting background sync every {:?}", period);

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                info!("Starting background sync...");
                tokio::select! {
                    result = synchronizer.sync_all() => match result {
                        Ok(summary) => info!(
                            "Background sync completed: {} addresses, {} new transactions",
                            summary.synced, summary.inserted
                        ),
                        Err(e) => error!("Background sync failed: {}", e),
                    },
                    _ = shutdown.cancelled() => {
                        info!("Background sync interrupted by shutdown");
                        break;
                    }
                }
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down background sync");
                break;
            }
        }
    }
}
