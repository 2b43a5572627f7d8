use std::sync::Arc;

use tracing::info;

use crate::poller::PollStats;
use crate::scheduler::Scheduler;

fn heartbeat_line(stats: &PollStats) -> String {
    format!(
        "Heartbeat: bot is alive ({} messages seen, {} replies sent)",
        stats.messages(),
        stats.replies()
    )
}

/// Periodically log that the bot is alive, with running totals from the poller.
pub async fn register_heartbeat(
    scheduler: &Scheduler,
    cron_expr: &str,
    stats: Arc<PollStats>,
) -> anyhow::Result<()> {
    scheduler
        .add_cron_job(cron_expr, "heartbeat", move || {
            let line = heartbeat_line(&stats);
            Box::pin(async move {
                info!("{}", line);
            })
        })
        .await
}
