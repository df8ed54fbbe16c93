//! Stale-operation janitor.
//!
//! An operation left in Running past the staleness bound means the
//! process that owned it died mid-run. There is no automatic
//! reconciliation — the janitor surfaces each orphan for operator
//! intervention and keeps scanning.

use std::time::Duration;

use chrono::Utc;
use steward_db::repositories::OperationRepo;
use steward_db::DbPool;
use tokio_util::sync::CancellationToken;

/// Default staleness bound for a Running operation.
const DEFAULT_STALE_AFTER_MINS: i64 = 60;

/// How often the janitor scans.
const SCAN_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the stale-operation scan loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    let stale_after_mins: i64 = std::env::var("STALE_OPERATION_MINS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_STALE_AFTER_MINS);

    tracing::info!(
        stale_after_mins,
        interval_secs = SCAN_INTERVAL.as_secs(),
        "Stale-operation janitor started"
    );

    let mut interval = tokio::time::interval(SCAN_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale-operation janitor stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::minutes(stale_after_mins);
                match OperationRepo::list_running_older_than(&pool, cutoff).await {
                    Ok(orphans) => {
                        for op in orphans {
                            let minutes_stale =
                                (Utc::now() - op.updated_at).num_minutes();
                            tracing::warn!(
                                operation_id = op.id,
                                server_id = op.server_id,
                                minutes_stale,
                                "operation stuck in Running; operator intervention required",
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stale-operation scan failed");
                    }
                }
            }
        }
    }
}
