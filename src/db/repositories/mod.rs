use std::future::Future;
use std::time::Duration;

use anyhow::Result;

pub mod audit;
pub mod employee;
pub mod raffle;
pub mod user;

const BUSY_RETRIES: u32 = 5;
const BUSY_BACKOFF: Duration = Duration::from_millis(25);

/// SQLite reports code 5 (busy/locked) when two write transactions collide
/// on its single writer lock, and the deadlocked loser fails immediately
/// instead of waiting out the busy timeout.
pub(crate) fn is_busy(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let msg = cause.to_string();
        msg.contains("database is locked") || msg.contains("database table is locked")
    })
}

/// Re-runs a write transaction that lost the writer-lock race. The failed
/// attempt has already rolled back, so the operation restarts from a clean
/// read. After the retries are spent the busy error surfaces to the caller.
pub(crate) async fn retry_on_busy<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if is_busy(&err) && attempt < BUSY_RETRIES => {
                attempt += 1;
                tokio::time::sleep(BUSY_BACKOFF * attempt).await;
            }
            other => return other,
        }
    }
}
