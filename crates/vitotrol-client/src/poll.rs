//! Completion polling for asynchronous server operations.
//!
//! `WriteData`, `RefreshData` and `WriteTimesheetData` only queue work on
//! the server and hand back a refresh ID. A background task then polls the
//! matching status request until the server reports completion (status 4),
//! an error occurs, or the timeout is reached. The outcome is delivered
//! exactly once through a [`PendingOperation`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{Result, VitotrolError};
use crate::session::Transport;

/// Server status value meaning the queued operation completed.
const STATUS_DONE: i32 = 4;

/// Polling schedule: an initial pause, then pauses shrinking by a factor
/// of 4 down to a floor, bounded by an overall timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollParams {
    pub initial_wait: Duration,
    pub min_wait: Duration,
    pub timeout: Duration,
}

impl PollParams {
    /// Schedule used after `WriteData`.
    pub const WRITE: PollParams = PollParams {
        initial_wait: Duration::from_secs(4),
        min_wait: Duration::from_secs(1),
        timeout: Duration::from_secs(60),
    };

    /// Schedule used after `RefreshData` and `WriteTimesheetData`. Yes,
    /// the server really needs 8 seconds before the first status check.
    pub const REFRESH: PollParams = PollParams {
        initial_wait: Duration::from_secs(8),
        min_wait: Duration::from_secs(1),
        timeout: Duration::from_secs(60),
    };
}

/// Which status request follows the queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Write,
    Refresh,
}

/// Handle on a queued server operation. Await [`PendingOperation::wait`]
/// for the outcome, or drop/[`abort`](PendingOperation::abort) it to stop
/// caring; the server finishes the work either way.
#[derive(Debug)]
pub struct PendingOperation {
    rx: oneshot::Receiver<Result<()>>,
    handle: JoinHandle<()>,
}

impl PendingOperation {
    /// Wait for the final outcome of the operation.
    pub async fn wait(self) -> Result<()> {
        match self.rx.await {
            Ok(outcome) => outcome,
            // The poll task can only vanish without reporting when aborted.
            Err(_) => Err(VitotrolError::Cancelled),
        }
    }

    /// Stop polling. The queued server operation itself is not revoked.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Spawn the polling task for a freshly queued operation.
pub(crate) fn spawn_poll(
    transport: Arc<Transport>,
    refresh_id: String,
    kind: StatusKind,
    params: PollParams,
) -> PendingOperation {
    let (tx, rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let outcome = poll_status(&transport, &refresh_id, kind, params).await;
        // The receiver may already be gone.
        let _ = tx.send(outcome);
    });

    PendingOperation { rx, handle }
}

async fn poll_status(
    transport: &Transport,
    refresh_id: &str,
    kind: StatusKind,
    params: PollParams,
) -> Result<()> {
    let start = Instant::now();
    let mut wait = params.initial_wait;

    loop {
        sleep(wait).await;

        let status = match kind {
            StatusKind::Write => transport.request_write_status(refresh_id).await?,
            StatusKind::Refresh => transport.request_refresh_status(refresh_id).await?,
        };

        if status == STATUS_DONE {
            debug!("operation {refresh_id} done in {:?}", start.elapsed());
            return Ok(());
        }

        if start.elapsed() >= params.timeout {
            return Err(VitotrolError::Timeout);
        }

        wait = (wait / 4).max(params.min_wait);

        // 1 and 3 are the usual in-progress values.
        if status != 1 && status != 3 {
            warn!("operation {refresh_id}: unexpected status {status}, waiting {wait:?}");
        } else {
            debug!("operation {refresh_id}: status {status}, waiting {wait:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn wait_decay_clamps_to_floor() {
        let params = PollParams::WRITE;
        let mut wait = params.initial_wait;
        let mut waits = vec![wait];
        for _ in 0..3 {
            wait = (wait / 4).max(params.min_wait);
            waits.push(wait);
        }
        assert_eq!(
            waits,
            [
                Duration::from_secs(4),
                Duration::from_secs(1),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );
    }
}
