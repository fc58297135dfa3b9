// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::errors::ClientResult;
use crate::job::{JobDocument, JobStatus};
use crate::ports::QueueStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Terminal outcome of a wait. `TimedOut` means the job's true state is
/// unknown; it may still complete later and must not be read as failure.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Completed(JobDocument),
    Failed(JobDocument),
    TimedOut,
}

impl WaitOutcome {
    pub fn document(&self) -> Option<&JobDocument> {
        match self {
            WaitOutcome::Completed(doc) | WaitOutcome::Failed(doc) => Some(doc),
            WaitOutcome::TimedOut => None,
        }
    }
}

/// Poll the queue until `job_id` reaches a terminal state or the deadline
/// passes. Each snapshot that differs from the last observed document (full
/// document equality, not just the status field) is forwarded on `updates`;
/// the loop returns on the first terminal observation.
///
/// Transient status-read errors are logged and treated as a missed poll so
/// a long wait survives a flaky probe.
pub async fn wait_for(
    queue: &dyn QueueStore,
    job_id: &str,
    opts: PollOptions,
    updates: Option<&mpsc::Sender<JobDocument>>,
) -> ClientResult<WaitOutcome> {
    let deadline = Instant::now() + opts.timeout;
    let mut last_seen: Option<JobDocument> = None;

    loop {
        match queue.get(job_id).await {
            Ok(Some(doc)) => {
                if last_seen.as_ref() != Some(&doc) {
                    if let Some(tx) = updates {
                        let _ = tx.send(doc.clone()).await;
                    }
                    if doc.status.is_terminal() {
                        return Ok(if doc.status == JobStatus::Completed {
                            WaitOutcome::Completed(doc)
                        } else {
                            WaitOutcome::Failed(doc)
                        });
                    }
                    last_seen = Some(doc);
                }
            }
            Ok(None) => {
                log::debug!("job {} not visible in any queue directory yet", job_id);
            }
            Err(e) => {
                log::warn!("status probe for job {} failed: {}", job_id, e);
            }
        }

        if Instant::now() >= deadline {
            log::warn!(
                "job {} did not reach a terminal state within {:?}",
                job_id,
                opts.timeout
            );
            return Ok(WaitOutcome::TimedOut);
        }
        tokio::time::sleep(opts.interval).await;
    }
}
