// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::errors::ClientResult;
use crate::ports::{BatchScheduler, WorkerSubmission};

/// Make sure one worker batch job is draining the queue, submitting a new
/// one only when none is visible. Check-then-submit leaves a race window
/// where two near-simultaneous submitters both start a worker; duplicate
/// workers drain the same queue without conflict, so no remote lock is
/// taken.
pub async fn ensure_worker_running(scheduler: &dyn BatchScheduler) -> ClientResult<()> {
    let jobs = scheduler.list_worker_jobs().await?;
    if !jobs.is_empty() {
        log::debug!("worker already running ({} scheduler job(s))", jobs.len());
        return Ok(());
    }

    log::info!("no worker detected, submitting one");
    match scheduler.submit_worker().await? {
        WorkerSubmission::Accepted { scheduler_id } => match scheduler_id {
            Some(id) => log::info!("worker started as scheduler job {}", id),
            None => log::info!("worker submission acknowledged"),
        },
        WorkerSubmission::Unconfirmed { output } => {
            // Not a hard failure: this guard runs on every submission and a
            // later check can self-correct.
            log::warn!("worker submission not acknowledged: {}", output.trim());
        }
    }
    Ok(())
}
