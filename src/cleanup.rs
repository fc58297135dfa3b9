// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::errors::ClientResult;
use crate::job::validate_job_id;
use crate::ports::{BatchScheduler, RemoteExec};
use crate::shell::sh_escape;

/// Delete a completed job's remote traces: its result tree and its
/// completed-queue document. Deletions are scoped to paths keyed by the
/// validated job id; `pending`, `running` and `failed` documents are never
/// touched (failed jobs stay inspectable). Remote errors are warnings:
/// cleanup runs after the caller-visible outcome is already decided.
pub async fn remove_job_traces(
    exec: &dyn RemoteExec,
    base_path: &str,
    job_id: &str,
) -> ClientResult<()> {
    validate_job_id(job_id)?;
    let base = base_path.trim_end_matches('/');

    let result_dir = format!("{}/results/{}", base, job_id);
    let completed_doc = format!("{}/jobs/completed/{}.json", base, job_id);
    let commands = [
        format!("rm -rf {}", sh_escape(&result_dir)),
        format!("rm -f {}", sh_escape(&completed_doc)),
    ];

    for command in commands {
        match exec.exec_capture(&command).await {
            Ok(capture) if !capture.stderr.is_empty() => {
                log::warn!("cleanup warning: {}", capture.stderr_utf8().trim());
            }
            Ok(_) => {}
            Err(e) => log::warn!("cleanup command {:?} failed: {}", command, e),
        }
    }

    log::info!("cleaned up job {}", job_id);
    Ok(())
}

/// Cancel every batch-scheduler job under this identity that matches the
/// worker job name. Blunt on purpose: one caller runs at most one logical
/// worker session, and session teardown must not leave a worker burning
/// allocation. Returns how many cancellations were issued successfully.
pub async fn cancel_worker_jobs(scheduler: &dyn BatchScheduler) -> ClientResult<usize> {
    let jobs = scheduler.list_worker_jobs().await?;
    let mut cancelled = 0;
    for id in &jobs {
        match scheduler.cancel(id).await {
            Ok(()) => cancelled += 1,
            Err(e) => log::warn!("failed to cancel scheduler job {}: {}", id, e),
        }
    }
    if !jobs.is_empty() {
        log::info!("cancelled {}/{} worker job(s)", cancelled, jobs.len());
    }
    Ok(cancelled)
}
