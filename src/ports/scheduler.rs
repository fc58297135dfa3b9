// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::errors::ClientResult;

/// Outcome of submitting the worker batch job. A submission whose output
/// lacks the scheduler's acknowledgment text is reported, not failed: the
/// guard runs on every job submission and self-corrects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSubmission {
    Accepted { scheduler_id: Option<i64> },
    Unconfirmed { output: String },
}

/// The cluster's batch scheduler, reduced to the three operations this
/// client needs. Command syntax is cluster-specific; adapters fill it in.
#[async_trait]
pub trait BatchScheduler: Send + Sync {
    /// Scheduler ids of this user's jobs matching the worker job name.
    async fn list_worker_jobs(&self) -> ClientResult<Vec<String>>;

    /// Submit the predefined worker batch script.
    async fn submit_worker(&self) -> ClientResult<WorkerSubmission>;

    /// Cancel one job by scheduler id.
    async fn cancel(&self, scheduler_id: &str) -> ClientResult<()>;
}
