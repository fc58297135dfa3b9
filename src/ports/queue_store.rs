// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::errors::ClientResult;
use crate::job::JobDocument;

/// Storage boundary for the job queue. The live implementation maps job
/// status to directory membership on the remote filesystem; the trait hides
/// that so status becomes a single lookup.
///
/// `get` on an id that is nowhere in the queue is a quiet `Ok(None)`:
/// "not yet visible", "never existed" and "already cleaned up" are not
/// distinguishable through this protocol. Transport failures are errors.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Write a freshly built pending document into the queue.
    async fn submit(&self, doc: &JobDocument) -> ClientResult<()>;

    /// Fetch the live document for `job_id`, wherever it currently lives.
    async fn get(&self, job_id: &str) -> ClientResult<Option<JobDocument>>;
}
