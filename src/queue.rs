// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::{ClientError, ClientResult};
use crate::job::{validate_job_id, JobDocument, JobStatus};
use crate::ports::{QueueStore, RemoteExec};
use crate::shell::sh_escape;

/// File-based job queue on the remote host: a document named
/// `<job_id>.json` lives in exactly one of `jobs/{pending,running,
/// completed,failed}` under the base path. The client only ever writes the
/// initial pending document; the remote worker owns it afterwards.
pub struct RemoteDirQueue {
    exec: Arc<dyn RemoteExec>,
    base_path: String,
}

impl RemoteDirQueue {
    pub fn new(exec: Arc<dyn RemoteExec>, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into().trim_end_matches('/').to_string();
        Self { exec, base_path }
    }

    pub fn document_path(&self, status: JobStatus, job_id: &str) -> String {
        format!(
            "{}/jobs/{}/{}.json",
            self.base_path,
            status.dir_name(),
            job_id
        )
    }
}

#[async_trait]
impl QueueStore for RemoteDirQueue {
    async fn submit(&self, doc: &JobDocument) -> ClientResult<()> {
        validate_job_id(&doc.job_id)?;
        let content = serde_json::to_string_pretty(doc)?;
        let path = self.document_path(JobStatus::Pending, &doc.job_id);

        // Best-effort single-shot write; a non-empty stderr is surfaced as
        // submission failure rather than retried.
        let command = format!("printf '%s' {} > {}", sh_escape(&content), sh_escape(&path));
        let capture = self
            .exec
            .exec_capture(&command)
            .await
            .map_err(ClientError::Exec)?;

        if capture.exit_code != 0 || !capture.stderr.is_empty() {
            let stderr = capture.stderr_utf8();
            log::error!("failed to create job file {}: {}", path, stderr.trim());
            return Err(ClientError::SubmissionRejected { stderr });
        }

        log::info!("job submitted: {}", doc.job_id);
        Ok(())
    }

    async fn get(&self, job_id: &str) -> ClientResult<Option<JobDocument>> {
        validate_job_id(job_id)?;

        // Probe in fixed order; at steady state exactly one directory holds
        // the live document, so first hit wins.
        for status in JobStatus::PROBE_ORDER {
            let path = self.document_path(status, job_id);
            let command = format!("cat {} 2>/dev/null", sh_escape(&path));
            let capture = self
                .exec
                .exec_capture(&command)
                .await
                .map_err(ClientError::Exec)?;

            if capture.stdout.is_empty() {
                continue;
            }
            let doc: JobDocument = serde_json::from_slice(&capture.stdout)?;
            return Ok(Some(doc));
        }

        Ok(None)
    }
}
