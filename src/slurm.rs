// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::{ClientError, ClientResult};
use crate::ports::{BatchScheduler, RemoteExec, WorkerSubmission};
use crate::shell::sh_escape;

pub const SBATCH_ACK: &str = "Submitted batch job";

/// SLURM adapter for the batch-scheduler port. Commands run on the submit
/// node over the already-established SSH session.
pub struct SlurmScheduler {
    exec: Arc<dyn RemoteExec>,
    username: String,
    worker_job_name: String,
    base_path: String,
    submit_script: String,
}

impl SlurmScheduler {
    pub fn new(
        exec: Arc<dyn RemoteExec>,
        username: impl Into<String>,
        worker_job_name: impl Into<String>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            exec,
            username: username.into(),
            worker_job_name: worker_job_name.into(),
            base_path: base_path.into().trim_end_matches('/').to_string(),
            submit_script: "sbatch/process_job.sbatch".to_string(),
        }
    }

    async fn run(&self, command: &str) -> ClientResult<crate::ports::ExecCapture> {
        self.exec
            .exec_capture(command)
            .await
            .map_err(|e| ClientError::Scheduler(format!("{command:?}: {e}")))
    }
}

#[async_trait]
impl BatchScheduler for SlurmScheduler {
    async fn list_worker_jobs(&self) -> ClientResult<Vec<String>> {
        let command = format!(
            "squeue -u {} -n {} -h -o %i",
            sh_escape(&self.username),
            sh_escape(&self.worker_job_name)
        );
        let capture = self.run(&command).await?;
        if capture.exit_code != 0 {
            return Err(ClientError::Scheduler(format!(
                "squeue exited with {}: {}",
                capture.exit_code,
                capture.stderr_utf8().trim()
            )));
        }
        Ok(parse_squeue_ids(&capture.stdout_utf8()))
    }

    async fn submit_worker(&self) -> ClientResult<WorkerSubmission> {
        let command = format!(
            "cd {} && sbatch {}",
            sh_escape(&self.base_path),
            sh_escape(&self.submit_script)
        );
        let capture = self.run(&command).await?;
        let output = capture.stdout_utf8();

        if output.contains(SBATCH_ACK) {
            Ok(WorkerSubmission::Accepted {
                scheduler_id: parse_sbatch_job_id(&output),
            })
        } else {
            Ok(WorkerSubmission::Unconfirmed {
                output: format!("{}{}", output, capture.stderr_utf8()),
            })
        }
    }

    async fn cancel(&self, scheduler_id: &str) -> ClientResult<()> {
        let command = format!("scancel {}", sh_escape(scheduler_id));
        let capture = self.run(&command).await?;
        if capture.exit_code != 0 || !capture.stderr.is_empty() {
            return Err(ClientError::Scheduler(format!(
                "scancel {} failed: {}",
                scheduler_id,
                capture.stderr_utf8().trim()
            )));
        }
        Ok(())
    }
}

fn parse_squeue_ids(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_sbatch_job_id(line: &str) -> Option<i64> {
    // Expect message from sbatch like: "Submitted batch job 11".
    let marker = "job ";
    let idx = line.find(marker)?;
    let after_job = &line[idx + marker.len()..];
    after_job.trim().parse::<i64>().ok()
}
