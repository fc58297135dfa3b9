// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use crate::cleanup::{cancel_worker_jobs, remove_job_traces};
use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::job::{validate_job_id, Credentials, JobDocument};
use crate::launcher::ensure_worker_running;
use crate::monitor::{wait_for, PollOptions, WaitOutcome, DEFAULT_WAIT_TIMEOUT};
use crate::ports::{BatchScheduler, QueueStore, RemoteExec, RemoteFileSystem};
use crate::queue::RemoteDirQueue;
use crate::retrieve::{pull_all, PullReport};
use crate::slurm::SlurmScheduler;
use crate::ssh::{SessionManager, SshParams};

/// Wired-up adapters for one live session. All handles share the underlying
/// SSH transport.
#[derive(Clone)]
struct Connected {
    session: Option<Arc<SessionManager>>,
    exec: Arc<dyn RemoteExec>,
    fs: Arc<dyn RemoteFileSystem>,
    queue: Arc<dyn QueueStore>,
    scheduler: Arc<dyn BatchScheduler>,
}

/// Caller-facing orchestration client. One instance manages one session to
/// one cluster; every operation other than `connect` requires a live
/// session and fails fast with `NotConnected` otherwise.
pub struct Client {
    config: ClientConfig,
    credentials: Credentials,
    state: Mutex<Option<Connected>>,
}

impl Client {
    pub fn new(config: ClientConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
            state: Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_testing(
        config: ClientConfig,
        credentials: Credentials,
        exec: Arc<dyn RemoteExec>,
        fs: Arc<dyn RemoteFileSystem>,
        queue: Arc<dyn QueueStore>,
        scheduler: Arc<dyn BatchScheduler>,
    ) -> Self {
        Self {
            config,
            credentials,
            state: Mutex::new(Some(Connected {
                session: None,
                exec,
                fs,
                queue,
                scheduler,
            })),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Establish the two-hop session and wire the queue and scheduler
    /// adapters over it. Idempotent while the session stays healthy.
    pub async fn connect(&self) -> ClientResult<()> {
        if self.is_connected().await {
            return Ok(());
        }

        let params = SshParams {
            gateway_host: self.config.gateway_host.clone(),
            gateway_port: self.config.gateway_port,
            username: self.credentials.username.clone(),
            compute_host: self.config.compute_host.clone(),
            compute_port: self.config.compute_port,
            identity_path: self
                .config
                .identity_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            password: Some(self.credentials.password.clone()),
            keepalive_secs: self.config.keepalive_secs,
        };
        let session = Arc::new(SessionManager::new(params));
        session.connect().await.map_err(ClientError::Connection)?;

        let exec: Arc<dyn RemoteExec> = session.clone();
        let fs: Arc<dyn RemoteFileSystem> = session.clone();
        let queue = Arc::new(RemoteDirQueue::new(
            exec.clone(),
            self.config.remote_base_path.clone(),
        ));
        let scheduler = Arc::new(SlurmScheduler::new(
            exec.clone(),
            self.credentials.username.clone(),
            self.config.worker_job_name.clone(),
            self.config.remote_base_path.clone(),
        ));

        *self.state.lock().await = Some(Connected {
            session: Some(session),
            exec,
            fs,
            queue,
            scheduler,
        });
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        let state = self.state.lock().await;
        match state.as_ref() {
            Some(conn) => match &conn.session {
                Some(session) => !session.needs_connect().await,
                None => true,
            },
            None => false,
        }
    }

    async fn connected(&self) -> ClientResult<Connected> {
        self.state
            .lock()
            .await
            .clone()
            .ok_or(ClientError::NotConnected)
    }

    /// Write a pending job document into the remote queue, then make sure a
    /// worker batch job is draining it. The worker guard is best-effort:
    /// the document is already queued, so a failed guard only delays
    /// processing until the next submission.
    pub async fn submit_job(&self, function: &str, parameters: Value) -> ClientResult<JobDocument> {
        let conn = self.connected().await?;
        let doc = JobDocument::new(function, parameters, &self.credentials)?;
        conn.queue.submit(&doc).await?;

        if let Err(e) = ensure_worker_running(conn.scheduler.as_ref()).await {
            log::warn!("worker guard failed after submitting {}: {}", doc.job_id, e);
        }
        Ok(doc)
    }

    /// Current queue document for the job, or `None` when it is not visible
    /// in any queue directory.
    pub async fn get_job_status(&self, job_id: &str) -> ClientResult<Option<JobDocument>> {
        let conn = self.connected().await?;
        conn.queue.get(job_id).await
    }

    /// Poll until the job reaches a terminal state or the timeout passes.
    /// Distinct document snapshots are forwarded on `updates`.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        timeout: Option<Duration>,
        updates: Option<&mpsc::Sender<JobDocument>>,
    ) -> ClientResult<WaitOutcome> {
        let conn = self.connected().await?;
        let opts = PollOptions {
            interval: Duration::from_secs(self.config.poll_interval_secs),
            timeout: timeout.unwrap_or(DEFAULT_WAIT_TIMEOUT),
        };
        wait_for(conn.queue.as_ref(), job_id, opts, updates).await
    }

    /// Mirror `results/<job_id>/` into `local_dir`.
    pub async fn download_results(
        &self,
        job_id: &str,
        local_dir: &Path,
    ) -> ClientResult<PullReport> {
        let conn = self.connected().await?;
        validate_job_id(job_id)?;
        let result_root = format!(
            "{}/results/{}",
            self.config.remote_base_path.trim_end_matches('/'),
            job_id
        );
        pull_all(conn.fs.as_ref(), &result_root, local_dir).await
    }

    /// Delete the job's remote traces. Call after results are safely local.
    pub async fn cleanup_job(&self, job_id: &str) -> ClientResult<()> {
        let conn = self.connected().await?;
        remove_job_traces(
            conn.exec.as_ref(),
            &self.config.remote_base_path,
            job_id,
        )
        .await
    }

    /// Tear the session down. Cancels all of this identity's worker batch
    /// jobs first so an exiting client does not leave a worker burning
    /// allocation; both steps are best-effort.
    pub async fn disconnect(&self) {
        let Some(conn) = self.state.lock().await.take() else {
            return;
        };
        if let Err(e) = cancel_worker_jobs(conn.scheduler.as_ref()).await {
            log::warn!("failed to cancel worker jobs on disconnect: {}", e);
        }
        if let Some(session) = conn.session {
            session.shutdown().await;
        }
        log::info!("disconnected from {}", self.config.compute_host);
    }
}
