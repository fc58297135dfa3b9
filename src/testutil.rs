// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Shared fakes for exercising the port traits without a live cluster.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::errors::{ClientError, ClientResult};
use crate::job::{JobDocument, JobStatus};
use crate::ports::{
    BatchScheduler, ExecCapture, QueueStore, RemoteEntry, RemoteExec, RemoteFileSystem,
    WorkerSubmission,
};

pub(crate) fn capture(stdout: &str, stderr: &str, code: i32) -> ExecCapture {
    ExecCapture {
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
        exit_code: code,
    }
}

pub(crate) fn sample_doc(job_id: &str, status: JobStatus) -> JobDocument {
    JobDocument {
        job_id: job_id.to_string(),
        function: "polar_circle".to_string(),
        parameters: json!({"date": "2024-01-05", "username": "observer", "password": "pw"}),
        status,
        submitted_time: "2024-01-05T10:00:00+00:00".to_string(),
    }
}

/// Remote executor that replays a fixed script of responses and records
/// every command it was asked to run.
pub(crate) struct ScriptedExec {
    responses: Mutex<Vec<anyhow::Result<ExecCapture>>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedExec {
    pub(crate) fn new(mut responses: Vec<anyhow::Result<ExecCapture>>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteExec for ScriptedExec {
    async fn exec_capture(&self, command: &str) -> anyhow::Result<ExecCapture> {
        self.commands.lock().unwrap().push(command.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| panic!("unscripted command: {command:?}"))
    }
}

/// Queue fake that yields a scripted series of lookups, repeating the final
/// element once the script runs out.
pub(crate) struct SequenceQueue {
    snapshots: Vec<Option<JobDocument>>,
    cursor: Mutex<usize>,
    fail_first: Mutex<bool>,
}

impl SequenceQueue {
    pub(crate) fn new(snapshots: Vec<Option<JobDocument>>) -> Self {
        assert!(!snapshots.is_empty(), "sequence queue needs snapshots");
        Self {
            snapshots,
            cursor: Mutex::new(0),
            fail_first: Mutex::new(false),
        }
    }

    pub(crate) fn failing_then(snapshots: Vec<Option<JobDocument>>) -> Self {
        let queue = Self::new(snapshots);
        *queue.fail_first.lock().unwrap() = true;
        queue
    }
}

#[async_trait]
impl QueueStore for SequenceQueue {
    async fn submit(&self, _doc: &JobDocument) -> ClientResult<()> {
        Ok(())
    }

    async fn get(&self, _job_id: &str) -> ClientResult<Option<JobDocument>> {
        let mut fail = self.fail_first.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(ClientError::Exec(anyhow::anyhow!(
                "transient probe failure"
            )));
        }
        let mut cursor = self.cursor.lock().unwrap();
        let snapshot = self.snapshots[*cursor].clone();
        if *cursor + 1 < self.snapshots.len() {
            *cursor += 1;
        }
        Ok(snapshot)
    }
}

#[derive(Default)]
struct ClusterState {
    // Full remote path -> file content, covering both queue documents and
    // result files.
    files: BTreeMap<String, Vec<u8>>,
    fail_downloads: HashSet<String>,
    fail_exec: bool,
    commands: Vec<String>,
}

/// In-memory stand-in for the remote cluster filesystem. Implements the
/// exec port by interpreting the small command vocabulary the client emits
/// (printf-redirect, cat, rm) and the file-system port directly over the
/// stored tree.
pub(crate) struct FakeCluster {
    base_path: String,
    state: Mutex<ClusterState>,
}

impl FakeCluster {
    pub(crate) fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
            state: Mutex::new(ClusterState::default()),
        }
    }

    fn queue_doc_path(&self, dir: &str, job_id: &str) -> String {
        format!("{}/jobs/{}/{}.json", self.base_path, dir, job_id)
    }

    pub(crate) fn put_result(&self, job_id: &str, relpath: &str, bytes: &[u8]) {
        let path = format!("{}/results/{}/{}", self.base_path, job_id, relpath);
        self.state.lock().unwrap().files.insert(path, bytes.to_vec());
    }

    pub(crate) fn put_queue_doc(&self, dir: &str, job_id: &str, content: &str) {
        let path = self.queue_doc_path(dir, job_id);
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path, content.as_bytes().to_vec());
    }

    pub(crate) fn remove_queue_doc(&self, dir: &str, job_id: &str) {
        let path = self.queue_doc_path(dir, job_id);
        self.state.lock().unwrap().files.remove(&path);
    }

    pub(crate) fn has_queue_doc(&self, dir: &str, job_id: &str) -> bool {
        let path = self.queue_doc_path(dir, job_id);
        self.state.lock().unwrap().files.contains_key(&path)
    }

    pub(crate) fn queue_dir_job_ids(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/jobs/{}/", self.base_path, dir);
        self.state
            .lock()
            .unwrap()
            .files
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|name| name.trim_end_matches(".json").to_string())
            .collect()
    }

    pub(crate) fn has_result_dir(&self, job_id: &str) -> bool {
        let prefix = format!("{}/results/{}/", self.base_path, job_id);
        self.state
            .lock()
            .unwrap()
            .files
            .keys()
            .any(|k| k.starts_with(&prefix))
    }

    pub(crate) fn fail_download(&self, remote_path: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_downloads
            .insert(remote_path.to_string());
    }

    pub(crate) fn fail_exec(&self) {
        self.state.lock().unwrap().fail_exec = true;
    }

    pub(crate) fn exec_commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    fn interpret(&self, command: &str) -> ExecCapture {
        let mut state = self.state.lock().unwrap();
        if let Some(rest) = command.strip_prefix("rm -rf ") {
            let target = sh_unquote(rest);
            let dir_prefix = format!("{}/", target);
            state
                .files
                .retain(|k, _| k != &target && !k.starts_with(&dir_prefix));
            return capture("", "", 0);
        }
        if let Some(rest) = command.strip_prefix("rm -f ") {
            let target = sh_unquote(rest);
            state.files.remove(&target);
            return capture("", "", 0);
        }
        if let Some(rest) = command.strip_prefix("cat ") {
            let target = sh_unquote(rest.trim_end_matches(" 2>/dev/null"));
            return match state.files.get(&target) {
                Some(bytes) => ExecCapture {
                    stdout: bytes.clone(),
                    stderr: Vec::new(),
                    exit_code: 0,
                },
                None => capture("", "", 1),
            };
        }
        if let Some(rest) = command.strip_prefix("printf '%s' ") {
            if let Some(split) = rest.rfind(" > ") {
                let content = sh_unquote(&rest[..split]);
                let target = sh_unquote(&rest[split + 3..]);
                state.files.insert(target, content.into_bytes());
                return capture("", "", 0);
            }
        }
        capture("", &format!("sh: command not understood: {command}"), 127)
    }
}

/// Reverse of the client's single-quote shell escaping.
fn sh_unquote(token: &str) -> String {
    let token = token.trim();
    let inner = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(token);
    inner.replace("'\\''", "'")
}

#[async_trait]
impl RemoteExec for FakeCluster {
    async fn exec_capture(&self, command: &str) -> anyhow::Result<ExecCapture> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_exec {
                anyhow::bail!("connection reset by peer");
            }
            state.commands.push(command.to_string());
        }
        Ok(self.interpret(command))
    }
}

#[async_trait]
impl RemoteFileSystem for FakeCluster {
    async fn dir_exists(&self, path: &str) -> anyhow::Result<bool> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let state = self.state.lock().unwrap();
        Ok(state.files.keys().any(|k| k.starts_with(&prefix)))
    }

    async fn read_dir(&self, path: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let state = self.state.lock().unwrap();
        let mut dirs = BTreeSet::new();
        let mut files = BTreeSet::new();
        for key in state.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((head, _)) => {
                    dirs.insert(head.to_string());
                }
                None => {
                    files.insert(rest.to_string());
                }
            }
        }
        let mut entries: Vec<RemoteEntry> = dirs
            .into_iter()
            .map(|name| RemoteEntry { name, is_dir: true })
            .collect();
        entries.extend(files.into_iter().map(|name| RemoteEntry {
            name,
            is_dir: false,
        }));
        Ok(entries)
    }

    async fn download_file(&self, remote: &str, local: &Path) -> anyhow::Result<()> {
        let bytes = {
            let state = self.state.lock().unwrap();
            if state.fail_downloads.contains(remote) {
                anyhow::bail!("injected transfer failure for {remote}");
            }
            state
                .files
                .get(remote)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such remote file: {remote}"))?
        };
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local, bytes)?;
        Ok(())
    }
}

/// Scheduler fake recording submissions and cancellations.
pub(crate) struct RecordingScheduler {
    jobs: Vec<String>,
    unconfirmed: bool,
    failing_cancels: HashSet<String>,
    submissions: Mutex<usize>,
    cancelled: Mutex<Vec<String>>,
}

impl RecordingScheduler {
    pub(crate) fn with_jobs(jobs: Vec<String>) -> Self {
        Self {
            jobs,
            unconfirmed: false,
            failing_cancels: HashSet::new(),
            submissions: Mutex::new(0),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn unconfirmed(mut self) -> Self {
        self.unconfirmed = true;
        self
    }

    pub(crate) fn failing_cancel(mut self, scheduler_id: &str) -> Self {
        self.failing_cancels.insert(scheduler_id.to_string());
        self
    }

    pub(crate) fn submissions(&self) -> usize {
        *self.submissions.lock().unwrap()
    }

    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchScheduler for RecordingScheduler {
    async fn list_worker_jobs(&self) -> ClientResult<Vec<String>> {
        Ok(self.jobs.clone())
    }

    async fn submit_worker(&self) -> ClientResult<WorkerSubmission> {
        *self.submissions.lock().unwrap() += 1;
        if self.unconfirmed {
            Ok(WorkerSubmission::Unconfirmed {
                output: "sbatch: error: submission not acknowledged".to_string(),
            })
        } else {
            Ok(WorkerSubmission::Accepted {
                scheduler_id: Some(4242),
            })
        }
    }

    async fn cancel(&self, scheduler_id: &str) -> ClientResult<()> {
        if self.failing_cancels.contains(scheduler_id) {
            return Err(ClientError::Scheduler(format!(
                "scancel {scheduler_id} failed: Invalid job id specified"
            )));
        }
        self.cancelled.lock().unwrap().push(scheduler_id.to_string());
        Ok(())
    }
}
