// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::{ClientError, ClientResult};

/// Data-provider credentials forwarded to the remote worker inside the job
/// parameters. Looked up by the caller; this crate only transports them.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Job lifecycle state. Advisory: set by the remote worker, read by the
/// client; the worker is the only actor that moves a job between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Order in which the queue directories are probed on a status read.
    pub const PROBE_ORDER: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// The job document as written into the remote queue. Field set and nesting
/// are the wire contract with the remote worker; formatting is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    pub job_id: String,
    pub function: String,
    pub parameters: Value,
    pub status: JobStatus,
    pub submitted_time: String,
}

impl JobDocument {
    /// Build a fresh pending document: generates the job id, stamps the
    /// submission time and injects the credentials into the parameters.
    pub fn new(
        function: &str,
        parameters: Value,
        credentials: &Credentials,
    ) -> ClientResult<Self> {
        if function.trim().is_empty() {
            return Err(ClientError::InvalidFunction);
        }
        let Value::Object(mut params) = parameters else {
            return Err(ClientError::InvalidParameters);
        };
        params.insert(
            "credentials".to_string(),
            serde_json::to_value(credentials)?,
        );

        Ok(Self {
            job_id: generate_job_id(function),
            function: function.to_string(),
            parameters: Value::Object(params),
            status: JobStatus::Pending,
            submitted_time: Local::now().to_rfc3339(),
        })
    }
}

/// Compose a queue-unique job id from the function name, a timestamp and a
/// random hex suffix, e.g. `polar_circle_20240105_121500_a3f29c01d4e88b02`.
/// Burst submissions share one timestamp stem, so the suffix alone must
/// carry collision resistance; 64 bits keeps the dup probability across ten
/// thousand ids below 1e-11.
pub fn generate_job_id(function: &str) -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

    let mut rng = rand::rng();
    let suffix: String = (0..16)
        .map(|_| {
            let idx = rng.random_range(0..16u8);
            char::from_digit(idx as u32, 16).unwrap_or('0')
        })
        .collect();

    format!("{}_{}_{}", function, stamp, suffix)
}

/// A job id is used verbatim as a filename stem and a result-directory name
/// on a shared host, so it must never be able to escape its own namespace.
pub fn validate_job_id(job_id: &str) -> ClientResult<()> {
    let ok = !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ClientError::InvalidJobId(job_id.to_string()))
    }
}
