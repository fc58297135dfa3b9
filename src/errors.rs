// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use thiserror::Error as ThisError;

/// Error taxonomy for caller-facing operations. Every operation either
/// returns a usable value or one of these; transport internals (anyhow)
/// are converted at the operation boundary.
#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("not connected; call connect() first")]
    NotConnected,

    #[error("connection failed: {0}")]
    Connection(anyhow::Error),

    #[error("remote command failed: {0}")]
    Exec(anyhow::Error),

    #[error("job submission rejected by remote write: {stderr}")]
    SubmissionRejected { stderr: String },

    #[error("malformed job document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("invalid job id {0:?}")]
    InvalidJobId(String),

    #[error("function name must be non-empty")]
    InvalidFunction,

    #[error("job parameters must be a JSON object")]
    InvalidParameters,

    #[error("batch scheduler command failed: {0}")]
    Scheduler(String),

    #[error("remote result directory does not exist: {0}")]
    ResultsMissing(String),

    #[error("no artifacts could be retrieved from {0}")]
    NoArtifacts(String),

    #[error("transfer failed: {0}")]
    Transfer(anyhow::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
