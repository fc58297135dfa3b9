// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

//! Client library for the satellite-processing HPC service.
//!
//! The compute cluster is only reachable through a gateway host, so the
//! transport establishes two nested SSH sessions (gateway, then a
//! `direct-tcpip` tunnel to the submit node). Jobs are tracked through a
//! file-based queue on the remote filesystem: the client writes a job
//! document into `jobs/pending/` and the remote worker moves it through
//! `running`, `completed` or `failed`. Results land under
//! `results/<job_id>/` and are pulled back over SFTP.

pub mod cleanup;
pub mod client;
pub mod config;
pub mod errors;
pub mod job;
pub mod launcher;
pub mod monitor;
pub mod ports;
pub mod queue;
pub mod retrieve;
mod shell;
pub mod slurm;
pub mod ssh;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::Client;
pub use config::{ClientConfig, Overrides};
pub use errors::{ClientError, ClientResult};
pub use job::{Credentials, JobDocument, JobStatus};
pub use monitor::{PollOptions, WaitOutcome};
pub use retrieve::PullReport;
pub use ssh::{SessionManager, SshParams};
