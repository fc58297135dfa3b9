// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

mod queue_store;
mod remote_exec;
mod remote_fs;
mod scheduler;

pub use queue_store::QueueStore;
pub use remote_exec::{ExecCapture, RemoteExec};
pub use remote_fs::{RemoteEntry, RemoteFileSystem};
pub use scheduler::{BatchScheduler, WorkerSubmission};
