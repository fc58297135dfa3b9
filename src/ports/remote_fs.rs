// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read-side view of the remote filesystem used for artifact retrieval.
/// Backed by an SFTP subsystem in production.
#[async_trait]
pub trait RemoteFileSystem: Send + Sync {
    async fn dir_exists(&self, path: &str) -> Result<bool>;

    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Copy one remote file to `local`, creating parent directories.
    async fn download_file(&self, remote: &str, local: &Path) -> Result<()>;
}
