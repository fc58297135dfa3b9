// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::StatusCode;
use std::path::Path;
use tokio::fs as tokiofs;
use tokio::io::AsyncWriteExt;

use super::SessionManager;
use crate::ports::{RemoteEntry, RemoteFileSystem};

impl SessionManager {
    /// Open a fresh SFTP subsystem channel on the compute hop. Channels are
    /// cheap relative to the transfers they carry, so one per operation
    /// keeps the state handling simple.
    async fn sftp(&self) -> Result<SftpSession> {
        let guard = self.compute.lock().await;
        let handle = guard
            .as_ref()
            .ok_or_else(|| anyhow!("SSH handle lost before opening SFTP"))?;
        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        Ok(sftp)
    }
}

#[async_trait]
impl RemoteFileSystem for SessionManager {
    async fn dir_exists(&self, path: &str) -> Result<bool> {
        let sftp = self.sftp().await?;
        match sftp.metadata(path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(russh_sftp::client::error::Error::Status(ref estatus))
                if estatus.status_code == StatusCode::NoSuchFile =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let sftp = self.sftp().await?;
        let entries = sftp.read_dir(path).await?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let is_dir = entry.metadata().is_dir();
                RemoteEntry {
                    name: entry.file_name(),
                    is_dir,
                }
            })
            .collect())
    }

    async fn download_file(&self, remote: &str, local: &Path) -> Result<()> {
        let sftp = self.sftp().await?;
        if let Some(parent) = local.parent() {
            tokiofs::create_dir_all(parent).await?;
        }
        let mut rfile = sftp.open(remote).await?;
        let mut lfile = tokiofs::File::create(local).await?;
        tokio::io::copy(&mut rfile, &mut lfile).await?;
        lfile.flush().await?;
        Ok(())
    }
}
