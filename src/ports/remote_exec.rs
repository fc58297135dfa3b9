// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ExecCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ExecCapture {
    pub fn stdout_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Synchronous remote command execution boundary: send a shell command,
/// block until the remote process exits, get captured output back.
#[async_trait]
pub trait RemoteExec: Send + Sync {
    async fn exec_capture(&self, command: &str) -> Result<ExecCapture>;
}
