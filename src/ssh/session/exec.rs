// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use russh::ChannelMsg;

use super::SessionManager;
use crate::ports::{ExecCapture, RemoteExec};

fn handle_capture_message(
    msg: &ChannelMsg,
    out: &mut Vec<u8>,
    err: &mut Vec<u8>,
    code: &mut i32,
) -> bool {
    match msg {
        ChannelMsg::Data { data } => {
            out.extend_from_slice(data);
            false
        }
        ChannelMsg::ExtendedData { data, ext: 1 } => {
            err.extend_from_slice(data);
            false
        }
        ChannelMsg::ExitStatus { exit_status } => {
            *code = *exit_status as i32;
            false
        }
        ChannelMsg::Close => true,
        _ => false,
    }
}

impl SessionManager {
    // Execute command on the compute host, retrieving stdout, stderr and
    // exit code as output
    pub async fn run_capture(&self, cmd: &str) -> Result<ExecCapture> {
        let guard = self.compute.lock().await;
        let handle = guard.as_ref().ok_or_else(|| anyhow!("SSH handle lost"))?;
        let mut chan = handle.channel_open_session().await?;
        log::debug!("executing '{}'", cmd);
        chan.exec(true, cmd).await.context("exec request")?;
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut code: i32 = 0;
        loop {
            let Some(msg) = chan.wait().await else {
                break;
            };
            if handle_capture_message(&msg, &mut out, &mut err, &mut code) {
                break;
            }
        }

        let _ = chan.close().await;
        Ok(ExecCapture {
            stdout: out,
            stderr: err,
            exit_code: code,
        })
    }
}

#[async_trait]
impl RemoteExec for SessionManager {
    async fn exec_capture(&self, command: &str) -> Result<ExecCapture> {
        self.run_capture(command).await
    }
}
