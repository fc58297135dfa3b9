// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use russh::client::{AuthResult, Config};
use russh::keys::PrivateKeyWithHashAlg;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::error::AuthenticationFailure;

mod exec;
mod sftp;

/// Minimal russh client handler. We rely on default implementations.
/// TODO: add actual server key verification
#[derive(Clone, Debug, Default)]
struct ClientHandler;

impl russh::client::Handler for ClientHandler {
    type Error = anyhow::Error;
    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Parameters for the two-hop SSH connection. The compute host is only
/// reachable through the gateway; both hops authenticate with the same
/// identity (key-based preferred, password fallback).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SshParams {
    pub gateway_host: String,
    pub gateway_port: u16,
    pub username: String,
    pub compute_host: String,
    pub compute_port: u16,
    pub identity_path: Option<String>,
    pub password: Option<String>,
    /// Send TCP keepalives to keep long connections healthy.
    pub keepalive_secs: u64,
}

/// Manager that owns the nested gateway and compute SSH connections.
pub struct SessionManager {
    params: SshParams,
    config: Arc<Config>,
    // Command use is serialized through these mutexes; one session serves
    // one logical unit of work at a time.
    gateway: Arc<Mutex<Option<russh::client::Handle<ClientHandler>>>>,
    compute: Arc<Mutex<Option<russh::client::Handle<ClientHandler>>>>,
}

impl SessionManager {
    pub fn new(params: SshParams) -> Self {
        let cfg = Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            keepalive_interval: Some(Duration::from_secs(params.keepalive_secs)),
            channel_buffer_size: 64,
            window_size: 1024 * 1024,
            ..Default::default()
        };
        Self {
            params,
            config: Arc::new(cfg),
            gateway: Arc::new(Mutex::new(None)),
            compute: Arc::new(Mutex::new(None)),
        }
    }

    /// Establish gateway and compute sessions if they are not already live.
    /// The compute hop rides a `direct-tcpip` channel opened through the
    /// gateway, so no third connection or extra proxy hop is needed.
    pub async fn connect(&self) -> Result<()> {
        if !self.needs_connect().await {
            log::debug!(
                "connection to {}@{} already established",
                &self.params.username,
                &self.params.gateway_host
            );
            return Ok(());
        }

        log::info!(
            "connecting to gateway {}@{}:{}",
            &self.params.username,
            &self.params.gateway_host,
            self.params.gateway_port
        );
        let mut gateway = russh::client::connect(
            self.config.clone(),
            (self.params.gateway_host.as_str(), self.params.gateway_port),
            ClientHandler,
        )
        .await
        .context("gateway connect failed")?;
        self.authenticate(&mut gateway)
            .await
            .with_context(|| format!("authentication with {} failed", &self.params.gateway_host))?;

        log::info!(
            "tunnelling to compute host {}:{}",
            &self.params.compute_host,
            self.params.compute_port
        );
        let channel = gateway
            .channel_open_direct_tcpip(
                self.params.compute_host.clone(),
                self.params.compute_port as u32,
                "127.0.0.1".to_string(),
                0,
            )
            .await
            .context("failed to open tunnel to compute host")?;
        let mut compute =
            russh::client::connect_stream(self.config.clone(), channel.into_stream(), ClientHandler)
                .await
                .context("compute host connect failed")?;
        self.authenticate(&mut compute)
            .await
            .with_context(|| format!("authentication with {} failed", &self.params.compute_host))?;

        *self.gateway.lock().await = Some(gateway);
        *self.compute.lock().await = Some(compute);
        log::info!("successfully connected to compute host");
        Ok(())
    }

    /// Publickey first when an identity is configured, then password.
    async fn authenticate(
        &self,
        handle: &mut russh::client::Handle<ClientHandler>,
    ) -> Result<()> {
        if let Some(path) = &self.params.identity_path {
            match russh::keys::load_secret_key(path, None) {
                Ok(key) => {
                    let key = Arc::new(key);
                    // Prefer SHA-256 for RSA if applicable (ignored for non-RSA keys)
                    let pk = PrivateKeyWithHashAlg::new(
                        key,
                        handle.best_supported_rsa_hash().await?.flatten(),
                    );
                    let result = handle
                        .authenticate_publickey(self.params.username.clone(), pk)
                        .await?;
                    if matches!(result, AuthResult::Success) {
                        return Ok(());
                    }
                    log::debug!("public key rejected, falling back to password");
                }
                Err(e) => {
                    log::warn!("failed to load secret key at {}: {}", path, e);
                }
            }
        }

        let Some(password) = self.params.password.clone() else {
            return Err(AuthenticationFailure.into());
        };
        let result = handle
            .authenticate_password(self.params.username.clone(), password)
            .await?;
        match result {
            AuthResult::Success => Ok(()),
            AuthResult::Failure { .. } => Err(AuthenticationFailure.into()),
        }
    }

    pub async fn needs_connect(&self) -> bool {
        let gateway = self.gateway.lock().await;
        let compute = self.compute.lock().await;
        match (gateway.as_ref(), compute.as_ref()) {
            (Some(g), Some(c)) => g.is_closed() || c.is_closed(),
            _ => true,
        }
    }

    /// Drop both channels, compute hop first. Remote-side cancellation is
    /// the lifecycle cleaner's job and happens before this is called.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.compute.lock().await.take() {
            let _ = handle
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await;
        }
        if let Some(handle) = self.gateway.lock().await.take() {
            let _ = handle
                .disconnect(russh::Disconnect::ByApplication, "", "en")
                .await;
        }
    }
}
