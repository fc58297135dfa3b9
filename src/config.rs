// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

const APP_DIR_NAME: &str = "satproc";
const CONFIG_FILE_NAME: &str = "satproc.toml";
const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_WORKER_JOB_NAME: &str = "satproc_job";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_KEEPALIVE_SECS: u64 = 15;

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    gateway_host: Option<String>,
    gateway_port: Option<u16>,
    compute_host: Option<String>,
    compute_port: Option<u16>,
    remote_base_path: Option<String>,
    worker_job_name: Option<String>,
    poll_interval_secs: Option<u64>,
    keepalive_secs: Option<u64>,
    identity_path: Option<String>,
}

/// Connection and queue settings for one cluster. Credentials are kept out
/// of here on purpose; they are supplied per-session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub gateway_host: String,
    pub gateway_port: u16,
    pub compute_host: String,
    pub compute_port: u16,
    /// Remote directory holding `jobs/`, `results/` and `sbatch/`.
    pub remote_base_path: String,
    pub worker_job_name: String,
    pub poll_interval_secs: u64,
    pub keepalive_secs: u64,
    pub identity_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub gateway_host: Option<String>,
    pub gateway_port: Option<u16>,
    pub compute_host: Option<String>,
    pub compute_port: Option<u16>,
    pub remote_base_path: Option<String>,
    pub worker_job_name: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub keepalive_secs: Option<u64>,
    pub identity_path: Option<PathBuf>,
}

pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<ClientConfig> {
    let required = config_path_override.is_some();
    let config_path = match config_path_override {
        Some(path) => Some(expand_path(path)),
        None => default_config_path().ok(),
    };

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };

    let gateway_host = overrides
        .gateway_host
        .or(file_config.gateway_host)
        .context("gateway_host is not configured")?;
    let compute_host = overrides
        .compute_host
        .or(file_config.compute_host)
        .context("compute_host is not configured")?;
    let remote_base_path = overrides
        .remote_base_path
        .or(file_config.remote_base_path)
        .context("remote_base_path is not configured")?;

    let identity_path = overrides
        .identity_path
        .or_else(|| file_config.identity_path.map(PathBuf::from))
        .map(expand_path);

    Ok(ClientConfig {
        gateway_host,
        gateway_port: overrides
            .gateway_port
            .or(file_config.gateway_port)
            .unwrap_or(DEFAULT_SSH_PORT),
        compute_host,
        compute_port: overrides
            .compute_port
            .or(file_config.compute_port)
            .unwrap_or(DEFAULT_SSH_PORT),
        remote_base_path,
        worker_job_name: overrides
            .worker_job_name
            .or(file_config.worker_job_name)
            .unwrap_or_else(|| DEFAULT_WORKER_JOB_NAME.to_string()),
        poll_interval_secs: overrides
            .poll_interval_secs
            .or(file_config.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        keepalive_secs: overrides
            .keepalive_secs
            .or(file_config.keepalive_secs)
            .unwrap_or(DEFAULT_KEEPALIVE_SECS),
        identity_path,
        config_path,
    })
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
