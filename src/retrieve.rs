// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use crate::errors::{ClientError, ClientResult};
use crate::ports::RemoteFileSystem;

/// What `pull_all` managed to move. Retrieval succeeded iff at least one
/// file landed locally; per-file failures are recorded, not fatal.
#[derive(Debug, Default)]
pub struct PullReport {
    pub copied: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Mirror the remote result tree under `local_root`, preserving relative
/// paths. A missing result directory is a hard failure; so is ending up
/// with zero files copied. Individual flaky transfers inside the set are
/// logged and skipped so one bad file does not force a job re-run.
pub async fn pull_all(
    fs: &dyn RemoteFileSystem,
    result_root: &str,
    local_root: &Path,
) -> ClientResult<PullReport> {
    let exists = fs
        .dir_exists(result_root)
        .await
        .map_err(ClientError::Transfer)?;
    if !exists {
        return Err(ClientError::ResultsMissing(result_root.to_string()));
    }

    let result_root = result_root.trim_end_matches('/');
    let mut report = PullReport::default();
    let mut stack: Vec<(String, PathBuf)> = vec![(result_root.to_string(), local_root.to_path_buf())];

    while let Some((remote_base, local_base)) = stack.pop() {
        let entries = fs
            .read_dir(&remote_base)
            .await
            .map_err(ClientError::Transfer)?;
        for entry in entries {
            let remote_child = format!("{}/{}", remote_base, entry.name);
            let local_child = local_base.join(&entry.name);
            if entry.is_dir {
                stack.push((remote_child, local_child));
                continue;
            }
            match fs.download_file(&remote_child, &local_child).await {
                Ok(()) => report.copied.push(local_child),
                Err(e) => {
                    log::warn!("failed to retrieve {}: {}", remote_child, e);
                    report.failed.push(remote_child);
                }
            }
        }
    }

    if report.copied.is_empty() {
        return Err(ClientError::NoArtifacts(result_root.to_string()));
    }
    log::info!(
        "retrieved {} file(s) into {} ({} failed)",
        report.copied.len(),
        local_root.display(),
        report.failed.len()
    );
    Ok(report)
}
