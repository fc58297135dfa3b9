// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

mod error;
mod session;

pub use error::AuthenticationFailure;
pub use session::{SessionManager, SshParams};
