// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use thiserror::Error;

/// Failure of one call against the interface control mechanism.
///
/// The Display form includes the mechanism's raw output. It is meant for
/// server-side logs and must not be sent to callers.
#[derive(Debug, Error)]
pub enum ControlError {
	#[error("control binary not found: {0}")]
	BinaryNotFound(String),

	#[error("`{command}` exited with {status}: {output}")]
	CommandFailed {
		command: String,
		status: String,
		output: String,
	},

	#[error("`{command}` timed out after {timeout:?}")]
	Timeout { command: String, timeout: Duration },

	#[error("peer table rejected the request: {0}")]
	Rejected(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
