// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::control::{AllowedIpsDump, PeerControl};
use crate::error::ControlError;

/// Peer control backed by the `wg` command-line tool.
#[derive(Debug, Clone)]
pub struct WgCommandControl {
	binary: PathBuf,
	interface: String,
	timeout: Duration,
}

/// Captured result of one successful invocation.
struct WgOutput {
	stdout: String,
}

impl WgCommandControl {
	pub fn new(binary: impl Into<PathBuf>, interface: impl Into<String>, timeout: Duration) -> Self {
		Self {
			binary: binary.into(),
			interface: interface.into(),
			timeout,
		}
	}

	fn set_args(&self, public_key: &str, allowed_ips: &str) -> Vec<String> {
		vec![
			"set".to_string(),
			self.interface.clone(),
			"peer".to_string(),
			public_key.to_string(),
			"allowed-ips".to_string(),
			allowed_ips.to_string(),
		]
	}

	fn remove_args(&self, public_key: &str) -> Vec<String> {
		vec![
			"set".to_string(),
			self.interface.clone(),
			"peer".to_string(),
			public_key.to_string(),
			"remove".to_string(),
		]
	}

	fn show_args(&self) -> Vec<String> {
		vec![
			"show".to_string(),
			self.interface.clone(),
			"allowed-ips".to_string(),
		]
	}

	/// Runs `wg` with `args`, bounded by the configured timeout.
	///
	/// The child is killed if the timeout fires. On failure the error carries
	/// stdout and stderr combined.
	async fn run(&self, args: &[String]) -> Result<WgOutput, ControlError> {
		let command = format!("{} {}", self.binary.display(), args.join(" "));

		let mut cmd = Command::new(&self.binary);
		cmd.args(args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		trace!(cmd = %command, "running wg command");

		let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
			Ok(result) => result.map_err(|e| {
				if e.kind() == std::io::ErrorKind::NotFound {
					warn!(binary = %self.binary.display(), "wg binary not found");
					ControlError::BinaryNotFound(self.binary.display().to_string())
				} else {
					ControlError::Io(e)
				}
			})?,
			Err(_) => {
				return Err(ControlError::Timeout {
					command,
					timeout: self.timeout,
				});
			}
		};

		let stdout = String::from_utf8_lossy(&output.stdout).to_string();

		if output.status.success() {
			Ok(WgOutput { stdout })
		} else {
			let stderr = String::from_utf8_lossy(&output.stderr);
			let combined = format!("{stdout}{stderr}").trim().to_string();
			Err(ControlError::CommandFailed {
				command,
				status: output.status.to_string(),
				output: combined,
			})
		}
	}
}

#[async_trait]
impl PeerControl for WgCommandControl {
	fn interface(&self) -> &str {
		&self.interface
	}

	async fn set_peer(&self, public_key: &str, allowed_ips: &str) -> Result<(), ControlError> {
		self.run(&self.set_args(public_key, allowed_ips)).await?;
		debug!(interface = %self.interface, %public_key, %allowed_ips, "wg set applied");
		Ok(())
	}

	async fn remove_peer(&self, public_key: &str) -> Result<(), ControlError> {
		// `wg set ... remove` exits zero for a key that is not configured.
		self.run(&self.remove_args(public_key)).await?;
		debug!(interface = %self.interface, %public_key, "wg remove applied");
		Ok(())
	}

	async fn list_allowed_ips(&self) -> Result<AllowedIpsDump, ControlError> {
		let output = self.run(&self.show_args()).await?;
		Ok(AllowedIpsDump::new(output.stdout))
	}
}
