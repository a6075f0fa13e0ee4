// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interface control configuration: which backend drives the peer table and
//! how calls against it are bounded.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_INTERFACE: &str = "wg0";
const DEFAULT_WG_BINARY: &str = "wg";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which adapter implementation backs the peer table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlBackend {
	/// Shell out to the `wg` tool.
	#[default]
	Command,
	/// In-process table; nothing touches the host interface.
	Memory,
}

impl FromStr for ControlBackend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"command" | "wg" => Ok(ControlBackend::Command),
			"memory" | "dry-run" => Ok(ControlBackend::Memory),
			other => Err(format!(
				"unknown control backend '{other}' (expected command or memory)"
			)),
		}
	}
}

/// Interface control configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlConfig {
	pub backend: ControlBackend,
	pub interface: String,
	pub wg_binary: String,
	pub timeout_secs: u64,
	/// Run each add/remove sequence under one process-wide lock.
	pub serialize: bool,
	/// Re-read the peer table after a removal and require the key to be gone.
	pub verify_remove: bool,
}

impl ControlConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

impl Default for ControlConfig {
	fn default() -> Self {
		ControlConfigLayer::default().finalize()
	}
}

/// Control configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlConfigLayer {
	#[serde(default)]
	pub backend: Option<ControlBackend>,
	#[serde(default)]
	pub interface: Option<String>,
	#[serde(default)]
	pub wg_binary: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub serialize: Option<bool>,
	#[serde(default)]
	pub verify_remove: Option<bool>,
}

impl ControlConfigLayer {
	pub fn merge(&mut self, other: ControlConfigLayer) {
		if other.backend.is_some() {
			self.backend = other.backend;
		}
		if other.interface.is_some() {
			self.interface = other.interface;
		}
		if other.wg_binary.is_some() {
			self.wg_binary = other.wg_binary;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.serialize.is_some() {
			self.serialize = other.serialize;
		}
		if other.verify_remove.is_some() {
			self.verify_remove = other.verify_remove;
		}
	}

	pub fn finalize(self) -> ControlConfig {
		ControlConfig {
			backend: self.backend.unwrap_or_default(),
			interface: self
				.interface
				.unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
			wg_binary: self
				.wg_binary
				.unwrap_or_else(|| DEFAULT_WG_BINARY.to_string()),
			timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
			serialize: self.serialize.unwrap_or(true),
			verify_remove: self.verify_remove.unwrap_or(false),
		}
	}
}
