// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::ControlError;

/// Capability boundary over the managed interface's peer table.
///
/// The interface is the source of truth; implementations hold no cached
/// copy of its state.
#[async_trait]
pub trait PeerControl: Send + Sync {
	/// Name of the managed interface, for logging.
	fn interface(&self) -> &str;

	/// Create or update the peer so `public_key` maps to `allowed_ips`.
	/// Repeating the call with the same arguments converges to the same state.
	async fn set_peer(&self, public_key: &str, allowed_ips: &str) -> Result<(), ControlError>;

	/// Delete any entry for `public_key`. Removing an absent peer succeeds.
	async fn remove_peer(&self, public_key: &str) -> Result<(), ControlError>;

	/// Dump the current public key to allowed-ips table.
	async fn list_allowed_ips(&self) -> Result<AllowedIpsDump, ControlError>;
}

/// One row of an allowed-ips dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAllowedIps {
	pub public_key: String,
	pub allowed_ips: Vec<String>,
}

/// Raw allowed-ips table in `wg show <iface> allowed-ips` format:
/// one `<public key>\t<ip> <ip>...` line per peer, `(none)` when a peer has
/// no addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedIpsDump {
	raw: String,
}

impl AllowedIpsDump {
	pub fn new(raw: impl Into<String>) -> Self {
		Self { raw: raw.into() }
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Textual containment check used to confirm an added peer.
	///
	/// An empty key never matches.
	pub fn contains_key(&self, public_key: &str) -> bool {
		!public_key.is_empty() && self.raw.contains(public_key)
	}

	/// True when a row's key column equals `public_key` exactly.
	pub fn has_peer(&self, public_key: &str) -> bool {
		self.peers().iter().any(|p| p.public_key == public_key)
	}

	/// Parse the dump into rows. Blank lines are skipped.
	pub fn peers(&self) -> Vec<PeerAllowedIps> {
		self.raw
			.lines()
			.filter_map(|line| {
				let mut fields = line.split_whitespace();
				let public_key = fields.next()?.to_string();
				let allowed_ips = fields
					.filter(|ip| *ip != "(none)")
					.map(str::to_string)
					.collect();
				Some(PeerAllowedIps {
					public_key,
					allowed_ips,
				})
			})
			.collect()
	}
}
