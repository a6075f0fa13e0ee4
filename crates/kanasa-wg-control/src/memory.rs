// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::control::{AllowedIpsDump, PeerControl};
use crate::error::ControlError;

/// Number of calls each operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
	pub set: usize,
	pub remove: usize,
	pub list: usize,
}

impl CallCounts {
	pub fn total(&self) -> usize {
		self.set + self.remove + self.list
	}
}

/// In-process peer table with the same semantics as the `wg` backend.
///
/// Used for dry-run deployments, where nothing on the host is touched, and
/// as a stand-in interface in tests.
#[derive(Debug)]
pub struct MemoryPeerControl {
	interface: String,
	peers: Mutex<BTreeMap<String, String>>,
	set_calls: AtomicUsize,
	remove_calls: AtomicUsize,
	list_calls: AtomicUsize,
}

impl MemoryPeerControl {
	pub fn new(interface: impl Into<String>) -> Self {
		Self {
			interface: interface.into(),
			peers: Mutex::new(BTreeMap::new()),
			set_calls: AtomicUsize::new(0),
			remove_calls: AtomicUsize::new(0),
			list_calls: AtomicUsize::new(0),
		}
	}

	/// Seed the table with existing peers.
	pub fn with_peers<I, K, V>(interface: impl Into<String>, peers: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut control = Self::new(interface);
		let table = peers
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		control.peers = Mutex::new(table);
		control
	}

	pub fn call_counts(&self) -> CallCounts {
		CallCounts {
			set: self.set_calls.load(Ordering::SeqCst),
			remove: self.remove_calls.load(Ordering::SeqCst),
			list: self.list_calls.load(Ordering::SeqCst),
		}
	}

	/// Snapshot of the table, for inspection.
	pub async fn peers(&self) -> BTreeMap<String, String> {
		self.peers.lock().await.clone()
	}
}

/// Formats a `wg set` allowed-ips argument the way `wg show` prints it:
/// space separated, `(none)` when empty.
fn render_allowed_ips(ips: &str) -> String {
	let rendered: Vec<&str> = ips
		.split(',')
		.map(str::trim)
		.filter(|ip| !ip.is_empty())
		.collect();
	if rendered.is_empty() {
		"(none)".to_string()
	} else {
		rendered.join(" ")
	}
}

#[async_trait]
impl PeerControl for MemoryPeerControl {
	fn interface(&self) -> &str {
		&self.interface
	}

	async fn set_peer(&self, public_key: &str, allowed_ips: &str) -> Result<(), ControlError> {
		self.set_calls.fetch_add(1, Ordering::SeqCst);

		if public_key.is_empty() {
			return Err(ControlError::Rejected("empty public key".to_string()));
		}

		self.peers
			.lock()
			.await
			.insert(public_key.to_string(), allowed_ips.to_string());
		debug!(interface = %self.interface, %public_key, %allowed_ips, "memory peer set");
		Ok(())
	}

	async fn remove_peer(&self, public_key: &str) -> Result<(), ControlError> {
		self.remove_calls.fetch_add(1, Ordering::SeqCst);

		let removed = self.peers.lock().await.remove(public_key).is_some();
		debug!(interface = %self.interface, %public_key, removed, "memory peer remove");
		Ok(())
	}

	async fn list_allowed_ips(&self) -> Result<AllowedIpsDump, ControlError> {
		self.list_calls.fetch_add(1, Ordering::SeqCst);

		let peers = self.peers.lock().await;
		let raw: String = peers
			.iter()
			.map(|(key, ips)| format!("{key}\t{}\n", render_allowed_ips(ips)))
			.collect();
		Ok(AllowedIpsDump::new(raw))
	}
}
