// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use kanasa_wg_control::PeerControl;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, instrument};

use crate::guard::Credential;
use crate::outcome::{
	OperationOutcome, OutcomeKind, ADD_VERIFICATION_FAILED, PEER_ADDED, PEER_REMOVED,
	REMOVE_FAILED, REMOVE_VERIFICATION_FAILED, SET_FAILED, VERIFY_UNAVAILABLE,
};
use crate::request::PeerMutationRequest;

/// Behavioural switches for [`PeerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
	/// Run each whole add/remove sequence under one lock.
	pub serialize: bool,
	/// Re-read the table after a removal and require the peer to be gone.
	pub verify_remove: bool,
}

impl Default for ServiceOptions {
	fn default() -> Self {
		Self {
			serialize: true,
			verify_remove: false,
		}
	}
}

/// Runs one add or remove: authorize, mutate, verify, report.
///
/// There are no retries and no rollback. A failed step leaves the interface
/// in whatever state that step produced.
pub struct PeerService {
	credential: Credential,
	control: Arc<dyn PeerControl>,
	options: ServiceOptions,
	gate: Option<Mutex<()>>,
}

impl PeerService {
	pub fn new(credential: Credential, control: Arc<dyn PeerControl>, options: ServiceOptions) -> Self {
		Self {
			credential,
			control,
			gate: options.serialize.then(|| Mutex::new(())),
			options,
		}
	}

	pub fn options(&self) -> ServiceOptions {
		self.options
	}

	pub fn interface(&self) -> &str {
		self.control.interface()
	}

	async fn enter(&self) -> Option<MutexGuard<'_, ()>> {
		match &self.gate {
			Some(gate) => Some(gate.lock().await),
			None => None,
		}
	}

	/// Add or update a peer and confirm it shows up in the allowed-ips table.
	#[instrument(skip_all, fields(op = "add", public_key = %request.public_key, interface = %self.interface()))]
	pub async fn add_peer(&self, request: &PeerMutationRequest) -> OperationOutcome {
		if !self.credential.authorize(&request.server_key) {
			return OperationOutcome::forbidden();
		}

		let public_key = request.public_key.as_str();
		if public_key.trim().is_empty() {
			return OperationOutcome::bad_request("public_key is required");
		}
		let Some(allowed_ips) = request.ip.as_deref().filter(|ip| !ip.trim().is_empty()) else {
			return OperationOutcome::bad_request("ip is required");
		};

		let _gate = self.enter().await;

		info!(%allowed_ips, "adding wg peer");

		if let Err(e) = self.control.set_peer(public_key, allowed_ips).await {
			error!(error = %e, "wg set failed");
			return OperationOutcome::failure(OutcomeKind::MutationFailed, SET_FAILED);
		}

		let dump = match self.control.list_allowed_ips().await {
			Ok(dump) => dump,
			Err(e) => {
				error!(error = %e, "wg verify failed");
				return OperationOutcome::failure(
					OutcomeKind::VerificationUnavailable,
					VERIFY_UNAVAILABLE,
				);
			}
		};

		if !dump.contains_key(public_key) {
			error!("peer not found after wg set");
			return OperationOutcome::failure(
				OutcomeKind::VerificationFailed,
				ADD_VERIFICATION_FAILED,
			);
		}

		debug!(peers = dump.peers().len(), "peer confirmed in allowed-ips table");
		info!("wg peer added");
		OperationOutcome::success(PEER_ADDED)
	}

	/// Remove a peer. The key is trimmed before it reaches the interface.
	#[instrument(skip_all, fields(op = "remove", public_key = %request.public_key.trim(), interface = %self.interface()))]
	pub async fn remove_peer(&self, request: &PeerMutationRequest) -> OperationOutcome {
		if !self.credential.authorize(&request.server_key) {
			return OperationOutcome::forbidden();
		}

		let public_key = request.public_key.trim();
		if public_key.is_empty() {
			return OperationOutcome::bad_request("public_key is required");
		}

		let _gate = self.enter().await;

		info!("removing wg peer");

		if let Err(e) = self.control.remove_peer(public_key).await {
			error!(error = %e, "wg remove failed");
			return OperationOutcome::failure(OutcomeKind::MutationFailed, REMOVE_FAILED);
		}

		if self.options.verify_remove {
			match self.control.list_allowed_ips().await {
				Ok(dump) if dump.has_peer(public_key) => {
					error!("peer still present after wg remove");
					return OperationOutcome::failure(
						OutcomeKind::VerificationFailed,
						REMOVE_VERIFICATION_FAILED,
					);
				}
				Ok(_) => debug!("peer absent from allowed-ips table"),
				Err(e) => {
					error!(error = %e, "wg verify failed");
					return OperationOutcome::failure(
						OutcomeKind::VerificationUnavailable,
						VERIFY_UNAVAILABLE,
					);
				}
			}
		}

		info!("wg peer removed");
		OperationOutcome::success(PEER_REMOVED)
	}
}

impl std::fmt::Debug for PeerService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PeerService")
			.field("interface", &self.interface())
			.field("options", &self.options)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use kanasa_common_secret::SecretString;
	use kanasa_wg_control::{AllowedIpsDump, ControlError, MemoryPeerControl};
	use std::sync::Mutex as StdMutex;
	use std::time::Duration;

	/// Control double with canned results that records every call.
	#[derive(Default)]
	struct ScriptedControl {
		fail_mutation: bool,
		list: Option<String>,
		mutation_delay: Option<Duration>,
		calls: StdMutex<Vec<String>>,
	}

	impl ScriptedControl {
		fn listing(list: &str) -> Self {
			Self {
				list: Some(list.to_string()),
				..Default::default()
			}
		}

		fn calls(&self) -> Vec<String> {
			self.calls.lock().unwrap().clone()
		}

		fn record(&self, call: String) {
			self.calls.lock().unwrap().push(call);
		}

		async fn mutate(&self, call: String) -> Result<(), ControlError> {
			self.record(call);
			if let Some(delay) = self.mutation_delay {
				tokio::time::sleep(delay).await;
			}
			if self.fail_mutation {
				return Err(ControlError::CommandFailed {
					command: "wg set".to_string(),
					status: "exit status: 1".to_string(),
					output: "Unable to modify interface: Operation not permitted".to_string(),
				});
			}
			Ok(())
		}
	}

	#[async_trait]
	impl PeerControl for ScriptedControl {
		fn interface(&self) -> &str {
			"wg0"
		}

		async fn set_peer(&self, public_key: &str, allowed_ips: &str) -> Result<(), ControlError> {
			self.mutate(format!("set {public_key} {allowed_ips}")).await
		}

		async fn remove_peer(&self, public_key: &str) -> Result<(), ControlError> {
			self.mutate(format!("remove {public_key}")).await
		}

		async fn list_allowed_ips(&self) -> Result<AllowedIpsDump, ControlError> {
			self.record("list".to_string());
			match &self.list {
				Some(raw) => Ok(AllowedIpsDump::new(raw.clone())),
				None => Err(ControlError::Rejected("Unable to access interface".to_string())),
			}
		}
	}

	fn service_with(control: Arc<dyn PeerControl>, options: ServiceOptions) -> PeerService {
		PeerService::new(
			Credential::new(SecretString::new("S".to_string())),
			control,
			options,
		)
	}

	fn add_request(server_key: &str, public_key: &str, ip: &str) -> PeerMutationRequest {
		PeerMutationRequest {
			server_key: server_key.to_string(),
			public_key: public_key.to_string(),
			ip: Some(ip.to_string()),
		}
	}

	fn remove_request(server_key: &str, public_key: &str) -> PeerMutationRequest {
		PeerMutationRequest {
			server_key: server_key.to_string(),
			public_key: public_key.to_string(),
			ip: Some(String::new()),
		}
	}

	mod add {
		use super::*;

		#[tokio::test]
		async fn test_success_when_listed() {
			let control = Arc::new(ScriptedControl::listing("PUBKEY1\t10.0.0.5/32\n"));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service
				.add_peer(&add_request("S", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome, OperationOutcome::success(PEER_ADDED));
			assert_eq!(control.calls(), vec!["set PUBKEY1 10.0.0.5/32", "list"]);
		}

		#[tokio::test]
		async fn test_wrong_key_makes_no_calls() {
			let control = Arc::new(ScriptedControl::listing("PUBKEY1\t10.0.0.5/32\n"));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service
				.add_peer(&add_request("T", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome.kind, OutcomeKind::Forbidden);
			assert!(control.calls().is_empty());
		}

		#[tokio::test]
		async fn test_wrong_key_wins_over_missing_fields() {
			let control = Arc::new(ScriptedControl::default());
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.add_peer(&PeerMutationRequest::default()).await;

			assert_eq!(outcome.kind, OutcomeKind::Forbidden);
			assert!(control.calls().is_empty());
		}

		#[tokio::test]
		async fn test_missing_ip_is_bad_request() {
			let control = Arc::new(ScriptedControl::default());
			let service = service_with(control.clone(), ServiceOptions::default());

			let request = PeerMutationRequest {
				server_key: "S".to_string(),
				public_key: "PUBKEY1".to_string(),
				ip: None,
			};
			let outcome = service.add_peer(&request).await;

			assert_eq!(outcome.kind, OutcomeKind::BadRequest);
			assert!(control.calls().is_empty());
		}

		#[tokio::test]
		async fn test_missing_public_key_is_bad_request() {
			let control = Arc::new(ScriptedControl::default());
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.add_peer(&add_request("S", "  ", "10.0.0.5/32")).await;

			assert_eq!(outcome.kind, OutcomeKind::BadRequest);
			assert!(control.calls().is_empty());
		}

		#[tokio::test]
		async fn test_set_failure_is_mutation_failed_without_diagnostics() {
			let control = Arc::new(ScriptedControl {
				fail_mutation: true,
				list: Some("PUBKEY1\t10.0.0.5/32\n".to_string()),
				..Default::default()
			});
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service
				.add_peer(&add_request("S", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome.kind, OutcomeKind::MutationFailed);
			assert_eq!(outcome.message, SET_FAILED);
			assert!(!outcome.message.contains("Operation not permitted"));
			assert_eq!(control.calls(), vec!["set PUBKEY1 10.0.0.5/32"]);
		}

		#[tokio::test]
		async fn test_list_failure_is_verification_unavailable() {
			let control = Arc::new(ScriptedControl::default());
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service
				.add_peer(&add_request("S", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome.kind, OutcomeKind::VerificationUnavailable);
			assert_eq!(outcome.message, VERIFY_UNAVAILABLE);
		}

		#[tokio::test]
		async fn test_absent_after_set_is_verification_failed() {
			let control = Arc::new(ScriptedControl::listing("OTHERKEY\t10.0.0.9/32\n"));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service
				.add_peer(&add_request("S", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome.kind, OutcomeKind::VerificationFailed);
			assert_eq!(outcome.message, ADD_VERIFICATION_FAILED);
		}

		#[tokio::test]
		async fn test_repeated_add_converges_to_one_entry() {
			let control = Arc::new(MemoryPeerControl::new("wg0"));
			let service = service_with(control.clone(), ServiceOptions::default());
			let request = add_request("S", "PUBKEY1", "10.0.0.5/32");

			assert!(service.add_peer(&request).await.success);
			assert!(service.add_peer(&request).await.success);

			let peers = control.peers().await;
			assert_eq!(peers.len(), 1);
			assert_eq!(peers["PUBKEY1"], "10.0.0.5/32");
		}
	}

	mod remove {
		use super::*;

		#[tokio::test]
		async fn test_key_is_trimmed() {
			let control = Arc::new(ScriptedControl::listing(""));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.remove_peer(&remove_request("S", "  PUBKEY1  ")).await;

			assert_eq!(outcome, OperationOutcome::success(PEER_REMOVED));
			assert_eq!(control.calls(), vec!["remove PUBKEY1"]);
		}

		#[tokio::test]
		async fn test_wrong_key_makes_no_calls() {
			let control = Arc::new(ScriptedControl::listing(""));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.remove_peer(&remove_request("T", "PUBKEY1")).await;

			assert_eq!(outcome.kind, OutcomeKind::Forbidden);
			assert!(control.calls().is_empty());
		}

		#[tokio::test]
		async fn test_absent_peer_is_success() {
			let control = Arc::new(MemoryPeerControl::new("wg0"));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert!(outcome.success);
		}

		#[tokio::test]
		async fn test_failure_is_mutation_failed() {
			let control = Arc::new(ScriptedControl {
				fail_mutation: true,
				..Default::default()
			});
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert_eq!(outcome.kind, OutcomeKind::MutationFailed);
			assert_eq!(outcome.message, REMOVE_FAILED);
		}

		#[tokio::test]
		async fn test_no_read_back_by_default() {
			let control = Arc::new(ScriptedControl::listing("PUBKEY1\t10.0.0.5/32\n"));
			let service = service_with(control.clone(), ServiceOptions::default());

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert!(outcome.success);
			assert_eq!(control.calls(), vec!["remove PUBKEY1"]);
		}

		#[tokio::test]
		async fn test_verify_remove_detects_lingering_peer() {
			let control = Arc::new(ScriptedControl::listing("PUBKEY1\t10.0.0.5/32\n"));
			let options = ServiceOptions {
				verify_remove: true,
				..Default::default()
			};
			let service = service_with(control.clone(), options);

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert_eq!(outcome.kind, OutcomeKind::VerificationFailed);
			assert_eq!(outcome.message, REMOVE_VERIFICATION_FAILED);
			assert_eq!(control.calls(), vec!["remove PUBKEY1", "list"]);
		}

		#[tokio::test]
		async fn test_verify_remove_list_failure() {
			let control = Arc::new(ScriptedControl::default());
			let options = ServiceOptions {
				verify_remove: true,
				..Default::default()
			};
			let service = service_with(control.clone(), options);

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert_eq!(outcome.kind, OutcomeKind::VerificationUnavailable);
		}

		#[tokio::test]
		async fn test_verify_remove_confirms_absence() {
			let control = Arc::new(MemoryPeerControl::with_peers(
				"wg0",
				[("PUBKEY1", "10.0.0.5/32")],
			));
			let options = ServiceOptions {
				verify_remove: true,
				..Default::default()
			};
			let service = service_with(control.clone(), options);

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert!(outcome.success);
			assert!(control.peers().await.is_empty());
			assert_eq!(control.call_counts().list, 1);
		}
	}

	mod serialization {
		use super::*;

		fn slow_control() -> Arc<ScriptedControl> {
			Arc::new(ScriptedControl {
				list: Some("A\t10.0.0.1/32\nB\t10.0.0.2/32\n".to_string()),
				mutation_delay: Some(Duration::from_millis(20)),
				..Default::default()
			})
		}

		#[tokio::test]
		async fn test_serialized_sequences_do_not_interleave() {
			let control = slow_control();
			let service = service_with(control.clone(), ServiceOptions::default());

			let a = add_request("S", "A", "10.0.0.1/32");
			let b = add_request("S", "B", "10.0.0.2/32");
			let (first, second) = tokio::join!(service.add_peer(&a), service.add_peer(&b));

			assert!(first.success && second.success);
			assert_eq!(
				control.calls(),
				vec!["set A 10.0.0.1/32", "list", "set B 10.0.0.2/32", "list"]
			);
		}

		#[tokio::test]
		async fn test_unserialized_sequences_may_interleave() {
			let control = slow_control();
			let options = ServiceOptions {
				serialize: false,
				..Default::default()
			};
			let service = service_with(control.clone(), options);

			let a = add_request("S", "A", "10.0.0.1/32");
			let b = add_request("S", "B", "10.0.0.2/32");
			let (first, second) = tokio::join!(service.add_peer(&a), service.add_peer(&b));

			assert!(first.success && second.success);
			assert_eq!(
				control.calls(),
				vec!["set A 10.0.0.1/32", "set B 10.0.0.2/32", "list", "list"]
			);
		}
	}

	#[cfg(unix)]
	mod wg_timeouts {
		use super::*;
		use kanasa_wg_control::WgCommandControl;
		use std::os::unix::fs::PermissionsExt;
		use std::path::PathBuf;
		use tempfile::TempDir;

		/// A `wg` stand-in running `body`, where `$1` is `set` or `show`.
		fn hanging_wg(dir: &TempDir, body: &str) -> PathBuf {
			let path = dir.path().join("wg");
			std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
			std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
			path
		}

		fn service_for(binary: PathBuf, options: ServiceOptions) -> PeerService {
			let control = WgCommandControl::new(binary, "wg0", Duration::from_millis(200));
			service_with(Arc::new(control), options)
		}

		#[tokio::test]
		async fn test_hung_set_is_mutation_failed() {
			let dir = TempDir::new().unwrap();
			let service = service_for(hanging_wg(&dir, "sleep 5"), ServiceOptions::default());

			let started = std::time::Instant::now();
			let outcome = service
				.add_peer(&add_request("S", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome.kind, OutcomeKind::MutationFailed);
			assert_eq!(outcome.message, SET_FAILED);
			assert!(started.elapsed() < Duration::from_secs(4));
		}

		#[tokio::test]
		async fn test_hung_show_is_verification_unavailable() {
			let dir = TempDir::new().unwrap();
			let script = r#"case "$1" in show) sleep 5 ;; esac"#;
			let service = service_for(hanging_wg(&dir, script), ServiceOptions::default());

			let outcome = service
				.add_peer(&add_request("S", "PUBKEY1", "10.0.0.5/32"))
				.await;

			assert_eq!(outcome.kind, OutcomeKind::VerificationUnavailable);
			assert_eq!(outcome.message, VERIFY_UNAVAILABLE);
		}

		#[tokio::test]
		async fn test_hung_remove_is_mutation_failed() {
			let dir = TempDir::new().unwrap();
			let service = service_for(hanging_wg(&dir, "sleep 5"), ServiceOptions::default());

			let outcome = service.remove_peer(&remove_request("S", "PUBKEY1")).await;

			assert_eq!(outcome.kind, OutcomeKind::MutationFailed);
			assert_eq!(outcome.message, REMOVE_FAILED);
		}
	}
}
