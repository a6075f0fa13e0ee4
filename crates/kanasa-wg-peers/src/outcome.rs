// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Serialize;

pub const PEER_ADDED: &str = "peer added successfully";
pub const PEER_REMOVED: &str = "peer removed successfully";
pub const INVALID_JSON: &str = "invalid json";
pub const NOT_ALLOWED: &str = "execution not allowed for this server";
pub const SET_FAILED: &str = "wg set failed";
pub const REMOVE_FAILED: &str = "wg remove failed";
pub const VERIFY_UNAVAILABLE: &str = "wg verify failed";
pub const ADD_VERIFICATION_FAILED: &str = "peer verification failed";
pub const REMOVE_VERIFICATION_FAILED: &str = "peer removal verification failed";

/// Terminal state of one mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
	Success,
	/// Malformed or incomplete input.
	BadRequest,
	/// Server key did not match.
	Forbidden,
	/// The set or remove call against the interface failed.
	MutationFailed,
	/// The mutation call succeeded but the re-read did not confirm it.
	VerificationFailed,
	/// The re-read itself failed.
	VerificationUnavailable,
	/// The operation never reported back; the interface state is unknown.
	Internal,
}

impl OutcomeKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			OutcomeKind::Success => "success",
			OutcomeKind::BadRequest => "bad_request",
			OutcomeKind::Forbidden => "forbidden",
			OutcomeKind::MutationFailed => "mutation_failed",
			OutcomeKind::VerificationFailed => "verification_failed",
			OutcomeKind::VerificationUnavailable => "verification_unavailable",
			OutcomeKind::Internal => "internal",
		}
	}
}

impl std::fmt::Display for OutcomeKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Result of one add or remove, as reported to the caller.
///
/// Messages are fixed category strings; interface diagnostics never end up
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
	pub success: bool,
	pub message: String,
	#[serde(skip)]
	pub kind: OutcomeKind,
}

impl OperationOutcome {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
			kind: OutcomeKind::Success,
		}
	}

	pub fn failure(kind: OutcomeKind, message: impl Into<String>) -> Self {
		debug_assert!(kind != OutcomeKind::Success);
		Self {
			success: false,
			message: message.into(),
			kind,
		}
	}

	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::failure(OutcomeKind::BadRequest, message)
	}

	pub fn forbidden() -> Self {
		Self::failure(OutcomeKind::Forbidden, NOT_ALLOWED)
	}
}
