// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authenticated add and remove of WireGuard peers.
//!
//! A [`PeerService`] checks the caller's server key, mutates the interface
//! through a [`kanasa_wg_control::PeerControl`], then re-reads the
//! allowed-ips table to confirm the change took. Every path ends in an
//! [`OperationOutcome`] with a fixed message that is safe to return to the
//! caller.

mod guard;
mod outcome;
mod request;
mod service;

pub use guard::Credential;
pub use outcome::{
	OperationOutcome, OutcomeKind, ADD_VERIFICATION_FAILED, INVALID_JSON, NOT_ALLOWED,
	PEER_ADDED, PEER_REMOVED, REMOVE_FAILED, REMOVE_VERIFICATION_FAILED, SET_FAILED,
	VERIFY_UNAVAILABLE,
};
pub use request::PeerMutationRequest;
pub use service::{PeerService, ServiceOptions};
