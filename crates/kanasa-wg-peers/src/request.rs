// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use kanasa_common_secret::REDACTED;
use serde::Deserialize;

/// Body of `POST /peer/add` and `POST /peer/remove`.
///
/// Missing fields decode as empty so an incomplete body still goes through
/// the authorization check. `ip` is ignored for removals.
#[derive(Clone, Default, Deserialize)]
pub struct PeerMutationRequest {
	#[serde(default)]
	pub server_key: String,
	#[serde(default)]
	pub public_key: String,
	#[serde(default)]
	pub ip: Option<String>,
}

impl fmt::Debug for PeerMutationRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PeerMutationRequest")
			.field("server_key", &REDACTED)
			.field("public_key", &self.public_key)
			.field("ip", &self.ip)
			.finish()
	}
}
