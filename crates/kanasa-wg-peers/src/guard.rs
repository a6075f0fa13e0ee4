// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use kanasa_common_secret::SecretString;
use tracing::warn;

/// Holds the shared server key and decides whether a request may mutate the
/// peer table.
#[derive(Debug, Clone)]
pub struct Credential {
	server_key: SecretString,
}

impl Credential {
	pub fn new(server_key: SecretString) -> Self {
		Self { server_key }
	}

	/// Exact match against the configured key. Never errors.
	pub fn authorize(&self, provided: &str) -> bool {
		if provided.is_empty() {
			warn!("authorization failed: no server key provided");
			return false;
		}

		let authorized = self.server_key.matches(provided);
		if !authorized {
			warn!("authorization failed: server key mismatch");
		}
		authorized
	}
}
