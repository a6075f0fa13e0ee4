// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use kanasa_common_secret::SecretString;
use serde::Deserialize;

use crate::sections::{ControlConfigLayer, HttpConfigLayer, LoggingConfigLayer};

/// Agent configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub control: Option<ControlConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	/// Only the environment may supply the server key; config files never do.
	#[serde(skip)]
	pub server_key: Option<SecretString>,
}

impl AgentConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: AgentConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(&mut self.control, other.control, ControlConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		if other.server_key.is_some() {
			self.server_key = other.server_key;
		}
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
