// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use kanasa_wg_config::{AgentConfig, ControlBackend, ControlConfig};
use kanasa_wg_control::{MemoryPeerControl, PeerControl, WgCommandControl};
use kanasa_wg_peers::{Credential, PeerService, ServiceOptions};

use crate::routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PeerService>,
}

impl AppState {
	pub fn new(service: PeerService) -> Self {
		Self {
			service: Arc::new(service),
		}
	}
}

/// Picks the peer control backend named in the configuration.
pub fn build_control(config: &ControlConfig) -> Arc<dyn PeerControl> {
	match config.backend {
		ControlBackend::Command => Arc::new(WgCommandControl::new(
			&config.wg_binary,
			&config.interface,
			config.timeout(),
		)),
		ControlBackend::Memory => {
			tracing::warn!(
				interface = %config.interface,
				"memory backend selected, the host interface will not be modified"
			);
			Arc::new(MemoryPeerControl::new(&config.interface))
		}
	}
}

pub fn build_service(config: &AgentConfig) -> PeerService {
	PeerService::new(
		Credential::new(config.server_key.clone()),
		build_control(&config.control),
		ServiceOptions {
			serialize: config.control.serialize,
			verify_remove: config.control.verify_remove,
		},
	)
}

/// Logs the resolved configuration once the subscriber is installed.
///
/// The server key only ever appears through its redacted Display.
pub fn log_startup(config: &AgentConfig) {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		backend = ?config.control.backend,
		interface = %config.control.interface,
		timeout_secs = config.control.timeout_secs,
		serialize = config.control.serialize,
		verify_remove = config.control.verify_remove,
		server_key = %config.server_key,
		"starting kanasa-wg"
	);
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/peer/add", post(routes::peers::add_peer))
		.route("/peer/remove", post(routes::peers::remove_peer))
		.with_state(state)
}
