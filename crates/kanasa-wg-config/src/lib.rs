// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the WireGuard peer agent.
//!
//! Layered sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file (`/etc/kanasa/wg.toml`, or the path given on the command line)
//! 3. Environment variables (`KANASA_WG_*`, plus `KANASA_SERVER_KEY`)
//!
//! The shared server key is required and only ever read from the
//! environment (`KANASA_SERVER_KEY` or `KANASA_SERVER_KEY_FILE`).
//!
//! ```ignore
//! let config = kanasa_wg_config::load_config(None)?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::AgentConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SERVER_KEY_ENV,
};

use std::path::Path;

use kanasa_common_secret::SecretString;
use tracing::debug;

/// Fully resolved agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
	pub http: HttpConfig,
	pub control: ControlConfig,
	pub logging: LoggingConfig,
	pub server_key: SecretString,
}

impl AgentConfig {
	/// Configuration with defaults everywhere except the key.
	pub fn with_server_key(server_key: SecretString) -> Self {
		Self {
			http: HttpConfig::default(),
			control: ControlConfig::default(),
			logging: LoggingConfig::default(),
			server_key,
		}
	}

	/// Socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// When `config_path` is given the file must exist; otherwise the system
/// path is used if present.
pub fn load_config(config_path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
	let toml = match config_path {
		Some(path) => TomlSource::required(path),
		None => TomlSource::system(),
	};

	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(toml),
		Box::new(EnvSource::from_process()),
	])
}

/// Merge the given sources by precedence and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<AgentConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AgentConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: AgentConfigLayer) -> Result<AgentConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let control = layer.control.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	let server_key = layer
		.server_key
		.ok_or_else(|| ConfigError::MissingEnvVar(SERVER_KEY_ENV.to_string()))?;

	validate_config(&control, &server_key)?;

	Ok(AgentConfig {
		http,
		control,
		logging,
		server_key,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(control: &ControlConfig, server_key: &SecretString) -> Result<(), ConfigError> {
	if server_key.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{SERVER_KEY_ENV} is set but empty"
		)));
	}

	if control.interface.trim().is_empty() {
		return Err(ConfigError::Validation(
			"control.interface must not be empty".to_string(),
		));
	}

	if control.timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"control.timeout_secs must be greater than zero".to_string(),
		));
	}

	Ok(())
}
