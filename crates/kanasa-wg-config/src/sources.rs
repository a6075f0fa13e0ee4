// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use kanasa_common_secret::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::AgentConfigLayer;
use crate::sections::{
	ControlBackend, ControlConfigLayer, HttpConfigLayer, LogFormat, LoggingConfigLayer,
};

/// Environment variable holding the shared server key.
pub const SERVER_KEY_ENV: &str = "KANASA_SERVER_KEY";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AgentConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AgentConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file that is skipped when absent.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}

	/// A file the operator asked for explicitly; absence is an error.
	pub fn required(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	pub fn system() -> Self {
		Self::new("/etc/kanasa/wg.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		if !self.path.exists() {
			if self.required {
				return Err(ConfigError::FileNotFound(self.path.clone()));
			}
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AgentConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AgentConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `KANASA_WG_<FIELD>`. The server key uses `KANASA_SERVER_KEY`
/// or `KANASA_SERVER_KEY_FILE`.
pub struct EnvSource {
	vars: HashMap<String, String>,
}

impl EnvSource {
	/// Snapshot of the current process environment.
	pub fn from_process() -> Self {
		Self::from_vars(std::env::vars())
	}

	pub fn from_vars<I>(vars: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		Self {
			vars: vars.into_iter().collect(),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		self.vars.get(name).filter(|s| !s.is_empty()).cloned()
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v
				.trim()
				.parse()
				.map(Some)
				.map_err(|e| ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("'{v}': {e}"),
				}),
			None => Ok(None),
		}
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		match self.var(name) {
			Some(v) => match v.trim().to_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => Ok(Some(true)),
				"0" | "false" | "no" | "off" => Ok(Some(false)),
				_ => Err(ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("invalid boolean value '{v}'"),
				}),
			},
			None => Ok(None),
		}
	}

	/// Load a secret using the `VAR` / `VAR_FILE` convention.
	///
	/// `VAR_FILE` wins when both are set. A single trailing newline is
	/// stripped from file contents. An empty `VAR` is returned as-is so
	/// validation can reject it explicitly.
	fn secret(&self, var: &str) -> Result<Option<SecretString>, ConfigError> {
		let file_var = format!("{var}_FILE");

		if let Some(path_str) = self.vars.get(&file_var) {
			if path_str.is_empty() {
				return Err(ConfigError::InvalidValue {
					key: file_var,
					message: "secret file path is empty".to_string(),
				});
			}

			let path = PathBuf::from(path_str);
			let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::SecretFile {
				path: path.clone(),
				source: e,
			})?;

			let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
			return Ok(Some(SecretString::new(secret)));
		}

		Ok(self.vars.get(var).cloned().map(SecretString::new))
	}

	fn load_http(&self) -> Result<HttpConfigLayer, ConfigError> {
		Ok(HttpConfigLayer {
			host: self.var("KANASA_WG_HOST"),
			port: self.parsed("KANASA_WG_PORT")?,
		})
	}

	fn load_control(&self) -> Result<ControlConfigLayer, ConfigError> {
		Ok(ControlConfigLayer {
			backend: self.parsed::<ControlBackend>("KANASA_WG_BACKEND")?,
			interface: self.var("KANASA_WG_INTERFACE"),
			wg_binary: self.var("KANASA_WG_BINARY"),
			timeout_secs: self.parsed("KANASA_WG_TIMEOUT_SECS")?,
			serialize: self.bool("KANASA_WG_SERIALIZE")?,
			verify_remove: self.bool("KANASA_WG_VERIFY_REMOVE")?,
		})
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		Ok(LoggingConfigLayer {
			level: self.var("KANASA_WG_LOG_LEVEL"),
			format: self.parsed::<LogFormat>("KANASA_WG_LOG_FORMAT")?,
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AgentConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AgentConfigLayer {
			http: Some(self.load_http()?),
			control: Some(self.load_control()?),
			logging: Some(self.load_logging()?),
			server_key: self.secret(SERVER_KEY_ENV)?,
		})
	}
}
