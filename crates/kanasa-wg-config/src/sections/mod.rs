// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each section has a resolved `*Config` type and a
//! partial `*ConfigLayer` used while merging sources.

mod control;
mod http;
mod logging;

pub use control::{ControlBackend, ControlConfig, ControlConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
