// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard peer agent.
//!
//! A small HTTP service, bound to loopback by default, that lets an
//! orchestrator holding the shared server key add and remove peers on one
//! local WireGuard interface.

pub mod api;
pub mod routes;

pub use api::{build_control, build_service, create_router, log_startup, AppState};
