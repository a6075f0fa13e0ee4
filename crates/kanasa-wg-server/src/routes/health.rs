// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Liveness handler.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health - liveness only. No auth and no interface access.
pub async fn health_check() -> impl IntoResponse {
	(StatusCode::OK, "OK")
}
