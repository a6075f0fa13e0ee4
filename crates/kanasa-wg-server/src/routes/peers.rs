// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer add and remove handlers.
//!
//! Bodies are read as raw bytes and decoded as JSON whatever the
//! `Content-Type` says. Each operation runs on its own task, so a client
//! that hangs up does not abort a half-applied change.

use axum::{
	body::Bytes,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use kanasa_wg_peers::{OperationOutcome, OutcomeKind, PeerMutationRequest, INVALID_JSON};

use crate::api::AppState;

const INTERNAL_ERROR: &str = "internal error";

#[derive(Debug, Clone, Copy)]
enum Operation {
	Add,
	Remove,
}

impl Operation {
	fn as_str(&self) -> &'static str {
		match self {
			Operation::Add => "add",
			Operation::Remove => "remove",
		}
	}
}

pub fn status_for(kind: OutcomeKind) -> StatusCode {
	match kind {
		OutcomeKind::Success => StatusCode::OK,
		OutcomeKind::BadRequest => StatusCode::BAD_REQUEST,
		OutcomeKind::Forbidden => StatusCode::FORBIDDEN,
		OutcomeKind::MutationFailed
		| OutcomeKind::VerificationFailed
		| OutcomeKind::VerificationUnavailable
		| OutcomeKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

fn respond(outcome: OperationOutcome) -> Response {
	(status_for(outcome.kind), Json(outcome)).into_response()
}

async fn dispatch(state: AppState, body: Bytes, operation: Operation) -> Response {
	let request: PeerMutationRequest = match serde_json::from_slice(&body) {
		Ok(request) => request,
		Err(e) => {
			tracing::debug!(op = operation.as_str(), error = %e, "rejecting malformed body");
			return respond(OperationOutcome::bad_request(INVALID_JSON));
		}
	};

	let service = state.service.clone();
	let task = tokio::spawn(async move {
		match operation {
			Operation::Add => service.add_peer(&request).await,
			Operation::Remove => service.remove_peer(&request).await,
		}
	});

	match task.await {
		Ok(outcome) => {
			tracing::debug!(
				op = operation.as_str(),
				outcome = %outcome.kind,
				"peer operation finished"
			);
			respond(outcome)
		}
		Err(e) => {
			tracing::error!(op = operation.as_str(), error = %e, "peer operation task failed");
			respond(OperationOutcome::failure(OutcomeKind::Internal, INTERNAL_ERROR))
		}
	}
}

/// POST /peer/add - add or update a peer, then confirm it is listed.
pub async fn add_peer(State(state): State<AppState>, body: Bytes) -> Response {
	dispatch(state, body, Operation::Add).await
}

/// POST /peer/remove - remove a peer by public key.
pub async fn remove_peer(State(state): State<AppState>, body: Bytes) -> Response {
	dispatch(state, body, Operation::Remove).await
}
