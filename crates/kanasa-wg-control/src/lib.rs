// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control adapter for the managed WireGuard interface.
//!
//! The adapter exposes three coarse operations through [`PeerControl`]:
//! set a peer's allowed-ips, remove a peer, and dump the allowed-ips table.
//! The interface itself is the source of truth and offers no transactional
//! semantics, so nothing richer is modelled here.
//!
//! Backends:
//! - [`WgCommandControl`] shells out to `wg` with a per-call timeout
//! - [`MemoryPeerControl`] keeps the table in process (dry-run and tests)

mod command;
mod control;
pub mod error;
mod memory;

pub use command::WgCommandControl;
pub use control::{AllowedIpsDump, PeerAllowedIps, PeerControl};
pub use error::ControlError;
pub use memory::{CallCounts, MemoryPeerControl};
