// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the single-writer database handle.
//!
//! Every read-modify-write on a ticket row happens inside a `BEGIN IMMEDIATE`
//! transaction opened in one `call` closure, so no other write can interleave
//! between the head read and the guarded update.

pub mod maintenance;
pub mod responses;
pub mod tickets;

use mesa_core::MesaError;

pub(crate) fn not_found(what: impl Into<String>) -> MesaError {
    MesaError::NotFound { what: what.into() }
}
