// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mesa helpdesk core.

use thiserror::Error;

use crate::types::TicketStatus;

/// The primary error type used across the Mesa workspace.
///
/// Business-rule rejections (`TicketClosedForResponses`, `InvalidTransition`,
/// the maintenance-window guards) are never retried; they leave ticket and
/// response state exactly as it was before the call. `Storage` wraps
/// infrastructure failures, which roll back the surrounding transaction.
#[derive(Debug, Error)]
pub enum MesaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Input constraint violations detected before the transition engine runs.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Attempted to append a response to a resolved or closed ticket.
    #[error("ticket is {status} and no longer accepts responses")]
    TicketClosedForResponses { status: TicketStatus },

    /// A lifecycle operation was attempted out of order.
    #[error("invalid transition: cannot {action} a {from} ticket")]
    InvalidTransition {
        from: TicketStatus,
        action: &'static str,
    },

    /// Resolving requires at least one prior agent response.
    #[error("ticket has no agent response yet and cannot be resolved")]
    UnansweredTicket,

    /// The window was already marked complete.
    #[error("already completed")]
    AlreadyCompleted,

    /// Completion was attempted before the window was marked started.
    #[error("must be marked started before completion")]
    StartRequiredFirst,

    /// The completion timestamp does not come strictly after the start.
    #[error("completion timestamp must be strictly after start")]
    EndNotAfterStart,

    /// The actor is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A response edit was attempted after the 30-minute window.
    #[error("responses may only be edited within 30 minutes of creation")]
    EditWindowExpired,
}
