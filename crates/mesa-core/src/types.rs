// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Mesa workspace.
//!
//! Timestamps are ISO-8601 millisecond strings stored as TEXT, so
//! lexicographic order equals chronological order.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MesaError;

/// Maximum response content length in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Minutes after creation during which a response's author may edit it.
pub const EDIT_WINDOW_MINUTES: i64 = 30;

/// Timestamp format used everywhere: `2026-01-01T00:00:00.000Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Current time as an ISO-8601 millisecond string.
pub fn now_iso() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Ticket lifecycle status.
///
/// `Open` means awaiting agent attention; `Pending` means an agent has
/// responded and the ticket is waiting on the user. The engine drives
/// `Open ⇄ Pending`; `Resolved` and `Closed` are explicit operator actions
/// with no reverse edge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Whether the ticket still accepts responses.
    pub fn accepts_responses(self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::Pending)
    }
}

/// Who authored a response, derived from the caller's role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    User,
    Agent,
}

/// The author type of the most recently recorded response.
///
/// `None` is the state of a freshly created ticket with no responses at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LastAuthor {
    None,
    User,
    Agent,
}

impl From<AuthorType> for LastAuthor {
    fn from(author: AuthorType) -> Self {
        match author {
            AuthorType::User => LastAuthor::User,
            AuthorType::Agent => LastAuthor::Agent,
        }
    }
}

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is operational but experiencing issues.
    Degraded(String),
    /// Store is not operational.
    Unhealthy(String),
}

/// A support ticket owned by a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    /// Human-readable code, unique and stable (`TKT-2026-00001`).
    pub ticket_code: String,
    /// Tenant scope. Immutable after creation.
    pub company_id: String,
    pub created_by_user_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    /// Set at most once, by the first agent response. Never overwritten.
    pub owner_agent_id: Option<String>,
    pub last_response_author_type: LastAuthor,
    /// Set exactly once, on the first agent response.
    pub first_response_at: Option<String>,
    pub resolved_at: Option<String>,
    pub closed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub company_id: String,
    pub created_by_user_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: String,
}

/// An append-only message attached to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub id: String,
    pub ticket_id: String,
    pub author_id: String,
    pub author_type: AuthorType,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A scheduled maintenance window with a write-once actual start/end pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub scheduled_start: String,
    pub scheduled_end: String,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a maintenance window.
#[derive(Debug, Clone)]
pub struct NewMaintenanceWindow {
    pub company_id: String,
    pub title: String,
    pub scheduled_start: String,
    pub scheduled_end: String,
}

/// Validate response content length (1–5000 characters).
pub fn validate_content(content: &str) -> Result<(), MesaError> {
    let chars = content.chars().count();
    if chars == 0 {
        return Err(MesaError::Validation(
            "response content must not be empty".to_string(),
        ));
    }
    if chars > MAX_CONTENT_CHARS {
        return Err(MesaError::Validation(format!(
            "response content exceeds {MAX_CONTENT_CHARS} characters ({chars})"
        )));
    }
    Ok(())
}
