// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `TicketStore` trait: the seam between request handlers and the
//! ticketing core. HTTP and GraphQL layers hold a `dyn TicketStore` and know
//! nothing about the underlying persistence.

use async_trait::async_trait;

use crate::error::MesaError;
use crate::types::{
    AuthorType, HealthStatus, MaintenanceWindow, NewMaintenanceWindow, NewTicket, Ticket,
    TicketResponse, TicketStatus,
};

/// Persistence facade for tickets, responses, and maintenance windows.
///
/// Every mutating ticket operation is atomic: a recorded response and the
/// transition-engine update to its ticket either both land or neither does.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Initializes the backend (opens connections, runs migrations).
    async fn initialize(&self) -> Result<(), MesaError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), MesaError>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<HealthStatus, MesaError>;

    // --- Tickets ---

    /// Create an open, unassigned ticket with a fresh ticket code.
    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket, MesaError>;

    /// Fetch a ticket by its code.
    async fn get_ticket(&self, ticket_code: &str) -> Result<Option<Ticket>, MesaError>;

    /// List a company's tickets, optionally filtered by status.
    async fn list_tickets(
        &self,
        company_id: &str,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, MesaError>;

    /// Mark a ticket resolved. Requires an assigned owner and an open or
    /// pending status.
    async fn resolve_ticket(
        &self,
        ticket_code: &str,
        actor_agent_id: &str,
    ) -> Result<Ticket, MesaError>;

    /// Close a resolved ticket.
    async fn close_ticket(&self, ticket_code: &str) -> Result<Ticket, MesaError>;

    /// Delete a closed ticket and its responses.
    async fn delete_ticket(&self, ticket_code: &str) -> Result<(), MesaError>;

    // --- Responses ---

    /// Append a response and apply the transition engine atomically.
    async fn record_response(
        &self,
        ticket_code: &str,
        author_id: &str,
        author_type: AuthorType,
        content: &str,
    ) -> Result<TicketResponse, MesaError>;

    /// A ticket's responses in chronological order.
    async fn list_responses(&self, ticket_code: &str) -> Result<Vec<TicketResponse>, MesaError>;

    /// Edit a response's content. Author-only, within 30 minutes of creation;
    /// never re-runs the transition engine.
    async fn update_response_content(
        &self,
        response_id: &str,
        editor_id: &str,
        content: &str,
    ) -> Result<TicketResponse, MesaError>;

    // --- Maintenance windows ---

    async fn create_window(
        &self,
        new: NewMaintenanceWindow,
    ) -> Result<MaintenanceWindow, MesaError>;

    async fn get_window(&self, id: &str) -> Result<Option<MaintenanceWindow>, MesaError>;

    /// Stamp the actual start. Idempotent: re-marking keeps the first stamp.
    async fn mark_window_start(&self, id: &str) -> Result<MaintenanceWindow, MesaError>;

    /// Stamp the actual end. Requires a start and strictly later timestamp.
    async fn mark_window_complete(&self, id: &str) -> Result<MaintenanceWindow, MesaError>;
}
