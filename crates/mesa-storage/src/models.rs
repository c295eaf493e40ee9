// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping for storage entities.
//!
//! The canonical types are defined in `mesa-core::types` for use across the
//! trait seam. This module re-exports them and provides the rusqlite row
//! mappers shared by the query modules.

use std::str::FromStr;

pub use mesa_core::types::{
    AuthorType, LastAuthor, MaintenanceWindow, NewMaintenanceWindow, NewTicket, Ticket,
    TicketResponse, TicketStatus,
};

/// Column list for `SELECT` on the tickets table, in `row_to_ticket` order.
pub(crate) const TICKET_COLUMNS: &str = "id, ticket_code, company_id, created_by_user_id, \
     category_id, title, description, status, owner_agent_id, last_response_author_type, \
     first_response_at, resolved_at, closed_at, created_at, updated_at";

/// Column list for `SELECT` on ticket_responses, in `row_to_response` order.
pub(crate) const RESPONSE_COLUMNS: &str =
    "id, ticket_id, author_id, author_type, content, created_at, updated_at";

/// Column list for `SELECT` on maintenance_windows, in `row_to_window` order.
pub(crate) const WINDOW_COLUMNS: &str = "id, company_id, title, scheduled_start, scheduled_end, \
     actual_start, actual_end, created_at, updated_at";

/// Parse a TEXT enum column, surfacing corruption as a conversion failure.
fn parse_column<T: FromStr>(idx: usize, raw: String) -> rusqlite::Result<T> {
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(format!("invalid enum value: {raw}"))),
        )
    })
}

pub(crate) fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        ticket_code: row.get(1)?,
        company_id: row.get(2)?,
        created_by_user_id: row.get(3)?,
        category_id: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        status: parse_column(7, row.get::<_, String>(7)?)?,
        owner_agent_id: row.get(8)?,
        last_response_author_type: parse_column(9, row.get::<_, String>(9)?)?,
        first_response_at: row.get(10)?,
        resolved_at: row.get(11)?,
        closed_at: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

pub(crate) fn row_to_response(row: &rusqlite::Row) -> rusqlite::Result<TicketResponse> {
    Ok(TicketResponse {
        id: row.get(0)?,
        ticket_id: row.get(1)?,
        author_id: row.get(2)?,
        author_type: parse_column(3, row.get::<_, String>(3)?)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(crate) fn row_to_window(row: &rusqlite::Row) -> rusqlite::Result<MaintenanceWindow> {
    Ok(MaintenanceWindow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        scheduled_start: row.get(3)?,
        scheduled_end: row.get(4)?,
        actual_start: row.get(5)?,
        actual_end: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
