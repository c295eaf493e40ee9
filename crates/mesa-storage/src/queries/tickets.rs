// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket CRUD and explicit lifecycle actions (resolve, close, delete).

use mesa_core::{MesaError, StampPair};
use rusqlite::{params, TransactionBehavior};
use tracing::info;

use crate::database::{map_tr_err, Database};
use crate::models::{row_to_ticket, NewTicket, Ticket, TicketStatus, TICKET_COLUMNS};
use crate::queries::not_found;

/// Next sequential ticket code for the given year, `TKT-YYYY-NNNNN`.
///
/// Derived from the highest existing suffix, not a row count: codes of
/// deleted tickets are never reissued. Runs inside the insert transaction,
/// so the read cannot race another insert on the single writer thread.
fn next_ticket_code(conn: &rusqlite::Connection, year: &str) -> rusqlite::Result<String> {
    let max_seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(CAST(substr(ticket_code, 10) AS INTEGER)), 0)
         FROM tickets WHERE ticket_code LIKE ?1",
        params![format!("TKT-{year}-%")],
        |row| row.get(0),
    )?;
    Ok(format!("TKT-{year}-{:05}", max_seq + 1))
}

/// The 4-digit year prefix of an ISO-8601 timestamp.
fn code_year(now: &str) -> Result<&str, MesaError> {
    now.get(..4)
        .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| MesaError::Validation(format!("malformed timestamp: {now}")))
}

/// Create a ticket in its initial state: `open`, unowned, no responses.
pub async fn create_ticket(
    db: &Database,
    new: NewTicket,
    now: &str,
) -> Result<Ticket, MesaError> {
    if new.title.trim().is_empty() {
        return Err(MesaError::Validation("ticket title must not be empty".to_string()));
    }

    let year = code_year(now)?.to_string();
    let id = uuid::Uuid::new_v4().to_string();
    let now = now.to_string();

    let ticket = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let ticket_code = next_ticket_code(&tx, &year)?;
            tx.execute(
                "INSERT INTO tickets (id, ticket_code, company_id, created_by_user_id,
                     category_id, title, description, status, owner_agent_id,
                     last_response_author_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'open', NULL, 'none', ?8, ?8)",
                params![
                    id,
                    ticket_code,
                    new.company_id,
                    new.created_by_user_id,
                    new.category_id,
                    new.title,
                    new.description,
                    now,
                ],
            )?;
            let ticket = tx.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                params![id],
                row_to_ticket,
            )?;
            tx.commit()?;
            Ok(ticket)
        })
        .await
        .map_err(map_tr_err)?;

    info!(ticket_code = %ticket.ticket_code, company_id = %ticket.company_id, "ticket created");
    Ok(ticket)
}

/// Look up a ticket by its stable code.
pub async fn get_ticket(db: &Database, ticket_code: &str) -> Result<Option<Ticket>, MesaError> {
    let code = ticket_code.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_code = ?1"),
                params![code],
                row_to_ticket,
            );
            match result {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// A company's tickets, newest first, optionally filtered by status.
pub async fn list_tickets(
    db: &Database,
    company_id: &str,
    status: Option<TicketStatus>,
) -> Result<Vec<Ticket>, MesaError> {
    let company = company_id.to_string();
    db.connection()
        .call(move |conn| {
            let tickets = match status {
                Some(status) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {TICKET_COLUMNS} FROM tickets
                         WHERE company_id = ?1 AND status = ?2
                         ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    stmt.query_map(params![company, status.to_string()], row_to_ticket)?
                        .collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {TICKET_COLUMNS} FROM tickets
                         WHERE company_id = ?1
                         ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    stmt.query_map(params![company], row_to_ticket)?
                        .collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(tickets)
        })
        .await
        .map_err(map_tr_err)
}

/// Resolve a ticket.
///
/// Allowed only from `open` or `pending`, and only once the ticket has an
/// owner (a ticket no agent has answered cannot be resolved). Stamps
/// `resolved_at` exactly once.
pub async fn resolve_ticket(
    db: &Database,
    ticket_code: &str,
    actor_agent_id: &str,
    now: &str,
) -> Result<Ticket, MesaError> {
    let code = ticket_code.to_string();
    let actor = actor_agent_id.to_string();
    let now = now.to_string();

    let ticket = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(ticket) = select_ticket(&tx, &code)? else {
                return Ok(Err(not_found(format!("ticket {code}"))));
            };

            if !ticket.status.accepts_responses() {
                return Ok(Err(MesaError::InvalidTransition {
                    from: ticket.status,
                    action: "resolve",
                }));
            }
            if ticket.owner_agent_id.is_none() {
                return Ok(Err(MesaError::UnansweredTicket));
            }

            let mut stamps = StampPair::new(ticket.resolved_at.clone(), ticket.closed_at.clone());
            let resolved_at = stamps.mark_start(&now).to_string();

            tx.execute(
                "UPDATE tickets SET status = 'resolved', resolved_at = ?2, updated_at = ?3
                 WHERE id = ?1",
                params![ticket.id, resolved_at, now],
            )?;
            let updated = tx.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                params![ticket.id],
                row_to_ticket,
            )?;
            tx.commit()?;
            Ok(Ok(updated))
        })
        .await
        .map_err(map_tr_err)??;

    info!(ticket_code = %ticket.ticket_code, actor = %actor, "ticket resolved");
    Ok(ticket)
}

/// Close a resolved ticket.
///
/// `resolved` is the only state that may close; `closed_at` must land
/// strictly after `resolved_at`.
pub async fn close_ticket(
    db: &Database,
    ticket_code: &str,
    now: &str,
) -> Result<Ticket, MesaError> {
    let code = ticket_code.to_string();
    let now = now.to_string();

    let ticket = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(ticket) = select_ticket(&tx, &code)? else {
                return Ok(Err(not_found(format!("ticket {code}"))));
            };

            if ticket.status != TicketStatus::Resolved {
                return Ok(Err(MesaError::InvalidTransition {
                    from: ticket.status,
                    action: "close",
                }));
            }

            let mut stamps = StampPair::new(ticket.resolved_at.clone(), ticket.closed_at.clone());
            if let Err(e) = stamps.mark_end(&now) {
                return Ok(Err(e));
            }

            tx.execute(
                "UPDATE tickets SET status = 'closed', closed_at = ?2, updated_at = ?2
                 WHERE id = ?1",
                params![ticket.id, now],
            )?;
            let updated = tx.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                params![ticket.id],
                row_to_ticket,
            )?;
            tx.commit()?;
            Ok(Ok(updated))
        })
        .await
        .map_err(map_tr_err)??;

    info!(ticket_code = %ticket.ticket_code, "ticket closed");
    Ok(ticket)
}

/// Delete a closed ticket and, through the FK cascade, its responses.
pub async fn delete_ticket(db: &Database, ticket_code: &str) -> Result<(), MesaError> {
    let code = ticket_code.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(ticket) = select_ticket(&tx, &code)? else {
                return Ok(Err(not_found(format!("ticket {code}"))));
            };
            if ticket.status != TicketStatus::Closed {
                return Ok(Err(MesaError::InvalidTransition {
                    from: ticket.status,
                    action: "delete",
                }));
            }
            tx.execute("DELETE FROM tickets WHERE id = ?1", params![ticket.id])?;
            tx.commit()?;
            info!(ticket_code = %code, "ticket deleted");
            Ok(Ok(()))
        })
        .await
        .map_err(map_tr_err)?
}

fn select_ticket(
    conn: &rusqlite::Connection,
    ticket_code: &str,
) -> rusqlite::Result<Option<Ticket>> {
    let result = conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_code = ?1"),
        params![ticket_code],
        row_to_ticket,
    );
    match result {
        Ok(ticket) => Ok(Some(ticket)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::responses::record_response;
    use mesa_core::types::{now_iso, AuthorType, LastAuthor};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("tickets.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_ticket(company: &str) -> NewTicket {
        NewTicket {
            company_id: company.to_string(),
            created_by_user_id: "user-1".to_string(),
            category_id: Some("cat-hw".to_string()),
            title: "VPN drops every hour".to_string(),
            description: "Disconnects at :00 sharp".to_string(),
        }
    }

    #[tokio::test]
    async fn new_ticket_starts_open_and_unowned() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.owner_agent_id.is_none());
        assert_eq!(ticket.last_response_author_type, LastAuthor::None);
        assert!(ticket.first_response_at.is_none());
        assert!(ticket.resolved_at.is_none());
        assert!(ticket.closed_at.is_none());
        assert_eq!(ticket.category_id.as_deref(), Some("cat-hw"));
    }

    #[tokio::test]
    async fn ticket_codes_are_sequential_per_year() {
        let (db, _dir) = setup_db().await;
        let year = &now_iso()[..4];
        let first = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        let second = create_ticket(&db, make_ticket("co-2"), &now_iso()).await.unwrap();
        assert_eq!(first.ticket_code, format!("TKT-{year}-00001"));
        assert_eq!(second.ticket_code, format!("TKT-{year}-00002"));
    }

    #[tokio::test]
    async fn ticket_codes_are_not_reissued_after_delete() {
        let (db, _dir) = setup_db().await;
        let year = &now_iso()[..4];
        let first = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();

        record_response(&db, &first.ticket_code, "agent-a", AuthorType::Agent, "done", &now_iso())
            .await
            .unwrap();
        resolve_ticket(&db, &first.ticket_code, "agent-a", "2026-03-01T12:00:00.000Z")
            .await
            .unwrap();
        close_ticket(&db, &first.ticket_code, "2026-03-01T12:00:01.000Z").await.unwrap();
        delete_ticket(&db, &first.ticket_code).await.unwrap();

        // The freed 00001 slot must not come back; the sequence keeps moving.
        let third = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        assert_eq!(third.ticket_code, format!("TKT-{year}-00003"));
    }

    #[tokio::test]
    async fn malformed_timestamp_is_rejected_on_create() {
        let (db, _dir) = setup_db().await;
        for bad in ["", "now", "26-03-01T00:00:00.000Z"] {
            let err = create_ticket(&db, make_ticket("co-1"), bad).await.unwrap_err();
            assert!(matches!(err, MesaError::Validation(_)), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let (db, _dir) = setup_db().await;
        let mut new = make_ticket("co-1");
        new.title = "   ".to_string();
        let err = create_ticket(&db, new, &now_iso()).await.unwrap_err();
        assert!(matches!(err, MesaError::Validation(_)));
    }

    #[tokio::test]
    async fn list_filters_by_company_and_status() {
        let (db, _dir) = setup_db().await;
        let a = create_ticket(&db, make_ticket("co-1"), "2026-03-01T09:00:00.000Z").await.unwrap();
        create_ticket(&db, make_ticket("co-1"), "2026-03-01T10:00:00.000Z").await.unwrap();
        create_ticket(&db, make_ticket("co-2"), "2026-03-01T11:00:00.000Z").await.unwrap();

        record_response(&db, &a.ticket_code, "agent-a", AuthorType::Agent, "hi", &now_iso())
            .await
            .unwrap();

        let all = list_tickets(&db, "co-1", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.company_id == "co-1"));
        // Newest first.
        assert!(all[0].created_at >= all[1].created_at);

        let pending = list_tickets(&db, "co-1", Some(TicketStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].ticket_code, a.ticket_code);
    }

    #[tokio::test]
    async fn resolve_requires_an_owner() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();

        let err = resolve_ticket(&db, &ticket.ticket_code, "agent-a", &now_iso()).await.unwrap_err();
        assert!(matches!(err, MesaError::UnansweredTicket));

        // User responses alone do not make it resolvable.
        record_response(&db, &ticket.ticket_code, "user-1", AuthorType::User, "anyone?", &now_iso())
            .await
            .unwrap();
        let err = resolve_ticket(&db, &ticket.ticket_code, "agent-a", &now_iso()).await.unwrap_err();
        assert!(matches!(err, MesaError::UnansweredTicket));
    }

    #[tokio::test]
    async fn resolve_then_close_full_path() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        record_response(&db, &ticket.ticket_code, "agent-a", AuthorType::Agent, "fixed", &now_iso())
            .await
            .unwrap();

        let resolved = resolve_ticket(&db, &ticket.ticket_code, "agent-a", "2026-03-01T12:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);
        assert_eq!(resolved.resolved_at.as_deref(), Some("2026-03-01T12:00:00.000Z"));

        let closed = close_ticket(&db, &ticket.ticket_code, "2026-03-01T12:00:01.000Z")
            .await
            .unwrap();
        assert_eq!(closed.status, TicketStatus::Closed);
        assert_eq!(closed.closed_at.as_deref(), Some("2026-03-01T12:00:01.000Z"));
        assert!(closed.closed_at > closed.resolved_at);
    }

    #[tokio::test]
    async fn close_from_open_or_pending_is_rejected() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();

        let err = close_ticket(&db, &ticket.ticket_code, &now_iso()).await.unwrap_err();
        assert!(matches!(
            err,
            MesaError::InvalidTransition { from: TicketStatus::Open, action: "close" }
        ));

        record_response(&db, &ticket.ticket_code, "agent-a", AuthorType::Agent, "on it", &now_iso())
            .await
            .unwrap();
        let err = close_ticket(&db, &ticket.ticket_code, &now_iso()).await.unwrap_err();
        assert!(matches!(
            err,
            MesaError::InvalidTransition { from: TicketStatus::Pending, action: "close" }
        ));
    }

    #[tokio::test]
    async fn resolve_twice_is_rejected() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        record_response(&db, &ticket.ticket_code, "agent-a", AuthorType::Agent, "done", &now_iso())
            .await
            .unwrap();
        resolve_ticket(&db, &ticket.ticket_code, "agent-a", &now_iso()).await.unwrap();

        let err = resolve_ticket(&db, &ticket.ticket_code, "agent-a", &now_iso()).await.unwrap_err();
        assert!(matches!(
            err,
            MesaError::InvalidTransition { from: TicketStatus::Resolved, action: "resolve" }
        ));
    }

    #[tokio::test]
    async fn close_timestamp_must_follow_resolution() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        record_response(&db, &ticket.ticket_code, "agent-a", AuthorType::Agent, "done", &now_iso())
            .await
            .unwrap();
        resolve_ticket(&db, &ticket.ticket_code, "agent-a", "2026-03-01T12:00:00.000Z").await.unwrap();

        let err = close_ticket(&db, &ticket.ticket_code, "2026-03-01T12:00:00.000Z")
            .await
            .unwrap_err();
        assert!(matches!(err, MesaError::EndNotAfterStart));

        let still_resolved = get_ticket(&db, &ticket.ticket_code).await.unwrap().unwrap();
        assert_eq!(still_resolved.status, TicketStatus::Resolved);
        assert!(still_resolved.closed_at.is_none());
    }

    #[tokio::test]
    async fn closed_ticket_rejects_responses_with_no_side_effects() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        record_response(&db, &ticket.ticket_code, "agent-a", AuthorType::Agent, "done", &now_iso())
            .await
            .unwrap();
        resolve_ticket(&db, &ticket.ticket_code, "agent-a", "2026-03-01T12:00:00.000Z").await.unwrap();
        close_ticket(&db, &ticket.ticket_code, "2026-03-01T12:00:01.000Z").await.unwrap();

        let before = get_ticket(&db, &ticket.ticket_code).await.unwrap().unwrap();
        let err = record_response(&db, &ticket.ticket_code, "user-1", AuthorType::User, "wait", &now_iso())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MesaError::TicketClosedForResponses { status: TicketStatus::Closed }
        ));

        let after = get_ticket(&db, &ticket.ticket_code).await.unwrap().unwrap();
        assert_eq!(after.updated_at, before.updated_at);
        let responses = crate::queries::responses::list_responses(&db, &ticket.ticket_code)
            .await
            .unwrap();
        assert_eq!(responses.len(), 1);
    }

    #[tokio::test]
    async fn delete_only_when_closed_and_cascades_responses() {
        let (db, _dir) = setup_db().await;
        let ticket = create_ticket(&db, make_ticket("co-1"), &now_iso()).await.unwrap();
        record_response(&db, &ticket.ticket_code, "agent-a", AuthorType::Agent, "done", &now_iso())
            .await
            .unwrap();

        let err = delete_ticket(&db, &ticket.ticket_code).await.unwrap_err();
        assert!(matches!(err, MesaError::InvalidTransition { action: "delete", .. }));

        resolve_ticket(&db, &ticket.ticket_code, "agent-a", "2026-03-01T12:00:00.000Z").await.unwrap();
        close_ticket(&db, &ticket.ticket_code, "2026-03-01T12:00:01.000Z").await.unwrap();
        delete_ticket(&db, &ticket.ticket_code).await.unwrap();

        assert!(get_ticket(&db, &ticket.ticket_code).await.unwrap().is_none());
        let orphans: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM ticket_responses", [], |row| row.get(0))?;
                Ok::<_, rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn unknown_ticket_operations_are_not_found() {
        let (db, _dir) = setup_db().await;
        assert!(get_ticket(&db, "TKT-2026-00042").await.unwrap().is_none());
        for result in [
            resolve_ticket(&db, "TKT-2026-00042", "agent-a", &now_iso()).await.err(),
            close_ticket(&db, "TKT-2026-00042", &now_iso()).await.err(),
            delete_ticket(&db, "TKT-2026-00042").await.err(),
        ] {
            assert!(matches!(result, Some(MesaError::NotFound { .. })));
        }
    }
}
