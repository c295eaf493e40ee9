// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The response recorder: append a response and apply the transition engine
//! in one atomic transaction.

use mesa_core::engine::{self, Rule, TicketHead};
use mesa_core::types::{validate_content, AuthorType, EDIT_WINDOW_MINUTES};
use mesa_core::MesaError;
use rusqlite::{params, TransactionBehavior};
use tracing::info;

use crate::database::{map_tr_err, Database};
use crate::models::{row_to_response, TicketResponse, RESPONSE_COLUMNS};
use crate::queries::not_found;

/// Read the lifecycle head of a ticket inside the current transaction.
///
/// Returns `(ticket_id, head)`.
fn fetch_head(
    conn: &rusqlite::Connection,
    ticket_code: &str,
) -> rusqlite::Result<Option<(String, TicketHead)>> {
    let result = conn.query_row(
        "SELECT id, status, owner_agent_id, last_response_author_type, first_response_at
         FROM tickets WHERE ticket_code = ?1",
        params![ticket_code],
        |row| {
            let id: String = row.get(0)?;
            let status: String = row.get(1)?;
            let last: String = row.get(3)?;
            Ok((
                id,
                TicketHead {
                    status: status.parse().map_err(|_| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(std::io::Error::other(format!("invalid status: {status}"))),
                        )
                    })?,
                    owner_agent_id: row.get(2)?,
                    last_response_author_type: last.parse().map_err(|_| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            Box::new(std::io::Error::other(format!("invalid author: {last}"))),
                        )
                    })?,
                    first_response_at: row.get(4)?,
                },
            ))
        },
    );
    match result {
        Ok(head) => Ok(Some(head)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Append a response to a ticket and apply the transition engine.
///
/// Runs as one `BEGIN IMMEDIATE` transaction: the response insert and the
/// ticket-head update either both commit or neither does. Rejections
/// (unknown ticket, resolved/closed ticket) roll back with zero side effects.
pub async fn record_response(
    db: &Database,
    ticket_code: &str,
    author_id: &str,
    author_type: AuthorType,
    content: &str,
    now: &str,
) -> Result<TicketResponse, MesaError> {
    validate_content(content)?;

    let code = ticket_code.to_string();
    let author = author_id.to_string();
    let body = content.to_string();
    let response_id = uuid::Uuid::new_v4().to_string();
    let now = now.to_string();

    let recorded = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let Some((ticket_id, head)) = fetch_head(&tx, &code)? else {
                return Ok(Err(not_found(format!("ticket {code}"))));
            };
            if !head.status.accepts_responses() {
                return Ok(Err(MesaError::TicketClosedForResponses {
                    status: head.status,
                }));
            }

            tx.execute(
                "INSERT INTO ticket_responses (id, ticket_id, author_id, author_type, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    response_id,
                    ticket_id,
                    author,
                    author_type.to_string(),
                    body,
                    now,
                    now,
                ],
            )?;

            let transition = engine::apply_response(&head, author_type, &author, &now);
            match transition.rule {
                Rule::FirstAgentClaim => {
                    // Conditional claim: the WHERE clause is the
                    // compare-and-swap that keeps ownership sticky across
                    // writers. Zero rows means another agent already owns
                    // the ticket; stamp the follow-up fields instead.
                    let claimed = tx.execute(
                        "UPDATE tickets SET status = 'pending', owner_agent_id = ?2,
                             first_response_at = COALESCE(first_response_at, ?3),
                             last_response_author_type = 'agent', updated_at = ?3
                         WHERE id = ?1 AND owner_agent_id IS NULL",
                        params![ticket_id, author, now],
                    )?;
                    if claimed == 0 {
                        tx.execute(
                            "UPDATE tickets SET last_response_author_type = 'agent', updated_at = ?2
                             WHERE id = ?1",
                            params![ticket_id, now],
                        )?;
                    }
                }
                Rule::AgentFollowUp | Rule::UserReopen | Rule::UserKeepOpen => {
                    tx.execute(
                        "UPDATE tickets SET status = ?2, last_response_author_type = ?3, updated_at = ?4
                         WHERE id = ?1",
                        params![
                            ticket_id,
                            transition.head.status.to_string(),
                            transition.head.last_response_author_type.to_string(),
                            now,
                        ],
                    )?;
                }
            }

            tx.commit()?;
            Ok(Ok(TicketResponse {
                id: response_id,
                ticket_id,
                author_id: author,
                author_type,
                content: body,
                created_at: now.clone(),
                updated_at: now,
            }))
        })
        .await
        .map_err(map_tr_err)??;

    info!(
        ticket_id = %recorded.ticket_id,
        response_id = %recorded.id,
        author_type = %recorded.author_type,
        "response recorded"
    );
    Ok(recorded)
}

/// A ticket's responses in chronological order (ties broken by insertion).
pub async fn list_responses(
    db: &Database,
    ticket_code: &str,
) -> Result<Vec<TicketResponse>, MesaError> {
    let code = ticket_code.to_string();
    db.connection()
        .call(move |conn| {
            let ticket_id: Option<String> = match conn.query_row(
                "SELECT id FROM tickets WHERE ticket_code = ?1",
                params![code],
                |row| row.get(0),
            ) {
                Ok(id) => Some(id),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e),
            };
            let Some(ticket_id) = ticket_id else {
                return Ok(Err(not_found(format!("ticket {code}"))));
            };

            let mut stmt = conn.prepare(&format!(
                "SELECT {RESPONSE_COLUMNS} FROM ticket_responses
                 WHERE ticket_id = ?1 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let responses = stmt
                .query_map(params![ticket_id], row_to_response)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Ok(responses))
        })
        .await
        .map_err(map_tr_err)?
}

/// Get a response by id.
pub async fn get_response(db: &Database, id: &str) -> Result<Option<TicketResponse>, MesaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {RESPONSE_COLUMNS} FROM ticket_responses WHERE id = ?1"),
                params![id],
                row_to_response,
            );
            match result {
                Ok(response) => Ok(Some(response)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Edit a response's content.
///
/// Author-only, within 30 minutes of `created_at`. Editing never touches the
/// owning ticket's derived fields.
pub async fn update_response_content(
    db: &Database,
    response_id: &str,
    editor_id: &str,
    content: &str,
    now: &str,
) -> Result<TicketResponse, MesaError> {
    validate_content(content)?;

    let id = response_id.to_string();
    let editor = editor_id.to_string();
    let body = content.to_string();
    let now = now.to_string();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing = match tx.query_row(
                &format!("SELECT {RESPONSE_COLUMNS} FROM ticket_responses WHERE id = ?1"),
                params![id],
                row_to_response,
            ) {
                Ok(response) => response,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Ok(Err(not_found(format!("response {id}"))));
                }
                Err(e) => return Err(e),
            };

            if existing.author_id != editor {
                return Ok(Err(MesaError::PermissionDenied(
                    "only the author may edit a response".to_string(),
                )));
            }
            if !within_edit_window(&existing.created_at, &now) {
                return Ok(Err(MesaError::EditWindowExpired));
            }

            tx.execute(
                "UPDATE ticket_responses SET content = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, body, now],
            )?;
            tx.commit()?;

            Ok(Ok(TicketResponse {
                content: body,
                updated_at: now,
                ..existing
            }))
        })
        .await
        .map_err(map_tr_err)?
}

/// Whether `now` falls within the 30-minute edit window after `created_at`.
///
/// Unparseable timestamps fail closed (no edit).
fn within_edit_window(created_at: &str, now: &str) -> bool {
    let (Ok(created), Ok(now)) = (
        chrono::DateTime::parse_from_rfc3339(created_at),
        chrono::DateTime::parse_from_rfc3339(now),
    ) else {
        return false;
    };
    now.signed_duration_since(created) <= chrono::Duration::minutes(EDIT_WINDOW_MINUTES)
}
