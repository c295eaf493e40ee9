// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maintenance windows: scheduled downtime with a write-once actual
//! start/end pair.

use mesa_core::{MesaError, StampPair};
use rusqlite::{params, TransactionBehavior};
use tracing::info;

use crate::database::{map_tr_err, Database};
use crate::models::{row_to_window, MaintenanceWindow, NewMaintenanceWindow, WINDOW_COLUMNS};
use crate::queries::not_found;

/// Create a scheduled window. The actual start/end stamps begin unset.
pub async fn create_window(
    db: &Database,
    new: NewMaintenanceWindow,
    now: &str,
) -> Result<MaintenanceWindow, MesaError> {
    if new.title.trim().is_empty() {
        return Err(MesaError::Validation("window title must not be empty".to_string()));
    }
    if new.scheduled_end <= new.scheduled_start {
        return Err(MesaError::Validation(
            "scheduled end must be after scheduled start".to_string(),
        ));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = now.to_string();

    let window = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO maintenance_windows (id, company_id, title, scheduled_start,
                     scheduled_end, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    id,
                    new.company_id,
                    new.title,
                    new.scheduled_start,
                    new.scheduled_end,
                    now,
                ],
            )?;
            conn.query_row(
                &format!("SELECT {WINDOW_COLUMNS} FROM maintenance_windows WHERE id = ?1"),
                params![id],
                row_to_window,
            )
        })
        .await
        .map_err(map_tr_err)?;

    info!(window_id = %window.id, company_id = %window.company_id, "maintenance window created");
    Ok(window)
}

/// Get a window by id.
pub async fn get_window(db: &Database, id: &str) -> Result<Option<MaintenanceWindow>, MesaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {WINDOW_COLUMNS} FROM maintenance_windows WHERE id = ?1"),
                params![id],
                row_to_window,
            );
            match result {
                Ok(window) => Ok(Some(window)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Stamp the actual start.
///
/// Idempotent: marking an already-started window keeps the original stamp
/// and returns the unchanged row.
pub async fn mark_start(
    db: &Database,
    id: &str,
    now: &str,
) -> Result<MaintenanceWindow, MesaError> {
    let id = id.to_string();
    let now = now.to_string();

    let window = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(window) = select_window(&tx, &id)? else {
                return Ok(Err(not_found(format!("maintenance window {id}"))));
            };

            let mut stamps = StampPair::new(window.actual_start.clone(), window.actual_end.clone());
            let actual_start = stamps.mark_start(&now).to_string();
            if window.actual_start.is_none() {
                tx.execute(
                    "UPDATE maintenance_windows SET actual_start = ?2, updated_at = ?3
                     WHERE id = ?1",
                    params![id, actual_start, now],
                )?;
            }

            let updated = match select_window(&tx, &id)? {
                Some(window) => window,
                None => return Ok(Err(not_found(format!("maintenance window {id}")))),
            };
            tx.commit()?;
            Ok(Ok(updated))
        })
        .await
        .map_err(map_tr_err)??;

    info!(window_id = %window.id, "maintenance window started");
    Ok(window)
}

/// Stamp the actual end.
///
/// Requires a prior start, may only happen once, and the completion
/// timestamp must come strictly after the start.
pub async fn mark_complete(
    db: &Database,
    id: &str,
    now: &str,
) -> Result<MaintenanceWindow, MesaError> {
    let id = id.to_string();
    let now = now.to_string();

    let window = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(window) = select_window(&tx, &id)? else {
                return Ok(Err(not_found(format!("maintenance window {id}"))));
            };

            let mut stamps = StampPair::new(window.actual_start.clone(), window.actual_end.clone());
            if let Err(e) = stamps.mark_end(&now) {
                return Ok(Err(e));
            }

            tx.execute(
                "UPDATE maintenance_windows SET actual_end = ?2, updated_at = ?2
                 WHERE id = ?1",
                params![id, now],
            )?;
            let updated = match select_window(&tx, &id)? {
                Some(window) => window,
                None => return Ok(Err(not_found(format!("maintenance window {id}")))),
            };
            tx.commit()?;
            Ok(Ok(updated))
        })
        .await
        .map_err(map_tr_err)??;

    info!(window_id = %window.id, "maintenance window completed");
    Ok(window)
}

fn select_window(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<MaintenanceWindow>> {
    let result = conn.query_row(
        &format!("SELECT {WINDOW_COLUMNS} FROM maintenance_windows WHERE id = ?1"),
        params![id],
        row_to_window,
    );
    match result {
        Ok(window) => Ok(Some(window)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
