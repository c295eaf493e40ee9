// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the TicketStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use mesa_config::StorageConfig;
use mesa_core::types::{
    now_iso, AuthorType, HealthStatus, MaintenanceWindow, NewMaintenanceWindow, NewTicket, Ticket,
    TicketResponse, TicketStatus,
};
use mesa_core::{EventBus, MesaError, TicketEvent, TicketStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed ticket store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is lazily opened on the first call to [`TicketStore::initialize`].
/// Domain events are emitted on the shared [`EventBus`] after a mutation
/// commits, never before.
pub struct SqliteTicketStore {
    config: StorageConfig,
    db: OnceCell<Database>,
    events: EventBus,
}

impl SqliteTicketStore {
    /// Create a store with the given configuration and event bus.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    pub fn new(config: StorageConfig, events: EventBus) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            events,
        }
    }

    /// The event bus this store emits on. Subscribe here for notifications.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn db(&self) -> Result<&Database, MesaError> {
        self.db.get().ok_or_else(|| MesaError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn initialize(&self) -> Result<(), MesaError> {
        let db = Database::open_with(&self.config).await?;
        self.db.set(db).map_err(|_| MesaError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite ticket store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MesaError> {
        let db = self.db()?;
        // Checkpoint WAL before handing the file back to the filesystem.
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, MesaError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    // --- Tickets ---

    async fn create_ticket(&self, new: NewTicket) -> Result<Ticket, MesaError> {
        queries::tickets::create_ticket(self.db()?, new, &now_iso()).await
    }

    async fn get_ticket(&self, ticket_code: &str) -> Result<Option<Ticket>, MesaError> {
        queries::tickets::get_ticket(self.db()?, ticket_code).await
    }

    async fn list_tickets(
        &self,
        company_id: &str,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, MesaError> {
        queries::tickets::list_tickets(self.db()?, company_id, status).await
    }

    async fn resolve_ticket(
        &self,
        ticket_code: &str,
        actor_agent_id: &str,
    ) -> Result<Ticket, MesaError> {
        let ticket =
            queries::tickets::resolve_ticket(self.db()?, ticket_code, actor_agent_id, &now_iso())
                .await?;
        self.events.emit(TicketEvent::TicketResolved {
            ticket_id: ticket.id.clone(),
        });
        Ok(ticket)
    }

    async fn close_ticket(&self, ticket_code: &str) -> Result<Ticket, MesaError> {
        let ticket = queries::tickets::close_ticket(self.db()?, ticket_code, &now_iso()).await?;
        self.events.emit(TicketEvent::TicketClosed {
            ticket_id: ticket.id.clone(),
        });
        Ok(ticket)
    }

    async fn delete_ticket(&self, ticket_code: &str) -> Result<(), MesaError> {
        queries::tickets::delete_ticket(self.db()?, ticket_code).await
    }

    // --- Responses ---

    async fn record_response(
        &self,
        ticket_code: &str,
        author_id: &str,
        author_type: AuthorType,
        content: &str,
    ) -> Result<TicketResponse, MesaError> {
        let response = queries::responses::record_response(
            self.db()?,
            ticket_code,
            author_id,
            author_type,
            content,
            &now_iso(),
        )
        .await?;
        self.events.emit(TicketEvent::ResponseAdded {
            ticket_id: response.ticket_id.clone(),
            response_id: response.id.clone(),
            author_type: response.author_type,
        });
        Ok(response)
    }

    async fn list_responses(&self, ticket_code: &str) -> Result<Vec<TicketResponse>, MesaError> {
        queries::responses::list_responses(self.db()?, ticket_code).await
    }

    async fn update_response_content(
        &self,
        response_id: &str,
        editor_id: &str,
        content: &str,
    ) -> Result<TicketResponse, MesaError> {
        queries::responses::update_response_content(
            self.db()?,
            response_id,
            editor_id,
            content,
            &now_iso(),
        )
        .await
    }

    // --- Maintenance windows ---

    async fn create_window(
        &self,
        new: NewMaintenanceWindow,
    ) -> Result<MaintenanceWindow, MesaError> {
        queries::maintenance::create_window(self.db()?, new, &now_iso()).await
    }

    async fn get_window(&self, id: &str) -> Result<Option<MaintenanceWindow>, MesaError> {
        queries::maintenance::get_window(self.db()?, id).await
    }

    async fn mark_window_start(&self, id: &str) -> Result<MaintenanceWindow, MesaError> {
        queries::maintenance::mark_start(self.db()?, id, &now_iso()).await
    }

    async fn mark_window_complete(&self, id: &str) -> Result<MaintenanceWindow, MesaError> {
        queries::maintenance::mark_complete(self.db()?, id, &now_iso()).await
    }
}
