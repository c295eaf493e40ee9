// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain events emitted after successful store operations.
//!
//! Emission is fire-and-forget relative to the storage transaction: events
//! are sent after commit and can neither block nor roll it back. Downstream
//! notification dispatch subscribes to the bus; with no subscribers, events
//! are simply dropped.

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::AuthorType;

/// Events observable by the notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketEvent {
    /// A response was recorded and the transition engine applied.
    ResponseAdded {
        ticket_id: String,
        response_id: String,
        author_type: AuthorType,
    },
    /// A ticket was marked resolved.
    TicketResolved { ticket_id: String },
    /// A resolved ticket was closed.
    TicketClosed { ticket_id: String },
}

/// Broadcast bus for ticket events.
///
/// Cloning the bus shares the underlying channel; lagging subscribers miss
/// events rather than applying backpressure to the store.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TicketEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Never fails; a send error just means nobody listens.
    pub fn emit(&self, event: TicketEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "no event subscribers");
        }
    }
}
