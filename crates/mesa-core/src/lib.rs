// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mesa helpdesk ticketing system.
//!
//! This crate provides the domain types, the pure ticket transition engine,
//! the write-once timestamp-pair abstraction shared by ticket resolution and
//! maintenance windows, domain events, and the `TicketStore` trait that
//! request handlers consume. Persistence lives in `mesa-storage`.

pub mod engine;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;
pub mod window;

// Re-export key items at crate root for ergonomic imports.
pub use error::MesaError;
pub use events::{EventBus, TicketEvent};
pub use traits::TicketStore;
pub use types::{
    AuthorType, HealthStatus, LastAuthor, MaintenanceWindow, NewMaintenanceWindow, NewTicket,
    Ticket, TicketResponse, TicketStatus,
};
pub use window::StampPair;
