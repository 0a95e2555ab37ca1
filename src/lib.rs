//! # civic-gateway
//!
//! REST gateway for a civic-issue tracker: ticket lifecycle, SLA
//! tracking and per-user notification feeds.
//!
//! Tickets are filed by citizens, classified into a criticality tier
//! from their description, and stamped with an SLA deadline. Authorities
//! work tickets through a state machine whose completion path runs
//! through citizen verification; every mutation emits an event that a
//! background dispatcher fans out into notification feeds.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── TicketService (service/)
//!     ├── EventBus (domain/)
//!     │       └── NotificationDispatcher (notify/)
//!     │
//!     ├── TicketRegistry / UpvoteLedger / UserDirectory (domain/)
//!     │
//!     └── PostgreSQL Persistence (event log + snapshots)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
