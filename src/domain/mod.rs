//! Domain layer: the Ticket Lifecycle & SLA Engine.
//!
//! Contains the ticket aggregate and its closed lifecycle enums, the
//! pure criticality classifier and SLA calculators, the concurrent
//! ticket registry, the upvote ledger, the user directory, and the
//! event bus that broadcasts every state mutation.

pub mod classifier;
pub mod event_bus;
pub mod ids;
pub mod sla;
pub mod ticket;
pub mod ticket_event;
pub mod ticket_registry;
pub mod upvote_ledger;
pub mod user;

pub use event_bus::EventBus;
pub use ids::{TicketId, UserId};
pub use ticket::Ticket;
pub use ticket_event::TicketEvent;
pub use ticket_registry::{TicketFilter, TicketRegistry};
pub use upvote_ledger::UpvoteLedger;
pub use user::{Role, UserDirectory, UserProfile};
