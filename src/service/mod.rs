//! Service layer: orchestration between the API surface and the domain.

pub mod ticket_service;

pub use ticket_service::{
    CriticalityBucket, ResolutionProposal, SlaStats, TicketService, TicketSort,
};
