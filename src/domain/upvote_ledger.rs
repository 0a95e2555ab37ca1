//! At-most-once upvote accounting.
//!
//! The ledger's check-and-insert runs under a single write lock, so a
//! `(ticket, user)` pair can never produce two records even under
//! concurrent votes. Records are never mutated or deleted; their mere
//! existence is the guard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::ids::{TicketId, UserId};
use crate::error::GatewayError;

/// A single recorded vote. Created once, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpvoteRecord {
    /// Ticket that was voted on.
    pub ticket_id: TicketId,
    /// User who cast the vote.
    pub user_id: UserId,
    /// When the vote was cast.
    pub created_at: DateTime<Utc>,
}

/// Ledger of all upvote records, keyed by `(ticket, user)`.
#[derive(Debug, Default)]
pub struct UpvoteLedger {
    records: RwLock<HashMap<(TicketId, UserId), UpvoteRecord>>,
}

impl UpvoteLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a vote for the pair, atomically rejecting duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyUpvoted`] if the pair already has
    /// a record.
    pub async fn record(&self, ticket_id: TicketId, user_id: UserId) -> Result<(), GatewayError> {
        let mut records = self.records.write().await;
        let key = (ticket_id, user_id);
        if records.contains_key(&key) {
            return Err(GatewayError::AlreadyUpvoted(*ticket_id.as_uuid()));
        }
        records.insert(
            key,
            UpvoteRecord {
                ticket_id,
                user_id,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Returns `true` if the pair has already voted.
    pub async fn has_voted(&self, ticket_id: TicketId, user_id: UserId) -> bool {
        self.records.read().await.contains_key(&(ticket_id, user_id))
    }

    /// Total number of recorded votes across all tickets.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if no votes have been recorded.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
