//! Concurrent ticket storage with per-ticket fine-grained locking.
//!
//! [`TicketRegistry`] stores all tickets in a `HashMap` where each entry
//! is individually protected by a [`tokio::sync::RwLock`]. Reads on the
//! same ticket are concurrent; writes to the same ticket are serialized,
//! which is what linearizes status transitions — the service re-checks
//! the current state under the write lock, so of two racing transitions
//! at most one can succeed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::TicketId;
use super::ticket::{Category, Ticket, TicketStatus};
use crate::error::GatewayError;

/// Filter parameters for [`TicketRegistry::list`].
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Only tickets in this status.
    pub status: Option<TicketStatus>,
    /// Only tickets in this category.
    pub category: Option<Category>,
    /// Only tickets reported in this ward.
    pub ward: Option<String>,
}

impl TicketFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(status) = self.status
            && ticket.status != status
        {
            return false;
        }
        if let Some(category) = self.category
            && ticket.category != category
        {
            return false;
        }
        if let Some(ward) = self.ward.as_deref()
            && ticket.location.ward.as_deref() != Some(ward)
        {
            return false;
        }
        true
    }
}

/// Central store for all tickets.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-entry
/// `Arc<RwLock<Ticket>>` for fine-grained per-ticket locking.
#[derive(Debug)]
pub struct TicketRegistry {
    tickets: RwLock<HashMap<TicketId, Arc<RwLock<Ticket>>>>,
}

impl TicketRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new ticket into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if a ticket with the same
    /// ID already exists (should never happen with UUID v4).
    pub async fn insert(&self, ticket: Ticket) -> Result<TicketId, GatewayError> {
        let ticket_id = ticket.id;
        let mut map = self.tickets.write().await;
        if map.contains_key(&ticket_id) {
            return Err(GatewayError::InvalidRequest(format!(
                "ticket {ticket_id} already exists"
            )));
        }
        map.insert(ticket_id, Arc::new(RwLock::new(ticket)));
        Ok(ticket_id)
    }

    /// Returns a shared reference to the ticket behind its per-ticket lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TicketNotFound`] if no ticket with the
    /// given ID exists.
    pub async fn get(&self, ticket_id: TicketId) -> Result<Arc<RwLock<Ticket>>, GatewayError> {
        let map = self.tickets.read().await;
        map.get(&ticket_id)
            .cloned()
            .ok_or(GatewayError::TicketNotFound(*ticket_id.as_uuid()))
    }

    /// Returns snapshots of all tickets matching the filter.
    pub async fn list(&self, filter: &TicketFilter) -> Vec<Ticket> {
        let map = self.tickets.read().await;
        let mut tickets = Vec::with_capacity(map.len());
        for entry_lock in map.values() {
            let ticket = entry_lock.read().await;
            if filter.matches(&ticket) {
                tickets.push(ticket.clone());
            }
        }
        tickets
    }

    /// Returns the number of tickets in the registry.
    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    /// Returns `true` if the registry contains no tickets.
    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

impl Default for TicketRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ids::UserId;
    use crate::domain::ticket::{Criticality, Location};
    use crate::domain::{classifier, sla};
    use chrono::Utc;

    fn make_ticket(category: Category, ward: &str) -> Ticket {
        let now = Utc::now();
        let criticality = classifier::classify(category, "");
        Ticket::new(
            TicketId::new(),
            UserId::new(),
            category,
            String::new(),
            Location {
                lat: 26.91,
                lng: 75.78,
                ward: Some(ward.to_string()),
                address: None,
            },
            criticality,
            sla::deadline_for(criticality, now),
            now,
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = TicketRegistry::new();
        let ticket = make_ticket(Category::Pothole, "C-Scheme");
        let id = ticket.id;

        let result = registry.insert(ticket).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap_or_default(), id);

        let fetched = registry.get(id).await;
        assert!(fetched.is_ok());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let registry = TicketRegistry::new();
        let ticket = make_ticket(Category::Pothole, "C-Scheme");
        let dup = ticket.clone();

        let _ = registry.insert(ticket).await;
        let result = registry.insert(dup).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let registry = TicketRegistry::new();
        let result = registry.get(TicketId::new()).await;
        assert!(matches!(result, Err(GatewayError::TicketNotFound(_))));
    }

    #[tokio::test]
    async fn list_returns_all_without_filter() {
        let registry = TicketRegistry::new();
        let _ = registry.insert(make_ticket(Category::Pothole, "C-Scheme")).await;
        let _ = registry.insert(make_ticket(Category::Drainage, "Malviya Nagar")).await;

        let list = registry.list(&TicketFilter::default()).await;
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn list_filters_by_category_and_ward() {
        let registry = TicketRegistry::new();
        let _ = registry.insert(make_ticket(Category::Pothole, "C-Scheme")).await;
        let _ = registry.insert(make_ticket(Category::Drainage, "Malviya Nagar")).await;

        let filter = TicketFilter {
            category: Some(Category::Drainage),
            ..TicketFilter::default()
        };
        assert_eq!(registry.list(&filter).await.len(), 1);

        let filter = TicketFilter {
            ward: Some("C-Scheme".to_string()),
            ..TicketFilter::default()
        };
        assert_eq!(registry.list(&filter).await.len(), 1);

        let filter = TicketFilter {
            category: Some(Category::Drainage),
            ward: Some("C-Scheme".to_string()),
            ..TicketFilter::default()
        };
        assert!(registry.list(&filter).await.is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let registry = TicketRegistry::new();
        let ticket = make_ticket(Category::Traffic, "Vaishali Nagar");
        let id = ticket.id;
        let _ = registry.insert(ticket).await;

        let filter = TicketFilter {
            status: Some(TicketStatus::Submitted),
            ..TicketFilter::default()
        };
        assert_eq!(registry.list(&filter).await.len(), 1);

        // Move the ticket and re-check.
        if let Ok(lock) = registry.get(id).await {
            let mut ticket = lock.write().await;
            ticket.status = TicketStatus::InProgress;
        }
        assert!(registry.list(&filter).await.is_empty());

        let criticality_unchanged = registry.list(&TicketFilter::default()).await;
        assert_eq!(criticality_unchanged.len(), 1);
    }

    #[tokio::test]
    async fn len_and_is_empty() {
        let registry = TicketRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);

        let _ = registry.insert(make_ticket(Category::Other, "X")).await;
        assert!(!registry.is_empty().await);
        assert_eq!(registry.len().await, 1);
    }
}
