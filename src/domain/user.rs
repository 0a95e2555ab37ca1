//! User roles and the in-memory user directory.
//!
//! The directory is populated from explicit fixtures at startup rather
//! than module-level mock data; role checks for all authority actions
//! and the new-ticket fan-out both resolve through it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::ids::UserId;
use crate::error::GatewayError;

/// Role a user holds in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A citizen who files and verifies tickets.
    Citizen,
    /// A government official who works tickets.
    Authority,
}

/// Minimal user profile held by the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Role held by the user.
    pub role: Role,
}

/// Lookup table for user profiles and roles.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-populated with fixture profiles.
    #[must_use]
    pub fn from_fixtures(profiles: Vec<UserProfile>) -> Self {
        let users = profiles.into_iter().map(|p| (p.id, p)).collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// Inserts or replaces a profile.
    pub async fn insert(&self, profile: UserProfile) {
        self.users.write().await.insert(profile.id, profile);
    }

    /// Returns the profile for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for unknown users.
    pub async fn get(&self, user_id: UserId) -> Result<UserProfile, GatewayError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(GatewayError::UserNotFound(*user_id.as_uuid()))
    }

    /// Returns the role of the given user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for unknown users.
    pub async fn role_of(&self, user_id: UserId) -> Result<Role, GatewayError> {
        Ok(self.get(user_id).await?.role)
    }

    /// Returns the IDs of all users holding the [`Role::Authority`] role.
    pub async fn authorities(&self) -> Vec<UserId> {
        self.users
            .read()
            .await
            .values()
            .filter(|p| p.role == Role::Authority)
            .map(|p| p.id)
            .collect()
    }

    /// Number of known users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` if the directory holds no users.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: UserId::new(),
            name: "test user".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn fixtures_populate_directory() {
        let citizen = profile(Role::Citizen);
        let authority = profile(Role::Authority);
        let authority_id = authority.id;

        let directory = UserDirectory::from_fixtures(vec![citizen, authority]);
        assert_eq!(directory.len().await, 2);
        assert_eq!(directory.role_of(authority_id).await.ok(), Some(Role::Authority));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let directory = UserDirectory::new();
        let result = directory.get(UserId::new()).await;
        assert!(matches!(result, Err(GatewayError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn authorities_filters_by_role() {
        let directory = UserDirectory::from_fixtures(vec![
            profile(Role::Citizen),
            profile(Role::Authority),
            profile(Role::Authority),
        ]);
        assert_eq!(directory.authorities().await.len(), 2);
    }
}
