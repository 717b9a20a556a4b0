//! # Role Resolver
//!
//! Computes the effective role list for a `(user, realm)` pair: the union of
//! all group roles in the realm, or the default `[user]` when the user has
//! no group membership there.
//!
//! Roles are deduplicated through a sorted set, so the resulting order is
//! stable and the space-joined claim round-trips.

use shared::errors::AuthResult;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::enums::DEFAULT_ROLES;
use crate::domain::Role;
use crate::repository::UserRepo;

/// Effective-role computation over the user repository.
#[derive(Clone)]
pub struct RoleResolver {
    users: Arc<dyn UserRepo>,
}

impl RoleResolver {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    /// Resolves the role list for a user inside a realm.
    pub async fn resolve(&self, realm_slug: &str, user_id: Uuid) -> AuthResult<Vec<Role>> {
        let groups = self.users.get_groups(realm_slug, user_id).await?;

        if groups.is_empty() {
            debug!(%user_id, realm = realm_slug, "No group membership, default roles");
            return Ok(DEFAULT_ROLES.to_vec());
        }

        let roles: BTreeSet<Role> = groups
            .iter()
            .flat_map(|group| group.roles.iter().copied())
            .collect();

        Ok(roles.into_iter().collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
