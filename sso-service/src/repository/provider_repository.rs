//! # Identity-Provider Repository
//!
//! Lookups into the provider registry. The adapter name (`vk`, `yandex`)
//! is the registration key.

use async_trait::async_trait;
use shared::errors::{AuthError, AuthResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::IdentityProviderRepo;
use crate::domain::IdentityProvider;

/// PostgreSQL-backed provider registry.
#[derive(Debug, Clone)]
pub struct PgIdentityProviderRepository {
    pool: PgPool,
}

impl PgIdentityProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProviderRow {
    id: Uuid,
    name: String,
    protocol: String,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    enabled: bool,
}

impl TryFrom<ProviderRow> for IdentityProvider {
    type Error = AuthError;

    fn try_from(row: ProviderRow) -> Result<Self, Self::Error> {
        let protocol = row.protocol.parse().map_err(AuthError::Internal)?;
        Ok(IdentityProvider {
            id: row.id,
            name: row.name,
            protocol,
            client_id: row.client_id,
            client_secret: row.client_secret,
            scopes: row.scopes,
            enabled: row.enabled,
        })
    }
}

#[async_trait]
impl IdentityProviderRepo for PgIdentityProviderRepository {
    async fn get_by_name(&self, name: &str) -> AuthResult<Option<IdentityProvider>> {
        let row = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT id, name, protocol, client_id, client_secret, scopes, enabled
            FROM identity_providers
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        row.map(IdentityProvider::try_from).transpose()
    }
}
