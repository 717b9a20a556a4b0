//! # Client Repository
//!
//! Realm-scoped client lookups for the client-credentials grant.
//!
//! Enum-valued columns (`client_type`, `grant_types`) are stored as text
//! and parsed at the boundary; a row that fails to parse is a data bug and
//! surfaces as an internal error rather than a silent skip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::errors::{AuthError, AuthResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::ClientRepo;
use crate::domain::Client;

/// PostgreSQL-backed client lookups.
#[derive(Debug, Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; text columns are parsed into domain enums on conversion.
#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    realm_id: Uuid,
    client_id: String,
    client_secret_hash: String,
    name: String,
    description: Option<String>,
    client_type: String,
    grant_types: Vec<String>,
    redirect_uris: Vec<String>,
    scopes: Vec<String>,
    enabled: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = AuthError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let client_type = row
            .client_type
            .parse()
            .map_err(|e: String| AuthError::Internal(e))?;
        let grant_types = row
            .grant_types
            .iter()
            .map(|g| g.parse())
            .collect::<Result<Vec<_>, String>>()
            .map_err(AuthError::Internal)?;

        Ok(Client {
            id: row.id,
            realm_id: row.realm_id,
            client_id: row.client_id,
            client_secret_hash: row.client_secret_hash,
            name: row.name,
            description: row.description,
            client_type,
            grant_types,
            redirect_uris: row.redirect_uris,
            scopes: row.scopes,
            enabled: row.enabled,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ClientRepo for PgClientRepository {
    async fn get_by_client_id(
        &self,
        realm_slug: &str,
        client_id: &str,
    ) -> AuthResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT c.id, c.realm_id, c.client_id, c.client_secret_hash, c.name,
                   c.description, c.client_type, c.grant_types, c.redirect_uris,
                   c.scopes, c.enabled, c.expires_at, c.created_at
            FROM clients c
            JOIN realms r ON r.id = c.realm_id
            WHERE r.slug = $1 AND c.client_id = $2
            "#,
        )
        .bind(realm_slug)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        row.map(Client::try_from).transpose()
    }
}
