//! # Realm Repository
//!
//! Read-only realm lookups. Realms are administered by an external CRUD
//! surface; the core resolves slugs on every authenticated path and checks
//! the `enabled` flag before anything else.

use async_trait::async_trait;
use shared::errors::{AuthError, AuthResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::RealmRepo;
use crate::domain::Realm;

/// PostgreSQL-backed realm lookups.
#[derive(Debug, Clone)]
pub struct PgRealmRepository {
    pool: PgPool,
}

impl PgRealmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RealmRepo for PgRealmRepository {
    async fn get_by_slug(&self, slug: &str) -> AuthResult<Option<Realm>> {
        let realm = sqlx::query_as::<_, Realm>(
            r#"
            SELECT id, slug, name, description, enabled, created_at
            FROM realms
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        Ok(realm)
    }

    async fn get(&self, id: Uuid) -> AuthResult<Option<Realm>> {
        let realm = sqlx::query_as::<_, Realm>(
            r#"
            SELECT id, slug, name, description, enabled, created_at
            FROM realms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        Ok(realm)
    }
}
