//! # User Repository
//!
//! User reads, the two registration writes, and group membership queries.
//!
//! ## Query Patterns
//!
//! | Pattern | Example |
//! |---------|---------|
//! | Lowercased email | `WHERE email = lower($1)` - emails are stored lowercased |
//! | Returning | `INSERT ... RETURNING *` to get generated fields |
//! | Parameterized | always `$1, $2`, never string interpolation |
//!
//! ## Write ordering
//!
//! `create_with_identity` runs user insert then identity insert inside one
//! transaction. A failure before commit leaves nothing behind, so a
//! half-registered OAuth user cannot exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::errors::{AuthError, AuthResult};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::UserRepo;
use crate::domain::{Group, NewIdentity, NewUser, User, UserIdentity, UserStatus};

/// PostgreSQL-backed user repository.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// =============================================================================
// Row shapes
// =============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: Option<String>,
    username: Option<String>,
    password_hash: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status: UserStatus = row.status.parse().map_err(AuthError::Internal)?;
        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: Uuid,
    realm_id: Uuid,
    name: String,
    description: Option<String>,
    roles: Vec<String>,
}

impl TryFrom<GroupRow> for Group {
    type Error = AuthError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<_>, String>>()
            .map_err(AuthError::Internal)?;
        Ok(Group {
            id: row.id,
            realm_id: row.realm_id,
            name: row.name,
            description: row.description,
            roles,
        })
    }
}

/// Maps a unique-constraint violation onto the conflict kind; everything
/// else stays a database error.
fn map_insert_error(e: sqlx::Error, resource: &str) -> AuthError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return AuthError::AlreadyExists(resource.to_string());
        }
    }
    AuthError::Database(e)
}

// =============================================================================
// Implementation
// =============================================================================

#[async_trait]
impl UserRepo for PgUserRepository {
    async fn create(&self, user: NewUser) -> AuthResult<User> {
        let email = user.email.map(|e| e.to_lowercase());

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, username, password_hash, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, password_hash, status, created_at
            "#,
        )
        .bind(&email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "email"))?;

        let user = User::try_from(row)?;
        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn create_with_identity(&self, identity: NewIdentity) -> AuthResult<User> {
        let email = identity.email.to_lowercase();

        let mut tx = self.pool.begin().await.map_err(AuthError::Database)?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, username, password_hash, status)
            VALUES ($1, NULL, NULL, $2)
            RETURNING id, email, username, password_hash, status, created_at
            "#,
        )
        .bind(&email)
        .bind(UserStatus::Active.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, "email"))?;

        let user = User::try_from(row)?;
        let link = UserIdentity {
            id: Uuid::new_v4(),
            user_id: user.id,
            provider_id: identity.provider_id,
            provider_user_id: identity.provider_user_id,
            email,
        };

        sqlx::query(
            r#"
            INSERT INTO user_identities (id, user_id, provider_id, provider_user_id, email)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(link.id)
        .bind(link.user_id)
        .bind(link.provider_id)
        .bind(&link.provider_user_id)
        .bind(&link.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, "provider identity"))?;

        tx.commit().await.map_err(AuthError::Database)?;

        info!(user_id = %user.id, provider_id = %link.provider_id, "User registered via provider");
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password_hash, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        row.map(User::try_from).transpose()
    }

    async fn get_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password_hash, status, created_at
            FROM users
            WHERE email = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        row.map(User::try_from).transpose()
    }

    async fn get_by_provider(&self, provider_user_id: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.username, u.password_hash, u.status, u.created_at
            FROM users u
            JOIN user_identities i ON i.user_id = u.id
            WHERE i.provider_user_id = $1
            "#,
        )
        .bind(provider_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        row.map(User::try_from).transpose()
    }

    async fn get_groups(&self, realm_slug: &str, user_id: Uuid) -> AuthResult<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT g.id, g.realm_id, g.name, g.description, g.roles
            FROM groups g
            JOIN user_groups ug ON ug.group_id = g.id
            JOIN realms r ON r.id = g.realm_id
            WHERE r.slug = $1 AND ug.user_id = $2
            "#,
        )
        .bind(realm_slug)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AuthError::Database)?;

        rows.into_iter().map(Group::try_from).collect()
    }
}
