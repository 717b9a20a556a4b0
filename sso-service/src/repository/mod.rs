//! # Repository Layer
//!
//! Abstract persistence capabilities the core depends on, plus their
//! PostgreSQL implementations.
//!
//! The core is read-mostly: realms, clients, groups, and provider
//! registrations are administered elsewhere and only read here. The two
//! write paths are local registration (`create`) and OAuth registration
//! (`create_with_identity`).
//!
//! ## Contracts
//!
//! | Trait | Operations |
//! |-------|-----------|
//! | [`RealmRepo`] | `get_by_slug`, `get` |
//! | [`ClientRepo`] | `get_by_client_id` (realm-scoped) |
//! | [`UserRepo`] | `create`, `create_with_identity`, `get`, `get_by_email`, `get_by_provider`, `get_groups` |
//! | [`IdentityProviderRepo`] | `get_by_name` |
//!
//! Services hold the traits as `Arc<dyn ...>`; tests substitute `mockall`
//! mocks. Concrete implementations hold a `PgPool` (cheap to clone,
//! `Arc`-based).

mod client_repository;
mod provider_repository;
mod realm_repository;
mod user_repository;

pub use client_repository::PgClientRepository;
pub use provider_repository::PgIdentityProviderRepository;
pub use realm_repository::PgRealmRepository;
pub use user_repository::PgUserRepository;

use async_trait::async_trait;
use shared::errors::AuthResult;
use uuid::Uuid;

use crate::domain::{Client, Group, IdentityProvider, NewIdentity, NewUser, Realm, User};

/// Realm lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealmRepo: Send + Sync {
    /// Finds a realm by its URL slug.
    async fn get_by_slug(&self, slug: &str) -> AuthResult<Option<Realm>>;

    /// Finds a realm by id.
    async fn get(&self, id: Uuid) -> AuthResult<Option<Realm>>;
}

/// Client lookups, always scoped by realm.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepo: Send + Sync {
    /// Finds a client by `(realm slug, public client id)`.
    async fn get_by_client_id(&self, realm_slug: &str, client_id: &str)
        -> AuthResult<Option<Client>>;
}

/// User reads plus the two registration writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Creates a local user. Email is lowercased at storage; duplicate
    /// emails surface as `AlreadyExists`.
    async fn create(&self, user: NewUser) -> AuthResult<User>;

    /// Creates a user and their provider identity in one logical unit
    /// (OAuth registration). User creation precedes identity creation.
    async fn create_with_identity(&self, identity: NewIdentity) -> AuthResult<User>;

    /// Finds a user by id.
    async fn get(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Finds a user by email (input is lowercased before comparison).
    async fn get_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Finds a user through a linked provider identity.
    async fn get_by_provider(&self, provider_user_id: &str) -> AuthResult<Option<User>>;

    /// All groups the user belongs to inside a realm.
    async fn get_groups(&self, realm_slug: &str, user_id: Uuid) -> AuthResult<Vec<Group>>;
}

/// Identity-provider registry lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProviderRepo: Send + Sync {
    /// Finds a registered provider by its registration key (`vk`, `yandex`).
    async fn get_by_name(&self, name: &str) -> AuthResult<Option<IdentityProvider>>;
}
