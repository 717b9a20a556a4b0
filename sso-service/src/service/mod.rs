//! # Service Layer
//!
//! Business logic of the authentication engine.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`token`] | Issue token pairs / client tokens, introspection policy |
//! | [`roles`] | Effective role list for `(user, realm)` |
//! | [`client_auth`] | Client-credentials verification |
//! | [`user_auth`] | Local login, refresh, logout, realm switch |
//!
//! The OAuth provider engine lives in [`crate::oauth`]; it composes the
//! same token service and role resolver.

pub mod client_auth;
pub mod roles;
pub mod token;
pub mod user_auth;

pub use client_auth::ClientAuthService;
pub use roles::RoleResolver;
pub use token::TokenService;
pub use user_auth::UserAuthService;
