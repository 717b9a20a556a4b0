//! # Cryptographic Primitives
//!
//! The three primitives the authentication engine is built on:
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`jwt::TokenSigner`] | HS256 bearer-token sign/verify |
//! | [`password::SecretHasher`] | Argon2id hashing for passwords and client secrets |
//! | [`pkce::PkceCodes`] | PKCE S256 state/verifier/challenge generation |
//!
//! ## Division of Responsibility
//!
//! The signer verifies *signatures only*. Expiry, realm binding, and session
//! presence are policy decisions applied by the token service at
//! introspection time - an expired token must still decode cleanly so the
//! introspection endpoint can report `active = false` instead of erroring
//! (RFC 7662 semantics).

pub mod jwt;
pub mod password;
pub mod pkce;

// Re-export main types for convenient access
pub use jwt::{TokenSigner, TokenType};
pub use password::SecretHasher;
pub use pkce::PkceCodes;
