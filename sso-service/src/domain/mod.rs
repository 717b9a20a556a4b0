//! # Domain Layer
//!
//! Entities, enumerations, token payloads, and introspection claims for the
//! SSO core.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`entities`] | Realm, Client, User, Group, IdentityProvider, UserIdentity, Session |
//! | [`enums`] | Role, UserStatus, ClientType, GrantType, IdentityProtocol |
//! | [`tokens`] | Token payloads and issued-token responses |
//! | [`claims`] | Introspection claim models (RFC 7662 style) |

pub mod claims;
pub mod entities;
pub mod enums;
pub mod tokens;

pub use claims::{ClientClaims, UserClaims};
pub use entities::{
    Client, Group, IdentityProvider, NewIdentity, NewUser, Realm, Session, User, UserIdentity,
};
pub use enums::{ClientType, GrantType, IdentityProtocol, Role, UserStatus};
pub use tokens::{ClientPayload, ClientToken, TokenPair, UserPayload};
