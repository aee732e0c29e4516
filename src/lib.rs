// src/lib.rs

//! Verification of BYU signed JWTs.
//!
//! A [`Verifier`](verifier::Verifier) discovers the provider's signing keys
//! through its `.well-known/openid-configuration` document, checks a token's
//! signature, issuer and expiration, and returns the claims with the BYU and
//! WSO2 claim URIs folded into structured groups.

pub mod claims;
pub mod error;
pub mod verifier;

/// Request header carrying the JWT for the current hop.
pub const BYU_JWT_HEADER_CURRENT: &str = "X-JWT-Assertion";

/// Request header carrying the JWT issued for the original caller.
pub const BYU_JWT_HEADER_ORIGINAL: &str = "X-JWT-Assertion-Original";

/// The public prelude for the `byu-jwt` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::claims::{
        normalize, ByuClaims, ClaimMap, ClaimValue, ClientClaims, DecodedJwt, ResourceOwnerClaims,
        WebresCheck, Wso2Application, Wso2Claims,
    };
    pub use crate::error::ByuJwtError;
    pub use crate::verifier::{
        config::{Config, ConfigBuilder, KeyMode, ValidationDetails},
        get_issuer,
        keys::{KeyFamily, KeySet, PublicKey},
        model::DiscoveryDocument,
        Verifier,
    };
    pub use crate::{BYU_JWT_HEADER_CURRENT, BYU_JWT_HEADER_ORIGINAL};

    pub use jsonwebtoken::Algorithm;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_constants() {
        assert_eq!(BYU_JWT_HEADER_CURRENT, "X-JWT-Assertion");
        assert_eq!(BYU_JWT_HEADER_ORIGINAL, "X-JWT-Assertion-Original");
    }
}
