//! Access token signing and validation.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::AccessClaims;

/// Signs and verifies HS512 access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a new `TokenCodec` with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        // Any HMAC variant is accepted on the way in; `none` and asymmetric
        // algorithms are not.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["sub".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue an access token naming `owner_guid` and `session_id`.
    pub fn issue_access_token(
        &self,
        owner_guid: &str,
        session_id: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = AccessClaims {
            sub: owner_guid.to_string(),
            jti: session_id.to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
    }

    /// Verify a token's signature and algorithm and return its claims.
    ///
    /// Missing or non-string `sub`/`jti` fail deserialization.
    pub fn parse_access_token(
        &self,
        token: &str,
    ) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}
