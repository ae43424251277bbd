//! Token-pair issuance, rotation and revocation.

use std::fmt;

use tracing::{debug, info, instrument, warn};

use tokenpair_core::db::DatabaseError;

use super::error::AuthError;
use crate::auth::{
    AccessClaims, SecretHasher, TokenCodec, decode_refresh_token, encode_refresh_token,
    generate_refresh_secret, generate_session_id,
};
use crate::notifications::{AddressChange, WebhookNotifier};
use crate::storage::{AuthDatabase, NewSession, Session};

/// An access token and the refresh token that goes with it.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

/// Result of a successful rotation.
#[derive(Debug, Clone)]
pub struct RotationOutcome {
    pub tokens: TokenPair,
    /// Set when the refresh came from a different address than the session
    /// was bound to.
    pub address_change: Option<AddressChange>,
}

pub struct SessionService {
    db: AuthDatabase,
    codec: TokenCodec,
    hasher: SecretHasher,
    notifier: Option<WebhookNotifier>,
}

impl SessionService {
    pub const fn new(
        db: AuthDatabase,
        codec: TokenCodec,
        hasher: SecretHasher,
        notifier: Option<WebhookNotifier>,
    ) -> Self {
        Self {
            db,
            codec,
            hasher,
            notifier,
        }
    }

    pub const fn db(&self) -> &AuthDatabase {
        &self.db
    }

    /// Open a new session for `guid` bound to `ip` and `user_agent`.
    #[instrument(skip(self, user_agent))]
    pub async fn issue(
        &self,
        guid: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<TokenPair, AuthError> {
        if uuid::Uuid::parse_str(guid).is_err() {
            return Err(AuthError::InvalidIdentity);
        }

        if self.db.find_user(guid).await?.is_none() {
            return Err(AuthError::IdentityNotFound);
        }

        let (session, tokens) = self.mint(guid, ip, user_agent)?;

        self.db.create_session(&session).await.map_err(|e| match e {
            DatabaseError::Conflict(_) => AuthError::NotUnique,
            // The user was removed after the lookup above.
            DatabaseError::ForeignKey(_) => AuthError::IdentityNotFound,
            other => AuthError::Storage(other),
        })?;

        info!(guid, session_id = %session.id, "Issued token pair");
        Ok(tokens)
    }

    /// Validate a token pair and replace its session with a new one.
    ///
    /// The returned outcome carries any address change; nothing is sent
    /// to the webhook. See [`Self::refresh`].
    #[instrument(skip(self, access_token, refresh_token, user_agent))]
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<RotationOutcome, AuthError> {
        let claims = self.parse(access_token)?;
        let secret =
            decode_refresh_token(refresh_token).map_err(|_| AuthError::InvalidRefreshToken)?;

        if self.db.find_user(&claims.sub).await?.is_none() {
            return Err(AuthError::IdentityNotFound);
        }

        let session = self
            .owned_session(&claims)
            .await?
            .ok_or(AuthError::InvalidAccessToken)?;

        let matches = self
            .hasher
            .verify(&secret, &session.refresh_hash)
            .unwrap_or_else(|e| {
                warn!(session_id = %session.id, error = %e, "Stored refresh hash is malformed");
                false
            });
        if !matches {
            warn!(session_id = %session.id, "Refresh token does not match session");
            return Err(AuthError::InvalidRefreshToken);
        }

        if session.user_agent != user_agent {
            warn!(
                session_id = %session.id,
                guid = %claims.sub,
                "User agent changed, revoking session"
            );
            self.db.delete_session(&session.id).await?;
            return Err(AuthError::WrongUserAgent);
        }

        let address_change = (session.ip != ip).then(|| {
            warn!(
                guid = %claims.sub,
                old_ip = %session.ip,
                new_ip = %ip,
                "Refresh from a new address"
            );
            AddressChange::now(&claims.sub, &session.ip, ip)
        });

        let (replacement, tokens) = self.mint(&claims.sub, ip, user_agent)?;

        let rotated = self
            .db
            .rotate_session(&session.id, &session.refresh_hash, &replacement)
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => AuthError::NotUnique,
                other => AuthError::Storage(other),
            })?;
        if !rotated {
            debug!(session_id = %session.id, "Session already consumed by a concurrent refresh");
            return Err(AuthError::InvalidAccessToken);
        }

        info!(
            guid = %claims.sub,
            old_session = %session.id,
            new_session = %replacement.id,
            "Rotated token pair"
        );

        Ok(RotationOutcome {
            tokens,
            address_change,
        })
    }

    /// [`Self::rotate`], then report any address change in the background.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<TokenPair, AuthError> {
        let outcome = self
            .rotate(access_token, refresh_token, ip, user_agent)
            .await?;

        if let Some(change) = outcome.address_change {
            match &self.notifier {
                Some(notifier) => drop(notifier.dispatch(change)),
                None => debug!(guid = %change.guid, "No webhook configured, address change not reported"),
            }
        }

        Ok(outcome.tokens)
    }

    /// Return the GUID an access token was issued to, if its session is live.
    #[instrument(skip_all)]
    pub async fn who_am_i(&self, access_token: &str) -> Result<String, AuthError> {
        let claims = self.parse(access_token)?;

        if self.owned_session(&claims).await?.is_none() {
            return Err(AuthError::InvalidAccessToken);
        }

        Ok(claims.sub)
    }

    /// Revoke the session named by an access token. Repeating it is harmless.
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self.parse(access_token)?;

        if self.db.delete_session(&claims.jti).await? {
            info!(guid = %claims.sub, session_id = %claims.jti, "Session revoked");
        } else {
            debug!(session_id = %claims.jti, "Logout for a session that is already gone");
        }
        Ok(())
    }

    fn parse(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        self.codec.parse_access_token(access_token).map_err(|e| {
            debug!(error = %e, "Access token rejected");
            AuthError::InvalidAccessToken
        })
    }

    /// The session named by `claims`, provided it belongs to `claims.sub`.
    async fn owned_session(&self, claims: &AccessClaims) -> Result<Option<Session>, AuthError> {
        let session = self.db.get_session(&claims.jti).await?;
        Ok(session.filter(|s| s.user_guid == claims.sub))
    }

    /// Fresh session row plus the tokens handed to the client for it.
    fn mint(
        &self,
        guid: &str,
        ip: &str,
        user_agent: &str,
    ) -> Result<(NewSession, TokenPair), AuthError> {
        let session_id = generate_session_id();
        let secret = generate_refresh_secret().map_err(|e| {
            warn!(error = %e, "OS random source unavailable");
            AuthError::TokenGenerationFailed
        })?;
        let refresh_hash = self
            .hasher
            .hash(&secret)
            .map_err(|_| AuthError::TokenGenerationFailed)?;
        let access_token = self
            .codec
            .issue_access_token(guid, &session_id)
            .map_err(|_| AuthError::TokenGenerationFailed)?;

        let session = NewSession {
            id: session_id,
            refresh_hash,
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            user_guid: guid.to_string(),
        };
        let tokens = TokenPair {
            access_token,
            refresh_token: encode_refresh_token(&secret),
        };
        Ok((session, tokens))
    }
}
