//! JWT claims carried by access tokens.

use serde::{Deserialize, Serialize};

/// Claims embedded in access tokens.
///
/// There is deliberately no `exp`: an access token lives exactly as long as
/// the session row named by `jti`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (owner GUID).
    pub sub: String,
    /// Session id.
    pub jti: String,
}
