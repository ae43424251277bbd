//! Data models for tokenpair storage.

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub guid: String,
    pub created_at: i64,
}

/// A persisted refresh session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub refresh_hash: String,
    pub ip: String,
    pub user_agent: String,
    pub user_guid: String,
    pub created_at: i64,
}

/// Values for a session row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub refresh_hash: String,
    pub ip: String,
    pub user_agent: String,
    pub user_guid: String,
}
