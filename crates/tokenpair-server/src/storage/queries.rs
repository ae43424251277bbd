//! Database queries for the tokenpair server.

use tokenpair_core::db::{DatabaseError, unix_timestamp};

use super::db::AuthDatabase;
use super::models::{NewSession, Session, User};

impl AuthDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Provision a user.
    pub async fn create_user(&self, guid: &str) -> Result<User, DatabaseError> {
        sqlx::query("INSERT INTO users (guid, created_at) VALUES (?, ?)")
            .bind(guid)
            .bind(unix_timestamp())
            .execute(self.pool())
            .await?;

        self.find_user(guid)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {guid}")))
    }

    /// Look up a user by GUID.
    pub async fn find_user(&self, guid: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE guid = ?")
            .bind(guid)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// Remove a user together with all of their sessions.
    pub async fn delete_user(&self, guid: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE guid = ?")
            .bind(guid)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Session queries
    // =========================================================================

    /// Insert a new session row.
    pub async fn create_session(&self, session: &NewSession) -> Result<Session, DatabaseError> {
        insert_session(self.pool(), session).await?;

        self.get_session(&session.id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Session {}", session.id)))
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &str) -> Result<Option<Session>, DatabaseError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(session)
    }

    pub async fn session_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Delete a session. Returns `false` if it was already gone.
    pub async fn delete_session(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace a session with a new one in a single transaction.
    ///
    /// The old row is only consumed if it still carries `old_hash`. Returns
    /// `false` without inserting anything when another caller got there first.
    pub async fn rotate_session(
        &self,
        old_id: &str,
        old_hash: &str,
        replacement: &NewSession,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let deleted = sqlx::query("DELETE FROM sessions WHERE id = ? AND refresh_hash = ?")
            .bind(old_id)
            .bind(old_hash)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_session(&mut *tx, replacement).await?;
        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_session<'e, E>(executor: E, session: &NewSession) -> Result<(), DatabaseError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO sessions (id, refresh_hash, ip, user_agent, user_guid, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(&session.refresh_hash)
    .bind(&session.ip)
    .bind(&session.user_agent)
    .bind(&session.user_guid)
    .bind(unix_timestamp())
    .execute(executor)
    .await?;
    Ok(())
}
