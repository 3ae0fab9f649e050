use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password;

/// Account role; `Admin` passes the admin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// User record.
///
/// `password_hash` is `None` unless the caller asked for it; most reads have
/// no business seeing it, and the column is replaced with NULL in those
/// queries. Neither the hash nor the reset fields ever serialize.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: Role,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str =
    "id, handle, email, password_hash, role, reset_token_hash, reset_token_expires_at, created_at";
const COLUMNS_NO_HASH: &str =
    "id, handle, email, NULL::text AS password_hash, role, reset_token_hash, reset_token_expires_at, created_at";

fn columns(include_password_hash: bool) -> &'static str {
    if include_password_hash {
        COLUMNS
    } else {
        COLUMNS_NO_HASH
    }
}

impl User {
    /// Creates a user. The plaintext password is hashed here; it never
    /// reaches the database.
    pub async fn create(
        db: &PgPool,
        handle: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<User> {
        let hash = password::hash_password(password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (handle, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, handle, email, password_hash, role, reset_token_hash, reset_token_expires_at, created_at
            "#,
        )
        .bind(handle)
        .bind(email)
        .bind(hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Single-value lookup matching either unique identity column.
    pub async fn find_by_email_or_handle(db: &PgPool, value: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 OR handle = $1",
            columns(false)
        ))
        .bind(value)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(
        db: &PgPool,
        email: &str,
        include_password_hash: bool,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            columns(include_password_hash)
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(
        db: &PgPool,
        id: Uuid,
        include_password_hash: bool,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            columns(include_password_hash)
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Matches a pending reset by digest. Expiry is checked in the same
    /// statement that reads the row, so an expired token can never match.
    pub async fn find_by_reset_hash(db: &PgPool, token_hash: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE reset_token_hash = $1 AND reset_token_expires_at > now()",
            columns(false)
        ))
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_handle(db: &PgPool, id: Uuid, handle: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET handle = $2 WHERE id = $1")
            .bind(id)
            .bind(handle)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Replaces the stored password. Takes the plaintext and hashes it here,
    /// so a caller can never double-hash or store plaintext by mistake.
    pub async fn set_password(db: &PgPool, id: Uuid, new_password: &str) -> anyhow::Result<()> {
        let hash = password::hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Stores a pending reset digest and its expiry, displacing any earlier
    /// pending reset for the same user.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Consumes a reset: new password in, both reset fields cleared, one
    /// statement. A token that reached this point cannot be replayed.
    pub async fn reset_password(db: &PgPool, id: Uuid, new_password: &str) -> anyhow::Result<()> {
        let hash = password::hash_password(new_password)?;
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token_hash = NULL, reset_token_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Checks a plaintext against the loaded hash. Errors if the row was
    /// fetched without the hash; that is a programming mistake, not a
    /// failed login.
    pub fn verify_password(&self, plaintext: &str) -> anyhow::Result<bool> {
        let Some(hash) = self.password_hash.as_deref() else {
            anyhow::bail!("password hash not loaded for user {}", self.id);
        };
        password::verify_password(plaintext, hash)
    }
}

/// True when `err` wraps a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            handle: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: Some("$argon2id$fake".into()),
            role: Role::User,
            reset_token_hash: Some("deadbeef".into()),
            reset_token_expires_at: Some(datetime!(2024-01-01 00:30 UTC)),
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn serialization_hides_credentials() {
        let json = serde_json::to_value(sample_user()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 5);
        for hidden in ["passwordHash", "password_hash", "resetTokenHash", "resetTokenExpiresAt"] {
            assert!(!object.contains_key(hidden), "{hidden} must not serialize");
        }
        assert_eq!(json["handle"], "alice");
        assert_eq!(json["role"], "user");
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn verify_password_requires_a_loaded_hash() {
        let mut user = sample_user();
        user.password_hash = None;
        let err = user.verify_password("anything").unwrap_err();
        assert!(err.to_string().contains("not loaded"));
    }

    #[test]
    fn unique_violation_probe_ignores_other_errors() {
        assert!(!is_unique_violation(&anyhow::anyhow!("some other failure")));
        let not_db: anyhow::Error = sqlx::Error::RowNotFound.into();
        assert!(!is_unique_violation(&not_db));
    }
}
