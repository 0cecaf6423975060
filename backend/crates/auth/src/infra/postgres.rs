//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::domain::DomainError;
use kernel::id::UserId;
use platform::password::HashedPassword;
use sqlx::PgPool;
use sqlx::error::DatabaseError;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entity::{
    session::{SessionData, SessionRecord},
    user::{Credential, NewUser, User},
};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{email::Email, session_id::SessionId};
use crate::error::{AuthError, AuthResult};

/// Unique constraint on `users.email`
pub const USERS_EMAIL_CONSTRAINT: &str = "users_uc_email";

/// Whether a database error is the email uniqueness violation
///
/// Uses the structured constraint name when the driver reports one and
/// falls back to the message text otherwise.
fn is_duplicate_email(db_err: &dyn DatabaseError) -> bool {
    if !db_err.is_unique_violation() {
        return false;
    }
    match db_err.constraint() {
        Some(constraint) => constraint == USERS_EMAIL_CONSTRAINT,
        None => db_err.message().contains(USERS_EMAIL_CONSTRAINT),
    }
}

fn map_insert_error(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::Database(db_err) if is_duplicate_email(db_err.as_ref()) => {
            DomainError::DuplicateEmail.into()
        }
        _ => e.into(),
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &NewUser) -> AuthResult<UserId> {
        let user_id = UserId::new();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, hashed_password, created)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(user_id)
    }

    async fn lookup_credential(&self, email: &Email) -> AuthResult<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, hashed_password FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credential)
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn credential_by_id(&self, user_id: &UserId) -> AuthResult<Credential> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, hashed_password FROM users WHERE id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credential)
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn exists(&self, user_id: &UserId) -> AuthResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user)
            .ok_or_else(|| DomainError::NoRecord.into())
    }

    async fn update_password(&self, user_id: &UserId, hash: &HashedPassword) -> AuthResult<()> {
        let updated = sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(hash.as_phc_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(DomainError::NoRecord.into());
        }
        Ok(())
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

/// PostgreSQL-backed session store
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PgSessionStore {
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT token, data, version, expiry
            FROM sessions
            WHERE token = $1 AND expiry > now()
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_record))
    }

    async fn insert(&self, record: &SessionRecord) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, data, version, expiry)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id.as_str())
        .bind(Json(&record.data))
        .bind(record.version)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace(&self, record: &SessionRecord, expected_version: i64) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE sessions
            SET data = $2, version = $3, expiry = $4
            WHERE token = $1 AND version = $5
            "#,
        )
        .bind(record.id.as_str())
        .bind(Json(&record.data))
        .bind(record.version)
        .bind(record.expires_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn rotate(
        &self,
        old_id: &SessionId,
        expected_version: i64,
        record: &SessionRecord,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM sessions WHERE token = $1 AND version = $2")
            .bind(old_id.as_str())
            .bind(expected_version)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO sessions (token, data, version, expiry)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id.as_str())
        .bind(Json(&record.data))
        .bind(record.version)
        .bind(record.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: &SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expiry < now()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    created: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::from_uuid(self.id),
            name: self.name,
            email: Email::from_db(self.email),
            created: self.created,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    hashed_password: String,
}

impl CredentialRow {
    fn into_credential(self) -> Credential {
        Credential {
            user_id: UserId::from_uuid(self.id),
            password_hash: HashedPassword::from_stored(self.hashed_password),
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token: String,
    data: Json<SessionData>,
    version: i64,
    expiry: DateTime<Utc>,
}

impl SessionRow {
    fn into_record(self) -> SessionRecord {
        SessionRecord {
            id: SessionId::from_db(self.token),
            data: self.data.0,
            expires_at: self.expiry,
            version: self.version,
        }
    }
}
