//! User repository.

use super::DbError;
use crate::domain::{AuthProvider, NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Persistence operations for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    async fn find_by_provider_and_provider_id(
        &self,
        provider: AuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, DbError>;

    /// Insert a new user, returning it with its id and audit timestamps
    async fn save(&self, user: &NewUser) -> Result<User, DbError>;

    /// Overwrite nickname and profile image, bumping `updated_at`
    async fn update_profile(
        &self,
        id: i64,
        nickname: &str,
        profile_image: Option<&str>,
    ) -> Result<User, DbError>;

    /// Verify the backing store answers queries
    async fn ping(&self) -> Result<(), DbError>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    nickname: String,
    profile_image: Option<String>,
    provider: String,
    provider_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let provider = row
            .provider
            .parse::<AuthProvider>()
            .map_err(|e| DbError::CorruptRow(e.to_string()))?;

        Ok(User {
            id: row.id,
            email: row.email,
            nickname: row.nickname,
            profile_image: row.profile_image,
            provider,
            provider_id: row.provider_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, nickname, profile_image, provider, provider_id, created_at, updated_at";

/// PostgreSQL-backed [`UserRepository`].
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_provider_and_provider_id(
        &self,
        provider: AuthProvider,
        provider_id: &str,
    ) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE provider = $1 AND provider_id = $2"
        ))
        .bind(provider.as_str())
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn save(&self, user: &NewUser) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, nickname, profile_image, provider, provider_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(user.profile_image.as_deref())
        .bind(user.provider.as_str())
        .bind(&user.provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DbError::UserExists {
                        provider: user.provider.to_string(),
                        provider_id: user.provider_id.clone(),
                    };
                }
            }
            DbError::from(e)
        })?;

        User::try_from(row)
    }

    async fn update_profile(
        &self,
        id: i64,
        nickname: &str,
        profile_image: Option<&str>,
    ) -> Result<User, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET nickname = $2, profile_image = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(nickname)
        .bind(profile_image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::UserNotFound(id))?;

        User::try_from(row)
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
