// db/userdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{UserProfile, UserRole, VerificationStatus};

const USER_COLUMNS: &str = r#"
    id, name, email, password, role, email_verified,
    verification_token, token_expires_at,
    verified, verification_status, verified_at, reviewed_by,
    legal_name, id_number, address,
    created_at, updated_at
"#;

#[async_trait]
pub trait UserExt: Send + Sync {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, sqlx::Error>;

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<UserProfile>, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<UserProfile, sqlx::Error>;

    /// Marks the e-mail behind `token` as verified and clears the token.
    async fn verifed_token(&self, token: &str) -> Result<(), sqlx::Error>;

    /// Changes the role of a non-admin account. `None` when the target is
    /// missing or is an admin.
    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<Option<UserProfile>, sqlx::Error>;

    /// Saves KYC fields and puts the profile back in the review queue.
    async fn update_user_profile(
        &self,
        user_id: Uuid,
        legal_name: &str,
        id_number: &str,
        address: &str,
    ) -> Result<UserProfile, sqlx::Error>;

    async fn get_pending_profiles(&self, exclude: Uuid) -> Result<Vec<UserProfile>, sqlx::Error>;

    /// Applies a review decision to a profile that is still pending.
    /// `None` when the profile is missing or no longer pending.
    async fn update_verification(
        &self,
        user_id: Uuid,
        reviewer: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<UserProfile>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let mut user: Option<UserProfile> = None;

        if let Some(user_id) = user_id {
            let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
            user = sqlx::query_as::<_, UserProfile>(&sql)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
            user = sqlx::query_as::<_, UserProfile>(&sql)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(token) = token {
            let sql = format!(
                "SELECT {} FROM users WHERE verification_token = $1 AND token_expires_at > NOW()",
                USER_COLUMNS
            );
            user = sqlx::query_as::<_, UserProfile>(&sql)
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<UserProfile>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
    ) -> Result<UserProfile, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, password, verification_token, token_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(name)
            .bind(email)
            .bind(password)
            .bind(verification_token)
            .bind(token_expires_at)
            .fetch_one(&self.pool)
            .await
    }

    async fn verifed_token(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verified = true,
                verification_token = NULL,
                token_expires_at = NULL,
                updated_at = NOW()
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1 AND role <> 'admin'::user_role
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(target_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        legal_name: &str,
        id_number: &str,
        address: &str,
    ) -> Result<UserProfile, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET legal_name = $2,
                id_number = $3,
                address = $4,
                verified = false,
                verification_status = 'pending'::verification_status,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .bind(legal_name)
            .bind(id_number)
            .bind(address)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_pending_profiles(&self, exclude: Uuid) -> Result<Vec<UserProfile>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM users
            WHERE verified = false
              AND verification_status = 'pending'::verification_status
              AND id <> $1
              AND COALESCE(TRIM(legal_name), '') <> ''
              AND COALESCE(TRIM(id_number), '') <> ''
              AND COALESCE(TRIM(address), '') <> ''
            ORDER BY updated_at ASC
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(exclude)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_verification(
        &self,
        user_id: Uuid,
        reviewer: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let approved = status == VerificationStatus::Verified;
        let sql = format!(
            r#"
            UPDATE users
            SET verified = $2,
                verification_status = $3,
                verified_at = CASE WHEN $2 THEN NOW() ELSE NULL END,
                reviewed_by = $4,
                updated_at = NOW()
            WHERE id = $1
              AND verification_status = 'pending'::verification_status
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .bind(approved)
            .bind(status)
            .bind(reviewer)
            .fetch_optional(&self.pool)
            .await
    }
}
