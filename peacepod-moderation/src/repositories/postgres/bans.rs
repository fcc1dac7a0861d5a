// src/repositories/postgres/bans.rs

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::Error;
use crate::models::{Ban, ViolationDetails};

#[async_trait::async_trait]
pub trait BanRepository: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Ban>, Error>;
    /// Creates or overwrites the single ban row keyed by `user_id`.
    async fn upsert(&self, ban: &Ban) -> Result<(), Error>;
    async fn delete(&self, user_id: &str) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<Ban>, Error>;
}

pub struct PostgresBanRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresBanRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_ban(r: &sqlx::postgres::PgRow) -> Result<Ban, Error> {
        let details: serde_json::Value = r.try_get("violation_details")?;
        Ok(Ban {
            user_id: r.try_get("user_id")?,
            ban_reason: r.try_get("ban_reason")?,
            violation_details: serde_json::from_value::<ViolationDetails>(details)?,
            ban_duration_minutes: r.try_get("ban_duration_minutes")?,
            ban_created_at: r.try_get::<DateTime<Utc>, _>("ban_created_at")?,
            ban_expires_at: r.try_get::<DateTime<Utc>, _>("ban_expires_at")?,
            violation_count: r.try_get("violation_count")?,
            is_active: r.try_get("is_active")?,
        })
    }
}

#[async_trait::async_trait]
impl BanRepository for PostgresBanRepository {
    async fn get(&self, user_id: &str) -> Result<Option<Ban>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id,
                   ban_reason,
                   violation_details,
                   ban_duration_minutes,
                   ban_created_at,
                   ban_expires_at,
                   violation_count,
                   is_active
            FROM user_bans
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_ban(&r)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, ban: &Ban) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO user_bans (
                user_id, ban_reason, violation_details, ban_duration_minutes,
                ban_created_at, ban_expires_at, violation_count, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE
            SET ban_reason = EXCLUDED.ban_reason,
                violation_details = EXCLUDED.violation_details,
                ban_duration_minutes = EXCLUDED.ban_duration_minutes,
                ban_created_at = EXCLUDED.ban_created_at,
                ban_expires_at = EXCLUDED.ban_expires_at,
                violation_count = EXCLUDED.violation_count,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(&ban.user_id)
        .bind(&ban.ban_reason)
        .bind(serde_json::to_value(&ban.violation_details)?)
        .bind(ban.ban_duration_minutes)
        .bind(ban.ban_created_at)
        .bind(ban.ban_expires_at)
        .bind(ban.violation_count)
        .bind(ban.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM user_bans WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Ban>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT user_id,
                   ban_reason,
                   violation_details,
                   ban_duration_minutes,
                   ban_created_at,
                   ban_expires_at,
                   violation_count,
                   is_active
            FROM user_bans
            ORDER BY ban_created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_ban).collect()
    }
}
