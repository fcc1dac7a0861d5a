// src/repositories/postgres/violations.rs

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::Error;
use crate::models::{ContentFlag, Violation};

#[async_trait::async_trait]
pub trait ViolationRepository: Send + Sync {
    /// Appends a violation row. The store assigns `created_at`; the stored
    /// row is returned. Violations are never updated or deleted.
    async fn insert(&self, violation: &Violation) -> Result<Violation, Error>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Violation>, Error>;
    async fn count_for_user(&self, user_id: &str) -> Result<i64, Error>;
}

pub struct PostgresViolationRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresViolationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_violation(r: &sqlx::postgres::PgRow) -> Result<Violation, Error> {
        let flags: serde_json::Value = r.try_get("flags")?;
        Ok(Violation {
            violation_id: r.try_get("violation_id")?,
            user_id: r.try_get("user_id")?,
            content: r.try_get("content")?,
            flags: serde_json::from_value::<Vec<ContentFlag>>(flags)?,
            severity: r.try_get("severity")?,
            risk_level: r.try_get("risk_level")?,
            content_type: r.try_get("content_type")?,
            created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
            violation_number: r.try_get("violation_number")?,
        })
    }
}

#[async_trait::async_trait]
impl ViolationRepository for PostgresViolationRepository {
    async fn insert(&self, violation: &Violation) -> Result<Violation, Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_violations (
                violation_id, user_id, content, flags, severity,
                risk_level, content_type, created_at, violation_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), $8)
            RETURNING created_at
            "#,
        )
        .bind(violation.violation_id)
        .bind(&violation.user_id)
        .bind(&violation.content)
        .bind(serde_json::to_value(&violation.flags)?)
        .bind(violation.severity)
        .bind(violation.risk_level)
        .bind(violation.content_type)
        .bind(violation.violation_number)
        .fetch_one(&self.pool)
        .await?;

        let mut stored = violation.clone();
        stored.created_at = row.try_get::<DateTime<Utc>, _>("created_at")?;
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Violation>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT violation_id,
                   user_id,
                   content,
                   flags,
                   severity,
                   risk_level,
                   content_type,
                   created_at,
                   violation_number
            FROM user_violations
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_violation).collect()
    }

    async fn count_for_user(&self, user_id: &str) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM user_violations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("cnt")?)
    }
}
