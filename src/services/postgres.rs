use crate::models::{
    Booking, BookingStatus, BusinessHoursInterval, Candidate, DateWindow, ProviderStatus, WorkingHours,
};
use crate::services::store::{ProviderStore, ServiceQuery, StoreError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

/// Provider directory backed by PostgreSQL
///
/// Reads merchants, their active services and their bookings. The schema lives in
/// `migrations/` and is applied on connect.
pub struct PostgresProviderStore {
    pool: PgPool,
}

impl PostgresProviderStore {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn like_patterns(keywords: &[String]) -> Vec<String> {
    keywords.iter().map(|k| format!("%{}%", k.to_lowercase())).collect()
}

fn candidate_from_row(row: &PgRow) -> Result<Candidate, StoreError> {
    let review_count: i32 = row.try_get("review_count")?;
    let duration: Option<i32> = row.try_get("duration_minutes")?;

    Ok(Candidate {
        service_id: row.try_get("service_id")?,
        provider_id: row.try_get("provider_id")?,
        provider_name: row.try_get("provider_name")?,
        service_name: row.try_get("service_name")?,
        category: row.try_get("category")?,
        base_price: row.try_get("base_price")?,
        duration_minutes: duration.and_then(|d| u32::try_from(d).ok()),
        rating: row.try_get::<Option<f64>, _>("rating")?.unwrap_or(0.0),
        review_count: u32::try_from(review_count).unwrap_or(0),
        is_verified: row.try_get("is_verified")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        ..Default::default()
    })
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let status: String = row.try_get("status")?;
    let status: BookingStatus = status.parse().map_err(StoreError::InvalidData)?;
    let date: NaiveDate = row.try_get("booking_date")?;
    let start_time: NaiveTime = row.try_get("start_time")?;

    Ok(Booking {
        provider_id: row.try_get("merchant_id")?,
        date,
        start_time,
        end_time: row.try_get("end_time")?,
        status,
    })
}

#[async_trait]
impl ProviderStore for PostgresProviderStore {
    async fn find_services_by_type(&self, query: &ServiceQuery) -> Result<Vec<Candidate>, StoreError> {
        let sql = r#"
            SELECT
                s.id AS service_id,
                m.id AS provider_id,
                m.business_name AS provider_name,
                s.name AS service_name,
                m.category,
                s.base_price,
                s.duration_minutes,
                m.rating,
                m.review_count,
                m.is_verified,
                m.latitude,
                m.longitude,
                m.city,
                m.state
            FROM services s
            JOIN merchants m ON m.id = s.merchant_id
            WHERE s.is_active
              AND (LOWER(s.name) LIKE ANY($1) OR LOWER(m.category) LIKE ANY($1))
              AND (cardinality($2::text[]) = 0 OR LOWER(m.city) = ANY($2))
        "#;

        let rows = sqlx::query(sql)
            .bind(like_patterns(&query.keywords))
            .bind(&query.cities)
            .fetch_all(&self.pool)
            .await?;

        let candidates = rows.iter().map(candidate_from_row).collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            "Service query '{}' matched {} rows",
            query.service_type,
            candidates.len()
        );
        Ok(candidates)
    }

    async fn get_bookings(&self, provider_id: &str, window: DateWindow) -> Result<Vec<Booking>, StoreError> {
        let sql = r#"
            SELECT merchant_id, booking_date, start_time, end_time, status
            FROM bookings
            WHERE merchant_id = $1
              AND booking_date BETWEEN $2 AND $3
            ORDER BY booking_date, start_time
        "#;

        let rows = sqlx::query(sql)
            .bind(provider_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(booking_from_row).collect()
    }

    async fn get_working_hours(&self, provider_id: &str) -> Result<Option<WorkingHours>, StoreError> {
        let sql = r#"
            SELECT business_hours, timezone
            FROM merchants
            WHERE id = $1
        "#;

        let Some(row) = sqlx::query(sql).bind(provider_id).fetch_optional(&self.pool).await? else {
            return Ok(None);
        };

        let raw: Option<serde_json::Value> = row.try_get("business_hours")?;
        let timezone: Option<String> = row.try_get("timezone")?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let intervals: Vec<BusinessHoursInterval> = serde_json::from_value(raw)
            .map_err(|e| StoreError::InvalidData(format!("business_hours for {}: {}", provider_id, e)))?;
        if intervals.is_empty() {
            return Ok(None);
        }
        Ok(Some(WorkingHours::from_intervals(&intervals, timezone)))
    }

    async fn get_provider_status(&self, provider_ids: &[String]) -> Result<Vec<ProviderStatus>, StoreError> {
        let sql = r#"
            SELECT id, rating, review_count, is_verified
            FROM merchants
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(sql).bind(provider_ids).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let review_count: i32 = row.try_get("review_count")?;
                Ok(ProviderStatus {
                    provider_id: row.try_get("id")?,
                    rating: row.try_get::<Option<f64>, _>("rating")?.unwrap_or(0.0),
                    review_count: u32::try_from(review_count).unwrap_or(0),
                    is_verified: row.try_get("is_verified")?,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
