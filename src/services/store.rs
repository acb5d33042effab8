use crate::models::{Booking, Candidate, DateWindow, ProviderStatus, WorkingHours};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by a provider store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Store timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout(_) | StoreError::Unavailable(_) => true,
            StoreError::Database(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            StoreError::Migrate(_) | StoreError::InvalidData(_) => false,
        }
    }
}

/// Candidate lookup criteria for the service stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceQuery {
    pub service_type: String,
    /// Lowercased keywords matched against service name and category
    pub keywords: Vec<String>,
    /// Lowercased city names; empty means any city
    pub cities: Vec<String>,
}

/// Read-only access to providers, services and their calendars
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Active services whose name or category matches the query keywords
    async fn find_services_by_type(&self, query: &ServiceQuery) -> Result<Vec<Candidate>, StoreError>;

    /// Bookings of one provider within the window (inclusive)
    async fn get_bookings(&self, provider_id: &str, window: DateWindow) -> Result<Vec<Booking>, StoreError>;

    /// Weekly hours of one provider, `None` when the provider never published any
    async fn get_working_hours(&self, provider_id: &str) -> Result<Option<WorkingHours>, StoreError>;

    /// Fresh verification and rating data
    async fn get_provider_status(&self, provider_ids: &[String]) -> Result<Vec<ProviderStatus>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Backoff policy for transient store failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        self.base_delay.mul_f64(factor).min(self.max_delay)
    }
}

/// Decorator that retries transient failures of the wrapped store
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ProviderStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

macro_rules! with_retry {
    ($self:ident, $op:literal, $call:expr) => {{
        let mut attempt = 1;
        loop {
            match $call.await {
                Ok(value) => break Ok(value),
                Err(err) if err.is_transient() && attempt < $self.policy.max_attempts => {
                    let delay = $self.policy.delay_for(attempt);
                    warn!(operation = $op, attempt, ?delay, "Transient store error, retrying: {}", err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => break Err(err),
            }
        }
    }};
}

#[async_trait]
impl<S: ProviderStore> ProviderStore for RetryingStore<S> {
    async fn find_services_by_type(&self, query: &ServiceQuery) -> Result<Vec<Candidate>, StoreError> {
        with_retry!(self, "find_services_by_type", self.inner.find_services_by_type(query))
    }

    async fn get_bookings(&self, provider_id: &str, window: DateWindow) -> Result<Vec<Booking>, StoreError> {
        with_retry!(self, "get_bookings", self.inner.get_bookings(provider_id, window))
    }

    async fn get_working_hours(&self, provider_id: &str) -> Result<Option<WorkingHours>, StoreError> {
        with_retry!(self, "get_working_hours", self.inner.get_working_hours(provider_id))
    }

    async fn get_provider_status(&self, provider_ids: &[String]) -> Result<Vec<ProviderStatus>, StoreError> {
        with_retry!(self, "get_provider_status", self.inner.get_provider_status(provider_ids))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}
