use crate::models::{Booking, Candidate, DateWindow, ProviderStatus, WorkingHours};
use crate::services::store::{ProviderStore, ServiceQuery, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Provider store held entirely in memory
///
/// Backs tests and the benchmark, and serves as a local fixture when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProviderStore {
    services: Vec<Candidate>,
    bookings: HashMap<String, Vec<Booking>>,
    hours: HashMap<String, WorkingHours>,
    status: HashMap<String, ProviderStatus>,
}

impl InMemoryProviderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service offering. The provider's status is seeded from the candidate
    /// unless one was set explicitly.
    pub fn with_service(mut self, candidate: Candidate) -> Self {
        self.status
            .entry(candidate.provider_id.clone())
            .or_insert_with(|| ProviderStatus {
                provider_id: candidate.provider_id.clone(),
                rating: candidate.rating,
                review_count: candidate.review_count,
                is_verified: candidate.is_verified,
            });
        self.services.push(candidate);
        self
    }

    pub fn with_booking(mut self, booking: Booking) -> Self {
        self.bookings
            .entry(booking.provider_id.clone())
            .or_default()
            .push(booking);
        self
    }

    pub fn with_hours(mut self, provider_id: &str, hours: WorkingHours) -> Self {
        self.hours.insert(provider_id.to_string(), hours);
        self
    }

    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status.insert(status.provider_id.clone(), status);
        self
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn matches_query(candidate: &Candidate, query: &ServiceQuery) -> bool {
    let name = candidate.service_name.to_lowercase();
    let category = candidate.category.to_lowercase();
    let keyword_hit = query
        .keywords
        .iter()
        .any(|k| name.contains(k.as_str()) || category.contains(k.as_str()));

    let city_hit = query.cities.is_empty()
        || candidate
            .city
            .as_deref()
            .map(|c| query.cities.iter().any(|q| q.eq_ignore_ascii_case(c)))
            .unwrap_or(false);

    keyword_hit && city_hit
}

#[async_trait]
impl ProviderStore for InMemoryProviderStore {
    async fn find_services_by_type(&self, query: &ServiceQuery) -> Result<Vec<Candidate>, StoreError> {
        Ok(self
            .services
            .iter()
            .filter(|c| matches_query(c, query))
            .cloned()
            .collect())
    }

    async fn get_bookings(&self, provider_id: &str, window: DateWindow) -> Result<Vec<Booking>, StoreError> {
        Ok(self
            .bookings
            .get(provider_id)
            .map(|bookings| {
                bookings
                    .iter()
                    .filter(|b| window.contains(b.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_working_hours(&self, provider_id: &str) -> Result<Option<WorkingHours>, StoreError> {
        Ok(self.hours.get(provider_id).cloned())
    }

    async fn get_provider_status(&self, provider_ids: &[String]) -> Result<Vec<ProviderStatus>, StoreError> {
        Ok(provider_ids
            .iter()
            .filter_map(|id| self.status.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn haircut(provider: &str, city: &str) -> Candidate {
        Candidate {
            service_id: format!("svc-{}", provider),
            provider_id: provider.to_string(),
            provider_name: format!("{} Studio", provider),
            service_name: "Men's Haircut".to_string(),
            category: "Hair".to_string(),
            base_price: 45.0,
            rating: 4.6,
            review_count: 20,
            is_verified: true,
            city: Some(city.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_query_matches_keywords_and_city() {
        let store = InMemoryProviderStore::new()
            .with_service(haircut("p1", "Boston"))
            .with_service(haircut("p2", "New York"));

        let query = ServiceQuery {
            service_type: "haircut".to_string(),
            keywords: vec!["haircut".to_string(), "hair".to_string()],
            cities: vec!["boston".to_string()],
        };
        let found = store.find_services_by_type(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].provider_id, "p1");
    }

    #[tokio::test]
    async fn test_bookings_limited_to_window() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let booking = |date: NaiveDate| Booking {
            provider_id: "p1".to_string(),
            date,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: None,
            status: BookingStatus::Confirmed,
        };
        let store = InMemoryProviderStore::new()
            .with_booking(booking(day))
            .with_booking(booking(day.succ_opt().unwrap()));

        let bookings = store.get_bookings("p1", DateWindow::single(day)).await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert!(store.get_bookings("p2", DateWindow::single(day)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_status_overrides_listing() {
        let store = InMemoryProviderStore::new()
            .with_status(ProviderStatus {
                provider_id: "p1".to_string(),
                rating: 3.2,
                review_count: 4,
                is_verified: false,
            })
            .with_service(haircut("p1", "Boston"));

        let status = store.get_provider_status(&["p1".to_string()]).await.unwrap();
        assert_eq!(status[0].rating, 3.2);
        assert!(!status[0].is_verified);
    }
}
