use crate::models::{BusyInterval, DateWindow, UserIdentity};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Calendar not authorized for user {0}")]
    NotAuthorized(String),

    #[error("Calendar unavailable: {0}")]
    Unavailable(String),
}

/// The user's own calendar, read only to enrich scheduling questions
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn busy_intervals(&self, user: &UserIdentity, window: DateWindow) -> Result<Vec<BusyInterval>, CalendarError>;
}

/// Fixed busy intervals per user
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    busy: HashMap<String, Vec<BusyInterval>>,
}

impl StaticCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_busy(mut self, user: &str, interval: BusyInterval) -> Self {
        self.busy.entry(user.to_string()).or_default().push(interval);
        self
    }
}

#[async_trait]
impl CalendarSource for StaticCalendar {
    async fn busy_intervals(&self, user: &UserIdentity, window: DateWindow) -> Result<Vec<BusyInterval>, CalendarError> {
        let Some(intervals) = self.busy.get(user.as_str()) else {
            return Err(CalendarError::NotAuthorized(user.as_str().to_string()));
        };
        Ok(intervals
            .iter()
            .filter(|b| window.contains(b.start.date()) || window.contains(b.end.date()))
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_static_calendar_filters_window() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let busy = |d: NaiveDate| BusyInterval {
            start: d.and_hms_opt(9, 0, 0).unwrap(),
            end: d.and_hms_opt(10, 0, 0).unwrap(),
        };
        let calendar = StaticCalendar::new()
            .with_busy("u1", busy(day))
            .with_busy("u1", busy(day + chrono::Duration::days(10)));

        let found = calendar
            .busy_intervals(&UserIdentity("u1".to_string()), DateWindow::spanning(day, 3))
            .await
            .unwrap();
        assert_eq!(found, vec![busy(day)]);

        let unknown = calendar
            .busy_intervals(&UserIdentity("u2".to_string()), DateWindow::single(day))
            .await;
        assert!(matches!(unknown, Err(CalendarError::NotAuthorized(_))));
    }
}
