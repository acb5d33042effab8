// Service exports
pub mod cache;
pub mod calendar;
pub mod llm;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{InMemorySessionStore, SessionCache, SessionError, SessionKey, SessionStore};
pub use calendar::{CalendarError, CalendarSource, StaticCalendar};
pub use llm::{LlmError, LlmLocationResolver, LocationResolver};
pub use memory::InMemoryProviderStore;
pub use postgres::PostgresProviderStore;
pub use store::{ProviderStore, RetryPolicy, RetryingStore, ServiceQuery, StoreError};
