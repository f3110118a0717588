//! Domain models shared across XTrend crates
//!
//! All wire types serialize with camelCase field names so the JSON shape
//! matches what browser clients already store in cookies and local storage.

pub mod quota;
pub mod task;
pub mod trend;
pub mod user;

pub use quota::{QuotaInfo, QuotaLimits, UsageRecord};
pub use task::{Locale, Scenario, ScenarioTasks, Task};
pub use trend::{Demographics, Trend};
pub use user::{AgeGroup, Ethnicity, Region, UserIdentity, UserProfile, UserRole};
