pub mod clock;
pub mod model;
pub mod policy;

pub use clock::{DateProvider, FixedDateProvider, LocalDateProvider};
pub use model::{Tier, UsageCounters, UsageDecision};
pub use policy::{reconcile_daily_window, DailyWindow, QuotaLimits, UsagePolicy};
