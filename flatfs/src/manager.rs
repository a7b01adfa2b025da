use chrono::DateTime;
use chrono::Utc;
use core::fmt::Debug;

/// Provides OS specific services to the core. The engine itself never touches a clock.
pub trait OSManager: Debug {
    fn current_time(&self) -> DateTime<Utc>;
}
