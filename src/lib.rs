//! uAttend punch automator
//!
//! Logs into a uAttend timesheet portal, works out which days of the current
//! pay period still need a punch, fills in the add-punch form for each of
//! them and reports the result to a Discord webhook.

pub mod errors;
pub mod helpers;
pub mod models;
pub mod service;

pub use service::{PunchService, RunOutcome};

// Re-export key types for convenience
pub use errors::{AutomatorError, BrowserError, ConfigError, NotifyError};
pub use helpers::browser::{Browser, ElementRef, Timeouts};
pub use models::config::{Config, RuntimeSettings};
pub use models::timesheet::{decide, PunchDecision, TimesheetRow};
