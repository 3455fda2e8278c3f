//! Error types shared across the automator.
//!
//! Configuration problems are fatal before any browser work starts. Once a
//! session is up, the first `AutomatorError` stops row processing.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    // ---------------------------
    // Loading
    // ---------------------------
    #[error("no config found")]
    NotFound,

    #[error("config file corrupted? {0}")]
    Unreadable(String),

    #[error("config file json syntax error: {0}")]
    Syntax(String),

    // ---------------------------
    // Validation
    // ---------------------------
    #[error("credentials not set up in config")]
    MissingCredentials,

    #[error("invalid orgurl: {0:?}")]
    InvalidOrgUrl(String),

    #[error("{field} date for Date #{index} missing. Did you typo '{lower}' instead of '{field}'?", lower = .field.to_lowercase())]
    MissingSkipDate { index: usize, field: &'static str },

    #[error("{field} Date #{index} invalid format, must be YYYY-MM-DD")]
    InvalidSkipDate { index: usize, field: &'static str },

    #[error("workdays #{index} is missing, must be a number between 0-6")]
    MissingWorkday { index: usize },

    #[error("workdays #{index} is not a valid weekday ({value}), must be numbers between 0-6")]
    InvalidWorkday { index: usize, value: i64 },

    #[error("invalid punchtype {0:?}, must be value of either: {list}", list = crate::models::config::PUNCH_TYPES.join(", "))]
    InvalidPunchType(String),

    #[error("invalid benefittype {0:?}, must be value of either: {list}", list = crate::models::config::BENEFIT_TYPES.join(", "))]
    InvalidBenefitType(String),

    #[error("benefit hours invalid: {0:?} is not a positive number")]
    InvalidBenefitHours(String),

    #[error("{0} invalid. Did you typo the key name?")]
    MissingTime(&'static str),

    #[error("{field} invalid format, must be YYYY-MM-DD")]
    InvalidTime { field: &'static str },
}

/// Failures talking to the browser, whichever adapter is behind it.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("HTTP error talking to webdriver: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webdriver error {error}: {message}")]
    WebDriver { error: String, message: String },

    #[error("unexpected webdriver response: {0}")]
    Protocol(String),

    #[error("webdriver process error: {0}")]
    Process(#[from] std::io::Error),

    #[error("stale element reference {0}")]
    UnknownElement(String),

    #[error("scripted failure on element {0}")]
    Scripted(String),
}

/// Fatal errors of a punch run.
#[derive(Error, Debug)]
pub enum AutomatorError {
    #[error("cannot find {0}")]
    ElementNotFound(String),

    #[error("cannot parse row {row}'s date from {text:?}")]
    Parse { row: usize, text: String },

    #[error("option {label:?} not found in {field} (available: {})", .available.join(", "))]
    OptionNotFound {
        field: &'static str,
        label: String,
        available: Vec<String>,
    },

    #[error("{context}: {source}")]
    Browser {
        context: String,
        #[source]
        source: BrowserError,
    },
}

impl AutomatorError {
    pub fn browser(context: impl Into<String>, source: BrowserError) -> Self {
        AutomatorError::Browser {
            context: context.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("discord webhook not configured")]
    NotConfigured,

    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Network request was not 2xx: {0}")]
    Status(StatusCode),
}

pub type AutomatorResult<T> = Result<T, AutomatorError>;
