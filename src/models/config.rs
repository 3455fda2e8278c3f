use chrono::{NaiveDate, Weekday};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{env, fs, io, path::Path};
use tracing::{debug, info};

use crate::errors::ConfigError;

pub const CONFIG_ENV_VAR: &str = "UATTEND_CONFIG";
pub const CONFIG_FILE: &str = "config.json";

pub const PUNCH_TYPES: [&str; 4] = ["In/Out", "Break", "Lunch", "Benefit"];
pub const BENEFIT_TYPES: [&str; 4] = [
    "VAC - Vacation",
    "SIC - Sick",
    "HOL - Holiday",
    "OTH - Other",
];
pub const BENEFIT_PUNCH: &str = "Benefit";

const CONFIG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys are PascalCase. The camelCase and all-lowercase spellings of each
/// key are accepted too.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    #[serde(default, alias = "credentials")]
    pub credentials: Credentials,
    #[serde(rename = "OrgURL", default, alias = "OrgUrl", alias = "orgUrl", alias = "orgurl")]
    pub org_url: String,
    #[serde(default, alias = "skipDates", alias = "skipdates")]
    pub skip_dates: Vec<SkipDate>,
    /// `null` entries are kept so validation can reject them.
    #[serde(default, alias = "workdays")]
    pub workdays: Vec<Option<i64>>,
    #[serde(default, alias = "behavior")]
    pub behavior: Behavior,
    #[serde(default, alias = "discord")]
    pub discord: DiscordDetails,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    #[serde(default, alias = "login")]
    pub login: String,
    #[serde(default, alias = "password")]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SkipDate {
    #[serde(default, alias = "start")]
    pub start: String,
    #[serde(default, alias = "end")]
    pub end: String,
}

impl SkipDate {
    /// Parsed `(start, end)`, or `None` if either bound does not parse.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = parse_config_date(&self.start)?;
        let end = parse_config_date(&self.end)?;
        Some((start, end))
    }

    /// Inclusive on both ends. An inverted range never matches.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self.range() {
            Some((start, end)) => start <= date && date <= end,
            None => false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Behavior {
    #[serde(default, alias = "punchType", alias = "punchtype")]
    pub punch_type: String,
    #[serde(default, alias = "inTime", alias = "intime")]
    pub in_time: String,
    #[serde(default, alias = "outTime", alias = "outtime")]
    pub out_time: String,
    #[serde(default, alias = "benefitType", alias = "benefittype")]
    pub benefit_type: String,
    #[serde(default, alias = "benefitHours", alias = "benefithours")]
    pub benefit_hours: String,
    #[serde(default, alias = "notes")]
    pub notes: String,
}

impl Behavior {
    pub fn is_benefit(&self) -> bool {
        self.punch_type == BENEFIT_PUNCH
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DiscordDetails {
    #[serde(default, alias = "webhook")]
    pub webhook: String,
    #[serde(default, alias = "mention")]
    pub mention: String,
}

fn parse_config_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, CONFIG_DATE_FORMAT).ok()
}

impl Config {
    /// Load from `UATTEND_CONFIG`, falling back to `config.json` in the
    /// working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let inline = env::var(CONFIG_ENV_VAR).ok();
        Self::load_from(inline.as_deref(), Path::new(CONFIG_FILE))
    }

    /// An empty inline value counts as absent.
    pub fn load_from(inline: Option<&str>, path: &Path) -> Result<Self, ConfigError> {
        let raw = match inline.filter(|s| !s.is_empty()) {
            Some(json) => {
                info!("Loading config from {} environment variable", CONFIG_ENV_VAR);
                json.to_string()
            }
            None => {
                info!("Loading config from {}", path.display());
                match fs::read_to_string(path) {
                    Ok(content) => content,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        return Err(ConfigError::NotFound);
                    }
                    Err(e) => return Err(ConfigError::Unreadable(e.to_string())),
                }
            }
        };

        serde_json::from_str(&raw).map_err(|e| ConfigError::Syntax(e.to_string()))
    }

    /// Checks run in a fixed order and stop at the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.login.is_empty() || self.credentials.password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        match Url::parse(&self.org_url) {
            Ok(url) if !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()) => {}
            _ => return Err(ConfigError::InvalidOrgUrl(self.org_url.clone())),
        }

        for (i, skip) in self.skip_dates.iter().enumerate() {
            let index = i + 1;
            if skip.start.is_empty() {
                return Err(ConfigError::MissingSkipDate { index, field: "Start" });
            }
            if skip.end.is_empty() {
                return Err(ConfigError::MissingSkipDate { index, field: "End" });
            }
            if parse_config_date(&skip.start).is_none() {
                return Err(ConfigError::InvalidSkipDate { index, field: "Start" });
            }
            if parse_config_date(&skip.end).is_none() {
                return Err(ConfigError::InvalidSkipDate { index, field: "End" });
            }
        }

        for (i, day) in self.workdays.iter().enumerate() {
            match day {
                Some(0..=6) => {}
                Some(value) => {
                    return Err(ConfigError::InvalidWorkday {
                        index: i + 1,
                        value: *value,
                    });
                }
                None => return Err(ConfigError::MissingWorkday { index: i + 1 }),
            }
        }

        let behavior = &self.behavior;
        if !PUNCH_TYPES.contains(&behavior.punch_type.as_str()) {
            return Err(ConfigError::InvalidPunchType(behavior.punch_type.clone()));
        }

        if behavior.is_benefit() {
            if !BENEFIT_TYPES.contains(&behavior.benefit_type.as_str()) {
                return Err(ConfigError::InvalidBenefitType(behavior.benefit_type.clone()));
            }
            let hours_ok = behavior
                .benefit_hours
                .parse::<f64>()
                .is_ok_and(|hours| hours.is_finite() && hours > 0.0);
            if !hours_ok {
                return Err(ConfigError::InvalidBenefitHours(behavior.benefit_hours.clone()));
            }
        } else {
            if behavior.in_time.is_empty() {
                return Err(ConfigError::MissingTime("InTime"));
            }
            if behavior.out_time.is_empty() {
                return Err(ConfigError::MissingTime("OutTime"));
            }
            if parse_config_date(&behavior.in_time).is_none() {
                return Err(ConfigError::InvalidTime { field: "InTime" });
            }
            if parse_config_date(&behavior.out_time).is_none() {
                return Err(ConfigError::InvalidTime { field: "OutTime" });
            }
        }

        debug!("Config validated");
        Ok(())
    }

    pub fn is_workday(&self, weekday: Weekday) -> bool {
        let index = i64::from(weekday.num_days_from_sunday());
        self.workdays.iter().any(|day| *day == Some(index))
    }

    pub fn in_skip_range(&self, date: NaiveDate) -> bool {
        self.skip_dates.iter().any(|skip| skip.contains(date))
    }
}

/// Process-level toggles read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub debug: bool,
    pub geckodriver_path: String,
    pub webdriver_port: u16,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            debug: false,
            geckodriver_path: "/usr/bin/geckodriver".to_string(),
            webdriver_port: 4444,
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debug: env::var("DEBUG").ok().and_then(|v| parse_bool(&v)).unwrap_or(false),
            geckodriver_path: env::var("GECKODRIVER_PATH").unwrap_or(defaults.geckodriver_path),
            webdriver_port: env::var("WEBDRIVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.webdriver_port),
        }
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
