use tracing::{info, warn};

use crate::errors::{AutomatorError, AutomatorResult};
use crate::helpers::browser::{require, wait_for, Browser, Timeouts};
use crate::models::config::Credentials;

pub const USERNAME_FIELD: &str = "#txtUserName";
pub const PASSWORD_FIELD: &str = "#txtPassword";
pub const LOGIN_BUTTON: &str = "#loginIn";
/// Present once the timesheet has rendered.
pub const TIMESHEET_READY: &str = "#rowsInner>ul";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Ready,
    /// The timesheet never showed up. Not fatal: row scanning will surface
    /// a failed login on its own.
    TimedOut,
}

pub async fn login<B: Browser>(
    browser: &B,
    org_url: &str,
    credentials: &Credentials,
    timeouts: &Timeouts,
) -> AutomatorResult<LoginStatus> {
    info!("Login...");
    browser
        .goto(org_url)
        .await
        .map_err(|e| AutomatorError::browser("cannot go to org url", e))?;

    let username = require(browser, None, USERNAME_FIELD, "login username field").await?;
    let password = require(browser, None, PASSWORD_FIELD, "login password field").await?;
    let button = require(browser, None, LOGIN_BUTTON, "login button element").await?;

    browser
        .send_keys(&username, &credentials.login)
        .await
        .map_err(|e| AutomatorError::browser("cannot type login username", e))?;
    browser
        .send_keys(&password, &credentials.password)
        .await
        .map_err(|e| AutomatorError::browser("cannot type login password", e))?;
    browser
        .click(&button)
        .await
        .map_err(|e| AutomatorError::browser("cannot click login button", e))?;

    // Lookups can fail while the portal redirects; those polls just retry.
    match wait_for(browser, TIMESHEET_READY, timeouts.login, timeouts.poll).await {
        Some(_) => {
            info!("Timesheet visible, login complete");
            Ok(LoginStatus::Ready)
        }
        None => {
            warn!(
                "Failed to wait after login ({:?}), perhaps login failed?",
                timeouts.login
            );
            Ok(LoginStatus::TimedOut)
        }
    }
}
