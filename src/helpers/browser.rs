//! Narrow capability interface over a browser session.
//!
//! The scanner and the punch form only ever locate elements by CSS selector,
//! read their text or attributes, check whether they are displayed, click
//! them and type into them. Anything
//! that can do that (a real WebDriver session or the in-memory fake) can
//! drive the portal.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::errors::{AutomatorError, AutomatorResult, BrowserError};

/// Opaque handle to an element within one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

#[allow(async_fn_in_trait)]
pub trait Browser {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Every element matching `css`, searched under `scope` when given.
    /// No match is an empty vec, not an error.
    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        css: &str,
    ) -> Result<Vec<ElementRef>, BrowserError>;

    async fn text(&self, element: &ElementRef) -> Result<String, BrowserError>;

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn click(&self, element: &ElementRef) -> Result<(), BrowserError>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), BrowserError>;

    /// Lookups return hidden elements too; this tells them apart.
    async fn displayed(&self, element: &ElementRef) -> Result<bool, BrowserError>;

    async fn find_first(
        &self,
        scope: Option<&ElementRef>,
        css: &str,
    ) -> Result<Option<ElementRef>, BrowserError> {
        Ok(self.find_all(scope, css).await?.into_iter().next())
    }
}

/// Bounds for every wait the automator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub login: Duration,
    pub modal_open: Duration,
    pub benefit_options: Duration,
    pub modal_close: Duration,
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(120),
            modal_open: Duration::from_secs(60),
            benefit_options: Duration::from_secs(60),
            modal_close: Duration::from_secs(60),
            poll: Duration::from_millis(500),
        }
    }
}

/// Matches for `css` that are actually rendered. `None` when the lookup
/// itself failed, which pollers treat as "not yet".
async fn displayed_matches<B: Browser>(browser: &B, css: &str) -> Option<Vec<ElementRef>> {
    let found = match browser.find_all(None, css).await {
        Ok(found) => found,
        Err(e) => {
            debug!("Looking up {} failed, will retry: {}", css, e);
            return None;
        }
    };

    let mut shown = Vec::with_capacity(found.len());
    for element in found {
        match browser.displayed(&element).await {
            Ok(true) => shown.push(element),
            Ok(false) => {}
            // Usually a stale reference from a re-render.
            Err(e) => debug!("Cannot tell if {} is displayed: {}", css, e),
        }
    }
    Some(shown)
}

/// Polls until at least one match for `css` is displayed. `None` on timeout.
pub async fn wait_for<B: Browser>(
    browser: &B,
    css: &str,
    timeout: Duration,
    poll: Duration,
) -> Option<Vec<ElementRef>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(shown) = displayed_matches(browser, css).await {
            if !shown.is_empty() {
                return Some(shown);
            }
        }
        if Instant::now() >= deadline {
            debug!("Gave up waiting for {} after {:?}", css, timeout);
            return None;
        }
        sleep(poll).await;
    }
}

/// Polls until no match for `css` is displayed. Returns `false` on timeout.
pub async fn wait_until_gone<B: Browser>(
    browser: &B,
    css: &str,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if displayed_matches(browser, css).await.is_some_and(|shown| shown.is_empty()) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(poll).await;
    }
}

/// First element matching `css`, or `ElementNotFound` naming `what`.
pub async fn require<B: Browser>(
    browser: &B,
    scope: Option<&ElementRef>,
    css: &str,
    what: &str,
) -> AutomatorResult<ElementRef> {
    browser
        .find_first(scope, css)
        .await
        .map_err(|e| AutomatorError::browser(format!("cannot find {what}"), e))?
        .ok_or_else(|| AutomatorError::ElementNotFound(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::fake::FakeBrowser;

    const TICK: Duration = Duration::from_millis(5);
    const SHORT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn hidden_matches_do_not_end_a_wait() {
        let browser = FakeBrowser::new();
        browser.add_hidden("#punchModal", "");

        assert_eq!(browser.find_all(None, "#punchModal").await.unwrap().len(), 1);
        assert_eq!(wait_for(&browser, "#punchModal", SHORT, TICK).await, None);
        assert!(wait_until_gone(&browser, "#punchModal", SHORT, TICK).await);
    }

    #[tokio::test]
    async fn wait_returns_only_displayed_matches() {
        let browser = FakeBrowser::new();
        browser.add_hidden("#benefitType option", "Select...");
        let shown = browser.add_text("#benefitType option", "VAC - Vacation");

        let found = wait_for(&browser, "#benefitType option", SHORT, TICK).await;
        assert_eq!(found, Some(vec![shown]));
        assert!(!wait_until_gone(&browser, "#benefitType option", SHORT, TICK).await);
    }

    #[tokio::test]
    async fn require_reports_what_is_missing() {
        let browser = FakeBrowser::new();
        match require(&browser, None, "#loginIn", "login button element").await {
            Err(AutomatorError::ElementNotFound(what)) => assert_eq!(what, "login button element"),
            other => panic!("expected ElementNotFound, got {other:?}"),
        }
    }
}
