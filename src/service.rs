use std::error::Error;
use tracing::{error, info, warn};

use crate::{
    errors::{AutomatorError, AutomatorResult},
    helpers::{
        auth::{self, LoginStatus},
        browser::{Browser, Timeouts},
        discord::DiscordNotifier,
        punch_form::PunchForm,
        scanner::RowScanner,
    },
    models::{
        config::Config,
        timesheet::{decide, PunchDecision},
    },
};

/// What a run achieved before it finished or stopped.
#[derive(Debug)]
pub struct RunOutcome {
    pub automated: usize,
    pub error: Option<AutomatorError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Logs in, walks the timesheet rows and punches the ones that need it.
pub struct PunchService<'a, B: Browser> {
    browser: &'a B,
    config: &'a Config,
    timeouts: Timeouts,
}

impl<'a, B: Browser> PunchService<'a, B> {
    /// `config` must already be validated.
    pub fn new(browser: &'a B, config: &'a Config) -> Self {
        Self::with_timeouts(browser, config, Timeouts::default())
    }

    pub fn with_timeouts(browser: &'a B, config: &'a Config, timeouts: Timeouts) -> Self {
        Self {
            browser,
            config,
            timeouts,
        }
    }

    /// Never panics on portal problems; the first fatal error ends the run
    /// and is returned alongside the rows punched so far.
    pub async fn run(&self) -> RunOutcome {
        let mut automated = 0;
        let error = self.process(&mut automated).await.err();

        match &error {
            None => info!("Run finished, automated {} row(s)", automated),
            Some(e) => error!("Run stopped after {} row(s): {}", automated, e),
        }

        RunOutcome { automated, error }
    }

    async fn process(&self, automated: &mut usize) -> AutomatorResult<()> {
        let status = auth::login(
            self.browser,
            &self.config.org_url,
            &self.config.credentials,
            &self.timeouts,
        )
        .await?;
        if status == LoginStatus::TimedOut {
            warn!("Continuing without confirmed login");
        }

        let scanner = RowScanner::new(self.browser).await?;
        if scanner.is_empty() {
            warn!("No timesheet rows found");
        }

        info!("Checking punch sheet...");
        let form = PunchForm::new(self.browser, &self.config.behavior, &self.timeouts);
        for index in 0..scanner.len() {
            let row = scanner.read(index).await?;
            match decide(&row, self.config) {
                PunchDecision::NeedsPunch => {
                    form.drive(&row).await?;
                    *automated += 1;
                }
                other => info!("{}: {}", row, other),
            }
        }

        Ok(())
    }
}

/// One notification per run, whatever the outcome. Failures are logged and
/// returned but never change the run's own result.
pub async fn report(
    notifier: &DiscordNotifier,
    outcome: &RunOutcome,
) -> Result<(), crate::errors::NotifyError> {
    let err = outcome.error.as_ref().map(|e| e as &dyn Error);
    let result = notifier.notify(outcome.automated, err).await;
    if let Err(e) = &result {
        error!("Notification failed: {}", e);
    }
    result
}
