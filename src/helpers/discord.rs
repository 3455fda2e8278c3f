use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::errors::NotifyError;
use crate::models::config::DiscordDetails;

#[derive(Serialize, Debug)]
struct WebhookBody<'a> {
    content: &'a str,
}

pub fn compose_message(mention: &str, count: usize, err: Option<&dyn std::error::Error>) -> String {
    match err {
        Some(err) => format!("<@{mention}> Automated {count} row(s) with error: {err}"),
        None => format!("<@{mention}> Automated {count} row(s)"),
    }
}

/// Posts run results to a Discord webhook. Never retries.
#[derive(Clone)]
pub struct DiscordNotifier {
    client: Client,
    details: DiscordDetails,
}

impl DiscordNotifier {
    pub fn new(client: Client, details: DiscordDetails) -> Self {
        Self { client, details }
    }

    pub async fn notify(
        &self,
        count: usize,
        err: Option<&dyn std::error::Error>,
    ) -> Result<(), NotifyError> {
        info!("Notifying on Discord");

        if self.details.webhook.is_empty() {
            error!("No Discord webhook configured");
            return Err(NotifyError::NotConfigured);
        }

        let content = compose_message(&self.details.mention, count, err);
        let response = match self
            .client
            .post(&self.details.webhook)
            .json(&WebhookBody { content: &content })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to send Discord notification: {}", e);
                return Err(NotifyError::Transport(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Discord webhook returned status {}", status);
            return Err(NotifyError::Status(status));
        }

        info!("Discord notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AutomatorError;

    #[test]
    fn message_without_error() {
        assert_eq!(compose_message("1234", 3, None), "<@1234> Automated 3 row(s)");
    }

    #[test]
    fn message_with_error() {
        let err = AutomatorError::ElementNotFound("save and close button".into());
        assert_eq!(
            compose_message("1234", 0, Some(&err)),
            "<@1234> Automated 0 row(s) with error: cannot find save and close button"
        );
    }
}
