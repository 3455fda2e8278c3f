use anyhow::Context;
use reqwest::Client;
use std::error::Error;
use std::process::ExitCode;
use tracing::{error, info, Level};

use uattend_automator::{
    helpers::{discord::DiscordNotifier, webdriver::WebDriverSession},
    service::{self, PunchService},
    Config, RuntimeSettings,
};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = RuntimeSettings::from_env();
    tracing_subscriber::fmt()
        .with_max_level(if settings.debug { Level::DEBUG } else { Level::INFO })
        .init();

    info!("Executing uAttend automator");

    info!("Init api...");
    let config = match Config::load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let notifier = DiscordNotifier::new(Client::new(), config.discord.clone());

    let session = match WebDriverSession::start(&settings)
        .await
        .context("cannot init webdriver")
    {
        Ok(session) => session,
        Err(e) => {
            error!("{:#}", e);
            let err: Box<dyn Error> = format!("{e:#}").into();
            let _ = notifier.notify(0, Some(err.as_ref())).await;
            return ExitCode::FAILURE;
        }
    };

    let outcome = PunchService::new(&session, &config).run().await;
    session.release(settings.debug).await;

    let _ = service::report(&notifier, &outcome).await;

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
