use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::errors::BrowserError;
use crate::helpers::browser::{Browser, ElementRef};
use crate::models::config::RuntimeSettings;

/// W3C WebDriver element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// A browser session driven over the W3C WebDriver protocol.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
    driver: Option<Child>,
}

impl WebDriverSession {
    /// Spawn geckodriver and open a Firefox session on it. Headless unless
    /// `settings.debug` is set.
    pub async fn start(settings: &RuntimeSettings) -> Result<Self, BrowserError> {
        info!(
            "Starting geckodriver from {} on port {}",
            settings.geckodriver_path, settings.webdriver_port
        );

        let child = match Command::new(&settings.geckodriver_path)
            .arg("--port")
            .arg(settings.webdriver_port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(!settings.debug)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("Cannot init webdriver service: {}", e);
                return Err(BrowserError::Process(e));
            }
        };

        let base_url = format!("http://localhost:{}", settings.webdriver_port);
        let client = Client::new();
        wait_until_ready(&client, &base_url).await?;

        let mut session = Self::connect_with(client, &base_url, !settings.debug).await?;
        session.driver = Some(child);
        Ok(session)
    }

    /// Open a session on an already running WebDriver server.
    pub async fn connect(base_url: &str, headless: bool) -> Result<Self, BrowserError> {
        Self::connect_with(Client::new(), base_url, headless).await
    }

    async fn connect_with(
        client: Client,
        base_url: &str,
        headless: bool,
    ) -> Result<Self, BrowserError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": args }
                }
            }
        });

        info!("Creating webdriver session (headless: {})", headless);
        let response = client
            .post(format!("{base_url}/session"))
            .json(&capabilities)
            .send()
            .await?;
        let value = unwrap_value(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Protocol(format!("no sessionId in {value}")))?
            .to_string();
        info!("Webdriver session {} ready", session_id);

        Ok(Self {
            client,
            base_url,
            session_id,
            driver: None,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Close the browser and stop geckodriver. In debug mode both are left
    /// running for inspection.
    pub async fn release(mut self, debug: bool) {
        if debug {
            warn!(
                "Debug mode: leaving webdriver session {} open",
                self.session_id
            );
            if let Some(child) = self.driver.take() {
                // Dropping without kill_on_drop leaves the process alive.
                drop(child);
            }
            return;
        }

        let url = format!("{}/session/{}", self.base_url, self.session_id);
        match self.client.delete(&url).send().await {
            Ok(resp) if resp.status().is_success() => info!("Webdriver session closed"),
            Ok(resp) => warn!("Closing webdriver session returned {}", resp.status()),
            Err(e) => warn!("Failed to close webdriver session: {}", e),
        }

        if let Some(mut child) = self.driver.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop geckodriver: {}", e);
            }
        }
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        debug!("{} {}", method, url);

        let request = self.client.request(method, &url);
        let request = match body {
            Some(body) => request.json(&body),
            None => request,
        };
        unwrap_value(request.send().await?).await
    }
}

/// Strip the `{"value": ...}` envelope, turning error payloads into
/// `BrowserError::WebDriver`.
async fn unwrap_value(response: reqwest::Response) -> Result<Value, BrowserError> {
    let status = response.status();
    let text = response.text().await?;
    let payload: Value = serde_json::from_str(&text)
        .map_err(|e| BrowserError::Protocol(format!("{status}: {e}: {text}")))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string()
        };
        return Err(BrowserError::WebDriver {
            error: field("error"),
            message: field("message"),
        });
    }
    Ok(value)
}

async fn wait_until_ready(client: &Client, base_url: &str) -> Result<(), BrowserError> {
    let deadline = Instant::now() + DRIVER_STARTUP_TIMEOUT;
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/status")).send().await {
            if let Ok(status) = resp.json::<Value>().await {
                let ready = status
                    .pointer("/value/ready")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if ready {
                    debug!("Webdriver at {} is ready", base_url);
                    return Ok(());
                }
            }
        }
        if Instant::now() >= deadline {
            return Err(BrowserError::Protocol(format!(
                "cannot connect to webdriver at {base_url}"
            )));
        }
        sleep(Duration::from_millis(250)).await;
    }
}

fn parse_elements(value: Value) -> Result<Vec<ElementRef>, BrowserError> {
    let items = value
        .as_array()
        .ok_or_else(|| BrowserError::Protocol(format!("expected element list, got {value}")))?;
    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| ElementRef(id.to_string()))
                .ok_or_else(|| BrowserError::Protocol(format!("not an element reference: {item}")))
        })
        .collect()
}

impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        css: &str,
    ) -> Result<Vec<ElementRef>, BrowserError> {
        let path = match scope {
            Some(parent) => format!("/element/{}/elements", parent.0),
            None => "/elements".to_string(),
        };
        let body = json!({ "using": "css selector", "value": css });
        parse_elements(self.command(Method::POST, &path, Some(body)).await?)
    }

    async fn text(&self, element: &ElementRef) -> Result<String, BrowserError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.0), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol(format!("element text is not a string: {value}")))
    }

    async fn attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let path = format!("/element/{}/attribute/{}", element.0, name);
        let value = self.command(Method::GET, &path, None).await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn displayed(&self, element: &ElementRef) -> Result<bool, BrowserError> {
        let path = format!("/element/{}/displayed", element.0);
        let value = self.command(Method::GET, &path, None).await?;
        value
            .as_bool()
            .ok_or_else(|| BrowserError::Protocol(format!("element displayed is not a bool: {value}")))
    }

    async fn click(&self, element: &ElementRef) -> Result<(), BrowserError> {
        let path = format!("/element/{}/click", element.0);
        self.command(Method::POST, &path, Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), BrowserError> {
        let path = format!("/element/{}/value", element.0);
        self.command(Method::POST, &path, Some(json!({ "text": text })))
            .await
            .map(|_| ())
    }
}
