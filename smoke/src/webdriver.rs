//! Minimal W3C WebDriver client covering what the smoke scenarios need:
//! one session, navigation, element lookup, typing, clicking and screenshots.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::debug;
use url::Url;

use crate::error::SmokeError;

/// Key under which W3C remotes return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementId(pub String);

#[derive(Deserialize)]
struct Envelope {
    value: Value,
}

#[derive(Deserialize)]
struct RemoteError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Turn a raw `{"value": ...}` body into its value or a typed error.
fn unwrap_value(body: Value) -> Result<Value, SmokeError> {
    let Envelope { value } = serde_json::from_value(body)
        .map_err(|e| SmokeError::Protocol(format!("missing value: {e}")))?;
    if value.get("error").is_some() {
        let remote: RemoteError = serde_json::from_value(value)
            .map_err(|e| SmokeError::Protocol(format!("bad error body: {e}")))?;
        return Err(SmokeError::WebDriver {
            error: remote.error,
            message: remote.message,
        });
    }
    Ok(value)
}

pub struct Session {
    http: reqwest::Client,
    root: String,
    id: String,
}

impl Session {
    /// Open a new browser session on the remote end.
    pub async fn start(
        http: reqwest::Client,
        webdriver_url: &Url,
        capabilities: Value,
    ) -> Result<Self, SmokeError> {
        let root = webdriver_url.as_str().trim_end_matches('/').to_string();
        let body: Value = http
            .post(format!("{root}/session"))
            .json(&json!({ "capabilities": { "alwaysMatch": capabilities } }))
            .send()
            .await?
            .json()
            .await?;
        let value = unwrap_value(body)?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| SmokeError::Protocol("no sessionId in new session response".into()))?
            .to_string();
        debug!(session = %id, "webdriver session started");
        Ok(Self { http, root, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, SmokeError> {
        let url = if path.is_empty() {
            format!("{}/session/{}", self.root, self.id)
        } else {
            format!("{}/session/{}/{}", self.root, self.id, path)
        };
        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let body: Value = req.send().await?.json().await?;
        unwrap_value(body)
    }

    pub async fn goto(&self, url: &Url) -> Result<(), SmokeError> {
        debug!(%url, "navigate");
        self.command(Method::POST, "url", Some(json!({ "url": url.as_str() })))
            .await?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String, SmokeError> {
        let value = self.command(Method::GET, "url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SmokeError::Protocol("current url is not a string".into()))
    }

    /// Look up an element by CSS selector; `None` if the page has no match.
    pub async fn find(&self, css: &str) -> Result<Option<ElementId>, SmokeError> {
        let found = self
            .command(
                Method::POST,
                "element",
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await;
        match found {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Some(ElementId(id.to_string())))
                .ok_or_else(|| SmokeError::Protocol(format!("no element reference for {css}"))),
            Err(e) if e.webdriver_code() == Some("no such element") => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Poll for an element until it appears or `timeout` elapses.
    pub async fn wait_for(
        &self,
        css: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<ElementId, SmokeError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(el) = self.find(css).await? {
                return Ok(el);
            }
            if Instant::now() >= deadline {
                return Err(SmokeError::Timeout(format!("element `{css}`")));
            }
            sleep(poll).await;
        }
    }

    /// Poll the current URL until its path no longer starts with `path`.
    pub async fn wait_until_left(
        &self,
        path: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<String, SmokeError> {
        let deadline = Instant::now() + timeout;
        loop {
            let current = self.current_url().await?;
            let still_there = Url::parse(&current)
                .map(|u| u.path().starts_with(path))
                .unwrap_or(false);
            if !still_there {
                return Ok(current);
            }
            if Instant::now() >= deadline {
                return Err(SmokeError::Timeout(format!("navigation away from {path}")));
            }
            sleep(poll).await;
        }
    }

    pub async fn send_keys(&self, el: &ElementId, text: &str) -> Result<(), SmokeError> {
        self.command(
            Method::POST,
            &format!("element/{}/value", el.0),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    pub async fn click(&self, el: &ElementId) -> Result<(), SmokeError> {
        self.command(Method::POST, &format!("element/{}/click", el.0), Some(json!({})))
            .await?;
        Ok(())
    }

    /// Capture the viewport as PNG bytes.
    pub async fn screenshot(&self) -> Result<Vec<u8>, SmokeError> {
        let value = self.command(Method::GET, "screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| SmokeError::Protocol("screenshot is not a string".into()))?;
        Ok(STANDARD.decode(encoded)?)
    }

    /// End the session, closing the browser.
    pub async fn close(self) -> Result<(), SmokeError> {
        self.command(Method::DELETE, "", None).await?;
        debug!(session = %self.id, "webdriver session closed");
        Ok(())
    }
}
