use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use colored::Colorize;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::GhtknError;
use crate::oauth::browser::{report_open_result, BrowserOpener, SystemBrowser};
use crate::oauth::poll::{AccessTokenResponse, PollStep, PollTiming, Poller, TokenGrant};
use crate::token::{format_date, AccessToken};

pub const GITHUB_BASE_URL: &str = "https://github.com";
pub const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFlowEndpoints {
    pub device_code_url: String,
    pub access_token_url: String,
}

impl DeviceFlowEndpoints {
    /// Endpoints rooted at `base_url` (`https://github.com` for GitHub).
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            device_code_url: format!("{base}/login/device/code"),
            access_token_url: format!("{base}/login/oauth/access_token"),
        }
    }
}

impl Default for DeviceFlowEndpoints {
    fn default() -> Self {
        Self::with_base_url(GITHUB_BASE_URL)
    }
}

/// Response of the device-code endpoint. Lives for one authorization attempt.
#[derive(Clone, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default)]
    pub interval: u64,
}

impl std::fmt::Debug for DeviceAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthorization")
            .field("device_code", &"<redacted>")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Mints a fresh access token for an OAuth client id.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(
        &self,
        cancel: &CancellationToken,
        client_id: &str,
    ) -> Result<AccessToken, GhtknError>;
}

/// OAuth device authorization grant against GitHub.
pub struct DeviceFlowClient {
    http: reqwest::Client,
    endpoints: DeviceFlowEndpoints,
    timing: PollTiming,
    browser: Arc<dyn BrowserOpener>,
    prompt: Mutex<Box<dyn Write + Send>>,
    colorize: bool,
    now: fn() -> DateTime<Utc>,
}

impl Default for DeviceFlowClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), DeviceFlowEndpoints::default())
    }
}

impl DeviceFlowClient {
    /// Client that prints instructions to stderr and opens the system browser.
    pub fn new(http: reqwest::Client, endpoints: DeviceFlowEndpoints) -> Self {
        Self {
            http,
            endpoints,
            timing: PollTiming::default(),
            browser: Arc::new(SystemBrowser),
            prompt: Mutex::new(Box::new(std::io::stderr())),
            colorize: std::io::stderr().is_terminal(),
            now: Utc::now,
        }
    }

    pub fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserOpener>) -> Self {
        self.browser = browser;
        self
    }

    /// Where the verification instructions are written.
    pub fn with_prompt_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.prompt = Mutex::new(writer);
        self.colorize = false;
        self
    }

    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub async fn request_device_code(
        &self,
        cancel: &CancellationToken,
        client_id: &str,
    ) -> Result<DeviceAuthorization, GhtknError> {
        if client_id.is_empty() {
            return Err(GhtknError::InvalidArgument("client id is required".into()));
        }
        let (status, body) = self
            .post_json(
                cancel,
                &self.endpoints.device_code_url,
                &json!({ "client_id": client_id }),
            )
            .await?;
        if !status.is_success() {
            return Err(GhtknError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| {
            GhtknError::MalformedResponse(format!("device code response ({e}): {body}"))
        })
    }

    async fn poll_for_token(
        &self,
        cancel: &CancellationToken,
        client_id: &str,
        device: &DeviceAuthorization,
    ) -> Result<TokenGrant, GhtknError> {
        let mut poller = Poller::new(self.timing, device.interval);
        let deadline = Instant::now()
            .checked_add(std::time::Duration::from_secs(device.expires_in))
            .ok_or_else(|| out_of_range("device code", device.expires_in))?;
        let request = json!({
            "client_id": client_id,
            "device_code": device.device_code,
            "grant_type": DEVICE_GRANT_TYPE,
        });

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(poller.cancel()),
                _ = tokio::time::sleep(poller.interval()) => {}
            }
            if Instant::now() > deadline {
                return Err(poller.expire());
            }

            let (status, body) =
                match self.post_json(cancel, &self.endpoints.access_token_url, &request).await {
                    Ok(resp) => resp,
                    Err(GhtknError::Cancelled) => return Err(poller.cancel()),
                    Err(e) => return Err(e),
                };
            let response: AccessTokenResponse = match serde_json::from_str(&body) {
                Ok(r) => r,
                Err(_) if !status.is_success() => {
                    return Err(GhtknError::ProviderError {
                        status: status.as_u16(),
                        body,
                    })
                }
                Err(_) => return Err(GhtknError::MalformedResponse(body)),
            };

            match poller.on_response(response, &body) {
                PollStep::Continue => {
                    tracing::debug!(state = ?poller.state(), "authorization not complete yet");
                }
                PollStep::Done(grant) => return Ok(grant),
                PollStep::Fail(e) => return Err(e),
            }
        }
    }

    /// POST a JSON body, aborting promptly when `cancel` fires.
    async fn post_json(
        &self,
        cancel: &CancellationToken,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<(StatusCode, String), GhtknError> {
        let request = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GhtknError::Cancelled),
            result = async {
                let resp = request.await?;
                let status = resp.status();
                let text = resp.text().await?;
                Ok::<_, GhtknError>((status, text))
            } => result,
        }
    }

    fn print_instructions(&self, device: &DeviceAuthorization, expires_at: DateTime<Utc>) {
        let (uri, code) = if self.colorize {
            (
                device.verification_uri.underline().to_string(),
                device.user_code.bold().to_string(),
            )
        } else {
            (device.verification_uri.clone(), device.user_code.clone())
        };
        let message = format!(
            "Please visit: {uri}\nAnd enter code: {code}\nExpiration date: {}\n",
            format_date(expires_at)
        );
        let written = match self.prompt.lock() {
            Ok(mut w) => w.write_all(message.as_bytes()).and_then(|_| w.flush()),
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "prompt writer lock poisoned",
            )),
        };
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write the verification instructions");
        }
    }

    /// Fire-and-forget; the poll loop does not wait for the browser.
    fn open_browser(&self, url: &str) {
        let browser = Arc::clone(&self.browser);
        let url = url.to_string();
        tokio::task::spawn_blocking(move || report_open_result(browser.open(&url), &url));
    }
}

#[async_trait]
impl Authorizer for DeviceFlowClient {
    async fn authorize(
        &self,
        cancel: &CancellationToken,
        client_id: &str,
    ) -> Result<AccessToken, GhtknError> {
        let device = self.request_device_code(cancel, client_id).await?;
        let expires_at = expiry_after((self.now)(), device.expires_in, "device code")?;
        self.print_instructions(&device, expires_at);
        self.open_browser(&device.verification_uri);

        let grant = self.poll_for_token(cancel, client_id, &device).await?;
        let expires_in = match grant.expires_in {
            Some(secs) if secs > 0 => secs.unsigned_abs(),
            _ => {
                tracing::warn!(
                    "token response carries no expires_in, treating the token as expiring now"
                );
                0
            }
        };
        let expiration_date = expiry_after((self.now)(), expires_in, "access token")?;
        let token = AccessToken::new(grant.access_token, expiration_date);
        tracing::info!(
            expiration_date = %format_date(token.expiration_date),
            "created an access token"
        );
        Ok(token)
    }
}

/// `now + secs`, rejecting lifetimes that do not fit a timestamp.
fn expiry_after(now: DateTime<Utc>, secs: u64, what: &str) -> Result<DateTime<Utc>, GhtknError> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(what, secs))
}

fn out_of_range(what: &str, secs: u64) -> GhtknError {
    GhtknError::MalformedResponse(format!("{what} expires_in is out of range: {secs}"))
}
