use std::time::Duration;

use serde::Deserialize;

use crate::error::GhtknError;

/// Floor for the polling interval, whatever the provider advertises.
pub const MINIMUM_INTERVAL: Duration = Duration::from_secs(5);

/// Added to the polling interval each time the provider answers `slow_down`.
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    pub minimum_interval: Duration,
    pub slow_down_increment: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            minimum_interval: MINIMUM_INTERVAL,
            slow_down_increment: SLOW_DOWN_INCREMENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    SlowDown,
    Success,
    Expired,
    Cancelled,
    Failed,
}

/// Body of a token-check response. Either a token or an error code.
#[derive(Debug, Default, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Debug)]
pub enum PollStep {
    Continue,
    Done(TokenGrant),
    Fail(GhtknError),
}

/// State of one device-code poll loop.
#[derive(Debug)]
pub struct Poller {
    state: PollState,
    interval: Duration,
    timing: PollTiming,
}

impl Poller {
    pub fn new(timing: PollTiming, provider_interval_secs: u64) -> Self {
        let interval = Duration::from_secs(provider_interval_secs).max(timing.minimum_interval);
        Self {
            state: PollState::Polling,
            interval,
            timing,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Delay before the next token check.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn on_response(&mut self, response: AccessTokenResponse, raw: &str) -> PollStep {
        if let Some(code) = response.error.as_deref().filter(|c| !c.is_empty()) {
            return match code {
                "authorization_pending" => {
                    self.state = PollState::Polling;
                    PollStep::Continue
                }
                "slow_down" => {
                    self.state = PollState::SlowDown;
                    self.interval += self.timing.slow_down_increment;
                    tracing::debug!(
                        interval_ms = self.interval.as_millis() as u64,
                        "provider asked to slow down"
                    );
                    PollStep::Continue
                }
                other => {
                    self.state = PollState::Failed;
                    if let Some(description) = &response.error_description {
                        tracing::debug!(
                            error = other,
                            description = %description,
                            "device flow failed"
                        );
                    }
                    PollStep::Fail(GhtknError::from_provider_code(other))
                }
            };
        }
        match response.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => {
                self.state = PollState::Success;
                PollStep::Done(TokenGrant {
                    access_token,
                    expires_in: response.expires_in,
                })
            }
            None => {
                self.state = PollState::Failed;
                PollStep::Fail(GhtknError::MalformedResponse(raw.to_string()))
            }
        }
    }

    pub fn expire(&mut self) -> GhtknError {
        self.state = PollState::Expired;
        GhtknError::AuthorizationExpired
    }

    pub fn cancel(&mut self) -> GhtknError {
        self.state = PollState::Cancelled;
        GhtknError::Cancelled
    }
}
