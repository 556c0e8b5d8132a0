use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use serde_json::Value;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryLimitAction {
    #[default]
    SleepUntilReset,
    Fail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecondaryLimitAction {
    #[default]
    SleepTotalDuration,
    Fail,
}

/// How the GitHub client reacts when the API tells it to slow down.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitStrategy {
    pub on_primary_limit: PrimaryLimitAction,
    pub on_secondary_limit: SecondaryLimitAction,
    /// Retries per page before giving up.
    pub max_retries: u32,
    /// Wait used when the response does not say how long to back off.
    pub fallback_wait_secs: u64,
}

impl Default for RateLimitStrategy {
    fn default() -> Self {
        Self {
            on_primary_limit: PrimaryLimitAction::default(),
            on_secondary_limit: SecondaryLimitAction::default(),
            max_retries: 5,
            fallback_wait_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitKind {
    /// The hourly request quota is used up.
    Primary { reset_at: Option<DateTime<Utc>> },
    /// An abuse-detection limit; the server may say how long to wait.
    Secondary { retry_after: Option<Duration> },
}

impl RateLimitStrategy {
    /// Returns how long to wait before retrying, or a reason to give up.
    pub fn wait_for<R: Rng + ?Sized>(
        &self,
        kind: &RateLimitKind,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Duration, String> {
        match kind {
            RateLimitKind::Primary { reset_at } => match self.on_primary_limit {
                PrimaryLimitAction::Fail => Err("primary rate limit reached".to_string()),
                PrimaryLimitAction::SleepUntilReset => Ok(match reset_at {
                    Some(reset_at) => (*reset_at - now).to_std().unwrap_or(Duration::ZERO),
                    None => self.fallback_wait(rng),
                }),
            },
            RateLimitKind::Secondary { retry_after } => match self.on_secondary_limit {
                SecondaryLimitAction::Fail => Err("secondary rate limit reached".to_string()),
                SecondaryLimitAction::SleepTotalDuration => {
                    Ok(retry_after.unwrap_or_else(|| self.fallback_wait(rng)))
                }
            },
        }
    }

    fn fallback_wait<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter = rng.gen_range(0..=self.fallback_wait_secs / 4);
        Duration::from_secs(self.fallback_wait_secs + jitter)
    }
}

/// Recognizes rate-limit responses from their status and headers.
pub fn classify_rate_limit(status: StatusCode, headers: &HeaderMap) -> Option<RateLimitKind> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    if header_u64(headers, RATE_LIMIT_REMAINING) == Some(0) {
        let reset_at = header_u64(headers, RATE_LIMIT_RESET)
            .and_then(|epoch| i64::try_from(epoch).ok())
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0));
        return Some(RateLimitKind::Primary { reset_at });
    }

    let retry_after = header_u64(headers, RETRY_AFTER.as_str()).map(Duration::from_secs);
    if retry_after.is_some() || status == StatusCode::TOO_MANY_REQUESTS {
        return Some(RateLimitKind::Secondary { retry_after });
    }

    None
}

/// Recognizes a secondary limit reported only through the body of a 403,
/// without any rate-limit headers.
pub fn classify_forbidden_body(body: &str) -> Option<RateLimitKind> {
    let payload: Value = serde_json::from_str(body).ok()?;
    let documentation_url = payload
        .get("documentation_url")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    let is_secondary = documentation_url
        .trim_end_matches('/')
        .ends_with("secondary-rate-limits")
        || message.contains("secondary rate limit");
    is_secondary.then_some(RateLimitKind::Secondary { retry_after: None })
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Blocks the current thread between retries.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
