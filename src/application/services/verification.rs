//! Minimum-elapsed-time verification gate

use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;

use crate::application::cache::ExpiringMap;
use crate::application::errors::ApiError;

/// Timer records live for 24 hours
const RECORD_TTL: Duration = Duration::from_secs(24 * 3600);
const TOKEN_LEN: usize = 43;

const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Clone)]
struct TimerRecord {
    ip: String,
    used: bool,
}

/// Outcome of a verification check
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    Valid { elapsed: f64 },
    InvalidToken,
    TokenUsed,
    IpMismatch,
    TimeNotElapsed { elapsed: f64, required: f64 },
}

impl VerifyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyOutcome::Valid { .. })
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            VerifyOutcome::Valid { .. } => None,
            VerifyOutcome::InvalidToken => Some("invalid_token"),
            VerifyOutcome::TokenUsed => Some("token_used"),
            VerifyOutcome::IpMismatch => Some("ip_mismatch"),
            VerifyOutcome::TimeNotElapsed { .. } => Some("time_not_elapsed"),
        }
    }
}

pub struct VerificationService {
    timers: ExpiringMap<String, TimerRecord>,
    min_elapsed: Duration,
    client: reqwest::Client,
    turnstile_secret: Option<String>,
}

impl VerificationService {
    pub fn new(min_elapsed_secs: u64, turnstile_secret: Option<String>) -> Self {
        Self {
            timers: ExpiringMap::new(RECORD_TTL),
            min_elapsed: Duration::from_secs(min_elapsed_secs),
            client: reqwest::Client::new(),
            turnstile_secret,
        }
    }

    /// Start a timer for a client, returning its token
    pub fn start(&self, ip: &str) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.timers.insert(
            token.clone(),
            TimerRecord {
                ip: ip.to_string(),
                used: false,
            },
        );
        token
    }

    /// Check a token against the minimum elapsed time. Success consumes it.
    pub fn check(&self, token: &str, ip: &str) -> VerifyOutcome {
        let key = token.to_string();
        let record = match self.timers.get(&key) {
            Some(r) => r,
            None => return VerifyOutcome::InvalidToken,
        };

        if record.used {
            return VerifyOutcome::TokenUsed;
        }
        if record.ip != ip {
            return VerifyOutcome::IpMismatch;
        }

        let elapsed = self.timers.age(&key).unwrap_or_default();
        if elapsed < self.min_elapsed {
            return VerifyOutcome::TimeNotElapsed {
                elapsed: elapsed.as_secs_f64(),
                required: self.min_elapsed.as_secs_f64(),
            };
        }

        self.timers.update(&key, |r| r.used = true);
        VerifyOutcome::Valid {
            elapsed: elapsed.as_secs_f64(),
        }
    }

    pub fn captcha_required(&self) -> bool {
        self.turnstile_secret.is_some()
    }

    /// Validate a Turnstile response token against Cloudflare.
    ///
    /// A no-op when no secret is configured.
    pub async fn verify_captcha(&self, response_token: &str) -> Result<bool, ApiError> {
        let secret = match &self.turnstile_secret {
            Some(s) => s.clone(),
            None => return Ok(true),
        };

        #[derive(Deserialize)]
        struct SiteverifyResponse {
            success: bool,
        }

        let response = self
            .client
            .post(TURNSTILE_VERIFY_URL)
            .form(&[("secret", secret.as_str()), ("response", response_token)])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Upstream(format!("Captcha verification failed: {}", e))
                }
            })?;

        let data: SiteverifyResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Captcha verification failed: {}", e)))?;
        Ok(data.success)
    }

    /// Drop records older than 24 hours (hourly cleanup task)
    pub fn purge(&self) -> usize {
        self.timers.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_token_is_invalid() {
        let svc = VerificationService::new(75, None);
        assert_eq!(svc.check("nope", "1.2.3.4"), VerifyOutcome::InvalidToken);
    }

    #[test]
    fn ip_mismatch_is_rejected() {
        let svc = VerificationService::new(75, None);
        let token = svc.start("1.2.3.4");
        assert_eq!(svc.check(&token, "5.6.7.8"), VerifyOutcome::IpMismatch);
    }

    #[test]
    fn early_check_reports_time_not_elapsed() {
        let svc = VerificationService::new(75, None);
        let token = svc.start("1.2.3.4");
        match svc.check(&token, "1.2.3.4") {
            VerifyOutcome::TimeNotElapsed { required, .. } => assert_eq!(required, 75.0),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn elapsed_token_verifies_once() {
        let svc = VerificationService::new(0, None);
        let token = svc.start("1.2.3.4");
        assert!(svc.check(&token, "1.2.3.4").is_valid());
        assert_eq!(svc.check(&token, "1.2.3.4"), VerifyOutcome::TokenUsed);
    }
}
