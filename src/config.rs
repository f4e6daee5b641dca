use chrono::Duration;
use serde::{Deserialize, Serialize};

/// tuning knobs for a payment session
///
/// Delays describe the host-side timers standing in for provider
/// round-trips; the core itself never sleeps. The defaults mirror the
/// portal's reference behavior: no confirmation timeout and unlimited
/// verification re-entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// digits expected in a local mobile-money number
    pub phone_length: usize,
    /// digits expected in a one-time verification code
    pub code_length: usize,
    /// host timer before the provider confirmation event fires
    pub confirm_delay_ms: u64,
    /// host timer between confirmation and the verification step
    pub verify_advance_delay_ms: u64,
    /// ceiling on the confirmation wait; `None` waits indefinitely
    pub confirmation_timeout_ms: Option<u64>,
    /// cap on code attempts; `None` allows unlimited re-entry
    pub max_code_attempts: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            phone_length: 10,
            code_length: 6,
            confirm_delay_ms: 3_000,
            verify_advance_delay_ms: 5_000,
            confirmation_timeout_ms: None,
            max_code_attempts: None,
        }
    }
}

impl SessionConfig {
    /// hardened profile: bounded confirmation wait and capped code attempts
    pub fn strict() -> Self {
        Self {
            confirmation_timeout_ms: Some(60_000),
            max_code_attempts: Some(3),
            ..Self::default()
        }
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::milliseconds(self.confirm_delay_ms as i64)
    }

    pub fn verify_advance_delay(&self) -> Duration {
        Duration::milliseconds(self.verify_advance_delay_ms as i64)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_ms
            .map(|ms| Duration::milliseconds(ms as i64))
    }

    /// validate a local mobile-money number: fixed length, digits only
    pub fn phone_is_valid(&self, phone: &str) -> bool {
        phone.len() == self.phone_length && phone.chars().all(|c| c.is_ascii_digit())
    }

    /// validate the shape of a one-time code (not its value)
    pub fn code_is_well_formed(&self, code: &str) -> bool {
        code.len() == self.code_length && code.chars().all(|c| c.is_ascii_digit())
    }
}
