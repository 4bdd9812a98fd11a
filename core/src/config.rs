// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Confirmation flow configuration

use core::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Wrong-code attempts permitted for lockout-style (local PIN) flows
pub const PIN_LOCK_MAX_ATTEMPTS: u8 = 3;

/// Wrong-code attempts permitted for one-time-code flows
pub const OTP_MAX_ATTEMPTS: u8 = 4;

/// Default push channel poll period
pub const DEFAULT_POLL_PERIOD_S: u64 = 5;

/// Default client-side guard for individual service requests
pub const DEFAULT_REQUEST_TIMEOUT_S: u64 = 10;

/// Behaviour once the wrong-code attempt limit is reached
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedPolicy {
    /// Reject the operation
    AutoReject,
    /// Block verification until a new code is requested
    RequireResend,
}

/// Confirmation flow configuration
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum wrong-code attempts per session
    pub max_attempts: u8,

    /// Action once `max_attempts` is reached
    pub on_attempts_exhausted: ExhaustedPolicy,

    /// Push channel status poll period
    pub poll_period_s: u64,

    /// Timeout for each service request
    pub request_timeout_s: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: OTP_MAX_ATTEMPTS,
            on_attempts_exhausted: ExhaustedPolicy::AutoReject,
            poll_period_s: DEFAULT_POLL_PERIOD_S,
            request_timeout_s: DEFAULT_REQUEST_TIMEOUT_S,
        }
    }
}

impl Config {
    /// Lockout-style configuration, rejecting once attempts are exhausted
    pub fn lockout() -> Self {
        Self {
            max_attempts: PIN_LOCK_MAX_ATTEMPTS,
            on_attempts_exhausted: ExhaustedPolicy::AutoReject,
            ..Default::default()
        }
    }

    /// One-time-code configuration, requiring a new code once attempts are exhausted
    pub fn otp() -> Self {
        Self {
            max_attempts: OTP_MAX_ATTEMPTS,
            on_attempts_exhausted: ExhaustedPolicy::RequireResend,
            ..Default::default()
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_s.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s.max(1))
    }
}
