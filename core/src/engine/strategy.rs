// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Channel strategy, selecting timers from the session channel

use stepup_proto::{Channel, SessionInfo};

use super::TimerPlan;
use crate::Config;

/// Select timers to arm for the provided session
pub fn plan(info: &SessionInfo, config: &Config) -> TimerPlan {
    match info.channel {
        Channel::Push => TimerPlan {
            poll: Some(config.poll_period()),
            cooldown: None,
        },
        Channel::OneTimeCodeEmail => TimerPlan {
            poll: None,
            cooldown: match info.resend_cooldown_seconds {
                0 => None,
                n => Some(n),
            },
        },
    }
}
