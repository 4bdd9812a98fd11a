// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Pre-confirmation checklist guard
//!
//! Some operations require the user to acknowledge a set of warnings and
//! then confirm a second time before a confirmation flow may be initiated.
//! This is a local precondition only, no service calls are made.

use strum::Display;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum GuardState {
    /// Warnings not yet acknowledged
    Unread,
    /// Warnings acknowledged, awaiting final confirmation
    Acknowledged,
    /// Both steps complete
    Confirmed,
}

/// Two-step acknowledgement guard
#[derive(Clone, PartialEq, Debug)]
pub struct PreConfirmGuard {
    warnings: Vec<String>,
    state: GuardState,
}

impl PreConfirmGuard {
    /// Create a new guard over the provided warnings
    pub fn new(warnings: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            warnings: warnings.into_iter().map(Into::into).collect(),
            state: GuardState::Unread,
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Acknowledge all warnings, returns false if already past this step
    pub fn acknowledge(&mut self) -> bool {
        match self.state {
            GuardState::Unread => {
                self.state = GuardState::Acknowledged;
                true
            }
            _ => false,
        }
    }

    /// Confirm following acknowledgement, returns false if warnings are unread
    pub fn confirm(&mut self) -> bool {
        match self.state {
            GuardState::Acknowledged => {
                self.state = GuardState::Confirmed;
                true
            }
            GuardState::Confirmed => true,
            GuardState::Unread => false,
        }
    }

    /// Step back, clearing the final confirmation or acknowledgement
    pub fn back(&mut self) {
        self.state = match self.state {
            GuardState::Confirmed => GuardState::Acknowledged,
            _ => GuardState::Unread,
        };
    }

    pub fn is_satisfied(&self) -> bool {
        self.state == GuardState::Confirmed
    }
}
