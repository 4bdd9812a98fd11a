// Copyright (c) 2022-2023 The MobileCoin Foundation

use core::time::Duration;

use strum::Display;

use stepup_proto::{Channel, Code, OperationId, SessionId, SessionInfo};

use super::Fault;

/// [`Engine`][super::Engine] outputs (in response to events)
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    /// Issue a service request, feeding the response back as an event
    Request(Request),

    /// Arm timers for the active session
    Arm(TimerPlan),

    /// Disarm timers
    Disarm(Timer),

    /// Non-terminal notice for the presentation layer
    Notice(Notice),

    /// Terminal outcome, produced exactly once per flow
    Terminal(Outcome),

    /// Request failed without ending the flow, reported to the caller
    Failed(Fault),
}

/// Service requests
#[derive(Clone, PartialEq, Debug)]
pub enum Request {
    Initiate {
        operation_id: OperationId,
    },
    Status {
        operation_id: OperationId,
        session_id: SessionId,
    },
    Confirm {
        operation_id: OperationId,
        session_id: SessionId,
        code: Code,
    },
    /// Best-effort notification, no response is expected
    Reject {
        operation_id: OperationId,
        session_id: SessionId,
        code: Option<Code>,
    },
}

/// Timer kinds
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum Timer {
    Poll,
    Cooldown,
    All,
}

/// Timers to arm for a session, selected by channel
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TimerPlan {
    /// Status poll period
    pub poll: Option<Duration>,
    /// Resend cooldown in seconds, counted down once per second
    pub cooldown: Option<u32>,
}

/// Non-terminal notices
#[derive(Clone, PartialEq, Debug)]
pub enum Notice {
    /// Session opened following initiation
    SessionOpened(SessionInfo),
    /// Session replaced via rotation or resend, a new code was sent
    NewCodeSent(SessionInfo),
    /// Wrong code entered
    AttemptFailed { attempts: u8, remaining: u8 },
    /// Attempt limit reached, a new code must be requested
    AttemptsExhausted,
    /// Resend is now available
    ResendAvailable,
    /// Request failed, the user may try again
    TryAgain,
}

/// Terminal flow outcomes
#[derive(Clone, PartialEq, Debug)]
pub enum Outcome {
    Confirmed {
        operation_id: OperationId,
        session_id: SessionId,
        channel: Channel,
    },
    Rejected {
        operation_id: OperationId,
        session_id: Option<SessionId>,
        channel: Option<Channel>,
    },
    Expired {
        operation_id: OperationId,
    },
}

impl Outcome {
    pub fn operation_id(&self) -> &OperationId {
        match self {
            Outcome::Confirmed { operation_id, .. }
            | Outcome::Rejected { operation_id, .. }
            | Outcome::Expired { operation_id } => operation_id,
        }
    }

    /// Terminal state for this outcome
    pub fn state(&self) -> super::State {
        match self {
            Outcome::Confirmed { .. } => super::State::Confirmed,
            Outcome::Rejected { .. } => super::State::Rejected,
            Outcome::Expired { .. } => super::State::Expired,
        }
    }
}
