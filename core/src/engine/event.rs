// Copyright (c) 2022-2023 The MobileCoin Foundation

use strum::Display;

use stepup_proto::{Code, ConfirmResp, OperationId, SessionId, SessionInfo, SessionStatus};

/// Classification of failed service requests
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum Fault {
    /// Operation is no longer valid
    OperationNotFound,
    /// Session expired or unknown to the service
    SessionNotFound,
    /// Response could not be interpreted
    Protocol,
    /// Transport or other recoverable failure
    Transient,
}

impl Fault {
    /// Whether this fault ends the flow as expired
    pub fn is_expiry(&self) -> bool {
        matches!(self, Fault::OperationNotFound | Fault::SessionNotFound)
    }
}

/// [`Engine`][super::Engine] input events
#[derive(Clone, Debug)]
pub enum Event {
    /// Start the flow
    Initiate,

    /// Response to [`Request::Initiate`][super::Request::Initiate]
    InitiateResult(Result<SessionInfo, Fault>),

    /// Update the locally entered (unsubmitted) code
    Input(String),

    /// Submit a code for verification
    Verify(Code),

    /// Response to [`Request::Confirm`][super::Request::Confirm]
    ConfirmResult {
        session_id: SessionId,
        result: Result<ConfirmResp, Fault>,
    },

    /// Poll timer tick
    PollTick,

    /// Response to [`Request::Status`][super::Request::Status]
    StatusResult {
        session_id: SessionId,
        result: Result<SessionStatus, Fault>,
    },

    /// Cooldown timer tick (one per second)
    CooldownTick,

    /// Request a new code
    Resend,

    /// Explicit rejection by the user or system
    Reject,

    /// Code delivered out-of-band
    ExternalCode {
        operation_id: OperationId,
        session_id: SessionId,
        code: Code,
    },

    /// Flow abandoned, no further outputs are produced
    Dispose,
}

impl Event {
    /// Whether this event is driven by a response or timer rather than a caller
    pub fn is_async(&self) -> bool {
        matches!(
            self,
            Event::InitiateResult(_)
                | Event::ConfirmResult { .. }
                | Event::StatusResult { .. }
                | Event::PollTick
                | Event::CooldownTick
                | Event::ExternalCode { .. }
        )
    }
}
