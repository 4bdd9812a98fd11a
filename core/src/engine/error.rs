// Copyright (c) 2022-2023 The MobileCoin Foundation

/// [Engine][super::Engine] errors
#[derive(Copy, Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[repr(u8)]
pub enum Error {
    /// Event not valid in the current state
    #[error("Unexpected event")]
    UnexpectedEvent = 0x01,

    /// A request is already in flight
    #[error("request in flight")]
    Busy = 0x02,

    /// Flow has already reached a terminal state
    #[error("confirmation flow complete")]
    Terminal = 0x03,

    /// Operation not supported on the active channel
    #[error("operation not supported on this channel")]
    WrongChannel = 0x04,

    /// Resend requested before the cooldown expired
    #[error("resend cooldown active")]
    CooldownActive = 0x05,

    /// Attempt limit reached, a new code must be requested
    #[error("attempts exhausted, request a new code")]
    AttemptsExhausted = 0x06,

    /// No session is open
    #[error("no open session")]
    MissingSession = 0x07,
}
