// Copyright (c) 2022-2023 The MobileCoin Foundation

use stepup_core::engine::Error as EngineError;
use stepup_proto::ProtoError;

use crate::service::ServiceError;

/// Step-up confirmation API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid identifier or code, never sent to the service
    #[error("Invalid input: {0}")]
    Proto(#[from] ProtoError),

    /// Engine rejected the operation in the current state
    #[error("Engine operation failed: {0}")]
    Engine(#[from] EngineError),

    /// Service request failed
    #[error("Service request failed: {0}")]
    Service(#[from] ServiceError),

    /// Controller has been disposed
    #[error("Confirmation flow disposed")]
    Disposed,

    /// Pre-confirmation checklist not complete
    #[error("Pre-confirmation guard not satisfied")]
    GuardUnsatisfied,
}
