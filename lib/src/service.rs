// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Confirmation service interface
//!
//! The remote service creates, queries, confirms and rejects confirmation
//! sessions. Transport is left to implementers, see [ScriptedService] for
//! a local implementation replaying JSON-described replies.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::error::Elapsed;

use stepup_core::engine::Fault;
use stepup_proto::{Code, ConfirmResp, OperationId, ProtoError, SessionId, SessionInfo, SessionStatus};

mod scripted;
pub use scripted::{Call, Failure, Reply, Script, ScriptedService};

/// Confirmation service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Operation is no longer valid
    #[error("operation not found")]
    OperationNotFound,

    /// Session expired or unknown
    #[error("session not found")]
    SessionNotFound,

    /// Response could not be interpreted
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// Underlying transport error
    #[error("transport error: {0}")]
    Transport(anyhow::Error),

    /// No response within the request timeout
    #[error("request timeout")]
    Timeout,
}

impl ServiceError {
    /// Classify this error for the confirmation engine
    pub fn fault(&self) -> Fault {
        match self {
            ServiceError::OperationNotFound => Fault::OperationNotFound,
            ServiceError::SessionNotFound => Fault::SessionNotFound,
            ServiceError::Protocol(_) => Fault::Protocol,
            ServiceError::Transport(_) | ServiceError::Timeout => Fault::Transient,
        }
    }
}

impl From<Elapsed> for ServiceError {
    fn from(_: Elapsed) -> Self {
        ServiceError::Timeout
    }
}

/// Remote confirmation service
#[async_trait]
pub trait ConfirmationService: Send + Sync {
    /// Open a confirmation session for an operation
    async fn session_initiate(&self, operation_id: &OperationId)
        -> Result<SessionInfo, ServiceError>;

    /// Query the status of a push session
    async fn session_status(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
    ) -> Result<SessionStatus, ServiceError>;

    /// Submit a code, the response may rotate the session
    async fn session_confirm(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: &Code,
    ) -> Result<ConfirmResp, ServiceError>;

    /// Notify the service of a rejection
    async fn session_reject(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: Option<&Code>,
    ) -> Result<(), ServiceError>;
}

#[async_trait]
impl<T: ConfirmationService + ?Sized> ConfirmationService for Arc<T> {
    async fn session_initiate(
        &self,
        operation_id: &OperationId,
    ) -> Result<SessionInfo, ServiceError> {
        self.as_ref().session_initiate(operation_id).await
    }

    async fn session_status(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
    ) -> Result<SessionStatus, ServiceError> {
        self.as_ref().session_status(operation_id, session_id).await
    }

    async fn session_confirm(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: &Code,
    ) -> Result<ConfirmResp, ServiceError> {
        self.as_ref()
            .session_confirm(operation_id, session_id, code)
            .await
    }

    async fn session_reject(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: Option<&Code>,
    ) -> Result<(), ServiceError> {
        self.as_ref()
            .session_reject(operation_id, session_id, code)
            .await
    }
}
