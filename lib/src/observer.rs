// Copyright (c) 2022-2023 The MobileCoin Foundation

use log::info;

use stepup_core::engine::Notice;
use stepup_proto::{Channel, OperationId, SessionId};

/// Presentation layer callbacks for a confirmation flow.
///
/// Exactly one of `on_confirmed`, `on_rejected` or `on_expired` is called
/// per flow, and none are called once the controller is disposed.
pub trait Observer: Send + Sync {
    /// Operation confirmed
    fn on_confirmed(&self, operation_id: &OperationId, session_id: &SessionId, channel: Channel);

    /// Operation rejected, locally or by the service
    fn on_rejected(
        &self,
        operation_id: &OperationId,
        session_id: Option<&SessionId>,
        channel: Option<Channel>,
    );

    /// Operation or session expired
    fn on_expired(&self, operation_id: &OperationId);

    /// Non-terminal notices (new code sent, attempt failed, etc.)
    fn on_notice(&self, _notice: &Notice) {}
}

/// [Observer] writing flow events to the log
#[derive(Clone, Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_confirmed(&self, operation_id: &OperationId, session_id: &SessionId, channel: Channel) {
        info!(
            "operation {} confirmed (session: {}, channel: {})",
            operation_id, session_id, channel
        );
    }

    fn on_rejected(
        &self,
        operation_id: &OperationId,
        session_id: Option<&SessionId>,
        channel: Option<Channel>,
    ) {
        info!(
            "operation {} rejected (session: {:?}, channel: {:?})",
            operation_id, session_id, channel
        );
    }

    fn on_expired(&self, operation_id: &OperationId) {
        info!("operation {} expired", operation_id);
    }

    fn on_notice(&self, notice: &Notice) {
        info!("{:?}", notice);
    }
}
