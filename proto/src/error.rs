// Copyright (c) 2022-2023 The MobileCoin Foundation

/// Protocol object errors
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ProtoError {
    /// Required field missing or invalid, never sent to the network
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    /// Channel not defined by the protocol
    #[error("unknown confirmation channel: {0}")]
    UnknownChannel(String),

    /// Push payload kind not defined by the protocol
    #[error("unknown push payload kind: {0}")]
    UnknownPayload(String),

    /// Response or payload could not be decoded
    #[error("malformed message: {0}")]
    Malformed(String),
}

impl ProtoError {
    pub(crate) const fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "missing",
        }
    }
}

impl From<serde_json::Error> for ProtoError {
    fn from(e: serde_json::Error) -> Self {
        ProtoError::Malformed(e.to_string())
    }
}
