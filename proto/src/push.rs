// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Push-delivered confirmation payloads
//!
//! Payloads are a closed set keyed by operation kind. Decoding is strict:
//! unknown kinds or missing identifiers fail with [ProtoError] instead of
//! defaulting.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Code, OperationId, ProtoError, SessionId};

/// Operation kinds with push support
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PayloadKind {
    Payment,
    Login,
    DeviceTrust,
}

/// Push payload delivering a confirmation code for an open session
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PushPayload {
    Payment {
        operation_id: OperationId,
        session_id: SessionId,
        code: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<String>,
    },
    Login {
        operation_id: OperationId,
        session_id: SessionId,
        code: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client: Option<String>,
    },
    DeviceTrust {
        operation_id: OperationId,
        session_id: SessionId,
        code: Code,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        device_name: Option<String>,
    },
}

/// Minimal view used to report unknown kinds precisely
#[derive(Deserialize)]
struct KindOnly {
    kind: Option<String>,
}

impl PushPayload {
    /// Strictly decode a push payload from JSON
    pub fn decode(buff: &[u8]) -> Result<Self, ProtoError> {
        // Check the kind tag first so unknown kinds are distinguishable
        let k: KindOnly = serde_json::from_slice(buff)?;
        match k.kind {
            Some(kind) if kind.parse::<PayloadKind>().is_err() => {
                return Err(ProtoError::UnknownPayload(kind))
            }
            None => return Err(ProtoError::missing("kind")),
            _ => (),
        }

        let p = serde_json::from_slice(buff)?;
        Ok(p)
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            PushPayload::Payment { .. } => PayloadKind::Payment,
            PushPayload::Login { .. } => PayloadKind::Login,
            PushPayload::DeviceTrust { .. } => PayloadKind::DeviceTrust,
        }
    }

    pub fn operation_id(&self) -> &OperationId {
        match self {
            PushPayload::Payment { operation_id, .. }
            | PushPayload::Login { operation_id, .. }
            | PushPayload::DeviceTrust { operation_id, .. } => operation_id,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            PushPayload::Payment { session_id, .. }
            | PushPayload::Login { session_id, .. }
            | PushPayload::DeviceTrust { session_id, .. } => session_id,
        }
    }

    pub fn code(&self) -> &Code {
        match self {
            PushPayload::Payment { code, .. }
            | PushPayload::Login { code, .. }
            | PushPayload::DeviceTrust { code, .. } => code,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_payment() {
        let p = PushPayload::decode(
            br#"{"kind":"payment","operation_id":"op-1","session_id":"s1","code":"123456","amount":"10.00"}"#,
        )
        .unwrap();

        assert_eq!(p.kind(), PayloadKind::Payment);
        assert_eq!(p.operation_id().as_str(), "op-1");
        assert_eq!(p.session_id().as_str(), "s1");
        assert_eq!(p.code().as_str(), "123456");
    }

    #[test]
    fn decode_device_trust_without_extras() {
        let p = PushPayload::decode(
            br#"{"kind":"device_trust","operation_id":"op-2","session_id":"s9","code":"777777"}"#,
        )
        .unwrap();

        assert_eq!(p.kind(), PayloadKind::DeviceTrust);
    }

    #[test]
    fn unknown_kind_fails_loudly() {
        let r = PushPayload::decode(
            br#"{"kind":"marketing","operation_id":"op-1","session_id":"s1","code":"1"}"#,
        );
        assert_eq!(r, Err(ProtoError::UnknownPayload("marketing".into())));

        let r = PushPayload::decode(br#"{"operation_id":"op-1","session_id":"s1","code":"1"}"#);
        assert!(matches!(r, Err(ProtoError::Validation { field: "kind", .. })));
    }

    #[test]
    fn missing_fields_fail() {
        let r = PushPayload::decode(br#"{"kind":"login","operation_id":"op-1","code":"1"}"#);
        assert!(matches!(r, Err(ProtoError::Malformed(_))));

        let r = PushPayload::decode(
            br#"{"kind":"login","operation_id":"","session_id":"s1","code":"1"}"#,
        );
        assert!(matches!(r, Err(ProtoError::Malformed(_))));
    }
}
