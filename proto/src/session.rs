// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Confirmation session objects
//!
//! Service responses are decoded via `Wire*` shapes carrying the raw
//! `channel` string, then converted into typed objects. An unrecognised
//! channel is reported as [ProtoError::UnknownChannel].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{ProtoError, SessionId};

/// Out-of-band confirmation channel
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Confirmation via tap on a trusted device, polled for completion
    Push,
    /// Confirmation via a code emailed to the user
    OneTimeCodeEmail,
}

impl Channel {
    /// Parse a channel from its wire name
    pub fn decode(s: &str) -> Result<Self, ProtoError> {
        s.parse().map_err(|_| ProtoError::UnknownChannel(s.to_string()))
    }

    /// Whether codes are entered locally on this channel
    pub fn accepts_code(&self) -> bool {
        matches!(self, Channel::OneTimeCodeEmail)
    }
}

/// Active session information, returned on initiation and on rotation
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub channel: Channel,
    /// Masked delivery destination, for display only
    pub contact_display_name: String,
    pub resend_cooldown_seconds: u32,
}

/// Session information as received from the service
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WireSession {
    pub session_id: String,
    pub channel: String,
    #[serde(default)]
    pub contact_display_name: String,
    #[serde(default)]
    pub resend_cooldown_seconds: u32,
}

impl TryFrom<WireSession> for SessionInfo {
    type Error = ProtoError;

    fn try_from(w: WireSession) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: SessionId::new(w.session_id)?,
            channel: Channel::decode(&w.channel)?,
            contact_display_name: w.contact_display_name,
            resend_cooldown_seconds: w.resend_cooldown_seconds,
        })
    }
}

impl From<&SessionInfo> for WireSession {
    fn from(s: &SessionInfo) -> Self {
        Self {
            session_id: s.session_id.to_string(),
            channel: s.channel.to_string(),
            contact_display_name: s.contact_display_name.clone(),
            resend_cooldown_seconds: s.resend_cooldown_seconds,
        }
    }
}

impl SessionInfo {
    /// Decode session information from a JSON service response
    pub fn decode(buff: &[u8]) -> Result<Self, ProtoError> {
        let w: WireSession = serde_json::from_slice(buff)?;
        Self::try_from(w)
    }
}

/// Session status as reported by a status query
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// Confirmation state reported in response to a submitted code
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmState {
    Pending,
    Confirmed,
}

/// Response to a submitted code.
///
/// `session` may carry a different session id to the request, signalling
/// that the service has rotated the challenge.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConfirmResp {
    pub state: ConfirmState,
    pub session: SessionInfo,
}

/// Confirmation response as received from the service
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct WireConfirm {
    pub state: ConfirmState,
    #[serde(flatten)]
    pub session: WireSession,
}

impl TryFrom<WireConfirm> for ConfirmResp {
    type Error = ProtoError;

    fn try_from(w: WireConfirm) -> Result<Self, Self::Error> {
        Ok(Self {
            state: w.state,
            session: SessionInfo::try_from(w.session)?,
        })
    }
}

impl ConfirmResp {
    /// Decode a confirmation response from JSON
    pub fn decode(buff: &[u8]) -> Result<Self, ProtoError> {
        let w: WireConfirm = serde_json::from_slice(buff)?;
        Self::try_from(w)
    }

    /// Check whether this response rotates away from `current`
    pub fn is_rotation(&self, current: &SessionId) -> bool {
        &self.session.session_id != current
    }
}
