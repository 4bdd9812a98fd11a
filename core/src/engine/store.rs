// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::time::SystemTime;

use stepup_proto::{SessionId, SessionInfo};

/// Confirmation session held by the [SessionStore]
#[derive(Clone, PartialEq, Debug)]
pub struct Session {
    pub info: SessionInfo,
    pub created_at: SystemTime,
}

/// Holds the single open session for an operation.
///
/// Sessions are replaced, never mutated.
#[derive(Default, Debug)]
pub struct SessionStore {
    current: Option<Session>,
}

impl SessionStore {
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Open a session, returning any session it replaces
    pub fn open(&mut self, info: SessionInfo) -> Option<Session> {
        self.current.replace(Session {
            info,
            created_at: SystemTime::now(),
        })
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn info(&self) -> Option<&SessionInfo> {
        self.current.as_ref().map(|s| &s.info)
    }

    /// Check whether the open session has the provided id
    pub fn matches(&self, session_id: &SessionId) -> bool {
        self.info().map(|s| &s.session_id) == Some(session_id)
    }

    /// Discard the open session
    pub fn close(&mut self) -> Option<Session> {
        self.current.take()
    }
}
