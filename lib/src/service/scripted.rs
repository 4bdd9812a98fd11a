// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Scripted confirmation service
//!
//! Replays replies per call kind from a [Script], repeating the last reply
//! once a queue is down to one entry, and records the calls issued. Used by
//! the CLI and for testing controllers without a remote service.
//!
//! ```json
//! {
//!   "latency_ms": 250,
//!   "initiate": [{ "ok": { "session_id": "s1", "channel": "push" } }],
//!   "status": [{ "ok": "pending" }, { "ok": "pending" }, { "ok": "confirmed" }]
//! }
//! ```

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use strum::Display;

use stepup_proto::{
    session::{WireConfirm, WireSession},
    Code, ConfirmResp, OperationId, ProtoError, SessionId, SessionInfo, SessionStatus,
};

use super::{ConfirmationService, ServiceError};

/// Scripted failure kinds
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    OperationNotFound,
    SessionNotFound,
    Protocol,
    Transport,
    /// Never responds, leaving the caller to time out
    Timeout,
}

impl From<Failure> for ServiceError {
    fn from(f: Failure) -> Self {
        match f {
            Failure::OperationNotFound => ServiceError::OperationNotFound,
            Failure::SessionNotFound => ServiceError::SessionNotFound,
            Failure::Protocol => {
                ServiceError::Protocol(ProtoError::Malformed("scripted protocol failure".into()))
            }
            Failure::Transport | Failure::Timeout => {
                ServiceError::Transport(anyhow::anyhow!("scripted {} failure", f))
            }
        }
    }
}

/// Scripted reply
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply<T> {
    Ok(T),
    Err(Failure),
}

/// Replies for each call kind, consumed in order
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Delay applied to every call
    pub latency_ms: u64,
    pub initiate: Vec<Reply<WireSession>>,
    pub status: Vec<Reply<SessionStatus>>,
    pub confirm: Vec<Reply<WireConfirm>>,
    /// Rejections succeed if no replies are provided
    pub reject: Vec<Reply<()>>,
}

/// Service call record
#[derive(Clone, PartialEq, Debug)]
pub enum Call {
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
    Reject {
        operation_id: OperationId,
        session_id: SessionId,
        code: Option<Code>,
    },
}

/// [ConfirmationService] replaying a [Script]
pub struct ScriptedService {
    script: Mutex<Script>,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Tracks concurrent calls, released on drop so cancelled calls are counted
struct Active<'a>(&'a AtomicUsize);

impl<'a> Drop for Active<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedService {
    /// Create a new service replaying the provided script
    pub fn new(script: Script) -> Self {
        Self {
            latency: Duration::from_millis(script.latency_ms),
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Load a script from JSON
    pub fn from_json(buff: &[u8]) -> Result<Self, ProtoError> {
        let script: Script = serde_json::from_slice(buff)?;
        Ok(Self::new(script))
    }

    /// Fetch calls issued so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Fetch the maximum number of calls that were in flight at once
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn begin(&self, call: Call) -> Active<'_> {
        debug!("scripted call: {:?}", call);

        self.calls.lock().push(call);

        let n = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(n, Ordering::SeqCst);
        let a = Active(&self.active);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        a
    }
}

/// Take the next reply, repeating the last
fn next<T: Clone>(q: &mut Vec<T>) -> Option<T> {
    match q.len() {
        0 => None,
        1 => Some(q[0].clone()),
        _ => Some(q.remove(0)),
    }
}

async fn resolve<T: Send>(r: Option<Reply<T>>, kind: &str) -> Result<T, ServiceError> {
    match r {
        Some(Reply::Ok(v)) => Ok(v),
        Some(Reply::Err(Failure::Timeout)) => std::future::pending().await,
        Some(Reply::Err(f)) => Err(f.into()),
        None => Err(ServiceError::Transport(anyhow::anyhow!(
            "no scripted {} reply",
            kind
        ))),
    }
}

#[async_trait]
impl ConfirmationService for ScriptedService {
    async fn session_initiate(
        &self,
        operation_id: &OperationId,
    ) -> Result<SessionInfo, ServiceError> {
        let _a = self
            .begin(Call::Initiate {
                operation_id: operation_id.clone(),
            })
            .await;

        let r = next(&mut self.script.lock().initiate);
        let w = resolve(r, "initiate").await?;

        Ok(SessionInfo::try_from(w)?)
    }

    async fn session_status(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
    ) -> Result<SessionStatus, ServiceError> {
        let _a = self
            .begin(Call::Status {
                operation_id: operation_id.clone(),
                session_id: session_id.clone(),
            })
            .await;

        let r = next(&mut self.script.lock().status);
        resolve(r, "status").await
    }

    async fn session_confirm(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: &Code,
    ) -> Result<ConfirmResp, ServiceError> {
        let _a = self
            .begin(Call::Confirm {
                operation_id: operation_id.clone(),
                session_id: session_id.clone(),
                code: code.clone(),
            })
            .await;

        let r = next(&mut self.script.lock().confirm);
        let w = resolve(r, "confirm").await?;

        Ok(ConfirmResp::try_from(w)?)
    }

    async fn session_reject(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: Option<&Code>,
    ) -> Result<(), ServiceError> {
        let _a = self
            .begin(Call::Reject {
                operation_id: operation_id.clone(),
                session_id: session_id.clone(),
                code: code.cloned(),
            })
            .await;

        let r = next(&mut self.script.lock().reject);
        match r {
            None => Ok(()),
            r => resolve(r, "reject").await,
        }
    }
}
