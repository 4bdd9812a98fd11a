// Copyright (c) 2022-2023 The MobileCoin Foundation

#![allow(dead_code)]

use std::{str::FromStr, sync::Arc, time::Duration};

use log::LevelFilter;
use parking_lot::Mutex;
use simplelog::SimpleLogger;
use tokio::sync::Notify;

use stepup::{
    proto::{Channel, Code, Operation, OperationId, PushPayload, SessionId},
    service::Call,
    Config, LifecycleController, Notice, Observer, ScriptedService,
};

pub type Controller = LifecycleController<Arc<ScriptedService>>;

pub const OTP_S1: &str = r#"{"ok": {"session_id": "s1", "channel": "one_time_code_email", "contact_display_name": "j***@example.com", "resend_cooldown_seconds": 30}}"#;
pub const OTP_S2: &str = r#"{"ok": {"session_id": "s2", "channel": "one_time_code_email", "contact_display_name": "j***@example.com", "resend_cooldown_seconds": 30}}"#;
pub const PUSH_S1: &str = r#"{"ok": {"session_id": "s1", "channel": "push", "contact_display_name": "Pixel 7"}}"#;

pub const PENDING_S1: &str = r#"{"ok": {"state": "pending", "session_id": "s1", "channel": "one_time_code_email", "resend_cooldown_seconds": 30}}"#;
pub const CONFIRMED_S1: &str = r#"{"ok": {"state": "confirmed", "session_id": "s1", "channel": "one_time_code_email"}}"#;

/// Setup logging, `LOG_LEVEL` overrides the default debug level
pub fn setup() {
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let _ = SimpleLogger::init(log_level, simplelog::Config::default());
}

/// Observed flow events
#[derive(Clone, PartialEq, Debug)]
pub enum Record {
    Confirmed {
        session_id: SessionId,
        channel: Channel,
    },
    Rejected {
        session_id: Option<SessionId>,
        channel: Option<Channel>,
    },
    Expired,
    Notice(Notice),
}

impl Record {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Record::Notice(_))
    }
}

/// Observer recording flow events
#[derive(Clone, Default)]
pub struct Recorder {
    records: Arc<Mutex<Vec<Record>>>,
    terminal: Arc<Notify>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.is_terminal())
            .cloned()
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                Record::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    /// Wait for a terminal outcome
    pub async fn wait_terminal(&self) {
        tokio::time::timeout(Duration::from_secs(300), self.terminal.notified())
            .await
            .expect("timeout waiting for outcome");
    }

    fn push(&self, r: Record) {
        let terminal = r.is_terminal();

        self.records.lock().push(r);

        if terminal {
            self.terminal.notify_one();
        }
    }
}

impl Observer for Recorder {
    fn on_confirmed(&self, _operation_id: &OperationId, session_id: &SessionId, channel: Channel) {
        self.push(Record::Confirmed {
            session_id: session_id.clone(),
            channel,
        });
    }

    fn on_rejected(
        &self,
        _operation_id: &OperationId,
        session_id: Option<&SessionId>,
        channel: Option<Channel>,
    ) {
        self.push(Record::Rejected {
            session_id: session_id.cloned(),
            channel,
        });
    }

    fn on_expired(&self, _operation_id: &OperationId) {
        self.push(Record::Expired);
    }

    fn on_notice(&self, notice: &Notice) {
        self.push(Record::Notice(notice.clone()));
    }
}

pub fn op_id() -> OperationId {
    OperationId::new("op-1").unwrap()
}

pub fn sid(s: &str) -> SessionId {
    SessionId::new(s).unwrap()
}

pub fn code(s: &str) -> Code {
    Code::new(s).unwrap()
}

pub fn payment(session: &str, c: &str) -> PushPayload {
    PushPayload::Payment {
        operation_id: op_id(),
        session_id: sid(session),
        code: code(c),
        amount: Some("12.00 EUR".into()),
    }
}

/// Create a scripted service from JSON
pub fn service(script: &str) -> Arc<ScriptedService> {
    Arc::new(ScriptedService::from_json(script.as_bytes()).unwrap())
}

/// Create a controller for `op-1` over the provided service
pub fn controller(svc: &Arc<ScriptedService>, config: Config) -> (Controller, Recorder) {
    setup();

    let r = Recorder::new();
    let op = Operation::new(op_id(), "Payment").with_context("Amount", "12.00 EUR");

    let c = LifecycleController::new(svc.clone(), op, config, r.clone());

    (c, r)
}

pub fn status_calls(svc: &ScriptedService) -> usize {
    svc.calls()
        .iter()
        .filter(|c| matches!(c, Call::Status { .. }))
        .count()
}

pub fn confirm_calls(svc: &ScriptedService) -> Vec<Code> {
    svc.calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Confirm { code, .. } => Some(code),
            _ => None,
        })
        .collect()
}

pub fn reject_calls(svc: &ScriptedService) -> usize {
    svc.calls()
        .iter()
        .filter(|c| matches!(c, Call::Reject { .. }))
        .count()
}
