// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::path::Path;

use log::{debug, info};
use serde::de::DeserializeOwned;
use tokio::{io::AsyncReadExt, sync::mpsc};

use stepup::{
    proto::{Channel, OperationId, SessionId},
    Notice, Observer, Outcome,
};

/// Helper to read input files, `-` reads from stdin
pub async fn read_bytes(file_name: &str) -> anyhow::Result<Vec<u8>> {
    debug!("Reading input from '{}'", file_name);

    let mut buff = vec![];

    match file_name {
        "-" => {
            tokio::io::stdin().read_to_end(&mut buff).await?;
        }
        _ => buff = tokio::fs::read(file_name).await?,
    }

    Ok(buff)
}

/// Helper to read JSON input files
pub async fn read_json<T: DeserializeOwned>(file_name: &str) -> anyhow::Result<T> {
    let p = Path::new(file_name);

    match p.extension().and_then(|e| e.to_str()) {
        Some("json") => (),
        _ => return Err(anyhow::anyhow!("unsupported input file format")),
    }

    let s = tokio::fs::read_to_string(p).await?;
    let v = serde_json::from_str(&s)?;

    Ok(v)
}

/// Observer logging flow events and forwarding the outcome
pub struct CliObserver {
    tx: mpsc::UnboundedSender<Outcome>,
}

impl CliObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Observer for CliObserver {
    fn on_confirmed(&self, operation_id: &OperationId, session_id: &SessionId, channel: Channel) {
        let _ = self.tx.send(Outcome::Confirmed {
            operation_id: operation_id.clone(),
            session_id: session_id.clone(),
            channel,
        });
    }

    fn on_rejected(
        &self,
        operation_id: &OperationId,
        session_id: Option<&SessionId>,
        channel: Option<Channel>,
    ) {
        let _ = self.tx.send(Outcome::Rejected {
            operation_id: operation_id.clone(),
            session_id: session_id.cloned(),
            channel,
        });
    }

    fn on_expired(&self, operation_id: &OperationId) {
        let _ = self.tx.send(Outcome::Expired {
            operation_id: operation_id.clone(),
        });
    }

    fn on_notice(&self, notice: &Notice) {
        match notice {
            Notice::SessionOpened(s) if s.channel.accepts_code() => {
                info!("code sent to {}, enter it below", s.contact_display_name)
            }
            Notice::SessionOpened(s) => {
                info!("approve on your trusted device ({})", s.contact_display_name)
            }
            Notice::NewCodeSent(s) => info!("new code sent via {}", s.channel),
            Notice::AttemptFailed { remaining, .. } => {
                info!("incorrect code, {} attempt(s) remaining", remaining)
            }
            Notice::AttemptsExhausted => info!("too many attempts, type 'resend' for a new code"),
            Notice::ResendAvailable => info!("type 'resend' to request a new code"),
            Notice::TryAgain => info!("request failed, please try again"),
        }
    }
}
