// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command line utility for step-up operation confirmation

use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader};

use stepup::{
    proto::{Operation, OperationId, PushPayload},
    Config, ExhaustedPolicy, LifecycleController, Outcome, PreConfirmGuard, Reconciler,
    ScriptedService,
};

mod helpers;
use helpers::*;

/// Step-up confirmation command line utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Subcommand)]
#[non_exhaustive]
enum Actions {
    /// Run a confirmation flow against a scripted service, reading codes
    /// (or `reject`, `resend`, `status`, `quit`) from stdin
    Confirm {
        /// Service script (JSON)
        #[clap(long)]
        script: String,

        /// Operation identifier
        #[clap(long, default_value = "op-1")]
        operation: String,

        /// Operation display label
        #[clap(long, default_value = "Operation")]
        label: String,

        /// Operation context entries (`label=value`)
        #[clap(long = "context", value_parser = Operation::parse_context)]
        context: Vec<(String, String)>,

        /// Warnings to acknowledge before initiating
        #[clap(long = "warning")]
        warnings: Vec<String>,

        /// Push payloads (JSON) to deliver once the session is open
        #[clap(long = "push")]
        pushes: Vec<String>,

        /// Delay before delivering push payloads
        #[clap(long, default_value = "3")]
        push_delay_s: u64,

        #[clap(flatten)]
        config: ConfigArgs,
    },

    /// Decode a push payload (JSON file or `-` for stdin)
    DecodePush {
        /// Payload file
        file: String,
    },
}

/// Flow configuration, overriding the optional config file
#[derive(Clone, PartialEq, Debug, clap::Args)]
struct ConfigArgs {
    /// Configuration file (JSON)
    #[clap(long)]
    config_file: Option<String>,

    /// Maximum wrong-code attempts per session
    #[clap(long)]
    max_attempts: Option<u8>,

    /// Action once attempts are exhausted (auto_reject, require_resend)
    #[clap(long)]
    on_attempts_exhausted: Option<ExhaustedPolicy>,

    /// Push status poll period in seconds
    #[clap(long)]
    poll_period_s: Option<u64>,

    /// Service request timeout in seconds
    #[clap(long)]
    request_timeout_s: Option<u64>,
}

impl ConfigArgs {
    async fn load(&self) -> anyhow::Result<Config> {
        let mut c: Config = match &self.config_file {
            Some(f) => read_json(f).await?,
            None => Config::default(),
        };

        if let Some(v) = self.max_attempts {
            c.max_attempts = v;
        }
        if let Some(v) = self.on_attempts_exhausted {
            c.on_attempts_exhausted = v;
        }
        if let Some(v) = self.poll_period_s {
            c.poll_period_s = v;
        }
        if let Some(v) = self.request_timeout_s {
            c.request_timeout_s = v;
        }

        Ok(c)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())?;

    debug!("Executing command: {:?}", args.cmd);

    match args.cmd {
        Actions::Confirm {
            script,
            operation,
            label,
            context,
            warnings,
            pushes,
            push_delay_s,
            config,
        } => {
            let config = config.load().await?;
            debug!("Using config: {:?}", config);

            let service = ScriptedService::from_json(&read_bytes(&script).await?)?;

            let mut op = Operation::new(OperationId::new(operation)?, label);
            for (l, v) in context {
                op = op.with_context(l, v);
            }

            let pushes = read_pushes(&pushes).await?;

            confirm(service, op, config, warnings, pushes, push_delay_s).await?;
        }
        Actions::DecodePush { file } => {
            let buff = read_bytes(&file).await?;

            let p = PushPayload::decode(&buff)?;

            info!("{} payload for operation {}", p.kind(), p.operation_id());
            println!("{}", serde_json::to_string_pretty(&p)?);
        }
    }

    Ok(())
}

/// Read and strictly decode push payload files
async fn read_pushes(files: &[String]) -> anyhow::Result<Vec<PushPayload>> {
    let mut pushes = Vec::with_capacity(files.len());

    for f in files {
        let p = PushPayload::decode(&read_bytes(f).await?)?;
        pushes.push(p);
    }

    Ok(pushes)
}

/// Run a confirmation flow to completion
async fn confirm(
    service: ScriptedService,
    op: Operation,
    config: Config,
    warnings: Vec<String>,
    pushes: Vec<PushPayload>,
    push_delay_s: u64,
) -> anyhow::Result<()> {
    info!("Confirming {} ({})", op.label, op.id);
    for (l, v) in &op.context {
        info!("  {}: {}", l, v);
    }

    let (observer, mut outcomes) = CliObserver::new();
    let mut c = LifecycleController::new(service, op, config, observer);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Walk through pre-confirmation warnings
    if !warnings.is_empty() {
        c = c.with_guard(PreConfirmGuard::new(warnings.iter()));

        for w in &warnings {
            warn!("{}", w);
        }

        for (prompt, step) in [
            ("type 'ack' to acknowledge the warnings above", "ack"),
            ("type 'confirm' to continue", "confirm"),
        ] {
            info!("{}", prompt);

            match lines.next_line().await? {
                Some(l) if l.trim() == step => {
                    c.update_guard(|g| match step {
                        "ack" => g.acknowledge(),
                        _ => g.confirm(),
                    });
                }
                _ => {
                    c.reject().await?;
                    return Err(anyhow::anyhow!("warnings not acknowledged"));
                }
            }
        }
    }

    // Deliver push payloads via the reconciler
    let reconciler = Reconciler::new();
    c.attach(&reconciler)?;

    if !pushes.is_empty() {
        let r = reconciler.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(push_delay_s)).await;

            for p in pushes {
                debug!("Delivering {} push payload", p.kind());
                if !r.route(p) {
                    warn!("push payload did not match the open session");
                }
            }
        });
    }

    c.initiate().await?;

    let outcome = loop {
        tokio::select! {
            o = outcomes.recv() => match o {
                Some(o) => break o,
                None => return Err(anyhow::anyhow!("flow ended without outcome")),
            },
            l = lines.next_line() => {
                let l = match l? {
                    Some(l) => l,
                    None => {
                        c.reject().await?;
                        continue;
                    }
                };

                let r = match l.trim() {
                    "" => continue,
                    "reject" => c.reject().await,
                    "resend" => c.resend().await,
                    "status" => c.poll_status().await,
                    "quit" | "exit" => {
                        c.dispose();
                        return Ok(());
                    }
                    code => c.verify(code).await,
                };

                if let Err(e) = r {
                    error!("{}", e);
                }
            }
        }
    };

    let id = outcome.operation_id();
    match &outcome {
        Outcome::Confirmed { channel, .. } => info!("Operation {} confirmed via {}", id, channel),
        Outcome::Rejected { .. } => info!("Operation {} rejected", id),
        Outcome::Expired { .. } => info!("Operation {} expired", id),
    }

    Ok(())
}
