// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Step-up operation confirmation library (and CLI)
//!
//! This drives the I/O free [stepup_core] engine against a remote
//! [ConfirmationService], providing a [LifecycleController] per operation
//! with poll and cooldown timers, a [Reconciler] routing out-of-band codes
//! to open flows, and [Observer] callbacks for the presentation layer.
//!
//! ```no_run
//! # async fn example() -> Result<(), stepup::Error> {
//! use stepup::{
//!     proto::{Operation, OperationId},
//!     Config, LifecycleController, LogObserver, Reconciler, ScriptedService,
//! };
//!
//! let service = ScriptedService::from_json(br#"{
//!     "initiate": [{ "ok": { "session_id": "s1", "channel": "one_time_code_email" } }],
//!     "confirm": [{ "ok": { "state": "confirmed", "session_id": "s1", "channel": "one_time_code_email" } }]
//! }"#)?;
//!
//! let op = Operation::new(OperationId::new("op-1")?, "Payment");
//! let c = LifecycleController::new(service, op, Config::default(), LogObserver);
//!
//! let reconciler = Reconciler::new();
//! c.attach(&reconciler)?;
//!
//! c.initiate().await?;
//! c.verify("123456").await?;
//! # Ok(())
//! # }
//! ```

pub use stepup_core::{self, Config, ExhaustedPolicy};
pub use stepup_proto::{self as proto};

pub use stepup_core::{
    engine::{Notice, Outcome, State},
    guard::PreConfirmGuard,
};

mod controller;
pub use controller::LifecycleController;

mod error;
pub use error::Error;

pub mod observer;
pub use observer::{LogObserver, Observer};

pub mod reconciler;
pub use reconciler::{Reconciler, Registration};

pub mod service;
pub use service::{ConfirmationService, ScriptedService, ServiceError};

pub mod timer;
