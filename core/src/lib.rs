// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Step-up operation confirmation core
//!
//! This provides an I/O free [Engine][engine::Engine] implementing the
//! confirmation session state machine. The engine consumes
//! [Event][engine::Event]s (user input, service responses, timer ticks,
//! externally delivered codes) and returns [Output][engine::Output]s
//! describing service requests to issue, timers to arm or disarm, and
//! notices and terminal outcomes for the presentation layer.
//!
//! ## Flow
//!
//! 1. Create an [Engine][engine::Engine] for an operation and issue
//!    [`Event::Initiate`][engine::Event::Initiate], executing the returned
//!    [`Request::Initiate`][engine::Request::Initiate]
//! 2. Feed the service response back as
//!    [`Event::InitiateResult`][engine::Event::InitiateResult], the engine
//!    opens a session and returns a [TimerPlan][engine::TimerPlan] for the
//!    session channel
//! 3. For one-time-code sessions submit codes via
//!    [`Event::Verify`][engine::Event::Verify], for push sessions drive
//!    [`Event::PollTick`][engine::Event::PollTick] from the poll timer
//! 4. Exactly one [Outcome][engine::Outcome] is returned once the session
//!    is confirmed, rejected or expired, after which the engine is inert
//!
//! Only one request is in flight at any time. Responses are tagged with the
//! session they were issued for and discarded if the engine has since moved
//! on, so late or stale responses never alter a terminal state.
//!

pub use stepup_proto::{self as proto};

pub mod config;
pub use config::{Config, ExhaustedPolicy};

pub mod engine;

pub mod guard;
