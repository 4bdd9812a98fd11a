// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] implements the step-up confirmation state machine.
//!
//! This handles [Event] inputs and returns [Output]s to the caller, see
//! the `stepup` crate for an async driver executing requests and timers.

use log::{debug, trace, warn};
use strum::Display;
use zeroize::Zeroize;

use stepup_proto::{
    Channel, Code, ConfirmResp, ConfirmState, OperationId, SessionId, SessionInfo, SessionStatus,
    MAX_CODE_LEN,
};

use crate::{Config, ExhaustedPolicy};

mod event;
pub use event::{Event, Fault};

mod output;
pub use output::{Notice, Outcome, Output, Request, Timer, TimerPlan};

mod error;
pub use error::Error;

mod store;
pub use store::{Session, SessionStore};

mod retry;
pub use retry::RetryCounter;

pub mod strategy;

/// Engine state enumeration
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum State {
    /// Flow created, not yet started
    Uninitiated,
    /// Awaiting session initiation
    Initiating,
    /// Session open, awaiting confirmation via the provided channel
    AwaitingConfirmation(Channel),
    /// Operation confirmed
    Confirmed,
    /// Operation rejected
    Rejected,
    /// Operation or session expired
    Expired,
}

impl State {
    /// Terminal states make no further requests
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Confirmed | State::Rejected | State::Expired)
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, State::AwaitingConfirmation(_))
    }
}

/// Request currently awaiting a response
#[derive(Clone, PartialEq, Debug)]
enum InFlight {
    Initiate,
    Status(SessionId),
    Confirm(SessionId),
}

/// [Engine] drives a single confirmation flow for one operation
pub struct Engine {
    state: State,
    operation_id: OperationId,
    config: Config,

    store: SessionStore,
    attempts: RetryCounter,

    /// Locally entered, unsubmitted code
    entry: String,
    /// Externally delivered code waiting on an in-flight request
    held: Option<Code>,

    in_flight: Option<InFlight>,

    cooldown_remaining: u32,
    last_attempt_failed: bool,
    disposed: bool,
}

impl Engine {
    /// Create a new engine for the provided operation
    pub fn new(operation_id: OperationId, config: Config) -> Self {
        Self {
            state: State::Uninitiated,
            attempts: RetryCounter::new(config.max_attempts),
            operation_id,
            config,
            store: SessionStore::new(),
            entry: String::new(),
            held: None,
            in_flight: None,
            cooldown_remaining: 0,
            last_attempt_failed: false,
            disposed: false,
        }
    }

    /// Handle incoming events
    pub fn update(&mut self, evt: &Event) -> Result<Vec<Output>, Error> {
        let mut out = Vec::new();

        // Disposed engines ignore everything
        if self.disposed {
            trace!("disposed, ignoring event: {:?}", evt);
            return Ok(out);
        }

        debug!("event: {:?} (state: {})", evt, self.state);

        match (self.state, evt) {
            (_, Event::Dispose) => self.dispose(&mut out),

            // Repeated rejection is a no-op
            (s, Event::Reject) if s.is_terminal() => (),

            // Late responses and ticks are discarded once terminal
            (s, evt) if s.is_terminal() && evt.is_async() => {
                trace!("discarding {:?} in terminal state {}", evt, s);
            }

            // Caller events are refused once terminal
            (s, _) if s.is_terminal() => return Err(Error::Terminal),

            // Start flow
            (State::Uninitiated, Event::Initiate) => {
                self.state = State::Initiating;
                self.in_flight = Some(InFlight::Initiate);

                out.push(Output::Request(Request::Initiate {
                    operation_id: self.operation_id.clone(),
                }));
            }

            // Initial session creation
            (State::Initiating, Event::InitiateResult(r))
                if self.in_flight == Some(InFlight::Initiate) =>
            {
                self.in_flight = None;

                match r {
                    Ok(info) => self.open_session(info, false, &mut out),
                    Err(f) if f.is_expiry() => self.expire(&mut out),
                    Err(f) => {
                        // Caller may retry initiation
                        self.state = State::Uninitiated;
                        out.push(Output::Failed(*f));
                    }
                }
            }

            // Resend response
            (State::AwaitingConfirmation(_), Event::InitiateResult(r))
                if self.in_flight == Some(InFlight::Initiate) =>
            {
                self.in_flight = None;

                match r {
                    Ok(info) => self.open_session(info, true, &mut out),
                    Err(f) if f.is_expiry() => self.expire(&mut out),
                    Err(f) => {
                        out.push(Output::Notice(Notice::TryAgain));
                        out.push(Output::Failed(*f));
                    }
                }

                self.dispatch_held(&mut out);
            }

            // Update locally entered code
            (State::AwaitingConfirmation(c), Event::Input(s)) => {
                if !c.accepts_code() {
                    return Err(Error::WrongChannel);
                }

                self.entry.zeroize();
                self.entry = s.chars().take(MAX_CODE_LEN).collect();
            }

            // Submit code
            (State::AwaitingConfirmation(c), Event::Verify(code)) => {
                self.can_submit(c)?;
                if self.in_flight.is_some() {
                    return Err(Error::Busy);
                }

                self.clear_entry();
                self.submit(code.clone(), &mut out)?;
            }

            // Code verification response
            (State::AwaitingConfirmation(_), Event::ConfirmResult { session_id, result })
                if self.in_flight == Some(InFlight::Confirm(session_id.clone())) =>
            {
                self.in_flight = None;
                self.apply_confirm(session_id, result, &mut out);
                self.dispatch_held(&mut out);
            }

            // Poll push session status
            (State::AwaitingConfirmation(Channel::Push), Event::PollTick) => {
                if self.in_flight.is_some() {
                    trace!("request in flight, dropping poll tick");
                    return Ok(out);
                }

                let session_id = self.session_id()?;
                self.in_flight = Some(InFlight::Status(session_id.clone()));

                out.push(Output::Request(Request::Status {
                    operation_id: self.operation_id.clone(),
                    session_id,
                }));
            }

            // Status poll response
            (State::AwaitingConfirmation(_), Event::StatusResult { session_id, result })
                if self.in_flight == Some(InFlight::Status(session_id.clone())) =>
            {
                self.in_flight = None;

                match result {
                    Ok(SessionStatus::Pending) => (),
                    Ok(SessionStatus::Confirmed) => self.confirm(session_id.clone(), &mut out),
                    Ok(SessionStatus::Rejected) => {
                        let channel = self.store.info().map(|s| s.channel);
                        self.terminate(
                            Outcome::Rejected {
                                operation_id: self.operation_id.clone(),
                                session_id: Some(session_id.clone()),
                                channel,
                            },
                            &mut out,
                        );
                    }
                    Err(f) if f.is_expiry() => self.expire(&mut out),
                    Err(f) => warn!("status poll failed ({}), retrying on next tick", f),
                }

                self.dispatch_held(&mut out);
            }

            // Resend countdown
            (State::AwaitingConfirmation(Channel::OneTimeCodeEmail), Event::CooldownTick) => {
                if self.cooldown_remaining > 0 {
                    self.cooldown_remaining -= 1;

                    if self.cooldown_remaining == 0 {
                        out.push(Output::Disarm(Timer::Cooldown));
                        out.push(Output::Notice(Notice::ResendAvailable));
                    }
                }
            }

            // Request a new code
            (State::AwaitingConfirmation(c), Event::Resend) => {
                if !c.accepts_code() {
                    return Err(Error::WrongChannel);
                }
                if self.in_flight.is_some() {
                    return Err(Error::Busy);
                }
                if !self.resend_available() {
                    return Err(Error::CooldownActive);
                }

                self.in_flight = Some(InFlight::Initiate);

                out.push(Output::Request(Request::Initiate {
                    operation_id: self.operation_id.clone(),
                }));
            }

            // Explicit rejection
            (_, Event::Reject) => self.reject(&mut out),

            // Externally delivered code
            (
                State::AwaitingConfirmation(c),
                Event::ExternalCode {
                    operation_id,
                    session_id,
                    code,
                },
            ) => {
                if operation_id != &self.operation_id || !self.store.matches(session_id) {
                    trace!("ignoring external code for {}/{}", operation_id, session_id);
                    return Ok(out);
                }

                self.can_submit(c)?;

                // External code supersedes any partial local entry
                self.clear_entry();

                match self.in_flight.is_some() {
                    true => {
                        debug!("request in flight, holding external code");
                        self.held = Some(code.clone());
                    }
                    false => self.submit(code.clone(), &mut out)?,
                }
            }

            // Stale responses and ticks for other states
            (s, evt) if evt.is_async() => {
                trace!("discarding {:?} in state {}", evt, s);
            }

            _ => return Err(Error::UnexpectedEvent),
        }

        Ok(out)
    }

    /// Fetch engine state
    pub fn state(&self) -> State {
        self.state
    }

    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    /// Fetch the open session
    pub fn session(&self) -> Option<&Session> {
        self.store.current()
    }

    /// Channel of the open session
    pub fn channel(&self) -> Option<Channel> {
        self.store.info().map(|s| s.channel)
    }

    /// Masked contact for the open session
    pub fn contact_display_name(&self) -> Option<&str> {
        self.store.info().map(|s| s.contact_display_name.as_str())
    }

    pub fn remaining_cooldown_seconds(&self) -> u32 {
        self.cooldown_remaining
    }

    pub fn last_attempt_failed(&self) -> bool {
        self.last_attempt_failed
    }

    pub fn retry_count(&self) -> u8 {
        self.attempts.count()
    }

    /// Locally entered, unsubmitted code
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a new code may be requested
    pub fn resend_available(&self) -> bool {
        match self.state {
            State::AwaitingConfirmation(Channel::OneTimeCodeEmail) => {
                self.cooldown_remaining == 0 || self.attempts.is_exhausted()
            }
            _ => false,
        }
    }

    fn session_id(&self) -> Result<SessionId, Error> {
        self.store
            .info()
            .map(|s| s.session_id.clone())
            .ok_or(Error::MissingSession)
    }

    /// Open (or replace) the session and arm timers for its channel
    fn open_session(&mut self, info: &SessionInfo, replaced: bool, out: &mut Vec<Output>) {
        let plan = strategy::plan(info, &self.config);

        debug!(
            "session {} open via {} (replaced: {})",
            info.session_id, info.channel, replaced
        );

        self.store.open(info.clone());
        self.attempts.reset();
        self.last_attempt_failed = false;
        self.held = None;
        self.clear_entry();
        self.cooldown_remaining = plan.cooldown.unwrap_or(0);
        self.state = State::AwaitingConfirmation(info.channel);

        if replaced {
            out.push(Output::Disarm(Timer::All));
        }
        out.push(Output::Arm(plan));

        out.push(Output::Notice(match replaced {
            true => Notice::NewCodeSent(info.clone()),
            false => Notice::SessionOpened(info.clone()),
        }));

        if info.channel.accepts_code() && self.cooldown_remaining == 0 {
            out.push(Output::Notice(Notice::ResendAvailable));
        }
    }

    /// Apply a code verification response
    fn apply_confirm(
        &mut self,
        requested: &SessionId,
        r: &Result<ConfirmResp, Fault>,
        out: &mut Vec<Output>,
    ) {
        match r {
            Ok(ConfirmResp {
                state: ConfirmState::Confirmed,
                session,
            }) => self.confirm(session.session_id.clone(), out),

            // Service issued a new challenge
            Ok(resp) if resp.is_rotation(requested) => {
                self.open_session(&resp.session, true, out);
            }

            // Wrong code
            Ok(_) => {
                self.last_attempt_failed = true;
                self.clear_entry();

                if !self.attempts.increment() {
                    out.push(Output::Notice(Notice::AttemptFailed {
                        attempts: self.attempts.count(),
                        remaining: self.attempts.remaining(),
                    }));
                    return;
                }

                debug!("attempts exhausted ({})", self.attempts.count());

                match self.config.on_attempts_exhausted {
                    ExhaustedPolicy::AutoReject => self.reject(out),
                    ExhaustedPolicy::RequireResend => {
                        self.cooldown_remaining = 0;
                        out.push(Output::Disarm(Timer::Cooldown));
                        out.push(Output::Notice(Notice::AttemptsExhausted));
                        out.push(Output::Notice(Notice::ResendAvailable));
                    }
                }
            }

            Err(f) if f.is_expiry() => self.expire(out),

            // Transient, does not count toward attempts
            Err(f) => {
                warn!("code verification failed: {}", f);

                self.clear_entry();
                out.push(Output::Notice(Notice::TryAgain));
                out.push(Output::Failed(*f));
            }
        }
    }

    /// Check a code may be submitted on the open session
    fn can_submit(&self, channel: Channel) -> Result<(), Error> {
        if !channel.accepts_code() {
            return Err(Error::WrongChannel);
        }
        if self.attempts.is_exhausted() {
            return Err(Error::AttemptsExhausted);
        }
        Ok(())
    }

    /// Issue a confirmation request for the open session
    fn submit(&mut self, code: Code, out: &mut Vec<Output>) -> Result<(), Error> {
        let session_id = self.session_id()?;
        self.in_flight = Some(InFlight::Confirm(session_id.clone()));

        out.push(Output::Request(Request::Confirm {
            operation_id: self.operation_id.clone(),
            session_id,
            code,
        }));

        Ok(())
    }

    /// Submit a held external code once no request is in flight
    fn dispatch_held(&mut self, out: &mut Vec<Output>) {
        let channel = match self.state {
            State::AwaitingConfirmation(c) if self.in_flight.is_none() => c,
            _ => return,
        };

        if let Some(code) = self.held.take() {
            if let Err(e) = self.can_submit(channel) {
                debug!("dropping held external code: {}", e);
                return;
            }

            debug!("dispatching held external code");

            // Session is open when awaiting, so submission cannot fail
            if let Err(e) = self.submit(code, out) {
                warn!("failed to dispatch held code: {}", e);
            }
        }
    }

    fn confirm(&mut self, session_id: SessionId, out: &mut Vec<Output>) {
        let channel = match self.state {
            State::AwaitingConfirmation(c) => c,
            s => {
                warn!("confirmation in state {}, ignoring", s);
                return;
            }
        };

        self.terminate(
            Outcome::Confirmed {
                operation_id: self.operation_id.clone(),
                session_id,
                channel,
            },
            out,
        );
    }

    fn expire(&mut self, out: &mut Vec<Output>) {
        self.terminate(
            Outcome::Expired {
                operation_id: self.operation_id.clone(),
            },
            out,
        );
    }

    /// Reject locally, notifying the service where a session is open
    fn reject(&mut self, out: &mut Vec<Output>) {
        let session = self.store.info().cloned();
        let code = Code::new(self.entry.as_str()).ok();

        self.terminate(
            Outcome::Rejected {
                operation_id: self.operation_id.clone(),
                session_id: session.as_ref().map(|s| s.session_id.clone()),
                channel: session.as_ref().map(|s| s.channel),
            },
            out,
        );

        if let Some(s) = session {
            out.push(Output::Request(Request::Reject {
                operation_id: self.operation_id.clone(),
                session_id: s.session_id,
                code,
            }));
        }
    }

    /// Move to a terminal state, discarding the session
    fn terminate(&mut self, outcome: Outcome, out: &mut Vec<Output>) {
        debug!("flow complete: {:?}", outcome);

        self.state = outcome.state();
        self.in_flight = None;
        self.held = None;
        self.cooldown_remaining = 0;
        self.clear_entry();
        self.store.close();

        out.push(Output::Disarm(Timer::All));
        out.push(Output::Terminal(outcome));
    }

    fn dispose(&mut self, out: &mut Vec<Output>) {
        debug!("disposing flow for {}", self.operation_id);

        self.disposed = true;
        self.in_flight = None;
        self.held = None;
        self.clear_entry();
        self.store.close();

        out.push(Output::Disarm(Timer::All));
    }

    fn clear_entry(&mut self) {
        self.entry.zeroize();
    }
}
