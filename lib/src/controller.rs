// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Session lifecycle controller
//!
//! Drives a confirmation [Engine] for one operation, executing service
//! requests, running poll and cooldown timers, routing externally
//! delivered codes and reporting outcomes to an [Observer].

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Weak},
    time::Duration,
};

use log::{debug, warn};
use parking_lot::{Mutex, ReentrantMutex};
use tokio::{sync::watch, time::timeout};

use stepup_core::{
    engine::{Engine, Error as EngineError, Event, Fault, Outcome, Output, Request, State, TimerPlan},
    guard::PreConfirmGuard,
    proto::{Channel, Code, Operation, OperationId, SessionId},
    Config,
};

use crate::{
    reconciler::{Reconciler, Registration},
    service::{ConfirmationService, ServiceError},
    timer::Timers,
    Error, Observer,
};

/// Controller for a single operation confirmation flow.
///
/// All service calls are serialised so at most one is in flight at any
/// time. Dropping the controller disposes the flow, stopping timers and
/// silencing any further callbacks.
pub struct LifecycleController<S: ConfirmationService + 'static> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    operation: Operation,
    engine: Mutex<Engine>,
    service: S,
    /// Serialises service calls
    gate: tokio::sync::Mutex<()>,
    request_timeout: Duration,
    observer: Arc<dyn Observer>,
    /// Held while dispatching observer callbacks
    notify: ReentrantMutex<()>,
    timers: Mutex<Timers>,
    guard: Mutex<Option<PreConfirmGuard>>,
    /// Open session, shared with the reconciler
    session: watch::Sender<Option<SessionId>>,
    registration: Mutex<Option<Registration>>,
}

impl<S: ConfirmationService + 'static> LifecycleController<S> {
    /// Create a new controller for the provided operation
    pub fn new(
        service: S,
        operation: Operation,
        config: Config,
        observer: impl Observer + 'static,
    ) -> Self {
        let (session, _) = watch::channel(None);

        debug!("creating controller for operation: {}", operation.id);

        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(Engine::new(operation.id.clone(), config.clone())),
                operation,
                service,
                gate: tokio::sync::Mutex::new(()),
                request_timeout: config.request_timeout(),
                observer: Arc::new(observer),
                notify: ReentrantMutex::new(()),
                timers: Mutex::new(Timers::new()),
                guard: Mutex::new(None),
                session,
                registration: Mutex::new(None),
            }),
        }
    }

    /// Require the provided guard be satisfied before initiation
    pub fn with_guard(self, guard: PreConfirmGuard) -> Self {
        *self.shared.guard.lock() = Some(guard);
        self
    }

    /// Update the pre-confirmation guard, if one is set
    pub fn update_guard<R>(&self, f: impl FnOnce(&mut PreConfirmGuard) -> R) -> Option<R> {
        self.shared.guard.lock().as_mut().map(f)
    }

    /// Route externally delivered codes for this operation via the
    /// provided [Reconciler], until the flow ends
    pub fn attach(&self, reconciler: &Reconciler) -> Result<(), Error> {
        self.check()?;

        let (reg, mut rx) = reconciler.register(
            self.shared.operation.id.clone(),
            self.shared.session.subscribe(),
        );
        *self.shared.registration.lock() = Some(reg);

        let w = Arc::downgrade(&self.shared);

        tokio::spawn(async move {
            while let Some(p) = rx.recv().await {
                let s = match w.upgrade() {
                    Some(s) => s,
                    None => break,
                };

                let evt = Event::ExternalCode {
                    operation_id: p.operation_id().clone(),
                    session_id: p.session_id().clone(),
                    code: p.code().clone(),
                };

                if let Err(e) = s.process(evt).await {
                    warn!("external code failed: {}", e);
                }
            }
        });

        Ok(())
    }

    /// Start the confirmation flow
    pub async fn initiate(&self) -> Result<(), Error> {
        self.check()?;

        let satisfied = self
            .shared
            .guard
            .lock()
            .as_ref()
            .map(|g| g.is_satisfied())
            .unwrap_or(true);
        if !satisfied {
            return Err(Error::GuardUnsatisfied);
        }

        self.shared.process(Event::Initiate).await
    }

    /// Update the locally entered (unsubmitted) code
    pub fn input(&self, code: &str) -> Result<(), Error> {
        self.check()?;

        self.shared.update(&Event::Input(code.to_string()))?;

        Ok(())
    }

    /// Submit a code for verification
    pub async fn verify(&self, code: &str) -> Result<(), Error> {
        self.check()?;

        let code = Code::new(code)?;
        self.shared.process(Event::Verify(code)).await
    }

    /// Request a new code once the cooldown has expired
    pub async fn resend(&self) -> Result<(), Error> {
        self.check()?;

        self.shared.process(Event::Resend).await
    }

    /// Reject the operation.
    ///
    /// The flow moves to rejected whether or not the service is reachable.
    pub async fn reject(&self) -> Result<(), Error> {
        self.check()?;

        self.shared.process(Event::Reject).await
    }

    /// Query push session status, normally driven by the poll timer
    pub async fn poll_status(&self) -> Result<(), Error> {
        self.check()?;

        self.shared.process(Event::PollTick).await
    }

    /// Handle an externally delivered code, ignored unless both ids match
    /// the open session
    pub async fn handle_external_code(
        &self,
        operation_id: &OperationId,
        session_id: &SessionId,
        code: Code,
    ) -> Result<(), Error> {
        self.check()?;

        self.shared
            .process(Event::ExternalCode {
                operation_id: operation_id.clone(),
                session_id: session_id.clone(),
                code,
            })
            .await
    }

    /// Abandon the flow, stopping timers and discarding in-flight responses
    pub fn dispose(&self) {
        self.shared.dispose()
    }

    pub fn operation(&self) -> &Operation {
        &self.shared.operation
    }

    pub fn state(&self) -> State {
        self.shared.engine.lock().state()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.session.borrow().clone()
    }

    pub fn channel(&self) -> Option<Channel> {
        self.shared.engine.lock().channel()
    }

    pub fn contact_display_name(&self) -> Option<String> {
        self.shared
            .engine
            .lock()
            .contact_display_name()
            .map(str::to_string)
    }

    pub fn remaining_cooldown_seconds(&self) -> u32 {
        self.shared.engine.lock().remaining_cooldown_seconds()
    }

    pub fn last_attempt_failed(&self) -> bool {
        self.shared.engine.lock().last_attempt_failed()
    }

    pub fn retry_count(&self) -> u8 {
        self.shared.engine.lock().retry_count()
    }

    pub fn resend_available(&self) -> bool {
        self.shared.engine.lock().resend_available()
    }

    /// Whether a service call is in flight
    pub fn is_loading(&self) -> bool {
        self.shared.engine.lock().is_loading()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.engine.lock().is_disposed()
    }

    fn check(&self) -> Result<(), Error> {
        match self.is_disposed() {
            true => Err(Error::Disposed),
            false => Ok(()),
        }
    }
}

impl<S: ConfirmationService + 'static> Drop for LifecycleController<S> {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}

impl<S: ConfirmationService + 'static> Shared<S> {
    /// Apply an event, then execute outputs until no further events result
    async fn process(self: &Arc<Self>, evt: Event) -> Result<(), Error> {
        let mut events = VecDeque::from([evt]);
        let mut last_err = None;
        let mut failure = None;

        while let Some(evt) = events.pop_front() {
            let outputs = self.update(&evt)?;

            for o in outputs {
                match o {
                    Output::Request(r) => {
                        if let Some((evt, err)) = self.execute(r).await {
                            last_err = err;
                            events.push_back(evt);
                        }
                    }
                    Output::Arm(plan) => self.arm(plan),
                    Output::Disarm(t) => self.timers.lock().disarm(t),
                    Output::Notice(n) => self.notify(|o| o.on_notice(&n)),
                    Output::Terminal(o) => self.report(o),
                    Output::Failed(f) => {
                        failure = Some(last_err.take().unwrap_or_else(|| {
                            ServiceError::Transport(anyhow::anyhow!("{} failure", f))
                        }))
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(Error::Service(e)),
            None => Ok(()),
        }
    }

    /// Update the engine, publishing the open session
    fn update(&self, evt: &Event) -> Result<Vec<Output>, EngineError> {
        let mut e = self.engine.lock();

        let r = e.update(evt)?;
        self.session
            .send_replace(e.session().map(|s| s.info.session_id.clone()));

        Ok(r)
    }

    /// Execute a service request, returning the response event
    async fn execute(&self, r: Request) -> Option<(Event, Option<ServiceError>)> {
        let s = &self.service;

        let r = match r {
            Request::Initiate { operation_id } => {
                debug!("initiating session for: {}", operation_id);

                let (result, err) = split(self.call(s.session_initiate(&operation_id)).await);
                (Event::InitiateResult(result), err)
            }
            Request::Status {
                operation_id,
                session_id,
            } => {
                debug!("polling session: {}", session_id);

                let (result, err) =
                    split(self.call(s.session_status(&operation_id, &session_id)).await);
                if let Some(e) = &err {
                    warn!("status poll error: {}", e);
                }

                (Event::StatusResult { session_id, result }, err)
            }
            Request::Confirm {
                operation_id,
                session_id,
                code,
            } => {
                debug!("confirming session: {}", session_id);

                let (result, err) = split(
                    self.call(s.session_confirm(&operation_id, &session_id, &code))
                        .await,
                );
                (Event::ConfirmResult { session_id, result }, err)
            }
            Request::Reject {
                operation_id,
                session_id,
                code,
            } => {
                debug!("notifying rejection of session: {}", session_id);

                // Best effort, the flow is already rejected
                if let Err(e) = self
                    .call(s.session_reject(&operation_id, &session_id, code.as_ref()))
                    .await
                {
                    warn!("reject notification failed: {}", e);
                }

                return None;
            }
        };

        Some(r)
    }

    /// Issue a service call once no other call is in flight
    async fn call<T>(
        &self,
        req: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ServiceError> {
        let _g = self.gate.lock().await;

        timeout(self.request_timeout, req).await?
    }

    /// Arm timers for the open session
    fn arm(self: &Arc<Self>, plan: TimerPlan) {
        let mut t = self.timers.lock();

        // Dispose marks the engine before taking the timer lock to disarm
        if self.is_disposed() {
            debug!("flow disposed, not arming timers");
            return;
        }

        if let Some(period) = plan.poll {
            t.arm_poll(period, ticker(Arc::downgrade(self), Event::PollTick));
        }

        if plan.cooldown.is_some() {
            t.arm_cooldown(ticker(Arc::downgrade(self), Event::CooldownTick));
        }
    }

    /// Report a terminal outcome and stop routing external codes
    fn report(&self, o: Outcome) {
        self.registration.lock().take();

        self.notify(|obs| match &o {
            Outcome::Confirmed {
                operation_id,
                session_id,
                channel,
            } => obs.on_confirmed(operation_id, session_id, *channel),
            Outcome::Rejected {
                operation_id,
                session_id,
                channel,
            } => obs.on_rejected(operation_id, session_id.as_ref(), *channel),
            Outcome::Expired { operation_id } => obs.on_expired(operation_id),
        });
    }

    /// Dispatch an observer callback unless the flow has been disposed
    fn notify(&self, f: impl FnOnce(&dyn Observer)) {
        let _g = self.notify.lock();

        if self.is_disposed() {
            return;
        }

        f(self.observer.as_ref())
    }

    fn dispose(&self) {
        let r = self.engine.lock().update(&Event::Dispose);

        for o in r.unwrap_or_default() {
            if let Output::Disarm(t) = o {
                self.timers.lock().disarm(t);
            }
        }

        self.registration.lock().take();
        self.session.send_replace(None);

        // Wait out any callback already in progress
        drop(self.notify.lock());
    }

    fn is_disposed(&self) -> bool {
        self.engine.lock().is_disposed()
    }
}

/// Timer tick handler, processing each tick on a new task so a tick that
/// ends the flow does not abort itself
fn ticker<S: ConfirmationService + 'static>(
    w: Weak<Shared<S>>,
    evt: Event,
) -> impl FnMut() -> bool + Send + 'static {
    move || match w.upgrade() {
        Some(s) => {
            let evt = evt.clone();

            tokio::spawn(async move {
                if let Err(e) = s.process(evt).await {
                    warn!("timer event failed: {}", e);
                }
            });

            true
        }
        None => false,
    }
}

/// Split a service result into an engine result and the original error
fn split<T>(r: Result<T, ServiceError>) -> (Result<T, Fault>, Option<ServiceError>) {
    match r {
        Ok(v) => (Ok(v), None),
        Err(e) => (Err(e.fault()), Some(e)),
    }
}
