// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Poll and cooldown timers
//!
//! Each timer is a tokio task ticking at a fixed period. Tasks are aborted
//! when disarmed, when re-armed and when [Timers] is dropped, so a flow
//! cannot leak running timers whichever way it ends.

use std::time::Duration;

use log::trace;
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use stepup_core::engine::Timer;

/// Cooldown tick period
pub const COOLDOWN_TICK: Duration = Duration::from_secs(1);

/// Running poll and cooldown timers for a flow
#[derive(Debug, Default)]
pub struct Timers {
    poll: Option<JoinHandle<()>>,
    cooldown: Option<JoinHandle<()>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the poll timer, replacing any running poll timer.
    ///
    /// `tick` is called once per period, the timer stops when this returns false.
    pub fn arm_poll(&mut self, period: Duration, tick: impl FnMut() -> bool + Send + 'static) {
        trace!("arming poll timer ({:?})", period);

        if let Some(h) = self.poll.replace(spawn_ticker(period, tick)) {
            h.abort();
        }
    }

    /// Arm the cooldown timer, replacing any running cooldown timer
    pub fn arm_cooldown(&mut self, tick: impl FnMut() -> bool + Send + 'static) {
        trace!("arming cooldown timer");

        if let Some(h) = self.cooldown.replace(spawn_ticker(COOLDOWN_TICK, tick)) {
            h.abort();
        }
    }

    /// Stop the selected timer(s)
    pub fn disarm(&mut self, t: Timer) {
        trace!("disarming timer: {}", t);

        let handles = match t {
            Timer::Poll => [self.poll.take(), None],
            Timer::Cooldown => [self.cooldown.take(), None],
            Timer::All => [self.poll.take(), self.cooldown.take()],
        };

        for h in handles.into_iter().flatten() {
            h.abort();
        }
    }

    /// Check whether the selected timer is running, [Timer::All] checks for any
    pub fn is_armed(&self, t: Timer) -> bool {
        let running = |h: &Option<JoinHandle<()>>| h.as_ref().map(|h| !h.is_finished());

        match t {
            Timer::Poll => running(&self.poll).unwrap_or(false),
            Timer::Cooldown => running(&self.cooldown).unwrap_or(false),
            Timer::All => {
                running(&self.poll).unwrap_or(false) || running(&self.cooldown).unwrap_or(false)
            }
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.disarm(Timer::All);
    }
}

fn spawn_ticker(period: Duration, mut tick: impl FnMut() -> bool + Send + 'static) -> JoinHandle<()> {
    tokio::spawn(async move {
        // First tick one period from now
        let mut i = interval_at(Instant::now() + period, period);
        i.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            i.tick().await;

            if !tick() {
                break;
            }
        }
    })
}
