// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Drive the engine with random event sequences against a simulated
//! service, checking flow invariants hold for every sequence

use log::{debug, LevelFilter};
use rand::{rngs::StdRng, Rng, SeedableRng};

use stepup_core::{
    engine::{Engine, Event, Fault, Output, Request},
    proto::{Channel, Code, ConfirmResp, ConfirmState, OperationId, SessionId, SessionInfo, SessionStatus},
    Config, ExhaustedPolicy,
};

const SEQUENCES: u64 = 500;
const EVENTS: usize = 200;

fn op_id() -> OperationId {
    OperationId::new("op-1").unwrap()
}

fn session(id: &str, channel: Channel) -> SessionInfo {
    SessionInfo {
        session_id: SessionId::new(id).unwrap(),
        channel,
        contact_display_name: "j***@example.com".into(),
        resend_cooldown_seconds: 2,
    }
}

/// Pick a response for an outstanding request
fn respond(rng: &mut StdRng, req: &Request) -> Option<Event> {
    let evt = match req {
        Request::Initiate { .. } => Event::InitiateResult(match rng.gen_range(0..5) {
            0 => Err(Fault::Transient),
            1 => Err(Fault::OperationNotFound),
            2 => Err(Fault::Protocol),
            3 => Ok(session("s1", Channel::OneTimeCodeEmail)),
            _ => Ok(session("s2", Channel::Push)),
        }),
        Request::Status { session_id, .. } => Event::StatusResult {
            session_id: session_id.clone(),
            result: match rng.gen_range(0..6) {
                0 => Ok(SessionStatus::Confirmed),
                1 => Ok(SessionStatus::Rejected),
                2 => Err(Fault::Transient),
                3 => Err(Fault::SessionNotFound),
                _ => Ok(SessionStatus::Pending),
            },
        },
        Request::Confirm { session_id, .. } => Event::ConfirmResult {
            session_id: session_id.clone(),
            result: match rng.gen_range(0..6) {
                0 => Ok(ConfirmResp {
                    state: ConfirmState::Confirmed,
                    session: session(session_id.as_str(), Channel::OneTimeCodeEmail),
                }),
                1 => Ok(ConfirmResp {
                    state: ConfirmState::Pending,
                    session: session("s3", Channel::OneTimeCodeEmail),
                }),
                2 => Err(Fault::Transient),
                3 => Err(Fault::SessionNotFound),
                _ => Ok(ConfirmResp {
                    state: ConfirmState::Pending,
                    session: session(session_id.as_str(), Channel::OneTimeCodeEmail),
                }),
            },
        },
        // Rejections are fire-and-forget
        Request::Reject { .. } => return None,
    };

    Some(evt)
}

/// Pick a caller, timer or external event
fn caller_event(rng: &mut StdRng) -> Event {
    match rng.gen_range(0..40) {
        0..=3 => Event::Initiate,
        4..=6 => Event::Input("12".into()),
        7..=14 => Event::Verify(Code::new("123456").unwrap()),
        15..=20 => Event::PollTick,
        21..=28 => Event::CooldownTick,
        29..=31 => Event::Resend,
        32..=33 => Event::Reject,
        34..=38 => Event::ExternalCode {
            operation_id: op_id(),
            session_id: SessionId::new(["s1", "s2", "s3"][rng.gen_range(0..3)]).unwrap(),
            code: Code::new("654321").unwrap(),
        },
        _ => Event::Dispose,
    }
}

fn run(seed: u64, config: Config) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut e = Engine::new(op_id(), config);

    let mut outstanding: Vec<Request> = vec![];
    let mut terminals = 0;
    let mut disposed = false;

    for _ in 0..EVENTS {
        let evt = match outstanding.is_empty() || rng.gen_bool(0.5) {
            true => caller_event(&mut rng),
            false => {
                let req = outstanding.remove(0);
                match respond(&mut rng, &req) {
                    Some(evt) => evt,
                    None => continue,
                }
            }
        };

        let out = match e.update(&evt) {
            Ok(o) => o,
            Err(err) => {
                debug!("seed {}: {:?} -> {}", seed, evt, err);
                continue;
            }
        };

        if disposed {
            assert!(out.is_empty(), "seed {seed}: outputs after dispose: {out:?}");
        }
        if matches!(evt, Event::Dispose) {
            disposed = true;
        }

        let terminal_before = terminals > 0;

        for o in out {
            match o {
                Output::Request(Request::Reject { .. }) => (),
                Output::Request(r) => {
                    assert!(!terminal_before, "seed {seed}: request after outcome");

                    outstanding.push(r);
                    assert!(
                        outstanding.len() <= 1,
                        "seed {seed}: concurrent requests: {outstanding:?}"
                    );
                }
                Output::Terminal(_) => terminals += 1,
                _ => (),
            }
        }

        assert!(terminals <= 1, "seed {seed}: multiple outcomes");

        // Stale responses must not matter once terminal
        if terminals > 0 {
            assert!(e.state().is_terminal() || disposed);
        }
    }
}

#[test]
fn random_sequences_auto_reject() {
    let _ = simplelog::SimpleLogger::init(LevelFilter::Info, Default::default());

    for seed in 0..SEQUENCES {
        run(seed, Config::default());
    }
}

#[test]
fn random_sequences_require_resend() {
    let _ = simplelog::SimpleLogger::init(LevelFilter::Info, Default::default());

    let config = Config {
        max_attempts: 2,
        on_attempts_exhausted: ExhaustedPolicy::RequireResend,
        ..Default::default()
    };

    for seed in 0..SEQUENCES {
        run(seed, config.clone());
    }
}
