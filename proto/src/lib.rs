// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol objects for step-up operation confirmation
//!
//! This crate defines the shapes exchanged with a remote confirmation service
//! and the payloads delivered out-of-band via push, along with strict decoders
//! that fail with [ProtoError] rather than falling back to defaults.
//!
//! Responses use JSON with `snake_case` field names. Identifiers are opaque
//! strings and are validated on construction, so an empty `operation_id` or
//! `session_id` can never reach the network.
//!

pub mod ids;
pub use ids::{Code, OperationId, SessionId};

pub mod operation;
pub use operation::Operation;

pub mod session;
pub use session::{Channel, ConfirmResp, ConfirmState, SessionInfo, SessionStatus};

pub mod push;
pub use push::PushPayload;

mod error;
pub use error::ProtoError;

/// Maximum length of an identifier in bytes
pub const MAX_ID_LEN: usize = 128;

/// Maximum length of a confirmation code
pub const MAX_CODE_LEN: usize = 16;
