// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Validated identifier and code types
//!

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{ProtoError, MAX_CODE_LEN, MAX_ID_LEN};

/// Helper macro for opaque string identifiers
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, rejecting empty or oversized values
            pub fn new(s: impl Into<String>) -> Result<Self, ProtoError> {
                let s = s.into();

                if s.trim().is_empty() {
                    return Err(ProtoError::missing($field));
                }
                if s.len() > MAX_ID_LEN {
                    return Err(ProtoError::Validation {
                        field: $field,
                        reason: "too long",
                    });
                }

                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ProtoError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ProtoError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Opaque identifier for a sensitive operation
    OperationId,
    "operation_id"
);

opaque_id!(
    /// Opaque identifier for a confirmation session
    SessionId,
    "session_id"
);

/// One-time confirmation code, entered locally or delivered via push.
///
/// Zeroized on drop, and redacted in [Debug] output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    pub fn new(s: impl Into<String>) -> Result<Self, ProtoError> {
        let mut s = s.into();

        let r = if s.is_empty() {
            Err(ProtoError::missing("code"))
        } else if s.len() > MAX_CODE_LEN {
            Err(ProtoError::Validation {
                field: "code",
                reason: "too long",
            })
        } else if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            Err(ProtoError::Validation {
                field: "code",
                reason: "invalid characters",
            })
        } else {
            return Ok(Self(s));
        };

        s.zeroize();
        r
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for Code {
    type Error = ProtoError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Code> for String {
    fn from(v: Code) -> String {
        v.0.clone()
    }
}

impl core::fmt::Debug for Code {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Code(<{} chars>)", self.0.len())
    }
}
