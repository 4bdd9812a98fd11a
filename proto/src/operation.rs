// Copyright (c) 2022-2023 The MobileCoin Foundation

use serde::{Deserialize, Serialize};

use crate::{OperationId, ProtoError};

/// Sensitive operation pending confirmation.
///
/// Created by the caller before a flow starts and never mutated while
/// the flow is running.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    /// Display label (eg. "Payment")
    pub label: String,
    /// Ordered `(label, value)` context describing what is being confirmed
    #[serde(default)]
    pub context: Vec<(String, String)>,
}

impl Operation {
    /// Create a new operation with no context entries
    pub fn new(id: OperationId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            context: Vec::new(),
        }
    }

    /// Append a context entry
    pub fn with_context(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((label.into(), value.into()));
        self
    }

    /// Parse a `label=value` context entry
    pub fn parse_context(s: &str) -> Result<(String, String), ProtoError> {
        match s.split_once('=') {
            Some((l, v)) if !l.trim().is_empty() => Ok((l.trim().to_string(), v.trim().to_string())),
            _ => Err(ProtoError::Validation {
                field: "context",
                reason: "expected label=value",
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn context_is_ordered() {
        let op = Operation::new(OperationId::new("op-1").unwrap(), "Payment")
            .with_context("Remitter", "ACC 0001")
            .with_context("Amount", "12.00 EUR");

        let labels: Vec<_> = op.context.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, &["Remitter", "Amount"]);
    }

    #[test]
    fn parse_context_entries() {
        assert_eq!(
            Operation::parse_context("Amount = 12.00"),
            Ok(("Amount".to_string(), "12.00".to_string()))
        );
        assert!(Operation::parse_context("no separator").is_err());
        assert!(Operation::parse_context("=value").is_err());
    }
}
