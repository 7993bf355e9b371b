//! Per-trade validation issues.
//!
//! A malformed record is rejected on its own and reported back to the caller
//! next to whatever aggregate could still be computed from the rest.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Why a single trade record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeIssueKind {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a valid number: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field `{field}` is not a valid date/time: {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("field `{field}` has an unusable value: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("unknown direction `{0}`, expected LONG or SHORT")]
    InvalidDirection(String),
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(String),
    #[error("field `{0}` must not be negative")]
    NegativePrice(&'static str),
    #[error("commissions must not be negative, got {0}")]
    NegativeCommissions(String),
    #[error("exit_time is earlier than entry_time")]
    ExitBeforeEntry,
    #[error("`{0}` is outside the supported numeric range")]
    OutOfRange(&'static str),
}

impl TradeIssueKind {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            TradeIssueKind::MissingField(_) => "missing_field",
            TradeIssueKind::InvalidNumber { .. } => "invalid_number",
            TradeIssueKind::InvalidDate { .. } => "invalid_date",
            TradeIssueKind::InvalidField { .. } => "invalid_field",
            TradeIssueKind::InvalidDirection(_) => "invalid_direction",
            TradeIssueKind::NonPositiveQuantity(_) => "non_positive_quantity",
            TradeIssueKind::NegativePrice(_) => "negative_price",
            TradeIssueKind::NegativeCommissions(_) => "negative_commissions",
            TradeIssueKind::ExitBeforeEntry => "exit_before_entry",
            TradeIssueKind::OutOfRange(_) => "out_of_range",
        }
    }
}

impl Serialize for TradeIssueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A rejected trade: where it was in the input and what was wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("trade #{index}: {kind}")]
pub struct TradeIssue {
    /// Position of the record in the caller's input.
    pub index: usize,
    /// Journal id of the record, when it had a usable one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<i64>,
    pub kind: TradeIssueKind,
    /// Human readable description of `kind`.
    pub message: String,
}

impl TradeIssue {
    pub fn new(index: usize, trade_id: Option<i64>, kind: TradeIssueKind) -> Self {
        let message = kind.to_string();
        Self {
            index,
            trade_id,
            kind,
            message,
        }
    }
}
