//! Shared types and the error taxonomy for the Cadence pipeline engine.
//!
//! This crate provides the foundational types used across all other Cadence
//! crates:
//! - `PipeError` — unified error taxonomy
//! - `Context` — per-branch substitution context
//! - `HandlerResult` — one result record produced by a handler

use std::collections::HashMap;

use serde_json::value::RawValue;

/// Unified error type for all Cadence subsystems.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    // === Configuration / construction ===
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to create '{name}' handler: {message}")]
    Construction { name: String, message: String },

    // === Handler execution ===
    #[error("failed to replace placeholders in {field}: some data not found")]
    UnresolvedPlaceholders { field: String },

    #[error("failed to send HTTP request: {0}")]
    Http(String),

    #[error("unexpected response code: got {got}, expected {expected}")]
    UnexpectedStatus { got: u16, expected: u16 },

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("failed to execute HTTP request after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("failed to evaluate expression: {0}")]
    Expression(String),

    #[error("expression did not return a boolean")]
    NonBooleanExpression,

    // === Pipeline ===
    #[error("failed to run handler {handler}: {message}")]
    Handler { handler: String, message: String },

    #[error("failed to run handler pipe: {0}")]
    Pipeline(String),

    #[error("operation cancelled")]
    Cancelled,

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl PipeError {
    /// Returns `true` if the error was caused by cancellation. Cancellation
    /// errors are never retried and must be surfaced as soon as observed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipeError::Cancelled)
    }

    /// Returns `true` if the error is deterministic with respect to the
    /// invocation context, meaning a retry with the same inputs cannot
    /// succeed.
    pub fn is_deterministic(&self) -> bool {
        matches!(
            self,
            PipeError::UnresolvedPlaceholders { .. }
                | PipeError::Expression(_)
                | PipeError::NonBooleanExpression
        )
    }
}

/// A convenience alias for `Result<T, PipeError>`.
pub type Result<T> = std::result::Result<T, PipeError>;

/// Per-branch substitution context: the accumulated `<handler>.<key>` map a
/// handler invocation sees. Each fan-out child receives an independent copy.
pub type Context = HashMap<String, String>;

/// One result record produced by a handler. Values keep their raw JSON wire
/// representation so objects and arrays round-trip verbatim when substituted
/// downstream.
pub type HandlerResult = HashMap<String, Box<RawValue>>;
