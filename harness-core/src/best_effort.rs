//! Result type for side effects whose failure must not decide anything.
//!
//! Calls to the PRD resolver, activation log appends and tool lookups can
//! fail for reasons unrelated to the request under evaluation. They return a
//! [`BestEffort`] so each call site states explicitly whether a failure
//! degrades its output or is ignored.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    /// The call produced a value
    Done(T),
    /// The call was attempted and failed; the reason is user-presentable
    Failed(String),
    /// The call was not attempted (e.g. the program does not exist)
    Skipped(String),
}

impl<T> BestEffort<T> {
    pub fn failed(reason: impl Into<String>) -> Self {
        BestEffort::Failed(reason.into())
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        BestEffort::Skipped(reason.into())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BestEffort::Done(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            BestEffort::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            BestEffort::Done(value) => BestEffort::Done(f(value)),
            BestEffort::Failed(reason) => BestEffort::Failed(reason),
            BestEffort::Skipped(reason) => BestEffort::Skipped(reason),
        }
    }

    /// Reason text for anything other than `Done`
    pub fn reason(&self) -> Option<&str> {
        match self {
            BestEffort::Done(_) => None,
            BestEffort::Failed(reason) | BestEffort::Skipped(reason) => Some(reason),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for BestEffort<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => BestEffort::Done(value),
            Err(e) => BestEffort::Failed(e.to_string()),
        }
    }
}
