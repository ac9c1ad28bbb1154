//! Error types for action primitives

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification of a failed primitive, carried into run records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    ElementNotFound,
    AmbiguousMatch,
    NavigationFailure,
    AssertionFailure,
    OptionNotFound,
    NotFileInput,
    Interrupted,
    Driver,
}

impl ActionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionErrorKind::ElementNotFound => "element_not_found",
            ActionErrorKind::AmbiguousMatch => "ambiguous_match",
            ActionErrorKind::NavigationFailure => "navigation_failure",
            ActionErrorKind::AssertionFailure => "assertion_failure",
            ActionErrorKind::OptionNotFound => "option_not_found",
            ActionErrorKind::NotFileInput => "not_file_input",
            ActionErrorKind::Interrupted => "interrupted",
            ActionErrorKind::Driver => "driver",
        }
    }
}

/// Failures reported by an [`crate::AutomationPort`] or by the terminal expectation.
///
/// Messages never contain field values; a backend that needs to mention the
/// value of a sensitive field has already lost.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Selector matched zero elements
    #[error("no element matches `{selector}`")]
    ElementNotFound { selector: String },

    /// Selector matched more elements than the operation allows
    #[error("`{selector}` matched {count} elements, expected exactly one")]
    AmbiguousMatch { selector: String, count: usize },

    /// Target route did not load
    #[error("navigation to `{target}` failed: {reason}")]
    NavigationFailure { target: String, reason: String },

    /// Terminal expectation did not hold
    #[error("expected {subject} `{expected}`, found `{actual}`")]
    AssertionFailure {
        subject: String,
        expected: String,
        actual: String,
    },

    /// Requested option is not offered by the select element
    #[error("`{selector}` has no option `{value}` (available: {available:?})")]
    OptionNotFound {
        selector: String,
        value: String,
        available: Vec<String>,
    },

    /// Element does not accept file input
    #[error("`{selector}` is not a file input")]
    NotFileInput { selector: String },

    /// Run was cancelled before the step started
    #[error("operation interrupted: {0}")]
    Interrupted(String),

    /// Backend/protocol failure unrelated to the page contents
    #[error("automation driver error: {0}")]
    Driver(String),
}

impl ActionError {
    pub fn kind(&self) -> ActionErrorKind {
        match self {
            ActionError::ElementNotFound { .. } => ActionErrorKind::ElementNotFound,
            ActionError::AmbiguousMatch { .. } => ActionErrorKind::AmbiguousMatch,
            ActionError::NavigationFailure { .. } => ActionErrorKind::NavigationFailure,
            ActionError::AssertionFailure { .. } => ActionErrorKind::AssertionFailure,
            ActionError::OptionNotFound { .. } => ActionErrorKind::OptionNotFound,
            ActionError::NotFileInput { .. } => ActionErrorKind::NotFileInput,
            ActionError::Interrupted(_) => ActionErrorKind::Interrupted,
            ActionError::Driver(_) => ActionErrorKind::Driver,
        }
    }

    pub fn not_found(selector: impl Into<String>) -> Self {
        ActionError::ElementNotFound {
            selector: selector.into(),
        }
    }

    pub fn navigation(target: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::NavigationFailure {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Builds the error for a selector that did not resolve to exactly one element.
    pub fn from_match_count(selector: impl Into<String>, count: usize) -> Self {
        let selector = selector.into();
        if count == 0 {
            ActionError::ElementNotFound { selector }
        } else {
            ActionError::AmbiguousMatch { selector, count }
        }
    }
}
