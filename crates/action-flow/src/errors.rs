//! Flow execution error types

use action_primitives::{ActionError, ActionErrorKind};
use thiserror::Error;

/// Flow verification errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Scenario is malformed and was not started
    #[error("scenario validation failed: {0}")]
    ValidationFailed(String),

    /// A step failed; later steps were not executed
    #[error("step {index} ({step}) failed: {source}")]
    StepFailed {
        index: usize,
        step: String,
        source: ActionError,
    },

    /// Every step ran but the terminal expectation did not hold
    #[error("expectation {expectation} failed: {source}")]
    ExpectationFailed {
        expectation: String,
        source: ActionError,
    },
}

impl FlowError {
    pub fn kind(&self) -> Option<ActionErrorKind> {
        match self {
            FlowError::ValidationFailed(_) => None,
            FlowError::StepFailed { source, .. } | FlowError::ExpectationFailed { source, .. } => {
                Some(source.kind())
            }
        }
    }

    /// Index of the failing step, if a step failed
    pub fn step_index(&self) -> Option<usize> {
        match self {
            FlowError::StepFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}
