//! Error handling module

use std::path::PathBuf;

use action_flow::FlowError;
use cdp_adapter::AdapterError;
use thiserror::Error;

/// Errors raised while preparing or reporting a run
#[derive(Debug, Error)]
pub enum FlowcheckError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid scenario file {}: {reason}", path.display())]
    ScenarioFile { path: PathBuf, reason: String },

    #[error("fixture path `{0}` must be relative and stay inside the fixtures directory")]
    FixtureOutsideRoot(String),

    #[error("unknown built-in scenario `{0}`")]
    UnknownScenario(String),

    #[error("unsupported output: {0}")]
    Render(String),

    #[error("invalid log filter: {0}")]
    LogFilter(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl FlowcheckError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlowcheckError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn scenario_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FlowcheckError::ScenarioFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowcheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_file() {
        let err = FlowcheckError::scenario_file("suites/auth.yaml", "no scenarios");
        assert_eq!(
            err.to_string(),
            "invalid scenario file suites/auth.yaml: no scenarios"
        );
    }

    #[test]
    fn flow_errors_are_transparent() {
        let err: FlowcheckError = FlowError::ValidationFailed("empty".into()).into();
        assert_eq!(
            err.to_string(),
            FlowError::ValidationFailed("empty".into()).to_string()
        );
    }
}
