//! Flow verification layer
//!
//! A [`Scenario`] is an ordered list of [`Step`]s followed by one terminal
//! [`Expectation`]. The [`FlowVerifier`] runs it against any
//! [`action_primitives::AutomationPort`], aborting at the first failure, and
//! produces a [`RunRecord`] in which sensitive values never appear.

pub mod errors;
pub mod executor;
pub mod record;
pub mod types;

pub use errors::FlowError;
pub use executor::{FlowVerifier, VerifierOptions};
pub use record::{
    AttachmentRecord, ExpectationRecord, FailureRecord, RunRecord, StepRecord, StepStatus,
    SuiteReport,
};
pub use types::{Expectation, Scenario, ScenarioBuilder, Step, StepKind, Suite};
