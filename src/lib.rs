//! flowcheck - declarative UI-flow verification
//!
//! Library side of the `flowcheck` binary: configuration, scenario files,
//! built-in scenarios, fixtures and report rendering. Scenario execution
//! lives in the `action-flow` crate and the Chromium backend in
//! `cdp-adapter`.

pub mod config;
pub mod errors;
pub mod fixtures;
pub mod logging;
pub mod report;
pub mod scenario_file;
pub mod scenarios;

pub use config::FlowcheckConfig;
pub use errors::{FlowcheckError, Result};
pub use fixtures::{infer_mime, FixtureStore};
pub use report::{render_report, render_scenario, OutputFormat};
pub use scenario_file::{load_suite, parse_suite, FileFormat};

pub use action_flow::{FlowVerifier, RunRecord, Scenario, Suite, SuiteReport, VerifierOptions};
pub use action_primitives::{AutomationPort, MemoryPage};
