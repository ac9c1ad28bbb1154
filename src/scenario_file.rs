//! Scenario files
//!
//! A scenario file describes one suite in YAML or JSON, chosen by the file
//! extension. Attach steps name a fixture instead of inlining bytes; the
//! fixture is read when the file is loaded.

use std::path::{Path, PathBuf};

use action_flow::{Scenario, Step, Suite};
use action_primitives::Selector;
use serde::Deserialize;

use crate::errors::{FlowcheckError, Result};
use crate::fixtures::FixtureStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Some(FileFormat::Yaml),
            Some("json") => Some(FileFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteDoc {
    #[serde(default)]
    suite: Option<String>,
    scenarios: Vec<ScenarioDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioDoc {
    name: String,
    steps: Vec<StepDoc>,
    expect: ExpectDoc,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
enum StepDoc {
    Navigate {
        path: String,
    },
    FillField {
        selector: String,
        value: String,
        #[serde(default)]
        sensitive: bool,
    },
    SelectOption {
        selector: String,
        value: String,
    },
    AttachFile {
        selector: String,
        fixture: PathBuf,
        #[serde(default)]
        file_name: Option<String>,
        #[serde(default)]
        mime_type: Option<String>,
    },
    Click {
        selector: String,
        text: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpectDoc {
    hash: String,
}

impl StepDoc {
    fn into_step(self, fixtures: &FixtureStore) -> Result<Step> {
        Ok(match self {
            StepDoc::Navigate { path } => Step::Navigate { path },
            StepDoc::FillField {
                selector,
                value,
                sensitive,
            } => Step::FillField {
                selector: Selector::new(selector),
                value,
                sensitive,
            },
            StepDoc::SelectOption { selector, value } => Step::SelectOption {
                selector: Selector::new(selector),
                value,
            },
            StepDoc::AttachFile {
                selector,
                fixture,
                file_name,
                mime_type,
            } => Step::AttachFile {
                selector: Selector::new(selector),
                file: fixtures.load(&fixture, file_name.as_deref(), mime_type.as_deref())?,
            },
            StepDoc::Click { selector, text } => Step::Click {
                selector: Selector::new(selector),
                text,
            },
        })
    }
}

/// Reads and validates the suite stored at `path`.
pub fn load_suite(path: &Path, fixtures: &FixtureStore) -> Result<Suite> {
    let format = FileFormat::from_path(path).ok_or_else(|| {
        FlowcheckError::scenario_file(path, "expected a .yaml, .yml or .json extension")
    })?;
    let content = std::fs::read_to_string(path).map_err(|err| FlowcheckError::io(path, err))?;
    let default_suite = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scenarios".to_string());
    parse_suite(&content, format, &default_suite, fixtures)
        .map_err(|err| match err {
            FlowcheckError::ScenarioFile { reason, .. } => {
                FlowcheckError::scenario_file(path, reason)
            }
            FlowcheckError::Flow(flow) => FlowcheckError::scenario_file(path, flow),
            other => other,
        })
}

/// Parses a suite document; `default_suite` names it when the document does not.
pub fn parse_suite(
    content: &str,
    format: FileFormat,
    default_suite: &str,
    fixtures: &FixtureStore,
) -> Result<Suite> {
    let doc: SuiteDoc = match format {
        FileFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|err| FlowcheckError::scenario_file("<input>", err))?,
        FileFormat::Json => serde_json::from_str(content)
            .map_err(|err| FlowcheckError::scenario_file("<input>", err))?,
    };
    if doc.scenarios.is_empty() {
        return Err(FlowcheckError::scenario_file("<input>", "no scenarios"));
    }

    let suite_name = doc.suite.unwrap_or_else(|| default_suite.to_string());
    let mut suite = Suite::new(suite_name.clone());
    for entry in doc.scenarios {
        let mut builder = Scenario::builder(entry.name).suite(suite_name.clone());
        for step in entry.steps {
            builder = builder.step(step.into_step(fixtures)?);
        }
        let scenario = builder.expect_hash(entry.expect.hash).build()?;
        suite = suite.with_scenario(scenario);
    }
    Ok(suite)
}
