//! Core types for flow verification

use std::fmt;

use action_primitives::{FileDescriptor, Selector};
use flowcheck_privacy::{redact_value, url::redact_url, PrivacyPolicyView};
use serde::{Deserialize, Serialize};

use crate::errors::FlowError;

/// One UI action of a scenario
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load the application at a route path such as `/#/log-in`
    Navigate { path: String },

    /// Type into a single form field; `sensitive` keeps the value out of every log and record
    FillField {
        selector: Selector,
        value: String,
        #[serde(default)]
        sensitive: bool,
    },

    /// Choose an option of a select element
    SelectOption { selector: Selector, value: String },

    /// Hand a file to a file input
    AttachFile {
        selector: Selector,
        file: FileDescriptor,
    },

    /// Click the element matching `selector` whose text contains `text`
    Click { selector: Selector, text: String },
}

/// Discriminant of [`Step`], used in records and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Navigate,
    FillField,
    SelectOption,
    AttachFile,
    Click,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Navigate => "navigate",
            StepKind::FillField => "fill_field",
            StepKind::SelectOption => "select_option",
            StepKind::AttachFile => "attach_file",
            StepKind::Click => "click",
        }
    }
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Navigate { .. } => StepKind::Navigate,
            Step::FillField { .. } => StepKind::FillField,
            Step::SelectOption { .. } => StepKind::SelectOption,
            Step::AttachFile { .. } => StepKind::AttachFile,
            Step::Click { .. } => StepKind::Click,
        }
    }

    /// The value that must never be logged, if this step carries one
    pub fn secret(&self) -> Option<&str> {
        match self {
            Step::FillField {
                value,
                sensitive: true,
                ..
            } => Some(value.as_str()),
            _ => None,
        }
    }

    /// Human-readable description with values redacted per `policy`
    pub fn describe(&self, policy: &PrivacyPolicyView) -> String {
        match self {
            Step::Navigate { path } => {
                format!("navigate {}", redact_url(path, &policy.query_allow_keys))
            }
            Step::FillField {
                selector,
                value,
                sensitive,
            } => format!(
                "fill {} with \"{}\"",
                selector,
                redact_value(value, *sensitive, policy)
            ),
            Step::SelectOption { selector, value } => format!(
                "select \"{}\" in {}",
                redact_value(value, false, policy),
                selector
            ),
            Step::AttachFile { selector, file } => format!(
                "attach {} ({}, {} bytes) to {}",
                file.file_name,
                file.mime_type,
                file.len(),
                selector
            ),
            Step::Click { selector, text } => format!("click {} containing \"{}\"", selector, text),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let selector = match self {
            Step::Navigate { path } => {
                if !path.starts_with('/') {
                    return Err(format!("navigate path `{}` must start with `/`", path));
                }
                return Ok(());
            }
            Step::FillField { selector, .. } | Step::SelectOption { selector, .. } => selector,
            Step::AttachFile { selector, file } => {
                if file.file_name.trim().is_empty() {
                    return Err("attached file needs a file name".to_string());
                }
                if file.mime_type.trim().is_empty() {
                    return Err(format!("attached file `{}` needs a MIME type", file.file_name));
                }
                selector
            }
            Step::Click { selector, text } => {
                if text.trim().is_empty() {
                    return Err(format!("click on `{}` needs a text to match", selector));
                }
                selector
            }
        };
        if selector.as_str().trim().is_empty() {
            return Err(format!("{} step has an empty selector", self.kind().as_str()));
        }
        Ok(())
    }
}

// Debug goes through `describe` so `{:?}` on a step can never print a secret.
impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({})", self.describe(&PrivacyPolicyView::default()))
    }
}

/// Terminal predicate evaluated after the last step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// URL fragment (with leading `#`) equals the literal
    HashEquals(String),
}

impl Expectation {
    pub fn describe(&self) -> String {
        match self {
            Expectation::HashEquals(hash) => format!("hash == \"{}\"", hash),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Expectation::HashEquals(hash) if !hash.starts_with('#') => {
                Err(format!("expected hash `{}` must start with `#`", hash))
            }
            Expectation::HashEquals(_) => Ok(()),
        }
    }
}

/// Ordered steps plus one expectation; immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioDef")]
pub struct Scenario {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suite: Option<String>,
    steps: Vec<Step>,
    expect: Expectation,
}

#[derive(Deserialize)]
struct ScenarioDef {
    name: String,
    #[serde(default)]
    suite: Option<String>,
    steps: Vec<Step>,
    expect: Expectation,
}

impl TryFrom<ScenarioDef> for Scenario {
    type Error = FlowError;

    fn try_from(def: ScenarioDef) -> Result<Self, Self::Error> {
        let scenario = Scenario {
            name: def.name,
            suite: def.suite,
            steps: def.steps,
            expect: def.expect,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            name: name.into(),
            suite: None,
            steps: Vec::new(),
            expect: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suite(&self) -> Option<&str> {
        self.suite.as_deref()
    }

    /// `suite/name` when the scenario belongs to a suite
    pub fn qualified_name(&self) -> String {
        match &self.suite {
            Some(suite) => format!("{}/{}", suite, self.name),
            None => self.name.clone(),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn expectation(&self) -> &Expectation {
        &self.expect
    }

    /// Every sensitive value carried by the scenario
    pub fn secrets(&self) -> Vec<&str> {
        self.steps.iter().filter_map(Step::secret).collect()
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.name.trim().is_empty() {
            return Err(FlowError::ValidationFailed(
                "scenario name is empty".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(FlowError::ValidationFailed(format!(
                "scenario `{}` has no steps",
                self.name
            )));
        }
        for (index, step) in self.steps.iter().enumerate() {
            step.validate().map_err(|reason| {
                FlowError::ValidationFailed(format!(
                    "scenario `{}` step {}: {}",
                    self.name, index, reason
                ))
            })?;
        }
        self.expect.validate().map_err(|reason| {
            FlowError::ValidationFailed(format!("scenario `{}`: {}", self.name, reason))
        })
    }
}

pub struct ScenarioBuilder {
    name: String,
    suite: Option<String>,
    steps: Vec<Step>,
    expect: Option<Expectation>,
}

impl ScenarioBuilder {
    pub fn suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn navigate(self, path: impl Into<String>) -> Self {
        self.step(Step::Navigate { path: path.into() })
    }

    pub fn fill(self, selector: &str, value: impl Into<String>) -> Self {
        self.step(Step::FillField {
            selector: selector.into(),
            value: value.into(),
            sensitive: false,
        })
    }

    pub fn fill_sensitive(self, selector: &str, value: impl Into<String>) -> Self {
        self.step(Step::FillField {
            selector: selector.into(),
            value: value.into(),
            sensitive: true,
        })
    }

    pub fn select(self, selector: &str, value: impl Into<String>) -> Self {
        self.step(Step::SelectOption {
            selector: selector.into(),
            value: value.into(),
        })
    }

    pub fn attach(self, selector: &str, file: FileDescriptor) -> Self {
        self.step(Step::AttachFile {
            selector: selector.into(),
            file,
        })
    }

    pub fn click(self, selector: &str, text: impl Into<String>) -> Self {
        self.step(Step::Click {
            selector: selector.into(),
            text: text.into(),
        })
    }

    pub fn expect_hash(mut self, hash: impl Into<String>) -> Self {
        self.expect = Some(Expectation::HashEquals(hash.into()));
        self
    }

    pub fn build(self) -> Result<Scenario, FlowError> {
        let expect = self.expect.ok_or_else(|| {
            FlowError::ValidationFailed(format!("scenario `{}` has no expectation", self.name))
        })?;
        let scenario = Scenario {
            name: self.name,
            suite: self.suite,
            steps: self.steps,
            expect,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

/// Named group of scenarios run one after another on the same backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    pub name: String,
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }
}
