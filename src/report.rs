//! Rendering of run reports and scenarios

use std::fmt::Write as _;

use action_flow::{RunRecord, Scenario, StepStatus, SuiteReport};
use flowcheck_privacy::{scrub_json, scrub_text, PrivacyPolicyView};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{FlowcheckError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Serialises `value` and masks every occurrence of `secrets` in its strings.
pub fn redacted_value<T: Serialize>(value: &T, secrets: &[&str], mask: &str) -> Result<Value> {
    let mut json = serde_json::to_value(value).map_err(|err| FlowcheckError::Render(err.to_string()))?;
    let report = scrub_json(&mut json, secrets, mask);
    if report.applied {
        debug!(fields = ?report.fields, "masked secrets in report");
    }
    Ok(json)
}

pub fn render_report(
    report: &SuiteReport,
    format: OutputFormat,
    secrets: &[&str],
    mask: &str,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(scrub_text(&render_human(report), secrets, mask)),
        OutputFormat::Json => {
            let value = redacted_value(report, secrets, mask)?;
            serde_json::to_string_pretty(&value).map_err(|err| FlowcheckError::Render(err.to_string()))
        }
        OutputFormat::Yaml => {
            let value = redacted_value(report, secrets, mask)?;
            serde_yaml::to_string(&value).map_err(|err| FlowcheckError::Render(err.to_string()))
        }
    }
}

fn render_human(report: &SuiteReport) -> String {
    let mut out = String::new();
    for record in &report.scenarios {
        render_record(&mut out, record);
    }
    let _ = writeln!(
        out,
        "\n{} scenario(s): {} passed, {} failed",
        report.scenarios.len(),
        report.passed,
        report.failed
    );
    out
}

fn render_record(out: &mut String, record: &RunRecord) {
    let name = match &record.suite {
        Some(suite) => format!("{}/{}", suite, record.scenario),
        None => record.scenario.clone(),
    };
    let verdict = if record.passed { "PASS" } else { "FAIL" };
    let _ = writeln!(out, "{} {} ({} ms)", verdict, name, record.latency_ms);
    if record.passed {
        return;
    }

    for step in &record.steps {
        let marker = match step.status {
            StepStatus::Passed => "ok",
            StepStatus::Failed => "FAILED",
            StepStatus::Skipped => "skipped",
        };
        let _ = writeln!(out, "  {:>2}. [{}] {}", step.index + 1, marker, step.description);
        if let Some(error) = &step.error {
            let _ = writeln!(out, "      {}", error);
        }
    }
    if let Some(expectation) = record.expectation.as_ref().filter(|e| !e.passed) {
        let _ = writeln!(
            out,
            "  expectation {} failed: got {}",
            expectation.description,
            expectation.actual.as_deref().unwrap_or("nothing")
        );
    } else if let Some(failure) = record.failure.as_ref().filter(|f| f.step_index.is_none()) {
        let _ = writeln!(out, "  {}", failure.message);
    }
}

/// Numbered, redacted listing of a scenario's steps.
pub fn render_scenario(
    scenario: &Scenario,
    policy: &PrivacyPolicyView,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Human => {
            let mut out = String::new();
            let _ = writeln!(out, "{}", scenario.qualified_name());
            for (index, step) in scenario.steps().iter().enumerate() {
                let _ = writeln!(out, "  {:>2}. {}", index + 1, step.describe(policy));
            }
            let _ = writeln!(out, "  expect {}", scenario.expectation().describe());
            Ok(out)
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let listing = ScenarioListing {
                name: scenario.qualified_name(),
                steps: scenario
                    .steps()
                    .iter()
                    .map(|step| ListedStep {
                        kind: step.kind().as_str(),
                        description: step.describe(policy),
                    })
                    .collect(),
                expect: scenario.expectation().describe(),
            };
            if format == OutputFormat::Json {
                serde_json::to_string_pretty(&listing)
                    .map_err(|err| FlowcheckError::Render(err.to_string()))
            } else {
                serde_yaml::to_string(&listing).map_err(|err| FlowcheckError::Render(err.to_string()))
            }
        }
    }
}

#[derive(Serialize)]
struct ScenarioListing {
    name: String,
    steps: Vec<ListedStep>,
    expect: String,
}

#[derive(Serialize)]
struct ListedStep {
    kind: &'static str,
    description: String,
}
