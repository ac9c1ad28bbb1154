//! Run records
//!
//! What a run leaves behind. Records only ever hold redacted step
//! descriptions; attached files are summarised by name, type, size and digest.

use action_primitives::ActionErrorKind;
use chrono::{DateTime, Utc};
use flowcheck_core_types::RunId;
use serde::{Deserialize, Serialize};

use crate::types::StepKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    /// Not executed because an earlier step failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub kind: StepKind,
    pub description: String,
    pub status: StepStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ActionErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationRecord {
    pub description: String,
    pub expected: String,
    pub actual: Option<String>,
    pub passed: bool,
}

/// Where and why a run failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Failing step; `None` for validation or expectation failures
    pub step_index: Option<usize>,
    pub kind: Option<ActionErrorKind>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub latency_ms: u64,
    pub passed: bool,
    pub steps: Vec<StepRecord>,
    pub expectation: Option<ExpectationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
}

impl RunRecord {
    pub fn new(run_id: RunId, scenario: String, suite: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            scenario,
            suite,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            passed: false,
            steps: Vec::new(),
            expectation: None,
            failure: None,
        }
    }

    /// Set finish time and calculate latency
    pub fn finish(mut self, passed: bool) -> Self {
        self.passed = passed;
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }

    pub fn executed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.status != StepStatus::Skipped)
            .count()
    }
}

/// Aggregate of every scenario run in one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<RunRecord>,
}

impl SuiteReport {
    pub fn new(run_id: RunId) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            passed: 0,
            failed: 0,
            scenarios: Vec::new(),
        }
    }

    pub fn push(&mut self, record: RunRecord) {
        if record.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.finished_at = Utc::now();
        self.scenarios.push(record);
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_counts_outcomes() {
        let mut report = SuiteReport::new(RunId::new());
        report.push(RunRecord::new(RunId::new(), "a".into(), None).finish(true));
        assert!(report.all_passed());
        report.push(RunRecord::new(RunId::new(), "b".into(), None).finish(false));
        assert_eq!((report.passed, report.failed), (1, 1));
        assert!(!report.all_passed());
    }

    #[test]
    fn optional_fields_are_omitted() {
        let record = RunRecord::new(RunId("r".into()), "a".into(), None).finish(true);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("suite").is_none());
        assert!(json.get("failure").is_none());
        assert_eq!(json["passed"], true);
    }
}
