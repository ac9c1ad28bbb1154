//! Flow verifier implementation

use std::time::{Duration, Instant};

use action_primitives::{ActionError, AutomationPort, ExecCtx};
use flowcheck_core_types::{ActionId, RunId};
use flowcheck_privacy::{digest_bytes, scrub_text, truncate, PrivacyPolicyView};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::FlowError;
use crate::record::{
    AttachmentRecord, ExpectationRecord, FailureRecord, RunRecord, StepRecord, StepStatus,
    SuiteReport,
};
use crate::types::{Expectation, Scenario, Step, Suite};

/// Tuning for a verifier instance
#[derive(Debug, Clone)]
pub struct VerifierOptions {
    /// How long the terminal expectation may take to become true
    pub settle_timeout: Duration,

    /// Delay between two reads of the observed state while settling
    pub poll_interval: Duration,

    /// Rendering rules for values in logs and records
    pub privacy: PrivacyPolicyView,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_millis(4_000),
            poll_interval: Duration::from_millis(100),
            privacy: PrivacyPolicyView::default(),
        }
    }
}

impl VerifierOptions {
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_privacy(mut self, privacy: PrivacyPolicyView) -> Self {
        self.privacy = privacy;
        self
    }
}

/// Runs scenarios step by step against an automation port.
///
/// Steps are awaited one at a time in declaration order. The first failing
/// step (or a failing expectation) ends the scenario; nothing is retried.
pub struct FlowVerifier {
    options: VerifierOptions,
}

impl Default for FlowVerifier {
    fn default() -> Self {
        Self::new(VerifierOptions::default())
    }
}

impl FlowVerifier {
    pub fn new(options: VerifierOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Run `scenario` and fail with the first error encountered.
    pub async fn verify(
        &self,
        scenario: &Scenario,
        port: &dyn AutomationPort,
    ) -> Result<RunRecord, FlowError> {
        let (record, outcome) = self
            .execute(scenario, port, &CancellationToken::new())
            .await;
        outcome.map(|_| record)
    }

    /// Run `scenario` and always return its record; the outcome is in `record.passed`.
    pub async fn run(
        &self,
        scenario: &Scenario,
        port: &dyn AutomationPort,
        cancel: &CancellationToken,
    ) -> RunRecord {
        self.execute(scenario, port, cancel).await.0
    }

    /// Run every scenario of `suite` in order on the same port.
    pub async fn run_suite(
        &self,
        suite: &Suite,
        port: &dyn AutomationPort,
        cancel: &CancellationToken,
    ) -> SuiteReport {
        let mut report = SuiteReport::new(RunId::new());
        info!(suite = %suite.name, scenarios = suite.scenarios.len(), "running suite");
        for scenario in &suite.scenarios {
            let record = self.run(scenario, port, cancel).await;
            report.push(record);
        }
        info!(
            suite = %suite.name,
            passed = report.passed,
            failed = report.failed,
            "suite finished"
        );
        report
    }

    #[instrument(skip_all, fields(scenario = %scenario.qualified_name()))]
    async fn execute(
        &self,
        scenario: &Scenario,
        port: &dyn AutomationPort,
        cancel: &CancellationToken,
    ) -> (RunRecord, Result<(), FlowError>) {
        let run_id = RunId::new();
        let mut record = RunRecord::new(
            run_id.clone(),
            scenario.name().to_string(),
            scenario.suite().map(str::to_string),
        );

        if let Err(err) = scenario.validate() {
            warn!(error = %err, "scenario rejected");
            record.failure = Some(FailureRecord {
                step_index: None,
                kind: None,
                message: err.to_string(),
            });
            return (record.finish(false), Err(err));
        }

        let secrets = scenario.secrets();
        info!(run_id = %run_id, steps = scenario.steps().len(), "scenario started");

        for (index, step) in scenario.steps().iter().enumerate() {
            let description = step.describe(&self.options.privacy);
            let ctx = ExecCtx::new(ActionId::for_step(&run_id, index), cancel.clone());
            info!(index, kind = step.kind().as_str(), step = %description, "executing step");

            let started = Instant::now();
            let result = if ctx.is_cancelled() {
                Err(ActionError::Interrupted("run cancelled".to_string()))
            } else {
                dispatch(port, &ctx, step).await
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            let mut step_record = StepRecord {
                index,
                kind: step.kind(),
                description: description.clone(),
                status: StepStatus::Passed,
                latency_ms,
                attachment: attachment_of(step, &self.options.privacy),
                error_kind: None,
                error: None,
            };

            if let Err(source) = result {
                let message = self.redact_message(&source, &secrets);
                warn!(index, kind = source.kind().as_str(), error = %message, "step failed");
                step_record.status = StepStatus::Failed;
                step_record.error_kind = Some(source.kind());
                step_record.error = Some(message.clone());
                record.steps.push(step_record);
                record.steps.extend(skipped_after(scenario, index, &self.options.privacy));
                record.failure = Some(FailureRecord {
                    step_index: Some(index),
                    kind: Some(source.kind()),
                    message,
                });
                let err = FlowError::StepFailed {
                    index,
                    step: description,
                    source,
                };
                return (record.finish(false), Err(err));
            }

            debug!(index, latency_ms, "step passed");
            record.steps.push(step_record);
        }

        let expectation = scenario.expectation();
        let ctx = ExecCtx::new(
            ActionId::for_step(&run_id, scenario.steps().len()),
            cancel.clone(),
        );
        let outcome = self.settle(port, &ctx, expectation).await;
        let (expected, description) = match expectation {
            Expectation::HashEquals(hash) => (hash.clone(), expectation.describe()),
        };

        match outcome {
            Ok(actual) => {
                info!(expectation = %description, "expectation held");
                record.expectation = Some(ExpectationRecord {
                    description,
                    expected,
                    actual: Some(actual),
                    passed: true,
                });
                (record.finish(true), Ok(()))
            }
            Err(source) => {
                let message = self.redact_message(&source, &secrets);
                warn!(expectation = %description, error = %message, "expectation failed");
                let actual = match &source {
                    ActionError::AssertionFailure { actual, .. } => Some(actual.clone()),
                    _ => None,
                };
                record.expectation = Some(ExpectationRecord {
                    description: description.clone(),
                    expected,
                    actual,
                    passed: false,
                });
                record.failure = Some(FailureRecord {
                    step_index: None,
                    kind: Some(source.kind()),
                    message,
                });
                let err = FlowError::ExpectationFailed {
                    expectation: description,
                    source,
                };
                (record.finish(false), Err(err))
            }
        }
    }

    /// Error text as it may appear in logs and records
    fn redact_message(&self, err: &ActionError, secrets: &[&str]) -> String {
        let privacy = &self.options.privacy;
        let scrubbed = scrub_text(&err.to_string(), secrets, &privacy.sensitive_mask);
        truncate(&scrubbed, privacy.message_max_len)
    }

    /// Re-read the observed state until the expectation holds or the settle timeout elapses.
    async fn settle(
        &self,
        port: &dyn AutomationPort,
        ctx: &ExecCtx,
        expectation: &Expectation,
    ) -> Result<String, ActionError> {
        let deadline = Instant::now() + self.options.settle_timeout;
        match expectation {
            Expectation::HashEquals(expected) => loop {
                if ctx.is_cancelled() {
                    return Err(ActionError::Interrupted("run cancelled".to_string()));
                }
                let actual = port.url_fragment(ctx).await?;
                if &actual == expected {
                    return Ok(actual);
                }
                if Instant::now() >= deadline {
                    return Err(ActionError::AssertionFailure {
                        subject: "url hash".to_string(),
                        expected: expected.clone(),
                        actual,
                    });
                }
                debug!(expected = %expected, actual = %actual, "waiting for hash");
                tokio::time::sleep(self.options.poll_interval).await;
            },
        }
    }
}

async fn dispatch(port: &dyn AutomationPort, ctx: &ExecCtx, step: &Step) -> Result<(), ActionError> {
    match step {
        Step::Navigate { path } => port.navigate(ctx, path).await,
        Step::FillField {
            selector,
            value,
            sensitive,
        } => port.fill_field(ctx, selector, value, *sensitive).await,
        Step::SelectOption { selector, value } => port.select_option(ctx, selector, value).await,
        Step::AttachFile { selector, file } => port.attach_file(ctx, selector, file).await,
        Step::Click { selector, text } => port.click(ctx, selector, text).await,
    }
}

fn attachment_of(step: &Step, privacy: &PrivacyPolicyView) -> Option<AttachmentRecord> {
    match step {
        Step::AttachFile { file, .. } => Some(AttachmentRecord {
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.len(),
            digest: digest_bytes(&file.content, privacy.digest_alg.clone()),
        }),
        _ => None,
    }
}

fn skipped_after(
    scenario: &Scenario,
    failed_index: usize,
    privacy: &PrivacyPolicyView,
) -> Vec<StepRecord> {
    scenario
        .steps()
        .iter()
        .enumerate()
        .skip(failed_index + 1)
        .map(|(index, step)| StepRecord {
            index,
            kind: step.kind(),
            description: step.describe(privacy),
            status: StepStatus::Skipped,
            latency_ms: 0,
            attachment: attachment_of(step, privacy),
            error_kind: None,
            error: None,
        })
        .collect()
}
