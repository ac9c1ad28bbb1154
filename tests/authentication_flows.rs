//! Built-in authentication scenarios against an in-memory model of the app.

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_flow::{FlowError, FlowVerifier, StepStatus, VerifierOptions};
use action_primitives::{ActionErrorKind, ClickEffect, Element, FileDescriptor, MemoryPage};
use flowcheck_cli::report::redacted_value;
use flowcheck_cli::{load_suite, scenarios, FixtureStore};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn fixtures() -> FixtureStore {
    FixtureStore::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"))
}

fn verifier() -> FlowVerifier {
    FlowVerifier::new(VerifierOptions::default().with_settle_timeout(Duration::from_millis(200)))
}

/// Log-in and sign-up screens as rendered by the ride-sharing client.
fn app() -> MemoryPage {
    MemoryPage::builder()
        .route("#/", vec![Element::new("h1").with_text("Your rides")])
        .route(
            "#/log-in",
            vec![
                Element::input("username"),
                Element::password("password"),
                Element::button("Log in").on_click(ClickEffect::Submit {
                    requires: vec!["input#username".into(), "input#password".into()],
                    on_success: "#/".into(),
                }),
                Element::new("a")
                    .with_text("Sign up")
                    .on_click(ClickEffect::Route("#/sign-up".into())),
            ],
        )
        .route(
            "#/sign-up",
            vec![
                Element::input("username"),
                Element::input("firstName"),
                Element::input("lastName"),
                Element::password("password"),
                Element::select(
                    "group",
                    &[("administrator", "Administrator"), ("driver", "Driver"), ("passenger", "Passenger")],
                ),
                Element::file_input("photo"),
                Element::button("Sign up").on_click(ClickEffect::Submit {
                    requires: vec![
                        "input#username".into(),
                        "input#firstName".into(),
                        "input#lastName".into(),
                        "input#password".into(),
                        "input#photo".into(),
                    ],
                    on_success: "#/log-in".into(),
                }),
                Element::button("Sign up with a provider").with_class("secondary"),
            ],
        )
        .build()
}

#[tokio::test]
async fn log_in_lands_on_home() {
    let page = app();
    let scenario = scenarios::log_in().unwrap();

    let record = verifier().verify(&scenario, &page).await.unwrap();

    assert!(record.passed);
    assert_eq!(page.current_hash(), "#/");
    assert_eq!(
        record.expectation.unwrap().actual.as_deref(),
        Some("#/")
    );
    assert_eq!(
        page.command_log(),
        vec![
            "visit /#/log-in".to_string(),
            "type input#username gary.cole@example.com".to_string(),
            "type input#password [hidden]".to_string(),
            "click button \"Log in\"".to_string(),
        ]
    );
}

#[tokio::test]
async fn sign_up_lands_on_log_in() {
    let page = app();
    let fixtures = fixtures();
    let scenario = scenarios::sign_up(&fixtures).unwrap();

    let record = verifier().verify(&scenario, &page).await.unwrap();

    assert!(record.passed);
    assert_eq!(page.current_hash(), "#/log-in");
    let attachment = record
        .steps
        .iter()
        .find_map(|step| step.attachment.clone())
        .unwrap();
    let photo = std::fs::read(fixtures.root().join(scenarios::PHOTO_FIXTURE)).unwrap();
    assert_eq!(attachment.size, photo.len());
    assert_eq!(attachment.mime_type, "image/jpeg");
}

#[tokio::test]
async fn sign_up_delivers_photo_byte_for_byte() {
    // Stay on the form so the attached file can be inspected.
    let page = app();
    let fixtures = fixtures();
    let full = scenarios::sign_up(&fixtures).unwrap();
    let mut builder = action_flow::Scenario::builder("attach only");
    for step in full.steps().iter().take(7) {
        builder = builder.step(step.clone());
    }
    let scenario = builder.expect_hash("#/sign-up").build().unwrap();

    verifier().verify(&scenario, &page).await.unwrap();

    let files = page.attached_files("input#photo");
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0].content,
        std::fs::read(fixtures.root().join("images/photo.jpg")).unwrap()
    );
    assert_eq!(files[0].file_name, "photo.jpg");
    assert_eq!(files[0].mime_type, "image/jpeg");
    assert_eq!(page.field_value("select#group").as_deref(), Some("driver"));
}

#[tokio::test]
async fn unknown_group_is_reported() {
    let page = app();
    let scenario = action_flow::Scenario::builder("bad group")
        .navigate("/#/sign-up")
        .select("select#group", "pilot")
        .click("button", "Sign up")
        .expect_hash("#/log-in")
        .build()
        .unwrap();

    let err = verifier().verify(&scenario, &page).await.unwrap_err();
    assert_eq!(err.kind(), Some(ActionErrorKind::OptionNotFound));
    assert_eq!(err.step_index(), Some(1));
    assert!(page.command_log().iter().all(|line| !line.starts_with("click")));
}

#[tokio::test]
async fn wrong_password_field_stops_before_submit() {
    let page = app();
    let scenario = action_flow::Scenario::builder("typo")
        .navigate("/#/log-in")
        .fill("input#username", scenarios::USERNAME)
        .fill_sensitive("input#passwd", scenarios::PASSWORD)
        .click("button", "Log in")
        .expect_hash("#/")
        .build()
        .unwrap();

    let record = verifier()
        .run(&scenario, &page, &CancellationToken::new())
        .await;
    assert_eq!(record.steps[2].status, StepStatus::Failed);
    assert_eq!(record.steps[2].error_kind, Some(ActionErrorKind::ElementNotFound));
    assert_eq!(record.steps[3].status, StepStatus::Skipped);
    assert_eq!(page.calls(), 3);
}

/// A form that renders every control twice.
fn duplicated_form() -> MemoryPage {
    MemoryPage::builder()
        .route(
            "#/profile",
            vec![
                Element::input("first").with_class("x"),
                Element::input("second").with_class("x"),
                Element::select("group-a", &[("driver", "Driver")]).with_class("group"),
                Element::select("group-b", &[("driver", "Driver")]).with_class("group"),
                Element::file_input("photo-a").with_class("photo"),
                Element::file_input("photo-b").with_class("photo"),
                Element::button("Save"),
            ],
        )
        .build()
}

#[tokio::test]
async fn ambiguous_selectors_stop_the_run() {
    let photo = FileDescriptor::new(vec![0xff, 0xd8, 0xff, 0xd9], "photo.jpg", "image/jpeg");
    let cases = [
        action_flow::Scenario::builder("fill twice")
            .navigate("/#/profile")
            .fill_sensitive("input.x", scenarios::PASSWORD),
        action_flow::Scenario::builder("select twice")
            .navigate("/#/profile")
            .select("select.group", "driver"),
        action_flow::Scenario::builder("attach twice")
            .navigate("/#/profile")
            .attach("input.photo", photo),
    ];

    for builder in cases {
        let page = duplicated_form();
        let scenario = builder
            .click("button", "Save")
            .expect_hash("#/")
            .build()
            .unwrap();

        let record = verifier()
            .run(&scenario, &page, &CancellationToken::new())
            .await;
        assert!(!record.passed, "{}", scenario.name());
        assert_eq!(record.steps[1].status, StepStatus::Failed);
        assert_eq!(
            record.steps[1].error_kind,
            Some(ActionErrorKind::AmbiguousMatch)
        );
        assert_eq!(record.steps[2].status, StepStatus::Skipped);
        assert!(page.command_log().iter().all(|line| !line.starts_with("click")));
        assert!(page
            .command_log()
            .iter()
            .all(|line| !line.contains(scenarios::PASSWORD)));
    }
}

#[tokio::test]
async fn submitting_incomplete_form_fails_the_expectation() {
    let page = app();
    let scenario = action_flow::Scenario::builder("no password")
        .navigate("/#/log-in")
        .fill("input#username", scenarios::USERNAME)
        .click("button", "Log in")
        .expect_hash("#/")
        .build()
        .unwrap();

    match verifier().verify(&scenario, &page).await {
        Err(FlowError::ExpectationFailed { source, .. }) => {
            assert_eq!(source.kind(), ActionErrorKind::AssertionFailure);
            assert!(source.to_string().contains("#/log-in"));
        }
        other => panic!("expected an expectation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn suite_report_never_contains_the_password() {
    let page = app();
    let fixtures = fixtures();
    let suite = scenarios::builtin_suite(&fixtures).unwrap();

    let report = verifier()
        .run_suite(&suite, &page, &CancellationToken::new())
        .await;
    assert!(report.all_passed());

    let secrets: Vec<&str> = suite.scenarios.iter().flat_map(|s| s.secrets()).collect();
    let json = redacted_value(&report, &secrets, "********").unwrap().to_string();
    assert!(!json.contains(scenarios::PASSWORD));
    assert!(json.contains("input#password"));
    assert!(page
        .command_log()
        .iter()
        .all(|line| !line.contains(scenarios::PASSWORD)));
}

#[tokio::test]
async fn sample_scenario_file_passes() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let suite = load_suite(&root.join("scenarios/authentication.yaml"), &fixtures()).unwrap();
    assert_eq!(suite.scenarios.len(), 2);

    let report = verifier()
        .run_suite(&suite, &app(), &CancellationToken::new())
        .await;
    assert_eq!((report.passed, report.failed), (2, 0));
}
