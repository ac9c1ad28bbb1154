//! The log filter never lets typed text through the CDP connection log.

use std::io;
use std::sync::{Arc, Mutex};

use flowcheck_cli::logging::env_filter;
use flowcheck_cli::scenarios::PASSWORD;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Emits what chromiumoxide logs when it sends `Input.insertText`.
fn logs_with(level: &str, rust_log: Option<&str>) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::registry()
        .with(env_filter(level, rust_log).unwrap())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );

    tracing::subscriber::with_default(subscriber, || {
        let params = serde_json::json!({ "text": PASSWORD });
        tracing::trace!(target: "chromiumoxide::conn", "Sending {:?}", params);
        tracing::trace!(target: "flowcheck_cli", "verbose run");
    });

    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn trace_level_keeps_command_payloads_out() {
    let logs = logs_with("trace", None);
    assert!(logs.contains("verbose run"), "{logs}");
    assert!(!logs.contains(PASSWORD), "{logs}");
}

#[test]
fn rust_log_cannot_lift_the_protocol_cap() {
    for rust_log in ["trace", "chromiumoxide=trace", "chromiumoxide::conn=trace,flowcheck_cli=trace"] {
        let logs = logs_with("info", Some(rust_log));
        assert!(!logs.contains(PASSWORD), "RUST_LOG={rust_log}: {logs}");
    }
}
