//! Log filter construction

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::errors::{FlowcheckError, Result};

/// Caps applied after any user directive. chromiumoxide traces every CDP
/// command with its parameters, which include typed text.
const PROTOCOL_CAPS: &[&str] = &["chromiumoxide=debug", "chromiumoxide::conn=debug"];

/// Builds the filter from `rust_log` when set, else from `level`.
///
/// The protocol caps replace any directive for the same targets, so no
/// verbosity setting lets field values through the CDP connection log.
pub fn env_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    let base = rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .unwrap_or(level);
    let mut filter =
        EnvFilter::try_new(base).map_err(|err| FlowcheckError::LogFilter(err.to_string()))?;
    for cap in PROTOCOL_CAPS {
        let directive: Directive = cap
            .parse()
            .map_err(|err: tracing_subscriber::filter::ParseError| {
                FlowcheckError::LogFilter(err.to_string())
            })?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}
