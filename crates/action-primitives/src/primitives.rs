//! The automation port
//!
//! One method per step primitive plus the fragment readout used by the
//! terminal expectation. Backends resolve the underlying browser work before
//! returning, so a caller awaiting one call at a time gets strictly ordered
//! execution.

use async_trait::async_trait;

use crate::{
    errors::ActionError,
    types::{ExecCtx, FileDescriptor, Selector},
};

#[async_trait]
pub trait AutomationPort: Send + Sync {
    /// Load the application at `path` (e.g. `/#/log-in`), relative to the backend's base URL
    async fn navigate(&self, ctx: &ExecCtx, path: &str) -> Result<(), ActionError>;

    /// Type `value` into the single element matching `selector`.
    ///
    /// With `sensitive` set the backend must not log or record the value.
    async fn fill_field(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
        sensitive: bool,
    ) -> Result<(), ActionError>;

    /// Choose `value` (option value, else visible label) on a select element
    async fn select_option(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
    ) -> Result<(), ActionError>;

    /// Deliver `file` to a file input as if picked by the user
    async fn attach_file(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        file: &FileDescriptor,
    ) -> Result<(), ActionError>;

    /// Click the unique element matching `selector` whose visible text contains `text`
    async fn click(&self, ctx: &ExecCtx, selector: &Selector, text: &str)
        -> Result<(), ActionError>;

    /// Current URL fragment including the leading `#`, or an empty string
    async fn url_fragment(&self, ctx: &ExecCtx) -> Result<String, ActionError>;
}

/// Extracts the fragment (with `#`) from a full URL.
pub fn fragment_of(url: &str) -> String {
    match url.find('#') {
        Some(idx) => url[idx..].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_includes_hash() {
        assert_eq!(fragment_of("http://localhost:8080/#/log-in"), "#/log-in");
        assert_eq!(fragment_of("http://localhost:8080/#/"), "#/");
        assert_eq!(fragment_of("http://localhost:8080/"), "");
    }
}
