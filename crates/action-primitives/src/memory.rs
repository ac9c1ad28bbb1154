//! Scripted in-memory page
//!
//! A small model of a single-page application: hash routes own a list of
//! elements, buttons carry a [`ClickEffect`], and every port call is appended
//! to a command log. Sensitive input never reaches the log.

mod selector;

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    errors::ActionError,
    primitives::{fragment_of, AutomationPort},
    types::{normalize_text, pick_text_match, ExecCtx, FileDescriptor, Selector},
};
use selector::SimpleSelector;

const HIDDEN_VALUE: &str = "[hidden]";

/// Option of a `<select>` element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

/// What happens when an element is clicked
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickEffect {
    /// Switch to the given hash route
    Route(String),

    /// Switch to `on_success` only if every `requires` selector holds a value or a file
    Submit {
        requires: Vec<Selector>,
        on_success: String,
    },
}

#[derive(Clone, Debug)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub value: String,
    pub options: Vec<OptionItem>,
    pub files: Vec<FileDescriptor>,
    pub on_click: Option<ClickEffect>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            options: Vec::new(),
            files: Vec::new(),
            on_click: None,
        }
    }

    pub fn input(id: &str) -> Self {
        Self::new("input").with_attr("id", id).with_attr("type", "text")
    }

    pub fn password(id: &str) -> Self {
        Self::new("input").with_attr("id", id).with_attr("type", "password")
    }

    pub fn file_input(id: &str) -> Self {
        Self::new("input").with_attr("id", id).with_attr("type", "file")
    }

    pub fn select(id: &str, options: &[(&str, &str)]) -> Self {
        let mut element = Self::new("select").with_attr("id", id);
        element.options = options
            .iter()
            .map(|(value, label)| OptionItem {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        element
    }

    pub fn button(text: &str) -> Self {
        Self::new("button").with_text(text)
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.with_attr("class", class)
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = Some(effect);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    fn is_file_input(&self) -> bool {
        self.tag.eq_ignore_ascii_case("input") && self.attr("type") == Some("file")
    }

    fn is_text_field(&self) -> bool {
        (self.tag.eq_ignore_ascii_case("input") && !self.is_file_input())
            || self.tag.eq_ignore_ascii_case("textarea")
    }

    fn has_input(&self) -> bool {
        !self.value.is_empty() || !self.files.is_empty()
    }
}

#[derive(Default)]
pub struct MemoryPageBuilder {
    routes: BTreeMap<String, Vec<Element>>,
}

impl MemoryPageBuilder {
    /// Register the elements rendered for hash route `hash` (e.g. `#/log-in`)
    pub fn route(mut self, hash: &str, elements: Vec<Element>) -> Self {
        self.routes.insert(hash.to_string(), elements);
        self
    }

    pub fn build(self) -> MemoryPage {
        MemoryPage {
            state: Mutex::new(PageState {
                routes: self.routes,
                hash: String::new(),
                elements: Vec::new(),
                log: Vec::new(),
                calls: 0,
            }),
        }
    }
}

struct PageState {
    routes: BTreeMap<String, Vec<Element>>,
    hash: String,
    elements: Vec<Element>,
    log: Vec<String>,
    calls: usize,
}

impl PageState {
    fn enter(&mut self, ctx: &ExecCtx, entry: String) -> Result<(), ActionError> {
        if ctx.is_cancelled() {
            return Err(ActionError::Interrupted("context cancelled".to_string()));
        }
        self.calls += 1;
        debug!(action_id = %ctx.action_id, command = %entry, "memory page command");
        self.log.push(entry);
        Ok(())
    }

    fn matching(&self, selector: &Selector) -> Result<Vec<usize>, ActionError> {
        let parsed = SimpleSelector::parse(selector.as_str()).map_err(ActionError::Driver)?;
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| parsed.matches(element))
            .map(|(idx, _)| idx)
            .collect())
    }

    fn unique(&self, selector: &Selector) -> Result<usize, ActionError> {
        let matches = self.matching(selector)?;
        if matches.len() == 1 {
            Ok(matches[0])
        } else {
            Err(ActionError::from_match_count(selector.as_str(), matches.len()))
        }
    }

    fn load_route(&mut self, hash: String) {
        self.elements = self.routes.get(&hash).cloned().unwrap_or_default();
        self.hash = hash;
    }

    fn apply_click(&mut self, effect: ClickEffect) -> Result<(), ActionError> {
        match effect {
            ClickEffect::Route(hash) => self.load_route(hash),
            ClickEffect::Submit {
                requires,
                on_success,
            } => {
                for selector in &requires {
                    let satisfied = self
                        .matching(selector)?
                        .into_iter()
                        .any(|idx| self.elements[idx].has_input());
                    if !satisfied {
                        debug!(field = %selector, "submit blocked by empty field");
                        return Ok(());
                    }
                }
                self.load_route(on_success);
            }
        }
        Ok(())
    }
}

pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl MemoryPage {
    pub fn builder() -> MemoryPageBuilder {
        MemoryPageBuilder::default()
    }

    /// Commands received so far, in order, with sensitive values hidden
    pub fn command_log(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Number of step primitives executed (fragment reads excluded)
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    pub fn current_hash(&self) -> String {
        self.state.lock().hash.clone()
    }

    /// Value held by the first element matching `selector`
    pub fn field_value(&self, selector: &str) -> Option<String> {
        let state = self.state.lock();
        let idx = *state.matching(&Selector::from(selector)).ok()?.first()?;
        Some(state.elements[idx].value.clone())
    }

    /// Files held by the first element matching `selector`
    pub fn attached_files(&self, selector: &str) -> Vec<FileDescriptor> {
        let state = self.state.lock();
        state
            .matching(&Selector::from(selector))
            .ok()
            .and_then(|matches| matches.first().copied())
            .map(|idx| state.elements[idx].files.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AutomationPort for MemoryPage {
    async fn navigate(&self, ctx: &ExecCtx, path: &str) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.enter(ctx, format!("visit {}", path))?;
        if !path.starts_with('/') {
            return Err(ActionError::navigation(path, "path must start with `/`"));
        }
        let hash = fragment_of(path);
        if !state.routes.contains_key(&hash) {
            return Err(ActionError::navigation(path, "no such route"));
        }
        state.load_route(hash);
        Ok(())
    }

    async fn fill_field(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
        sensitive: bool,
    ) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        let shown = if sensitive { HIDDEN_VALUE } else { value };
        state.enter(ctx, format!("type {} {}", selector, shown))?;
        let idx = state.unique(selector)?;
        let element = &mut state.elements[idx];
        if !element.is_text_field() {
            return Err(ActionError::Driver(format!(
                "`{}` is a <{}> and cannot be typed into",
                selector, element.tag
            )));
        }
        element.value.push_str(value);
        Ok(())
    }

    async fn select_option(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
    ) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.enter(ctx, format!("select {} {}", selector, value))?;
        let idx = state.unique(selector)?;
        let element = &mut state.elements[idx];
        if !element.tag.eq_ignore_ascii_case("select") {
            return Err(ActionError::Driver(format!(
                "`{}` is a <{}>, not a <select>",
                selector, element.tag
            )));
        }
        let chosen = element
            .options
            .iter()
            .find(|option| option.value == value)
            .or_else(|| {
                element
                    .options
                    .iter()
                    .find(|option| normalize_text(&option.label) == normalize_text(value))
            })
            .map(|option| option.value.clone());
        match chosen {
            Some(option_value) => {
                element.value = option_value;
                Ok(())
            }
            None => Err(ActionError::OptionNotFound {
                selector: selector.to_string(),
                value: value.to_string(),
                available: element.options.iter().map(|o| o.value.clone()).collect(),
            }),
        }
    }

    async fn attach_file(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        file: &FileDescriptor,
    ) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.enter(
            ctx,
            format!(
                "attach {} {} ({}, {} bytes)",
                selector,
                file.file_name,
                file.mime_type,
                file.len()
            ),
        )?;
        let idx = state.unique(selector)?;
        let element = &mut state.elements[idx];
        if !element.is_file_input() {
            return Err(ActionError::NotFileInput {
                selector: selector.to_string(),
            });
        }
        if element.attr("multiple").is_none() {
            element.files.clear();
        }
        element.files.push(file.clone());
        Ok(())
    }

    async fn click(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        text: &str,
    ) -> Result<(), ActionError> {
        let mut state = self.state.lock();
        state.enter(ctx, format!("click {} \"{}\"", selector, text))?;
        let candidates = state.matching(selector)?;
        let texts: Vec<&str> = candidates
            .iter()
            .map(|idx| state.elements[*idx].text.as_str())
            .collect();
        let target = match pick_text_match(texts, text) {
            Ok(pos) => candidates[pos],
            Err(count) => {
                return Err(ActionError::from_match_count(
                    format!("{} containing \"{}\"", selector, text),
                    count,
                ))
            }
        };
        if let Some(effect) = state.elements[target].on_click.clone() {
            state.apply_click(effect)?;
        }
        Ok(())
    }

    async fn url_fragment(&self, _ctx: &ExecCtx) -> Result<String, ActionError> {
        Ok(self.state.lock().hash.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ActionErrorKind;

    fn login_page() -> MemoryPage {
        MemoryPage::builder()
            .route(
                "#/log-in",
                vec![
                    Element::input("username"),
                    Element::password("password"),
                    Element::button("Log in").on_click(ClickEffect::Submit {
                        requires: vec!["input#username".into(), "input#password".into()],
                        on_success: "#/".into(),
                    }),
                    Element::button("Sign up").on_click(ClickEffect::Route("#/sign-up".into())),
                ],
            )
            .route("#/", vec![])
            .route("#/sign-up", vec![Element::file_input("photo")])
            .build()
    }

    #[tokio::test]
    async fn submit_requires_filled_fields() {
        let page = login_page();
        let ctx = ExecCtx::default();
        page.navigate(&ctx, "/#/log-in").await.unwrap();
        page.fill_field(&ctx, &"input#username".into(), "gary", false)
            .await
            .unwrap();
        page.click(&ctx, &"button".into(), "Log in").await.unwrap();
        assert_eq!(page.url_fragment(&ctx).await.unwrap(), "#/log-in");

        page.fill_field(&ctx, &"input#password".into(), "pAssw0rd", true)
            .await
            .unwrap();
        page.click(&ctx, &"button".into(), "Log in").await.unwrap();
        assert_eq!(page.url_fragment(&ctx).await.unwrap(), "#/");
    }

    #[tokio::test]
    async fn sensitive_values_stay_out_of_the_log() {
        let page = login_page();
        let ctx = ExecCtx::default();
        page.navigate(&ctx, "/#/log-in").await.unwrap();
        page.fill_field(&ctx, &"input#password".into(), "pAssw0rd", true)
            .await
            .unwrap();
        assert_eq!(page.field_value("input#password").as_deref(), Some("pAssw0rd"));
        let log = page.command_log().join("\n");
        assert!(!log.contains("pAssw0rd"));
        assert!(log.contains("type input#password [hidden]"));
    }

    #[tokio::test]
    async fn unknown_route_is_a_navigation_failure() {
        let page = login_page();
        let err = page
            .navigate(&ExecCtx::default(), "/#/missing")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ActionErrorKind::NavigationFailure);
    }

    #[tokio::test]
    async fn file_inputs_only_accept_files() {
        let page = login_page();
        let ctx = ExecCtx::default();
        page.navigate(&ctx, "/#/log-in").await.unwrap();
        let file = FileDescriptor::new(vec![1, 2, 3], "a.bin", "application/octet-stream");
        let err = page
            .attach_file(&ctx, &"input#username".into(), &file)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ActionErrorKind::NotFileInput);

        page.click(&ctx, &"button".into(), "Sign up").await.unwrap();
        page.attach_file(&ctx, &"input#photo".into(), &file)
            .await
            .unwrap();
        assert_eq!(page.attached_files("input#photo"), vec![file]);
    }

    #[tokio::test]
    async fn cancelled_context_interrupts() {
        let page = login_page();
        let ctx = ExecCtx::default();
        ctx.cancel.cancel();
        let err = page.navigate(&ctx, "/#/log-in").await.unwrap_err();
        assert_eq!(err.kind(), ActionErrorKind::Interrupted);
        assert_eq!(page.calls(), 0);
    }
}
