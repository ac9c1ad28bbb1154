//! Page scripts evaluated for each primitive
//!
//! Every script returns a plain object with a `status` field. Scripts that
//! act on a single element first check that the selector matches exactly
//! one element and report `not-found` / `ambiguous` otherwise.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use action_primitives::{ActionError, FileDescriptor, Selector};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct ScriptReply {
    pub status: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub available: Vec<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub(crate) const STATUS_OK: &str = "ok";
pub(crate) const STATUS_NOT_FOUND: &str = "not-found";

pub(crate) const HASH: &str = "window.location.hash";

fn literal(value: &str) -> String {
    // JSON string literals are valid JavaScript string literals.
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn with_unique(selector: &Selector, body: &str) -> String {
    format!(
        r#"(() => {{
    let els;
    try {{ els = Array.from(document.querySelectorAll({sel})); }}
    catch (e) {{ return {{ status: 'invalid-selector', message: String(e) }}; }}
    if (els.length === 0) {{ return {{ status: 'not-found', count: 0 }}; }}
    if (els.length > 1) {{ return {{ status: 'ambiguous', count: els.length }}; }}
    const el = els[0];
    {body}
}})()"#,
        sel = literal(selector.as_str()),
        body = body.trim(),
    )
}

/// Focuses a text field and moves the caret to the end; the value itself is
/// inserted afterwards so it never appears in a script.
pub(crate) fn focus_field(selector: &Selector) -> String {
    with_unique(
        selector,
        r#"
    const textual = el instanceof HTMLTextAreaElement
        || (el instanceof HTMLInputElement && !['file', 'checkbox', 'radio', 'submit', 'button'].includes(el.type))
        || el.isContentEditable;
    if (!textual) { return { status: 'not-text', tag: el.tagName.toLowerCase() }; }
    el.scrollIntoView({ block: 'center' });
    el.focus();
    try { const end = (el.value || '').length; el.setSelectionRange(end, end); } catch (_) {}
    return { status: 'ok' };
"#,
    )
}

pub(crate) fn select_option(selector: &Selector, value: &str) -> String {
    let body = format!(
        r#"
    if (!(el instanceof HTMLSelectElement)) {{ return {{ status: 'not-select', tag: el.tagName.toLowerCase() }}; }}
    const wanted = {value};
    const norm = (s) => (s || '').split(/\s+/).filter(Boolean).join(' ');
    const options = Array.from(el.options || []);
    let option = options.find(opt => opt.value === wanted);
    if (!option) {{ option = options.find(opt => norm(opt.text) === norm(wanted)); }}
    if (!option) {{ return {{ status: 'option-missing', available: options.map(opt => opt.value) }}; }}
    el.value = option.value;
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ status: 'ok' }};
"#,
        value = literal(value),
    );
    with_unique(selector, &body)
}

pub(crate) fn attach_file(selector: &Selector, file: &FileDescriptor) -> String {
    let body = format!(
        r#"
    if (!(el instanceof HTMLInputElement) || el.type !== 'file') {{ return {{ status: 'not-file-input', tag: el.tagName.toLowerCase() }}; }}
    const raw = atob({content});
    const bytes = new Uint8Array(raw.length);
    for (let i = 0; i < raw.length; i++) {{ bytes[i] = raw.charCodeAt(i); }}
    const file = new File([bytes], {name}, {{ type: {mime} }});
    const transfer = new DataTransfer();
    if (el.multiple) {{ Array.from(el.files || []).forEach(f => transfer.items.add(f)); }}
    transfer.items.add(file);
    el.files = transfer.files;
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ status: 'ok', count: file.size }};
"#,
        content = literal(&STANDARD.encode(&file.content)),
        name = literal(&file.file_name),
        mime = literal(&file.mime_type),
    );
    with_unique(selector, &body)
}

/// Visible text of every element matching `selector`, in document order.
pub(crate) fn candidate_texts(selector: &Selector) -> String {
    format!(
        r#"(() => {{
    let els;
    try {{ els = Array.from(document.querySelectorAll({sel})); }}
    catch (e) {{ return {{ status: 'invalid-selector', message: String(e) }}; }}
    return {{ status: 'ok', count: els.length, texts: els.map(el => el.innerText ?? el.textContent ?? '') }};
}})()"#,
        sel = literal(selector.as_str()),
    )
}

pub(crate) fn click_nth(selector: &Selector, index: usize) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelectorAll({sel})[{index}];
    if (!el) {{ return {{ status: 'not-found', count: 0 }}; }}
    el.scrollIntoView({{ block: 'center' }});
    el.click();
    return {{ status: 'ok' }};
}})()"#,
        sel = literal(selector.as_str()),
        index = index,
    )
}

/// Turns a non-`ok` reply into the matching action error.
pub(crate) fn reply_error(selector: &Selector, value: &str, reply: ScriptReply) -> ActionError {
    match reply.status.as_str() {
        STATUS_NOT_FOUND => ActionError::not_found(selector.as_str()),
        "ambiguous" => ActionError::AmbiguousMatch {
            selector: selector.to_string(),
            count: reply.count,
        },
        "option-missing" => ActionError::OptionNotFound {
            selector: selector.to_string(),
            value: value.to_string(),
            available: reply.available,
        },
        "not-file-input" => ActionError::NotFileInput {
            selector: selector.to_string(),
        },
        "not-text" | "not-select" => ActionError::Driver(format!(
            "`{}` is a <{}> and does not support this action",
            selector,
            reply.tag.unwrap_or_default()
        )),
        "invalid-selector" => ActionError::Driver(format!(
            "invalid selector `{}`: {}",
            selector,
            reply.message.unwrap_or_default()
        )),
        other => ActionError::Driver(format!("unexpected script status `{}`", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::ActionErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn selectors_are_quoted() {
        let script = focus_field(&Selector::from(r#"input[name="a'b"]"#));
        assert!(script.contains(r#"document.querySelectorAll("input[name=\"a'b\"]")"#));
    }

    #[test]
    fn attach_embeds_base64_content() {
        let file = FileDescriptor::new(vec![0xff, 0xd8, 0xff], "photo.jpg", "image/jpeg");
        let script = attach_file(&Selector::from("input#photo"), &file);
        assert!(script.contains("atob(\"/9j/\")"));
        assert!(script.contains("\"photo.jpg\""));
        assert!(script.contains("type: \"image/jpeg\""));
    }

    #[test]
    fn focus_script_never_contains_a_value() {
        let script = focus_field(&Selector::from("input#password"));
        assert!(!script.contains("insertText"));
        assert!(script.contains("el.focus()"));
    }

    #[test]
    fn replies_map_to_action_errors() {
        let selector = Selector::from("select#group");
        let reply: ScriptReply = serde_json::from_value(serde_json::json!({
            "status": "option-missing",
            "available": ["Administrators", "Users"]
        }))
        .unwrap();
        assert_eq!(
            reply_error(&selector, "Guests", reply),
            ActionError::OptionNotFound {
                selector: "select#group".into(),
                value: "Guests".into(),
                available: vec!["Administrators".into(), "Users".into()],
            }
        );

        let ambiguous = ScriptReply {
            status: "ambiguous".into(),
            count: 3,
            ..ScriptReply::default()
        };
        assert_eq!(
            reply_error(&selector, "", ambiguous).kind(),
            ActionErrorKind::AmbiguousMatch
        );
    }
}
