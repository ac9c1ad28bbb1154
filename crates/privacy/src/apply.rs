use crate::policy::PrivacyPolicyView;
use crate::text::mask_pii;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RedactReport {
    pub applied: bool,
    pub fields: Vec<String>,
}

/// Renders a step value for logs and records.
pub fn redact_value(value: &str, sensitive: bool, policy: &PrivacyPolicyView) -> String {
    if sensitive {
        policy.sensitive_mask.clone()
    } else if policy.mask_pii {
        mask_pii(value, &policy.pii_patterns)
    } else {
        value.to_string()
    }
}

/// Replaces every occurrence of a secret in `text` by `mask`.
pub fn scrub_text(text: &str, secrets: &[&str], mask: &str) -> String {
    secrets
        .iter()
        .filter(|secret| !secret.is_empty())
        .fold(text.to_string(), |acc, &secret| acc.replace(secret, mask))
}

/// Replaces every occurrence of a secret inside string leaves of `value`.
///
/// Run records pass through this before they leave the process, so a secret
/// echoed back by a backend error message is masked as well.
pub fn scrub_json(value: &mut JsonValue, secrets: &[&str], mask: &str) -> RedactReport {
    let secrets: Vec<&str> = secrets.iter().copied().filter(|s| !s.is_empty()).collect();
    let mut fields = Vec::new();
    if !secrets.is_empty() {
        scrub_value(String::new(), value, &secrets, mask, &mut fields);
    }
    RedactReport {
        applied: !fields.is_empty(),
        fields,
    }
}

fn scrub_value(
    path: String,
    value: &mut JsonValue,
    secrets: &[&str],
    mask: &str,
    affected: &mut Vec<String>,
) {
    match value {
        JsonValue::String(current) => {
            let replaced = scrub_text(current, secrets, mask);
            if replaced != *current {
                *current = replaced;
                affected.push(path);
            }
        }
        JsonValue::Object(map) => {
            for (key, val) in map.iter_mut() {
                let nested_path = if path.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", path, key)
                };
                scrub_value(nested_path, val, secrets, mask, affected);
            }
        }
        JsonValue::Array(items) => {
            for (idx, item) in items.iter_mut().enumerate() {
                let nested_path = if path.is_empty() {
                    format!("[{}]", idx)
                } else {
                    format!("{}[{}]", path, idx)
                };
                scrub_value(nested_path, item, secrets, mask, affected);
            }
        }
        _ => {}
    }
}
