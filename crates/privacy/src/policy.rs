use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{PrivacyError, PrivacyResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HashAlg {
    #[default]
    Sha256,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PiiRule {
    pub name: String,
    pub pattern: String,
}

/// How values are rendered in logs and run records.
///
/// Sensitive values are always replaced by `sensitive_mask`; `mask_pii`
/// additionally masks PII found in ordinary values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyPolicyView {
    pub mask_pii: bool,
    pub sensitive_mask: String,
    /// Longest error message kept in a run record
    pub message_max_len: usize,
    /// Digest used to summarise attached files
    pub digest_alg: HashAlg,
    pub pii_patterns: Vec<PiiRule>,
    pub query_allow_keys: Vec<String>,
}

impl Default for PrivacyPolicyView {
    fn default() -> Self {
        Self {
            mask_pii: false,
            sensitive_mask: "********".into(),
            message_max_len: 512,
            digest_alg: HashAlg::Sha256,
            pii_patterns: vec![
                PiiRule {
                    name: "email".into(),
                    pattern: r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}".into(),
                },
                PiiRule {
                    name: "phone".into(),
                    pattern: r"\b(?:\+?\d{1,3}[- ]?)?\(?\d{3}\)?[- ]?\d{3}[- ]?\d{4}\b".into(),
                },
                PiiRule {
                    name: "credit_card".into(),
                    pattern: r"\b(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|6(?:011|5[0-9]{2})[0-9]{12})\b".into(),
                },
                PiiRule {
                    name: "secret_token".into(),
                    pattern: r"(sk|pk|tok)_[A-Za-z0-9]{16,}".into(),
                },
            ],
            query_allow_keys: vec![],
        }
    }
}

impl PrivacyPolicyView {
    /// Rejects policies whose patterns do not compile or whose mask is empty.
    pub fn validate(&self) -> PrivacyResult<()> {
        if self.sensitive_mask.is_empty() {
            return Err(PrivacyError::EmptyMask);
        }
        for rule in &self.pii_patterns {
            Regex::new(&rule.pattern).map_err(|err| PrivacyError::InvalidPattern {
                name: rule.name.clone(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        PrivacyPolicyView::default().validate().expect("default policy");
    }

    #[test]
    fn broken_pattern_is_reported() {
        let mut view = PrivacyPolicyView::default();
        view.pii_patterns.push(PiiRule {
            name: "broken".into(),
            pattern: "(unclosed".into(),
        });
        let err = view.validate().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let view: PrivacyPolicyView = serde_json::from_str(r#"{ "mask_pii": true }"#).unwrap();
        assert!(view.mask_pii);
        assert_eq!(view.sensitive_mask, "********");
        assert!(!view.pii_patterns.is_empty());
    }
}
