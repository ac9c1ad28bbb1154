use crate::policy::{HashAlg, PiiRule};
use regex::Regex;
use sha2::{Digest, Sha256};

pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn mask_pii(text: &str, rules: &[PiiRule]) -> String {
    let mut masked = normalize(text);
    for rule in rules {
        if let Ok(re) = Regex::new(&rule.pattern) {
            masked = re.replace_all(&masked, "***").into_owned();
        }
    }
    masked
}

/// Cuts `text` to at most `max_len` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_len.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Content digest for binary payloads such as attached files.
pub fn digest_bytes(bytes: &[u8], alg: HashAlg) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hex::encode(hasher.finalize());
    match alg {
        HashAlg::Sha256 => format!("sha256:{}", hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_basic_email() {
        let masked = mask_pii(
            "contact me at foo@example.com",
            &[PiiRule {
                name: "email".into(),
                pattern: r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}".into(),
            }],
        );
        assert_eq!(masked, "contact me at ***");
    }

    #[test]
    fn digests_empty_payload() {
        assert_eq!(
            digest_bytes(b"", HashAlg::Sha256),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 5), "héll…");
        assert_eq!(truncate("abc", 0), "…");
    }
}
