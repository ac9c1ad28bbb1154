//! Core data types for action primitives

use std::fmt;

use flowcheck_core_types::ActionId;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Execution context handed to every primitive
#[derive(Clone, Debug)]
pub struct ExecCtx {
    /// Correlation id for backend logs
    pub action_id: ActionId,

    /// Cooperative cancellation for the whole run
    pub cancel: CancellationToken,
}

impl ExecCtx {
    pub fn new(action_id: ActionId, cancel: CancellationToken) -> Self {
        Self { action_id, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for ExecCtx {
    fn default() -> Self {
        Self::new(ActionId::new(), CancellationToken::new())
    }
}

/// CSS selector used to locate elements
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(pub String);

impl Selector {
    pub fn new(css: impl Into<String>) -> Self {
        Self(css.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// File handed to a file input, delivered byte-for-byte
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl FileDescriptor {
    pub fn new(content: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            content,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// File contents can be large binary blobs; keep Debug output readable.
impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.content.len())
            .finish()
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

/// Whitespace-normalised visible text, as the user would read it.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picks the single candidate whose text contains `needle`.
///
/// When several candidates contain the text, an exact (normalised) match wins
/// if it is unique. Returns the index of the winner or the number of
/// competing matches.
pub fn pick_text_match<'a, I>(texts: I, needle: &str) -> Result<usize, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = normalize_text(needle);
    let normalized: Vec<String> = texts.into_iter().map(normalize_text).collect();
    let containing: Vec<usize> = normalized
        .iter()
        .enumerate()
        .filter(|(_, text)| text.contains(&needle))
        .map(|(idx, _)| idx)
        .collect();

    match containing.len() {
        0 => Err(0),
        1 => Ok(containing[0]),
        n => {
            let exact: Vec<usize> = containing
                .iter()
                .copied()
                .filter(|idx| normalized[*idx] == needle)
                .collect();
            if exact.len() == 1 {
                Ok(exact[0])
            } else {
                Err(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_descriptor_round_trips_through_base64() {
        let file = FileDescriptor::new(vec![0xff, 0xd8, 0x00, 0x10], "photo.jpg", "image/jpeg");
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["content"], "/9gAEA==");
        let back: FileDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, file);
    }

    #[test]
    fn debug_hides_content() {
        let file = FileDescriptor::new(b"secret bytes".to_vec(), "a.txt", "text/plain");
        let rendered = format!("{:?}", file);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("len: 12"));
    }

    #[test]
    fn text_match_prefers_unique_exact() {
        let texts = ["Log in", "Log in with SSO", "Sign up"];
        assert_eq!(pick_text_match(texts, "Log in"), Ok(0));
        assert_eq!(pick_text_match(texts, "Sign"), Ok(2));
        assert_eq!(pick_text_match(texts, "Register"), Err(0));
        assert_eq!(pick_text_match(["Save", " Save "], "Save"), Err(2));
    }
}
