//! Compound CSS selector matching for the in-memory page
//!
//! Supports `tag`, `#id`, `.class`, `[attr]` and `[attr=value]` joined without
//! combinators, which covers the selectors form flows use.

use super::Element;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

const SEGMENT_STARTS: [char; 3] = ['#', '.', '['];

impl SimpleSelector {
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("empty selector".to_string());
        }
        if raw.contains(|c: char| c.is_whitespace() || matches!(c, ',' | '>' | '+' | '~')) {
            return Err(format!(
                "unsupported selector `{raw}`: combinators are not supported"
            ));
        }

        let mut selector = SimpleSelector::default();
        let tag_end = raw.find(SEGMENT_STARTS).unwrap_or(raw.len());
        let tag = &raw[..tag_end];
        if !tag.is_empty() && tag != "*" {
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        let mut rest = &raw[tag_end..];
        while let Some(first) = rest.chars().next() {
            match first {
                '#' | '.' => {
                    let body = &rest[1..];
                    let end = body.find(SEGMENT_STARTS).unwrap_or(body.len());
                    let name = &body[..end];
                    if name.is_empty() {
                        return Err(format!("empty `{first}` segment in `{raw}`"));
                    }
                    if first == '#' {
                        selector.id = Some(name.to_string());
                    } else {
                        selector.classes.push(name.to_string());
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest
                        .find(']')
                        .ok_or_else(|| format!("unterminated attribute in `{raw}`"))?;
                    let inner = &rest[1..close];
                    let entry = match inner.split_once('=') {
                        Some((key, value)) => (
                            key.trim().to_string(),
                            Some(value.trim().trim_matches(|c: char| c == '"' || c == '\'').to_string()),
                        ),
                        None => (inner.trim().to_string(), None),
                    };
                    if entry.0.is_empty() {
                        return Err(format!("empty attribute name in `{raw}`"));
                    }
                    selector.attrs.push(entry);
                    rest = &rest[close + 1..];
                }
                other => return Err(format!("unexpected `{other}` in selector `{raw}`")),
            }
        }

        Ok(selector)
    }

    pub(crate) fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let classes: Vec<&str> = element
                .attr("class")
                .map(|raw| raw.split_whitespace().collect())
                .unwrap_or_default();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        self.attrs.iter().all(|(key, expected)| match (element.attr(key), expected) {
            (Some(actual), Some(expected)) => actual == expected.as_str(),
            (Some(_), None) => true,
            (None, _) => false,
        })
    }
}
