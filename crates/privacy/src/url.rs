use url::Url;

// Scenario paths are relative (`/#/log-in?next=...`), so they are resolved
// against a placeholder origin before parsing.
const PLACEHOLDER_ORIGIN: &str = "http://placeholder.invalid";

/// Masks query values (outside `allow_keys`) in absolute URLs and app paths.
pub fn redact_url(raw: &str, allow_keys: &[String]) -> String {
    let relative = raw.starts_with('/');
    let parsed = if relative {
        Url::parse(PLACEHOLDER_ORIGIN).and_then(|base| base.join(raw))
    } else {
        Url::parse(raw)
    };
    let Ok(mut parsed) = parsed else {
        return raw.to_string();
    };

    if parsed.query().is_none() && !fragment_has_query(&parsed) {
        return raw.to_string();
    }

    let filter = |query: &str| -> String {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if allow_keys.iter().any(|k| k == key) => {
                    format!("{}={}", key, value)
                }
                Some((key, _)) => format!("{}=***", key),
                None => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join("&")
    };

    if let Some(query) = parsed.query().map(str::to_string) {
        parsed.set_query(Some(&filter(&query)));
    }
    // Hash routers keep their query inside the fragment.
    if let Some(fragment) = parsed.fragment().map(str::to_string) {
        if let Some((route, query)) = fragment.split_once('?') {
            parsed.set_fragment(Some(&format!("{}?{}", route, filter(query))));
        }
    }

    let rendered = parsed.to_string();
    if relative {
        rendered
            .strip_prefix(PLACEHOLDER_ORIGIN)
            .map(str::to_string)
            .unwrap_or(rendered)
    } else {
        rendered
    }
}

fn fragment_has_query(url: &Url) -> bool {
    url.fragment().map(|f| f.contains('?')).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_query() {
        let out = redact_url(
            "https://example.com/search?q=hello&safe=1",
            &["safe".into()],
        );
        assert_eq!(out, "https://example.com/search?q=***&safe=1");
    }

    #[test]
    fn leaves_plain_routes_alone() {
        assert_eq!(redact_url("/#/log-in", &[]), "/#/log-in");
    }

    #[test]
    fn redacts_hash_router_query() {
        assert_eq!(
            redact_url("/#/reset?token=abc123&step=2", &["step".into()]),
            "/#/reset?token=***&step=2"
        );
    }
}
