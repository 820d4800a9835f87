use url::Url;

/// Normalize a URL to its origin (scheme + host + optional port).
///
/// Falls back to trimming trailing slashes if the input cannot be parsed.
pub fn normalize_origin(input: &str) -> String {
    match Url::parse(input) {
        Ok(parsed) => parsed
            .origin()
            .ascii_serialization()
            .trim_end_matches('/')
            .to_string(),
        Err(_) => input.trim_end_matches('/').to_string(),
    }
}

/// Parse `input` only if it is an absolute http(s) URL.
pub fn parse_http_url(input: &str) -> Option<Url> {
    Url::parse(input)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

pub fn is_http_url(input: &str) -> bool {
    parse_http_url(input).is_some()
}

/// Resolve `href` against `base`. Without a base the href is returned unchanged,
/// as is anything the URL parser rejects.
pub fn resolve_href(base: Option<&Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

/// Request path used for robots.txt matching, `/` when empty.
pub fn request_path(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
}

/// Classify a resolved link relative to the page it was found on.
///
/// Absolute http(s) links are internal when host and port match the base.
/// Other links (fragments, relative paths, `mailto:` and friends) count as
/// internal whenever a base exists, and otherwise only when they carry no scheme.
pub fn classify_link(href: &str, base: Option<&Url>) -> LinkKind {
    if href.is_empty() {
        return LinkKind::External;
    }

    match Url::parse(href) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => match base {
            Some(base) if netloc(&parsed) == netloc(base) => LinkKind::Internal,
            _ => LinkKind::External,
        },
        Ok(_) if base.is_none() => LinkKind::External,
        _ => LinkKind::Internal,
    }
}

fn netloc(url: &Url) -> (Option<&str>, Option<u16>) {
    (url.host_str(), url.port())
}
