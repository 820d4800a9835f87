//! Error types for the analysis pipeline.

/// The extractor could not build a content tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Input was empty or whitespace only.
    #[error("document is empty")]
    EmptyDocument,

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Page retrieval failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL `{0}`")]
    InvalidUrl(String),

    #[error("unsupported URL scheme `{0}`; only http and https are allowed")]
    UnsupportedScheme(String),

    #[error("blocked request to non-public address {addr} for host `{host}`")]
    Blocked { host: String, addr: std::net::IpAddr },

    #[error("could not resolve host `{0}`")]
    Dns(String),

    #[error("response exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("more than {0} redirects")]
    TooManyRedirects(usize),

    #[error("request failed: {0}")]
    Transport(String),
}

/// The analyses supplied for comparison cannot be compared.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("need at least 2 results to compare, got {found}")]
    TooFew { found: usize },
    #[error("duplicate result id: {0}")]
    DuplicateId(String),
    #[error("failed to serialize report {id}: {reason}")]
    Serialize { id: String, reason: String },
}

/// A whole-page analysis failed.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to parse page: {0}")]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = AnalyzeError::from(FetchError::Status {
            status: 404,
            url: "https://example.com/missing".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "failed to fetch page: server returned HTTP 404 for https://example.com/missing"
        );

        let err = AnalyzeError::from(ParseError::EmptyDocument);
        assert_eq!(err.to_string(), "failed to parse page: document is empty");

        assert_eq!(
            CompareError::TooFew { found: 1 }.to_string(),
            "need at least 2 results to compare, got 1"
        );
        assert_eq!(
            CompareError::DuplicateId("u1".to_string()).to_string(),
            "duplicate result id: u1"
        );
    }
}
