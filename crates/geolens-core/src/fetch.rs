//! Page retrieval
//!
//! [`PageFetcher`] is what the analyzer needs to get HTML for a URL.
//! [`HttpFetcher`] (feature `http`) is the real implementation and also
//! serves the robots.txt and header probes of the access evaluator.
//! [`StaticFetcher`] answers from memory.

use std::collections::HashMap;
use std::future::Future;

use crate::access::{AccessFetcher, StaticAccess};
use crate::error::FetchError;

pub trait PageFetcher: Send + Sync {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// In-memory pages plus canned access probes
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
    access: StaticAccess,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_robots(mut self, origin: &str, body: &str) -> Self {
        self.access = self.access.with_robots(origin, body);
        self
    }

    pub fn with_header(mut self, url: &str, name: &str, value: &str) -> Self {
        self.access = self.access.with_header(url, name, value);
        self
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
        std::future::ready(self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            url: url.to_string(),
        }))
    }
}

impl AccessFetcher for StaticFetcher {
    fn fetch_robots_txt(&self, origin: &str) -> impl Future<Output = (bool, String)> + Send {
        self.access.fetch_robots_txt(origin)
    }

    fn fetch_headers(&self, url: &str) -> impl Future<Output = HashMap<String, String>> + Send {
        self.access.fetch_headers(url)
    }
}

/// Check that `input` is an absolute http(s) URL.
pub fn validate_url(input: &str) -> Result<url::Url, FetchError> {
    let parsed = url::Url::parse(input).map_err(|_| FetchError::InvalidUrl(input.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

/// True for addresses a server-side fetch may reach: not private, loopback,
/// link-local, unspecified, multicast, broadcast or unique-local.
pub fn is_public_ip(ip: std::net::IpAddr) -> bool {
    use std::net::IpAddr;

    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use std::collections::HashMap;
    use std::future::Future;
    use std::net::{IpAddr, SocketAddr};
    use std::time::Duration;

    use encoding_rs::Encoding;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::{Client, Response, redirect};
    use url::{Host, Url};

    use super::{PageFetcher, is_public_ip, validate_url};
    use crate::access::AccessFetcher;
    use crate::config::{AccessSettings, FetcherSettings};
    use crate::error::FetchError;

    /// reqwest-backed fetcher with SSRF protection.
    ///
    /// Redirects are followed by hand so every hop is re-validated, and
    /// requests to named hosts connect to the address that passed the check.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        user_agent: String,
        request_timeout: Duration,
        probe_timeout: Duration,
        max_response_size: usize,
        max_redirects: usize,
    }

    impl HttpFetcher {
        pub fn new(fetcher: &FetcherSettings, access: &AccessSettings) -> Result<Self, FetchError> {
            let fetcher = Self {
                user_agent: fetcher.user_agent.clone(),
                request_timeout: fetcher.request_timeout(),
                probe_timeout: access.probe_timeout(),
                max_response_size: fetcher.max_response_size,
                max_redirects: fetcher.max_redirects,
            };
            // surface TLS backend problems at construction time
            fetcher.client(fetcher.request_timeout, None)?;
            Ok(fetcher)
        }

        fn client(
            &self,
            timeout: Duration,
            pinned: Option<(&str, SocketAddr)>,
        ) -> Result<Client, FetchError> {
            let mut builder = Client::builder()
                .timeout(timeout)
                .user_agent(self.user_agent.clone())
                .redirect(redirect::Policy::none());
            if let Some((domain, addr)) = pinned {
                builder = builder.resolve(domain, addr);
            }
            builder.build().map_err(transport)
        }

        /// GET `url` following up to `max_redirects` validated redirects.
        async fn get(&self, timeout: Duration, url: &str) -> Result<(Url, Response), FetchError> {
            let mut current = validate_url(url)?;

            for _ in 0..=self.max_redirects {
                let checked = ensure_public(&current).await?;
                let client = match (current.host_str(), checked) {
                    (Some(domain), Some(addr)) => self.client(timeout, Some((domain, addr)))?,
                    _ => self.client(timeout, None)?,
                };
                let response = client
                    .get(current.clone())
                    .send()
                    .await
                    .map_err(transport)?;

                if !response.status().is_redirection() {
                    return Ok((current, response));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| FetchError::Status {
                        status: response.status().as_u16(),
                        url: current.to_string(),
                    })?;
                let next = current
                    .join(location)
                    .map_err(|_| FetchError::InvalidUrl(location.to_string()))?;
                tracing::debug!(from = %current, to = %next, "following redirect");
                current = validate_url(next.as_str())?;
            }

            Err(FetchError::TooManyRedirects(self.max_redirects))
        }

        async fn read_body(&self, mut response: Response) -> Result<String, FetchError> {
            let limit = self.max_response_size;
            if response.content_length().is_some_and(|len| len > limit as u64) {
                return Err(FetchError::TooLarge { limit });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await.map_err(transport)? {
                if body.len() + chunk.len() > limit {
                    return Err(FetchError::TooLarge { limit });
                }
                body.extend_from_slice(&chunk);
            }
            Ok(decode_body(&body, content_type.as_deref()))
        }
    }

    impl PageFetcher for HttpFetcher {
        fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send {
            async move {
                let (final_url, response) = self.get(self.request_timeout, url).await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url: final_url.to_string(),
                    });
                }
                let html = self.read_body(response).await?;
                tracing::debug!(url = %final_url, bytes = html.len(), "fetched page");
                Ok(html)
            }
        }
    }

    impl AccessFetcher for HttpFetcher {
        fn fetch_robots_txt(&self, origin: &str) -> impl Future<Output = (bool, String)> + Send {
            let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
            async move {
                let response = match self.get(self.probe_timeout, &robots_url).await {
                    Ok((_, response)) if response.status().as_u16() == 200 => response,
                    Ok((_, response)) => {
                        tracing::debug!(url = %robots_url, status = %response.status(), "robots.txt not available");
                        return (false, String::new());
                    }
                    Err(err) => {
                        tracing::debug!(url = %robots_url, error = %err, "robots.txt fetch failed");
                        return (false, String::new());
                    }
                };
                match self.read_body(response).await {
                    Ok(body) => (true, body),
                    Err(err) => {
                        tracing::debug!(url = %robots_url, error = %err, "robots.txt body unreadable");
                        (false, String::new())
                    }
                }
            }
        }

        fn fetch_headers(&self, url: &str) -> impl Future<Output = HashMap<String, String>> + Send {
            async move {
                match self.get(self.probe_timeout, url).await {
                    Ok((_, response)) => response
                        .headers()
                        .iter()
                        .filter_map(|(name, value)| {
                            value
                                .to_str()
                                .ok()
                                .map(|v| (name.as_str().to_string(), v.to_string()))
                        })
                        .collect(),
                    Err(err) => {
                        tracing::debug!(url, error = %err, "header probe failed");
                        HashMap::new()
                    }
                }
            }
        }
    }

    /// Decode with the `Content-Type` charset, lossy UTF-8 otherwise.
    pub(crate) fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
        let encoding = content_type
            .and_then(charset_label)
            .and_then(|label| Encoding::for_label(label.as_bytes()));

        match encoding {
            Some(encoding) => {
                let (text, _, had_errors) = encoding.decode(body);
                if had_errors {
                    tracing::debug!(charset = encoding.name(), "body has malformed sequences");
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(body).into_owned(),
        }
    }

    fn charset_label(content_type: &str) -> Option<&str> {
        content_type.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"'))
        })
    }

    /// Resolve the target host and refuse non-public addresses.
    ///
    /// Returns the address to connect to for named hosts; IP literals need
    /// no pinning.
    async fn ensure_public(url: &Url) -> Result<Option<SocketAddr>, FetchError> {
        let host_label = url.host_str().unwrap_or_default().to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        let (addrs, named): (Vec<IpAddr>, bool) = match url.host() {
            Some(Host::Ipv4(ip)) => (vec![ip.into()], false),
            Some(Host::Ipv6(ip)) => (vec![ip.into()], false),
            Some(Host::Domain(domain)) => {
                let resolved = tokio::net::lookup_host((domain, port))
                    .await
                    .map_err(|_| FetchError::Dns(domain.to_string()))?
                    .map(|addr| addr.ip())
                    .collect();
                (resolved, true)
            }
            None => return Err(FetchError::InvalidUrl(url.to_string())),
        };

        let Some(first) = addrs.first().copied() else {
            return Err(FetchError::Dns(host_label));
        };
        if let Some(addr) = addrs.into_iter().find(|ip| !is_public_ip(*ip)) {
            return Err(FetchError::Blocked {
                host: host_label,
                addr,
            });
        }
        Ok(named.then(|| SocketAddr::new(first, port)))
    }

    fn transport(err: reqwest::Error) -> FetchError {
        FetchError::Transport(err.to_string())
    }

}
