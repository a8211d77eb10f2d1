//! DNS-over-HTTPS (JSON API) implementation.
//!
//! Both Cloudflare and Google expose the same JSON dialect: a GET with
//! `name` and `type` query parameters and `Accept: application/dns-json`,
//! answered with `{"Status": <rcode>, "Answer": [...]}`. This module sends
//! one SOA query to one endpoint and interprets the answer. Trying several
//! endpoints is the checker's job.

use crate::error::DomainCheckError;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;

/// Media type of the JSON DoH dialect.
pub const DNS_JSON: &str = "application/dns-json";

/// DNS response code: no error.
pub const RCODE_NOERROR: u32 = 0;

/// DNS response code: the queried name does not exist.
pub const RCODE_NXDOMAIN: u32 = 3;

/// JSON body returned by a DoH resolver.
///
/// Only the fields the availability decision needs are modeled; the
/// resolvers also send `TC`, `RD`, `Question` and friends.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DohResponse {
    #[serde(rename = "Status")]
    pub status: u32,

    #[serde(rename = "Answer", default)]
    pub answer: Option<Vec<DohAnswer>>,
}

/// One resource record in a DoH answer section.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct DohAnswer {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub record_type: u16,

    #[serde(rename = "TTL", default)]
    pub ttl: Option<u32>,

    #[serde(default)]
    pub data: String,
}

/// What a single resolver's answer says about a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverVerdict {
    /// Records came back: the zone exists
    Registered { status: u32 },
    /// NOERROR without records, or NXDOMAIN
    Available { status: u32 },
    /// Any other response code; another resolver may do better
    Inconclusive { status: u32 },
}

impl ResolverVerdict {
    /// Whether this verdict ends the search across endpoints.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, ResolverVerdict::Inconclusive { .. })
    }

    pub fn status(&self) -> u32 {
        match *self {
            ResolverVerdict::Registered { status }
            | ResolverVerdict::Available { status }
            | ResolverVerdict::Inconclusive { status } => status,
        }
    }
}

impl DohResponse {
    /// Interpret the answer. A non-empty answer list wins over any status.
    pub fn verdict(&self) -> ResolverVerdict {
        let has_answer = self.answer.as_ref().is_some_and(|a| !a.is_empty());
        if has_answer {
            return ResolverVerdict::Registered {
                status: self.status,
            };
        }

        match self.status {
            RCODE_NOERROR | RCODE_NXDOMAIN => ResolverVerdict::Available {
                status: self.status,
            },
            status => ResolverVerdict::Inconclusive { status },
        }
    }
}

/// Human-readable name of a DNS response code, for log lines.
pub fn rcode_name(status: u32) -> &'static str {
    match status {
        0 => "NOERROR",
        1 => "FORMERR",
        2 => "SERVFAIL",
        3 => "NXDOMAIN",
        4 => "NOTIMP",
        5 => "REFUSED",
        _ => "UNKNOWN",
    }
}

/// Client for querying DoH JSON endpoints.
#[derive(Clone)]
pub struct DohClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl DohClient {
    /// Create a new client with a 3 second per-request timeout.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_timeout(Duration::from_secs(3))
    }

    /// Create a new client whose requests are cut off after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("doh-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DomainCheckError::network_with_source(
                    "Failed to create DoH HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Per-request timeout applied by the HTTP client.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one SOA query for `domain` to `endpoint` and interpret the answer.
    ///
    /// `domain` is sent as given; normalization is the caller's job.
    ///
    /// # Errors
    ///
    /// - `InvalidDomain` for an empty name or one containing whitespace
    /// - `NetworkError` / `Timeout` when the request cannot be completed
    /// - `ResolverError` when the HTTP status is not 2xx
    /// - `ParseError` when the body is not DoH JSON
    pub async fn query(
        &self,
        endpoint: &str,
        domain: &str,
    ) -> Result<ResolverVerdict, DomainCheckError> {
        if domain.is_empty() {
            return Err(DomainCheckError::invalid_domain(domain, "name is empty"));
        }
        if domain.contains(char::is_whitespace) {
            return Err(DomainCheckError::invalid_domain(
                domain,
                "name contains whitespace",
            ));
        }

        tracing::debug!(endpoint, domain, "sending SOA query");

        let response = self
            .http_client
            .get(endpoint)
            .query(&[("name", domain), ("type", "SOA")])
            .header(ACCEPT, DNS_JSON)
            .send()
            .await
            .map_err(|e| self.request_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainCheckError::resolver_with_status(
                endpoint,
                format!("HTTP status {}", status),
                status.as_u16(),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(endpoint, e))?;
        let parsed: DohResponse = serde_json::from_str(&body).map_err(|e| {
            DomainCheckError::parse(
                format!("Invalid DoH JSON from {}: {}", endpoint, e),
                Some(body.clone()),
            )
        })?;

        let verdict = parsed.verdict();
        tracing::debug!(
            endpoint,
            domain,
            rcode = rcode_name(verdict.status()),
            answers = parsed.answer.as_ref().map_or(0, Vec::len),
            "resolver answered"
        );

        Ok(verdict)
    }

    fn request_error(&self, endpoint: &str, err: reqwest::Error) -> DomainCheckError {
        if err.is_timeout() {
            DomainCheckError::timeout(format!("HTTP request to {}", endpoint), self.timeout)
        } else {
            err.into()
        }
    }
}
