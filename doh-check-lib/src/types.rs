//! Core data types for domain availability probing.
//!
//! This module defines the configuration, the per-domain result, the batch
//! result mapping and the export record types shared by the library and CLI.

use crate::error::DomainCheckError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Cloudflare's JSON DoH endpoint, queried first.
pub const CLOUDFLARE_DOH_ENDPOINT: &str = "https://cloudflare-dns.com/dns-query";

/// Google's JSON DoH endpoint, queried when Cloudflare gives no decisive answer.
pub const GOOGLE_DOH_ENDPOINT: &str = "https://dns.google/resolve";

/// Pause between two consecutive probes in a batch.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

/// Result of probing a single domain.
///
/// `available` follows the conservative policy: it is only `true` when a
/// resolver gave a decisive "no such zone" answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainResult {
    /// The normalized domain name that was probed (e.g., "example.com")
    pub domain: String,

    /// Whether the domain is probably available for registration
    pub available: bool,

    /// Endpoint that produced the deciding answer, if any did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,

    /// DNS response code from the deciding answer (0 = NOERROR, 3 = NXDOMAIN)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_status: Option<u32>,

    /// How long the probe took to complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_duration: Option<Duration>,

    /// Last error seen when no resolver was decisive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DomainResult {
    /// A "not available" result produced because nothing decisive came back.
    pub fn inconclusive<D: Into<String>>(domain: D, error_message: Option<String>) -> Self {
        Self {
            domain: domain.into(),
            available: false,
            resolver: None,
            dns_status: None,
            check_duration: None,
            error_message,
        }
    }

    /// Whether a resolver actually decided this result.
    pub fn is_decisive(&self) -> bool {
        self.resolver.is_some()
    }
}

/// Configuration options for probing.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// DoH JSON endpoints, tried in order until one is decisive
    /// Default: Cloudflare, then Google
    pub endpoints: Vec<String>,

    /// Deadline for a whole probe of one domain (all endpoints together)
    /// Default: 5 seconds
    pub timeout: Duration,

    /// Timeout applied to each individual HTTP request
    /// Default: 3 seconds
    pub request_timeout: Duration,

    /// Pause after each domain in a batch
    /// Default: 500 milliseconds
    pub delay: Duration,

    /// TLDs used to expand base names without a dot
    /// If None, defaults to ["com"]
    pub tlds: Option<Vec<String>>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                CLOUDFLARE_DOH_ENDPOINT.to_string(),
                GOOGLE_DOH_ENDPOINT.to_string(),
            ],
            timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(3),
            delay: DEFAULT_BATCH_DELAY,
            tlds: None,
        }
    }
}

impl CheckConfig {
    /// Replace the resolver endpoints. Order is priority order.
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the per-domain probe deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the pause between consecutive probes in a batch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set TLDs to expand base names with.
    pub fn with_tlds(mut self, tlds: Vec<String>) -> Self {
        self.tlds = Some(tlds);
        self
    }

    /// Check the configuration for values that would make every probe fail.
    pub fn validate(&self) -> Result<(), DomainCheckError> {
        if self.endpoints.is_empty() {
            return Err(DomainCheckError::config(
                "At least one DoH endpoint must be configured",
            ));
        }

        for endpoint in &self.endpoints {
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(DomainCheckError::config(format!(
                    "DoH endpoint '{}' must be an http(s) URL",
                    endpoint
                )));
            }
        }

        if self.timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(DomainCheckError::config("Timeouts must be greater than zero"));
        }

        Ok(())
    }
}

/// Availability label attached to an export record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Available,
    Registered,
}

impl DomainStatus {
    /// Map a boolean availability result to its label.
    pub fn from_available(available: bool) -> Self {
        if available {
            DomainStatus::Available
        } else {
            DomainStatus::Registered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Available => "available",
            DomainStatus::Registered => "registered",
        }
    }
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainStatus {
    type Err = DomainCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(DomainStatus::Available),
            "registered" => Ok(DomainStatus::Registered),
            other => Err(DomainCheckError::config(format!(
                "Unknown status '{}', expected 'available' or 'registered'",
                other
            ))),
        }
    }
}

/// A domain paired with its status label, as consumed by the exporter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportRecord {
    pub domain: String,
    pub status: DomainStatus,
}

impl ExportRecord {
    pub fn new<D: Into<String>>(domain: D, status: DomainStatus) -> Self {
        Self {
            domain: domain.into(),
            status,
        }
    }
}

/// Mapping from domain name to availability, in first-insertion order.
///
/// Inserting a domain that is already present overwrites its value in place,
/// so a repeated input keeps its original position but reports the latest probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    entries: Vec<(String, bool)>,
    index: HashMap<String, usize>,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Record a result, returning the previous value for this domain if any.
    pub fn insert<D: Into<String>>(&mut self, domain: D, available: bool) -> Option<bool> {
        let domain = domain.into();
        match self.index.get(&domain) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, available)),
            None => {
                self.index.insert(domain.clone(), self.entries.len());
                self.entries.push((domain, available));
                None
            }
        }
    }

    pub fn get(&self, domain: &str) -> Option<bool> {
        self.index.get(domain).map(|&pos| self.entries[pos].1)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.index.contains_key(domain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.entries.iter().map(|(d, a)| (d.as_str(), *a))
    }

    /// Domains reported as probably available, in order.
    pub fn available(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().filter(|(_, a)| *a).map(|(d, _)| d)
    }

    /// Number of domains reported as probably available.
    pub fn available_count(&self) -> usize {
        self.available().count()
    }

    /// Convert into records suitable for [`crate::export_domains`].
    pub fn to_export_records(&self) -> Vec<ExportRecord> {
        self.iter()
            .map(|(domain, available)| {
                ExportRecord::new(domain, DomainStatus::from_available(available))
            })
            .collect()
    }
}

impl IntoIterator for BatchResults {
    type Item = (String, bool);
    type IntoIter = std::vec::IntoIter<(String, bool)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for BatchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (domain, available) in &self.entries {
            map.serialize_entry(domain, available)?;
        }
        map.end()
    }
}
