//! Error handling for DNS-over-HTTPS probing.
//!
//! These errors travel between the transport layer, the prober and the
//! configuration loader. The boolean availability API never returns them:
//! the prober logs each one and falls back to "not available".

use std::fmt;
use std::time::Duration;

/// Main error type for probing and configuration operations.
#[derive(Debug, Clone)]
pub enum DomainCheckError {
    /// Invalid domain name format
    InvalidDomain { domain: String, reason: String },

    /// Connection failures, DNS failures for the resolver host, TLS errors
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The resolver answered, but not with something we can use
    /// (non-2xx HTTP status, or a DNS status that is neither NOERROR nor NXDOMAIN)
    ResolverError {
        endpoint: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Response body was not valid DoH JSON
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, bad TOML, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration or domain lists
    FileError { path: String, message: String },

    /// A request or probe exceeded its deadline
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Anything that doesn't fit the categories above
    Internal { message: String },
}

impl DomainCheckError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new resolver error.
    pub fn resolver<E: Into<String>, M: Into<String>>(endpoint: E, message: M) -> Self {
        Self::ResolverError {
            endpoint: endpoint.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new resolver error carrying the HTTP status code.
    pub fn resolver_with_status<E: Into<String>, M: Into<String>>(
        endpoint: E,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::ResolverError {
            endpoint: endpoint.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new parse error, keeping a prefix of the offending body.
    pub fn parse<M: Into<String>>(message: M, content: Option<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            content: content.map(|c| c.chars().take(256).collect()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether trying the next resolver could plausibly succeed.
    ///
    /// Invalid input and configuration problems will fail identically on
    /// every endpoint; everything else is resolver-specific.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidDomain { .. } | Self::ConfigError { .. } | Self::FileError { .. }
        )
    }
}

impl fmt::Display for DomainCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::ResolverError {
                endpoint,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "Resolver error from {} (HTTP {}): {}", endpoint, code, message)
                } else {
                    write!(f, "Resolver error from {}: {}", endpoint, message)
                }
            }
            Self::ParseError { message, .. } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DomainCheckError {}

impl From<reqwest::Error> for DomainCheckError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| format!("{}{}", u.host_str().unwrap_or_default(), u.path()))
            .unwrap_or_else(|| "unknown endpoint".to_string());

        if err.is_timeout() {
            Self::network_with_source(format!("Request to {} timed out", endpoint), err.to_string())
        } else if err.is_connect() {
            Self::network_with_source(format!("Connection to {} failed", endpoint), err.to_string())
        } else if err.is_decode() {
            Self::parse(format!("Undecodable body from {}: {}", endpoint, err), None)
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for DomainCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err), None)
    }
}

impl From<std::io::Error> for DomainCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for DomainCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_resolver_error_with_status() {
        let err = DomainCheckError::resolver_with_status("dns.google/resolve", "bad gateway", 502);
        assert_eq!(
            err.to_string(),
            "Resolver error from dns.google/resolve (HTTP 502): bad gateway"
        );
    }

    #[test]
    fn test_parse_error_truncates_content() {
        let body = "x".repeat(1000);
        match DomainCheckError::parse("bad json", Some(body)) {
            DomainCheckError::ParseError { content, .. } => {
                assert_eq!(content.map(|c| c.len()), Some(256));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(DomainCheckError::network("refused").is_retryable());
        assert!(DomainCheckError::timeout("probe", Duration::from_secs(1)).is_retryable());
        assert!(DomainCheckError::resolver("a", "SERVFAIL").is_retryable());
        assert!(!DomainCheckError::invalid_domain("", "empty").is_retryable());
        assert!(!DomainCheckError::config("no endpoints").is_retryable());
    }
}
