//! Main domain checker implementation.
//!
//! `DomainChecker` owns the resolver list and the HTTP client, walks the
//! endpoints for a single domain, and drives sequential, paced batches.

use crate::error::DomainCheckError;
use crate::protocols::{rcode_name, DohClient, ResolverVerdict};
use crate::types::{BatchResults, CheckConfig, DomainResult};
use crate::utils::normalize_domain;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Probes domains against a prioritized list of DoH resolvers.
///
/// Every failure mode collapses to `available == false`: a resolver outage,
/// a malformed body or an exceeded deadline all read as "probably taken".
///
/// # Example
///
/// ```rust,no_run
/// use doh_check_lib::DomainChecker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new()?;
///     let available = checker.check_domain_availability("example.com").await;
///     println!("example.com available: {}", available);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    config: CheckConfig,
    doh_client: DohClient,
}

impl DomainChecker {
    /// Create a checker using Cloudflare then Google, with default timeouts.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use doh_check_lib::{CheckConfig, DomainChecker};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_delay(Duration::from_millis(250))
    ///     .with_request_timeout(Duration::from_secs(2));
    ///
    /// let checker = DomainChecker::with_config(config).unwrap();
    /// assert_eq!(checker.config().delay, Duration::from_millis(250));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unusable configuration and `NetworkError`
    /// if the HTTP client cannot be built.
    pub fn with_config(config: CheckConfig) -> Result<Self, DomainCheckError> {
        config.validate()?;
        let doh_client = DohClient::with_timeout(config.request_timeout)?;

        Ok(Self { config, doh_client })
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Probe one domain and report whether it looks available.
    ///
    /// `true` only when a resolver answered NOERROR without records or
    /// NXDOMAIN; `false` for existing records and for anything inconclusive.
    pub async fn check_domain_availability(&self, domain: &str) -> bool {
        self.check_domain(domain).await.available
    }

    /// Probe one domain and return the full result.
    ///
    /// The domain is trimmed and lowercased, then each endpoint is queried in
    /// order until one gives a decisive answer. No deadline is applied beyond
    /// the per-request HTTP timeout; batch callers add one.
    pub async fn check_domain(&self, domain: &str) -> DomainResult {
        self.check_domain_within(domain, None).await
    }

    /// Endpoint walk shared by single checks and deadline-guarded probes.
    ///
    /// With a deadline, each endpoint gets an equal share of the time left,
    /// so a hanging resolver cannot starve the ones after it.
    async fn check_domain_within(&self, domain: &str, deadline: Option<Duration>) -> DomainResult {
        let start_time = Instant::now();
        let domain = normalize_domain(domain);
        let endpoints = &self.config.endpoints;

        let mut last_error: Option<String> = None;

        for (index, endpoint) in endpoints.iter().enumerate() {
            let budget = deadline.map(|deadline| {
                let remaining = deadline.saturating_sub(start_time.elapsed());
                remaining / (endpoints.len() - index) as u32
            });

            match self.query_endpoint(endpoint, &domain, budget).await {
                Ok(verdict) if verdict.is_decisive() => {
                    let available = matches!(verdict, ResolverVerdict::Available { .. });
                    debug!(
                        domain = %domain,
                        endpoint = %endpoint,
                        available,
                        "decisive answer"
                    );

                    return DomainResult {
                        domain,
                        available,
                        resolver: Some(endpoint.clone()),
                        dns_status: Some(verdict.status()),
                        check_duration: Some(start_time.elapsed()),
                        error_message: None,
                    };
                }
                Ok(verdict) => {
                    let rcode = rcode_name(verdict.status());
                    warn!(
                        domain = %domain,
                        endpoint = %endpoint,
                        rcode,
                        "inconclusive answer, trying next resolver"
                    );
                    last_error = Some(format!("{} answered {}", endpoint, rcode));
                }
                Err(e) if !e.is_retryable() => {
                    warn!(domain = %domain, error = %e, "not querying any resolver");
                    last_error = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!(
                        domain = %domain,
                        endpoint = %endpoint,
                        error = %e,
                        "resolver query failed, trying next resolver"
                    );
                    last_error = Some(e.to_string());
                }
            }
        }

        warn!(domain = %domain, "no resolver gave a decisive answer, assuming registered");

        DomainResult {
            check_duration: Some(start_time.elapsed()),
            ..DomainResult::inconclusive(domain, last_error)
        }
    }

    /// Query one endpoint, cutting the request short when `budget` is
    /// tighter than the client's own timeout.
    async fn query_endpoint(
        &self,
        endpoint: &str,
        domain: &str,
        budget: Option<Duration>,
    ) -> Result<ResolverVerdict, DomainCheckError> {
        match budget {
            Some(budget) if budget < self.doh_client.timeout() => {
                tokio::time::timeout(budget, self.doh_client.query(endpoint, domain))
                    .await
                    .unwrap_or_else(|_| {
                        Err(DomainCheckError::timeout(
                            format!("HTTP request to {}", endpoint),
                            budget,
                        ))
                    })
            }
            _ => self.doh_client.query(endpoint, domain).await,
        }
    }

    /// Probe every domain in order and collect a domain -> availability map.
    ///
    /// Domains are probed one at a time; each probe must finish within
    /// `timeout_ms` or it is cancelled and recorded as `false`. The checker's
    /// pacing delay is observed between consecutive probes. A failing domain
    /// never stops the batch, so every distinct input ends up in the map,
    /// keyed by the input string as given.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use doh_check_lib::DomainChecker;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let checker = DomainChecker::new()?;
    ///     let domains = vec!["example.com".to_string(), "example.org".to_string()];
    ///     let results = checker.process_domain_batch(&domains, 5000).await;
    ///
    ///     for (domain, available) in results.iter() {
    ///         println!("{}: {}", domain, available);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn process_domain_batch(&self, domains: &[String], timeout_ms: u64) -> BatchResults {
        let deadline = Duration::from_millis(timeout_ms);
        info!(count = domains.len(), timeout_ms, "starting batch");

        let start_time = Instant::now();
        let mut results = BatchResults::with_capacity(domains.len());
        let mut stream = Box::pin(self.paced_stream(domains.to_vec(), deadline));

        while let Some((input, result)) = stream.next().await {
            if results.insert(input, result.available).is_some() {
                debug!(domain = %result.domain, "duplicate input, keeping latest result");
            }
        }

        info!(
            count = results.len(),
            available = results.available_count(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "batch finished"
        );

        results
    }

    /// Probe domains sequentially and yield each result as it completes.
    ///
    /// Same pacing, deadline (the configured `timeout`) and failure isolation
    /// as [`DomainChecker::process_domain_batch`], for callers that want to
    /// show progress.
    pub fn check_domains_stream(
        &self,
        domains: &[String],
    ) -> Pin<Box<dyn Stream<Item = DomainResult> + Send + '_>> {
        let stream = self
            .paced_stream(domains.to_vec(), self.config.timeout)
            .map(|(_, result)| result);

        Box::pin(stream)
    }

    /// One probe at a time, sleeping `delay` between probes.
    fn paced_stream(
        &self,
        domains: Vec<String>,
        deadline: Duration,
    ) -> impl Stream<Item = (String, DomainResult)> + Send + '_ {
        let delay = self.config.delay;

        stream::iter(domains.into_iter().enumerate()).then(move |(position, domain)| async move {
            if position > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = self.probe_with_deadline(&domain, deadline).await;
            (domain, result)
        })
    }

    /// Run one probe on its own task under a deadline.
    ///
    /// Endpoint requests are budgeted to fit inside the deadline; the task is
    /// still aborted if it overruns. A panicking probe is contained by the
    /// task boundary.
    async fn probe_with_deadline(&self, domain: &str, deadline: Duration) -> DomainResult {
        let checker = self.clone();
        let owned = domain.to_string();
        let mut handle =
            tokio::spawn(async move { checker.check_domain_within(&owned, Some(deadline)).await });

        match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let error = DomainCheckError::internal(format!("probe task failed: {}", join_error));
                warn!(domain, error = %error, "probe aborted, assuming registered");
                DomainResult::inconclusive(normalize_domain(domain), Some(error.to_string()))
            }
            Err(_) => {
                handle.abort();
                let error = DomainCheckError::timeout(format!("probe of {}", domain), deadline);
                warn!(domain, error = %error, "probe timed out, assuming registered");
                DomainResult {
                    check_duration: Some(deadline),
                    ..DomainResult::inconclusive(normalize_domain(domain), Some(error.to_string()))
                }
            }
        }
    }
}
