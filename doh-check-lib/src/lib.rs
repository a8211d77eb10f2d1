//! # doh-check Library
//!
//! Heuristic domain availability probing over public DNS-over-HTTPS resolvers.
//!
//! A domain is queried for its SOA record, first at Cloudflare and then at
//! Google. Records in the answer mean the zone exists (registered);
//! NOERROR without records or NXDOMAIN means it probably does not
//! (available). Anything else, including every kind of failure, is reported
//! as "not available" so that a hiccup never suggests a taken name is free.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doh_check_lib::{export_domains, validate_domain, DomainChecker, DomainStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let candidates: Vec<String> = ["example.com", "my-new-idea.dev", "not a domain"]
//!         .iter()
//!         .map(|s| s.to_string())
//!         .filter(|d| validate_domain(d))
//!         .collect();
//!
//!     let checker = DomainChecker::new()?;
//!     let results = checker.process_domain_batch(&candidates, 5000).await;
//!
//!     println!("{}", export_domains(&results.to_export_records(), DomainStatus::Available));
//!     Ok(())
//! }
//! ```
//!
//! This is a best-effort probe, not a registrar lookup: a domain can be
//! registered without any DNS zone and will then look available.

pub use checker::DomainChecker;
pub use config::{
    load_env_config, parse_duration_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    ResolversConfig,
};
pub use error::DomainCheckError;
pub use export::export_domains;
pub use protocols::{rcode_name, DohAnswer, DohClient, DohResponse, ResolverVerdict};
pub use types::{
    BatchResults, CheckConfig, DomainResult, DomainStatus, ExportRecord, CLOUDFLARE_DOH_ENDPOINT,
    DEFAULT_BATCH_DELAY, GOOGLE_DOH_ENDPOINT,
};
pub use utils::{expand_domain_inputs, normalize_domain, validate_domain};

mod checker;
mod config;
mod error;
mod export;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Probe one domain with the default resolvers.
///
/// Convenience wrapper around [`DomainChecker::check_domain_availability`].
/// Returns `false` if the checker cannot even be constructed.
pub async fn check_domain_availability(domain: &str) -> bool {
    match DomainChecker::new() {
        Ok(checker) => checker.check_domain_availability(domain).await,
        Err(e) => {
            tracing::error!(error = %e, "could not create domain checker");
            false
        }
    }
}

/// Probe a list of domains with the default resolvers and pacing.
///
/// Convenience wrapper around [`DomainChecker::process_domain_batch`]. If the
/// checker cannot be constructed every domain is recorded as `false`.
pub async fn process_domain_batch(domains: &[String], timeout_ms: u64) -> BatchResults {
    match DomainChecker::new() {
        Ok(checker) => checker.process_domain_batch(domains, timeout_ms).await,
        Err(e) => {
            tracing::error!(error = %e, "could not create domain checker");
            let mut results = BatchResults::with_capacity(domains.len());
            for domain in domains {
                results.insert(domain.clone(), false);
            }
            results
        }
    }
}
