//! Protocol implementations for domain probing.
//!
//! Currently a single protocol: SOA lookups over the DNS-over-HTTPS JSON API.

/// DNS-over-HTTPS JSON client and answer interpretation
pub mod doh;

pub use doh::{rcode_name, DohAnswer, DohClient, DohResponse, ResolverVerdict};
