//! Utility functions for domain processing and validation.
//!
//! Syntactic checks only; nothing here touches the network.

use regex::Regex;

lazy_static::lazy_static! {
    // Second-level label of 3-63 chars without leading/trailing hyphen, then an alphabetic TLD.
    static ref DOMAIN_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9]\.[a-zA-Z]{2,}$")
            .expect("domain regex is valid");
}

/// Validate a domain name format.
///
/// Accepts exactly `label.tld`: the label is 3 to 63 ASCII alphanumeric or
/// hyphen characters and may not start or end with a hyphen, the TLD is at
/// least two ASCII letters. Input is not trimmed or lowercased first.
///
/// # Examples
///
/// ```rust
/// use doh_check_lib::validate_domain;
///
/// assert!(validate_domain("example.com"));
/// assert!(!validate_domain("sub.example.com"));
/// assert!(!validate_domain("ab.c"));
/// ```
pub fn validate_domain(domain: &str) -> bool {
    DOMAIN_RE.is_match(domain)
}

/// Trim surrounding whitespace and lowercase, as done before every query.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

/// Expand domain inputs based on smart detection rules.
///
/// - Inputs with a dot are passed through as FQDNs
/// - Inputs without a dot get one entry per TLD (defaults to `com`)
/// - Empty inputs and base names that cannot form a label are dropped
///
/// Nothing is validated here beyond that; callers run [`validate_domain`]
/// on the output so they can report what was rejected.
pub fn expand_domain_inputs(domains: &[String], tlds: &Option<Vec<String>>) -> Vec<String> {
    let mut results = Vec::new();

    for domain in domains {
        let trimmed = domain.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.contains('.') {
            results.push(trimmed.to_string());
            continue;
        }

        if !is_valid_base_name(trimmed) {
            continue;
        }

        match tlds {
            Some(tld_list) => {
                for tld in tld_list {
                    let tld_clean = tld.trim().trim_start_matches('.');
                    if !tld_clean.is_empty() {
                        results.push(format!("{}.{}", trimmed, tld_clean));
                    }
                }
            }
            None => results.push(format!("{}.com", trimmed)),
        }
    }

    results
}

/// Validate that a base domain name (without TLD) is acceptable.
pub(crate) fn is_valid_base_name(domain: &str) -> bool {
    if domain.len() < 2 {
        return false;
    }

    if domain.starts_with('-') || domain.ends_with('-') {
        return false;
    }

    domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain_accepts_well_formed() {
        assert!(validate_domain("example.com"));
        assert!(validate_domain("abc.io"));
        assert!(validate_domain("my-startup.dev"));
        assert!(validate_domain("123.org"));
        assert!(validate_domain("Example.COM"));
        assert!(validate_domain(&format!("{}.net", "a".repeat(63))));
    }

    #[test]
    fn test_validate_domain_rejects_malformed() {
        assert!(!validate_domain(""));
        assert!(!validate_domain("example"));
        assert!(!validate_domain("example.c"));
        assert!(!validate_domain("ab.com")); // label too short
        assert!(!validate_domain(&format!("{}.net", "a".repeat(64))));
        assert!(!validate_domain("-example.com"));
        assert!(!validate_domain("example-.com"));
        assert!(!validate_domain("example.c0m"));
        assert!(!validate_domain("sub.example.com"));
        assert!(!validate_domain(" example.com"));
        assert!(!validate_domain("exa_mple.com"));
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("  Example.COM\n"), "example.com");
    }

    #[test]
    fn test_expand_domain_inputs() {
        let domains = vec!["example".to_string(), "test.com".to_string()];
        let tlds = Some(vec!["com".to_string(), ".org".to_string()]);

        let result = expand_domain_inputs(&domains, &tlds);
        assert_eq!(result, vec!["example.com", "example.org", "test.com"]);
    }

    #[test]
    fn test_expand_domain_inputs_defaults_to_com() {
        let domains = vec!["".to_string(), "a".to_string(), "valid".to_string()];
        assert_eq!(expand_domain_inputs(&domains, &None), vec!["valid.com"]);
    }

    #[test]
    fn test_is_valid_base_name() {
        assert!(is_valid_base_name("example"));
        assert!(is_valid_base_name("test-domain"));
        assert!(!is_valid_base_name("a"));
        assert!(!is_valid_base_name("-example"));
        assert!(!is_valid_base_name("test.com"));
    }
}
