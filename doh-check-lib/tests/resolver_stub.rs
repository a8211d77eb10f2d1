// doh-check-lib/tests/resolver_stub.rs

//! Prober and batch behaviour against in-process stub DoH resolvers.
//!
//! Each stub is a tiny HTTP/1.1 server on 127.0.0.1 that answers every
//! request with one canned reply, so these tests never leave the machine.

use doh_check_lib::{CheckConfig, DomainChecker};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const REGISTERED: &str = r#"{"Status":0,"TC":false,"RD":true,"RA":true,
    "Question":[{"name":"example.com.","type":6}],
    "Answer":[{"name":"example.com.","type":6,"TTL":3600,
    "data":"ns.icann.org. noc.dns.icann.org. 2024081464 7200 3600 1209600 3600"}]}"#;
const NXDOMAIN: &str = r#"{"Status":3,"TC":false,"Question":[{"name":"definitely-not-registered-xyz123.com.","type":6}]}"#;
const NOERROR_EMPTY: &str = r#"{"Status":0,"TC":false}"#;
const SERVFAIL: &str = r#"{"Status":2,"TC":false}"#;

#[derive(Clone)]
struct Reply {
    http_status: u16,
    body: &'static str,
    delay: Duration,
}

impl Reply {
    fn json(body: &'static str) -> Self {
        Self {
            http_status: 200,
            body,
            delay: Duration::ZERO,
        }
    }

    fn http_error(http_status: u16) -> Self {
        Self {
            http_status,
            body: "upstream unavailable",
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct StubResolver {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubResolver {
    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/dns-query", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let reply = reply.clone();
                let seen = seen.clone();

                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        let n = socket.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    seen.lock().unwrap().push(String::from_utf8_lossy(&buf).into_owned());

                    tokio::time::sleep(reply.delay).await;

                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/dns-json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        reply.http_status,
                        reply.body.len(),
                        reply.body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { url, requests }
    }

    fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> String {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

/// An endpoint URL nothing is listening on.
async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/dns-query", addr)
}

fn checker_for(endpoints: Vec<String>) -> DomainChecker {
    let config = CheckConfig::default()
        .with_endpoints(endpoints)
        .with_request_timeout(Duration::from_secs(10))
        .with_delay(Duration::ZERO);
    DomainChecker::with_config(config).unwrap()
}

#[tokio::test]
async fn test_soa_answer_means_registered_and_short_circuits() {
    let primary = StubResolver::start(Reply::json(REGISTERED)).await;
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone(), secondary.url.clone()]);

    assert!(!checker.check_domain_availability("example.com").await);
    assert_eq!(primary.hits(), 1);
    assert_eq!(secondary.hits(), 0, "decisive answer must stop the search");
}

#[tokio::test]
async fn test_nxdomain_means_available() {
    let primary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone()]);

    let result = checker
        .check_domain("definitely-not-registered-xyz123.com")
        .await;
    assert!(result.available);
    assert_eq!(result.dns_status, Some(3));
    assert_eq!(result.resolver.as_deref(), Some(primary.url.as_str()));
}

#[tokio::test]
async fn test_noerror_without_answer_means_available() {
    let primary = StubResolver::start(Reply::json(NOERROR_EMPTY)).await;
    let checker = checker_for(vec![primary.url.clone()]);

    assert!(checker.check_domain_availability("quiet-zone.com").await);
}

#[tokio::test]
async fn test_request_shape() {
    let primary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone()]);

    checker.check_domain_availability("  Example.COM \n").await;

    let request = primary.last_request();
    let request_line = request.lines().next().unwrap_or_default();
    assert!(
        request_line.starts_with("GET /dns-query?name=example.com&type=SOA "),
        "unexpected request line: {}",
        request_line
    );
    assert!(request
        .to_lowercase()
        .contains("accept: application/dns-json"));
}

#[tokio::test]
async fn test_falls_back_after_http_error() {
    let primary = StubResolver::start(Reply::http_error(503)).await;
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone(), secondary.url.clone()]);

    let result = checker.check_domain("fallback-works.com").await;
    assert!(result.available);
    assert_eq!(result.resolver.as_deref(), Some(secondary.url.as_str()));
    assert_eq!(primary.hits(), 1);
    assert_eq!(secondary.hits(), 1);
}

#[tokio::test]
async fn test_falls_back_after_connection_failure() {
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![closed_endpoint().await, secondary.url.clone()]);

    assert!(checker.check_domain_availability("fallback-works.com").await);
}

#[tokio::test]
async fn test_falls_back_after_malformed_body() {
    let primary = StubResolver::start(Reply::json("<html>definitely not json</html>")).await;
    let secondary = StubResolver::start(Reply::json(REGISTERED)).await;
    let checker = checker_for(vec![primary.url.clone(), secondary.url.clone()]);

    let result = checker.check_domain("example.com").await;
    assert!(!result.available);
    assert!(result.is_decisive());
    assert_eq!(result.resolver.as_deref(), Some(secondary.url.as_str()));
}

#[tokio::test]
async fn test_servfail_falls_through_to_next_resolver() {
    let primary = StubResolver::start(Reply::json(SERVFAIL)).await;
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone(), secondary.url.clone()]);

    assert!(checker.check_domain_availability("flaky-zone.com").await);
    assert_eq!(secondary.hits(), 1);
}

#[tokio::test]
async fn test_both_resolvers_failing_means_registered() {
    let primary = StubResolver::start(Reply::http_error(500)).await;
    let secondary = StubResolver::start(Reply::json(SERVFAIL)).await;
    let checker = checker_for(vec![primary.url.clone(), secondary.url.clone()]);

    let result = checker.check_domain("unknowable.com").await;
    assert!(!result.available);
    assert!(!result.is_decisive());
    assert!(result.error_message.unwrap().contains("SERVFAIL"));
}

#[tokio::test]
async fn test_both_resolvers_unreachable_means_registered() {
    let checker = checker_for(vec![closed_endpoint().await, closed_endpoint().await]);
    assert!(!checker.check_domain_availability("offline.com").await);
}

#[tokio::test]
async fn test_batch_has_one_entry_per_domain_in_order() {
    let primary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone()]);
    let domains = vec!["b-first.com".to_string(), "a-second.com".to_string()];

    let results = checker.process_domain_batch(&domains, 1000).await;

    let entries: Vec<(&str, bool)> = results.iter().collect();
    assert_eq!(entries, vec![("b-first.com", true), ("a-second.com", true)]);
    assert_eq!(primary.hits(), 2);
}

#[tokio::test]
async fn test_batch_deadline_cancels_slow_probe_and_continues() {
    let slow = StubResolver::start(Reply::json(NXDOMAIN).delayed(Duration::from_secs(5))).await;
    let checker = checker_for(vec![slow.url.clone()]);
    let domains = vec!["slow-one.com".to_string(), "slow-two.com".to_string()];

    let start = Instant::now();
    let results = checker.process_domain_batch(&domains, 200).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results.get("slow-one.com"), Some(false));
    assert_eq!(results.get("slow-two.com"), Some(false));
    assert!(
        start.elapsed() < Duration::from_secs(4),
        "deadline was not enforced: {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_batch_deadline_leaves_room_for_fallback() {
    let hanging = StubResolver::start(Reply::json(REGISTERED).delayed(Duration::from_secs(30))).await;
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let config = CheckConfig::default()
        .with_endpoints(vec![hanging.url.clone(), secondary.url.clone()])
        .with_delay(Duration::ZERO);
    let checker = DomainChecker::with_config(config).unwrap();

    let start = Instant::now();
    let results = checker
        .process_domain_batch(&["fallback-works.com".to_string()], 1000)
        .await;

    assert_eq!(results.get("fallback-works.com"), Some(true));
    assert_eq!(hanging.hits(), 1);
    assert_eq!(secondary.hits(), 1);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_stream_deadline_leaves_room_for_fallback() {
    let hanging = StubResolver::start(Reply::json(REGISTERED).delayed(Duration::from_secs(30))).await;
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let config = CheckConfig::default()
        .with_endpoints(vec![hanging.url.clone(), secondary.url.clone()])
        .with_timeout(Duration::from_millis(600))
        .with_delay(Duration::ZERO);
    let checker = DomainChecker::with_config(config).unwrap();

    let domains = vec!["streamed-fallback.com".to_string()];
    let results: Vec<_> = checker.check_domains_stream(&domains).collect().await;

    assert_eq!(results.len(), 1);
    assert!(results[0].available);
    assert_eq!(results[0].resolver.as_deref(), Some(secondary.url.as_str()));
}

#[tokio::test]
async fn test_request_timeout_is_reported_with_its_duration() {
    let slow = StubResolver::start(Reply::json(NXDOMAIN).delayed(Duration::from_secs(2))).await;
    let config = CheckConfig::default()
        .with_endpoints(vec![slow.url.clone()])
        .with_request_timeout(Duration::from_millis(200))
        .with_delay(Duration::ZERO);
    let checker = DomainChecker::with_config(config).unwrap();

    let result = checker.check_domain("slow-answer.com").await;

    assert!(!result.available);
    let message = result.error_message.unwrap();
    assert!(message.starts_with("Timeout after 200ms"), "{}", message);
}

#[tokio::test]
async fn test_unusable_name_stops_before_any_resolver() {
    let primary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let secondary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let checker = checker_for(vec![primary.url.clone(), secondary.url.clone()]);

    let result = checker.check_domain("two words.com").await;

    assert!(!result.available);
    assert!(result.error_message.unwrap().starts_with("Invalid domain"));
    assert_eq!(primary.hits(), 0);
    assert_eq!(secondary.hits(), 0);
}

#[tokio::test]
async fn test_batch_is_paced() {
    let primary = StubResolver::start(Reply::json(NXDOMAIN)).await;
    let config = CheckConfig::default()
        .with_endpoints(vec![primary.url.clone()])
        .with_delay(Duration::from_millis(150));
    let checker = DomainChecker::with_config(config).unwrap();
    let domains: Vec<String> = ["one-paced.com", "two-paced.com", "three-paced.com"]
        .iter()
        .map(|d| d.to_string())
        .collect();

    let start = Instant::now();
    let results = checker.process_domain_batch(&domains, 1000).await;

    assert_eq!(results.len(), 3);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_batch_mixes_outcomes_without_aborting() {
    let registered = StubResolver::start(Reply::json(REGISTERED)).await;
    let checker = checker_for(vec![registered.url.clone()]);
    let domains = vec![
        "example.com".to_string(),
        "".to_string(),
        "example.org".to_string(),
    ];

    let results = checker.process_domain_batch(&domains, 1000).await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, available)| !available));
    // The empty name is never sent to the resolver.
    assert_eq!(registered.hits(), 2);
}
