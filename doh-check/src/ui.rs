//! Display logic for the doh-check CLI.
//!
//! Colored result lines, the run header, the summary bar and the report of
//! rejected inputs. Uses only the `console` crate.

use console::{pad_str, style, Alignment};
use doh_check_lib::{rcode_name, CheckConfig, DomainResult};
use std::time::Duration;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a text-mode run.
pub fn print_header(domain_count: usize, config: &CheckConfig) {
    println!(
        "{} {} {}",
        style("doh-check").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "— Checking {} domain{}",
            domain_count,
            if domain_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );

    let meta = [
        format!("Resolvers: {}", config.endpoints.len()),
        format!("Timeout: {}ms", config.timeout.as_millis()),
        format!("Delay: {}ms", config.delay.as_millis()),
    ];
    println!("{}", style(meta.join(" | ")).dim());
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Classification used for display. Inconclusive results are reported as
/// taken by the library; the CLI still shows that nothing decided them.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Available,
    Taken,
    Unknown,
}

pub fn outcome(result: &DomainResult) -> Outcome {
    if result.available {
        Outcome::Available
    } else if result.is_decisive() {
        Outcome::Taken
    } else {
        Outcome::Unknown
    }
}

/// Format and print a single domain result with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &DomainResult, debug: bool, counter: Option<(usize, usize)>) {
    let domain_width = 30;
    let padded_domain = pad_str(&result.domain, domain_width, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    match outcome(result) {
        Outcome::Available => println!(
            "  {}{}  {}",
            prefix,
            style(&padded_domain).white(),
            style("AVAILABLE").green().bold(),
        ),
        Outcome::Taken => println!(
            "  {}{}  {}",
            prefix,
            style(&padded_domain).white(),
            style("TAKEN").red().bold(),
        ),
        Outcome::Unknown => println!(
            "  {}{}  {}  {}",
            prefix,
            style(&padded_domain).white(),
            style("UNKNOWN").yellow(),
            style(brief_error(result)).dim(),
        ),
    }

    if debug {
        if let Some(duration) = result.check_duration {
            let via = match (&result.resolver, result.dns_status) {
                (Some(resolver), Some(status)) => format!("{} ({})", resolver, rcode_name(status)),
                _ => "no resolver".to_string(),
            };
            println!(
                "    {} Checked in {}ms via {}",
                style("└─").dim(),
                duration.as_millis(),
                via,
            );
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(total: usize, available: usize, taken: usize, unknown: usize, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", available)).green(),
        style("|").dim(),
        style(format!("{} taken", taken)).red(),
        style("|").dim(),
        style(format!("{} unknown", unknown)).yellow(),
    );
}

// ── Rejected inputs ──────────────────────────────────────────────────────────

/// Report inputs that failed validation, on stderr.
pub fn print_rejected(rejected: &[String]) {
    if rejected.is_empty() {
        return;
    }

    eprintln!(
        "{} Skipping {} invalid domain{}: {}",
        style("warning:").yellow().bold(),
        rejected.len(),
        if rejected.len() == 1 { "" } else { "s" },
        format_domain_list(rejected, 5),
    );
}

/// Join domains, truncating after `max_show` entries.
pub fn format_domain_list(domains: &[String], max_show: usize) -> String {
    if domains.len() <= max_show {
        domains.join(", ")
    } else {
        let shown = &domains[..max_show];
        let remaining = domains.len() - max_show;
        format!("{}, ... and {} more", shown.join(", "), remaining)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract a brief reason from a result no resolver decided.
fn brief_error(result: &DomainResult) -> &'static str {
    match &result.error_message {
        Some(msg) => {
            let m = msg.to_lowercase();
            if m.contains("timeout") || m.contains("timed out") {
                "(timeout)"
            } else if m.contains("network") || m.contains("connect") {
                "(network error)"
            } else if m.contains("parse") || m.contains("json") {
                "(parsing error)"
            } else if m.contains("servfail") || m.contains("refused") || m.contains("http status") {
                "(resolver error)"
            } else {
                "(error)"
            }
        }
        None => "(unknown status)",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
