//! doh-check CLI Application
//!
//! A command-line interface for probing domain availability through
//! DNS-over-HTTPS resolvers, built on doh-check-lib.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use doh_check_lib::{
    expand_domain_inputs, export_domains, load_env_config, parse_duration_string,
    validate_domain, CheckConfig, ConfigManager, DomainChecker, DomainStatus, EnvConfig,
};
use futures::StreamExt;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for doh-check
#[derive(Parser, Debug)]
#[command(name = "doh-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check whether domains look registered using DNS-over-HTTPS")]
#[command(
    long_about = "Check whether domains look registered by querying their SOA record over DNS-over-HTTPS.\n\nResolvers are tried in order; a domain is only reported available when a resolver\nanswers NXDOMAIN (or NOERROR without records). Failures count as taken."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to check (base names or FQDNs)
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// TLDs for base names without a dot (comma-separated or multiple -t flags)
    #[arg(short = 't', long = "tld", value_name = "TLD", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Domain Selection")]
    pub tlds: Option<Vec<String>>,

    /// Input file with domains (one per line, # starts a comment)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub file: Option<String>,

    /// Output a JSON object mapping each domain to its availability
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Print only domains with this status, one per line
    #[arg(
        long = "export",
        value_name = "STATUS",
        help_heading = "Output Format",
        long_help = "Print only domains with this status (available|registered), one per line"
    )]
    pub export: Option<DomainStatus>,

    /// Deadline per domain (e.g. 5000, 1500ms, 5s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Probing")]
    pub timeout: Option<String>,

    /// Pause between domains (e.g. 500, 250ms, 1s)
    #[arg(long = "delay", value_name = "DURATION", help_heading = "Probing")]
    pub delay: Option<String>,

    /// DoH JSON endpoints to query in order (comma-separated)
    #[arg(
        long = "resolver",
        value_name = "URL",
        value_delimiter = ',',
        action = clap::ArgAction::Append,
        help_heading = "Probing"
    )]
    pub resolvers: Option<Vec<String>>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show per-domain resolver details and debug logs
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(&args);

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_domain_check(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Route library diagnostics to stderr. `RUST_LOG` wins over the flags.
fn init_tracing(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    let env_file = std::env::var("DOH_FILE").is_ok();
    if args.domains.is_empty() && args.file.is_none() && !env_file {
        return Err("You must specify domain names or a file with --file".to_string());
    }

    if args.json && args.export.is_some() {
        return Err("Cannot specify both --json and --export".to_string());
    }

    for (flag, value) in [("--timeout", &args.timeout), ("--delay", &args.delay)] {
        if let Some(value) = value {
            if parse_duration_string(value).is_none() {
                return Err(format!(
                    "Invalid {} '{}'. Use a format like '500', '250ms', '5s'",
                    flag, value
                ));
            }
        }
    }

    Ok(())
}

/// Main domain checking logic
async fn run_domain_check(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let config = build_config(&args, &env_config)?;

    let (domains, rejected) = get_domains_to_check(&args, &env_config, &config)?;
    ui::print_rejected(&rejected);

    if domains.is_empty() {
        return Err("No valid domains found to check".into());
    }

    let checker = DomainChecker::with_config(config)?;

    if args.json || args.export.is_some() {
        run_batch_check(&checker, &domains, &args).await
    } else {
        run_streaming_check(&checker, &domains, &args).await
    }
}

/// Collect every result first, then print JSON or the export list.
async fn run_batch_check(
    checker: &DomainChecker,
    domains: &[String],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let timeout_ms = checker.config().timeout.as_millis() as u64;
    let results = checker.process_domain_batch(domains, timeout_ms).await;

    if let Some(status) = args.export {
        let text = export_domains(&results.to_export_records(), status);
        if !text.is_empty() {
            println!("{}", text);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}

/// Print each result as soon as its probe completes.
async fn run_streaming_check(
    checker: &DomainChecker,
    domains: &[String],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = domains.len();
    if total > 1 {
        ui::print_header(total, checker.config());
    }

    let start_time = Instant::now();
    let (mut available, mut taken, mut unknown) = (0usize, 0usize, 0usize);

    let mut stream = checker.check_domains_stream(domains);
    let mut current = 0usize;

    while let Some(result) = stream.next().await {
        current += 1;
        match ui::outcome(&result) {
            ui::Outcome::Available => available += 1,
            ui::Outcome::Taken => taken += 1,
            ui::Outcome::Unknown => unknown += 1,
        }
        let counter = (total > 1).then_some((current, total));
        ui::print_result(&result, args.debug, counter);
    }

    if total > 1 {
        println!();
        ui::print_summary(total, available, taken, unknown, start_time.elapsed());
    }

    Ok(())
}

/// Build CheckConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (DOH_*)
/// 3. Local config file (./doh-check.toml)
/// 4. Global config file (~/.doh-check.toml)
/// 5. XDG config file (~/.config/doh-check/config.toml)
/// 6. Built-in defaults
fn build_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<CheckConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new();

    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = match explicit_path {
        Some(path) => {
            tracing::info!(path = %path, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load()?,
    };

    let config = file_config.apply_to(CheckConfig::default());
    let config = env_config.apply_to(config);
    let config = apply_cli_args_to_config(config, args);

    config.validate()?;
    Ok(config)
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_string) {
        config.timeout = timeout;
    }
    if let Some(delay) = args.delay.as_deref().and_then(parse_duration_string) {
        config.delay = delay;
    }
    if let Some(resolvers) = &args.resolvers {
        config.endpoints = resolvers.clone();
    }
    if args.tlds.is_some() {
        config.tlds = args.tlds.clone();
    }
    config
}

/// Collect inputs from arguments and file, expand base names, and split
/// them into valid domains and rejected inputs.
fn get_domains_to_check(
    args: &Args,
    env_config: &EnvConfig,
    config: &CheckConfig,
) -> Result<(Vec<String>, Vec<String>), Box<dyn std::error::Error>> {
    let mut inputs = args.domains.clone();

    if let Some(path) = args.file.as_ref().or(env_config.file.as_ref()) {
        tracing::info!(path = %path, "reading domains from file");
        inputs.extend(read_domains_from_file(path)?);
    }

    let expanded = expand_domain_inputs(&inputs, &config.tlds);
    Ok(expanded.into_iter().partition(|d| validate_domain(d)))
}

/// Read domains from a file, one per line.
///
/// Blank lines and `#` comments (whole-line or trailing) are skipped.
fn read_domains_from_file(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to read domain file '{}': {}", file_path, e))?;

    let domains = content
        .lines()
        .filter_map(|line| line.split('#').next())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    Ok(domains)
}
