//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `acme_precheck` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::net::SocketAddr;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use acme_precheck::initialization::init_logger_with;
use acme_precheck::{
    sort_problems, Engine, EngineConfig, LogFormat, LogLevel, Problem, ScanOptions, Severity,
    UpstreamResolver, ValidationMethod,
};

/// Diagnose why a domain may fail ACME validation.
#[derive(Debug, Parser)]
#[command(name = "acme_precheck", version, about)]
struct Cli {
    /// Domain to check (a leading `*.` requests a wildcard certificate)
    #[arg(long)]
    domain: String,

    /// Validation method: http-01 or dns-01
    #[arg(long, default_value = "http-01")]
    method: ValidationMethod,

    /// Path segment requested under /.well-known/acme-challenge/
    #[arg(long, default_value = acme_precheck::config::DEFAULT_HTTP_REQUEST_PATH)]
    http_request_path: String,

    /// Exact body the HTTP-01 request must return (empty accepts anything)
    #[arg(long, default_value = "")]
    http_expect_response: String,

    /// Also print Debug problems
    #[arg(long)]
    show_debug: bool,

    /// Print problems as a JSON array
    #[arg(long)]
    json: bool,

    /// Upstream resolvers used by the validating resolver
    #[arg(long, value_enum, default_value_t = UpstreamResolver::Google)]
    upstream: UpstreamResolver,

    /// Resolver asked for extended DNS errors on DNSSEC failures
    #[arg(long)]
    extended_error_resolver: Option<SocketAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    let mut config = EngineConfig {
        upstream: cli.upstream,
        ..Default::default()
    };
    if cli.extended_error_resolver.is_some() {
        config.extended_error_resolver = cli.extended_error_resolver;
    }
    let engine = Engine::new(config).context("Failed to initialize the scan engine")?;

    let options = ScanOptions {
        http_request_path: cli.http_request_path,
        http_expect_response: cli.http_expect_response,
    };

    match engine.check(&cli.domain, cli.method, options).await {
        Ok(mut problems) => {
            sort_problems(&mut problems);
            if !cli.show_debug {
                problems.retain(|p| !p.is_debug());
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&problems)?);
            } else {
                print_problems(&problems);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("acme_precheck error: {:#}", anyhow::Error::from(e));
            process::exit(1);
        }
    }
}

fn print_problems(problems: &[Problem]) {
    if problems.is_empty() {
        println!("{}", "All OK!".green().bold());
        return;
    }

    for problem in problems {
        let label = match problem.severity {
            Severity::Fatal | Severity::Error => problem.severity.as_ref().red().bold(),
            Severity::Warning => problem.severity.as_ref().yellow().bold(),
            Severity::Info => problem.severity.as_ref().blue().bold(),
            Severity::Debug => problem.severity.as_ref().dimmed(),
        };
        println!("{label} {}", problem.name.bold());
        println!("{}", problem.explanation);
        if !problem.detail.is_empty() {
            println!("{}", problem.detail.dimmed());
        }
        println!();
    }
}
