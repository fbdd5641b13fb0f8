// ABOUTME: CLI binary for newsparser.
// ABOUTME: Fetches URLs through the pipeline, extracts saved HTML files, or prints GUIDs and supported domains.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use newsparser::{Client, ClientBuilder, News, Options, ParseError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "newsparser")]
#[command(about = "Fetch news articles and extract structured records")]
struct Args {
    /// HTML file to extract (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Page URL the HTML file was fetched from (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Print the GUID of a URL and exit
    #[arg(long = "guid", value_name = "URL")]
    guid: Option<String>,

    /// Print the supported domains and exit
    #[arg(long = "list-domains")]
    list_domains: bool,

    /// Output records as JSON
    #[arg(long = "json")]
    json_output: bool,

    /// Output storage-creation requests (JSON) instead of records
    #[arg(long = "create-request")]
    create_request: bool,

    /// JSON options file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long = "timeout")]
    timeout: Option<u64>,

    /// Pipeline channel capacity
    #[arg(long = "capacity")]
    capacity: Option<usize>,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// URLs to fetch (pipeline mode)
    #[arg()]
    urls: Vec<String>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_client(args: &Args) -> Result<Client, ParseError> {
    let mut opts = match &args.config {
        Some(path) => Options::from_json_file(path)?,
        None => Options::default(),
    };
    if let Some(secs) = args.timeout {
        opts.timeout_secs = secs;
    }
    if let Some(capacity) = args.capacity {
        opts.pipeline_capacity = capacity;
    }
    debug!(?opts, "client options");
    ClientBuilder::from_options(&opts).build()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "serializing output");
            String::new()
        }
    }
}

/// Renders records as text, JSON records or JSON create requests.
fn format_output(records: &[News], args: &Args) -> String {
    if args.create_request {
        let requests: Vec<_> = records.iter().map(News::to_create_request).collect();
        return to_json(&requests);
    }
    if args.json_output {
        return to_json(records);
    }
    records
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn validate(args: &Args) -> Result<(), &'static str> {
    if args.html.is_some() && args.url.is_none() {
        return Err("--url is required when using --html");
    }
    if args.html.is_some() && !args.urls.is_empty() {
        return Err("cannot use both --html and positional URLs");
    }
    if args.html.is_none() && args.urls.is_empty() && args.guid.is_none() && !args.list_domains {
        return Err("at least one URL is required, or use --html with --url");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(msg) = validate(&args) {
        eprintln!("error: {}", msg);
        return ExitCode::from(1);
    }

    let client = match build_client(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    if args.list_domains {
        for domain in client.registry().domains() {
            println!("{}", domain);
        }
        return ExitCode::SUCCESS;
    }

    if let Some(url) = &args.guid {
        return match client.derive_guid(url) {
            Ok(guid) => {
                println!("{}", guid);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::from(1)
            }
        };
    }

    let mut records: Vec<News> = Vec::new();
    let mut had_error = false;

    if let (Some(path), Some(url)) = (&args.html, &args.url) {
        match fs::read_to_string(path) {
            Ok(html) => match client.parse_html(&html, url) {
                Ok(out) => {
                    for (key, issue) in out.issues.iter() {
                        eprintln!("warning: {}: {}", key, issue);
                    }
                    records.push(out.news);
                }
                Err(e) => {
                    eprintln!("error parsing HTML: {}", e);
                    had_error = true;
                }
            },
            Err(e) => {
                eprintln!("error reading file {:?}: {}", path, e);
                had_error = true;
            }
        }
    } else {
        let outcome = client
            .parse_many(args.urls.clone(), CancellationToken::new())
            .await;
        let mut errors = outcome.errors;
        errors.sort_by_key(|e| e.id);
        for e in &errors {
            eprintln!("error: {}", e);
        }
        had_error = !errors.is_empty();

        let mut queries = outcome.queries;
        queries.sort_by_key(|q| q.id());
        records.extend(queries.into_iter().filter_map(|q| q.into_news()));
    }

    if !records.is_empty() {
        println!("{}", format_output(&records, &args));
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
