//! `meetslot` CLI: find meeting slots against a local JSON calendar store.
//!
//! ## Usage
//!
//! ```sh
//! # Resolve a request (stdin → stdout)
//! meetslot resolve --calendars calendars.json < request.json
//!
//! # Resolve from file to file, consulting a suggestion service first
//! meetslot resolve --calendars calendars.json -i request.json -o slots.json \
//!     --provider-url http://localhost:8080/suggest
//!
//! # Draft the best slot as a meeting (dry run)
//! meetslot resolve --calendars calendars.json -i request.json --book "Planning"
//!
//! # One participant's free time, split into standard and extended hours
//! meetslot free --calendars calendars.json --participant alice@example.com \
//!     --start 2026-03-16T00:00:00 --end 2026-03-21T00:00:00 --timezone Europe/Berlin
//! ```
//!
//! Logs go to stderr. `RUST_LOG` overrides the default level (`warn`, or
//! `debug` with `--verbose`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slot_engine::dst::parse_timezone;
use slot_engine::{ResolutionResult, SearchWindow};
use slot_resolver::{
    parse_timestamp, EventSink, LocalStoreSource, MeetingDraft, MemorySink, ResolveRequest,
    ResolveResponse, Resolver, ResolverConfig, RetryingSource,
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "meetslot",
    version,
    about = "Find meeting slots that work for every participant"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log resolution progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Resolver configuration file (JSON); MEETSLOT_* variables override it
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve candidate meeting slots for a request
    Resolve {
        /// Calendar store (JSON)
        #[arg(long)]
        calendars: String,
        /// Request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Suggestion service to consult before the local pipeline
        #[arg(long)]
        provider_url: Option<String>,
        /// Draft the top-ranked slot as a meeting with this subject (dry run)
        #[arg(long)]
        book: Option<String>,
        /// Organizer of the drafted meeting (defaults to the first attendee)
        #[arg(long, requires = "book")]
        organizer: Option<String>,
    },
    /// Show one participant's free time inside a window
    Free {
        /// Calendar store (JSON)
        #[arg(long)]
        calendars: String,
        #[arg(long)]
        participant: String,
        /// Window start (RFC 3339, or local time in --timezone)
        #[arg(long)]
        start: String,
        /// Window end (RFC 3339, or local time in --timezone)
        #[arg(long)]
        end: String,
        /// IANA timezone for working hours and local timestamps
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            calendars,
            input,
            output,
            provider_url,
            book,
            organizer,
        } => {
            if let Some(url) = provider_url {
                config.provider_url = Some(url);
            }
            let resolver = Resolver::from_config(open_store(&calendars, &config)?, config)
                .context("Failed to set up resolver")?;

            let raw = read_input(input.as_deref())?;
            let request: ResolveRequest =
                serde_json::from_str(&raw).context("Failed to parse resolve request")?;
            let request = request
                .into_request(resolver.config())
                .context("Invalid resolve request")?;

            let result = resolver
                .resolve(&request)
                .await
                .context("Failed to resolve meeting slots")?;

            let response = ResolveResponse::from(&result);
            let pretty = serde_json::to_string_pretty(&response)?;
            write_output(output.as_deref(), &pretty)?;

            if let Some(subject) = book {
                book_top_slot(&result, &subject, organizer.as_deref()).await?;
            }
        }
        Commands::Free {
            calendars,
            participant,
            start,
            end,
            timezone,
        } => {
            let tz = parse_timezone(&timezone).context("Invalid --timezone")?;
            let window = SearchWindow {
                start: parse_timestamp(&start, &tz).context("Invalid --start")?,
                end: parse_timestamp(&end, &tz).context("Invalid --end")?,
                timezone: tz,
                working_hours: None,
            };

            let resolver = Resolver::from_config(open_store(&calendars, &config)?, config)
                .context("Failed to set up resolver")?;
            let view = resolver
                .free_view(&participant, &window)
                .await
                .with_context(|| format!("Failed to compute free time for {}", participant))?;

            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<ResolverConfig> {
    let mut config = match path {
        Some(path) => ResolverConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => ResolverConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("Invalid MEETSLOT_* environment override")?;
    Ok(config)
}

fn open_store(path: &str, config: &ResolverConfig) -> Result<RetryingSource<LocalStoreSource>> {
    let store = LocalStoreSource::from_file(path)
        .with_context(|| format!("Failed to load calendar store: {}", path))?;
    Ok(RetryingSource::new(store, config.retry.clone()))
}

/// Draft the best candidate into an in-memory sink and report it on stderr.
async fn book_top_slot(
    result: &ResolutionResult,
    subject: &str,
    organizer: Option<&str>,
) -> Result<()> {
    let Some(slot) = result.suggestions.first() else {
        eprintln!("Nothing to book: no slot was found");
        return Ok(());
    };

    let organizer = organizer
        .map(str::to_string)
        .or_else(|| slot.attendees_satisfied.first().map(|p| p.id.clone()))
        .unwrap_or_default();
    let draft = MeetingDraft::from_candidate(subject, organizer, slot);

    let sink = MemorySink::new();
    let id = sink
        .create_event(&draft)
        .await
        .context("Failed to draft meeting")?;
    eprintln!(
        "Drafted {}: \"{}\" {} with {} attendee(s)",
        id,
        draft.subject,
        draft.slot,
        draft.attendees.len()
    );
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
