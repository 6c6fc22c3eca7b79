mod api;
mod config;
mod geocode;
mod location;
mod poll;
mod session;
mod speech;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::{EntryReader, QueryApi};
use crate::config::{Cli, Command, WatchArgs};
use crate::geocode::Geocoder;
use crate::location::{forward_lines, FixThrottle, LocationFix};
use crate::session::{Session, SessionView};
use crate::speech::ConsoleSpeaker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={default_level}", env!("CARGO_CRATE_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let http_timeout = cli.http_timeout();
    let api = QueryApi::new(cli.api_url.clone(), http_timeout)
        .context("Failed to build HTTP client")?;

    match cli.command {
        Command::Watch(args) => run_watch(api, &args, http_timeout).await,
        Command::Show { id } => {
            let entry = api.read(id).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        Command::Respond { id, status, text } => {
            api.update(id, &text, status).await?;
            println!("Entry {id} set to {status}");
            Ok(())
        }
    }
}

async fn run_watch(api: QueryApi, args: &WatchArgs, http_timeout: Duration) -> Result<()> {
    let geocoder = Geocoder::new(&args.geocoder_url, &args.geocoder_user_agent, http_timeout)
        .context("Failed to build geocoder client")?;
    let api = Arc::new(api);

    let (session, view_rx) = Session::new(
        api.clone(),
        api,
        Arc::new(geocoder),
        Arc::new(ConsoleSpeaker),
        args.session_settings(),
    );

    let (fix_tx, fix_rx) = mpsc::channel(8);
    if args.fixes.is_empty() {
        info!("Reading location fixes from stdin (\"lat,lon\" per line)");
        let throttle = FixThrottle::new(args.min_fix_interval(), args.min_fix_distance_m);
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        tokio::spawn(forward_lines(stdin, throttle, fix_tx));
    } else {
        let fixes = args.fixes.clone();
        tokio::spawn(async move {
            for coordinates in fixes {
                if fix_tx.send(LocationFix::now(coordinates)).await.is_err() {
                    break;
                }
            }
        });
    }

    let display = tokio::spawn(display(view_rx));
    let final_view = session.run(fix_rx).await;
    display.abort();

    print_view(&final_view);
    Ok(())
}

/// Prints the view each time the session publishes a change.
async fn display(mut view_rx: watch::Receiver<SessionView>) {
    while view_rx.changed().await.is_ok() {
        let view = view_rx.borrow_and_update().clone();
        print_view(&view);
    }
}

fn print_view(view: &SessionView) {
    println!("{}", view.state);
    match &view.coordinates {
        Some(c) => println!("  Coordinates: {:.5}, {:.5}", c.latitude, c.longitude),
        None => println!("  Waiting for location..."),
    }
    match (&view.place, &view.address_error) {
        (Some(place), _) => println!("  Address: {}", place.display_name),
        (None, Some(err)) => println!("  {err}"),
        (None, None) => println!("  Waiting for address..."),
    }
    if let Some(err) = &view.poll_error {
        println!("  Polling error, retrying: {err}");
    }
}
