//! Tail a streaming endpoint and print each record as it arrives.
//!
//! Run with:
//! ```bash
//! export STREAM_URL="http://localhost:8080/events"
//! RUST_LOG=streamkit=debug cargo run --example tail -- chunked
//! ```
//!
//! The optional argument selects the framing (`sse` or `chunked`, default
//! `sse`). Press Ctrl-C to cancel; records received so far are reported.

use streamkit::options::{HttpTransport, StreamOptions, TransportOptions};
use streamkit::{EventSink, SessionState, StreamClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::var("STREAM_URL").expect("STREAM_URL environment variable must be set");
    let framing = std::env::args().nth(1).unwrap_or_else(|| "sse".to_string());

    let client = StreamClient::http(TransportOptions::new(HttpTransport::default()))?;
    let sink = EventSink::new()
        .on_message(|record| println!("{}", record.to_value()))
        .on_parse_error(|_, detail| eprintln!("skipped line: {}", detail))
        .on_error(|err| eprintln!("stream failed: {}", err))
        .on_complete(|all| println!("\n=== Stream complete: {} records ===", all.len()));

    let handle = match framing.as_str() {
        "chunked" => client.chunked(url, StreamOptions::new(), sink)?,
        _ => client.sse(url, StreamOptions::new(), sink)?,
    };

    tokio::select! {
        _ = handle.finished() => {}
        _ = tokio::signal::ctrl_c() => handle.cancel(),
    }

    if handle.finished().await == SessionState::Cancelled {
        println!(
            "\n=== Cancelled after {} records ===",
            handle.records().len()
        );
    }
    Ok(())
}
