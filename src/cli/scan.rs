//! The scan subcommands

use crate::cli::{Cli, ScanArgs};
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::output::{create_sink, Destination};
use crate::range::RangeSpec;
use crate::registry::{EventRegistry, QueryArgs};
use crate::rpc::RpcSource;
use crate::scanner::{chunk_ranges, ChunkedScanner};
use crate::session::{ScanRequest, ScanSession};
use indicatif::{ProgressBar, ProgressStyle};

pub async fn run(
    cli: &Cli,
    registry: &EventRegistry,
    event_id: &str,
    args: &ScanArgs,
    query: QueryArgs,
) -> Result<()> {
    let definition = registry.resolve(event_id)?;

    // everything that can fail locally, before touching the network
    let destination = Destination::from_output_arg(args.output.as_deref())?;
    let spec = RangeSpec {
        from: args.from.parse()?,
        to: args.to.parse()?,
        by: args.by,
        wait: args.wait,
    };
    let network = NetworkConfig::load(&cli.networks_dir, &cli.network)?;

    let source = RpcSource::connect(&network.rpc)?;
    let session = ScanSession::prepare(
        ScanRequest {
            network_id: &cli.network,
            network: &network,
            definition,
            args: &query,
            spec,
            destination,
        },
        &source,
    )
    .await?;

    println!(
        "Searching {} blocks {} to {} for {} events...",
        network.name, session.range.from, session.range.to, definition.event_type
    );

    let total_chunks = chunk_ranges(session.range.from, session.range.to, session.range.by).len();
    let bar = progress_bar(total_chunks as u64);
    let bar_ticker = bar.clone();

    let mut sink = create_sink(&session.destination)?;
    let scanner = ChunkedScanner::new(&source)
        .with_wait(session.range.wait)
        .with_progress(move |p| bar_ticker.set_position(p.chunk));

    let scan = scanner
        .scan(&session.filter, &session.range, definition.project, sink.as_mut())
        .await;
    bar.finish_and_clear();
    let result = scan?;

    match session.destination.path() {
        Some(path) => println!(
            "Found {} {} events, stored in {}",
            result.total_found,
            definition.event_type,
            path.display()
        ),
        None => println!("Found {} {} events", result.total_found, definition.event_type),
    }
    Ok(())
}

/// Per-chunk progress on stderr; hidden for single-chunk scans where it
/// would only flicker.
fn progress_bar(total_chunks: u64) -> ProgressBar {
    if total_chunks <= 1 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total_chunks);
    if let Ok(style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} queries ({eta})")
    {
        bar.set_style(style);
    }
    bar
}
