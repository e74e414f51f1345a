//! Command-line interface

mod dates;
mod networks;
mod scan;

use crate::error::Result;
use crate::events;
use crate::registry::QueryArgs;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "evlogs",
    version,
    about = "Search EVM networks for Airnode protocol event logs"
)]
pub struct Cli {
    /// Network identifier, resolved as <networks-dir>/<id>.json
    #[arg(short = 'n', long, global = true, default_value = "ethereum")]
    pub network: String,

    /// Directory holding the network config files
    #[arg(long, global = true, default_value = "networks")]
    pub networks_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Range and output options shared by every scan subcommand.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// First block: number, negative offset, ISO8601 date, or "latest"
    #[arg(short = 'f', long, default_value = "0")]
    pub from: String,

    /// Last block: number, negative offset, ISO8601 date, or "latest"
    #[arg(short = 't', long, default_value = "latest")]
    pub to: String,

    /// Blocks per query; defaults to the whole range in one query
    #[arg(short = 'b', long)]
    pub by: Option<i64>,

    /// Seconds to pause between queries
    #[arg(short = 'w', long)]
    pub wait: Option<f64>,

    /// Output file ending in .json or .csv; prints to the console if omitted
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RequestFilterArgs {
    /// Only events from this Airnode address
    #[arg(short = 'a', long)]
    pub airnode: Option<String>,

    /// Only events for this request id
    #[arg(short = 'r', long)]
    pub request: Option<String>,
}

impl RequestFilterArgs {
    fn query_args(&self) -> QueryArgs {
        QueryArgs {
            airnode: self.airnode.clone(),
            request: self.request.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SponsorFilterArgs {
    /// Only events for this sponsor address
    #[arg(short = 's', long)]
    pub sponsor: Option<String>,

    /// Only events for this requester address
    #[arg(short = 'r', long)]
    pub requester: Option<String>,
}

impl SponsorFilterArgs {
    fn query_args(&self) -> QueryArgs {
        QueryArgs {
            sponsor: self.sponsor.clone(),
            requester: self.requester.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct NameFilterArgs {
    /// Only events for this dAPI name (32-byte hex)
    #[arg(long)]
    pub name: Option<String>,

    /// Only events sent by this address
    #[arg(long)]
    pub sender: Option<String>,
}

impl NameFilterArgs {
    fn query_args(&self) -> QueryArgs {
        QueryArgs {
            dapi_name: self.name.clone(),
            sender: self.sender.clone(),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct BeaconFilterArgs {
    /// Only events for this beacon id (32-byte hex)
    #[arg(long)]
    pub id: Option<String>,
}

impl BeaconFilterArgs {
    fn query_args(&self) -> QueryArgs {
        QueryArgs {
            beacon: self.id.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for MadeFullRequest events
    Full {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: RequestFilterArgs,
    },

    /// Search for MadeTemplateRequest events
    Template {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: RequestFilterArgs,
    },

    /// Search for FulfilledRequest events
    Fulfilled {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: RequestFilterArgs,
    },

    /// Search for FailedRequest events
    Failed {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: RequestFilterArgs,
    },

    /// Search for SetSponsorshipStatus events
    Sponsor {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: SponsorFilterArgs,
    },

    /// Search for SetDapiName events
    Name {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: NameFilterArgs,
    },

    /// Search for UpdatedBeaconWithSignedData events
    Ubsd {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        filter: BeaconFilterArgs,
    },

    /// List the configured networks
    Networks,

    /// Add an ISO8601 date column to a CSV of scan results
    Dates {
        /// CSV file with a "block" column
        file: PathBuf,

        /// Output file; prints to the console if omitted
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let registry = events::builtin()?;
    match &cli.command {
        Commands::Full { scan, filter } => {
            scan::run(&cli, &registry, "full", scan, filter.query_args()).await
        }
        Commands::Template { scan, filter } => {
            scan::run(&cli, &registry, "template", scan, filter.query_args()).await
        }
        Commands::Fulfilled { scan, filter } => {
            scan::run(&cli, &registry, "fulfilled", scan, filter.query_args()).await
        }
        Commands::Failed { scan, filter } => {
            scan::run(&cli, &registry, "failed", scan, filter.query_args()).await
        }
        Commands::Sponsor { scan, filter } => {
            scan::run(&cli, &registry, "sponsor", scan, filter.query_args()).await
        }
        Commands::Name { scan, filter } => {
            scan::run(&cli, &registry, "name", scan, filter.query_args()).await
        }
        Commands::Ubsd { scan, filter } => {
            scan::run(&cli, &registry, "ubsd", scan, filter.query_args()).await
        }
        Commands::Networks => networks::run(&cli),
        Commands::Dates { file, output } => dates::run(&cli, file, output.as_deref()).await,
    }
}
