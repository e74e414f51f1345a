//! The `networks` subcommand

use crate::cli::Cli;
use crate::config::list_networks;
use crate::error::Result;

/// Print `<id>: <name>` for every readable network file. Unreadable files
/// are reported on stderr without hiding the rest of the listing.
pub fn run(cli: &Cli) -> Result<()> {
    for (id, loaded) in list_networks(&cli.networks_dir)? {
        match loaded {
            Ok(network) => println!("{id}: {}", network.name),
            Err(err) => eprintln!("!!! {id}: {err}"),
        }
    }
    Ok(())
}
