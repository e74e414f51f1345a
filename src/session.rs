//! Scan session assembly
//!
//! Glue between a parsed command and a runnable scan: attaches the network's
//! contract address to the event filter, then resolves the block range
//! against the live chain. Everything that can fail without touching the
//! network fails before the first RPC call.

use crate::config::NetworkConfig;
use crate::dater::BlockDater;
use crate::error::Result;
use crate::output::Destination;
use crate::range::{resolve, RangeSpec, ResolvedRange};
use crate::registry::{EventDefinition, QueryArgs};
use crate::rpc::LogSource;
use alloy::rpc::types::Filter;

/// Inputs for one scan, all parsed and validated offline.
pub struct ScanRequest<'a> {
    pub network_id: &'a str,
    pub network: &'a NetworkConfig,
    pub definition: &'a EventDefinition,
    pub args: &'a QueryArgs,
    pub spec: RangeSpec,
    pub destination: Destination,
}

/// A scan ready to run: concrete filter, concrete block range.
#[derive(Debug)]
pub struct ScanSession {
    pub filter: Filter,
    pub range: ResolvedRange,
    pub destination: Destination,
    pub tip: u64,
}

impl ScanSession {
    /// Build the session. The filter (contract address, indexed topics) is
    /// assembled first; only then is the chain consulted for the tip and any
    /// date bounds.
    pub async fn prepare<S: LogSource + ?Sized>(
        request: ScanRequest<'_>,
        source: &S,
    ) -> Result<Self> {
        let address = request
            .network
            .contract(request.network_id, request.definition.contract)?;
        let filter = (request.definition.build_filter)(request.args)?.address(address);

        let tip = source.block_number().await?;
        let dater = BlockDater::new(source, tip);
        let range = resolve(&request.spec, tip, &dater).await?;

        Ok(Self {
            filter,
            range,
            destination: request.destination,
            tip,
        })
    }
}
