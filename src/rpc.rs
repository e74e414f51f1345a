//! RPC capability layer
//!
//! [`LogSource`] is the narrow surface the scanner and resolver need from a
//! node: filtered log queries, the chain tip, and block timestamps.
//! [`RpcSource`] implements it over an alloy HTTP provider.

use crate::error::{ConfigError, QueryError, Result};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{BlockTransactionsKind, Filter, Log};
use alloy::transports::http::{Client, Http};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;

/// Query capability over an EVM node.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch logs matching `filter` within `[from, to]` inclusive.
    async fn query_filter(
        &self,
        filter: &Filter,
        from: u64,
        to: u64,
    ) -> std::result::Result<Vec<Log>, QueryError>;

    /// Current chain tip.
    async fn block_number(&self) -> std::result::Result<u64, QueryError>;

    /// Timestamp of block `number`, or `None` if the node has no such block.
    async fn block_timestamp(&self, number: u64) -> std::result::Result<Option<u64>, QueryError>;
}

/// [`LogSource`] backed by an alloy HTTP provider.
pub struct RpcSource {
    provider: RootProvider<Http<Client>>,
}

impl RpcSource {
    pub fn connect(rpc_url: &str) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| ConfigError::InvalidRpcUrl(rpc_url.to_string()))?;
        Ok(Self {
            provider: ProviderBuilder::new().on_http(url),
        })
    }
}

#[async_trait]
impl LogSource for RpcSource {
    async fn query_filter(
        &self,
        filter: &Filter,
        from: u64,
        to: u64,
    ) -> std::result::Result<Vec<Log>, QueryError> {
        let filter = filter.clone().from_block(from).to_block(to);
        self.provider
            .get_logs(&filter)
            .await
            .map_err(into_query_error)
    }

    async fn block_number(&self) -> std::result::Result<u64, QueryError> {
        self.provider
            .get_block_number()
            .await
            .map_err(into_query_error)
    }

    async fn block_timestamp(&self, number: u64) -> std::result::Result<Option<u64>, QueryError> {
        let block = self
            .provider
            .get_block_by_number(number.into(), BlockTransactionsKind::Hashes)
            .await
            .map_err(into_query_error)?;
        Ok(block.map(|b| b.header.timestamp))
    }
}

/// Map an alloy transport error into a [`QueryError`], preserving the
/// provider's structured payload for the error classifier.
fn into_query_error(err: RpcError<TransportErrorKind>) -> QueryError {
    match err {
        RpcError::ErrorResp(payload) => {
            let message = payload.message.to_string();
            let body = serde_json::to_string(&serde_json::json!({ "error": payload })).ok();
            QueryError { message, body }
        }
        other => QueryError::new(other.to_string()),
    }
}
