//! Per-network configuration
//!
//! Each network is a JSON file `networks/<id>.json`:
//!
//! ```json
//! {
//!     "name": "Ethereum Mainnet",
//!     "rpc": "https://ethereum-rpc.publicnode.com",
//!     "contracts": {
//!         "rrp": "0xa0AD79D995DdeeB18a14eAef56A549A04e3Aa1Bd",
//!         "dapi": "0x709944a48cAf83535e43471680fDA4905FB3920a"
//!     }
//! }
//! ```

use crate::error::{ConfigError, NotFoundError, Result};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc: String,
    #[serde(default)]
    pub contracts: BTreeMap<String, String>,
}

impl NetworkConfig {
    /// Load and validate `dir/<id>.json`. A missing file means the network
    /// identifier is unknown; anything else wrong with the file is a config
    /// error.
    pub fn load(dir: &Path, id: &str) -> Result<Self> {
        let path = dir.join(format!("{id}.json"));
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotFoundError::Network(id.to_string()).into());
            }
            Err(e) => {
                return Err(ConfigError::InvalidFile(format!("{}: {e}", path.display())).into());
            }
        };

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        config.validate(id)?;
        Ok(config)
    }

    fn validate(&self, id: &str) -> Result<()> {
        for (field, value) in [("name", &self.name), ("RPC info", &self.rpc)] {
            if value.is_empty() {
                return Err(ConfigError::MissingField {
                    network: id.to_string(),
                    field: field.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Address of the named contract on this network.
    pub fn contract(&self, id: &str, contract_type: &str) -> Result<Address> {
        let raw = self.contracts.get(contract_type).ok_or_else(|| {
            ConfigError::MissingContract {
                network: id.to_string(),
                contract: contract_type.to_string(),
            }
        })?;
        raw.parse()
            .map_err(|_| ConfigError::InvalidAddress(raw.clone()).into())
    }
}

/// All readable network configs in `dir`, sorted by id. Unreadable or
/// malformed files are skipped with an error entry so one bad file does not
/// hide the rest.
pub fn list_networks(dir: &Path) -> Result<Vec<(String, Result<NetworkConfig>)>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(id) = name.strip_suffix(".json") {
            ids.push(id.to_string());
        }
    }
    ids.sort();

    Ok(ids
        .into_iter()
        .map(|id| {
            let config = NetworkConfig::load(dir, &id);
            (id, config)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn write_network(dir: &Path, id: &str, json: &str) {
        std::fs::write(dir.join(format!("{id}.json")), json).unwrap();
    }

    const ETHEREUM: &str = r#"{
        "name": "Ethereum Mainnet",
        "rpc": "https://ethereum-rpc.publicnode.com",
        "contracts": {
            "rrp": "0xa0AD79D995DdeeB18a14eAef56A549A04e3Aa1Bd",
            "dapi": "0x709944a48cAf83535e43471680fDA4905FB3920a"
        }
    }"#;

    #[test]
    fn loads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        write_network(dir.path(), "ethereum", ETHEREUM);

        let config = NetworkConfig::load(dir.path(), "ethereum").unwrap();
        assert_eq!(config.name, "Ethereum Mainnet");
        let rrp = config.contract("ethereum", "rrp").unwrap();
        assert_ne!(rrp, Address::ZERO);
    }

    #[test]
    fn missing_file_is_unknown_network() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            NetworkConfig::load(dir.path(), "nope").unwrap_err(),
            Error::NotFound(NotFoundError::Network(_))
        ));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write_network(dir.path(), "bad", "{ not json");
        assert!(matches!(
            NetworkConfig::load(dir.path(), "bad").unwrap_err(),
            Error::Config(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn empty_rpc_is_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        write_network(dir.path(), "norpc", r#"{"name": "x", "rpc": ""}"#);
        assert!(matches!(
            NetworkConfig::load(dir.path(), "norpc").unwrap_err(),
            Error::Config(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn absent_contract_type_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_network(
            dir.path(),
            "partial",
            r#"{"name": "x", "rpc": "http://localhost:8545", "contracts": {}}"#,
        );
        let config = NetworkConfig::load(dir.path(), "partial").unwrap();
        assert!(matches!(
            config.contract("partial", "rrp").unwrap_err(),
            Error::Config(ConfigError::MissingContract { .. })
        ));
    }

    #[test]
    fn listing_sorts_and_keeps_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_network(dir.path(), "zeta", ETHEREUM);
        write_network(dir.path(), "alpha", ETHEREUM);
        write_network(dir.path(), "broken", "nope");
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let networks = list_networks(dir.path()).unwrap();
        let ids: Vec<&str> = networks.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["alpha", "broken", "zeta"]);
        assert!(networks[0].1.is_ok());
        assert!(networks[1].1.is_err());
    }
}
