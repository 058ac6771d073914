//! CLI configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sbit_core::network::Network;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    /// Network whose address versions and maturity rules apply.
    pub network: Network,
    /// JSON file listing spendable outputs.
    pub utxo_file: PathBuf,
    /// `tracing` filter directive.
    pub log_filter: String,
}

impl CliConfig {
    /// Load configuration from `SBIT_NETWORK`, `SBIT_UTXO_FILE` and `SBIT_LOG`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network = match lookup("SBIT_NETWORK") {
            Some(name) => name
                .parse::<Network>()
                .with_context(|| format!("SBIT_NETWORK has unsupported value {name:?}"))?,
            None => Network::Mainnet,
        };

        let utxo_file = lookup("SBIT_UTXO_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_utxo_file);

        let log_filter = lookup("SBIT_LOG").unwrap_or_else(|| "info".to_string());

        Ok(CliConfig {
            network,
            utxo_file,
            log_filter,
        })
    }
}

/// `<data dir>/sbit/utxos.json`, falling back to the working directory.
pub fn default_utxo_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sbit")
        .join("utxos.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = CliConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.utxo_file, default_utxo_file());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn reads_all_variables() {
        let config = CliConfig::from_lookup(lookup_from(&[
            ("SBIT_NETWORK", "sbit_testnet"),
            ("SBIT_UTXO_FILE", "/tmp/outputs.json"),
            ("SBIT_LOG", "sbit_wallet=debug"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.utxo_file, PathBuf::from("/tmp/outputs.json"));
        assert_eq!(config.log_filter, "sbit_wallet=debug");
    }

    #[test]
    fn rejects_unknown_network() {
        let err = CliConfig::from_lookup(lookup_from(&[("SBIT_NETWORK", "regtest")])).unwrap_err();
        assert!(err.to_string().contains("SBIT_NETWORK"));
    }

    #[test]
    fn default_file_is_named_utxos_json() {
        assert!(default_utxo_file().ends_with("sbit/utxos.json"));
    }
}
