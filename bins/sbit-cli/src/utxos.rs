//! Loading spendable outputs from a wallet JSON dump.

use std::path::Path;

use anyhow::{Context, Result};
use sbit_wallet::SpendableOutput;
use tracing::debug;

/// Read a JSON array of spendable outputs from `path`.
pub fn load_utxos(path: &Path) -> Result<Vec<SpendableOutput>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read UTXO file {}", path.display()))?;
    let utxos: Vec<SpendableOutput> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid UTXO JSON in {}", path.display()))?;
    debug!(count = utxos.len(), path = %path.display(), "loaded UTXOs");
    Ok(utxos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_wallet_dump() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"value": 100000000, "confirmations": 3, "isStake": false,
                "hash": "0e3e2357e806b6cdb1f70b54c3a3a17b6714ee1f0e68bebb44a74b1efd512098",
                "pos": 2}}]"#
        )
        .unwrap();

        let utxos = load_utxos(file.path()).unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].value, 100_000_000);
        assert_eq!(utxos[0].pos, 2);
        assert_eq!(
            utxos[0].hash.to_txid_hex(),
            "0e3e2357e806b6cdb1f70b54c3a3a17b6714ee1f0e68bebb44a74b1efd512098"
        );
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_utxos(&path).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"value": "lots"}}]"#).unwrap();
        let err = load_utxos(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid UTXO JSON"));
    }
}
