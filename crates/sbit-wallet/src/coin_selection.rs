//! Maturity-aware coin selection.
//!
//! Spends the smallest mature outputs first: coinstake outputs younger than
//! the network's stake maturity are skipped, the rest are sorted ascending by
//! value and taken greedily until the amount plus fee is covered. Selection
//! stops at the first output that reaches the target.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sbit_core::amount::to_base_units;
use sbit_core::network::NetworkParams;
use sbit_core::types::{txid_hex, Hash256, OutPoint};

use crate::error::WalletError;

/// An unspent output the wallet may spend.
///
/// Deserializes from the JSON shape wallet back ends report:
/// `{"value", "confirmations", "isStake", "hash", "pos"}` with `hash` as a
/// display-order txid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendableOutput {
    /// Value in base units.
    pub value: u64,
    /// Confirmations of the transaction that created this output.
    pub confirmations: u64,
    /// Whether this output came from a coinstake transaction.
    #[serde(default)]
    pub is_stake: bool,
    /// Transaction ID containing the output.
    #[serde(with = "txid_hex")]
    pub hash: Hash256,
    /// Index of the output within that transaction.
    pub pos: u32,
}

impl SpendableOutput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.hash,
            vout: self.pos,
        }
    }

    /// Ordinary outputs are always spendable; coinstake outputs only after
    /// `stake_maturity` confirmations.
    pub fn is_mature(&self, stake_maturity: u64) -> bool {
        !self.is_stake || self.confirmations >= stake_maturity
    }
}

/// Result of coin selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinSelection {
    /// Selected outputs, in spending order.
    pub selected: Vec<SpendableOutput>,
    /// Total value of the selected outputs in base units.
    pub total: u64,
    /// Amount plus fee in base units.
    pub target: u64,
}

impl CoinSelection {
    /// Value selected beyond the target.
    pub fn excess(&self) -> u64 {
        self.total - self.target
    }
}

/// Smallest-first coin selector.
pub struct CoinSelector;

impl CoinSelector {
    /// Select outputs covering `amount + fee` (both in SBIT).
    ///
    /// # Errors
    /// - [`WalletError::NoUtxos`] if `outputs` is empty
    /// - [`WalletError::Amount`] if `amount` or `fee` is negative or finer than one base unit
    /// - [`WalletError::InsufficientFunds`] if the mature outputs cannot cover the target
    pub fn select(
        outputs: &[SpendableOutput],
        amount: Decimal,
        fee: Decimal,
        network: &NetworkParams,
    ) -> Result<CoinSelection, WalletError> {
        if outputs.is_empty() {
            return Err(WalletError::NoUtxos);
        }

        let target = to_base_units(amount)?
            .checked_add(to_base_units(fee)?)
            .ok_or_else(|| WalletError::InvalidAmount("amount plus fee overflows".into()))?;

        let mut mature: Vec<&SpendableOutput> = outputs
            .iter()
            .filter(|o| o.is_mature(network.stake_maturity))
            .collect();
        // Stable: equal values keep caller order.
        mature.sort_by_key(|o| o.value);

        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for utxo in mature {
            total = total
                .checked_add(utxo.value)
                .ok_or_else(|| WalletError::InvalidAmount("UTXO total overflows".into()))?;
            selected.push(utxo.clone());

            if total >= target {
                debug!(
                    inputs = selected.len(),
                    total,
                    target,
                    available = outputs.len(),
                    "coin selection complete"
                );
                return Ok(CoinSelection {
                    selected,
                    total,
                    target,
                });
            }
        }

        Err(WalletError::InsufficientFunds {
            have: total,
            need: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sbit_core::constants::COIN;
    use sbit_core::network::Network;

    fn make_utxo(index: u8, value: u64, confirmations: u64, is_stake: bool) -> SpendableOutput {
        SpendableOutput {
            value,
            confirmations,
            is_stake,
            hash: Hash256([index; 32]),
            pos: 0,
        }
    }

    fn mainnet() -> NetworkParams {
        Network::Mainnet.params()
    }

    #[test]
    fn select_mature_stake_after_small_output() {
        let utxos = vec![
            make_utxo(1, 500_000_000, 2500, true),
            make_utxo(2, 100_000_000, 1, false),
        ];

        let result = CoinSelector::select(&utxos, dec!(4), dec!(0.01), &mainnet()).unwrap();
        assert_eq!(result.target, 401_000_000);
        assert_eq!(result.selected.len(), 2);
        assert_eq!(result.selected[0].value, 100_000_000);
        assert_eq!(result.selected[1].value, 500_000_000);
        assert_eq!(result.total, 600_000_000);
        assert_eq!(result.excess(), 199_000_000);
    }

    #[test]
    fn select_sub_unit_target_insufficient() {
        let utxos = vec![make_utxo(1, 1, 10, false)];
        let err = CoinSelector::select(&utxos, dec!(0.000001), dec!(0), &mainnet()).unwrap_err();
        assert_eq!(err, WalletError::InsufficientFunds { have: 1, need: 100 });
    }

    #[test]
    fn select_skips_immature_stake() {
        let utxos = vec![
            make_utxo(1, 100 * COIN, 1999, true),
            make_utxo(2, 2 * COIN, 0, false),
        ];
        let err = CoinSelector::select(&utxos, dec!(3), dec!(0), &mainnet()).unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientFunds {
                have: 2 * COIN,
                need: 3 * COIN
            }
        );
    }

    #[test]
    fn stake_at_exact_maturity_is_eligible() {
        let utxos = vec![make_utxo(1, 5 * COIN, 2000, true)];
        let result = CoinSelector::select(&utxos, dec!(1), dec!(0), &mainnet()).unwrap();
        assert_eq!(result.selected.len(), 1);
    }

    #[test]
    fn maturity_comes_from_network_params() {
        let mut params = mainnet();
        params.stake_maturity = 10;
        let utxos = vec![make_utxo(1, 5 * COIN, 10, true)];
        assert!(CoinSelector::select(&utxos, dec!(1), dec!(0), &params).is_ok());
        assert!(CoinSelector::select(&utxos, dec!(1), dec!(0), &mainnet()).is_err());
    }

    #[test]
    fn select_smallest_first() {
        let utxos = vec![
            make_utxo(1, 5 * COIN, 10, false),
            make_utxo(2, 1 * COIN, 10, false),
            make_utxo(3, 3 * COIN, 10, false),
        ];
        let result = CoinSelector::select(&utxos, dec!(3.5), dec!(0), &mainnet()).unwrap();
        let values: Vec<u64> = result.selected.iter().map(|u| u.value).collect();
        assert_eq!(values, vec![1 * COIN, 3 * COIN]);
    }

    #[test]
    fn select_stops_at_threshold() {
        let utxos = vec![
            make_utxo(1, 1 * COIN, 10, false),
            make_utxo(2, 1 * COIN, 10, false),
            make_utxo(3, 1 * COIN, 10, false),
        ];
        let result = CoinSelector::select(&utxos, dec!(1.5), dec!(0.5), &mainnet()).unwrap();
        assert_eq!(result.selected.len(), 2);
        assert_eq!(result.total, result.target);
    }

    #[test]
    fn equal_values_keep_input_order() {
        let utxos = vec![
            make_utxo(7, 1 * COIN, 10, false),
            make_utxo(3, 1 * COIN, 10, false),
            make_utxo(5, 1 * COIN, 10, false),
        ];
        let result = CoinSelector::select(&utxos, dec!(3), dec!(0), &mainnet()).unwrap();
        let ids: Vec<u8> = result.selected.iter().map(|u| u.hash.0[0]).collect();
        assert_eq!(ids, vec![7, 3, 5]);
    }

    #[test]
    fn select_empty_utxos() {
        let err = CoinSelector::select(&[], dec!(1), dec!(0), &mainnet()).unwrap_err();
        assert_eq!(err, WalletError::NoUtxos);
    }

    #[test]
    fn zero_amount_still_covers_fee() {
        let utxos = vec![make_utxo(1, 1 * COIN, 10, false)];
        let result = CoinSelector::select(&utxos, dec!(0), dec!(0.4), &mainnet()).unwrap();
        assert_eq!(result.target, 40_000_000);
        assert_eq!(result.selected.len(), 1);
    }

    #[test]
    fn zero_target_spends_one_output() {
        let utxos = vec![
            make_utxo(1, 2 * COIN, 10, false),
            make_utxo(2, 1 * COIN, 10, false),
        ];
        let result = CoinSelector::select(&utxos, dec!(0), dec!(0), &mainnet()).unwrap();
        assert_eq!(result.selected.len(), 1);
        assert_eq!(result.selected[0].value, 1 * COIN);
    }

    #[test]
    fn only_immature_outputs_is_insufficient() {
        let utxos = vec![make_utxo(1, 1 * COIN, 5, true)];
        let err = CoinSelector::select(&utxos, dec!(0), dec!(0), &mainnet()).unwrap_err();
        assert_eq!(err, WalletError::InsufficientFunds { have: 0, need: 0 });
    }

    #[test]
    fn rejects_negative_fee() {
        let utxos = vec![make_utxo(1, 1 * COIN, 10, false)];
        let err = CoinSelector::select(&utxos, dec!(0.5), dec!(-0.1), &mainnet()).unwrap_err();
        assert!(matches!(err, WalletError::Amount(_)));
    }

    #[test]
    fn rejects_sub_unit_amount() {
        let utxos = vec![make_utxo(1, 1 * COIN, 10, false)];
        let err =
            CoinSelector::select(&utxos, dec!(0.000000001), dec!(0), &mainnet()).unwrap_err();
        assert!(matches!(err, WalletError::Amount(_)));
    }

    #[test]
    fn total_overflow_is_an_error() {
        let utxos = vec![
            make_utxo(1, u64::MAX / 2 + 1, 10, false),
            make_utxo(2, u64::MAX / 2 + 1, 10, false),
        ];
        let err = CoinSelector::select(&utxos, dec!(184467440737), dec!(0), &mainnet()).unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
    }

    #[test]
    fn deterministic_selection() {
        let utxos: Vec<SpendableOutput> = (0..20)
            .map(|i| make_utxo(i, (i as u64 % 5 + 1) * COIN, 10, i % 3 == 0))
            .collect();
        let a = CoinSelector::select(&utxos, dec!(7), dec!(0.1), &mainnet()).unwrap();
        let b = CoinSelector::select(&utxos, dec!(7), dec!(0.1), &mainnet()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn deserialize_wallet_json() {
        let json = r#"[{
            "value": 500000000,
            "confirmations": 2500,
            "isStake": true,
            "hash": "00000000000000000000000000000000000000000000000000000000000000ff",
            "pos": 1
        }]"#;
        let utxos: Vec<SpendableOutput> = serde_json::from_str(json).unwrap();
        assert_eq!(utxos[0].value, 500_000_000);
        assert!(utxos[0].is_stake);
        assert_eq!(utxos[0].hash.0[0], 0xff);
        assert_eq!(utxos[0].outpoint().vout, 1);
    }

    #[test]
    fn deserialize_rejects_bad_hash() {
        let json = r#"{"value": 1, "confirmations": 1, "hash": "abc", "pos": 0}"#;
        assert!(serde_json::from_str::<SpendableOutput>(json).is_err());
    }
}
