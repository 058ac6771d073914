//! Shared fixtures for property and end-to-end tests.

use rust_decimal::Decimal;
use sbit_core::amount::from_base_units;
use sbit_core::crypto::KeyPair;
use sbit_core::types::{Hash256, Transaction};
use sbit_wallet::SpendableOutput;

/// Deterministic keypair from a seed byte. Seeds 0 and 0xff are not valid
/// secp256k1 scalars.
pub fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes([seed; 32]).expect("seed is a valid secret key")
}

/// Ordinary (non-stake) UTXO whose txid is derived from `index`.
pub fn utxo(index: u32, value: u64) -> SpendableOutput {
    SpendableOutput {
        value,
        confirmations: 6,
        is_stake: false,
        hash: txid(index),
        pos: index % 4,
    }
}

/// Coinstake UTXO with the given confirmation count.
pub fn stake_utxo(index: u32, value: u64, confirmations: u64) -> SpendableOutput {
    SpendableOutput {
        value,
        confirmations,
        is_stake: true,
        hash: txid(index),
        pos: 0,
    }
}

/// Distinct 32-byte txid per index.
pub fn txid(index: u32) -> Hash256 {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&index.to_le_bytes());
    bytes[31] = 0x5b;
    Hash256(bytes)
}

/// Base units as a decimal SBIT amount.
pub fn sbit(units: u64) -> Decimal {
    from_base_units(units)
}

/// Sum of all output values; panics on overflow.
pub fn output_sum(tx: &Transaction) -> u64 {
    tx.outputs.iter().map(|o| o.value).sum()
}

/// Sum of all UTXO values.
pub fn utxo_sum<'a>(utxos: impl IntoIterator<Item = &'a SpendableOutput>) -> u64 {
    utxos.into_iter().map(|u| u.value).sum()
}
