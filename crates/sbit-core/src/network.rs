//! Per-network parameters.
//!
//! Nothing in this workspace reads a global default network: callers pick a
//! [`Network`] (or build a custom [`NetworkParams`]) and pass it explicitly to
//! the coin selector and transaction builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::STAKE_MATURITY;
use crate::error::AddressError;

/// BIP-32 extended key version bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bip32Versions {
    pub public: u32,
    pub private: u32,
}

/// Constants that differ between SBit networks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Network identifier.
    pub name: String,
    /// Prefix prepended to messages before signing.
    pub message_prefix: String,
    /// Human-readable prefix for segwit-style addresses.
    pub bech32_hrp: String,
    /// Extended key version bytes.
    pub bip32: Bip32Versions,
    /// Base58 version byte of pay-to-pubkey-hash addresses.
    pub pub_key_hash: u8,
    /// Base58 version byte of pay-to-script-hash addresses.
    pub script_hash: u8,
    /// Version byte of WIF-encoded private keys.
    pub wif: u8,
    /// Confirmations before a coinstake output may be spent.
    pub stake_maturity: u64,
}

const MESSAGE_PREFIX: &str = "\x15SBit Signed Message:\n";

impl NetworkParams {
    /// SBit mainnet.
    pub fn mainnet() -> Self {
        Self {
            name: "sbit".to_string(),
            message_prefix: MESSAGE_PREFIX.to_string(),
            bech32_hrp: "bc".to_string(),
            bip32: Bip32Versions {
                public: 0x0878_c22a,
                private: 0x0878_bda8,
            },
            pub_key_hash: 0x1a,
            script_hash: 0x32,
            wif: 0x80,
            stake_maturity: STAKE_MATURITY,
        }
    }

    /// SBit testnet.
    pub fn testnet() -> Self {
        Self {
            name: "sbit_testnet".to_string(),
            message_prefix: MESSAGE_PREFIX.to_string(),
            bech32_hrp: "tb".to_string(),
            bip32: Bip32Versions {
                public: 0x0842_26ab,
                private: 0x0842_3661,
            },
            pub_key_hash: 0x55,
            script_hash: 0x6e,
            wif: 0xef,
            stake_maturity: STAKE_MATURITY,
        }
    }
}

/// The published SBit networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn params(&self) -> NetworkParams {
        match self {
            Network::Mainnet => NetworkParams::mainnet(),
            Network::Testnet => NetworkParams::testnet(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "sbit" => Ok(Network::Mainnet),
            "testnet" | "test" | "sbit_testnet" => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownNetwork(s.to_string())),
        }
    }
}
