//! Base58Check addresses.
//!
//! An address is `version || hash160` encoded with a 4-byte double-SHA-256
//! checksum. The version byte comes from [`NetworkParams`]: `pub_key_hash`
//! for key addresses, `script_hash` for script addresses. Decoding always
//! takes the expected network so a testnet address can never be paid from a
//! mainnet builder by accident.

use std::fmt;

use crate::constants::HASH160_LEN;
use crate::crypto::hash160;
use crate::error::AddressError;
use crate::network::NetworkParams;
use crate::script::Script;

/// What an address commits to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
}

/// A decoded SBit address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    kind: AddressKind,
    version: u8,
    hash: [u8; HASH160_LEN],
}

impl Address {
    /// Key address for a 20-byte pubkey hash.
    pub fn from_pubkey_hash(hash: [u8; HASH160_LEN], network: &NetworkParams) -> Self {
        Self {
            kind: AddressKind::PubKeyHash,
            version: network.pub_key_hash,
            hash,
        }
    }

    /// Script address for a 20-byte script hash.
    pub fn from_script_hash(hash: [u8; HASH160_LEN], network: &NetworkParams) -> Self {
        Self {
            kind: AddressKind::ScriptHash,
            version: network.script_hash,
            hash,
        }
    }

    /// Key address for raw public key bytes.
    pub fn from_public_key(public_key: &[u8], network: &NetworkParams) -> Self {
        Self::from_pubkey_hash(hash160(public_key), network)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash(&self) -> &[u8; HASH160_LEN] {
        &self.hash
    }

    /// The locking script paying to this address.
    pub fn script_pubkey(&self) -> Script {
        match self.kind {
            AddressKind::PubKeyHash => Script::p2pkh(&self.hash),
            AddressKind::ScriptHash => Script::p2sh(&self.hash),
        }
    }

    /// Encode as a Base58Check string.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(1 + HASH160_LEN);
        payload.push(self.version);
        payload.extend_from_slice(&self.hash);
        bs58::encode(payload).with_check().into_string()
    }

    /// Decode a Base58Check string belonging to `network`.
    pub fn decode(s: &str, network: &NetworkParams) -> Result<Self, AddressError> {
        let payload = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;

        let Some((&version, hash)) = payload.split_first() else {
            return Err(AddressError::InvalidLength(0));
        };
        let hash: [u8; HASH160_LEN] = hash
            .try_into()
            .map_err(|_| AddressError::InvalidLength(payload.len()))?;

        let kind = if version == network.pub_key_hash {
            AddressKind::PubKeyHash
        } else if version == network.script_hash {
            AddressKind::ScriptHash
        } else {
            return Err(AddressError::WrongNetwork(version, network.name.clone()));
        };

        Ok(Self { kind, version, hash })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
