//! Core protocol types: hashes, outpoints, transactions.
//!
//! All monetary values are in base units (1 SBIT = 10^8 units).
//! Transactions serialize to the legacy UTXO wire format; see
//! [`Transaction::to_bytes`].

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::constants::{SEQUENCE_FINAL, TX_VERSION};
use crate::encoding::{decode_hex, ensure_remaining, get_compact_size, put_compact_size};
use crate::error::{EncodingError, TransactionError};
use crate::script::Script;

/// A 32-byte hash value, stored in internal (wire) byte order.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Double SHA-256 of `data`.
    pub fn double_sha256(data: &[u8]) -> Self {
        let first = Sha256::digest(data);
        Self(Sha256::digest(first).into())
    }

    /// Parse a transaction id as shown by explorers and RPC (byte-reversed hex).
    pub fn from_txid_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = decode_hex(s)?;
        let mut arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| EncodingError::UnexpectedLength { got: bytes.len(), expected: 32 })?;
        arr.reverse();
        Ok(Self(arr))
    }

    /// Format as a transaction id (byte-reversed hex).
    pub fn to_txid_hex(&self) -> String {
        let mut arr = self.0;
        arr.reverse();
        hex::encode(arr)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Serde adapter for hashes written as display-order txid hex strings.
pub mod txid_hex {
    use super::Hash256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hash.to_txid_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash256, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_txid_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction ID containing the referenced output.
    pub txid: Hash256,
    /// Index of the output within the transaction.
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid.to_txid_hex(), self.vout)
    }
}

/// A transaction input, spending a previous output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// The outpoint being spent.
    pub previous_output: OutPoint,
    /// Unlocking script. Empty until the input is signed.
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxInput {
    /// An unsigned input with a final sequence number.
    pub fn unsigned(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Script::new(),
            sequence: SEQUENCE_FINAL,
        }
    }
}

/// A transaction output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in base units.
    pub value: u64,
    /// Locking script: P2PKH, P2SH, or a contract create/call script.
    pub script_pubkey: Script,
}

/// A transaction transferring value or invoking contracts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }
}

impl Transaction {
    /// Serialize to the canonical wire encoding.
    ///
    /// Layout: version (i32 LE), input count, inputs (txid, vout u32 LE,
    /// scriptSig, sequence u32 LE), output count, outputs (value u64 LE,
    /// script), lock_time (u32 LE). Counts and script lengths are CompactSize.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_size_hint());
        buf.put_i32_le(self.version);
        put_compact_size(&mut buf, self.inputs.len() as u64);
        for input in &self.inputs {
            buf.put_slice(input.previous_output.txid.as_bytes());
            buf.put_u32_le(input.previous_output.vout);
            put_script(&mut buf, &input.script_sig);
            buf.put_u32_le(input.sequence);
        }
        put_compact_size(&mut buf, self.outputs.len() as u64);
        for output in &self.outputs {
            buf.put_u64_le(output.value);
            put_script(&mut buf, &output.script_pubkey);
        }
        buf.put_u32_le(self.lock_time);
        buf
    }

    /// Hex of the wire encoding, ready for broadcast.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse a transaction from its wire encoding. The whole buffer must be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut buf = bytes;
        ensure_remaining(&buf, 4, "version")?;
        let version = buf.get_i32_le();

        let n_inputs = get_count(&mut buf)?;
        let mut inputs = Vec::with_capacity(n_inputs);
        for _ in 0..n_inputs {
            ensure_remaining(&buf, 36, "outpoint")?;
            let mut txid = [0u8; 32];
            buf.copy_to_slice(&mut txid);
            let vout = buf.get_u32_le();
            let script_sig = get_script(&mut buf)?;
            ensure_remaining(&buf, 4, "sequence")?;
            let sequence = buf.get_u32_le();
            inputs.push(TxInput {
                previous_output: OutPoint { txid: Hash256(txid), vout },
                script_sig,
                sequence,
            });
        }

        let n_outputs = get_count(&mut buf)?;
        let mut outputs = Vec::with_capacity(n_outputs);
        for _ in 0..n_outputs {
            ensure_remaining(&buf, 8, "output value")?;
            let value = buf.get_u64_le();
            let script_pubkey = get_script(&mut buf)?;
            outputs.push(TxOutput { value, script_pubkey });
        }

        ensure_remaining(&buf, 4, "lock time")?;
        let lock_time = buf.get_u32_le();
        if buf.has_remaining() {
            return Err(TransactionError::TrailingBytes(buf.remaining()));
        }

        Ok(Self { version, inputs, outputs, lock_time })
    }

    /// Transaction ID: double SHA-256 of the wire encoding.
    pub fn txid(&self) -> Hash256 {
        Hash256::double_sha256(&self.to_bytes())
    }

    /// Sum of all output values. Returns None on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }

    fn encoded_size_hint(&self) -> usize {
        let inputs: usize = self.inputs.iter().map(|i| 41 + i.script_sig.len()).sum();
        let outputs: usize = self.outputs.iter().map(|o| 9 + o.script_pubkey.len()).sum();
        4 + 9 + inputs + 9 + outputs + 4
    }
}

fn put_script(buf: &mut Vec<u8>, script: &Script) {
    put_compact_size(buf, script.len() as u64);
    buf.put_slice(script.as_bytes());
}

fn get_count(buf: &mut &[u8]) -> Result<usize, EncodingError> {
    let n = get_compact_size(buf)?;
    // Every element takes at least one byte, which bounds allocation.
    if n > buf.remaining() as u64 {
        return Err(EncodingError::Truncated(format!("count {n}")));
    }
    Ok(n as usize)
}

fn get_script(buf: &mut &[u8]) -> Result<Script, EncodingError> {
    let len = get_count(buf)?;
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    Ok(Script(bytes))
}
