//! Error types for the SBit core crate.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("odd-length hex string: {0} characters")] OddLength(usize),
    #[error("invalid hex character {c:?} at index {index}")] InvalidHexCharacter { c: char, index: usize },
    #[error("non-minimal script number encoding")] NonMinimalNumber,
    #[error("script number too wide: {0} bytes")] NumberTooWide(usize),
    #[error("value out of range: {0}")] OutOfRange(String),
    #[error("unexpected length: got {got}, expected {expected}")] UnexpectedLength { got: usize, expected: usize },
    #[error("truncated data: {0}")] Truncated(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("negative amount: {0}")] Negative(String),
    #[error("more than 8 decimal places: {0}")] TooPrecise(String),
    #[error("amount overflow: {0}")] Overflow(String),
    #[error("unparseable amount {input:?}: {reason}")] Parse { input: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58check: {0}")] InvalidBase58(String),
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("version byte {0:#04x} does not belong to network {1}")] WrongNetwork(u8, String),
    #[error("unknown network: {0}")] UnknownNetwork(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("invalid secret key: {0}")] InvalidSecretKey(String),
    #[error("signature verification failed")] VerificationFailed,
    #[error("pubkey hash does not match expected")] PubkeyHashMismatch,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error("malformed script signature")] MalformedScriptSig,
    #[error("signer rejected input: {0}")] Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("empty inputs or outputs")] EmptyInputsOrOutputs,
    #[error("value overflow")] ValueOverflow,
    #[error("decode: {0}")] Decode(#[from] EncodingError),
    #[error("trailing bytes after transaction: {0}")] TrailingBytes(usize),
}
