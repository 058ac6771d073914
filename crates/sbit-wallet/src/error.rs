//! Wallet error types.

use sbit_core::error::{AddressError, AmountError, CryptoError, EncodingError, TransactionError};
use thiserror::Error;

/// Errors that can occur while selecting coins or assembling a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Mature outputs do not cover the amount plus fees.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Total value of all mature outputs, in base units.
        have: u64,
        /// Required amount plus fee, in base units.
        need: u64,
    },

    /// No UTXOs were supplied.
    #[error("no UTXOs available")]
    NoUtxos,

    /// Amount or fee could not be converted to base units.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Out-of-range request parameter.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Hex or script-number input could not be decoded.
    #[error("malformed input: {0}")]
    Malformed(#[from] EncodingError),

    /// Destination address could not be used.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The signer failed on a specific input.
    #[error("signing input {index}: {source}")]
    Signing {
        index: usize,
        #[source]
        source: CryptoError,
    },

    /// Transaction encoding error from sbit-core.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Transaction build error.
    #[error("build error: {0}")]
    BuildError(String),
}
