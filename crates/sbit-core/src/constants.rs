//! Protocol constants. All monetary values in satoshi-style base units (1 SBIT = 10^8 units).

/// Base units per whole SBIT.
pub const COIN: u64 = 100_000_000;

/// Number of fractional decimal digits in an SBIT amount.
pub const COIN_DECIMALS: u32 = 8;

/// Confirmations a coinstake output needs before it may be spent.
pub const STAKE_MATURITY: u64 = 2000;

/// Change at or below this value is dropped from payment transactions.
///
/// Zero means any strictly positive remainder gets a change output.
pub const PAYMENT_DUST_THRESHOLD: u64 = 0;

/// Change at or below this value is dropped from contract-create transactions.
pub const CONTRACT_CREATE_DUST_THRESHOLD: u64 = 0;

/// Change at or below this value is forfeited as fee on contract-call
/// transactions (0.00072799 SBIT).
pub const CONTRACT_CALL_DUST_THRESHOLD: u64 = 72_799;

/// Transaction format version.
pub const TX_VERSION: i32 = 1;

/// Final input sequence number (no relative lock).
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Signature hash type committing to all inputs and outputs.
pub const SIGHASH_ALL: u32 = 0x01;

/// Length of a hash160-style key or script hash.
pub const HASH160_LEN: usize = 20;

/// Length of a contract address.
pub const CONTRACT_ADDRESS_LEN: usize = 20;
