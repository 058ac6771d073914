//! # sbit-wallet: coin selection and transaction assembly.
//!
//! Picks which unspent outputs fund a request and assembles fully signed
//! payment, contract-create and contract-call transactions.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`coin_selection`]: Maturity-aware smallest-first UTXO selection
//! - [`builder`]: Transaction builder with change policy and signing

pub mod builder;
pub mod coin_selection;
pub mod error;

// Re-exports for convenient access
pub use builder::{
    ChangePolicy, ContractCall, ContractCreate, Gas, Payment, SignedTransaction, TransactionBuilder,
    TransactionRequest,
};
pub use coin_selection::{CoinSelection, CoinSelector, SpendableOutput};
pub use error::WalletError;
