//! Property and end-to-end test suite for SBit transaction building.
//!
//! Exercises coin selection and the transaction builder from the outside:
//! value conservation, change rules, maturity filtering and signature
//! validity over generated UTXO sets.

pub mod helpers;
