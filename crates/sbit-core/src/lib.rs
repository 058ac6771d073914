//! # sbit-core
//! Foundation types, encodings and network parameters for the SBit chain.

pub mod address;
pub mod amount;
pub mod constants;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod network;
pub mod script;
pub mod types;
