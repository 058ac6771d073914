//! Transaction builder for payments and contract transactions.
//!
//! Every build follows the same steps:
//! 1. Validate the request and compute the fee (gas cost included for contracts)
//! 2. Select coins with [`CoinSelector`]
//! 3. Add the payment or contract output, then change if it clears the
//!    [`ChangePolicy`] threshold for that kind
//! 4. Sign every input in order with the caller's [`Signer`]

use rust_decimal::Decimal;
use tracing::{debug, warn};

use sbit_core::address::Address;
use sbit_core::amount::{gas_fee, to_base_units};
use sbit_core::constants::{
    CONTRACT_ADDRESS_LEN, CONTRACT_CALL_DUST_THRESHOLD, CONTRACT_CREATE_DUST_THRESHOLD,
    PAYMENT_DUST_THRESHOLD, TX_VERSION,
};
use sbit_core::crypto::{sign_transaction_input, Signer};
use sbit_core::encoding::{decode_hex, encode_script_num};
use sbit_core::error::{AddressError, EncodingError};
use sbit_core::network::NetworkParams;
use sbit_core::script::opcodes::{OP_4, OP_CALL, OP_CREATE};
use sbit_core::script::{ScriptElement, ScriptEncoder, StandardScriptEncoder};
use sbit_core::types::{Hash256, Transaction, TxInput, TxOutput};

use crate::coin_selection::{CoinSelection, CoinSelector, SpendableOutput};
use crate::error::WalletError;

/// Largest remainder (in base units) that is folded into the fee instead of
/// becoming a change output, per transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangePolicy {
    pub payment_dust: u64,
    pub contract_create_dust: u64,
    pub contract_call_dust: u64,
}

impl Default for ChangePolicy {
    fn default() -> Self {
        Self {
            payment_dust: PAYMENT_DUST_THRESHOLD,
            contract_create_dust: CONTRACT_CREATE_DUST_THRESHOLD,
            contract_call_dust: CONTRACT_CALL_DUST_THRESHOLD,
        }
    }
}

/// Gas settings for a contract transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gas {
    /// Maximum gas the contract may consume.
    pub limit: u64,
    /// Price per gas in base units.
    pub price: u64,
}

impl Gas {
    /// Gas cost in SBIT (`limit * price / 10^8`).
    pub fn cost(&self) -> Result<Decimal, WalletError> {
        Ok(gas_fee(self.limit, self.price)?)
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.limit == 0 {
            return Err(WalletError::InvalidAmount("gas limit must be non-zero".into()));
        }
        if self.price == 0 {
            return Err(WalletError::InvalidAmount("gas price must be non-zero".into()));
        }
        if self.limit > i64::MAX as u64 || self.price > i64::MAX as u64 {
            return Err(WalletError::InvalidAmount("gas exceeds script number range".into()));
        }
        Ok(())
    }
}

/// A plain payment to an address.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub to: Address,
    /// Amount in SBIT.
    pub amount: Decimal,
}

/// Deployment of new contract bytecode.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCreate {
    /// Hex-encoded contract bytecode.
    pub bytecode: String,
    pub gas: Gas,
}

/// A call into an existing contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    /// Hex-encoded 20-byte contract address.
    pub contract_address: String,
    /// Hex-encoded ABI call data.
    pub call_data: String,
    pub gas: Gas,
    /// Value transferred into the contract, in SBIT.
    pub amount: Decimal,
}

/// Any transaction the builder can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionRequest {
    Payment(Payment),
    ContractCreate(ContractCreate),
    ContractCall(ContractCall),
}

/// A fully signed transaction and how it was funded.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx: Transaction,
    /// The coin selection used to fund the transaction.
    pub selection: CoinSelection,
    /// Fee actually paid in base units (inputs minus outputs, forfeited dust included).
    pub fee: u64,
    /// Value returned to the sender, zero if no change output was added.
    pub change: u64,
}

impl SignedTransaction {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.tx.to_bytes()
    }

    /// Raw transaction hex for broadcast.
    pub fn to_hex(&self) -> String {
        self.tx.to_hex()
    }

    pub fn txid(&self) -> Hash256 {
        self.tx.txid()
    }
}

/// Builder for signed SBit transactions.
///
/// # Example
/// ```ignore
/// let builder = TransactionBuilder::new(Network::Testnet.params());
/// let signed = builder.build_payment(&keypair, &payment, dec!(0.01), &utxos)?;
/// println!("{}", signed.to_hex());
/// ```
pub struct TransactionBuilder {
    network: NetworkParams,
    change_policy: ChangePolicy,
    encoder: Box<dyn ScriptEncoder>,
    lock_time: u32,
}

impl TransactionBuilder {
    /// Create a builder for `network` with the default change policy.
    pub fn new(network: NetworkParams) -> Self {
        Self {
            network,
            change_policy: ChangePolicy::default(),
            encoder: Box::new(StandardScriptEncoder),
            lock_time: 0,
        }
    }

    pub fn set_change_policy(&mut self, policy: ChangePolicy) -> &mut Self {
        self.change_policy = policy;
        self
    }

    /// Replace the script encoder used for contract outputs.
    pub fn set_script_encoder(&mut self, encoder: Box<dyn ScriptEncoder>) -> &mut Self {
        self.encoder = encoder;
        self
    }

    pub fn set_lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    pub fn network(&self) -> &NetworkParams {
        &self.network
    }

    pub fn change_policy(&self) -> &ChangePolicy {
        &self.change_policy
    }

    /// Build any request kind. `fee` is the base fee in SBIT; contract
    /// requests add their gas cost on top.
    pub fn build(
        &self,
        request: &TransactionRequest,
        fee: Decimal,
        signer: &dyn Signer,
        utxos: &[SpendableOutput],
    ) -> Result<SignedTransaction, WalletError> {
        match request {
            TransactionRequest::Payment(p) => self.build_payment(signer, p, fee, utxos),
            TransactionRequest::ContractCreate(c) => {
                self.build_contract_create(signer, c, fee, utxos)
            }
            TransactionRequest::ContractCall(c) => self.build_contract_call(signer, c, fee, utxos),
        }
    }

    /// Pay `payment.amount` to `payment.to`, returning change above
    /// `payment_dust` to the signer.
    pub fn build_payment(
        &self,
        signer: &dyn Signer,
        payment: &Payment,
        fee: Decimal,
        utxos: &[SpendableOutput],
    ) -> Result<SignedTransaction, WalletError> {
        self.check_destination(&payment.to)?;
        let amount_units = to_base_units(payment.amount)?;
        let fee_units = to_base_units(fee)?;

        let selection = CoinSelector::select(utxos, payment.amount, fee, &self.network)?;
        let remainder = selection.total - amount_units - fee_units;

        let outputs = vec![TxOutput {
            value: amount_units,
            script_pubkey: payment.to.script_pubkey(),
        }];
        self.finish(
            "payment",
            signer,
            selection,
            outputs,
            remainder,
            self.change_policy.payment_dust,
        )
    }

    /// Deploy contract bytecode. No value is transferred; the gas cost plus
    /// `fee` is funded and change above `contract_create_dust` returned.
    pub fn build_contract_create(
        &self,
        signer: &dyn Signer,
        create: &ContractCreate,
        fee: Decimal,
        utxos: &[SpendableOutput],
    ) -> Result<SignedTransaction, WalletError> {
        create.gas.validate()?;
        let bytecode = decode_hex(&create.bytecode)?;
        if bytecode.is_empty() {
            return Err(WalletError::BuildError("empty contract bytecode".into()));
        }
        let total_fee = effective_fee(&create.gas, fee)?;
        let fee_units = to_base_units(total_fee)?;

        let selection = CoinSelector::select(utxos, Decimal::ZERO, total_fee, &self.network)?;
        let remainder = selection.total - fee_units;

        let script = self.encoder.compile(&[
            ScriptElement::Op(OP_4),
            ScriptElement::Data(script_num(create.gas.limit)?),
            ScriptElement::Data(script_num(create.gas.price)?),
            ScriptElement::Data(bytecode),
            ScriptElement::Op(OP_CREATE),
        ]);
        let outputs = vec![TxOutput {
            value: 0,
            script_pubkey: script,
        }];
        self.finish(
            "contract create",
            signer,
            selection,
            outputs,
            remainder,
            self.change_policy.contract_create_dust,
        )
    }

    /// Call a contract, sending `call.amount` into it. Change at or below
    /// `contract_call_dust` is forfeited to the fee.
    pub fn build_contract_call(
        &self,
        signer: &dyn Signer,
        call: &ContractCall,
        fee: Decimal,
        utxos: &[SpendableOutput],
    ) -> Result<SignedTransaction, WalletError> {
        call.gas.validate()?;
        let contract = decode_hex(&call.contract_address)?;
        if contract.len() != CONTRACT_ADDRESS_LEN {
            return Err(EncodingError::UnexpectedLength {
                got: contract.len(),
                expected: CONTRACT_ADDRESS_LEN,
            }
            .into());
        }
        let data = decode_hex(&call.call_data)?;
        let total_fee = effective_fee(&call.gas, fee)?;
        let fee_units = to_base_units(total_fee)?;
        let amount_units = to_base_units(call.amount)?;

        let selection = CoinSelector::select(utxos, call.amount, total_fee, &self.network)?;
        let remainder = selection.total - fee_units - amount_units;

        let script = self.encoder.compile(&[
            ScriptElement::Op(OP_4),
            ScriptElement::Data(script_num(call.gas.limit)?),
            ScriptElement::Data(script_num(call.gas.price)?),
            ScriptElement::Data(data),
            ScriptElement::Data(contract),
            ScriptElement::Op(OP_CALL),
        ]);
        let outputs = vec![TxOutput {
            value: amount_units,
            script_pubkey: script,
        }];
        self.finish(
            "contract call",
            signer,
            selection,
            outputs,
            remainder,
            self.change_policy.contract_call_dust,
        )
    }

    fn check_destination(&self, to: &Address) -> Result<(), WalletError> {
        if to.version() != self.network.pub_key_hash && to.version() != self.network.script_hash {
            return Err(AddressError::WrongNetwork(to.version(), self.network.name.clone()).into());
        }
        Ok(())
    }

    /// Add change, attach inputs and sign them in order.
    fn finish(
        &self,
        kind: &str,
        signer: &dyn Signer,
        selection: CoinSelection,
        mut outputs: Vec<TxOutput>,
        remainder: u64,
        dust_threshold: u64,
    ) -> Result<SignedTransaction, WalletError> {
        let change = if remainder > dust_threshold {
            let sender = Address::from_public_key(&signer.public_key(), &self.network);
            outputs.push(TxOutput {
                value: remainder,
                script_pubkey: sender.script_pubkey(),
            });
            remainder
        } else {
            if remainder > 0 {
                warn!(kind, remainder, dust_threshold, "change below dust threshold added to fee");
            }
            0
        };

        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: selection
                .selected
                .iter()
                .map(|u| TxInput::unsigned(u.outpoint()))
                .collect(),
            outputs,
            lock_time: self.lock_time,
        };

        for index in 0..tx.inputs.len() {
            sign_transaction_input(&mut tx, index, signer)
                .map_err(|source| WalletError::Signing { index, source })?;
        }

        let output_total = tx
            .total_output_value()
            .ok_or_else(|| WalletError::BuildError("output total overflows".into()))?;
        let fee = selection.total - output_total;

        debug!(
            kind,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fee,
            change,
            "transaction assembled"
        );

        Ok(SignedTransaction {
            tx,
            selection,
            fee,
            change,
        })
    }
}

/// Base fee plus gas cost, in SBIT.
pub fn effective_fee(gas: &Gas, fee: Decimal) -> Result<Decimal, WalletError> {
    gas.cost()?
        .checked_add(fee)
        .ok_or_else(|| WalletError::InvalidAmount("fee overflows".into()))
}

fn script_num(value: u64) -> Result<Vec<u8>, WalletError> {
    let n = i64::try_from(value)
        .map_err(|_| WalletError::InvalidAmount(format!("{value} exceeds script number range")))?;
    Ok(encode_script_num(n))
}
