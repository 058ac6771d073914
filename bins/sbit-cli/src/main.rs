//! sbit-cli: build signed SBit transactions from the command line.
//!
//! Reads spendable outputs from a JSON file, selects coins and prints the
//! signed raw transaction hex, ready for `sendrawtransaction`.

mod config;
mod utxos;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use sbit_core::address::Address;
use sbit_core::amount::{from_base_units, parse_amount, parse_base_units};
use sbit_core::crypto::KeyPair;
use sbit_core::network::{Network, NetworkParams};
use sbit_wallet::{
    CoinSelector, ContractCall, ContractCreate, Gas, Payment, SignedTransaction,
    TransactionBuilder, TransactionRequest,
};
use tracing::info;

use crate::config::CliConfig;

/// SBit transaction builder.
#[derive(Parser)]
#[command(name = "sbit-cli")]
#[command(version, about = "Build signed SBit payments and contract transactions.")]
struct Cli {
    /// Network (mainnet or testnet). Overrides SBIT_NETWORK.
    #[arg(short, long, global = true)]
    network: Option<Network>,

    /// UTXO JSON file. Overrides SBIT_UTXO_FILE.
    #[arg(short, long, global = true)]
    utxos: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which outputs would fund an amount plus fee.
    Select(SelectArgs),
    /// Pay an address.
    Pay(PayArgs),
    /// Deploy contract bytecode.
    CreateContract(CreateContractArgs),
    /// Call a deployed contract.
    CallContract(CallContractArgs),
    /// Show the address for a WIF key, or generate a new key.
    Address(AddressArgs),
}

#[derive(Args)]
struct SelectArgs {
    /// Amount in SBIT.
    #[arg(long, value_parser = parse_sbit)]
    amount: Decimal,

    /// Fee in SBIT.
    #[arg(long, value_parser = parse_sbit, default_value = "0")]
    fee: Decimal,
}

/// Options shared by every signing subcommand.
#[derive(Args)]
struct SigningArgs {
    /// Sender private key in WIF.
    #[arg(long, env = "SBIT_WIF", hide_env_values = true)]
    wif: String,

    /// Base fee in SBIT.
    #[arg(long, value_parser = parse_sbit, default_value = "0.01")]
    fee: Decimal,

    /// Transaction lock time.
    #[arg(long, default_value_t = 0)]
    lock_time: u32,
}

#[derive(Args)]
struct GasArgs {
    /// Gas limit.
    #[arg(long, value_parser = parse_gas, default_value = "250000")]
    gas_limit: u64,

    /// Gas price in base units per gas.
    #[arg(long, value_parser = parse_gas, default_value = "40")]
    gas_price: u64,
}

impl GasArgs {
    fn gas(&self) -> Gas {
        Gas {
            limit: self.gas_limit,
            price: self.gas_price,
        }
    }
}

#[derive(Args)]
struct PayArgs {
    /// Recipient address.
    #[arg(long)]
    to: String,

    /// Amount in SBIT.
    #[arg(long, value_parser = parse_sbit)]
    amount: Decimal,

    #[command(flatten)]
    signing: SigningArgs,
}

#[derive(Args)]
struct CreateContractArgs {
    /// Contract bytecode as hex.
    #[arg(long)]
    bytecode: String,

    #[command(flatten)]
    gas: GasArgs,

    #[command(flatten)]
    signing: SigningArgs,
}

#[derive(Args)]
struct CallContractArgs {
    /// Contract address as 40 hex characters.
    #[arg(long)]
    contract: String,

    /// ABI-encoded call data as hex.
    #[arg(long, default_value = "")]
    data: String,

    /// Value sent to the contract in SBIT.
    #[arg(long, value_parser = parse_sbit, default_value = "0")]
    amount: Decimal,

    #[command(flatten)]
    gas: GasArgs,

    #[command(flatten)]
    signing: SigningArgs,
}

#[derive(Args)]
struct AddressArgs {
    /// Private key in WIF. A new key is generated when omitted.
    #[arg(long, env = "SBIT_WIF", hide_env_values = true)]
    wif: Option<String>,
}

fn main() -> Result<()> {
    let config = CliConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let network = cli.network.unwrap_or(config.network);
    let utxo_file = cli.utxos.unwrap_or(config.utxo_file);
    let params = network.params();

    match cli.command {
        Commands::Select(args) => select(&params, &utxo_file, args),
        Commands::Pay(args) => {
            let to = Address::decode(&args.to, &params)
                .with_context(|| format!("Invalid {} address {}", params.name, args.to))?;
            let request = TransactionRequest::Payment(Payment {
                to,
                amount: args.amount,
            });
            build(&params, &utxo_file, &args.signing, &request)
        }
        Commands::CreateContract(args) => {
            let request = TransactionRequest::ContractCreate(ContractCreate {
                bytecode: args.bytecode,
                gas: args.gas.gas(),
            });
            build(&params, &utxo_file, &args.signing, &request)
        }
        Commands::CallContract(args) => {
            let request = TransactionRequest::ContractCall(ContractCall {
                contract_address: args.contract,
                call_data: args.data,
                gas: args.gas.gas(),
                amount: args.amount,
            });
            build(&params, &utxo_file, &args.signing, &request)
        }
        Commands::Address(args) => address(&params, args),
    }
}

fn select(params: &NetworkParams, utxo_file: &Path, args: SelectArgs) -> Result<()> {
    let utxos = utxos::load_utxos(utxo_file)?;
    let selection = CoinSelector::select(&utxos, args.amount, args.fee, params)
        .context("Coin selection failed")?;
    println!("{}", serde_json::to_string_pretty(&selection)?);
    Ok(())
}

fn build(
    params: &NetworkParams,
    utxo_file: &Path,
    signing: &SigningArgs,
    request: &TransactionRequest,
) -> Result<()> {
    let keypair = KeyPair::from_wif(&signing.wif, params).context("Invalid WIF key")?;
    let utxos = utxos::load_utxos(utxo_file)?;

    let mut builder = TransactionBuilder::new(params.clone());
    builder.set_lock_time(signing.lock_time);
    let signed = builder
        .build(request, signing.fee, &keypair, &utxos)
        .context("Failed to build transaction")?;

    report(&signed);
    println!("{}", signed.to_hex());
    Ok(())
}

fn report(signed: &SignedTransaction) {
    info!(
        txid = %signed.txid(),
        inputs = signed.tx.inputs.len(),
        outputs = signed.tx.outputs.len(),
        fee = %from_base_units(signed.fee),
        change = %from_base_units(signed.change),
        "transaction signed"
    );
}

fn address(params: &NetworkParams, args: AddressArgs) -> Result<()> {
    let keypair = match args.wif {
        Some(wif) => KeyPair::from_wif(&wif, params).context("Invalid WIF key")?,
        None => {
            let keypair = KeyPair::generate();
            println!("WIF: {}", keypair.to_wif(params));
            keypair
        }
    };
    let address = Address::from_public_key(&keypair.public_key_bytes(), params);
    println!("{address}");
    Ok(())
}

/// clap value parser for SBIT amounts.
fn parse_sbit(s: &str) -> Result<Decimal, String> {
    parse_amount(s).map_err(|e| e.to_string())
}

/// clap value parser for gas limit and price, which are whole base units.
fn parse_gas(s: &str) -> Result<u64, String> {
    parse_base_units(s).map_err(|e| e.to_string())
}
