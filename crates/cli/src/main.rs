//! txledger CLI: drive the transaction contract from the shell.
//!
//! `txledger [--db <dir> | --cache] [--config <file>] [--json] COMMAND`
//! runs a single command against the ledger and exits. Errors go to stderr
//! and the process exits with status 1.

mod commands;
mod format;
mod parse;

use std::path::{Path, PathBuf};
use std::process;

use tracing::debug;
use tracing_subscriber::EnvFilter;
use txledger_contract::{LedgerConfig, ListPolicy, TxContract, CONFIG_FILE_NAME};
use txledger_core::{Ledger, RecordCodec, Result, Transaction, TxCodec};
use txledger_storage::{FileLedger, MemoryLedger};

use commands::build_cli;
use format::{format_error, format_output, Output, OutputMode};
use parse::{global_options, matches_to_command, CliCommand, GlobalOptions, LedgerTarget};

fn main() {
    init_tracing();

    let matches = build_cli().get_matches();
    let opts = global_options(&matches);
    let mode = if opts.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let command = match matches_to_command(&matches) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match run(&opts, command) {
        Ok(output) => println!("{}", format_output(&output, mode)),
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(opts: &GlobalOptions, command: CliCommand) -> Result<Output> {
    if let CliCommand::Key { binding, timestamp } = command {
        return Ok(derived_key(binding, timestamp));
    }

    let config = load_config(opts.config.as_deref())?;
    match &opts.target {
        LedgerTarget::Memory => {
            let contract = open_contract(MemoryLedger::new(), &config)?;
            execute(&contract, &config, command)
        }
        LedgerTarget::File(dir) => {
            let dir: PathBuf = dir.clone().unwrap_or_else(|| config.data_dir.clone());
            let ledger = FileLedger::open_with(&dir, config.sync_mode()?)?;
            let contract = open_contract(ledger, &config)?;
            execute(&contract, &config, command)
        }
    }
}

/// `--config <file>` must exist; the implicit `./txledger.toml` may not.
fn load_config(explicit: Option<&Path>) -> Result<LedgerConfig> {
    match explicit {
        Some(path) => LedgerConfig::from_file(path),
        None => LedgerConfig::load_or_default(Path::new(CONFIG_FILE_NAME)),
    }
}

fn open_contract<L: Ledger>(ledger: L, config: &LedgerConfig) -> Result<TxContract<L>> {
    let contract = TxContract::new(ledger);
    if config.seed_on_open && contract.store().list_keys()?.is_empty() {
        debug!("seeding empty ledger on open");
        contract.init_ledger()?;
    }
    Ok(contract)
}

fn execute<L: Ledger>(
    contract: &TxContract<L>,
    config: &LedgerConfig,
    command: CliCommand,
) -> Result<Output> {
    let output = match command {
        CliCommand::Init => Output::Keys(contract.init_ledger()?),
        CliCommand::Create { binding, timestamp } => {
            Output::Key(contract.create_tx(binding, timestamp)?)
        }
        CliCommand::Read { key } => {
            let tx = contract.read_tx(&key)?;
            Output::Tx(key.into(), tx)
        }
        CliCommand::Delete { key } => {
            contract.delete_tx(&key)?;
            Output::Ok
        }
        CliCommand::Exists { key } => Output::Bool(contract.tx_exists(&key)?),
        CliCommand::List { policy } => {
            let policy: ListPolicy = policy.unwrap_or(config.list_policy);
            let listing = contract.get_all_txs_with_policy(policy)?;
            Output::Txs {
                records: listing.records,
                skipped: listing.skipped,
            }
        }
        CliCommand::Key { binding, timestamp } => derived_key(binding, timestamp),
    };
    Ok(output)
}

/// Key derivation is pure; no ledger is opened for it.
fn derived_key(binding: String, timestamp: i64) -> Output {
    Output::Key(TxCodec.key_of(&Transaction::new(binding, timestamp)))
}
