//! ArgMatches → CliCommand / LedgerTarget conversion.

use std::path::PathBuf;

use clap::ArgMatches;
use txledger_contract::ListPolicy;

/// A contract operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Init,
    Create { binding: String, timestamp: i64 },
    Read { key: String },
    Delete { key: String },
    Exists { key: String },
    List { policy: Option<ListPolicy> },
    Key { binding: String, timestamp: i64 },
}

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerTarget {
    /// `--cache`
    Memory,
    /// `--db <dir>`, or `None` for the configured data directory
    File(Option<PathBuf>),
}

/// Global options shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub target: LedgerTarget,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// Extract the global flags.
pub fn global_options(matches: &ArgMatches) -> GlobalOptions {
    let target = if matches.get_flag("cache") {
        LedgerTarget::Memory
    } else {
        LedgerTarget::File(matches.get_one::<String>("db").map(PathBuf::from))
    };
    GlobalOptions {
        target,
        config: matches.get_one::<String>("config").map(PathBuf::from),
        json: matches.get_flag("json"),
    }
}

/// Convert the subcommand into a `CliCommand`.
pub fn matches_to_command(matches: &ArgMatches) -> Result<CliCommand, String> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| "no command given".to_string())?;
    let command = match name {
        "init" => CliCommand::Init,
        "create" => CliCommand::Create {
            binding: string_arg(sub, "binding")?,
            timestamp: timestamp_arg(sub)?,
        },
        "read" => CliCommand::Read {
            key: string_arg(sub, "key")?,
        },
        "delete" => CliCommand::Delete {
            key: string_arg(sub, "key")?,
        },
        "exists" => CliCommand::Exists {
            key: string_arg(sub, "key")?,
        },
        "list" => CliCommand::List {
            policy: sub
                .get_flag("skip-malformed")
                .then_some(ListPolicy::SkipMalformed),
        },
        "key" => CliCommand::Key {
            binding: string_arg(sub, "binding")?,
            timestamp: timestamp_arg(sub)?,
        },
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(command)
}

fn string_arg(matches: &ArgMatches, name: &str) -> Result<String, String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("missing <{}>", name))
}

fn timestamp_arg(matches: &ArgMatches) -> Result<i64, String> {
    matches
        .get_one::<i64>("timestamp")
        .copied()
        .ok_or_else(|| "missing <timestamp>".to_string())
}
