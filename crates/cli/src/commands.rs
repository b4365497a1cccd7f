//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("txledger")
        .about("Content-addressed transaction store")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("db")
                .long("db")
                .help("Ledger directory (default: data_dir from txledger.toml, else .txledger)")
                .global(true),
        )
        .arg(
            Arg::new("cache")
                .long("cache")
                .help("Ephemeral in-memory ledger, no disk")
                .action(ArgAction::SetTrue)
                .conflicts_with("db")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file (default: ./txledger.toml if present)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("init").about("Seed the well-known transactions"))
        .subcommand(
            Command::new("create")
                .about("Create a transaction and print its key")
                .arg(binding_arg())
                .arg(timestamp_arg()),
        )
        .subcommand(
            Command::new("read")
                .about("Print the transaction stored under a key")
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete the transaction stored under a key")
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("exists")
                .about("Print whether a key is present")
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("Print every transaction in key order")
                .arg(
                    Arg::new("skip-malformed")
                        .long("skip-malformed")
                        .help("Skip entries that fail to decode instead of failing")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("key")
                .about("Print the key a transaction would be stored under")
                .arg(binding_arg())
                .arg(timestamp_arg()),
        )
}

fn binding_arg() -> Arg {
    Arg::new("binding").required(true).help("Transaction binding")
}

fn timestamp_arg() -> Arg {
    Arg::new("timestamp")
        .required(true)
        .value_parser(value_parser!(i64))
        .allow_negative_numbers(true)
        .help("Transaction timestamp (signed 64-bit integer)")
}

fn key_arg() -> Arg {
    Arg::new("key").required(true).help("Transaction key (hex)")
}
