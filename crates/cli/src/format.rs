//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): Redis-style, e.g. `"test_binding" 0`, `(empty list)`
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use serde_json::{json, Value};
use txledger_core::{Error, Transaction, TxKey};

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of one CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Ok,
    Key(TxKey),
    Keys(Vec<TxKey>),
    Bool(bool),
    Tx(TxKey, Transaction),
    Txs {
        records: Vec<(TxKey, Transaction)>,
        skipped: Vec<TxKey>,
    },
}

/// Format a successful output.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(output),
        OutputMode::Human => format_human(output),
    }
}

/// Format an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let mut body = json!({ "error": err.to_string() });
            if let Some(key) = err.key() {
                body["key"] = json!(key);
            }
            pretty(&body)
        }
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_human(output: &Output) -> String {
    match output {
        Output::Ok => "OK".to_string(),
        Output::Key(key) => key.to_string(),
        Output::Keys(keys) => numbered(keys.iter().map(|k| k.to_string())),
        Output::Bool(b) => b.to_string(),
        Output::Tx(_, tx) => tx_human(tx),
        Output::Txs { records, skipped } => {
            let mut out = numbered(
                records
                    .iter()
                    .map(|(key, tx)| format!("{} {}", key, tx_human(tx))),
            );
            for key in skipped {
                out.push_str(&format!("\n(skipped) {}", key));
            }
            out
        }
    }
}

fn tx_human(tx: &Transaction) -> String {
    format!("{:?} {}", tx.binding, tx.timestamp)
}

fn numbered(lines: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = lines
        .enumerate()
        .map(|(i, line)| format!("{}) {}", i + 1, line))
        .collect();
    if lines.is_empty() {
        "(empty list)".to_string()
    } else {
        lines.join("\n")
    }
}

fn format_json(output: &Output) -> String {
    let value = match output {
        Output::Ok => json!({ "ok": true }),
        Output::Key(key) => json!({ "key": key }),
        Output::Keys(keys) => json!({ "keys": keys }),
        Output::Bool(b) => json!({ "exists": b }),
        Output::Tx(key, tx) => tx_json(key, tx),
        Output::Txs { records, skipped } => json!({
            "transactions": records.iter().map(|(k, tx)| tx_json(k, tx)).collect::<Vec<_>>(),
            "skipped": skipped,
        }),
    };
    pretty(&value)
}

fn tx_json(key: &TxKey, tx: &Transaction) -> Value {
    json!({
        "key": key,
        "Binding": tx.binding,
        "Timestamp": tx.timestamp,
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
