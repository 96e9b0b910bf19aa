use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_core::{Ledger, LedgerConfig, LedgerError};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the minimal ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction record
    Submit {
        /// Node base URL (e.g. http://127.0.0.1:8080)
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
        /// Record to queue. Parsed as JSON when possible, sent as a string otherwise
        record: String,
    },
    /// Mine all pending transactions into a block
    Mine {
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
    },
    /// Print the full chain
    Chain {
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
    },
    /// Ask the node to re-verify its chain
    Validate {
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        node: String,
    },
    /// Mine a couple of blocks locally and print the result
    Demo {
        #[arg(long, default_value_t = ledger_core::constants::DEFAULT_DIFFICULTY)]
        difficulty: u32,
    },
}

fn parse_record(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}

fn demo(difficulty: u32) -> Result<()> {
    let config = LedgerConfig::with_difficulty(difficulty);
    config.validate()?;
    let mut ledger = Ledger::with_config(&config);
    for record in [
        "James earned 10 LSU_tokens",
        "James pays Mike_the_tiger 5 LSU_tokens",
    ] {
        ledger.add_new_transaction(record);
        let index = ledger.mine()?;
        info!("mined block {index}");
    }
    match ledger.mine() {
        Err(LedgerError::EmptyPendingSet) => info!("nothing left to mine"),
        other => info!("unexpected mine result: {other:?}"),
    }

    for block in ledger.chain() {
        println!("Block {}", serde_json::to_string(block)?);
    }
    println!("Blockchain valid? {}", ledger.check_chain_validity());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    match cli.cmd {
        Command::Submit { node, record } => {
            let res = client
                .post(format!("{node}/tx"))
                .json(&parse_record(&record))
                .send()
                .await?;
            print_response(res).await?;
        }
        Command::Mine { node } => {
            print_response(client.post(format!("{node}/mine")).send().await?).await?;
        }
        Command::Chain { node } => {
            print_response(client.get(format!("{node}/chain")).send().await?).await?;
        }
        Command::Validate { node } => {
            print_response(client.get(format!("{node}/chain/valid")).send().await?).await?;
        }
        Command::Demo { difficulty } => demo(difficulty)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_parse_as_json_or_fall_back_to_text() {
        assert_eq!(parse_record(r#"{"amount":5}"#), json!({ "amount": 5 }));
        assert_eq!(parse_record("A pays B 5"), json!("A pays B 5"));
        assert_eq!(parse_record("42"), json!(42));
    }

    #[test]
    fn demo_runs_offline() {
        demo(1).unwrap();
    }

    #[test]
    fn demo_rejects_unreachable_difficulty() {
        assert!(demo(65).is_err());
    }

    #[test]
    fn submit_takes_positional_record() {
        let cli = Cli::parse_from(["ledger-cli", "submit", "A pays B 5"]);
        match cli.cmd {
            Command::Submit { node, record } => {
                assert_eq!(node, "http://127.0.0.1:8080");
                assert_eq!(record, "A pays B 5");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
