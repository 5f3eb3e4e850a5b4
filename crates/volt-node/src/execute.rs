//! The `execute` command

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use volt_api::{ReceiptJson, TransactionRequest};
use volt_crypto::keccak256;
use volt_metrics::{ExecutionMetrics, MetricsSnapshot};
use volt_runtime::{BlockEnvironment, GenesisConfig, Runtime, RuntimeError};
use volt_storage::{MemoryBackend, State};

use crate::cli::ExecuteArgs;
use crate::config::load_runtime_config;

/// What `execute` produced
#[derive(Debug)]
pub enum Outcome {
    /// The transaction ran and produced a receipt
    Executed {
        /// Receipt JSON
        receipt: ReceiptJson,
        /// Metrics JSON, when requested
        metrics: Option<String>,
    },
    /// The transaction was rejected before execution
    Rejected(RuntimeError),
}

/// Synthetic block ids: keccak of the big-endian block number
fn block_id(number: u32) -> volt_primitives::H256 {
    keccak256(&number.to_be_bytes())
}

/// Run the command
pub fn run(args: &ExecuteArgs) -> Result<Outcome> {
    let genesis = GenesisConfig::load(&args.genesis)
        .with_context(|| format!("failed to load genesis {}", args.genesis.display()))?;
    let config = load_runtime_config(args.config.as_deref())?;
    let request_json = std::fs::read_to_string(&args.tx)
        .with_context(|| format!("failed to read transaction request {}", args.tx.display()))?;
    let tx = TransactionRequest::from_json(&request_json)
        .and_then(|request| request.sign())
        .context("invalid transaction request")?;

    let mut state = State::new(Arc::new(MemoryBackend::new()));
    genesis.apply(&mut state)?;
    state.commit()?;

    let env = BlockEnvironment {
        beneficiary: volt_primitives::Address::ZERO,
        number: args.number,
        time: args.time.unwrap_or(genesis.timestamp),
        gas_limit: args.gas_limit,
        get_block_id: Arc::new(block_id),
    };
    info!(number = env.number, time = env.time, tx = %tx.hash(), "executing transaction");

    let metrics = Arc::new(ExecutionMetrics::new());
    let mut runtime = Runtime::new(state, env)
        .with_metrics(Arc::clone(&metrics))
        .with_config(config);

    let snapshot = |metrics: &ExecutionMetrics| -> Result<Option<String>> {
        if !args.metrics {
            return Ok(None);
        }
        Ok(Some(MetricsSnapshot::from_metrics(metrics).to_json()?))
    };

    match runtime.execute_transaction(&tx) {
        Ok((receipt, _)) => Ok(Outcome::Executed {
            receipt: ReceiptJson::from(&receipt),
            metrics: snapshot(&metrics)?,
        }),
        Err(RuntimeError::Storage(err)) => Err(err.into()),
        Err(err) => Ok(Outcome::Rejected(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn sender() -> volt_primitives::Address {
        let bytes = volt_api::parse_hex_bytes("privateKey", KEY).unwrap();
        let key = volt_crypto::PrivateKey::from_slice(&bytes).unwrap();
        volt_crypto::public_key_to_address(key.verifying_key())
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args(dir: &Path, energy: &str) -> ExecuteArgs {
        let genesis = format!(
            r#"{{"timestamp": 100, "alloc": {{"{}": {{"balance": "1000", "energy": "{energy}"}}}}}}"#,
            sender()
        );
        let request = format!(
            r#"{{"privateKey": "{KEY}", "gas": 50000, "gasPrice": "1",
                "clauses": [{{"to": "0x00000000000000000000000000000000000000aa", "value": "5"}}]}}"#
        );
        ExecuteArgs {
            genesis: write(dir, "genesis.json", &genesis),
            tx: write(dir, "tx.json", &request),
            time: None,
            number: 1,
            gas_limit: 10_000_000,
            config: None,
            metrics: true,
        }
    }

    #[test]
    fn test_block_ids_differ() {
        assert_ne!(block_id(1), block_id(2));
    }

    #[test]
    fn test_execute_prints_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let (receipt, metrics) = match run(&args(dir.path(), "1000000")).unwrap() {
            Outcome::Executed { receipt, metrics } => (receipt, metrics),
            other => panic!("expected a receipt, got {other:?}"),
        };
        assert!(!receipt.reverted);
        assert_eq!(receipt.gas_used, "0x5208");
        assert_eq!(receipt.outputs.len(), 1);
        assert!(metrics.unwrap().contains("\"executed\": 1"));
    }

    #[test]
    fn test_execute_reports_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(&args(dir.path(), "10")).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(RuntimeError::InsufficientEnergy { .. })));
    }

    #[test]
    fn test_execute_missing_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), "1");
        args.genesis = dir.path().join("absent.json");
        assert!(run(&args).is_err());
    }
}
