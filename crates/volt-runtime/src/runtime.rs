//! Transaction processor
//!
//! A [`Runtime`] is bound to one block. For every transaction it recovers the
//! origin, prepays gas with energy, runs the clauses in order against the VM and
//! returns unused gas to whoever paid. A clause fault discards the effects of
//! every clause but keeps the gas charge.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use volt_builtins::energy;
use volt_metrics::ExecutionMetrics;
use volt_primitives::{Address, H256, U256};
use volt_storage::State;
use volt_types::{receipt, Clause, Receipt, Transaction, TxError};
use volt_evm::{Context, GetHashFn, Output, Vm, VmConfig, VmError};

use crate::error::{RuntimeError, RuntimeResult};

/// Block the runtime executes in
#[derive(Clone)]
pub struct BlockEnvironment {
    /// Block beneficiary
    pub beneficiary: Address,
    /// Block number
    pub number: u32,
    /// Block timestamp
    pub time: u64,
    /// Block gas limit
    pub gas_limit: u64,
    /// Block number to block id, for `BLOCKHASH`
    pub get_block_id: GetHashFn,
}

impl Default for BlockEnvironment {
    fn default() -> Self {
        Self {
            beneficiary: Address::ZERO,
            number: 0,
            time: 0,
            gas_limit: 0,
            get_block_id: Arc::new(|_| H256::ZERO),
        }
    }
}

impl fmt::Debug for BlockEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockEnvironment")
            .field("beneficiary", &self.beneficiary)
            .field("number", &self.number)
            .field("time", &self.time)
            .field("gas_limit", &self.gas_limit)
            .finish_non_exhaustive()
    }
}

fn default_metrics() -> bool {
    false
}

/// Runtime tuning
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// VM limits
    #[serde(default)]
    pub vm: VmConfig,
    /// Keep execution metrics when no shared collector was supplied
    #[serde(default = "default_metrics")]
    pub metrics: bool,
}

/// Executes transactions of one block against a world state
pub struct Runtime {
    state: State,
    env: BlockEnvironment,
    config: RuntimeConfig,
    metrics: Option<Arc<ExecutionMetrics>>,
}

impl Runtime {
    /// Create a runtime with default limits
    pub fn new(state: State, env: BlockEnvironment) -> Self {
        Self {
            state,
            env,
            config: RuntimeConfig::default(),
            metrics: None,
        }
    }

    /// Apply a configuration
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        if config.metrics && self.metrics.is_none() {
            self.metrics = Some(Arc::new(ExecutionMetrics::new()));
        }
        self
    }

    /// Record into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<ExecutionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the VM limits
    pub fn set_vm_config(&mut self, vm: VmConfig) {
        self.config.vm = vm;
    }

    /// Current configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Block environment
    pub fn env(&self) -> &BlockEnvironment {
        &self.env
    }

    /// Metrics collector, if any
    pub fn metrics(&self) -> Option<&Arc<ExecutionMetrics>> {
        self.metrics.as_ref()
    }

    /// World state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable world state
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Take back the world state
    pub fn into_state(self) -> State {
        self.state
    }

    /// Run one clause as a state-changing call or creation
    pub fn call(
        &mut self,
        clause: &Clause,
        index: u32,
        gas: u64,
        origin: Address,
        gas_price: U256,
        tx_id: H256,
    ) -> Output {
        self.execute(clause, index, gas, origin, gas_price, tx_id, false)
    }

    /// Run one clause read-only.
    ///
    /// # Panics
    ///
    /// Panics if the clause has no recipient.
    pub fn static_call(
        &mut self,
        clause: &Clause,
        index: u32,
        gas: u64,
        origin: Address,
        gas_price: U256,
        tx_id: H256,
    ) -> Output {
        self.execute(clause, index, gas, origin, gas_price, tx_id, true)
    }

    #[allow(clippy::too_many_arguments)]
    fn execute(
        &mut self,
        clause: &Clause,
        index: u32,
        gas: u64,
        origin: Address,
        gas_price: U256,
        tx_id: H256,
        is_static: bool,
    ) -> Output {
        if is_static && clause.to.is_none() {
            panic!("static call requires 'to'");
        }

        let ctx = Context {
            beneficiary: self.env.beneficiary,
            number: self.env.number,
            time: self.env.time,
            gas_limit: self.env.gas_limit,
            origin,
            gas_price,
            tx_id,
            clause_index: index,
            get_hash: Arc::clone(&self.env.get_block_id),
        };
        let mut vm = Vm::new(ctx, &mut self.state, self.config.vm);
        volt_builtins::hook_all(&mut vm);

        let data = clause.data.clone();
        match clause.to {
            None => vm.create(origin, data, gas, clause.value),
            Some(to) if is_static => vm.static_call(origin, to, data, gas),
            Some(to) => vm.call(origin, to, data, gas, clause.value),
        }
    }

    /// Execute a transaction.
    ///
    /// Returns the receipt plus the raw output of every clause that ran,
    /// including the one that faulted. A rejected transaction leaves state
    /// untouched and produces no receipt.
    pub fn execute_transaction(&mut self, tx: &Transaction) -> RuntimeResult<(Receipt, Vec<Output>)> {
        let result = self.process(tx);
        match &result {
            Ok((receipt, outputs)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_executed(receipt.gas_used, receipt.reverted, outputs.len());
                }
            }
            Err(err) => {
                warn!(tx = %tx.hash(), reason = err.reason(), error = %err, "transaction rejected");
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejected(err.reason());
                }
            }
        }
        result
    }

    fn process(&mut self, tx: &Transaction) -> RuntimeResult<(Receipt, Vec<Output>)> {
        let origin = tx.origin().map_err(|err| match err {
            TxError::InvalidSignature(err) => RuntimeError::InvalidSignature(err),
            other => RuntimeError::MalformedTransaction(other.to_string()),
        })?;
        let intrinsic = tx
            .intrinsic_gas()
            .map_err(|err| RuntimeError::MalformedTransaction(err.to_string()))?;
        let gas = tx.gas();
        if intrinsic > gas {
            return Err(RuntimeError::InsufficientGas {
                intrinsic,
                provided: gas,
            });
        }

        let gas_price = tx.gas_price();
        let prepaid = U256::from(gas)
            .checked_mul(gas_price)
            .ok_or_else(|| RuntimeError::MalformedTransaction("gas times gas price overflows".into()))?;
        let tx_id = tx.id_for(&origin);

        // Storage failures unwind to here so a rejected transaction leaves no trace
        let guard = self.state.new_checkpoint();
        match self.settle(tx, origin, tx_id, intrinsic, prepaid) {
            Ok(result) => {
                self.state.discard_checkpoint(guard);
                Ok(result)
            }
            Err(err) => {
                self.state.revert_to(guard);
                Err(err)
            }
        }
    }

    fn settle(
        &mut self,
        tx: &Transaction,
        origin: Address,
        tx_id: H256,
        intrinsic: u64,
        prepaid: U256,
    ) -> RuntimeResult<(Receipt, Vec<Output>)> {
        let time = self.env.time;
        let gas_price = tx.gas_price();
        let clauses = tx.clauses();

        let (payer, paid) = energy::consume(&mut self.state, time, origin, common_to(clauses), prepaid)?;
        if !paid {
            return Err(RuntimeError::InsufficientEnergy {
                payer,
                required: prepaid,
            });
        }

        let checkpoint = self.state.new_checkpoint();
        let mut leftover = tx.gas() - intrinsic;
        let mut reverted = false;
        let mut receipt_outputs = Vec::with_capacity(clauses.len());
        let mut outputs = Vec::with_capacity(clauses.len());

        for (index, clause) in clauses.iter().enumerate() {
            let out = self.call(clause, index as u32, leftover, origin, gas_price, tx_id);
            if let Some(VmError::Storage(err)) = out.vm_err {
                return Err(RuntimeError::Storage(err));
            }

            let used = leftover.saturating_sub(out.leftover_gas);
            let refund = out.refund_gas.min(used / 2);
            leftover = out.leftover_gas + refund;
            trace!(index, used, refund, leftover, error = ?out.vm_err, "clause executed");

            let failed = out.vm_err.is_some();
            if !failed {
                receipt_outputs.push(receipt::Output {
                    logs: out.logs.clone(),
                });
            }
            outputs.push(out);
            if failed {
                self.state.revert_to(checkpoint);
                receipt_outputs.clear();
                reverted = true;
                break;
            }
        }
        if !reverted {
            self.state.discard_checkpoint(checkpoint);
        }

        let gas_used = tx.gas() - leftover;
        let returned = U256::from(leftover) * gas_price;
        energy::add_balance(&mut self.state, time, payer, returned)?;

        debug!(
            tx = %tx_id,
            %origin,
            %payer,
            gas_used,
            reverted,
            clauses = outputs.len(),
            "transaction executed"
        );

        let receipt = Receipt {
            gas_used,
            gas_payer: payer,
            reverted,
            outputs: receipt_outputs,
        };
        Ok((receipt, outputs))
    }
}

/// Recipient shared by every clause, or the zero address when clauses are
/// empty, include a creation, or name different recipients
pub fn common_to(clauses: &[Clause]) -> Address {
    let Some(first) = clauses.first().and_then(|clause| clause.to) else {
        return Address::ZERO;
    };
    if clauses.iter().skip(1).all(|clause| clause.to == Some(first)) {
        first
    } else {
        Address::ZERO
    }
}
