//! VM facade: top-level entry points, call frames and native contract hooks

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::trace;
use volt_crypto::keccak256_concat;
use volt_primitives::{Address, H256, U256};
use volt_storage::{Checkpoint, State};
use volt_types::Log;

use crate::context::{Context, Frame};
use crate::error::{VmError, VmResult};
use crate::gas::cost;
use crate::interpreter::{Action, Interpreter};

fn default_max_call_depth() -> usize {
    cost::MAX_CALL_DEPTH
}

fn default_max_code_size() -> usize {
    cost::MAX_CODE_SIZE
}

/// VM limits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmConfig {
    /// Deepest nested call allowed
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Largest code a creation may deploy
    #[serde(default = "default_max_code_size")]
    pub max_code_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: default_max_call_depth(),
            max_code_size: default_max_code_size(),
        }
    }
}

/// Result of a top-level `create`, `call` or `static_call`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    /// Return data, revert data, or the deployed code for a creation
    pub data: Bytes,
    /// Gas not consumed, never more than the gas supplied
    pub leftover_gas: u64,
    /// Refund earned by clearing storage, before any cap
    pub refund_gas: u64,
    /// Logs in emission order; empty when the call faulted
    pub logs: Vec<Log>,
    /// Why the call stopped abnormally
    pub vm_err: Option<VmError>,
    /// Address of the created contract
    pub contract_address: Option<Address>,
}

impl Output {
    /// Check if the call completed without error
    pub fn is_success(&self) -> bool {
        self.vm_err.is_none()
    }
}

/// Host-implemented contract bound to a fixed address
pub trait NativeContract: Send + Sync {
    /// Handle `input`.
    ///
    /// Returns `None` when `input` names no native method, in which case the
    /// VM runs whatever code is stored at the address instead.
    fn run(&self, input: &[u8], call: &mut NativeCall<'_>) -> Option<VmResult<Vec<u8>>>;
}

/// What a native contract sees of the call invoking it
pub struct NativeCall<'a> {
    state: &'a mut State,
    address: Address,
    caller: Address,
    value: U256,
    is_static: bool,
    time: u64,
    gas: u64,
    logs: Vec<Log>,
}

impl<'a> NativeCall<'a> {
    /// Create a call over `state` with `gas` to spend
    pub fn new(
        state: &'a mut State,
        address: Address,
        caller: Address,
        value: U256,
        is_static: bool,
        time: u64,
        gas: u64,
    ) -> Self {
        Self {
            state,
            address,
            caller,
            value,
            is_static,
            time,
            gas,
            logs: Vec::new(),
        }
    }

    /// World state
    pub fn state(&self) -> &State {
        self.state
    }

    /// Mutable world state
    pub fn state_mut(&mut self) -> &mut State {
        self.state
    }

    /// Address the call was made to
    pub fn address(&self) -> Address {
        self.address
    }

    /// Immediate caller
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Value sent with the call
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Whether state modifications are forbidden
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Block timestamp
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Gas still available
    pub fn gas_left(&self) -> u64 {
        self.gas
    }

    /// Charge `amount`. Returns false, leaving the meter untouched, if there is not enough.
    pub fn use_gas(&mut self, amount: u64) -> bool {
        if self.gas < amount {
            return false;
        }
        self.gas -= amount;
        true
    }

    /// Charge `amount` or fail with out-of-gas
    pub fn charge(&mut self, amount: u64) -> VmResult<()> {
        if self.use_gas(amount) {
            Ok(())
        } else {
            Err(VmError::OutOfGas)
        }
    }

    /// Fail under a static call
    pub fn ensure_writable(&self) -> VmResult<()> {
        if self.is_static {
            return Err(VmError::StaticCallViolation);
        }
        Ok(())
    }

    /// Emit a log from the called address
    pub fn log(&mut self, topics: Vec<H256>, data: Bytes) {
        self.logs.push(Log::new(self.address, topics, data));
    }

    /// Logs emitted so far
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }
}

/// A frame the VM is asked to open
pub(crate) enum SubFrame {
    Call {
        frame: Frame,
        gas: u64,
        transfer: bool,
    },
    Create {
        caller: Address,
        init_code: Bytes,
        gas: u64,
        value: U256,
        depth: usize,
    },
}

/// Frame whose byte-code is running or suspended on a sub-frame
struct ActiveFrame {
    interpreter: Interpreter,
    frame: Frame,
    checkpoint: Checkpoint,
    refund: u64,
    /// Address being deployed, for creation frames
    creating: Option<Address>,
}

/// Result of opening a frame
enum Opened {
    /// No byte-code ran, or the frame failed before it could
    Finished(FrameResult, Option<Address>),
    Running(ActiveFrame),
}

/// Outcome of one frame
#[derive(Debug)]
pub(crate) struct FrameResult {
    pub data: Vec<u8>,
    pub gas_left: u64,
    pub logs: Vec<Log>,
    pub error: Option<VmError>,
}

impl FrameResult {
    pub fn success(data: Vec<u8>, gas_left: u64, logs: Vec<Log>) -> Self {
        Self {
            data,
            gas_left,
            logs,
            error: None,
        }
    }

    /// Abnormal stop with `gas` still in hand. Only errors that keep gas hand it back.
    pub fn halt(error: VmError, gas: u64) -> Self {
        let data = match &error {
            VmError::Revert(data) => data.clone(),
            _ => Vec::new(),
        };
        Self {
            data,
            gas_left: if error.keeps_gas() { gas } else { 0 },
            logs: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.error.as_ref().is_some_and(VmError::is_fatal)
    }
}

/// Address of the `counter`-th contract created by a clause
pub fn contract_address(tx_id: &H256, clause_index: u32, counter: u32) -> Address {
    let hash = keccak256_concat(&[
        &tx_id.as_bytes()[..],
        &clause_index.to_be_bytes(),
        &counter.to_be_bytes(),
    ]);
    Address::from_word(&hash)
}

/// Byte-code VM bound to one clause execution
pub struct Vm<'a> {
    pub(crate) ctx: Context,
    pub(crate) state: &'a mut State,
    config: VmConfig,
    natives: HashMap<Address, Arc<dyn NativeContract>>,
    pub(crate) refund: u64,
    creations: u32,
}

impl<'a> Vm<'a> {
    /// Create a VM over `state`
    pub fn new(ctx: Context, state: &'a mut State, config: VmConfig) -> Self {
        Self {
            ctx,
            state,
            config,
            natives: HashMap::new(),
            refund: 0,
            creations: 0,
        }
    }

    /// Route calls to `address` through `native` before any stored code
    pub fn hook_contract(&mut self, address: Address, native: Arc<dyn NativeContract>) {
        self.natives.insert(address, native);
    }

    /// Execution context
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Deploy `code` as init code, endowing the new contract with `value`
    pub fn create(&mut self, caller: Address, code: Bytes, gas: u64, value: U256) -> Output {
        self.refund = 0;
        let root = SubFrame::Create {
            caller,
            init_code: code,
            gas,
            value,
            depth: 0,
        };
        let (result, address) = self.execute(root);
        self.finish(result, address)
    }

    /// Message call, transferring `value`
    pub fn call(&mut self, caller: Address, to: Address, input: Bytes, gas: u64, value: U256) -> Output {
        self.refund = 0;
        let frame = Frame {
            address: to,
            code_address: to,
            caller,
            value,
            input,
            is_static: false,
            depth: 0,
        };
        let (result, _) = self.execute(SubFrame::Call {
            frame,
            gas,
            transfer: true,
        });
        self.finish(result, None)
    }

    /// Read-only call; any state modification faults
    pub fn static_call(&mut self, caller: Address, to: Address, input: Bytes, gas: u64) -> Output {
        self.refund = 0;
        let frame = Frame {
            address: to,
            code_address: to,
            caller,
            value: U256::zero(),
            input,
            is_static: true,
            depth: 0,
        };
        let (result, _) = self.execute(SubFrame::Call {
            frame,
            gas,
            transfer: false,
        });
        self.finish(result, None)
    }

    fn finish(&self, result: FrameResult, contract_address: Option<Address>) -> Output {
        Output {
            data: Bytes::from(result.data),
            leftover_gas: result.gas_left,
            refund_gas: self.refund,
            logs: result.logs,
            vm_err: result.error,
            contract_address,
        }
    }

    fn execute(&mut self, root: SubFrame) -> (FrameResult, Option<Address>) {
        let opened = self.open(root);
        self.drive(opened)
    }

    /// Run `opened` and every frame it opens to completion. Suspended callers
    /// wait on a heap stack, so nesting depth never grows the native stack.
    fn drive(&mut self, mut opened: Opened) -> (FrameResult, Option<Address>) {
        let mut suspended: Vec<ActiveFrame> = Vec::new();
        loop {
            let (result, created) = match opened {
                Opened::Finished(result, created) => (result, created),
                Opened::Running(mut active) => match active.interpreter.run(self, &active.frame) {
                    Action::Enter(sub) => {
                        suspended.push(active);
                        opened = self.open(sub);
                        continue;
                    }
                    Action::Return(result) => {
                        self.close(&active.frame, active.checkpoint, active.refund, active.creating, result)
                    }
                },
            };
            match suspended.pop() {
                Some(mut caller) => {
                    caller.interpreter.resume(result, created);
                    opened = Opened::Running(caller);
                }
                None => return (result, created),
            }
        }
    }

    fn open(&mut self, sub: SubFrame) -> Opened {
        match sub {
            SubFrame::Call { frame, gas, transfer } => self.open_call(frame, gas, transfer),
            SubFrame::Create {
                caller,
                init_code,
                gas,
                value,
                depth,
            } => self.open_create(caller, init_code, gas, value, depth),
        }
    }

    fn open_call(&mut self, frame: Frame, gas: u64, transfer: bool) -> Opened {
        if frame.depth > self.config.max_call_depth {
            let error = VmError::CallDepthExceeded(self.config.max_call_depth);
            return Opened::Finished(FrameResult::halt(error, gas), None);
        }
        let transfer = transfer && !frame.value.is_zero();
        if transfer {
            match self.state.balance(&frame.caller) {
                Ok(balance) if balance < frame.value => {
                    return Opened::Finished(FrameResult::halt(VmError::InsufficientBalance, gas), None);
                }
                Ok(_) => {}
                Err(e) => return Opened::Finished(FrameResult::halt(e.into(), gas), None),
            }
        }

        let checkpoint = self.state.new_checkpoint();
        let refund = self.refund;
        let result = 'early: {
            if transfer {
                if let Err(e) = self.transfer(frame.caller, frame.address, frame.value) {
                    break 'early FrameResult::halt(e, gas);
                }
            }
            if let Some(result) = self.run_native(&frame, gas) {
                break 'early result;
            }
            match self.state.code(&frame.code_address) {
                Ok(code) if code.is_empty() => FrameResult::success(Vec::new(), gas, Vec::new()),
                Ok(code) => {
                    return Opened::Running(ActiveFrame {
                        interpreter: Interpreter::new(code, gas),
                        frame,
                        checkpoint,
                        refund,
                        creating: None,
                    });
                }
                Err(e) => FrameResult::halt(e.into(), gas),
            }
        };
        let (result, _) = self.close(&frame, checkpoint, refund, None, result);
        Opened::Finished(result, None)
    }

    fn run_native(&mut self, frame: &Frame, gas: u64) -> Option<FrameResult> {
        let native = self.natives.get(&frame.code_address)?;
        let mut call = NativeCall::new(
            &mut *self.state,
            frame.address,
            frame.caller,
            frame.value,
            frame.is_static,
            self.ctx.time,
            gas,
        );
        let outcome = native.run(&frame.input, &mut call)?;
        Some(match outcome {
            Ok(data) => FrameResult::success(data, call.gas, call.logs),
            Err(error) => FrameResult::halt(error, call.gas),
        })
    }

    fn open_create(&mut self, caller: Address, init_code: Bytes, gas: u64, value: U256, depth: usize) -> Opened {
        if depth > self.config.max_call_depth {
            let error = VmError::CallDepthExceeded(self.config.max_call_depth);
            return Opened::Finished(FrameResult::halt(error, gas), None);
        }
        match self.state.balance(&caller) {
            Ok(balance) if balance < value => {
                return Opened::Finished(FrameResult::halt(VmError::InsufficientBalance, gas), None);
            }
            Ok(_) => {}
            Err(e) => return Opened::Finished(FrameResult::halt(e.into(), gas), None),
        }

        let address = contract_address(&self.ctx.tx_id, self.ctx.clause_index, self.creations);
        self.creations += 1;
        let frame = Frame {
            address,
            code_address: address,
            caller,
            value,
            input: Bytes::new(),
            is_static: false,
            depth,
        };

        let checkpoint = self.state.new_checkpoint();
        let refund = self.refund;
        if let Err(error) = self.endow(&frame) {
            let result = FrameResult::halt(error, gas);
            let (result, created) = self.close(&frame, checkpoint, refund, Some(address), result);
            return Opened::Finished(result, created);
        }
        Opened::Running(ActiveFrame {
            interpreter: Interpreter::new(init_code, gas),
            frame,
            checkpoint,
            refund,
            creating: Some(address),
        })
    }

    /// Claim the new contract's address and move the endowment into it
    fn endow(&mut self, frame: &Frame) -> VmResult<()> {
        if self.state.account(&frame.address)?.has_code() {
            return Err(VmError::CreateCollision);
        }
        if !frame.value.is_zero() {
            self.transfer(frame.caller, frame.address, frame.value)?;
        }
        Ok(())
    }

    /// Store the code returned by a successful init frame
    fn deposit_code(&mut self, address: Address, mut result: FrameResult) -> FrameResult {
        if result.data.len() > self.config.max_code_size {
            return FrameResult::halt(VmError::MaxCodeSizeExceeded(self.config.max_code_size), 0);
        }
        let deposit = cost::CREATE_DATA * result.data.len() as u64;
        if result.gas_left < deposit {
            return FrameResult::halt(VmError::OutOfGas, 0);
        }
        result.gas_left -= deposit;
        if let Err(e) = self.state.set_code(address, Bytes::from(result.data.clone())) {
            return FrameResult::halt(e.into(), 0);
        }
        result
    }

    /// Finish a frame: deploy code for creations, then keep or roll back its writes
    fn close(
        &mut self,
        frame: &Frame,
        checkpoint: Checkpoint,
        refund: u64,
        creating: Option<Address>,
        result: FrameResult,
    ) -> (FrameResult, Option<Address>) {
        let result = match creating {
            Some(address) if result.error.is_none() => self.deposit_code(address, result),
            _ => result,
        };
        trace!(
            depth = frame.depth,
            address = %frame.address,
            gas_left = result.gas_left,
            failed = result.error.is_some(),
            "frame finished"
        );
        let result = self.close_frame(checkpoint, refund, result);
        let created = creating.filter(|_| result.error.is_none());
        (result, created)
    }

    /// Run `code` as a top-level frame
    #[cfg(test)]
    pub(crate) fn run_code(&mut self, frame: Frame, code: Bytes, gas: u64) -> FrameResult {
        let active = ActiveFrame {
            interpreter: Interpreter::new(code, gas),
            checkpoint: self.state.new_checkpoint(),
            refund: self.refund,
            frame,
            creating: None,
        };
        self.drive(Opened::Running(active)).0
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> VmResult<()> {
        if self.state.transfer(from, to, value, self.ctx.time)? {
            Ok(())
        } else {
            Err(VmError::InsufficientBalance)
        }
    }

    fn close_frame(&mut self, checkpoint: Checkpoint, refund: u64, result: FrameResult) -> FrameResult {
        if result.error.is_some() {
            self.state.revert_to(checkpoint);
            self.refund = refund;
        } else {
            self.state.discard_checkpoint(checkpoint);
        }
        result
    }
}
