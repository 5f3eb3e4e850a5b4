//! Bytecode interpreter for a single call frame

use std::collections::HashSet;
use std::mem;

use bytes::Bytes;
use volt_crypto::keccak256;
use volt_primitives::{h256_to_u256, u256_to_h256, Address, H256, U256};
use volt_types::Log;

use crate::arith;
use crate::context::Frame;
use crate::error::{VmError, VmResult};
use crate::gas::{self, cost};
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::stack::Stack;
use crate::vm::{FrameResult, SubFrame, Vm};

/// Offsets and sizes beyond this are treated as running out of gas
const MAX_MEMORY: u64 = u32::MAX as u64;

fn address_to_word(address: &Address) -> U256 {
    h256_to_u256(&address.to_word())
}

fn word_to_address(word: U256) -> Address {
    Address::from_word(&u256_to_h256(word))
}

fn memory_index(value: U256) -> VmResult<usize> {
    if value > U256::from(MAX_MEMORY) {
        return Err(VmError::OutOfGas);
    }
    Ok(value.as_usize())
}

/// Index into a data buffer; anything past `usize` is simply out of range
fn data_index(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

/// Why `run` handed control back to the VM
pub(crate) enum Action {
    /// The frame is done
    Return(FrameResult),
    /// The frame is suspended until this sub-frame finishes
    Enter(SubFrame),
}

/// How to take back the result of a pending sub-frame
enum Awaiting {
    Call { out_offset: usize, out_size: usize },
    Create,
}

/// Interpreter state
pub(crate) struct Interpreter {
    /// Bytecode being executed
    code: Bytes,
    /// Program counter
    pc: usize,
    /// Stack
    stack: Stack,
    /// Memory
    memory: Memory,
    /// Return data from last call
    return_data: Vec<u8>,
    /// Data handed back by RETURN
    output: Vec<u8>,
    /// Gas remaining
    gas: u64,
    /// Valid jump destinations
    jump_dests: HashSet<usize>,
    /// Execution stopped
    stopped: bool,
    /// Logs emitted
    logs: Vec<Log>,
    /// Sub-frame requested by the last step
    request: Option<SubFrame>,
    /// Continuation for the sub-frame in flight
    awaiting: Option<Awaiting>,
    /// Error raised while taking back a sub-frame result
    failure: Option<VmError>,
}

impl Interpreter {
    /// Create a new interpreter with bytecode and gas
    pub fn new(code: Bytes, gas: u64) -> Self {
        let jump_dests = Self::analyze_jump_dests(&code);
        Self {
            code,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            return_data: Vec::new(),
            output: Vec::new(),
            gas,
            jump_dests,
            stopped: false,
            logs: Vec::new(),
            request: None,
            awaiting: None,
            failure: None,
        }
    }

    /// Analyze bytecode for valid jump destinations
    fn analyze_jump_dests(code: &[u8]) -> HashSet<usize> {
        let mut dests = HashSet::new();
        let mut i = 0;

        while i < code.len() {
            let opcode = code[i];
            if opcode == Opcode::JUMPDEST as u8 {
                dests.insert(i);
            }
            // Skip PUSH operands
            if (0x60..=0x7F).contains(&opcode) {
                i += (opcode - 0x5F) as usize;
            }
            i += 1;
        }

        dests
    }

    /// Execute until the frame completes, fails or opens a sub-frame.
    /// A suspended interpreter continues after `resume`.
    pub fn run(&mut self, vm: &mut Vm<'_>, frame: &Frame) -> Action {
        if let Some(error) = self.failure.take() {
            return Action::Return(FrameResult::halt(error, self.gas));
        }
        while !self.stopped && self.pc < self.code.len() {
            if let Err(error) = self.step(vm, frame) {
                return Action::Return(FrameResult::halt(error, self.gas));
            }
            if let Some(sub) = self.request.take() {
                return Action::Enter(sub);
            }
        }
        let output = mem::take(&mut self.output);
        Action::Return(FrameResult::success(output, self.gas, mem::take(&mut self.logs)))
    }

    /// Take back the result of the sub-frame this interpreter is waiting on
    pub fn resume(&mut self, result: FrameResult, created: Option<Address>) {
        let outcome = match self.awaiting.take() {
            Some(Awaiting::Call { out_offset, out_size }) => {
                let success = result.error.is_none();
                let copied = out_size.min(result.data.len());
                self.memory.store_slice(out_offset, &result.data[..copied]);
                self.finish_subcall(result).and_then(|()| self.push_bool(success))
            }
            Some(Awaiting::Create) => self.finish_subcall(result).and_then(|()| {
                if created.is_some() {
                    self.return_data.clear();
                }
                self.stack.push(created.map(|a| address_to_word(&a)).unwrap_or_default())
            }),
            None => Ok(()),
        };
        if let Err(error) = outcome {
            self.failure = Some(error);
        }
    }

    fn enter(&mut self, sub: SubFrame, awaiting: Awaiting) {
        self.request = Some(sub);
        self.awaiting = Some(awaiting);
    }

    /// Execute a single step
    fn step(&mut self, vm: &mut Vm<'_>, frame: &Frame) -> VmResult<()> {
        let byte = self.code[self.pc];
        let opcode = Opcode::from_byte(byte).ok_or(VmError::InvalidOpcode(byte))?;
        self.use_gas(gas::static_gas(opcode))?;
        self.execute(opcode, vm, frame)
    }

    /// Use gas, returning error if insufficient
    fn use_gas(&mut self, amount: u64) -> VmResult<()> {
        if self.gas < amount {
            return Err(VmError::OutOfGas);
        }
        self.gas -= amount;
        Ok(())
    }

    /// Charge for and grow memory to cover a region. Returns it as `(offset, size)`.
    fn memory_region(&mut self, offset: U256, size: U256) -> VmResult<(usize, usize)> {
        if size.is_zero() {
            return Ok((0, 0));
        }
        let offset = memory_index(offset)?;
        let size = memory_index(size)?;
        let end = offset.checked_add(size).ok_or(VmError::OutOfGas)?;
        self.use_gas(gas::memory_gas(self.memory.size(), end))?;
        self.memory.expand(end);
        Ok((offset, size))
    }

    fn ensure_writable(frame: &Frame) -> VmResult<()> {
        if frame.is_static {
            return Err(VmError::StaticCallViolation);
        }
        Ok(())
    }

    fn push_bool(&mut self, value: bool) -> VmResult<()> {
        self.stack.push(arith::from_bool(value))
    }

    fn binary(&mut self, f: impl FnOnce(U256, U256) -> U256) -> VmResult<()> {
        let [a, b] = self.stack.pop_n::<2>()?;
        self.stack.push(f(a, b))
    }

    fn compare(&mut self, f: impl FnOnce(U256, U256) -> bool) -> VmResult<()> {
        let [a, b] = self.stack.pop_n::<2>()?;
        self.push_bool(f(a, b))
    }

    /// Execute an opcode
    fn execute(&mut self, opcode: Opcode, vm: &mut Vm<'_>, frame: &Frame) -> VmResult<()> {
        let mut next_pc = self.pc + 1;

        match opcode {
            Opcode::STOP => {
                self.stopped = true;
            }

            // Arithmetic
            Opcode::ADD => self.binary(|a, b| a.overflowing_add(b).0)?,
            Opcode::MUL => self.binary(|a, b| a.overflowing_mul(b).0)?,
            Opcode::SUB => self.binary(|a, b| a.overflowing_sub(b).0)?,
            Opcode::DIV => self.binary(|a, b| if b.is_zero() { b } else { a / b })?,
            Opcode::SDIV => self.binary(arith::sdiv)?,
            Opcode::MOD => self.binary(|a, b| if b.is_zero() { b } else { a % b })?,
            Opcode::SMOD => self.binary(arith::smod)?,
            Opcode::ADDMOD => {
                let [a, b, n] = self.stack.pop_n::<3>()?;
                self.stack.push(arith::addmod(a, b, n))?;
            }
            Opcode::MULMOD => {
                let [a, b, n] = self.stack.pop_n::<3>()?;
                self.stack.push(arith::mulmod(a, b, n))?;
            }
            Opcode::EXP => {
                let [base, exponent] = self.stack.pop_n::<2>()?;
                self.use_gas(gas::exp_gas(&exponent))?;
                self.stack.push(arith::exp(base, exponent))?;
            }
            Opcode::SIGNEXTEND => self.binary(arith::signextend)?,

            // Comparison and bitwise
            Opcode::LT => self.compare(|a, b| a < b)?,
            Opcode::GT => self.compare(|a, b| a > b)?,
            Opcode::SLT => self.compare(arith::slt)?,
            Opcode::SGT => self.compare(arith::sgt)?,
            Opcode::EQ => self.compare(|a, b| a == b)?,
            Opcode::ISZERO => {
                let a = self.stack.pop()?;
                self.push_bool(a.is_zero())?;
            }
            Opcode::AND => self.binary(|a, b| a & b)?,
            Opcode::OR => self.binary(|a, b| a | b)?,
            Opcode::XOR => self.binary(|a, b| a ^ b)?,
            Opcode::NOT => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            Opcode::BYTE => self.binary(arith::byte)?,
            Opcode::SHL => self.binary(arith::shl)?,
            Opcode::SHR => self.binary(arith::shr)?,
            Opcode::SAR => self.binary(arith::sar)?,

            Opcode::KECCAK256 => {
                let [offset, size] = self.stack.pop_n::<2>()?;
                let (offset, size) = self.memory_region(offset, size)?;
                self.use_gas(gas::sha3_gas(size))?;
                let hash = keccak256(&self.memory.load_slice(offset, size));
                self.stack.push(h256_to_u256(&hash))?;
            }

            // Environment
            Opcode::ADDRESS => self.stack.push(address_to_word(&frame.address))?,
            Opcode::BALANCE => {
                let address = word_to_address(self.stack.pop()?);
                self.stack.push(vm.state.balance(&address)?)?;
            }
            Opcode::ORIGIN => self.stack.push(address_to_word(&vm.ctx.origin))?,
            Opcode::CALLER => self.stack.push(address_to_word(&frame.caller))?,
            Opcode::CALLVALUE => self.stack.push(frame.value)?,
            Opcode::CALLDATALOAD => {
                let offset = data_index(self.stack.pop()?);
                let mut word = [0u8; 32];
                if offset < frame.input.len() {
                    let end = offset.saturating_add(32).min(frame.input.len());
                    word[..end - offset].copy_from_slice(&frame.input[offset..end]);
                }
                self.stack.push(U256::from_big_endian(&word))?;
            }
            Opcode::CALLDATASIZE => self.stack.push(U256::from(frame.input.len()))?,
            Opcode::CALLDATACOPY => {
                let [mem_offset, data_offset, size] = self.stack.pop_n::<3>()?;
                let (mem_offset, size) = self.memory_region(mem_offset, size)?;
                self.use_gas(gas::copy_gas(size))?;
                self.memory
                    .copy_padded(mem_offset, &frame.input, data_index(data_offset), size);
            }
            Opcode::CODESIZE => self.stack.push(U256::from(self.code.len()))?,
            Opcode::CODECOPY => {
                let [mem_offset, code_offset, size] = self.stack.pop_n::<3>()?;
                let (mem_offset, size) = self.memory_region(mem_offset, size)?;
                self.use_gas(gas::copy_gas(size))?;
                self.memory
                    .copy_padded(mem_offset, &self.code, data_index(code_offset), size);
            }
            Opcode::GASPRICE => self.stack.push(vm.ctx.gas_price)?,
            Opcode::EXTCODESIZE => {
                let address = word_to_address(self.stack.pop()?);
                let size = vm.state.code(&address)?.len();
                self.stack.push(U256::from(size))?;
            }
            Opcode::EXTCODECOPY => {
                let address = word_to_address(self.stack.pop()?);
                let [mem_offset, code_offset, size] = self.stack.pop_n::<3>()?;
                let (mem_offset, size) = self.memory_region(mem_offset, size)?;
                self.use_gas(gas::copy_gas(size))?;
                let code = vm.state.code(&address)?;
                self.memory
                    .copy_padded(mem_offset, &code, data_index(code_offset), size);
            }
            Opcode::RETURNDATASIZE => self.stack.push(U256::from(self.return_data.len()))?,
            Opcode::RETURNDATACOPY => {
                let [mem_offset, data_offset, size] = self.stack.pop_n::<3>()?;
                let end = data_offset.checked_add(size).ok_or(VmError::ReturnDataOutOfBounds)?;
                if end > U256::from(self.return_data.len()) {
                    return Err(VmError::ReturnDataOutOfBounds);
                }
                let (mem_offset, size) = self.memory_region(mem_offset, size)?;
                self.use_gas(gas::copy_gas(size))?;
                let data_offset = data_offset.as_usize();
                self.memory.store_slice(
                    mem_offset,
                    &self.return_data[data_offset..data_offset + size],
                );
            }
            Opcode::EXTCODEHASH => {
                let address = word_to_address(self.stack.pop()?);
                let hash = vm.state.code_hash(&address)?;
                self.stack.push(h256_to_u256(&hash))?;
            }

            // Block
            Opcode::BLOCKHASH => {
                let number = self.stack.pop()?;
                let current = vm.ctx.number;
                let hash = if number < U256::from(current)
                    && U256::from(current) - number <= U256::from(256)
                {
                    (vm.ctx.get_hash)(number.low_u32())
                } else {
                    H256::ZERO
                };
                self.stack.push(h256_to_u256(&hash))?;
            }
            Opcode::COINBASE => self.stack.push(address_to_word(&vm.ctx.beneficiary))?,
            Opcode::TIMESTAMP => self.stack.push(U256::from(vm.ctx.time))?,
            Opcode::NUMBER => self.stack.push(U256::from(vm.ctx.number))?,
            Opcode::GASLIMIT => self.stack.push(U256::from(vm.ctx.gas_limit))?,
            Opcode::SELFBALANCE => self.stack.push(vm.state.balance(&frame.address)?)?,

            // Stack, memory, storage and flow
            Opcode::POP => {
                self.stack.pop()?;
            }
            Opcode::MLOAD => {
                let offset = self.stack.pop()?;
                let (offset, _) = self.memory_region(offset, U256::from(32))?;
                self.stack.push(self.memory.load(offset))?;
            }
            Opcode::MSTORE => {
                let [offset, value] = self.stack.pop_n::<2>()?;
                let (offset, _) = self.memory_region(offset, U256::from(32))?;
                self.memory.store(offset, value);
            }
            Opcode::MSTORE8 => {
                let [offset, value] = self.stack.pop_n::<2>()?;
                let (offset, _) = self.memory_region(offset, U256::one())?;
                self.memory.store8(offset, value.low_u32() as u8);
            }
            Opcode::SLOAD => {
                let key = u256_to_h256(self.stack.pop()?);
                let value = vm.state.storage(&frame.address, &key)?;
                self.stack.push(h256_to_u256(&value))?;
            }
            Opcode::SSTORE => {
                Self::ensure_writable(frame)?;
                let [key, value] = self.stack.pop_n::<2>()?;
                let key = u256_to_h256(key);
                let current = vm.state.storage(&frame.address, &key)?;
                let (cost, refund) = gas::sstore_gas(current.is_zero(), value.is_zero());
                self.use_gas(cost)?;
                vm.refund = vm.refund.saturating_add(refund);
                vm.state.set_storage(frame.address, key, u256_to_h256(value));
            }
            Opcode::JUMP => {
                let dest = self.stack.pop()?;
                next_pc = self.jump_target(dest)?;
            }
            Opcode::JUMPI => {
                let [dest, cond] = self.stack.pop_n::<2>()?;
                if !cond.is_zero() {
                    next_pc = self.jump_target(dest)?;
                }
            }
            Opcode::PC => self.stack.push(U256::from(self.pc))?,
            Opcode::MSIZE => self.stack.push(U256::from(self.memory.size()))?,
            Opcode::GAS => self.stack.push(U256::from(self.gas))?,
            Opcode::JUMPDEST => {}

            op if op.is_push() => {
                let size = op.push_size();
                let start = (self.pc + 1).min(self.code.len());
                let end = (self.pc + 1 + size).min(self.code.len());
                let mut word = [0u8; 32];
                // truncated immediates are zero-padded on the right
                word[32 - size..32 - size + (end - start)].copy_from_slice(&self.code[start..end]);
                self.stack.push(U256::from_big_endian(&word))?;
                next_pc = self.pc + 1 + size;
            }
            op if op.dup_depth() > 0 => self.stack.dup(op.dup_depth())?,
            op if op.swap_depth() > 0 => self.stack.swap(op.swap_depth())?,

            op if op.log_topics().is_some() => {
                Self::ensure_writable(frame)?;
                let [offset, size] = self.stack.pop_n::<2>()?;
                let topic_count = op.log_topics().unwrap_or_default();
                let mut topics = Vec::with_capacity(topic_count);
                for _ in 0..topic_count {
                    topics.push(u256_to_h256(self.stack.pop()?));
                }
                let (offset, size) = self.memory_region(offset, size)?;
                self.use_gas(gas::log_data_gas(size))?;
                let data = Bytes::from(self.memory.load_slice(offset, size));
                self.logs.push(Log::new(frame.address, topics, data));
            }

            Opcode::CREATE => {
                Self::ensure_writable(frame)?;
                let [value, offset, size] = self.stack.pop_n::<3>()?;
                let (offset, size) = self.memory_region(offset, size)?;
                let init_code = Bytes::from(self.memory.load_slice(offset, size));

                let call_gas = gas::all_but_one_64th(self.gas);
                self.gas -= call_gas;
                let sub = SubFrame::Create {
                    caller: frame.address,
                    init_code,
                    gas: call_gas,
                    value,
                    depth: frame.depth + 1,
                };
                self.enter(sub, Awaiting::Create);
            }
            Opcode::CALL | Opcode::DELEGATECALL | Opcode::STATICCALL => {
                self.call(opcode, vm, frame)?;
            }

            Opcode::RETURN => {
                let [offset, size] = self.stack.pop_n::<2>()?;
                let (offset, size) = self.memory_region(offset, size)?;
                self.output = self.memory.load_slice(offset, size);
                self.stopped = true;
            }
            Opcode::REVERT => {
                let [offset, size] = self.stack.pop_n::<2>()?;
                let (offset, size) = self.memory_region(offset, size)?;
                return Err(VmError::Revert(self.memory.load_slice(offset, size)));
            }
            Opcode::INVALID => {
                return Err(VmError::InvalidOpcode(Opcode::INVALID as u8));
            }

            op => return Err(VmError::InvalidOpcode(op as u8)),
        }

        self.pc = next_pc;
        Ok(())
    }

    fn jump_target(&self, dest: U256) -> VmResult<usize> {
        let dest = data_index(dest);
        if !self.jump_dests.contains(&dest) {
            return Err(VmError::InvalidJump(dest));
        }
        Ok(dest)
    }

    /// CALL, DELEGATECALL and STATICCALL
    fn call(&mut self, opcode: Opcode, vm: &mut Vm<'_>, frame: &Frame) -> VmResult<()> {
        let [requested_gas, to] = self.stack.pop_n::<2>()?;
        let to = word_to_address(to);
        let value = if opcode == Opcode::CALL {
            self.stack.pop()?
        } else {
            U256::zero()
        };
        let [in_offset, in_size, out_offset, out_size] = self.stack.pop_n::<4>()?;

        if frame.is_static && !value.is_zero() {
            return Err(VmError::StaticCallViolation);
        }
        let (in_offset, in_size) = self.memory_region(in_offset, in_size)?;
        let (out_offset, out_size) = self.memory_region(out_offset, out_size)?;

        if !value.is_zero() {
            let mut extra = cost::CALL_VALUE;
            if !vm.state.exists(&to)? {
                extra += cost::CALL_NEW_ACCOUNT;
            }
            self.use_gas(extra)?;
        }

        let cap = gas::all_but_one_64th(self.gas);
        let mut call_gas = if requested_gas > U256::from(cap) {
            cap
        } else {
            requested_gas.as_u64()
        };
        self.gas -= call_gas;
        if !value.is_zero() {
            call_gas += cost::CALL_STIPEND;
        }

        let input = Bytes::from(self.memory.load_slice(in_offset, in_size));
        let depth = frame.depth + 1;
        let (sub, transfer) = match opcode {
            Opcode::DELEGATECALL => (
                Frame {
                    address: frame.address,
                    code_address: to,
                    caller: frame.caller,
                    value: frame.value,
                    input,
                    is_static: frame.is_static,
                    depth,
                },
                false,
            ),
            Opcode::STATICCALL => (
                Frame {
                    address: to,
                    code_address: to,
                    caller: frame.address,
                    value: U256::zero(),
                    input,
                    is_static: true,
                    depth,
                },
                false,
            ),
            _ => (
                Frame {
                    address: to,
                    code_address: to,
                    caller: frame.address,
                    value,
                    input,
                    is_static: frame.is_static,
                    depth,
                },
                true,
            ),
        };

        let sub = SubFrame::Call {
            frame: sub,
            gas: call_gas,
            transfer,
        };
        self.enter(sub, Awaiting::Call { out_offset, out_size });
        Ok(())
    }

    /// Take back a sub-frame's gas, return data and logs. Fatal errors end this frame too.
    fn finish_subcall(&mut self, result: FrameResult) -> VmResult<()> {
        if result.is_fatal() {
            return Err(result.error.unwrap_or(VmError::OutOfGas));
        }
        self.gas = self.gas.saturating_add(result.gas_left);
        if result.error.is_none() {
            self.logs.extend(result.logs);
        }
        self.return_data = result.data;
        Ok(())
    }
}
