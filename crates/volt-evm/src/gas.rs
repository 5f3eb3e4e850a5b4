//! Gas cost table

use volt_primitives::U256;

use crate::opcode::Opcode;

/// Gas costs for VM operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Base gas
    pub const BASE: u64 = 2;
    /// Very low gas
    pub const VERYLOW: u64 = 3;
    /// Low gas
    pub const LOW: u64 = 5;
    /// Mid gas
    pub const MID: u64 = 8;
    /// High gas
    pub const HIGH: u64 = 10;

    /// Jump dest gas
    pub const JUMPDEST: u64 = 1;
    /// Exp gas
    pub const EXP: u64 = 10;
    /// Exp gas per exponent byte
    pub const EXP_BYTE: u64 = 50;
    /// KECCAK256 base gas
    pub const SHA3: u64 = 30;
    /// KECCAK256 gas per word
    pub const SHA3_WORD: u64 = 6;

    /// BALANCE
    pub const BALANCE: u64 = 400;
    /// EXTCODESIZE and EXTCODECOPY base
    pub const EXTCODE: u64 = 700;
    /// EXTCODEHASH
    pub const EXTCODEHASH: u64 = 400;
    /// BLOCKHASH
    pub const BLOCKHASH: u64 = 20;

    /// SLOAD
    pub const SLOAD: u64 = 200;
    /// SSTORE from zero to non-zero
    pub const SSTORE_SET: u64 = 20000;
    /// SSTORE of any other kind
    pub const SSTORE_RESET: u64 = 5000;
    /// Refund for clearing a slot
    pub const SSTORE_CLEAR_REFUND: u64 = 15000;

    /// Log gas
    pub const LOG: u64 = 375;
    /// Log topic gas
    pub const LOG_TOPIC: u64 = 375;
    /// Log data gas (per byte)
    pub const LOG_DATA: u64 = 8;

    /// Create gas
    pub const CREATE: u64 = 32000;
    /// Gas per byte of deployed code
    pub const CREATE_DATA: u64 = 200;
    /// CALL, DELEGATECALL and STATICCALL base
    pub const CALL: u64 = 700;
    /// Call value transfer gas
    pub const CALL_VALUE: u64 = 9000;
    /// Call new account gas
    pub const CALL_NEW_ACCOUNT: u64 = 25000;
    /// Gas handed to the callee for free on value transfers
    pub const CALL_STIPEND: u64 = 2300;

    /// Memory gas per word
    pub const MEMORY: u64 = 3;
    /// Copy gas per word
    pub const COPY: u64 = 3;

    /// Max call depth
    pub const MAX_CALL_DEPTH: usize = 1024;
    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
    /// Max deployed code size
    pub const MAX_CODE_SIZE: usize = 24576;
}

/// Get static gas cost for an opcode
pub fn static_gas(opcode: Opcode) -> u64 {
    if opcode.is_push() || opcode.dup_depth() > 0 || opcode.swap_depth() > 0 {
        return cost::VERYLOW;
    }
    if let Some(topics) = opcode.log_topics() {
        return cost::LOG + cost::LOG_TOPIC * topics as u64;
    }
    match opcode {
        Opcode::STOP | Opcode::RETURN | Opcode::REVERT | Opcode::INVALID | Opcode::SSTORE => {
            cost::ZERO
        }

        Opcode::ADDRESS | Opcode::ORIGIN | Opcode::CALLER | Opcode::CALLVALUE |
        Opcode::CALLDATASIZE | Opcode::CODESIZE | Opcode::GASPRICE |
        Opcode::COINBASE | Opcode::TIMESTAMP | Opcode::NUMBER | Opcode::GASLIMIT |
        Opcode::RETURNDATASIZE | Opcode::POP | Opcode::PC |
        Opcode::MSIZE | Opcode::GAS => cost::BASE,

        Opcode::ADD | Opcode::SUB | Opcode::NOT | Opcode::LT | Opcode::GT |
        Opcode::SLT | Opcode::SGT | Opcode::EQ | Opcode::ISZERO |
        Opcode::AND | Opcode::OR | Opcode::XOR | Opcode::BYTE |
        Opcode::SHL | Opcode::SHR | Opcode::SAR |
        Opcode::CALLDATALOAD | Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 |
        Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => cost::VERYLOW,

        Opcode::MUL | Opcode::DIV | Opcode::SDIV | Opcode::MOD |
        Opcode::SMOD | Opcode::SIGNEXTEND | Opcode::SELFBALANCE => cost::LOW,

        Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => cost::MID,
        Opcode::JUMPI => cost::HIGH,
        Opcode::JUMPDEST => cost::JUMPDEST,

        Opcode::EXP => cost::EXP,
        Opcode::KECCAK256 => cost::SHA3,
        Opcode::BALANCE => cost::BALANCE,
        Opcode::EXTCODESIZE | Opcode::EXTCODECOPY => cost::EXTCODE,
        Opcode::EXTCODEHASH => cost::EXTCODEHASH,
        Opcode::BLOCKHASH => cost::BLOCKHASH,
        Opcode::SLOAD => cost::SLOAD,
        Opcode::CREATE => cost::CREATE,
        Opcode::CALL | Opcode::DELEGATECALL | Opcode::STATICCALL => cost::CALL,

        // covered above
        _ => cost::VERYLOW,
    }
}

/// Calculate memory expansion cost. Sizes are in bytes.
pub fn memory_gas(current_size: usize, new_size: usize) -> u64 {
    if new_size <= current_size {
        return 0;
    }
    let new_cost = memory_word_cost(new_size.div_ceil(32) as u64);
    let old_cost = memory_word_cost(current_size.div_ceil(32) as u64);
    new_cost.saturating_sub(old_cost)
}

fn memory_word_cost(words: u64) -> u64 {
    cost::MEMORY
        .saturating_mul(words)
        .saturating_add(words.saturating_mul(words) / 512)
}

/// Calculate copy cost (for CALLDATACOPY, CODECOPY, etc.)
pub fn copy_gas(length: usize) -> u64 {
    cost::COPY.saturating_mul(length.div_ceil(32) as u64)
}

/// EXP dynamic cost: 50 per significant byte of the exponent
pub fn exp_gas(exponent: &U256) -> u64 {
    let bytes = (exponent.bits() as u64).div_ceil(8);
    cost::EXP_BYTE * bytes
}

/// KECCAK256 dynamic cost, on top of the static base
pub fn sha3_gas(length: usize) -> u64 {
    cost::SHA3_WORD.saturating_mul(length.div_ceil(32) as u64)
}

/// LOG dynamic cost, on top of the static base and topic charge
pub fn log_data_gas(data_size: usize) -> u64 {
    cost::LOG_DATA.saturating_mul(data_size as u64)
}

/// SSTORE cost for replacing `current` with `new`, plus the refund it earns
pub fn sstore_gas(current_is_zero: bool, new_is_zero: bool) -> (u64, u64) {
    match (current_is_zero, new_is_zero) {
        (true, false) => (cost::SSTORE_SET, 0),
        (false, true) => (cost::SSTORE_RESET, cost::SSTORE_CLEAR_REFUND),
        _ => (cost::SSTORE_RESET, 0),
    }
}

/// Gas left for a callee once the caller keeps 1/64 of what it has
pub fn all_but_one_64th(gas: u64) -> u64 {
    gas - gas / 64
}
