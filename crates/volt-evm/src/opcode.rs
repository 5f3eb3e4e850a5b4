//! Opcode definitions

/// Supported opcodes. Bytes that map to none of these are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    // Stop and Arithmetic
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    SDIV = 0x05,
    MOD = 0x06,
    SMOD = 0x07,
    ADDMOD = 0x08,
    MULMOD = 0x09,
    EXP = 0x0A,
    SIGNEXTEND = 0x0B,

    // Comparison & Bitwise Logic
    LT = 0x10,
    GT = 0x11,
    SLT = 0x12,
    SGT = 0x13,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,
    BYTE = 0x1A,
    SHL = 0x1B,
    SHR = 0x1C,
    SAR = 0x1D,

    // SHA3
    KECCAK256 = 0x20,

    // Environmental Information
    ADDRESS = 0x30,
    BALANCE = 0x31,
    ORIGIN = 0x32,
    CALLER = 0x33,
    CALLVALUE = 0x34,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    CALLDATACOPY = 0x37,
    CODESIZE = 0x38,
    CODECOPY = 0x39,
    GASPRICE = 0x3A,
    EXTCODESIZE = 0x3B,
    EXTCODECOPY = 0x3C,
    RETURNDATASIZE = 0x3D,
    RETURNDATACOPY = 0x3E,
    EXTCODEHASH = 0x3F,

    // Block Information
    BLOCKHASH = 0x40,
    COINBASE = 0x41,
    TIMESTAMP = 0x42,
    NUMBER = 0x43,
    GASLIMIT = 0x45,
    SELFBALANCE = 0x47,

    // Stack, Memory, Storage and Flow Operations
    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    JUMP = 0x56,
    JUMPI = 0x57,
    PC = 0x58,
    MSIZE = 0x59,
    GAS = 0x5A,
    JUMPDEST = 0x5B,

    // Push Operations
    PUSH1 = 0x60,
    PUSH2 = 0x61,
    PUSH3 = 0x62,
    PUSH4 = 0x63,
    PUSH5 = 0x64,
    PUSH6 = 0x65,
    PUSH7 = 0x66,
    PUSH8 = 0x67,
    PUSH9 = 0x68,
    PUSH10 = 0x69,
    PUSH11 = 0x6A,
    PUSH12 = 0x6B,
    PUSH13 = 0x6C,
    PUSH14 = 0x6D,
    PUSH15 = 0x6E,
    PUSH16 = 0x6F,
    PUSH17 = 0x70,
    PUSH18 = 0x71,
    PUSH19 = 0x72,
    PUSH20 = 0x73,
    PUSH21 = 0x74,
    PUSH22 = 0x75,
    PUSH23 = 0x76,
    PUSH24 = 0x77,
    PUSH25 = 0x78,
    PUSH26 = 0x79,
    PUSH27 = 0x7A,
    PUSH28 = 0x7B,
    PUSH29 = 0x7C,
    PUSH30 = 0x7D,
    PUSH31 = 0x7E,
    PUSH32 = 0x7F,

    // Dup Operations
    DUP1 = 0x80,
    DUP2 = 0x81,
    DUP3 = 0x82,
    DUP4 = 0x83,
    DUP5 = 0x84,
    DUP6 = 0x85,
    DUP7 = 0x86,
    DUP8 = 0x87,
    DUP9 = 0x88,
    DUP10 = 0x89,
    DUP11 = 0x8A,
    DUP12 = 0x8B,
    DUP13 = 0x8C,
    DUP14 = 0x8D,
    DUP15 = 0x8E,
    DUP16 = 0x8F,

    // Swap Operations
    SWAP1 = 0x90,
    SWAP2 = 0x91,
    SWAP3 = 0x92,
    SWAP4 = 0x93,
    SWAP5 = 0x94,
    SWAP6 = 0x95,
    SWAP7 = 0x96,
    SWAP8 = 0x97,
    SWAP9 = 0x98,
    SWAP10 = 0x99,
    SWAP11 = 0x9A,
    SWAP12 = 0x9B,
    SWAP13 = 0x9C,
    SWAP14 = 0x9D,
    SWAP15 = 0x9E,
    SWAP16 = 0x9F,

    // Logging
    LOG0 = 0xA0,
    LOG1 = 0xA1,
    LOG2 = 0xA2,
    LOG3 = 0xA3,
    LOG4 = 0xA4,

    // System
    CREATE = 0xF0,
    CALL = 0xF1,
    RETURN = 0xF3,
    DELEGATECALL = 0xF4,
    STATICCALL = 0xFA,
    REVERT = 0xFD,
    INVALID = 0xFE,
}

const PUSH_OPS: [Opcode; 32] = [
    Opcode::PUSH1, Opcode::PUSH2, Opcode::PUSH3, Opcode::PUSH4,
    Opcode::PUSH5, Opcode::PUSH6, Opcode::PUSH7, Opcode::PUSH8,
    Opcode::PUSH9, Opcode::PUSH10, Opcode::PUSH11, Opcode::PUSH12,
    Opcode::PUSH13, Opcode::PUSH14, Opcode::PUSH15, Opcode::PUSH16,
    Opcode::PUSH17, Opcode::PUSH18, Opcode::PUSH19, Opcode::PUSH20,
    Opcode::PUSH21, Opcode::PUSH22, Opcode::PUSH23, Opcode::PUSH24,
    Opcode::PUSH25, Opcode::PUSH26, Opcode::PUSH27, Opcode::PUSH28,
    Opcode::PUSH29, Opcode::PUSH30, Opcode::PUSH31, Opcode::PUSH32,
];

const DUP_OPS: [Opcode; 16] = [
    Opcode::DUP1, Opcode::DUP2, Opcode::DUP3, Opcode::DUP4,
    Opcode::DUP5, Opcode::DUP6, Opcode::DUP7, Opcode::DUP8,
    Opcode::DUP9, Opcode::DUP10, Opcode::DUP11, Opcode::DUP12,
    Opcode::DUP13, Opcode::DUP14, Opcode::DUP15, Opcode::DUP16,
];

const SWAP_OPS: [Opcode; 16] = [
    Opcode::SWAP1, Opcode::SWAP2, Opcode::SWAP3, Opcode::SWAP4,
    Opcode::SWAP5, Opcode::SWAP6, Opcode::SWAP7, Opcode::SWAP8,
    Opcode::SWAP9, Opcode::SWAP10, Opcode::SWAP11, Opcode::SWAP12,
    Opcode::SWAP13, Opcode::SWAP14, Opcode::SWAP15, Opcode::SWAP16,
];

const LOG_OPS: [Opcode; 5] = [Opcode::LOG0, Opcode::LOG1, Opcode::LOG2, Opcode::LOG3, Opcode::LOG4];

impl Opcode {
    /// Try to convert from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::STOP),
            0x01 => Some(Self::ADD),
            0x02 => Some(Self::MUL),
            0x03 => Some(Self::SUB),
            0x04 => Some(Self::DIV),
            0x05 => Some(Self::SDIV),
            0x06 => Some(Self::MOD),
            0x07 => Some(Self::SMOD),
            0x08 => Some(Self::ADDMOD),
            0x09 => Some(Self::MULMOD),
            0x0A => Some(Self::EXP),
            0x0B => Some(Self::SIGNEXTEND),
            0x10 => Some(Self::LT),
            0x11 => Some(Self::GT),
            0x12 => Some(Self::SLT),
            0x13 => Some(Self::SGT),
            0x14 => Some(Self::EQ),
            0x15 => Some(Self::ISZERO),
            0x16 => Some(Self::AND),
            0x17 => Some(Self::OR),
            0x18 => Some(Self::XOR),
            0x19 => Some(Self::NOT),
            0x1A => Some(Self::BYTE),
            0x1B => Some(Self::SHL),
            0x1C => Some(Self::SHR),
            0x1D => Some(Self::SAR),
            0x20 => Some(Self::KECCAK256),
            0x30 => Some(Self::ADDRESS),
            0x31 => Some(Self::BALANCE),
            0x32 => Some(Self::ORIGIN),
            0x33 => Some(Self::CALLER),
            0x34 => Some(Self::CALLVALUE),
            0x35 => Some(Self::CALLDATALOAD),
            0x36 => Some(Self::CALLDATASIZE),
            0x37 => Some(Self::CALLDATACOPY),
            0x38 => Some(Self::CODESIZE),
            0x39 => Some(Self::CODECOPY),
            0x3A => Some(Self::GASPRICE),
            0x3B => Some(Self::EXTCODESIZE),
            0x3C => Some(Self::EXTCODECOPY),
            0x3D => Some(Self::RETURNDATASIZE),
            0x3E => Some(Self::RETURNDATACOPY),
            0x3F => Some(Self::EXTCODEHASH),
            0x40 => Some(Self::BLOCKHASH),
            0x41 => Some(Self::COINBASE),
            0x42 => Some(Self::TIMESTAMP),
            0x43 => Some(Self::NUMBER),
            0x45 => Some(Self::GASLIMIT),
            0x47 => Some(Self::SELFBALANCE),
            0x50 => Some(Self::POP),
            0x51 => Some(Self::MLOAD),
            0x52 => Some(Self::MSTORE),
            0x53 => Some(Self::MSTORE8),
            0x54 => Some(Self::SLOAD),
            0x55 => Some(Self::SSTORE),
            0x56 => Some(Self::JUMP),
            0x57 => Some(Self::JUMPI),
            0x58 => Some(Self::PC),
            0x59 => Some(Self::MSIZE),
            0x5A => Some(Self::GAS),
            0x5B => Some(Self::JUMPDEST),
            0x60..=0x7F => Some(PUSH_OPS[(byte - 0x60) as usize]),
            0x80..=0x8F => Some(DUP_OPS[(byte - 0x80) as usize]),
            0x90..=0x9F => Some(SWAP_OPS[(byte - 0x90) as usize]),
            0xA0..=0xA4 => Some(LOG_OPS[(byte - 0xA0) as usize]),
            0xF0 => Some(Self::CREATE),
            0xF1 => Some(Self::CALL),
            0xF3 => Some(Self::RETURN),
            0xF4 => Some(Self::DELEGATECALL),
            0xFA => Some(Self::STATICCALL),
            0xFD => Some(Self::REVERT),
            0xFE => Some(Self::INVALID),
            _ => None,
        }
    }

    /// Get PUSH operand size (1-32 for PUSH1-PUSH32, 0 otherwise)
    pub fn push_size(self) -> usize {
        let byte = self as u8;
        if (0x60..=0x7F).contains(&byte) {
            (byte - 0x5F) as usize
        } else {
            0
        }
    }

    /// Check if this is a PUSH opcode
    pub fn is_push(self) -> bool {
        self.push_size() > 0
    }

    /// Get DUP depth (1-16 for DUP1-DUP16, 0 otherwise)
    pub fn dup_depth(self) -> usize {
        let byte = self as u8;
        if (0x80..=0x8F).contains(&byte) {
            (byte - 0x7F) as usize
        } else {
            0
        }
    }

    /// Get SWAP depth (1-16 for SWAP1-SWAP16, 0 otherwise)
    pub fn swap_depth(self) -> usize {
        let byte = self as u8;
        if (0x90..=0x9F).contains(&byte) {
            (byte - 0x8F) as usize
        } else {
            0
        }
    }

    /// Topic count for LOG0-LOG4, `None` for anything else
    pub fn log_topics(self) -> Option<usize> {
        let byte = self as u8;
        if (0xA0..=0xA4).contains(&byte) {
            Some((byte - 0xA0) as usize)
        } else {
            None
        }
    }
}
