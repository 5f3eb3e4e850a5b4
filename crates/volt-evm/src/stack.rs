//! Operand stack

use volt_primitives::U256;

use crate::error::{VmError, VmResult};
use crate::gas::cost::MAX_STACK_SIZE;

/// Operand stack (max 1024 words)
#[derive(Clone, Debug, Default)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(64),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: U256) -> VmResult<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> VmResult<U256> {
        self.data.pop().ok_or(VmError::StackUnderflow)
    }

    /// Pop `N` values, top first
    pub fn pop_n<const N: usize>(&mut self) -> VmResult<[U256; N]> {
        if self.data.len() < N {
            return Err(VmError::StackUnderflow);
        }
        let mut values = [U256::zero(); N];
        for value in values.iter_mut() {
            *value = self.pop()?;
        }
        Ok(values)
    }

    /// Peek at the top of the stack
    pub fn peek(&self) -> VmResult<&U256> {
        self.data.last().ok_or(VmError::StackUnderflow)
    }

    /// Peek at a specific depth (0 = top)
    pub fn peek_at(&self, depth: usize) -> VmResult<&U256> {
        if depth >= self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        Ok(&self.data[self.data.len() - 1 - depth])
    }

    /// Swap top with item at depth (1 = swap with second item)
    pub fn swap(&mut self, depth: usize) -> VmResult<()> {
        let len = self.data.len();
        if depth == 0 || depth >= len {
            return Err(VmError::StackUnderflow);
        }
        self.data.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Duplicate item at depth to top (1 = dup top)
    pub fn dup(&mut self, depth: usize) -> VmResult<()> {
        if depth == 0 || depth > self.data.len() {
            return Err(VmError::StackUnderflow);
        }
        let value = self.data[self.data.len() - depth];
        self.push(value)
    }

    /// Get stack length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
