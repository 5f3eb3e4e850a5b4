//! Frame memory
//!
//! The interpreter charges for expansion and calls [`Memory::expand`] before
//! touching a region, so accessors here index without growing.

use volt_primitives::U256;

/// Byte-addressable memory that grows in 32-byte words
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Get current memory size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Grow to cover `end` bytes, rounded up to a whole word
    pub fn expand(&mut self, end: usize) {
        if end > self.data.len() {
            self.data.resize(end.div_ceil(32) * 32, 0);
        }
    }

    /// Load a 32-byte word
    pub fn load(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.load_slice(offset, 32))
    }

    /// Store a 32-byte word
    pub fn store(&mut self, offset: usize, value: U256) {
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        self.store_slice(offset, &word);
    }

    /// Store a single byte
    pub fn store8(&mut self, offset: usize, value: u8) {
        self.expand(offset + 1);
        self.data[offset] = value;
    }

    /// Copy out a region; bytes past the end read as zero
    pub fn load_slice(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut result = vec![0u8; size];
        if offset < self.data.len() {
            let end = offset.saturating_add(size).min(self.data.len());
            result[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        result
    }

    /// Write `data` at `offset`
    pub fn store_slice(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.expand(offset + data.len());
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Write `size` bytes of `source` starting at `source_offset`, zero-padding
    /// whatever lies past the end of `source`
    pub fn copy_padded(&mut self, offset: usize, source: &[u8], source_offset: usize, size: usize) {
        if size == 0 {
            return;
        }
        self.expand(offset + size);
        let target = &mut self.data[offset..offset + size];
        target.fill(0);
        if source_offset < source.len() {
            let available = (source.len() - source_offset).min(size);
            target[..available].copy_from_slice(&source[source_offset..source_offset + available]);
        }
    }

    /// Get raw data slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
