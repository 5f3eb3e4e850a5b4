//! Transaction receipt types for Volt

use bytes::Bytes;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use volt_crypto::keccak256;
use volt_primitives::{Address, H256};

/// Log entry emitted during clause execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// Log topics (indexed parameters)
    pub topics: Vec<H256>,
    /// Log data (non-indexed parameters)
    pub data: Bytes,
}

impl Log {
    /// Create a new log entry
    pub fn new(address: Address, topics: Vec<H256>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }

    /// Get the first topic (usually the event signature)
    pub fn topic0(&self) -> Option<&H256> {
        self.topics.first()
    }
}

impl Encodable for Log {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.address);
        s.append_list(&self.topics);
        s.encoder().encode_value(&self.data);
    }
}

impl Decodable for Log {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Log {
            address: rlp.val_at(0)?,
            topics: rlp.list_at(1)?,
            data: rlp
                .at(2)?
                .decoder()
                .decode_value(|bytes| Ok(Bytes::copy_from_slice(bytes)))?,
        })
    }
}

/// Logs of one successful clause
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Output {
    /// Logs in emission order
    pub logs: Vec<Log>,
}

impl Encodable for Output {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append_list(&self.logs);
    }
}

impl Decodable for Output {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(Output {
            logs: rlp.as_list()?,
        })
    }
}

/// Transaction receipt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Gas used by the whole transaction, after refunds
    pub gas_used: u64,
    /// Account whose energy paid for the gas
    pub gas_payer: Address,
    /// Whether a clause failed and every state change was discarded
    pub reverted: bool,
    /// One output per clause; empty when reverted
    pub outputs: Vec<Output>,
}

impl Receipt {
    /// Check if the transaction took effect
    pub fn is_success(&self) -> bool {
        !self.reverted
    }

    /// Iterate over every log across all outputs
    pub fn logs(&self) -> impl Iterator<Item = &Log> {
        self.outputs.iter().flat_map(|output| output.logs.iter())
    }

    /// Keccak-256 of the RLP encoding
    pub fn hash(&self) -> H256 {
        keccak256(&rlp::encode(self))
    }
}

impl Encodable for Receipt {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.gas_used);
        s.append(&self.gas_payer);
        s.append(&self.reverted);
        s.append_list(&self.outputs);
    }
}

impl Decodable for Receipt {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Receipt {
            gas_used: rlp.val_at(0)?,
            gas_payer: rlp.val_at(1)?,
            reverted: rlp.val_at(2)?,
            outputs: rlp.list_at(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log(seed: u8) -> Log {
        Log::new(
            Address::from_bytes([seed; 20]),
            vec![H256::from_bytes([seed; 32]), H256::from_bytes([seed + 1; 32])],
            Bytes::from(vec![seed; 4]),
        )
    }

    fn sample_receipt() -> Receipt {
        Receipt {
            gas_used: 21_000,
            gas_payer: Address::from_bytes([0x11; 20]),
            reverted: false,
            outputs: vec![
                Output {
                    logs: vec![sample_log(1), sample_log(2)],
                },
                Output::default(),
            ],
        }
    }

    #[test]
    fn test_log_topic0() {
        let log = sample_log(3);
        assert_eq!(log.topic0(), Some(&H256::from_bytes([3; 32])));
        let empty = Log::new(Address::ZERO, vec![], Bytes::new());
        assert!(empty.topic0().is_none());
    }

    #[test]
    fn test_receipt_logs_flatten_in_order() {
        let receipt = sample_receipt();
        let addrs: Vec<_> = receipt.logs().map(|l| l.address).collect();
        assert_eq!(
            addrs,
            vec![Address::from_bytes([1; 20]), Address::from_bytes([2; 20])]
        );
        assert!(receipt.is_success());
    }

    #[test]
    fn test_receipt_rlp_roundtrip() {
        let receipt = sample_receipt();
        let decoded: Receipt = rlp::decode(&rlp::encode(&receipt)).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn test_reverted_receipt_encoding() {
        let receipt = Receipt {
            gas_used: 30_000,
            gas_payer: Address::from_bytes([0x22; 20]),
            reverted: true,
            outputs: vec![],
        };
        let encoded = rlp::encode(&receipt);
        // outputs is the empty list, not a list of empty outputs
        assert_eq!(*encoded.last().unwrap(), 0xc0);
        assert!(!receipt.is_success());
    }

    #[test]
    fn test_receipt_hash_is_deterministic() {
        let a = sample_receipt();
        let b = sample_receipt();
        assert_eq!(a.hash(), b.hash());

        let mut c = sample_receipt();
        c.outputs[0].logs[1].topics.swap(0, 1);
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn test_empty_and_missing_outputs_differ() {
        let mut with_empty = sample_receipt();
        with_empty.outputs = vec![Output::default()];
        let mut without = sample_receipt();
        without.outputs = vec![];
        assert_ne!(with_empty.hash(), without.hash());
    }
}
