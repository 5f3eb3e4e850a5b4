//! JSON receipt representation

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use volt_primitives::{Address, H256, U256};
use volt_types::{Log, Output, Receipt};

use crate::error::{ApiError, ApiResult};

/// Format U256 as hex string
pub fn format_u256(value: &U256) -> String {
    format!("0x{:x}", value)
}

/// Format u64 as hex string
pub fn format_u64(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Format bytes as hex string
pub fn format_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse hex bytes, with or without the 0x prefix
pub fn parse_hex_bytes(field: &'static str, s: &str) -> ApiResult<Vec<u8>> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| ApiError::invalid(field, e))
}

fn parse_hex_u64(field: &'static str, s: &str) -> ApiResult<u64> {
    let digits = s.strip_prefix("0x").ok_or_else(|| ApiError::invalid(field, "missing 0x prefix"))?;
    u64::from_str_radix(digits, 16).map_err(|e| ApiError::invalid(field, e))
}

/// Receipt as externally presented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptJson {
    /// Gas used, hex quantity
    pub gas_used: String,
    /// Account that paid for gas
    pub gas_payer: Address,
    /// Whether every clause was rolled back
    pub reverted: bool,
    /// Per-clause outputs, empty when reverted
    pub outputs: Vec<OutputJson>,
}

/// One clause output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputJson {
    /// Logs in emission order
    pub logs: Vec<LogJson>,
}

/// One log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogJson {
    /// Emitting contract
    pub address: Address,
    /// Topics in order
    pub topics: Vec<H256>,
    /// Data, hex
    pub data: String,
}

impl From<&Log> for LogJson {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address,
            topics: log.topics.clone(),
            data: format_bytes(&log.data),
        }
    }
}

impl From<&Output> for OutputJson {
    fn from(output: &Output) -> Self {
        Self {
            logs: output.logs.iter().map(LogJson::from).collect(),
        }
    }
}

impl From<&Receipt> for ReceiptJson {
    fn from(receipt: &Receipt) -> Self {
        let outputs = if receipt.reverted {
            Vec::new()
        } else {
            receipt.outputs.iter().map(OutputJson::from).collect()
        };
        Self {
            gas_used: format_u64(receipt.gas_used),
            gas_payer: receipt.gas_payer,
            reverted: receipt.reverted,
            outputs,
        }
    }
}

impl TryFrom<&LogJson> for Log {
    type Error = ApiError;

    fn try_from(log: &LogJson) -> ApiResult<Self> {
        let data = parse_hex_bytes("data", &log.data)?;
        Ok(Log::new(log.address, log.topics.clone(), Bytes::from(data)))
    }
}

impl TryFrom<&ReceiptJson> for Receipt {
    type Error = ApiError;

    fn try_from(json: &ReceiptJson) -> ApiResult<Self> {
        let outputs = json
            .outputs
            .iter()
            .map(|output| {
                let logs = output.logs.iter().map(Log::try_from).collect::<ApiResult<Vec<_>>>()?;
                Ok(Output { logs })
            })
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Receipt {
            gas_used: parse_hex_u64("gasUsed", &json.gas_used)?,
            gas_payer: json.gas_payer,
            reverted: json.reverted,
            outputs,
        })
    }
}

impl ReceiptJson {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
