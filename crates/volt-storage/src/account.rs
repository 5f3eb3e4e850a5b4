//! Account model

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use volt_primitives::{H256, U256, U512};

use crate::error::{StorageError, StorageResult};

/// Energy generated per unit of balance per second, scaled by 1e18
pub const ENERGY_GROWTH_RATE: u64 = 5_000_000_000;

/// Empty code hash (keccak256 of empty bytes)
pub const EMPTY_CODE_HASH: H256 = H256::from_bytes([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c,
    0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b,
    0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Account data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Value balance
    pub balance: U256,
    /// Energy as of `block_time`
    pub energy: U256,
    /// Time at which `energy` was last settled
    pub block_time: u64,
    /// Code hash (EMPTY_CODE_HASH if no code)
    pub code_hash: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            energy: U256::zero(),
            block_time: 0,
            code_hash: EMPTY_CODE_HASH,
        }
    }
}

impl Account {
    /// Create a new empty account
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if account is empty
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.energy.is_zero() && !self.has_code()
    }

    /// Check if account has code
    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }

    /// Energy at `time`, including what the balance generated since `block_time`
    pub fn energy_at(&self, time: u64) -> U256 {
        if time <= self.block_time || self.balance.is_zero() {
            return self.energy;
        }
        let elapsed = U256::from(time - self.block_time) * U256::from(ENERGY_GROWTH_RATE);
        let growth = self.balance.full_mul(elapsed) / U512::from(1_000_000_000_000_000_000u64);
        let growth = U256::try_from(growth).unwrap_or(U256::MAX);
        self.energy.saturating_add(growth)
    }

    /// Fold generated energy into `energy` and move `block_time` forward
    pub fn settle(&mut self, time: u64) {
        if time > self.block_time {
            self.energy = self.energy_at(time);
            self.block_time = time;
        }
    }

    /// Serialize account to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    /// Deserialize account from bytes
    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        rlp::decode(bytes).map_err(|e| StorageError::Deserialization(e.to_string()))
    }
}

impl Encodable for Account {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.balance);
        s.append(&self.energy);
        s.append(&self.block_time);
        s.append(&self.code_hash);
    }
}

impl Decodable for Account {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Account {
            balance: rlp.val_at(0)?,
            energy: rlp.val_at(1)?,
            block_time: rlp.val_at(2)?,
            code_hash: rlp.val_at(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn test_empty_account() {
        let account = Account::new();
        assert!(account.is_empty());
        assert!(!account.has_code());
        assert_eq!(account.code_hash, EMPTY_CODE_HASH);
    }

    #[test]
    fn test_account_with_energy_is_not_empty() {
        let mut account = Account::new();
        account.energy = U256::one();
        assert!(!account.is_empty());
    }

    #[test]
    fn test_energy_growth() {
        let account = Account {
            balance: ether(1),
            energy: U256::from(7),
            block_time: 100,
            ..Default::default()
        };
        // 1e18 * 10s * 5e9 / 1e18 = 5e10
        assert_eq!(account.energy_at(110), U256::from(7u64 + 50_000_000_000));
    }

    #[test]
    fn test_no_growth_backwards_or_without_balance() {
        let account = Account {
            balance: ether(1),
            energy: U256::from(7),
            block_time: 100,
            ..Default::default()
        };
        assert_eq!(account.energy_at(100), U256::from(7));
        assert_eq!(account.energy_at(50), U256::from(7));

        let poor = Account {
            energy: U256::from(3),
            block_time: 1,
            ..Default::default()
        };
        assert_eq!(poor.energy_at(1_000_000), U256::from(3));
    }

    #[test]
    fn test_growth_does_not_overflow() {
        let account = Account {
            balance: U256::MAX,
            energy: U256::MAX - U256::from(1),
            block_time: 0,
            ..Default::default()
        };
        assert_eq!(account.energy_at(u64::MAX), U256::MAX);
    }

    #[test]
    fn test_settle() {
        let mut account = Account {
            balance: ether(2),
            block_time: 10,
            ..Default::default()
        };
        account.settle(20);
        assert_eq!(account.block_time, 20);
        assert_eq!(account.energy, U256::from(100_000_000_000u64));

        // settling into the past is a no-op
        account.settle(5);
        assert_eq!(account.block_time, 20);
    }

    #[test]
    fn test_account_serialization() {
        let account = Account {
            balance: ether(42),
            energy: U256::from(1000),
            block_time: 1_530_000_000,
            code_hash: H256::from_bytes([0x01; 32]),
        };
        let recovered = Account::from_bytes(&account.to_bytes()).unwrap();
        assert_eq!(account, recovered);
    }

    #[test]
    fn test_account_from_bytes_invalid() {
        assert!(matches!(
            Account::from_bytes(&[0xc0]),
            Err(StorageError::Deserialization(_))
        ));
        assert!(Account::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_empty_code_hash_constant() {
        assert_eq!(volt_crypto::keccak256(&[]), EMPTY_CODE_HASH);
    }
}
