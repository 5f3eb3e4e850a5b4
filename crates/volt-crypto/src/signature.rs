//! secp256k1 signatures in the 65-byte `r ‖ s ‖ v` layout
//!
//! `v` is the raw recovery id (0 or 1). Signatures produced here are always
//! low-s.

use crate::{keccak256, CryptoError};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use volt_primitives::{Address, H256};

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key
pub type PrivateKey = SigningKey;

/// Recoverable ECDSA signature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component
    pub r: [u8; 32],
    /// s component
    pub s: [u8; 32],
    /// recovery id (0 or 1)
    pub v: u8,
}

impl Signature {
    /// Encoded length in bytes
    pub const LEN: usize = 65;

    /// Serialize as `r ‖ s ‖ v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Parse `r ‖ s ‖ v`, rejecting any other length
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Signature { r, s, v: bytes[64] })
    }

    fn to_k256(self) -> Result<(K256Signature, RecoveryId), CryptoError> {
        let sig = K256Signature::from_scalars(self.r, self.s)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let recovery_id =
            RecoveryId::from_byte(self.v).ok_or(CryptoError::InvalidRecoveryId(self.v))?;
        Ok((sig, recovery_id))
    }
}

/// Sign a 32-byte message hash. The result is normalized to low-s.
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (mut sig, mut recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    Ok(Signature {
        r: sig.r().to_bytes().into(),
        s: sig.s().to_bytes().into(),
        v: recovery_id.to_byte(),
    })
}

/// Verify a signature against a message hash and public key. High-s is rejected.
pub fn verify(message_hash: &H256, signature: &Signature, public_key: &PublicKey) -> bool {
    use k256::ecdsa::signature::hazmat::PrehashVerifier;

    let Ok((sig, _)) = signature.to_k256() else {
        return false;
    };
    if sig.normalize_s().is_some() {
        return false;
    }
    public_key.verify_prehash(message_hash.as_bytes(), &sig).is_ok()
}

/// Recover the signing public key
pub fn recover_public_key(
    message_hash: &H256,
    signature: &Signature,
) -> Result<PublicKey, CryptoError> {
    let (sig, recovery_id) = signature.to_k256()?;
    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Recover the signer address
pub fn recover_address(message_hash: &H256, signature: &Signature) -> Result<Address, CryptoError> {
    recover_public_key(message_hash, signature).map(|pk| public_key_to_address(&pk))
}

/// Derive an address: the last 20 bytes of keccak over the uncompressed key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_word(&hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_recover() {
        let key = SigningKey::random(&mut OsRng);
        let expected = public_key_to_address(key.verifying_key());
        let hash = keccak256(b"volt");

        let sig = sign(&hash, &key).unwrap();
        assert!(sig.v <= 1);
        assert_eq!(recover_address(&hash, &sig).unwrap(), expected);
        assert!(verify(&hash, &sig, key.verifying_key()));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let key = SigningKey::random(&mut OsRng);
        let sig = sign(&keccak256(b"roundtrip"), &key).unwrap();
        assert_eq!(Signature::from_slice(&sig.to_bytes()).unwrap(), sig);
    }

    #[test]
    fn test_from_slice_wrong_length() {
        assert_eq!(
            Signature::from_slice(&[0u8; 64]),
            Err(CryptoError::InvalidLength(64))
        );
    }

    #[test]
    fn test_recover_rejects_zero_scalars() {
        let sig = Signature { r: [0u8; 32], s: [0u8; 32], v: 0 };
        assert!(matches!(
            recover_address(&keccak256(b"x"), &sig),
            Err(CryptoError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_recover_rejects_bad_recovery_id() {
        let key = SigningKey::random(&mut OsRng);
        let hash = keccak256(b"x");
        let mut sig = sign(&hash, &key).unwrap();
        sig.v = 9;
        assert_eq!(recover_address(&hash, &sig), Err(CryptoError::InvalidRecoveryId(9)));
    }

    #[test]
    fn test_signatures_are_low_s() {
        for _ in 0..10 {
            let key = SigningKey::random(&mut OsRng);
            let hash = keccak256(b"low-s");
            let sig = sign(&hash, &key).unwrap();
            // n/2 starts with 0x7f...; the top bit of a low-s value is clear
            assert!(sig.s[0] <= 0x7f);
        }
    }

    #[test]
    fn test_tampered_message_recovers_other_address() {
        let key = SigningKey::random(&mut OsRng);
        let signer = public_key_to_address(key.verifying_key());
        let sig = sign(&keccak256(b"original"), &key).unwrap();
        match recover_address(&keccak256(b"tampered"), &sig) {
            Ok(addr) => assert_ne!(addr, signer),
            Err(_) => {}
        }
    }

    #[test]
    fn test_known_key_address() {
        // Well-known development key 0x...01
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_slice(&secret).unwrap();
        assert_eq!(
            public_key_to_address(key.verifying_key()).to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }
}
