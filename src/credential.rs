//! PIN credential storage and verification.
//!
//! The confirmation dialog treats the credential check as a black box; this
//! module is the default implementation. PINs are hashed with Argon2id and
//! the hash is persisted through the same key-value backend as card styles.
//! The plaintext PIN lives only in a [`SecurePin`] that zeroes its memory on
//! drop.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;
use zeroize::ZeroizeOnDrop;

use crate::cards::{KvBackend, StoreError};
use crate::pin::CredentialCheck;

/// Backend key under which the credential hash is stored.
const CREDENTIAL_KEY: &str = "finboard-credential";

/// Minimum PIN length.
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum PIN length.
pub const MAX_PIN_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("PIN must contain only digits")]
    NonNumeric,

    #[error("PIN too short (minimum {0} digits)")]
    TooShort(usize),

    #[error("PIN too long (maximum {0} digits)")]
    TooLong(usize),

    #[error("Hash error")]
    HashError,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// PIN wrapper that zeros memory on drop.
#[derive(ZeroizeOnDrop)]
pub struct SecurePin(String);

impl SecurePin {
    pub fn new(pin: String) -> Result<Self, CredentialError> {
        if !pin.chars().all(|c| c.is_ascii_digit()) || pin.is_empty() {
            return Err(CredentialError::NonNumeric);
        }
        if pin.len() < MIN_PIN_LENGTH {
            return Err(CredentialError::TooShort(MIN_PIN_LENGTH));
        }
        if pin.len() > MAX_PIN_LENGTH {
            return Err(CredentialError::TooLong(MAX_PIN_LENGTH));
        }
        Ok(Self(pin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// An enrolled PIN, stored as an Argon2id hash.
#[derive(Debug, Clone)]
pub struct PinCredential {
    hash: String,
}

impl PinCredential {
    /// Hash a PIN for storage.
    pub fn create(pin: &SecurePin) -> Result<Self, CredentialError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|_| CredentialError::HashError)?
            .to_string();
        Ok(PinCredential { hash })
    }

    /// Load the enrolled credential, if any.
    pub fn load(backend: &dyn KvBackend) -> Result<Option<Self>, CredentialError> {
        Ok(backend.get(CREDENTIAL_KEY)?.map(|hash| PinCredential { hash }))
    }

    /// Persist the credential hash.
    pub fn save(&self, backend: &dyn KvBackend) -> Result<(), CredentialError> {
        backend.set(CREDENTIAL_KEY, &self.hash)?;
        Ok(())
    }

    /// Remove the enrolled credential.
    pub fn clear(backend: &dyn KvBackend) -> Result<(), CredentialError> {
        backend.remove(CREDENTIAL_KEY)?;
        Ok(())
    }
}

impl CredentialCheck for PinCredential {
    fn check(&self, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            log::warn!("⚠ Stored credential hash is unparsable");
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Check if a PIN is trivially guessable (sequential, repeated, common).
pub fn is_weak_pin(pin: &SecurePin) -> bool {
    let s = pin.as_str();

    if s == &"0123456789"[..s.len()] || s == &"9876543210"[..s.len()] {
        return true;
    }

    let mut chars = s.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    let weak_pins = ["1234", "0000", "1111", "1212", "1004", "2000"];
    weak_pins.contains(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::MemoryBackend;

    #[test]
    fn test_pin_validation() {
        assert!(SecurePin::new("".to_string()).is_err());
        assert!(SecurePin::new("12a4".to_string()).is_err());
        assert!(SecurePin::new("123".to_string()).is_err());
        assert!(SecurePin::new("123456789".to_string()).is_err());
        assert!(SecurePin::new("1234".to_string()).is_ok());
    }

    #[test]
    fn test_create_and_check() {
        let pin = SecurePin::new("5678".to_string()).unwrap();
        let cred = PinCredential::create(&pin).unwrap();

        assert!(cred.check("5678"));
        assert!(!cred.check("0000"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(PinCredential::load(&backend).unwrap().is_none());

        let pin = SecurePin::new("4721".to_string()).unwrap();
        PinCredential::create(&pin).unwrap().save(&backend).unwrap();

        let loaded = PinCredential::load(&backend).unwrap().unwrap();
        assert!(loaded.check("4721"));

        PinCredential::clear(&backend).unwrap();
        assert!(PinCredential::load(&backend).unwrap().is_none());
    }

    #[test]
    fn test_weak_pin_detection() {
        assert!(is_weak_pin(&SecurePin::new("1234".to_string()).unwrap()));
        assert!(is_weak_pin(&SecurePin::new("0000".to_string()).unwrap()));
        assert!(is_weak_pin(&SecurePin::new("9876".to_string()).unwrap()));
        assert!(!is_weak_pin(&SecurePin::new("4721".to_string()).unwrap()));
    }
}
