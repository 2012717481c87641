use ring::hmac;
use ring::rand::SystemRandom;
use secrecy::{ExposeSecret, Secret};

#[derive(thiserror::Error, Debug)]
pub enum AdminAuthError {
    #[error("Administrator passphrase must not be empty")]
    EmptyPassphrase,

    #[error("Failed to generate verification key")]
    KeyGeneration,
}

/// Checks submitted passphrases against the configured administrator secret.
///
/// Only an HMAC tag of the secret is kept, under a key generated at startup,
/// and candidates are compared with `hmac::verify` so the comparison time does
/// not depend on how many leading bytes match.
#[derive(Clone)]
pub struct AdminGate {
    key: hmac::Key,
    tag: Vec<u8>,
}

impl AdminGate {
    pub fn new(passphrase: &Secret<String>) -> Result<Self, AdminAuthError> {
        let passphrase = passphrase.expose_secret();
        if passphrase.is_empty() {
            return Err(AdminAuthError::EmptyPassphrase);
        }

        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)
            .map_err(|_| AdminAuthError::KeyGeneration)?;
        let tag = hmac::sign(&key, passphrase.as_bytes()).as_ref().to_vec();

        Ok(Self { key, tag })
    }

    pub fn verify(&self, candidate: &str) -> bool {
        hmac::verify(&self.key, candidate.as_bytes(), &self.tag).is_ok()
    }
}
