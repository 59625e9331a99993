use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Environment variable holding the base64-encoded message key.
pub const ENCRYPTION_KEY_ENV: &str = "CHAT_ENCRYPTION_KEY";

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Leading byte of every payload. Also bound as associated data, so a
/// payload cannot be replayed under a different format version.
const PAYLOAD_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("{ENCRYPTION_KEY_ENV} is not set")]
    MissingKey,
    #[error("encryption key is not valid base64")]
    KeyEncoding,
    #[error("encryption key must be {KEY_LEN} bytes, got {0}")]
    KeyLength(usize),
    #[error("encryption failed")]
    Encrypt,
}

/// Why a payload could not be opened. Callers usually only log this.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecryptError {
    #[error("payload is not valid base64")]
    Encoding,
    #[error("payload is truncated")]
    Truncated,
    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u8),
    #[error("authentication failed")]
    Authentication,
    #[error("plaintext is not utf-8")]
    NotUtf8,
}

/// Symmetric authenticated cipher for message bodies at rest.
///
/// Payload layout, URL-safe base64 without padding:
/// `version (1) || nonce (12) || ciphertext || tag (16)`.
pub struct MessageCipher {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl MessageCipher {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// A cipher with a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self::new(key)
    }

    /// A fresh random key, base64-encoded for use as [`ENCRYPTION_KEY_ENV`].
    pub fn generate_key_b64() -> String {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut key[..]);
        URL_SAFE.encode(&key[..])
    }

    /// Parse a base64 key. Standard and URL-safe alphabets are accepted,
    /// padded or not.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let encoded = encoded.trim();
        let raw = Zeroizing::new(
            [URL_SAFE, URL_SAFE_NO_PAD, STANDARD, STANDARD_NO_PAD]
                .iter()
                .find_map(|engine| engine.decode(encoded).ok())
                .ok_or(CryptoError::KeyEncoding)?,
        );
        let key: [u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::KeyLength(raw.len()))?;
        Ok(Self::new(key))
    }

    /// Load the key from [`ENCRYPTION_KEY_ENV`].
    pub fn from_env() -> Result<Self, CryptoError> {
        Self::from_env_var(ENCRYPTION_KEY_ENV)
    }

    fn from_env_var(name: &str) -> Result<Self, CryptoError> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Self::from_base64(&value),
            _ => Err(CryptoError::MissingKey),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher =
            ChaCha20Poly1305::new_from_slice(&self.key[..]).map_err(|_| CryptoError::Encrypt)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &[PAYLOAD_VERSION],
                },
            )
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(1 + NONCE_LEN + sealed.len());
        out.push(PAYLOAD_VERSION);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    pub fn decrypt(&self, payload: &str) -> Result<String, DecryptError> {
        let raw = URL_SAFE_NO_PAD
            .decode(payload.trim())
            .map_err(|_| DecryptError::Encoding)?;

        let (&version, rest) = raw.split_first().ok_or(DecryptError::Truncated)?;
        if version != PAYLOAD_VERSION {
            return Err(DecryptError::UnsupportedVersion(version));
        }
        if rest.len() < NONCE_LEN + TAG_LEN {
            return Err(DecryptError::Truncated);
        }
        let (nonce_bytes, sealed) = rest.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new_from_slice(&self.key[..])
            .map_err(|_| DecryptError::Authentication)?;
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: sealed,
                    aad: &[version],
                },
            )
            .map_err(|_| DecryptError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| DecryptError::NotUtf8)
    }
}

impl std::fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCipher").finish_non_exhaustive()
    }
}
