pub mod cipher;
pub mod password;
pub mod rate_limit;
pub mod time;
pub mod token;

pub use cipher::{CryptoError, DecryptError, ENCRYPTION_KEY_ENV, MessageCipher};
pub use rate_limit::{CheckResult, Quota, RateLimiter};
