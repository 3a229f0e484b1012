//! Content-derived document keys.
//!
//! With the `digest-key` feature (default), a key is the first 10 lowercase
//! hex characters of MD5(title ++ path ++ millis). The millisecond salt makes
//! keys differ between calls for the same content; uniqueness within a table
//! is still enforced by the table itself.
//!
//! Without the feature the generator degrades to a 32-bit polynomial string
//! hash of `title ++ path` printed in decimal. That mode ignores the clock,
//! so the same title and path always produce the same key, and unrelated
//! documents collide far more often than with the digest.

use chrono::Utc;

/// Length of a digest-derived key, in hex characters.
pub const KEY_LEN: usize = 10;

/// How keys are derived by this build.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyMode {
    /// Truncated MD5 hex digest over content and timestamp.
    Digest,
    /// Decimal 32-bit string hash over content only. Weak.
    WeakHash,
}

#[derive(Debug, Clone)]
pub struct KeyGenerator {
    mode: KeyMode,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator {
    pub fn new() -> Self {
        let mode = if cfg!(feature = "digest-key") {
            KeyMode::Digest
        } else {
            KeyMode::WeakHash
        };
        if mode == KeyMode::WeakHash {
            log::warn!("MD5 unavailable; document keys use a weak 32-bit hash and may collide");
        }
        Self { mode }
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Key for `title` and `path`, salted with the current time.
    pub fn generate(&self, title: &str, path: &str) -> String {
        self.generate_at(title, path, Utc::now().timestamp_millis())
    }

    /// Key for `title` and `path` with an explicit millisecond salt.
    pub fn generate_at(&self, title: &str, path: &str, millis: i64) -> String {
        match self.mode {
            KeyMode::Digest => digest_key(title, path, millis),
            KeyMode::WeakHash => weak_key(title, path),
        }
    }
}

#[cfg(feature = "digest-key")]
fn digest_key(title: &str, path: &str, millis: i64) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(title.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(millis.to_string().as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(KEY_LEN);
    key
}

#[cfg(not(feature = "digest-key"))]
fn digest_key(title: &str, path: &str, _millis: i64) -> String {
    weak_key(title, path)
}

/// `h = 31 * h + unit` over the UTF-16 units of `title ++ path`, wrapping
/// at 32 bits, printed as an unsigned magnitude. The output never carries a
/// sign: a hash of `i32::MIN` prints as `2147483648`.
pub(crate) fn weak_key(title: &str, path: &str) -> String {
    let h = title
        .encode_utf16()
        .chain(path.encode_utf16())
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    h.unsigned_abs().to_string()
}
