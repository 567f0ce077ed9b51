//! Keyed event hashing.
//!
//! The engine owns the HMAC key. It is read-only after construction and can
//! be shared across threads behind an `Arc`.

use std::io::Write;
use std::path::Path;

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sealog_core::EventFields;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::canonical;
use crate::digest::EventDigest;
use crate::error::{CryptoError, CryptoResult};
use crate::merkle;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted key length in bytes (256 bits).
pub const MIN_KEY_LEN: usize = 32;

/// Computes keyed event digests and Merkle roots.
///
/// The key is zeroized on drop and never exposed; `Debug` shows only a
/// short fingerprint.
pub struct HashEngine {
    key: Zeroizing<Vec<u8>>,
}

impl HashEngine {
    /// Create an engine with a fresh random 256-bit key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = Zeroizing::new(vec![0u8; MIN_KEY_LEN]);
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create an engine from existing key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the key is shorter than
    /// [`MIN_KEY_LEN`].
    pub fn from_key(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < MIN_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                minimum: MIN_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            key: Zeroizing::new(bytes.to_vec()),
        })
    }

    /// Create an engine from a hex-encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidHexEncoding`] for malformed hex, or
    /// [`CryptoError::InvalidKeyLength`] if the decoded key is too short.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes =
            Zeroizing::new(hex::decode(s.trim()).map_err(|_| CryptoError::InvalidHexEncoding)?);
        Self::from_key(&bytes)
    }

    /// Load a key from a file, or generate and save a new one.
    ///
    /// The file holds raw key bytes. New files are created atomically with
    /// mode 0o600 on Unix; symlinked key files are refused. Parent
    /// directories are created if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] on I/O failures or symlink detection,
    /// or [`CryptoError::InvalidKeyLength`] if the file holds too few bytes.
    pub fn load_or_generate(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CryptoError::IoError(e.to_string()))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(path)
            {
                Ok(mut file) => {
                    let engine = Self::generate();
                    file.write_all(&engine.key)
                        .map_err(|e| CryptoError::IoError(e.to_string()))?;
                    return Ok(engine);
                },
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {},
                Err(e) => return Err(CryptoError::IoError(e.to_string())),
            }
        }

        #[cfg(not(unix))]
        if !path.exists() {
            let engine = Self::generate();
            std::fs::write(path, engine.key.as_slice())
                .map_err(|e| CryptoError::IoError(e.to_string()))?;
            return Ok(engine);
        }

        let meta =
            std::fs::symlink_metadata(path).map_err(|e| CryptoError::IoError(e.to_string()))?;
        if meta.file_type().is_symlink() {
            return Err(CryptoError::IoError(
                "refusing to read key file: path is a symlink".into(),
            ));
        }

        let bytes =
            Zeroizing::new(std::fs::read(path).map_err(|e| CryptoError::IoError(e.to_string()))?);
        Self::from_key(&bytes)
    }

    /// Short key fingerprint: first 8 bytes of SHA-256 over the key.
    #[must_use]
    pub fn key_id(&self) -> [u8; 8] {
        let digest = Sha256::digest(self.key.as_slice());
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[..8]);
        id
    }

    /// The key fingerprint as hex.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.key_id())
    }

    /// Keyed digest of an event's canonical form.
    ///
    /// The canonical bytes are streamed into the MAC, so payload size is
    /// bounded only by the memory already holding the payload.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if canonicalization fails.
    pub fn hash_event(&self, fields: &EventFields<'_>) -> CryptoResult<EventDigest> {
        let mut writer = MacWriter(self.mac()?);
        canonical::write_event(&mut writer, fields)?;
        Ok(EventDigest::from_bytes(writer.0.finalize().into_bytes().into()))
    }

    /// Recompute an event's digest and compare it to `expected` in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if canonicalization fails.
    /// A mismatch is `Ok(false)`, not an error.
    pub fn verify_digest(
        &self,
        fields: &EventFields<'_>,
        expected: &EventDigest,
    ) -> CryptoResult<bool> {
        Ok(self.hash_event(fields)?.ct_eq(expected))
    }

    /// Merkle root over ordered digests. See [`merkle::merkle_root`].
    #[must_use]
    pub fn merkle_root(&self, digests: &[EventDigest]) -> EventDigest {
        merkle::merkle_root(digests)
    }

    fn mac(&self) -> CryptoResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| CryptoError::InvalidKeyLength {
            minimum: MIN_KEY_LEN,
            actual: self.key.len(),
        })
    }
}

impl std::fmt::Debug for HashEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashEngine")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}

/// Adapts the MAC to `io::Write` so canonical bytes stream straight in.
struct MacWriter(HmacSha256);

impl Write for MacWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
