//! Hash function capabilities
//!
//! Hash functions are injected as strategy objects and looked up through a
//! [`HashRegistry`] owned by the caller, keyed by multihash code or name.
//! See: https://github.com/multiformats/multicodec/blob/master/table.csv

use sha2::{Digest, Sha256 as Sha256State};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{IpldError, Result};

/// SHA-256 multihash code
pub const SHA2_256_CODE: u64 = 0x12;

/// SHA-256 multihash name
pub const SHA2_256_NAME: &str = "sha2-256";

/// SHA-256 digest length in bytes
pub const SHA2_256_LEN: usize = 32;

/// Incremental hash state owned by a single verification run
pub trait StreamHasher: Send {
    fn update(&mut self, data: &[u8]);

    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// A hash function usable for content addressing
pub trait HashFunction: Send + Sync {
    /// Multihash code
    fn code(&self) -> u64;

    /// Multihash name, e.g. `sha2-256`
    fn name(&self) -> &'static str;

    /// Digest length in bytes
    fn digest_len(&self) -> usize;

    /// Start a fresh incremental hash
    fn hasher(&self) -> Box<dyn StreamHasher>;

    /// Hash a complete buffer
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

/// SHA2-256 via the `sha2` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

struct Sha256Hasher(Sha256State);

impl StreamHasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

impl HashFunction for Sha256 {
    fn code(&self) -> u64 {
        SHA2_256_CODE
    }

    fn name(&self) -> &'static str {
        SHA2_256_NAME
    }

    fn digest_len(&self) -> usize {
        SHA2_256_LEN
    }

    fn hasher(&self) -> Box<dyn StreamHasher> {
        Box::new(Sha256Hasher(Sha256State::new()))
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Sha256State::digest(data).to_vec()
    }
}

/// Resolves hash functions by multihash code or name
#[derive(Clone)]
pub struct HashRegistry {
    by_code: HashMap<u64, Arc<dyn HashFunction>>,
}

impl HashRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            by_code: HashMap::new(),
        }
    }

    /// Register a hash function, replacing any previous one with the same code
    pub fn register(&mut self, function: Arc<dyn HashFunction>) {
        self.by_code.insert(function.code(), function);
    }

    /// Look up a hash function by multihash code
    pub fn by_code(&self, code: u64) -> Result<Arc<dyn HashFunction>> {
        self.by_code
            .get(&code)
            .cloned()
            .ok_or_else(|| IpldError::UnknownHashFunction(format!("0x{:02x}", code)))
    }

    /// Look up a hash function by multihash name
    pub fn by_name(&self, name: &str) -> Result<Arc<dyn HashFunction>> {
        self.by_code
            .values()
            .find(|f| f.name() == name)
            .cloned()
            .ok_or_else(|| IpldError::UnknownHashFunction(name.to_string()))
    }

    /// Convenience wrapper: hash `data` with the named function
    pub fn hash(&self, name: &str, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.by_name(name)?.digest(data))
    }
}

impl Default for HashRegistry {
    /// A registry with sha2-256 registered
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(Sha256));
        registry
    }
}

impl fmt::Debug for HashRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.by_code.values().map(|h| h.name()).collect();
        names.sort_unstable();
        f.debug_struct("HashRegistry").field("functions", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_digest() {
        let digest = Sha256.digest(b"hello");
        assert_eq!(
            hex::encode(&digest),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Sha256.hasher();
        hasher.update(b"hel");
        hasher.update(b"");
        hasher.update(b"lo");
        assert_eq!(hasher.finalize(), Sha256.digest(b"hello"));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = HashRegistry::default();
        assert_eq!(registry.by_code(SHA2_256_CODE).unwrap().name(), "sha2-256");
        assert_eq!(registry.by_name("sha2-256").unwrap().code(), 0x12);
        assert_eq!(
            registry.hash("sha2-256", b"hello").unwrap(),
            Sha256.digest(b"hello")
        );
    }

    #[test]
    fn test_empty_registry_rejects_lookup() {
        let registry = HashRegistry::empty();
        match registry.by_code(0x12) {
            Err(IpldError::UnknownHashFunction(code)) => assert_eq!(code, "0x12"),
            other => panic!("Expected UnknownHashFunction, got {:?}", other.map(|f| f.name())),
        }
        assert!(registry.by_name("blake3").is_err());
    }
}
