//! Error types for content addressing and IPLD conversion

use std::fmt;
use thiserror::Error;

/// Field of the binary CID layout that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidField {
    /// Byte 0, the CID version
    Version,
    /// Byte 1, the content codec
    Codec,
    /// Byte 2, the multihash function code
    HashFunction,
    /// Byte 3, the declared digest length
    DigestLength,
    /// Bytes 4.., the digest itself
    Digest,
}

impl fmt::Display for CidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CidField::Version => "version",
            CidField::Codec => "codec",
            CidField::HashFunction => "hash function",
            CidField::DigestLength => "digest length",
            CidField::Digest => "digest",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum IpldError {
    #[error("Invalid CID {field}: expected {expected}, actual {actual}")]
    InvalidCid {
        field: CidField,
        expected: String,
        actual: String,
    },

    #[error("Invalid CID text: {0}")]
    InvalidCidText(String),

    #[error("CID mismatch: expected {expected}, actual {actual}")]
    CidMismatch { expected: String, actual: String },

    #[error("Block creation failed: {0}")]
    BlockCreationFailed(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Unknown hash function: {0}")]
    UnknownHashFunction(String),
}

impl IpldError {
    pub(crate) fn invalid_cid(
        field: CidField,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        IpldError::InvalidCid {
            field,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// The offending field, if this is a structural CID error
    pub fn cid_field(&self) -> Option<CidField> {
        match self {
            IpldError::InvalidCid { field, .. } => Some(*field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IpldError>;

/// Lets io-based chunk streams carry verification failures
impl From<IpldError> for std::io::Error {
    fn from(e: IpldError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    }
}
