//! Strict binary CID validation

use cid::Cid;
use tracing::debug;

use crate::cid_model::{cid_from_digest, cid_from_text, CID_HEADER_LEN, CID_VERSION};
use crate::codec::{Codec, DAG_CBOR_CODEC, RAW_CODEC};
use crate::error::{CidField, IpldError, Result};
use crate::hash::{SHA2_256_CODE, SHA2_256_LEN};

fn header_byte(bytes: &[u8], index: usize, field: CidField, expected: &str) -> Result<u8> {
    bytes
        .get(index)
        .copied()
        .ok_or_else(|| IpldError::invalid_cid(field, expected, "missing"))
}

/// Parse a binary CID, checking version, codec, hash function and digest length in order
///
/// Each rejection names the field along with the expected and actual values.
pub fn parse_cid(bytes: &[u8]) -> Result<Cid> {
    let version = header_byte(bytes, 0, CidField::Version, "0x01")?;
    if version != CID_VERSION {
        debug!("Rejecting CID with version 0x{:02x}", version);
        return Err(IpldError::invalid_cid(
            CidField::Version,
            "0x01",
            format!("0x{:02x}", version),
        ));
    }

    let codec_byte = header_byte(bytes, 1, CidField::Codec, "0x55 or 0x71")?;
    let codec = Codec::from_code(u64::from(codec_byte)).ok_or_else(|| {
        IpldError::invalid_cid(
            CidField::Codec,
            format!("0x{:02x} or 0x{:02x}", RAW_CODEC, DAG_CBOR_CODEC),
            format!("0x{:02x}", codec_byte),
        )
    })?;

    let hash_code = header_byte(bytes, 2, CidField::HashFunction, "0x12")?;
    if u64::from(hash_code) != SHA2_256_CODE {
        return Err(IpldError::invalid_cid(
            CidField::HashFunction,
            "0x12",
            format!("0x{:02x}", hash_code),
        ));
    }

    let digest_len = header_byte(bytes, 3, CidField::DigestLength, "32")?;
    if usize::from(digest_len) != SHA2_256_LEN {
        return Err(IpldError::invalid_cid(
            CidField::DigestLength,
            "32",
            digest_len.to_string(),
        ));
    }

    let digest = &bytes[CID_HEADER_LEN..];
    if digest.len() != SHA2_256_LEN {
        return Err(IpldError::invalid_cid(
            CidField::Digest,
            format!("{} bytes", SHA2_256_LEN),
            format!("{} bytes", digest.len()),
        ));
    }

    cid_from_digest(codec, SHA2_256_CODE, digest)
}

/// Non-throwing check that `text` decodes to a supported CID
pub fn is_cid_string_valid(text: &str) -> bool {
    cid_from_text(text).is_ok()
}
