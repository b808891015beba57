//! CID model: construction and canonical binary/text encodings
//!
//! Only CIDv1 with a raw or dag-cbor codec and a sha2-256 multihash is
//! supported. With those single-byte varints the binary form is exactly
//! `[version, codec, hash code, digest length, digest...]`.

use cid::Cid;
use multihash::Multihash;
use std::str::FromStr;

use crate::codec::Codec;
use crate::error::{IpldError, Result};
use crate::validate::parse_cid;

/// The only supported CID version
pub const CID_VERSION: u8 = 0x01;

/// Length of the fixed `[version, codec, hash code, digest length]` header
pub const CID_HEADER_LEN: usize = 4;

/// Binary length of a supported CID
pub const CID_BINARY_LEN: usize = CID_HEADER_LEN + crate::hash::SHA2_256_LEN;

/// Build a CIDv1 from a digest produced by the hash function `hash_code`
pub fn cid_from_digest(codec: Codec, hash_code: u64, digest: &[u8]) -> Result<Cid> {
    let mh = Multihash::<64>::wrap(hash_code, digest).map_err(|e| {
        IpldError::invalid_cid(
            crate::error::CidField::Digest,
            "at most 64 bytes",
            format!("{} bytes ({})", digest.len(), e),
        )
    })?;
    Ok(Cid::new_v1(codec.code(), mh))
}

/// Canonical binary form
pub fn encode_cid(cid: &Cid) -> Vec<u8> {
    cid.to_bytes()
}

/// Strictly decode the canonical binary form
pub fn decode_cid(bytes: &[u8]) -> Result<Cid> {
    parse_cid(bytes)
}

/// Multibase text form (base32 lower, `b` prefix)
pub fn cid_to_text(cid: &Cid) -> String {
    cid.to_string()
}

/// Decode multibase text, then apply the binary validation rules
pub fn cid_from_text(text: &str) -> Result<Cid> {
    if text.is_empty() {
        return Err(IpldError::InvalidCidText("empty string".to_string()));
    }

    let cid = Cid::from_str(text)
        .map_err(|e| IpldError::InvalidCidText(format!("'{}': {}", text, e)))?;

    parse_cid(&cid.to_bytes())
}

/// True when two CIDs have byte-identical canonical encodings
pub fn cids_equal(a: &Cid, b: &Cid) -> bool {
    a.to_bytes() == b.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{HashFunction, Sha256, SHA2_256_CODE};

    fn hello_cid() -> Cid {
        cid_from_digest(Codec::Raw, SHA2_256_CODE, &Sha256.digest(b"hello")).unwrap()
    }

    #[test]
    fn test_binary_layout() {
        let bytes = encode_cid(&hello_cid());
        assert_eq!(bytes.len(), CID_BINARY_LEN);
        assert_eq!(&bytes[..4], &[0x01, 0x55, 0x12, 0x20]);
        assert_eq!(&bytes[4..], Sha256.digest(b"hello").as_slice());
    }

    #[test]
    fn test_binary_roundtrip() {
        let cid = hello_cid();
        assert_eq!(decode_cid(&encode_cid(&cid)).unwrap(), cid);
    }

    #[test]
    fn test_text_roundtrip() {
        let cid = hello_cid();
        let text = cid_to_text(&cid);
        assert!(text.starts_with('b'), "expected base32 multibase prefix: {}", text);
        assert_eq!(cid_from_text(&text).unwrap(), cid);
    }

    #[test]
    fn test_text_rejects_garbage() {
        assert!(matches!(
            cid_from_text("not-a-cid"),
            Err(IpldError::InvalidCidText(_))
        ));
        assert!(matches!(cid_from_text(""), Err(IpldError::InvalidCidText(_))));
    }

    #[test]
    fn test_text_rejects_cidv0() {
        // Valid CIDv0 (base58 sha2-256 multihash) is outside the supported set
        let err = cid_from_text("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap_err();
        assert_eq!(err.cid_field(), Some(crate::error::CidField::Version));
    }

    #[test]
    fn test_codec_participates_in_equality() {
        let digest = Sha256.digest(b"hello");
        let raw = cid_from_digest(Codec::Raw, SHA2_256_CODE, &digest).unwrap();
        let cbor = cid_from_digest(Codec::DagCbor, SHA2_256_CODE, &digest).unwrap();
        assert!(!cids_equal(&raw, &cbor));
        assert!(cids_equal(&raw, &hello_cid()));
    }
}
