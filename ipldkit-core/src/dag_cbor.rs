//! DAG-CBOR encoding of IPLD values
//!
//! Deterministic subset of CBOR used for structured blocks:
//! - Links are tag 42 over a byte string of `0x00 || binary CID`
//! - Map keys are strings, sorted by encoded length then bytewise
//! - Integers use the shortest encoding, lengths are definite
//! - Floats are not allowed

use ciborium::value::{Integer, Value};
use serde_json::Number;
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::debug;

use crate::block::Block;
use crate::cid_model::cid_from_digest;
use crate::codec::Codec;
use crate::error::{IpldError, Result};
use crate::hash::HashFunction;
use crate::ipld::Ipld;
use crate::validate::parse_cid;

/// CBOR tag for CIDs
pub const CID_TAG: u64 = 42;

/// Encode a value as DAG-CBOR
pub fn encode(value: &Ipld) -> Result<Vec<u8>> {
    let cbor = to_cbor(value)?;
    let mut out = Vec::new();
    ciborium::into_writer(&cbor, &mut out)
        .map_err(|e| IpldError::BlockCreationFailed(format!("CBOR encoding failed: {}", e)))?;
    Ok(out)
}

/// Decode a single DAG-CBOR value
///
/// Input must be in canonical form: the decoded value is re-encoded and the
/// bytes must match exactly, which rules out indefinite lengths, unsorted or
/// non-minimal encodings, and trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<Ipld> {
    let mut cursor = Cursor::new(bytes);
    let cbor: Value = ciborium::from_reader(&mut cursor)
        .map_err(|e| IpldError::UnsupportedValue(format!("CBOR decoding failed: {}", e)))?;

    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(IpldError::UnsupportedValue(format!(
            "{} trailing bytes after DAG-CBOR value",
            bytes.len() - consumed
        )));
    }

    let value = from_cbor(cbor)?;
    if encode(&value)? != bytes {
        return Err(IpldError::UnsupportedValue(
            "non-canonical DAG-CBOR".to_string(),
        ));
    }
    Ok(value)
}

/// Encode `value` and address it with codec 0x71
pub fn to_block(value: &Ipld, hash: &dyn HashFunction) -> Result<Block> {
    let encoded = encode(value)?;
    let cid = cid_from_digest(Codec::DagCbor, hash.code(), &hash.digest(&encoded))
        .map_err(|e| IpldError::BlockCreationFailed(e.to_string()))?;
    debug!("Encoded DAG-CBOR block {} ({} bytes)", cid, encoded.len());
    Ok(Block {
        data: encoded.clone(),
        encoded,
        cid,
    })
}

fn number_to_cbor(n: &Number) -> Result<Value> {
    if let Some(u) = n.as_u64() {
        Ok(Value::Integer(Integer::from(u)))
    } else if let Some(i) = n.as_i64() {
        Ok(Value::Integer(Integer::from(i)))
    } else {
        Err(IpldError::UnsupportedValue(format!(
            "floating point number {} is not allowed in DAG-CBOR",
            n
        )))
    }
}

/// Length-first key order required for deterministic maps
fn key_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

fn to_cbor(value: &Ipld) -> Result<Value> {
    Ok(match value {
        Ipld::Null => Value::Null,
        Ipld::Bool(b) => Value::Bool(*b),
        Ipld::Number(n) => number_to_cbor(n)?,
        Ipld::String(s) => Value::Text(s.clone()),
        Ipld::Bytes(b) => Value::Bytes(b.clone()),
        Ipld::Link(cid) => {
            let mut bytes = Vec::with_capacity(37);
            bytes.push(0x00);
            bytes.extend_from_slice(&cid.to_bytes());
            Value::Tag(CID_TAG, Box::new(Value::Bytes(bytes)))
        }
        Ipld::Array(items) => Value::Array(items.iter().map(to_cbor).collect::<Result<_>>()?),
        Ipld::Map(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort_by(|a, b| key_order(a, b));
            let mut pairs = Vec::with_capacity(keys.len());
            for key in keys {
                pairs.push((Value::Text(key.clone()), to_cbor(&entries[key])?));
            }
            Value::Map(pairs)
        }
    })
}

fn from_cbor(value: Value) -> Result<Ipld> {
    match value {
        Value::Null => Ok(Ipld::Null),
        Value::Bool(b) => Ok(Ipld::Bool(b)),
        Value::Text(s) => Ok(Ipld::String(s)),
        Value::Bytes(b) => Ok(Ipld::Bytes(b)),
        Value::Integer(i) => {
            let wide = i128::from(i);
            if let Ok(u) = u64::try_from(wide) {
                Ok(Ipld::Number(u.into()))
            } else if let Ok(s) = i64::try_from(wide) {
                Ok(Ipld::Number(s.into()))
            } else {
                Err(IpldError::UnsupportedValue(format!(
                    "integer {} out of range",
                    wide
                )))
            }
        }
        Value::Float(f) => Err(IpldError::UnsupportedValue(format!(
            "floating point number {} is not allowed in DAG-CBOR",
            f
        ))),
        Value::Tag(CID_TAG, inner) => match *inner {
            Value::Bytes(bytes) if bytes.first() == Some(&0x00) => {
                parse_cid(&bytes[1..]).map(Ipld::Link)
            }
            _ => Err(IpldError::UnsupportedValue(
                "tag 42 must wrap a 0x00-prefixed byte string".to_string(),
            )),
        },
        Value::Tag(tag, _) => Err(IpldError::UnsupportedValue(format!(
            "CBOR tag {} is not allowed in DAG-CBOR",
            tag
        ))),
        Value::Array(items) => Ok(Ipld::Array(
            items.into_iter().map(from_cbor).collect::<Result<_>>()?,
        )),
        Value::Map(pairs) => {
            let mut entries = BTreeMap::new();
            for (key, value) in pairs {
                let Value::Text(key) = key else {
                    return Err(IpldError::UnsupportedValue(
                        "map keys must be strings".to_string(),
                    ));
                };
                if entries.insert(key.clone(), from_cbor(value)?).is_some() {
                    return Err(IpldError::UnsupportedValue(format!(
                        "duplicate map key '{}'",
                        key
                    )));
                }
            }
            Ok(Ipld::Map(entries))
        }
        other => Err(IpldError::UnsupportedValue(format!(
            "unsupported CBOR value {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockProducer;
    use crate::hash::Sha256;
    use crate::ipld::json_to_ipld;
    use serde_json::json;

    #[test]
    fn test_map_keys_sorted_length_first() {
        let value = json_to_ipld(&json!({ "bb": 1, "a": 2, "ab": 3 }));
        let encoded = encode(&value).unwrap();
        // map(3), "a", 2, "ab", 3, "bb", 1
        assert_eq!(
            hex::encode(&encoded),
            "a36161026261620362626201"
        );
    }

    #[test]
    fn test_link_uses_tag_42() {
        let cid = BlockProducer::raw().make_block(b"hello").unwrap().cid;
        let encoded = encode(&Ipld::Link(cid)).unwrap();

        // tag(42), bytes(37), 0x00, cid
        assert_eq!(&encoded[..5], &[0xd8, 0x2a, 0x58, 0x25, 0x00]);
        assert_eq!(&encoded[5..], cid.to_bytes().as_slice());
        assert_eq!(decode(&encoded).unwrap(), Ipld::Link(cid));
    }

    #[test]
    fn test_structured_value_roundtrip() {
        let cid = BlockProducer::raw().make_block(b"x").unwrap().cid;
        let value = json_to_ipld(&json!({
            "text": "hi",
            "neg": -5,
            "big": u64::MAX,
            "list": [null, true, { "$link": cid.to_string() }],
            "raw": { "$bytes": "AAEC" }
        }));

        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_floats_rejected() {
        let value = json_to_ipld(&json!({ "ratio": 2.5 }));
        assert!(matches!(encode(&value), Err(IpldError::UnsupportedValue(_))));

        // 0xf9 half-precision 1.0
        assert!(matches!(
            decode(&[0xf9, 0x3c, 0x00]),
            Err(IpldError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn test_decode_rejects_foreign_shapes() {
        // tag 1 (epoch time) around 0
        assert!(decode(&[0xc1, 0x00]).is_err());
        // map with integer key
        assert!(decode(&[0xa1, 0x01, 0x02]).is_err());
        // trailing byte
        assert!(decode(&[0xf6, 0xf6]).is_err());
        // tag 42 over text
        assert!(decode(&[0xd8, 0x2a, 0x61, 0x61]).is_err());
    }

    fn assert_non_canonical(bytes: &[u8]) {
        match decode(bytes) {
            Err(IpldError::UnsupportedValue(msg)) => assert_eq!(msg, "non-canonical DAG-CBOR"),
            other => panic!("{} decoded as {:?}", hex::encode(bytes), other),
        }
    }

    #[test]
    fn test_decode_rejects_indefinite_length() {
        // [_ 1]
        assert_non_canonical(&[0x9f, 0x01, 0xff]);
    }

    #[test]
    fn test_decode_rejects_unsorted_keys() {
        // {"b": 1, "a": 2}
        assert_non_canonical(&[0xa2, 0x61, 0x62, 0x01, 0x61, 0x61, 0x02]);
    }

    #[test]
    fn test_decode_rejects_non_minimal_integer() {
        // 1 in the one-byte argument form
        assert_non_canonical(&[0x18, 0x01]);
        assert_eq!(decode(&[0x01]).unwrap(), Ipld::Number(1.into()));
    }

    #[test]
    fn test_decode_accepts_sorted_keys() {
        let bytes = [0xa2, 0x61, 0x61, 0x02, 0x61, 0x62, 0x01];
        let value = decode(&bytes).unwrap();
        assert_eq!(value, json_to_ipld(&json!({ "a": 2, "b": 1 })));
    }

    #[test]
    fn test_decode_rejects_invalid_link() {
        // tag 42 over 0x00 followed by a version 2 header
        let bytes = [0xd8, 0x2a, 0x45, 0x00, 0x02, 0x55, 0x12, 0x20];
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.cid_field(), Some(crate::error::CidField::Version));
    }

    #[test]
    fn test_to_block() {
        let value = json_to_ipld(&json!({ "hello": "world" }));
        let block = to_block(&value, &Sha256).unwrap();
        assert_eq!(block.cid.codec(), 0x71);
        assert!(crate::verify::verify_cid(&block.cid, &block.encoded).is_ok());
        assert_eq!(decode(&block.encoded).unwrap(), value);
    }
}
