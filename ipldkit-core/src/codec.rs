//! Block codecs
//!
//! A [`BlockCodec`] turns raw input into the bytes that get stored and hashed.
//! The codec's multicodec code becomes the codec field of the block's CID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw binary multicodec
pub const RAW_CODEC: u64 = 0x55;

/// DAG-CBOR multicodec
pub const DAG_CBOR_CODEC: u64 = 0x71;

#[derive(Debug, Error)]
#[error("Codec error: {0}")]
pub struct CodecError(pub String);

/// Content codecs accepted in a CID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    Raw,
    DagCbor,
}

impl Codec {
    pub fn code(self) -> u64 {
        match self {
            Codec::Raw => RAW_CODEC,
            Codec::DagCbor => DAG_CBOR_CODEC,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            RAW_CODEC => Some(Codec::Raw),
            DAG_CBOR_CODEC => Some(Codec::DagCbor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::Raw => "raw",
            Codec::DagCbor => "dag-cbor",
        }
    }

    /// The block codec implementing this content codec
    pub fn block_codec(self) -> Box<dyn BlockCodec> {
        match self {
            Codec::Raw => Box::new(RawCodec),
            Codec::DagCbor => Box::new(DagCborCodec),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Codec::Raw),
            "dag-cbor" => Ok(Codec::DagCbor),
            other => Err(CodecError(format!(
                "unknown codec '{}', expected 'raw' or 'dag-cbor'",
                other
            ))),
        }
    }
}

/// Deterministic binary encoding applied before hashing
pub trait BlockCodec: Send + Sync {
    /// Which content codec this encoder produces
    fn codec(&self) -> Codec;

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Identity encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl BlockCodec for RawCodec {
    fn codec(&self) -> Codec {
        Codec::Raw
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }
}

/// Wraps the input as a single CBOR byte string
#[derive(Debug, Clone, Copy, Default)]
pub struct DagCborCodec;

impl BlockCodec for DagCborCodec {
    fn codec(&self) -> Codec {
        Codec::DagCbor
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(data.len() + 9);
        ciborium::into_writer(&ciborium::value::Value::Bytes(data.to_vec()), &mut out)
            .map_err(|e| CodecError(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_codes() {
        assert_eq!(Codec::Raw.code(), 0x55);
        assert_eq!(Codec::DagCbor.code(), 0x71);
        assert_eq!(Codec::from_code(0x71), Some(Codec::DagCbor));
        assert_eq!(Codec::from_code(0x70), None);
    }

    #[test]
    fn test_codec_from_str() {
        assert_eq!("raw".parse::<Codec>().unwrap(), Codec::Raw);
        assert_eq!("dag-cbor".parse::<Codec>().unwrap(), Codec::DagCbor);
        assert!("dag-pb".parse::<Codec>().is_err());
    }

    #[test]
    fn test_raw_codec_is_identity() {
        assert_eq!(RawCodec.encode(b"hello").unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_dag_cbor_codec_wraps_byte_string() {
        // major type 2 (byte string), length 5
        let encoded = DagCborCodec.encode(b"hello").unwrap();
        assert_eq!(encoded, [&[0x45][..], b"hello"].concat());

        // 24-byte payload needs a one-byte length argument
        let encoded = DagCborCodec.encode(&[0u8; 24]).unwrap();
        assert_eq!(&encoded[..2], &[0x58, 24]);
        assert_eq!(encoded.len(), 26);
    }
}
