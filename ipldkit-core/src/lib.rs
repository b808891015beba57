//! ipldkit core
//!
//! Content addressing for binary blocks: CID construction and strict binary
//! validation, whole-buffer and streaming verification, and the conversion
//! between JSON and the IPLD data model.

pub mod block;
pub mod chunker;
pub mod cid_model;
pub mod codec;
pub mod config;
pub mod dag_cbor;
pub mod error;
pub mod hash;
pub mod ipld;
pub mod stream_verify;
pub mod validate;
pub mod verify;

pub use block::{Block, BlockProducer};
pub use chunker::{Chunker, DEFAULT_CHUNK_SIZE};
pub use cid_model::{
    cid_from_digest, cid_from_text, cid_to_text, decode_cid, encode_cid, CID_BINARY_LEN,
};
pub use codec::{BlockCodec, Codec, CodecError, DagCborCodec, RawCodec};
pub use config::{Command, Config, ConfigError};
pub use error::{CidField, IpldError};
pub use hash::{HashFunction, HashRegistry, Sha256, StreamHasher};
pub use ipld::{ipld_to_json, json_to_ipld, Ipld};
pub use stream_verify::{verify_cid_stream, VerificationState, VerifyCidStream};
pub use validate::{is_cid_string_valid, parse_cid};
pub use verify::{verify_cid, CidVerifier};

// Re-export Cid for external use
pub use cid::Cid;
