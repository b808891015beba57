//! IPLD data model and its JSON representation
//!
//! Links and byte strings have no native JSON form. They are written as
//! single-key maps: `{"$link": "<cid text>"}` and `{"$bytes": "<base64>"}`.
//! Going from JSON to IPLD, a map is read as a link or bytes only when it has
//! exactly that one key and a value that decodes; anything else stays a map.
//!
//! `$link` and `$bytes` are therefore reserved keys. A JSON document that
//! contains a single-key `$link` map whose string happens to be a valid CID
//! will always be read as a link.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::cid_model::{cid_from_text, cid_to_text};

/// Reserved key for link leaves
pub const LINK_KEY: &str = "$link";

/// Reserved key for byte leaves
pub const BYTES_KEY: &str = "$bytes";

/// A value in the IPLD data model
#[derive(Debug, Clone, PartialEq)]
pub enum Ipld {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Link(Cid),
    Bytes(Vec<u8>),
    Array(Vec<Ipld>),
    Map(BTreeMap<String, Ipld>),
}

impl Ipld {
    /// True for the JSON scalar variants
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Ipld::Null | Ipld::Bool(_) | Ipld::Number(_) | Ipld::String(_)
        )
    }

    pub fn as_link(&self) -> Option<&Cid> {
        match self {
            Ipld::Link(cid) => Some(cid),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Ipld::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Every link reachable from this value, depth first
    pub fn links(&self) -> Vec<Cid> {
        let mut out = Vec::new();
        self.collect_links(&mut out);
        out
    }

    fn collect_links(&self, out: &mut Vec<Cid>) {
        match self {
            Ipld::Link(cid) => out.push(*cid),
            Ipld::Array(items) => items.iter().for_each(|i| i.collect_links(out)),
            Ipld::Map(entries) => entries.values().for_each(|v| v.collect_links(out)),
            _ => {}
        }
    }
}

/// Classify a JSON map as a tagged leaf, if it has the exact tag shape
fn tagged_leaf(map: &Map<String, Value>) -> Option<Ipld> {
    if map.len() != 1 {
        return None;
    }

    if let Some(Value::String(text)) = map.get(LINK_KEY) {
        return cid_from_text(text).ok().map(Ipld::Link);
    }

    if let Some(Value::String(encoded)) = map.get(BYTES_KEY) {
        return BASE64.decode(encoded).ok().map(Ipld::Bytes);
    }

    None
}

/// Convert JSON to IPLD, reading tagged maps as links and bytes
pub fn json_to_ipld(value: &Value) -> Ipld {
    match value {
        Value::Null => Ipld::Null,
        Value::Bool(b) => Ipld::Bool(*b),
        Value::Number(n) => Ipld::Number(n.clone()),
        Value::String(s) => Ipld::String(s.clone()),
        Value::Array(items) => Ipld::Array(items.iter().map(json_to_ipld).collect()),
        Value::Object(map) => tagged_leaf(map).unwrap_or_else(|| {
            Ipld::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), json_to_ipld(v)))
                    .collect(),
            )
        }),
    }
}

/// Convert IPLD to JSON, writing links and bytes in their tagged form
pub fn ipld_to_json(value: &Ipld) -> Value {
    match value {
        Ipld::Null => Value::Null,
        Ipld::Bool(b) => Value::Bool(*b),
        Ipld::Number(n) => Value::Number(n.clone()),
        Ipld::String(s) => Value::String(s.clone()),
        Ipld::Link(cid) => tag(LINK_KEY, cid_to_text(cid)),
        Ipld::Bytes(bytes) => tag(BYTES_KEY, BASE64.encode(bytes)),
        Ipld::Array(items) => Value::Array(items.iter().map(ipld_to_json).collect()),
        Ipld::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), ipld_to_json(v)))
                .collect(),
        ),
    }
}

fn tag(key: &str, text: String) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), Value::String(text));
    Value::Object(map)
}

impl From<&Value> for Ipld {
    fn from(value: &Value) -> Self {
        json_to_ipld(value)
    }
}

impl From<&Ipld> for Value {
    fn from(value: &Ipld) -> Self {
        ipld_to_json(value)
    }
}

impl Serialize for Ipld {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ipld_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ipld {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| json_to_ipld(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockProducer;
    use serde_json::json;

    fn sample_cid() -> Cid {
        BlockProducer::raw().make_block(b"hello").unwrap().cid
    }

    #[test]
    fn test_scalars_map_one_to_one() {
        assert_eq!(json_to_ipld(&json!(null)), Ipld::Null);
        assert_eq!(json_to_ipld(&json!(true)), Ipld::Bool(true));
        assert_eq!(json_to_ipld(&json!(42)), Ipld::Number(42.into()));
        assert_eq!(json_to_ipld(&json!("42")), Ipld::String("42".into()));
    }

    #[test]
    fn test_link_tag() {
        let cid = sample_cid();
        let value = json!({ "$link": cid.to_string() });
        assert_eq!(json_to_ipld(&value), Ipld::Link(cid));
        assert_eq!(ipld_to_json(&Ipld::Link(cid)), value);
    }

    #[test]
    fn test_link_tag_requires_valid_cid() {
        let value = json!({ "$link": "not-a-cid" });
        let expected: BTreeMap<_, _> =
            [("$link".to_string(), Ipld::String("not-a-cid".into()))].into();
        assert_eq!(json_to_ipld(&value), Ipld::Map(expected));
    }

    #[test]
    fn test_bytes_tag() {
        let value = json!({ "$bytes": "aGVsbG8=" });
        assert_eq!(json_to_ipld(&value), Ipld::Bytes(b"hello".to_vec()));
        assert_eq!(ipld_to_json(&Ipld::Bytes(b"hello".to_vec())), value);
    }

    #[test]
    fn test_malformed_tags_fall_through_to_map() {
        for value in [
            json!({ "$bytes": "%%% not base64" }),
            json!({ "$bytes": 12 }),
            json!({ "$link": { "nested": true } }),
            json!({ "$link": sample_cid().to_string(), "extra": 1 }),
        ] {
            assert!(
                matches!(json_to_ipld(&value), Ipld::Map(_)),
                "{} should stay a map",
                value
            );
        }
    }

    #[test]
    fn test_nested_tags_resolved_at_every_depth() {
        let cid = sample_cid();
        let value = json!({
            "record": {
                "refs": [{ "$link": cid.to_string() }, { "$link": cid.to_string() }],
                "blob": { "$bytes": "AAEC" }
            },
            "count": 3
        });

        let ipld = json_to_ipld(&value);
        assert_eq!(ipld.links(), vec![cid, cid]);

        let Ipld::Map(top) = &ipld else {
            panic!("expected map");
        };
        let Some(Ipld::Map(record)) = top.get("record") else {
            panic!("expected record map");
        };
        assert_eq!(record["blob"], Ipld::Bytes(vec![0, 1, 2]));

        assert_eq!(ipld_to_json(&ipld), value);
    }

    #[test]
    fn test_serde_routes_through_json_form() {
        let cid = sample_cid();
        let ipld = Ipld::Array(vec![Ipld::Link(cid), Ipld::Bytes(vec![0xff])]);

        let text = serde_json::to_string(&ipld).unwrap();
        assert_eq!(
            text,
            format!(r#"[{{"$link":"{}"}},{{"$bytes":"/w=="}}]"#, cid)
        );

        let back: Ipld = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ipld);
    }

    #[test]
    fn test_numeric_string_stays_string() {
        let ipld: Ipld = serde_json::from_str(r#"{"n": "123", "m": 123}"#).unwrap();
        let Ipld::Map(map) = ipld else {
            panic!("expected map");
        };
        assert_eq!(map["n"], Ipld::String("123".into()));
        assert_eq!(map["m"], Ipld::Number(123.into()));
    }
}
