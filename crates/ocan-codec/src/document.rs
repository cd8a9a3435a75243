// SPDX-License-Identifier: MIT OR Apache-2.0
//! The wire shape: a `root` slot plus a positional `index` table (spec.md
//! §3 "Encoded document").
//!
//! A value position (a [`WireNode`]) is one of three shapes:
//! - an inline JSON literal (`null`, a bool, a string, or an ordinary
//!   finite, non-negative-zero number) — for primitives JSON can carry
//!   directly;
//! - `["$ref", id]` — a pointer into [`EncodedDocument::index`], for every
//!   reference type (identity-bearing, possibly cyclic or aliased);
//! - `["$t", tag]` or `["$t", tag, payload]` — an inline *scalar* tag for
//!   the handful of primitives JSON cannot carry directly (`bigint`,
//!   `undef`, `nan`, `pinf`, `ninf`, `nzero`). These never enter `index`:
//!   they have no identity to preserve (primitive duplicates are never
//!   coalesced), so there is nothing for a `$ref` to point back at.
//!
//! Every reference type is assigned a position in `index` the first time
//! the encoder visits it; each entry is itself a tagged pair `[tag,
//! payload]`, drawn from the closed set `obj, arr, map, set, date, regex,
//! err, url, hdrs, ab, ta, dv, chain`.

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as Json};

/// A JSON document produced by [`crate::stringify`] and consumed by
/// [`crate::parse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedDocument {
    /// The top-level value.
    pub root: WireNode,
    /// Every reference-typed value reachable from `root`, indexed by the id
    /// its first occurrence was assigned.
    pub index: Vec<IndexEntry>,
}

/// An inline JSON-representable primitive: the shape a [`WireNode`] takes
/// when it needs no `$ref`/`$t` wrapper at all.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveWire {
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// An ordinary finite number, never `-0`.
    Number(f64),
    /// A string.
    String(String),
}

/// The closed set of tags a [`WireNode::Scalar`] can carry — the inline,
/// never-indexed primitives JSON cannot represent directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarTag {
    /// `undefined`.
    Undef,
    /// `NaN`.
    Nan,
    /// `+Infinity`.
    Pinf,
    /// `-Infinity`.
    Ninf,
    /// `-0`.
    Nzero,
    /// A `BigInt`, carried as decimal text in the tag's payload.
    BigInt,
}

impl ScalarTag {
    /// The wire tag text, drawn from spec.md §3's closed set.
    pub fn wire_tag(self) -> &'static str {
        match self {
            ScalarTag::Undef => "undef",
            ScalarTag::Nan => "nan",
            ScalarTag::Pinf => "pinf",
            ScalarTag::Ninf => "ninf",
            ScalarTag::Nzero => "nzero",
            ScalarTag::BigInt => "bigint",
        }
    }

    /// Parse a wire tag back into a [`ScalarTag`].
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "undef" => ScalarTag::Undef,
            "nan" => ScalarTag::Nan,
            "pinf" => ScalarTag::Pinf,
            "ninf" => ScalarTag::Ninf,
            "nzero" => ScalarTag::Nzero,
            "bigint" => ScalarTag::BigInt,
            _ => return None,
        })
    }
}

/// A slot that holds an inline primitive, a `$ref` into
/// [`EncodedDocument::index`], or an inline `$t`-tagged scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Json", into = "Json")]
pub enum WireNode {
    /// A bare JSON literal.
    Literal(PrimitiveWire),
    /// `["$ref", id]`.
    Ref(usize),
    /// `["$t", tag]` (no payload) or `["$t", tag, payload]`.
    Scalar {
        /// Which of the six inline scalar tags this is.
        tag: ScalarTag,
        /// The tag's payload, if it carries one (only `bigint` does).
        payload: Option<String>,
    },
}

impl WireNode {
    /// Encode an `f64`, special-casing the values JSON numbers can't carry
    /// directly (§4.A "Numeric semantics").
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            WireNode::Scalar { tag: ScalarTag::Nan, payload: None }
        } else if value.is_infinite() {
            let tag = if value.is_sign_positive() { ScalarTag::Pinf } else { ScalarTag::Ninf };
            WireNode::Scalar { tag, payload: None }
        } else if value == 0.0 && value.is_sign_negative() {
            WireNode::Scalar { tag: ScalarTag::Nzero, payload: None }
        } else {
            WireNode::Literal(PrimitiveWire::Number(value))
        }
    }

    /// Decode back to an `f64`, if this node is numeric-shaped.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireNode::Literal(PrimitiveWire::Number(n)) => Some(*n),
            WireNode::Scalar { tag: ScalarTag::Nan, .. } => Some(f64::NAN),
            WireNode::Scalar { tag: ScalarTag::Pinf, .. } => Some(f64::INFINITY),
            WireNode::Scalar { tag: ScalarTag::Ninf, .. } => Some(f64::NEG_INFINITY),
            WireNode::Scalar { tag: ScalarTag::Nzero, .. } => Some(-0.0),
            _ => None,
        }
    }
}

impl TryFrom<Json> for WireNode {
    type Error = String;

    fn try_from(value: Json) -> Result<Self, String> {
        match value {
            Json::Null => Ok(WireNode::Literal(PrimitiveWire::Null)),
            Json::Bool(b) => Ok(WireNode::Literal(PrimitiveWire::Bool(b))),
            Json::String(s) => Ok(WireNode::Literal(PrimitiveWire::String(s))),
            Json::Number(n) => {
                let f = n.as_f64().ok_or("number out of f64 range")?;
                Ok(WireNode::Literal(PrimitiveWire::Number(f)))
            }
            Json::Array(items) => {
                let marker = items.first().and_then(Json::as_str);
                match marker {
                    Some("$ref") => {
                        let id = items
                            .get(1)
                            .and_then(Json::as_u64)
                            .ok_or("malformed [\"$ref\", id]: missing or non-numeric id")?;
                        Ok(WireNode::Ref(id as usize))
                    }
                    Some("$t") => {
                        let tag_str = items
                            .get(1)
                            .and_then(Json::as_str)
                            .ok_or("malformed [\"$t\", ...]: missing tag")?;
                        let tag = ScalarTag::from_wire_tag(tag_str)
                            .ok_or_else(|| format!("unknown scalar tag {tag_str:?}"))?;
                        let payload = match items.get(2) {
                            None | Some(Json::Null) => None,
                            Some(Json::String(s)) => Some(s.clone()),
                            Some(_) => return Err("malformed $t payload: expected a string".into()),
                        };
                        Ok(WireNode::Scalar { tag, payload })
                    }
                    _ => Err("array value position must be [\"$ref\", id] or [\"$t\", tag, ...]".into()),
                }
            }
            Json::Object(_) => Err("a value position may not be a bare JSON object".into()),
        }
    }
}

impl From<WireNode> for Json {
    fn from(node: WireNode) -> Json {
        match node {
            WireNode::Literal(PrimitiveWire::Null) => Json::Null,
            WireNode::Literal(PrimitiveWire::Bool(b)) => Json::Bool(b),
            WireNode::Literal(PrimitiveWire::String(s)) => Json::String(s),
            WireNode::Literal(PrimitiveWire::Number(n)) => serde_json::Number::from_f64(n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            WireNode::Ref(id) => Json::Array(vec![Json::String("$ref".into()), Json::from(id)]),
            WireNode::Scalar { tag, payload: None } => {
                Json::Array(vec![Json::String("$t".into()), Json::String(tag.wire_tag().into())])
            }
            WireNode::Scalar { tag, payload: Some(p) } => Json::Array(vec![
                Json::String("$t".into()),
                Json::String(tag.wire_tag().into()),
                Json::String(p),
            ]),
        }
    }
}

fn node_pairs(payload: &Json, context: &str) -> Result<Vec<(WireNode, WireNode)>, String> {
    let items = payload
        .as_array()
        .ok_or_else(|| format!("{context}: expected an array of pairs"))?;
    items
        .iter()
        .map(|pair| {
            let pair = pair
                .as_array()
                .ok_or_else(|| format!("{context}: expected a [key, value] pair"))?;
            if pair.len() != 2 {
                return Err(format!("{context}: pair must have exactly 2 elements"));
            }
            let key = WireNode::try_from(pair[0].clone())?;
            let value = WireNode::try_from(pair[1].clone())?;
            Ok((key, value))
        })
        .collect()
}

fn string_node_pairs(payload: &Json, context: &str) -> Result<Vec<(String, WireNode)>, String> {
    node_pairs(payload, context)?
        .into_iter()
        .map(|(k, v)| match k {
            WireNode::Literal(PrimitiveWire::String(s)) => Ok((s, v)),
            _ => Err(format!("{context}: key must be a string")),
        })
        .collect()
}

fn node_array(payload: &Json, context: &str) -> Result<Vec<WireNode>, String> {
    payload
        .as_array()
        .ok_or_else(|| format!("{context}: expected an array"))?
        .iter()
        .cloned()
        .map(WireNode::try_from)
        .collect()
}

fn string_pairs(payload: &Json, context: &str) -> Result<Vec<(String, String)>, String> {
    payload
        .as_array()
        .ok_or_else(|| format!("{context}: expected an array of pairs"))?
        .iter()
        .map(|pair| {
            let pair = pair
                .as_array()
                .ok_or_else(|| format!("{context}: expected a [name, value] pair"))?;
            if pair.len() != 2 {
                return Err(format!("{context}: pair must have exactly 2 elements"));
            }
            let name = pair[0].as_str().ok_or_else(|| format!("{context}: name must be a string"))?;
            let value = pair[1].as_str().ok_or_else(|| format!("{context}: value must be a string"))?;
            Ok((name.to_string(), value.to_string()))
        })
        .collect()
}

/// One entry in [`EncodedDocument::index`]: the tagged wire form of a
/// single reference-typed [`ocan_core::HeapValue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Json", into = "Json")]
pub enum IndexEntry {
    /// A plain object, as ordered key/value pairs. Tag `obj`.
    Object {
        /// Entries, in original insertion order.
        entries: Vec<(String, WireNode)>,
    },
    /// An array. Tag `arr`.
    Array {
        /// Elements, in order.
        items: Vec<WireNode>,
    },
    /// A `Map`. Tag `map`.
    Map {
        /// Entries, in insertion order.
        entries: Vec<(WireNode, WireNode)>,
    },
    /// A `Set`. Tag `set`.
    Set {
        /// Elements, in insertion order.
        items: Vec<WireNode>,
    },
    /// A `Date`. Tag `date`.
    Date {
        /// Milliseconds since the Unix epoch, carried as a [`WireNode`] so
        /// an invalid date (`NaN` milliseconds) survives the round trip the
        /// same way any other non-finite number would.
        epoch_ms: WireNode,
    },
    /// A regular expression literal. Tag `regex`.
    Regex {
        /// Pattern body.
        source: String,
        /// Flag letters, in source order.
        flags: String,
    },
    /// An `Error` (or subclass). Tag `err`.
    Error {
        /// Constructor name.
        name: String,
        /// Message text.
        message: String,
        /// Captured stack trace, if any.
        stack: Option<String>,
        /// Chained cause, if any.
        cause: Option<Box<WireNode>>,
        /// Any other own-enumerable properties.
        props: Vec<(String, WireNode)>,
    },
    /// A raw byte buffer, base64-encoded. Tag `ab`.
    ArrayBuffer {
        /// Standard (non-URL-safe) base64 payload.
        bytes_base64: String,
        /// The buffer's byte length, carried alongside the base64 payload
        /// per spec.md §3 so a decoder can validate it without decoding.
        length: usize,
    },
    /// A typed-array view over an [`IndexEntry::ArrayBuffer`]. Tag `ta`.
    TypedArray {
        /// Element kind, per [`ocan_core::TypedArrayKind::wire_tag`].
        kind: String,
        /// Reference to the backing buffer.
        buffer: WireNode,
        /// Offset into the buffer, in bytes.
        byte_offset: usize,
        /// Number of elements in the view.
        length: usize,
    },
    /// A `DataView` over an [`IndexEntry::ArrayBuffer`]. Tag `dv`.
    DataView {
        /// Reference to the backing buffer.
        buffer: WireNode,
        /// Offset into the buffer, in bytes.
        byte_offset: usize,
        /// Length of the view, in bytes.
        byte_length: usize,
    },
    /// A `URL`, as its normalized string form. Tag `url`.
    Url {
        /// The URL text.
        value: String,
    },
    /// A `Headers` map. Tag `hdrs`.
    Headers {
        /// Entries, in insertion order; keys may repeat.
        entries: Vec<(String, String)>,
    },
    /// A recorded, not-yet-replayed operation chain. Tag `chain`.
    Chain {
        /// The chain's steps, in replay order.
        ops: Vec<OpWire>,
    },
}

impl TryFrom<Json> for IndexEntry {
    type Error = String;

    fn try_from(value: Json) -> Result<Self, String> {
        let items = value
            .as_array()
            .ok_or("index entry must be a [tag, payload] array")?;
        if items.len() != 2 {
            return Err(format!(
                "index entry must have exactly 2 elements, got {}",
                items.len()
            ));
        }
        let tag = items[0].as_str().ok_or("index entry tag must be a string")?;
        let payload = &items[1];

        Ok(match tag {
            "obj" => IndexEntry::Object {
                entries: string_node_pairs(payload, "obj")?,
            },
            "arr" => IndexEntry::Array {
                items: node_array(payload, "arr")?,
            },
            "map" => IndexEntry::Map {
                entries: node_pairs(payload, "map")?,
            },
            "set" => IndexEntry::Set {
                items: node_array(payload, "set")?,
            },
            "date" => IndexEntry::Date {
                epoch_ms: WireNode::try_from(payload.clone())?,
            },
            "regex" => {
                let source = payload
                    .get("source")
                    .and_then(Json::as_str)
                    .ok_or("regex: missing \"source\"")?
                    .to_string();
                let flags = payload
                    .get("flags")
                    .and_then(Json::as_str)
                    .ok_or("regex: missing \"flags\"")?
                    .to_string();
                IndexEntry::Regex { source, flags }
            }
            "err" => {
                let name = payload.get("name").and_then(Json::as_str).ok_or("err: missing \"name\"")?.to_string();
                let message = payload
                    .get("message")
                    .and_then(Json::as_str)
                    .ok_or("err: missing \"message\"")?
                    .to_string();
                let stack = payload.get("stack").and_then(Json::as_str).map(str::to_string);
                let cause = match payload.get("cause") {
                    Some(c) => Some(Box::new(WireNode::try_from(c.clone())?)),
                    None => None,
                };
                let props = match payload.get("props") {
                    Some(p) => string_node_pairs(p, "err.props")?,
                    None => Vec::new(),
                };
                IndexEntry::Error { name, message, stack, cause, props }
            }
            "ab" => {
                let bytes_base64 = payload
                    .get("bytes")
                    .and_then(Json::as_str)
                    .ok_or("ab: missing \"bytes\"")?
                    .to_string();
                let length = payload
                    .get("length")
                    .and_then(Json::as_u64)
                    .ok_or("ab: missing \"length\"")? as usize;
                IndexEntry::ArrayBuffer { bytes_base64, length }
            }
            "ta" => {
                let kind = payload.get("kind").and_then(Json::as_str).ok_or("ta: missing \"kind\"")?.to_string();
                let buffer = WireNode::try_from(
                    payload.get("buffer").cloned().ok_or("ta: missing \"buffer\"")?,
                )?;
                let byte_offset = payload
                    .get("byte_offset")
                    .and_then(Json::as_u64)
                    .ok_or("ta: missing \"byte_offset\"")? as usize;
                let length = payload
                    .get("length")
                    .and_then(Json::as_u64)
                    .ok_or("ta: missing \"length\"")? as usize;
                IndexEntry::TypedArray { kind, buffer, byte_offset, length }
            }
            "dv" => {
                let buffer = WireNode::try_from(
                    payload.get("buffer").cloned().ok_or("dv: missing \"buffer\"")?,
                )?;
                let byte_offset = payload
                    .get("byte_offset")
                    .and_then(Json::as_u64)
                    .ok_or("dv: missing \"byte_offset\"")? as usize;
                let byte_length = payload
                    .get("byte_length")
                    .and_then(Json::as_u64)
                    .ok_or("dv: missing \"byte_length\"")? as usize;
                IndexEntry::DataView { buffer, byte_offset, byte_length }
            }
            "url" => {
                let value = payload.as_str().ok_or("url: payload must be a string")?.to_string();
                IndexEntry::Url { value }
            }
            "hdrs" => IndexEntry::Headers {
                entries: string_pairs(payload, "hdrs")?,
            },
            "chain" => {
                let ops: Vec<OpWire> =
                    serde_json::from_value(payload.clone()).map_err(|e| e.to_string())?;
                IndexEntry::Chain { ops }
            }
            other => return Err(format!("unknown tag {other:?}")),
        })
    }
}

impl From<IndexEntry> for Json {
    fn from(entry: IndexEntry) -> Json {
        let (tag, payload) = match entry {
            IndexEntry::Object { entries } => (
                "obj",
                Json::Array(
                    entries
                        .into_iter()
                        .map(|(k, v)| Json::Array(vec![Json::String(k), Json::from(v)]))
                        .collect(),
                ),
            ),
            IndexEntry::Array { items } => (
                "arr",
                Json::Array(items.into_iter().map(Json::from).collect()),
            ),
            IndexEntry::Map { entries } => (
                "map",
                Json::Array(
                    entries
                        .into_iter()
                        .map(|(k, v)| Json::Array(vec![Json::from(k), Json::from(v)]))
                        .collect(),
                ),
            ),
            IndexEntry::Set { items } => (
                "set",
                Json::Array(items.into_iter().map(Json::from).collect()),
            ),
            IndexEntry::Date { epoch_ms } => ("date", Json::from(epoch_ms)),
            IndexEntry::Regex { source, flags } => {
                let mut obj = JsonMap::new();
                obj.insert("source".into(), Json::String(source));
                obj.insert("flags".into(), Json::String(flags));
                ("regex", Json::Object(obj))
            }
            IndexEntry::Error { name, message, stack, cause, props } => {
                let mut obj = JsonMap::new();
                obj.insert("name".into(), Json::String(name));
                obj.insert("message".into(), Json::String(message));
                if let Some(stack) = stack {
                    obj.insert("stack".into(), Json::String(stack));
                }
                if let Some(cause) = cause {
                    obj.insert("cause".into(), Json::from(*cause));
                }
                if !props.is_empty() {
                    obj.insert(
                        "props".into(),
                        Json::Array(
                            props
                                .into_iter()
                                .map(|(k, v)| Json::Array(vec![Json::String(k), Json::from(v)]))
                                .collect(),
                        ),
                    );
                }
                ("err", Json::Object(obj))
            }
            IndexEntry::ArrayBuffer { bytes_base64, length } => {
                let mut obj = JsonMap::new();
                obj.insert("bytes".into(), Json::String(bytes_base64));
                obj.insert("length".into(), Json::from(length));
                ("ab", Json::Object(obj))
            }
            IndexEntry::TypedArray { kind, buffer, byte_offset, length } => {
                let mut obj = JsonMap::new();
                obj.insert("kind".into(), Json::String(kind));
                obj.insert("buffer".into(), Json::from(buffer));
                obj.insert("byte_offset".into(), Json::from(byte_offset));
                obj.insert("length".into(), Json::from(length));
                ("ta", Json::Object(obj))
            }
            IndexEntry::DataView { buffer, byte_offset, byte_length } => {
                let mut obj = JsonMap::new();
                obj.insert("buffer".into(), Json::from(buffer));
                obj.insert("byte_offset".into(), Json::from(byte_offset));
                obj.insert("byte_length".into(), Json::from(byte_length));
                ("dv", Json::Object(obj))
            }
            IndexEntry::Url { value } => ("url", Json::String(value)),
            IndexEntry::Headers { entries } => (
                "hdrs",
                Json::Array(
                    entries
                        .into_iter()
                        .map(|(k, v)| Json::Array(vec![Json::String(k), Json::String(v)]))
                        .collect(),
                ),
            ),
            IndexEntry::Chain { ops } => (
                "chain",
                serde_json::to_value(ops).expect("OpWire serializes infallibly"),
            ),
        };
        Json::Array(vec![Json::String(tag.to_string()), payload])
    }
}

/// The wire form of an [`ocan_core::Operation`]: `{"kind": "get", "key":
/// ...}` or `{"kind": "apply", "args": [...]}`, matching spec.md §3's
/// "each operation is itself an obj with kind and its specific fields."
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpWire {
    /// [`ocan_core::Operation::Get`].
    Get {
        /// Property name.
        key: String,
    },
    /// [`ocan_core::Operation::Apply`].
    Apply {
        /// Arguments, in call order.
        args: Vec<ArgWire>,
    },
}

/// The wire form of an [`ocan_core::ChainArg`]. An ordinary value is the
/// bare [`WireNode`] itself; a nested handle is the
/// [`ocan_core::NestedOperationMarker`] record verbatim — `{"kind":
/// "nested", "chain": [...]}` — per spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Json", into = "Json")]
pub enum ArgWire {
    /// [`ocan_core::ChainArg::Value`].
    Value(WireNode),
    /// [`ocan_core::ChainArg::Nested`].
    Nested {
        /// The nested handle's own chain.
        ops: Vec<OpWire>,
    },
}

impl TryFrom<Json> for ArgWire {
    type Error = String;

    fn try_from(value: Json) -> Result<Self, String> {
        if let Some(obj) = value.as_object() {
            if obj.get("kind").and_then(Json::as_str) == Some("nested") {
                let chain = obj.get("chain").ok_or("nested arg missing \"chain\"")?;
                let ops: Vec<OpWire> =
                    serde_json::from_value(chain.clone()).map_err(|e| e.to_string())?;
                return Ok(ArgWire::Nested { ops });
            }
        }
        Ok(ArgWire::Value(WireNode::try_from(value)?))
    }
}

impl From<ArgWire> for Json {
    fn from(arg: ArgWire) -> Json {
        match arg {
            ArgWire::Value(node) => Json::from(node),
            ArgWire::Nested { ops } => {
                let mut obj = JsonMap::new();
                obj.insert("kind".into(), Json::String("nested".into()));
                obj.insert(
                    "chain".into(),
                    serde_json::to_value(ops).expect("OpWire serializes infallibly"),
                );
                Json::Object(obj)
            }
        }
    }
}
