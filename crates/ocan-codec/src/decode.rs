// SPDX-License-Identifier: MIT OR Apache-2.0
use std::rc::Rc;
use std::cell::RefCell;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ocan_core::{
    ChainArg, DataViewPayload, ErrorPayload, Heap, HeapValue, Operation, OperationChain,
    OrderedMap, TypedArrayKind, TypedArrayPayload, Value,
};

use crate::document::{ArgWire, EncodedDocument, IndexEntry, OpWire, PrimitiveWire, ScalarTag, WireNode};
use crate::error::CodecError;

/// The closed set of `index`-entry tags (spec.md §3), used to produce a
/// precise [`CodecError::UnknownTag`] instead of a generic parse failure
/// when the input names a tag this decoder has never heard of. The inline
/// scalar tags (`bigint`, `undef`, `nan`, `pinf`, `ninf`, `nzero`) never
/// appear here — they live only in value positions, never in `index`.
const KNOWN_TAGS: &[&str] = &[
    "obj", "arr", "map", "set", "date", "regex", "err", "ab", "ta", "dv", "url", "hdrs", "chain",
];

/// Parse a JSON string produced by [`crate::stringify`] back into a [`Value`].
///
/// # Examples
///
/// ```
/// use ocan_codec::{parse, stringify};
/// use ocan_core::Value;
///
/// let text = stringify(&Value::String("hi".into())).unwrap();
/// let back = parse(&text).unwrap();
/// assert!(back.deep_eq(&Value::String("hi".into())));
/// ```
pub fn parse(text: &str) -> Result<Value, CodecError> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    let doc = validate_and_decode_document(raw)?;
    decode_document(&doc)
}

/// Check every `index` entry's leading tag element against the known set
/// before attempting a typed decode, so that an unrecognized tag produces
/// [`CodecError::UnknownTag`] rather than an opaque serde error.
fn validate_and_decode_document(raw: serde_json::Value) -> Result<EncodedDocument, CodecError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| CodecError::MalformedDocument("top-level value must be a JSON object".into()))?;

    if !obj.contains_key("root") {
        return Err(CodecError::MalformedDocument("missing \"root\" field".into()));
    }
    let index = obj
        .get("index")
        .and_then(|v| v.as_array())
        .ok_or_else(|| CodecError::MalformedDocument("missing or non-array \"index\" field".into()))?;

    for (id, entry) in index.iter().enumerate() {
        let tag = entry
            .as_array()
            .and_then(|pair| pair.first())
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                CodecError::MalformedDocument(format!("index entry {id} is not a [tag, payload] array"))
            })?;
        if !KNOWN_TAGS.contains(&tag) {
            return Err(CodecError::UnknownTag { tag: tag.to_string(), id });
        }
    }

    serde_json::from_value(raw).map_err(|e| CodecError::MalformedDocument(e.to_string()))
}

/// Decode an already-parsed [`EncodedDocument`] into a [`Value`].
///
/// Two passes: the first allocates an empty [`Heap`] shell for every
/// `index` entry (so `$ref`s — including ones that close a cycle back onto
/// an entry still being filled — always resolve to *something*), the
/// second fills each shell's real content in order.
pub fn decode_document(doc: &EncodedDocument) -> Result<Value, CodecError> {
    let shells: Vec<Heap> = (0..doc.index.len())
        .map(|_| Rc::new(RefCell::new(HeapValue::Array(Vec::new()))))
        .collect();

    for (id, entry) in doc.index.iter().enumerate() {
        let filled = decode_entry(id, entry, &shells)?;
        *shells[id].borrow_mut() = filled;
    }

    decode_node(&doc.root, &shells)
}

fn decode_node(node: &WireNode, shells: &[Heap]) -> Result<Value, CodecError> {
    match node {
        WireNode::Ref(id) => {
            let heap = shells
                .get(*id)
                .cloned()
                .ok_or(CodecError::DanglingReference(*id))?;
            Ok(Value::Ref(heap))
        }
        WireNode::Literal(PrimitiveWire::Null) => Ok(Value::Null),
        WireNode::Literal(PrimitiveWire::Bool(b)) => Ok(Value::Bool(*b)),
        WireNode::Literal(PrimitiveWire::String(s)) => Ok(Value::String(s.clone())),
        WireNode::Literal(PrimitiveWire::Number(_)) => Ok(Value::Number(
            node.as_f64().expect("a Literal::Number node is always numeric"),
        )),
        WireNode::Scalar { tag: ScalarTag::BigInt, payload } => Ok(Value::BigInt(
            payload.clone().unwrap_or_default(),
        )),
        WireNode::Scalar { tag: ScalarTag::Undef, .. } => Ok(Value::Undefined),
        WireNode::Scalar { .. } => Ok(Value::Number(
            node.as_f64()
                .expect("every non-bigint, non-undef Scalar tag is numeric"),
        )),
    }
}

/// Decode a `WireNode` known to be a numeric value position (a plain date
/// epoch or a number literal) into an `f64`.
fn expect_number(node: &WireNode) -> Result<f64, CodecError> {
    node.as_f64()
        .ok_or_else(|| CodecError::MalformedDocument("expected a numeric value".into()))
}

fn decode_entry(id: usize, entry: &IndexEntry, shells: &[Heap]) -> Result<HeapValue, CodecError> {
    Ok(match entry {
        IndexEntry::Object { entries } => {
            let mut map = OrderedMap::new();
            for (key, value) in entries {
                map.insert(key.clone(), decode_node(value, shells)?);
            }
            HeapValue::Object(map)
        }
        IndexEntry::Array { items } => HeapValue::Array(
            items
                .iter()
                .map(|v| decode_node(v, shells))
                .collect::<Result<_, _>>()?,
        ),
        IndexEntry::Map { entries } => {
            let mut out = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                out.push((decode_node(key, shells)?, decode_node(value, shells)?));
            }
            HeapValue::Map(out)
        }
        IndexEntry::Set { items } => HeapValue::Set(
            items
                .iter()
                .map(|v| decode_node(v, shells))
                .collect::<Result<_, _>>()?,
        ),
        IndexEntry::Date { epoch_ms } => HeapValue::Date(expect_number(epoch_ms)?),
        IndexEntry::Regex { source, flags } => HeapValue::Regex {
            source: source.clone(),
            flags: flags.clone(),
        },
        IndexEntry::Error {
            name,
            message,
            stack,
            cause,
            props,
        } => {
            let cause = match cause {
                Some(c) => Some(Box::new(decode_node(c, shells)?)),
                None => None,
            };
            let mut extra = OrderedMap::new();
            for (key, value) in props {
                extra.insert(key.clone(), decode_node(value, shells)?);
            }
            HeapValue::Error(ErrorPayload {
                name: name.clone(),
                message: message.clone(),
                stack: stack.clone(),
                cause,
                extra,
            })
        }
        IndexEntry::ArrayBuffer { bytes_base64, length } => {
            let bytes = BASE64.decode(bytes_base64)?;
            if bytes.len() != *length {
                return Err(CodecError::MalformedDocument(format!(
                    "array buffer declared length {length} does not match decoded byte count {}",
                    bytes.len()
                )));
            }
            HeapValue::ArrayBuffer(bytes)
        }
        IndexEntry::TypedArray {
            kind,
            buffer,
            byte_offset,
            length,
        } => {
            let resolved_kind = TypedArrayKind::from_wire_tag(kind)
                .ok_or_else(|| CodecError::UnknownTag { tag: kind.clone(), id })?;
            let buffer = decode_buffer_ref(buffer, shells)?;
            HeapValue::TypedArray(TypedArrayPayload {
                kind: resolved_kind,
                buffer,
                byte_offset: *byte_offset,
                length: *length,
            })
        }
        IndexEntry::DataView {
            buffer,
            byte_offset,
            byte_length,
        } => {
            let buffer = decode_buffer_ref(buffer, shells)?;
            HeapValue::DataView(DataViewPayload {
                buffer,
                byte_offset: *byte_offset,
                byte_length: *byte_length,
            })
        }
        IndexEntry::Url { value } => HeapValue::Url(value.clone()),
        IndexEntry::Headers { entries } => HeapValue::Headers(entries.clone()),
        IndexEntry::Chain { ops } => HeapValue::Chain(decode_ops(ops, shells)?),
    })
}

/// A typed array's or data view's `buffer` field is always a `$ref` into
/// `index` (the encoder never inlines an `ArrayBuffer` under a view) —
/// resolve it straight to the shared [`Heap`] cell rather than wrapping it
/// in another `Value::Ref` indirection.
fn decode_buffer_ref(node: &WireNode, shells: &[Heap]) -> Result<Heap, CodecError> {
    match decode_node(node, shells)? {
        Value::Ref(heap) => Ok(heap),
        _ => Err(CodecError::MalformedDocument(
            "typed array / data view buffer must be a reference".into(),
        )),
    }
}

fn decode_ops(ops: &[OpWire], shells: &[Heap]) -> Result<OperationChain, CodecError> {
    let mut chain = OperationChain::new();
    for op in ops {
        chain.push(decode_op(op, shells)?);
    }
    Ok(chain)
}

fn decode_op(op: &OpWire, shells: &[Heap]) -> Result<Operation, CodecError> {
    Ok(match op {
        OpWire::Get { key } => Operation::Get(key.clone()),
        OpWire::Apply { args } => Operation::Apply(
            args.iter()
                .map(|arg| decode_arg(arg, shells))
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn decode_arg(arg: &ArgWire, shells: &[Heap]) -> Result<ChainArg, CodecError> {
    Ok(match arg {
        ArgWire::Value(value) => ChainArg::Value(decode_node(value, shells)?),
        ArgWire::Nested { ops } => ChainArg::Nested(ocan_core::NestedOperationMarker {
            chain: decode_ops(ops, shells)?,
        }),
    })
}
