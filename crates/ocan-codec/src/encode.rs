// SPDX-License-Identifier: MIT OR Apache-2.0
use std::collections::HashMap;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ocan_core::{ChainArg, HeapValue, Operation, OperationChain, Value};

use crate::document::{ArgWire, EncodedDocument, IndexEntry, OpWire, PrimitiveWire, ScalarTag, WireNode};
use crate::error::CodecError;

/// Serialize a [`Value`] to a JSON string.
///
/// # Examples
///
/// ```
/// use ocan_codec::stringify;
/// use ocan_core::Value;
///
/// let text = stringify(&Value::Number(42.0)).unwrap();
/// assert!(text.contains("42"));
/// ```
pub fn stringify(value: &Value) -> Result<String, CodecError> {
    let doc = encode_document(value)?;
    Ok(serde_json::to_string(&doc)?)
}

/// Encode a [`Value`] into an [`EncodedDocument`] without serializing it to
/// text — useful when the caller wants to inspect or further transform the
/// wire shape.
pub fn encode_document(value: &Value) -> Result<EncodedDocument, CodecError> {
    let mut encoder = Encoder::new();
    let root = encoder.encode_node(value)?;
    Ok(EncodedDocument {
        root,
        index: encoder.finish(),
    })
}

/// Walks a `Value` graph once, assigning each distinct heap cell a position
/// in `index` the first time it's visited and reusing that position (via a
/// `$ref`) for every later occurrence — including an occurrence that closes
/// a cycle back to a value still being encoded.
struct Encoder {
    seen: HashMap<usize, usize>,
    entries: Vec<Option<IndexEntry>>,
}

impl Encoder {
    fn new() -> Self {
        Self {
            seen: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn encode_node(&mut self, value: &Value) -> Result<WireNode, CodecError> {
        match value {
            Value::Undefined => Ok(WireNode::Scalar { tag: ScalarTag::Undef, payload: None }),
            Value::Null => Ok(WireNode::Literal(PrimitiveWire::Null)),
            Value::Bool(b) => Ok(WireNode::Literal(PrimitiveWire::Bool(*b))),
            Value::Number(n) => Ok(WireNode::from_f64(*n)),
            Value::BigInt(s) => Ok(WireNode::Scalar { tag: ScalarTag::BigInt, payload: Some(s.clone()) }),
            Value::String(s) => Ok(WireNode::Literal(PrimitiveWire::String(s.clone()))),
            Value::Ref(heap) => {
                let ptr = Rc::as_ptr(heap) as usize;
                if let Some(&id) = self.seen.get(&ptr) {
                    return Ok(WireNode::Ref(id));
                }
                let id = self.entries.len();
                self.seen.insert(ptr, id);
                self.entries.push(None);
                let entry = self.encode_heap(&heap.borrow())?;
                self.entries[id] = Some(entry);
                Ok(WireNode::Ref(id))
            }
        }
    }

    fn encode_heap(&mut self, value: &HeapValue) -> Result<IndexEntry, CodecError> {
        Ok(match value {
            HeapValue::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, value) in map.iter() {
                    entries.push((key.to_string(), self.encode_node(value)?));
                }
                IndexEntry::Object { entries }
            }
            HeapValue::Array(items) => IndexEntry::Array {
                items: items
                    .iter()
                    .map(|v| self.encode_node(v))
                    .collect::<Result<_, _>>()?,
            },
            HeapValue::Map(entries) => {
                let mut wire = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    wire.push((self.encode_node(key)?, self.encode_node(value)?));
                }
                IndexEntry::Map { entries: wire }
            }
            HeapValue::Set(items) => IndexEntry::Set {
                items: items
                    .iter()
                    .map(|v| self.encode_node(v))
                    .collect::<Result<_, _>>()?,
            },
            HeapValue::Date(epoch_ms) => IndexEntry::Date {
                epoch_ms: WireNode::from_f64(*epoch_ms),
            },
            HeapValue::Regex { source, flags } => IndexEntry::Regex {
                source: source.clone(),
                flags: flags.clone(),
            },
            HeapValue::Error(payload) => {
                let cause = match &payload.cause {
                    Some(cause) => Some(Box::new(self.encode_node(cause)?)),
                    None => None,
                };
                let mut props = Vec::with_capacity(payload.extra.len());
                for (key, value) in payload.extra.iter() {
                    props.push((key.to_string(), self.encode_node(value)?));
                }
                IndexEntry::Error {
                    name: payload.name.clone(),
                    message: payload.message.clone(),
                    stack: payload.stack.clone(),
                    cause,
                    props,
                }
            }
            HeapValue::ArrayBuffer(bytes) => IndexEntry::ArrayBuffer {
                bytes_base64: BASE64.encode(bytes),
                length: bytes.len(),
            },
            HeapValue::TypedArray(view) => {
                let buffer = self.encode_node(&Value::Ref(view.buffer.clone()))?;
                IndexEntry::TypedArray {
                    kind: view.kind.wire_tag().to_string(),
                    buffer,
                    byte_offset: view.byte_offset,
                    length: view.length,
                }
            }
            HeapValue::DataView(view) => {
                let buffer = self.encode_node(&Value::Ref(view.buffer.clone()))?;
                IndexEntry::DataView {
                    buffer,
                    byte_offset: view.byte_offset,
                    byte_length: view.byte_length,
                }
            }
            HeapValue::Url(value) => IndexEntry::Url {
                value: value.clone(),
            },
            HeapValue::Headers(entries) => IndexEntry::Headers {
                entries: entries.clone(),
            },
            HeapValue::Chain(chain) => IndexEntry::Chain {
                ops: self.encode_ops(chain)?,
            },
        })
    }

    fn encode_ops(&mut self, chain: &OperationChain) -> Result<Vec<OpWire>, CodecError> {
        chain.ops().iter().map(|op| self.encode_op(op)).collect()
    }

    fn encode_op(&mut self, op: &Operation) -> Result<OpWire, CodecError> {
        Ok(match op {
            Operation::Get(key) => OpWire::Get { key: key.clone() },
            Operation::Apply(args) => OpWire::Apply {
                args: args
                    .iter()
                    .map(|arg| self.encode_arg(arg))
                    .collect::<Result<_, _>>()?,
            },
        })
    }

    fn encode_arg(&mut self, arg: &ChainArg) -> Result<ArgWire, CodecError> {
        Ok(match arg {
            ChainArg::Value(value) => ArgWire::Value(self.encode_node(value)?),
            ChainArg::Nested(marker) => ArgWire::Nested {
                ops: self.encode_ops(&marker.chain)?,
            },
        })
    }

    fn finish(self) -> Vec<IndexEntry> {
        self.entries
            .into_iter()
            .map(|entry| entry.expect("every reserved index id is filled before encode_node returns"))
            .collect()
    }
}
