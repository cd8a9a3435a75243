// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! See the crate [README](https://docs.rs/ocan-codec) for the wire shape;
//! [`stringify`]/[`parse`] are the two entry points most callers need.

/// Decoding: the two-pass shell-then-fill algorithm.
pub mod decode;
/// The wire document shape (`root`/`index`, tagged entries).
pub mod document;
/// Encoding: the depth-first, identity-tracking traversal.
pub mod encode;
/// [`CodecError`], the closed set of encode/decode failures.
pub mod error;

pub use decode::{decode_document, parse};
pub use document::EncodedDocument;
pub use encode::{encode_document, stringify};
pub use error::CodecError;

#[cfg(test)]
mod tests {
    use super::*;
    use ocan_core::{HeapValue, OrderedMap, TypedArrayKind, TypedArrayPayload, Value};

    #[test]
    fn round_trips_a_plain_object() {
        let mut map = OrderedMap::new();
        map.insert("a", Value::Number(1.0));
        map.insert("b", Value::String("two".into()));
        let value = Value::object(map);

        let text = stringify(&value).unwrap();
        let back = parse(&text).unwrap();
        assert!(value.deep_eq(&back));
    }

    #[test]
    fn round_trips_special_numbers() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0, 0.0, 1.5] {
            let value = Value::Number(v);
            let back = parse(&stringify(&value).unwrap()).unwrap();
            match back {
                Value::Number(got) => assert_eq!(got.to_bits(), v.to_bits()),
                other => panic!("expected number, got {other:?}"),
            }
        }
    }

    #[test]
    fn round_trips_a_cycle() {
        let obj = Value::object(OrderedMap::new());
        if let Some(heap) = obj.as_heap() {
            if let HeapValue::Object(map) = &mut *heap.borrow_mut() {
                map.insert("self", obj.clone());
            }
        }

        let text = stringify(&obj).unwrap();
        let decoded = parse(&text).unwrap();

        let HeapValue::Object(map) = &*decoded.as_heap().unwrap().borrow() else {
            panic!("expected object");
        };
        let selfref = map.get("self").unwrap();
        assert!(selfref.same_value(&decoded));
    }

    #[test]
    fn round_trips_aliased_typed_array_views() {
        let buffer: ocan_core::Heap = std::rc::Rc::new(std::cell::RefCell::new(
            HeapValue::ArrayBuffer(vec![0u8; 16]),
        ));
        let view_a = Value::heap(HeapValue::TypedArray(TypedArrayPayload {
            kind: TypedArrayKind::Uint8,
            buffer: buffer.clone(),
            byte_offset: 0,
            length: 16,
        }));
        let view_b = Value::heap(HeapValue::TypedArray(TypedArrayPayload {
            kind: TypedArrayKind::Uint8,
            buffer: buffer.clone(),
            byte_offset: 4,
            length: 4,
        }));
        let mut obj = OrderedMap::new();
        obj.insert("a", view_a);
        obj.insert("b", view_b);
        let root = Value::object(obj);

        let decoded = parse(&stringify(&root).unwrap()).unwrap();
        let HeapValue::Object(map) = &*decoded.as_heap().unwrap().borrow() else {
            panic!("expected object");
        };
        let (HeapValue::TypedArray(a), HeapValue::TypedArray(b)) = (
            &*map.get("a").unwrap().as_heap().unwrap().borrow(),
            &*map.get("b").unwrap().as_heap().unwrap().borrow(),
        ) else {
            panic!("expected typed arrays");
        };
        assert!(std::rc::Rc::ptr_eq(&a.buffer, &b.buffer));
    }

    #[test]
    fn unknown_tag_is_reported_precisely() {
        let text = r#"{"root":["$ref",0],"index":[["not_a_real_tag",null]]}"#;
        let err = parse(text).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag { tag, id } if tag == "not_a_real_tag" && id == 0));
    }

    #[test]
    fn dangling_reference_is_reported() {
        let text = r#"{"root":["$ref",7],"index":[]}"#;
        let err = parse(text).unwrap_err();
        assert!(matches!(err, CodecError::DanglingReference(7)));
    }

    #[test]
    fn malformed_document_missing_index() {
        let text = r#"{"root":null}"#;
        let err = parse(text).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDocument(_)));
    }
}
