// SPDX-License-Identifier: MIT OR Apache-2.0
//! Library-level command implementations, kept separate from [`crate`]'s
//! `main` so they can be exercised directly in tests without spawning the
//! binary (mirrors the split the teacher's own CLI crate uses).

use std::path::Path;

use anyhow::{Context, Result};
use ocan_core::HeapValue;
use ocan_registry::InstanceRegistry;

use crate::demo::demo_registry;

/// One line of `registry list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryListing {
    /// The binding an instance is registered under.
    pub binding_name: String,
    /// The instance's own name within that binding.
    pub instance_name: String,
}

/// List every instance in `registry`, optionally filtered to one binding,
/// in registration order (§4.F).
pub fn list_instances(registry: &InstanceRegistry, binding: Option<&str>) -> Vec<RegistryListing> {
    registry
        .list(binding)
        .into_iter()
        .map(|record| RegistryListing {
            binding_name: record.binding_name,
            instance_name: record.instance_name,
        })
        .collect()
}

/// Decode a captured operation chain from `path` and replay it against the
/// demo `counters/demo` instance, returning the pretty-printed JSON result.
///
/// The file is expected to hold the codec's own encoded-document JSON
/// shape (§3 "Encoded document") for a value whose root resolves to a
/// [`HeapValue::Chain`] — exactly what a client proxy would have sent as
/// an [`ocan_transport::InvokeRequest`]'s `chain` field.
pub fn replay_file(path: &Path, binding: &str, instance: &str) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read chain file '{}'", path.display()))?;
    let chain_value = ocan_codec::parse(&text)
        .with_context(|| format!("decode chain document from '{}'", path.display()))?;

    let heap = chain_value
        .as_heap()
        .context("chain document's root did not decode to a reference value")?;
    let borrowed = heap.borrow();
    let HeapValue::Chain(chain) = &*borrowed else {
        anyhow::bail!("chain document's root did not decode to an operation chain");
    };

    let registry = demo_registry();
    let target = registry
        .resolve(binding, instance)
        .with_context(|| format!("no instance '{instance}' registered under binding '{binding}'"))?;

    let result = ocan_executor::execute_chain(chain, &target)
        .map_err(|err| anyhow::anyhow!("chain execution failed: {err}"))?;

    let encoded = ocan_codec::encode_document(&result).context("encode replay result")?;
    serde_json::to_string_pretty(&encoded).context("serialize replay result")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_the_demo_registry_in_registration_order() {
        let registry = demo_registry();
        let listing = list_instances(&registry, None);
        assert_eq!(
            listing,
            vec![RegistryListing {
                binding_name: "counters".into(),
                instance_name: "demo".into(),
            }]
        );
    }

    #[test]
    fn filtering_by_an_unregistered_binding_yields_nothing() {
        let registry = demo_registry();
        assert!(list_instances(&registry, Some("widgets")).is_empty());
    }

    #[test]
    fn replay_runs_a_captured_bump_chain_against_the_demo_instance() {
        let chain_value = ocan_core::Value::heap(HeapValue::Chain(
            ocan_core::OperationChain::new()
                .get("bump")
                .apply(vec![ocan_core::ChainArg::Value(ocan_core::Value::Number(5.0))]),
        ));
        let text = ocan_codec::stringify(&chain_value).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, text).unwrap();

        let output = replay_file(&path, "counters", "demo").unwrap();
        assert!(output.contains('5'));
    }

    #[test]
    fn replay_rejects_a_document_that_is_not_a_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_chain.json");
        std::fs::write(&path, ocan_codec::stringify(&ocan_core::Value::Number(1.0)).unwrap())
            .unwrap();

        let err = replay_file(&path, "counters", "demo").unwrap_err();
        assert!(err.to_string().contains("operation chain"));
    }
}
