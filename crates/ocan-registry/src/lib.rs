// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-registry
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! A map from `(bindingName, instanceName)` to a live [`ocan_executor::Target`]
//! (§4.F), plus a factory (`client_for`) that produces a [`ocan_proxy::ProxyHandle`]
//! whose transport is a direct in-process executor call — no network, no
//! codec round trip through bytes (though the chain still passes through
//! `ocan-codec`'s wire document shape on its way in, matching exactly what
//! a real transport would carry, so a registry-backed client and a
//! gateway-backed client exercise identical wire semantics).
//!
//! Instances are held as strong `Rc` references until explicitly
//! unregistered: Rust has no runtime-supported weak-reference registry
//! analogue to a host environment's `WeakRef`/`FinalizationRegistry` pair
//! that this crate could hook into automatically, so "weak-referenced
//! where the runtime supports it" (§4.F) resolves to "strong references,
//! explicit unregistration" on this target (per `spec.md` §4.F's own
//! fallback clause).

mod error;

pub use error::RegistryError;

use std::rc::Rc;

use ocan_core::{HeapValue, Value};
use ocan_executor::Target;
use ocan_transport::{Dispatcher, InProcessTransport, RequestKind, ResponseEnvelope};

struct Entry {
    binding_name: String,
    instance_name: String,
    target: Rc<Target>,
}

/// A snapshot record returned by [`InstanceRegistry::list`].
#[derive(Clone)]
pub struct InstanceRecord {
    /// The binding this instance is registered under.
    pub binding_name: String,
    /// The instance's own name within that binding.
    pub instance_name: String,
    /// The live target.
    pub target: Rc<Target>,
}

/// A registry of named, live [`Target`]s (§4.F).
#[derive(Default)]
pub struct InstanceRegistry {
    entries: Vec<Entry>,
}

impl InstanceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` under `(binding_name, instance_name)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateInstance`] if that pair is
    /// already registered; the existing instance is left untouched.
    pub fn register(
        &mut self,
        binding_name: impl Into<String>,
        instance_name: impl Into<String>,
        target: Rc<Target>,
    ) -> Result<(), RegistryError> {
        let binding_name = binding_name.into();
        let instance_name = instance_name.into();

        if self.find(&binding_name, &instance_name).is_some() {
            return Err(RegistryError::DuplicateInstance {
                binding: binding_name,
                instance: instance_name,
            });
        }

        self.entries.push(Entry {
            binding_name,
            instance_name,
            target,
        });
        Ok(())
    }

    /// Remove a registered instance. Returns `true` if it existed.
    pub fn unregister(&mut self, binding_name: &str, instance_name: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.binding_name == binding_name && e.instance_name == instance_name));
        self.entries.len() != before
    }

    /// Look up a registered instance.
    pub fn resolve(&self, binding_name: &str, instance_name: &str) -> Option<Rc<Target>> {
        self.find(binding_name, instance_name).map(|e| e.target.clone())
    }

    /// A snapshot of registered instances, in registration order, optionally
    /// filtered to one binding.
    pub fn list(&self, binding_name: Option<&str>) -> Vec<InstanceRecord> {
        self.entries
            .iter()
            .filter(|e| binding_name.is_none_or(|b| e.binding_name == b))
            .map(|e| InstanceRecord {
                binding_name: e.binding_name.clone(),
                instance_name: e.instance_name.clone(),
                target: e.target.clone(),
            })
            .collect()
    }

    /// Build a [`ocan_proxy::ProxyHandle`] whose dispatcher replays chains
    /// directly against the registered instance via [`ocan_executor`], with
    /// no real transport in between.
    pub fn client_for(
        &self,
        binding_name: &str,
        instance_name: &str,
        session_id: impl Into<String>,
    ) -> Option<ocan_proxy::ProxyHandle> {
        let target = self.resolve(binding_name, instance_name)?;
        let dispatcher: Rc<dyn Dispatcher> = Rc::new(InProcessTransport::new(move |request| {
            match request.kind {
                RequestKind::Dispose => {
                    Ok(ResponseEnvelope::ok(ocan_codec::encode_document(&Value::Undefined)?))
                }
                RequestKind::Invoke => {
                    let chain_value = ocan_codec::decode_document(&request.chain)?;
                    let chain_heap = chain_value.as_heap().expect("chain value is always a Ref").borrow();
                    let HeapValue::Chain(chain) = &*chain_heap else {
                        unreachable!("request.chain always decodes to a Chain wire value");
                    };
                    match ocan_executor::execute_chain(chain, &target) {
                        Ok(value) => Ok(ResponseEnvelope::ok(ocan_codec::encode_document(&value)?)),
                        Err(err) => Ok(ResponseEnvelope::err(ocan_codec::encode_document(
                            &err.into_error_value(),
                        )?)),
                    }
                }
            }
        }));
        Some(ocan_proxy::ProxyHandle::new(dispatcher, session_id))
    }

    fn find(&self, binding_name: &str, instance_name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.binding_name == binding_name && e.instance_name == instance_name)
    }
}
