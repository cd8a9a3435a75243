// SPDX-License-Identifier: MIT OR Apache-2.0
use std::collections::HashMap;
use std::rc::Rc;

use ocan_core::Value;

use crate::error::ExecError;

/// A native method: a Rust closure standing in for a method hanging off a
/// live actor instance.
///
/// `this` is bound to the owning object's [`Value`] — mutation happens
/// through the shared `Rc<RefCell<_>>` cell the same way a JS closure
/// would mutate `this`'s fields, matching §4.D's identity/`this`-binding
/// requirement without needing a separate binding mechanism.
pub struct NativeMethod {
    func: Box<dyn Fn(&Value, &[Value]) -> Result<Value, ExecError>>,
}

impl NativeMethod {
    /// Wrap a closure as a native method.
    pub fn new(func: impl Fn(&Value, &[Value]) -> Result<Value, ExecError> + 'static) -> Self {
        Self { func: Box::new(func) }
    }

    pub(crate) fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ExecError> {
        (self.func)(this, args)
    }
}

/// A replayable target: a root data [`Value`] plus a table of native
/// methods that hang directly off it.
///
/// This is the Rust realization of "a live target object" from §4.D: since
/// [`Value`] cannot carry functions (§3 excludes them from the domain on
/// purpose — they're not serializable), methods live in a side table keyed
/// by name and are only resolved when the executor's cursor is, by
/// identity, the root value itself. This matches every scenario in §8:
/// methods hang directly off the actor instance, never off a plain nested
/// object.
pub struct Target {
    root: Value,
    methods: HashMap<String, Rc<NativeMethod>>,
    /// If set, the target itself is callable — used for the §9 edge case
    /// where a chain's first operation is `Apply` (call the root target
    /// directly, `this` bound to the root).
    call: Option<Rc<NativeMethod>>,
}

impl Target {
    /// Build a target around a root data value (typically
    /// `Value::object(...)`).
    pub fn new(root: Value) -> Self {
        Self {
            root,
            methods: HashMap::new(),
            call: None,
        }
    }

    /// Register a named native method on the root object, builder-style.
    #[must_use]
    pub fn with_method(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&Value, &[Value]) -> Result<Value, ExecError> + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(NativeMethod::new(func)));
        self
    }

    /// Make the target itself callable (root-is-a-function case, §9).
    #[must_use]
    pub fn with_call(
        mut self,
        func: impl Fn(&Value, &[Value]) -> Result<Value, ExecError> + 'static,
    ) -> Self {
        self.call = Some(Rc::new(NativeMethod::new(func)));
        self
    }

    /// The root value a fresh [`crate::execute_chain`] call starts its
    /// cursor at.
    pub fn root_value(&self) -> Value {
        self.root.clone()
    }

    pub(crate) fn lookup_method(&self, name: &str) -> Option<Rc<NativeMethod>> {
        self.methods.get(name).cloned()
    }

    pub(crate) fn call_method(&self) -> Option<Rc<NativeMethod>> {
        self.call.clone()
    }

    pub(crate) fn is_root(&self, value: &Value) -> bool {
        value.same_value(&self.root)
    }
}
