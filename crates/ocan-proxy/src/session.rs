// SPDX-License-Identifier: MIT OR Apache-2.0
use std::cell::Cell;
use std::rc::Rc;

use ocan_transport::Dispatcher;

/// The shared state every [`crate::ProxyHandle`] descended from one seed
/// refers back to: "a reference to a transport/executor" (spec §4.C) plus
/// the opaque session id scoping server-side resources.
///
/// Disposal is session-wide, not handle-wide: once any handle disposes the
/// session, every other handle sharing it observes `disposed` on its next
/// materialization attempt.
pub(crate) struct SessionInner {
    pub(crate) dispatcher: Rc<dyn Dispatcher>,
    pub(crate) session_id: String,
    pub(crate) disposed: Cell<bool>,
}

impl SessionInner {
    pub(crate) fn new(dispatcher: Rc<dyn Dispatcher>, session_id: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            dispatcher,
            session_id: session_id.into(),
            disposed: Cell::new(false),
        })
    }
}
