// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-proxy
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! A [`ProxyHandle`] presents a transparent façade over a remote target
//! (§4.C): reading a property or calling a handle never issues transport
//! traffic, only records an [`ocan_core::Operation`] onto a new handle.
//! Transport traffic happens exactly once, when a handle is awaited.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use ocan_proxy::ProxyHandle;
//! use ocan_transport::{Dispatcher, InProcessTransport, ResponseEnvelope};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = InProcessTransport::new(|_request| {
//!     let doc = ocan_codec::encode_document(&ocan_core::Value::Number(42.0))?;
//!     Ok(ResponseEnvelope::ok(doc))
//! });
//! let seed = ProxyHandle::new(Rc::new(transport) as Rc<dyn Dispatcher>, "session-1");
//! let handle = seed.get("answer")?;
//! let value = handle.await?;
//! assert!(matches!(value, ocan_core::Value::Number(n) if n == 42.0));
//! # Ok(())
//! # }
//! ```

mod arg;
mod error;
mod handle;
mod session;

pub use arg::{arg, IntoChainArg};
pub use error::ProxyError;
pub use handle::{ProxyHandle, ProxyState};
