// SPDX-License-Identifier: MIT OR Apache-2.0
use thiserror::Error;

/// Everything that can go wrong registering an instance (§4.F).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An instance was already registered under this `(binding, instance)`
    /// pair; registration does not replace it.
    #[error("instance '{instance}' is already registered under binding '{binding}'")]
    DuplicateInstance {
        /// The binding name.
        binding: String,
        /// The instance name.
        instance: String,
    },
}
