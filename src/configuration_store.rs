//! A thread-safe in-memory storage for currently active configuration. [`ConfigurationStore`]
//! provides concurrent access for readers (decision evaluation) and writers (whatever host
//! process loads new feature definitions).
use std::sync::{Arc, RwLock};

use crate::Configuration;

/// `ConfigurationStore` provides a thread-safe (`Sync`) storage for the feature configuration
/// that allows concurrent access for readers and writers.
///
/// `Configuration` itself is always immutable and can only be replaced completely: readers
/// receive a *snapshot* that later writes never touch, so a decision evaluated against one
/// snapshot can never observe a half-updated feature.
#[derive(Default)]
pub struct ConfigurationStore {
    configuration: RwLock<Option<Arc<Configuration>>>,
}

impl ConfigurationStore {
    /// Create a new empty configuration store.
    pub fn new() -> Self {
        ConfigurationStore::default()
    }

    /// Get currently-active configuration. Returns None if configuration hasn't been stored yet.
    pub fn get_configuration(&self) -> Option<Arc<Configuration>> {
        // self.configuration.read() should always return Ok(). Err() is possible only if the lock
        // is poisoned (writer panicked while holding the lock), which should never happen.
        let configuration = self
            .configuration
            .read()
            .expect("thread holding configuration lock should not panic");

        configuration.clone()
    }

    /// Set new configuration.
    pub fn set_configuration(&self, configuration: Arc<Configuration>) {
        let mut configuration_slot = self
            .configuration
            .write()
            .expect("thread holding configuration lock should not panic");

        *configuration_slot = Some(configuration);
    }
}
