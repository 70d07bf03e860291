//! Configuration for arenastore
//!
//! Sizing knobs for record stores and sequence maps, with sensible defaults.

use crate::error::{Result, StoreError};

/// Sizing for a [`RecordStore`](crate::store::RecordStore)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Largest encoded payload a single record may occupy (in bytes).
    /// Each slot is this plus the 8-byte id prefix.
    pub max_record_length: usize,

    /// Number of slots allocated up front. The arena doubles when full.
    pub initial_records: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_record_length: 256,
            initial_records: 1024,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Reject sizes the arena cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_record_length == 0 {
            return Err(StoreError::Config(
                "max_record_length must be greater than zero".to_string(),
            ));
        }
        if self.initial_records == 0 {
            return Err(StoreError::Config(
                "initial_records must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the maximum encoded record length (in bytes)
    pub fn max_record_length(mut self, length: usize) -> Self {
        self.config.max_record_length = length;
        self
    }

    /// Set the number of records to allocate room for up front
    pub fn initial_records(mut self, count: usize) -> Self {
        self.config.initial_records = count;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}

/// Sizing for a [`SequenceTable`](crate::map::SequenceTable)
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Longest key accepted, in elements (bytes for byte maps, UTF-16 units
    /// for char maps). Longer keys are rejected, never truncated.
    pub max_key_length: usize,

    /// Requested slot count; rounded up to a power of two.
    pub initial_size: usize,

    /// Returned by `get`/`remove` when a key is absent
    pub missing_value: i64,

    /// Fraction of slots that may be live before the table doubles
    pub load_factor: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_key_length: 64,
            initial_size: 64,
            missing_value: i64::MIN,
            load_factor: 0.7,
        }
    }
}

impl MapConfig {
    /// Create a new config builder
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }

    /// Reject sizes the table cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_key_length == 0 {
            return Err(StoreError::Config(
                "max_key_length must be greater than zero".to_string(),
            ));
        }
        if self.initial_size == 0 {
            return Err(StoreError::Config(
                "initial_size must be greater than zero".to_string(),
            ));
        }
        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(StoreError::Config(format!(
                "load_factor must be in (0, 1), got {}",
                self.load_factor
            )));
        }
        Ok(())
    }
}

/// Builder for MapConfig
#[derive(Default)]
pub struct MapConfigBuilder {
    config: MapConfig,
}

impl MapConfigBuilder {
    /// Set the maximum key length (in elements)
    pub fn max_key_length(mut self, length: usize) -> Self {
        self.config.max_key_length = length;
        self
    }

    /// Set the requested initial slot count
    pub fn initial_size(mut self, size: usize) -> Self {
        self.config.initial_size = size;
        self
    }

    /// Set the sentinel returned for absent keys
    pub fn missing_value(mut self, value: i64) -> Self {
        self.config.missing_value = value;
        self
    }

    /// Set the growth threshold as a fraction of capacity
    pub fn load_factor(mut self, factor: f32) -> Self {
        self.config.load_factor = factor;
        self
    }

    pub fn build(self) -> MapConfig {
        self.config
    }
}
