//! Engine configuration
//!
//! Every parent container carries an [`EngineConfig`]; views inherit it.
//!
//! # Examples
//!
//! ```
//! use subvec::{Backend, EngineConfig};
//!
//! // Defaults: detected backend, 3 MiB cache, streaming enabled
//! let config = EngineConfig::default();
//! assert_ne!(config.backend, Backend::Auto);
//!
//! // Custom configuration using builder pattern
//! let custom = EngineConfig::new()
//!     .with_backend(Backend::Scalar)
//!     .with_cache_size(8 * 1024 * 1024)
//!     .with_streaming(false);
//! assert_eq!(custom.cache_size, 8 * 1024 * 1024);
//! ```

use crate::{select_best_available_backend, Backend};

/// Default last-level cache size assumed by the streaming heuristic (3 MiB)
pub const DEFAULT_CACHE_SIZE: usize = 3 * 1024 * 1024;

/// Tunables for the assignment engine
///
/// None of these affect results, only which code path produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Instruction set used for packed kernels (never `Auto`)
    pub backend: Backend,
    /// Cache size in bytes; assignments writing more than a third of it stream
    pub cache_size: usize,
    /// Whether non-temporal stores may be used at all
    pub streaming: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: select_best_available_backend(),
            cache_size: DEFAULT_CACHE_SIZE,
            streaming: true,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend; `Backend::Auto` is resolved immediately
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::{select_best_available_backend, Backend, EngineConfig};
    ///
    /// let config = EngineConfig::new().with_backend(Backend::Auto);
    /// assert_eq!(config.backend, select_best_available_backend());
    /// ```
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = match backend {
            Backend::Auto => select_best_available_backend(),
            other => other,
        };
        self
    }

    /// Set the cache size in bytes used by the streaming heuristic
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    /// Enable/disable non-temporal stores
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming = enabled;
        self
    }

    /// Element count above which plain assignment of `T` streams
    ///
    /// # Examples
    ///
    /// ```
    /// use subvec::EngineConfig;
    ///
    /// let config = EngineConfig::new().with_cache_size(3 * 1024);
    /// assert_eq!(config.streaming_threshold::<f64>(), 128);
    /// ```
    pub fn streaming_threshold<T>(&self) -> usize {
        self.cache_size / (3 * std::mem::size_of::<T>().max(1))
    }
}
