//! # postal-facade
//!
//! A serialized Rust facade over libpostal - international address parsing and
//! expansion.
//!
//! The crate exposes two operations on a [`Postal`] context:
//!
//! - **Parsing**: split a free-form address into ordered, labeled components
//! - **Expansion**: produce the normalized variants of an address
//!
//! libpostal keeps its models in process-wide C state and does not promise
//! reentrancy, so every native call made through a context runs behind one
//! lock. Results are copied into owned Rust values and the native buffers are
//! released before the lock is let go.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use postal_facade::{ParserOptions, Postal};
//!
//! // Load libpostal (requires the `system-libpostal` feature)
//! let postal = Postal::new()?;
//!
//! // Parse an address
//! let address = "781 Franklin Ave Crown Heights Brooklyn NY 11216";
//! let components = postal
//!     .parse_address(address, &ParserOptions::default())
//!     .unwrap_or_default();
//! for component in components {
//!     println!("{}: {}", component.label, component.value);
//! }
//!
//! // Expand an address
//! for variant in postal.expand("St. John's Rd.").unwrap_or_default() {
//!     println!("{variant}");
//! }
//! # Ok::<(), postal_facade::Error>(())
//! ```
//!
//! ## Limitations
//!
//! Calls cannot be cancelled and have no timeout. A call that hangs inside
//! libpostal holds the lock and blocks every other caller of the context.

#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod data;
pub mod error;
pub mod expander;
pub mod ffi;
mod marshal;
pub mod options;
pub mod parser;
pub mod provider;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main API
pub use error::{Error, Rejection, Result};
pub use expander::AddressExpander;
pub use options::{ExpandOptions, ParserOptions};
pub use parser::AddressParser;
pub use provider::{NativeHandle, Provider, Subsystem};
pub use types::{AddressComponents, ParsedAddress, ParsedComponent};

#[cfg(feature = "system-libpostal")]
pub use ffi::Libpostal;

use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::info;

/// A loaded libpostal and the lock that serializes access to it.
///
/// Build one at startup and share it by reference or `Arc`; it is `Send` and
/// `Sync` but not `Clone`. Expansion defaults are read from the library once,
/// here, and reused for every call.
///
/// # Examples
///
/// ```rust,ignore
/// use postal_facade::Postal;
/// use std::sync::Arc;
///
/// let postal = Arc::new(Postal::new()?);
/// let worker = {
///     let postal = Arc::clone(&postal);
///     std::thread::spawn(move || postal.expand("Main St"))
/// };
/// # Ok::<(), postal_facade::Error>(())
/// ```
#[derive(Debug)]
pub struct Postal {
    gate: Mutex<NativeHandle>,
    expand_defaults: ExpandOptions,
    config: PostalConfig,
}

impl Postal {
    /// Load the linked libpostal with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if another context already owns the library, if a
    /// data file is missing, or if any subsystem fails to load. Callers that
    /// cannot run without libpostal should treat this as fatal.
    #[cfg(feature = "system-libpostal")]
    pub fn new() -> Result<Self> {
        Self::with_config(PostalConfig::default())
    }

    /// Load the linked libpostal with custom configuration.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use postal_facade::{Postal, PostalConfig};
    ///
    /// let config = PostalConfig::builder()
    ///     .data_dir("/var/lib/libpostal")
    ///     .verify_data(true)
    ///     .build();
    ///
    /// let postal = Postal::with_config(config)?;
    /// # Ok::<(), postal_facade::Error>(())
    /// ```
    #[cfg(feature = "system-libpostal")]
    pub fn with_config(config: PostalConfig) -> Result<Self> {
        Self::with_provider(ffi::Libpostal::claim()?, config)
    }

    /// Load an arbitrary [`Provider`].
    ///
    /// Sets up the core, parser and language classifier subsystems in that
    /// order and caches the provider's expansion defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SetupFailed`] naming the first subsystem that did not
    /// load, or [`Error::MissingData`] when data verification is on and a
    /// file is absent. Subsystems loaded before the failure are torn down.
    pub fn with_provider(provider: impl Provider + 'static, config: PostalConfig) -> Result<Self> {
        let mut handle =
            NativeHandle::open(Box::new(provider), config.data_dir.as_deref(), config.verify_data)?;
        let expand_defaults = ExpandOptions::from_raw(&handle.provider().expand_default_options());

        info!(
            data_dir = ?config.data_dir,
            "libpostal ready"
        );

        Ok(Self {
            gate: Mutex::new(handle),
            expand_defaults,
            config,
        })
    }

    /// Parser options that defer entirely to libpostal.
    pub fn default_parser_options() -> ParserOptions {
        ParserOptions::default()
    }

    /// libpostal's expansion defaults, as read at startup.
    pub fn default_expand_options(&self) -> &ExpandOptions {
        &self.expand_defaults
    }

    /// Create a parser with no hints.
    pub fn parser(&self) -> AddressParser<'_> {
        AddressParser::new(self)
    }

    /// Create an expander starting from the cached defaults.
    pub fn expander(&self) -> AddressExpander<'_> {
        AddressExpander::new(self)
    }

    /// Get the configuration used by this instance.
    pub fn config(&self) -> &PostalConfig {
        &self.config
    }

    /// Subsystems currently loaded. Briefly takes the lock.
    pub fn loaded_subsystems(&self) -> Vec<Subsystem> {
        self.gate.lock().loaded().to_vec()
    }
}

/// Configuration for loading libpostal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalConfig {
    /// Data directory to load from. `None` uses the directory libpostal was
    /// compiled with.
    pub data_dir: Option<PathBuf>,

    /// Whether to check for the data files of each subsystem before loading
    /// it. Only applies when `data_dir` is set.
    pub verify_data: bool,
}

impl Default for PostalConfig {
    fn default() -> Self {
        Self {
            data_dir: data::default_data_dir(),
            verify_data: true,
        }
    }
}

impl PostalConfig {
    /// Create a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use postal_facade::PostalConfig;
    ///
    /// let config = PostalConfig::builder()
    ///     .compiled_data_dir()
    ///     .verify_data(false)
    ///     .build();
    /// assert!(config.data_dir.is_none());
    /// ```
    pub fn builder() -> PostalConfigBuilder {
        PostalConfigBuilder::new()
    }
}

/// Builder for PostalConfig.
#[derive(Debug, Clone)]
pub struct PostalConfigBuilder {
    config: PostalConfig,
}

impl PostalConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: PostalConfig::default(),
        }
    }

    /// Load from a specific data directory.
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    /// Load from libpostal's compiled-in data directory.
    pub fn compiled_data_dir(mut self) -> Self {
        self.config.data_dir = None;
        self
    }

    /// Set whether to verify data files before loading.
    pub fn verify_data(mut self, enabled: bool) -> Self {
        self.config.verify_data = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PostalConfig {
        self.config
    }
}

impl Default for PostalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
