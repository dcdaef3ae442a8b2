//! The native capability seam and the lifecycle handle that owns it.

use crate::data::DataLayout;
use crate::error::{Error, Result};
use crate::ffi::{
    libpostal_address_parser_options_t, libpostal_address_parser_response_t,
    libpostal_normalize_options_t,
};
use libc::{c_char, size_t};
use std::ffi::{CStr, CString};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info};

/// One of the three independently loaded parts of libpostal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Core data: expansion dictionaries, numex, transliteration
    Core,
    /// Address parser model
    Parser,
    /// Language classifier model
    LanguageClassifier,
}

impl Subsystem {
    /// Load order. Teardown runs in reverse.
    pub const ALL: [Subsystem; 3] = [Self::Core, Self::Parser, Self::LanguageClassifier];

    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Parser => "address parser",
            Self::LanguageClassifier => "language classifier",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The C-level operations the facade needs from libpostal.
///
/// Methods take `&mut self` so that a provider can only be driven through
/// exclusive access; [`crate::Postal`] hands that access out one caller at a
/// time. Signatures follow the C API so that marshaling code is exercised
/// identically for the linked library and for test doubles.
pub trait Provider: Send {
    /// Load a subsystem, optionally from an explicit data directory.
    fn setup(&mut self, subsystem: Subsystem, data_dir: Option<&CStr>) -> bool;

    /// Release a previously loaded subsystem.
    fn teardown(&mut self, subsystem: Subsystem);

    /// `libpostal_get_address_parser_default_options`
    fn parser_default_options(&mut self) -> libpostal_address_parser_options_t;

    /// `libpostal_get_default_options`
    fn expand_default_options(&mut self) -> libpostal_normalize_options_t;

    /// `libpostal_parse_address`
    ///
    /// # Safety
    ///
    /// `address` and any strings referenced by `options` must be valid
    /// NUL-terminated strings that outlive the call. A non-null return must be
    /// released exactly once with [`Provider::parser_response_destroy`].
    unsafe fn parse_address(
        &mut self,
        address: *mut c_char,
        options: libpostal_address_parser_options_t,
    ) -> *mut libpostal_address_parser_response_t;

    /// `libpostal_address_parser_response_destroy`
    ///
    /// # Safety
    ///
    /// `response` must come from [`Provider::parse_address`] on this provider
    /// and must not be used afterwards.
    unsafe fn parser_response_destroy(
        &mut self,
        response: *mut libpostal_address_parser_response_t,
    );

    /// `libpostal_expand_address`
    ///
    /// # Safety
    ///
    /// `input` must be a valid NUL-terminated string, `options.languages` must
    /// point at `options.num_languages` valid strings (or be null with a zero
    /// count), and `n` must be writable. A non-null return must be released
    /// exactly once with [`Provider::expansion_array_destroy`] and the count
    /// written to `n`.
    unsafe fn expand_address(
        &mut self,
        input: *mut c_char,
        options: libpostal_normalize_options_t,
        n: *mut size_t,
    ) -> *mut *mut c_char;

    /// `libpostal_expansion_array_destroy`
    ///
    /// # Safety
    ///
    /// `expansions` and `n` must be exactly what [`Provider::expand_address`]
    /// returned, and the array must not be used afterwards.
    unsafe fn expansion_array_destroy(&mut self, expansions: *mut *mut c_char, n: size_t);
}

/// Exclusive owner of a loaded [`Provider`].
///
/// Not `Clone`. Every native call needs `&mut NativeHandle`, which callers
/// only obtain through the gate in [`crate::Postal`]. Dropping the handle
/// tears down whatever was loaded, in reverse order.
pub struct NativeHandle {
    provider: Box<dyn Provider>,
    loaded: Vec<Subsystem>,
}

impl NativeHandle {
    /// Load every subsystem, stopping at the first failure.
    ///
    /// Subsystems loaded before a failure are torn down before the error is
    /// returned.
    pub(crate) fn open(
        provider: Box<dyn Provider>,
        data_dir: Option<&Path>,
        verify_data: bool,
    ) -> Result<Self> {
        let c_data_dir = data_dir.map(c_path).transpose()?;
        let layout = data_dir.filter(|_| verify_data).map(DataLayout::new);

        let mut handle = Self {
            provider,
            loaded: Vec::with_capacity(Subsystem::ALL.len()),
        };

        for subsystem in Subsystem::ALL {
            if let Some(layout) = &layout
                && let Err(e) = layout.verify(subsystem)
            {
                error!(
                    %subsystem,
                    root = %layout.root().display(),
                    "libpostal data check failed: {e}"
                );
                return Err(e);
            }

            if !handle.provider.setup(subsystem, c_data_dir.as_deref()) {
                error!(%subsystem, "Could not load libpostal subsystem");
                return Err(Error::setup_failed(subsystem));
            }

            info!(%subsystem, "Loaded libpostal subsystem");
            handle.loaded.push(subsystem);
        }

        Ok(handle)
    }

    /// The subsystems currently loaded, in load order.
    pub fn loaded(&self) -> &[Subsystem] {
        &self.loaded
    }

    pub(crate) fn provider(&mut self) -> &mut dyn Provider {
        self.provider.as_mut()
    }
}

/// The exact bytes of `dir` as a C string.
#[cfg(unix)]
fn c_path(dir: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(dir.as_os_str().as_bytes()).map_err(|_| Error::invalid_data_dir(dir))
}

/// `dir` as a C string. Paths that are not valid Unicode are refused rather
/// than handed to libpostal in altered form.
#[cfg(not(unix))]
fn c_path(dir: &Path) -> Result<CString> {
    dir.to_str()
        .and_then(|dir| CString::new(dir).ok())
        .ok_or_else(|| Error::invalid_data_dir(dir))
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        while let Some(subsystem) = self.loaded.pop() {
            debug!(%subsystem, "Tearing down libpostal subsystem");
            self.provider.teardown(subsystem);
        }
    }
}
