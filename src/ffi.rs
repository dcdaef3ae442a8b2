//! Raw declarations for the subset of the libpostal C API this crate uses.
//!
//! The struct layouts and constants mirror `libpostal/libpostal.h` (v1.x).
//! They are declared by hand so the crate builds without libpostal headers;
//! the `extern` block and the [`Libpostal`] provider are only compiled with
//! the `system-libpostal` feature.
//!
//! # Memory ownership
//!
//! * Strings passed *into* libpostal are borrowed for the duration of the call.
//!   libpostal never retains or frees them.
//! * `libpostal_parse_address` returns a heap response owned by the caller until
//!   it is passed to `libpostal_address_parser_response_destroy`.
//! * `libpostal_expand_address` returns a heap array of `*num_expansions`
//!   strings owned by the caller until it is passed, with that same count, to
//!   `libpostal_expansion_array_destroy`.
//!
//! The crate ties both destructors to drop guards, so a result is released
//! on every path out of a call.

#![allow(missing_docs)]
#![allow(non_camel_case_types)]

use libc::{c_char, size_t};

pub const LIBPOSTAL_ADDRESS_NONE: u16 = 0;
pub const LIBPOSTAL_ADDRESS_ANY: u16 = 1 << 0;
pub const LIBPOSTAL_ADDRESS_NAME: u16 = 1 << 1;
pub const LIBPOSTAL_ADDRESS_HOUSE_NUMBER: u16 = 1 << 2;
pub const LIBPOSTAL_ADDRESS_STREET: u16 = 1 << 3;
pub const LIBPOSTAL_ADDRESS_UNIT: u16 = 1 << 4;
pub const LIBPOSTAL_ADDRESS_LEVEL: u16 = 1 << 5;
pub const LIBPOSTAL_ADDRESS_STAIRCASE: u16 = 1 << 6;
pub const LIBPOSTAL_ADDRESS_ENTRANCE: u16 = 1 << 7;
pub const LIBPOSTAL_ADDRESS_CATEGORY: u16 = 1 << 8;
pub const LIBPOSTAL_ADDRESS_NEAR: u16 = 1 << 9;
pub const LIBPOSTAL_ADDRESS_TOPONYM: u16 = 1 << 13;
pub const LIBPOSTAL_ADDRESS_POSTAL_CODE: u16 = 1 << 14;
pub const LIBPOSTAL_ADDRESS_PO_BOX: u16 = 1 << 15;
pub const LIBPOSTAL_ADDRESS_ALL: u16 = u16::MAX;

/// `libpostal_normalize_options_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct libpostal_normalize_options_t {
    pub languages: *mut *mut c_char,
    pub num_languages: size_t,
    pub address_components: u16,
    pub latin_ascii: bool,
    pub transliterate: bool,
    pub strip_accents: bool,
    pub decompose: bool,
    pub lowercase: bool,
    pub trim_string: bool,
    pub replace_word_hyphens: bool,
    pub delete_word_hyphens: bool,
    pub replace_numeric_hyphens: bool,
    pub delete_numeric_hyphens: bool,
    pub split_alpha_from_numeric: bool,
    pub delete_final_periods: bool,
    pub delete_acronym_periods: bool,
    pub drop_english_possessives: bool,
    pub delete_apostrophes: bool,
    pub expand_numex: bool,
    pub roman_numerals: bool,
}

/// `libpostal_address_parser_options_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct libpostal_address_parser_options_t {
    pub language: *mut c_char,
    pub country: *mut c_char,
}

/// `libpostal_address_parser_response_t`
#[repr(C)]
#[derive(Debug)]
pub struct libpostal_address_parser_response_t {
    pub num_components: size_t,
    pub components: *mut *mut c_char,
    pub labels: *mut *mut c_char,
}

#[cfg(feature = "system-libpostal")]
unsafe extern "C" {
    pub fn libpostal_setup() -> bool;
    pub fn libpostal_setup_datadir(datadir: *mut c_char) -> bool;
    pub fn libpostal_teardown();

    pub fn libpostal_setup_parser() -> bool;
    pub fn libpostal_setup_parser_datadir(datadir: *mut c_char) -> bool;
    pub fn libpostal_teardown_parser();

    pub fn libpostal_setup_language_classifier() -> bool;
    pub fn libpostal_setup_language_classifier_datadir(datadir: *mut c_char) -> bool;
    pub fn libpostal_teardown_language_classifier();

    pub fn libpostal_get_default_options() -> libpostal_normalize_options_t;
    pub fn libpostal_expand_address(
        input: *mut c_char,
        options: libpostal_normalize_options_t,
        n: *mut size_t,
    ) -> *mut *mut c_char;
    pub fn libpostal_expansion_array_destroy(expansions: *mut *mut c_char, n: size_t);

    pub fn libpostal_get_address_parser_default_options() -> libpostal_address_parser_options_t;
    pub fn libpostal_parse_address(
        address: *mut c_char,
        options: libpostal_address_parser_options_t,
    ) -> *mut libpostal_address_parser_response_t;
    pub fn libpostal_address_parser_response_destroy(
        self_: *mut libpostal_address_parser_response_t,
    );
}

#[cfg(feature = "system-libpostal")]
pub use linked::Libpostal;

#[cfg(feature = "system-libpostal")]
mod linked {
    use super::*;
    use crate::error::{Error, Result};
    use crate::provider::{Provider, Subsystem};
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicBool, Ordering};

    // libpostal keeps its models in C globals, so only one owner may exist
    static CLAIMED: AtomicBool = AtomicBool::new(false);

    /// The linked libpostal library as a [`Provider`].
    ///
    /// At most one `Libpostal` exists per process. Dropping it releases the
    /// claim; subsystem teardown is driven by the owning
    /// [`NativeHandle`](crate::provider::NativeHandle).
    #[derive(Debug)]
    pub struct Libpostal {
        _claim: (),
    }

    impl Libpostal {
        /// Claim the process-wide library.
        ///
        /// # Errors
        ///
        /// Returns [`Error::AlreadyInitialized`] while another claim is alive.
        pub fn claim() -> Result<Self> {
            CLAIMED
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .map_err(|_| Error::AlreadyInitialized)?;
            Ok(Self { _claim: () })
        }
    }

    impl Drop for Libpostal {
        fn drop(&mut self) {
            CLAIMED.store(false, Ordering::Release);
        }
    }

    impl Provider for Libpostal {
        fn setup(&mut self, subsystem: Subsystem, data_dir: Option<&CStr>) -> bool {
            unsafe {
                match (subsystem, data_dir) {
                    (Subsystem::Core, None) => libpostal_setup(),
                    (Subsystem::Core, Some(dir)) => libpostal_setup_datadir(dir.as_ptr() as *mut _),
                    (Subsystem::Parser, None) => libpostal_setup_parser(),
                    (Subsystem::Parser, Some(dir)) => {
                        libpostal_setup_parser_datadir(dir.as_ptr() as *mut _)
                    }
                    (Subsystem::LanguageClassifier, None) => libpostal_setup_language_classifier(),
                    (Subsystem::LanguageClassifier, Some(dir)) => {
                        libpostal_setup_language_classifier_datadir(dir.as_ptr() as *mut _)
                    }
                }
            }
        }

        fn teardown(&mut self, subsystem: Subsystem) {
            unsafe {
                match subsystem {
                    Subsystem::Core => libpostal_teardown(),
                    Subsystem::Parser => libpostal_teardown_parser(),
                    Subsystem::LanguageClassifier => libpostal_teardown_language_classifier(),
                }
            }
        }

        fn parser_default_options(&mut self) -> libpostal_address_parser_options_t {
            unsafe { libpostal_get_address_parser_default_options() }
        }

        fn expand_default_options(&mut self) -> libpostal_normalize_options_t {
            unsafe { libpostal_get_default_options() }
        }

        unsafe fn parse_address(
            &mut self,
            address: *mut c_char,
            options: libpostal_address_parser_options_t,
        ) -> *mut libpostal_address_parser_response_t {
            unsafe { libpostal_parse_address(address, options) }
        }

        unsafe fn parser_response_destroy(
            &mut self,
            response: *mut libpostal_address_parser_response_t,
        ) {
            unsafe { libpostal_address_parser_response_destroy(response) }
        }

        unsafe fn expand_address(
            &mut self,
            input: *mut c_char,
            options: libpostal_normalize_options_t,
            n: *mut size_t,
        ) -> *mut *mut c_char {
            unsafe { libpostal_expand_address(input, options, n) }
        }

        unsafe fn expansion_array_destroy(&mut self, expansions: *mut *mut c_char, n: size_t) {
            unsafe { libpostal_expansion_array_destroy(expansions, n) }
        }
    }
}
