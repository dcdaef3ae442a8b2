//! Copying native results into owned Rust values.
//!
//! Each native result is wrapped in a guard the moment it is returned. The
//! guard copies what the caller needs and hands the buffer back to the
//! provider when it drops, so release happens on every exit path and always
//! before the access gate is released.

use crate::error::Rejection;
use crate::ffi::libpostal_address_parser_response_t;
use crate::provider::Provider;
use crate::types::ParsedComponent;
use libc::{c_char, size_t};
use std::ffi::{CStr, CString};
use std::ptr::NonNull;

/// Check caller bytes and make the C copy handed to libpostal.
pub(crate) fn c_address(address: &[u8]) -> Result<CString, Rejection> {
    std::str::from_utf8(address).map_err(|_| Rejection::InvalidEncoding)?;
    CString::new(address).map_err(|_| Rejection::InteriorNul { field: "address" })
}

/// Owned copy of a possibly-null C string. Null becomes `""`, invalid UTF-8
/// is replaced lossily.
///
/// # Safety
///
/// `ptr` must be null or point at a NUL-terminated string.
pub(crate) unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Copy `len` strings out of a C array, preserving order.
///
/// # Safety
///
/// `array` must be null or point at `len` readable entries, each null or a
/// NUL-terminated string.
pub(crate) unsafe fn owned_strings(array: *const *mut c_char, len: usize) -> Vec<String> {
    if array.is_null() {
        return Vec::new();
    }
    (0..len)
        .map(|i| unsafe { owned_string(*array.add(i)) })
        .collect()
}

/// A live `libpostal_address_parser_response_t`.
pub(crate) struct ParserResponse<'a> {
    provider: &'a mut dyn Provider,
    response: NonNull<libpostal_address_parser_response_t>,
}

impl<'a> ParserResponse<'a> {
    /// Take ownership of a response. Returns `None` for a null response, in
    /// which case there is nothing to release.
    ///
    /// # Safety
    ///
    /// `response` must be null or freshly returned by `provider.parse_address`
    /// and not yet destroyed.
    pub(crate) unsafe fn from_raw(
        provider: &'a mut dyn Provider,
        response: *mut libpostal_address_parser_response_t,
    ) -> Option<Self> {
        NonNull::new(response).map(|response| Self { provider, response })
    }

    /// Copy the (label, value) pairs in libpostal's order.
    pub(crate) fn components(&self) -> Vec<ParsedComponent> {
        let response = unsafe { self.response.as_ref() };
        let count = response.num_components;
        if count == 0 || response.labels.is_null() || response.components.is_null() {
            return Vec::new();
        }

        let labels = unsafe { owned_strings(response.labels, count) };
        let values = unsafe { owned_strings(response.components, count) };
        labels
            .into_iter()
            .zip(values)
            .map(|(label, value)| ParsedComponent { label, value })
            .collect()
    }
}

impl Drop for ParserResponse<'_> {
    fn drop(&mut self) {
        unsafe { self.provider.parser_response_destroy(self.response.as_ptr()) }
    }
}

/// A live expansion array and the count libpostal reported with it.
pub(crate) struct ExpansionArray<'a> {
    provider: &'a mut dyn Provider,
    expansions: NonNull<*mut c_char>,
    len: size_t,
}

impl<'a> ExpansionArray<'a> {
    /// Take ownership of an expansion array. Returns `None` for a null array.
    ///
    /// # Safety
    ///
    /// `expansions` and `len` must be exactly what `provider.expand_address`
    /// returned, not yet destroyed.
    pub(crate) unsafe fn from_raw(
        provider: &'a mut dyn Provider,
        expansions: *mut *mut c_char,
        len: size_t,
    ) -> Option<Self> {
        NonNull::new(expansions).map(|expansions| Self {
            provider,
            expansions,
            len,
        })
    }

    /// Copy every expansion in libpostal's order.
    pub(crate) fn to_vec(&self) -> Vec<String> {
        unsafe { owned_strings(self.expansions.as_ptr(), self.len) }
    }
}

impl Drop for ExpansionArray<'_> {
    fn drop(&mut self) {
        unsafe {
            self.provider
                .expansion_array_destroy(self.expansions.as_ptr(), self.len)
        }
    }
}
