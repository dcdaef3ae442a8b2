//! Scripted provider used by the unit tests.
//!
//! Allocates every result with `libc` exactly as libpostal does, counts
//! calls and live allocations, and records any two native calls that overlap.

use crate::ffi::{
    LIBPOSTAL_ADDRESS_ENTRANCE, LIBPOSTAL_ADDRESS_HOUSE_NUMBER, LIBPOSTAL_ADDRESS_LEVEL,
    LIBPOSTAL_ADDRESS_NAME, LIBPOSTAL_ADDRESS_PO_BOX, LIBPOSTAL_ADDRESS_POSTAL_CODE,
    LIBPOSTAL_ADDRESS_STAIRCASE, LIBPOSTAL_ADDRESS_STREET, LIBPOSTAL_ADDRESS_UNIT,
    libpostal_address_parser_options_t, libpostal_address_parser_response_t,
    libpostal_normalize_options_t,
};
use crate::marshal::{owned_string, owned_strings};
use crate::options::ExpandOptions;
use crate::provider::{Provider, Subsystem};
use crate::{Postal, PostalConfig};
use libc::{c_char, size_t};
use parking_lot::Mutex;
use std::ffi::CStr;
use std::mem::size_of;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// libpostal's compiled-in `libpostal_get_default_options()`.
pub(crate) fn default_normalize_options() -> libpostal_normalize_options_t {
    libpostal_normalize_options_t {
        languages: ptr::null_mut(),
        num_languages: 0,
        address_components: LIBPOSTAL_ADDRESS_NAME
            | LIBPOSTAL_ADDRESS_HOUSE_NUMBER
            | LIBPOSTAL_ADDRESS_STREET
            | LIBPOSTAL_ADDRESS_PO_BOX
            | LIBPOSTAL_ADDRESS_UNIT
            | LIBPOSTAL_ADDRESS_LEVEL
            | LIBPOSTAL_ADDRESS_ENTRANCE
            | LIBPOSTAL_ADDRESS_STAIRCASE
            | LIBPOSTAL_ADDRESS_POSTAL_CODE,
        latin_ascii: true,
        transliterate: true,
        strip_accents: true,
        decompose: true,
        lowercase: true,
        trim_string: true,
        replace_word_hyphens: true,
        delete_word_hyphens: true,
        replace_numeric_hyphens: false,
        delete_numeric_hyphens: false,
        split_alpha_from_numeric: true,
        delete_final_periods: true,
        delete_acronym_periods: true,
        drop_english_possessives: true,
        delete_apostrophes: true,
        expand_numex: true,
        roman_numerals: true,
    }
}

/// Allocate an untracked C string array for tests that build input by hand.
pub(crate) fn c_string_array(items: &[Option<&str>]) -> *mut *mut c_char {
    unsafe {
        let array = libc::calloc(items.len().max(1), size_of::<*mut c_char>()) as *mut *mut c_char;
        assert!(!array.is_null());
        for (i, item) in items.iter().enumerate() {
            *array.add(i) = item.map_or(ptr::null_mut(), malloc_c_string);
        }
        array
    }
}

/// Free an array built by [`c_string_array`].
pub(crate) unsafe fn free_c_string_array(array: *mut *mut c_char, len: usize) {
    unsafe {
        for i in 0..len {
            libc::free(*array.add(i) as *mut libc::c_void);
        }
        libc::free(array as *mut libc::c_void);
    }
}

fn malloc_c_string(s: &str) -> *mut c_char {
    let bytes = s.as_bytes();
    unsafe {
        let ptr = libc::malloc(bytes.len() + 1) as *mut c_char;
        assert!(!ptr.is_null());
        ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, ptr, bytes.len());
        *ptr.add(bytes.len()) = 0;
        ptr
    }
}

/// What the scripted provider observed.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    setups: Mutex<Vec<Subsystem>>,
    teardowns: Mutex<Vec<Subsystem>>,
    data_dirs: Mutex<Vec<Option<Vec<u8>>>>,
    parse_hints: Mutex<Vec<(Option<String>, Option<String>)>>,
    expand_options: Mutex<Vec<ExpandOptions>>,
    expansion_destroys: Mutex<Vec<usize>>,
    parse_calls: AtomicUsize,
    expand_calls: AtomicUsize,
    response_destroys: AtomicUsize,
    live_allocations: AtomicUsize,
    overlaps: AtomicUsize,
    busy: AtomicBool,
}

impl Stats {
    pub(crate) fn setups(&self) -> Vec<Subsystem> {
        self.setups.lock().clone()
    }

    pub(crate) fn teardowns(&self) -> Vec<Subsystem> {
        self.teardowns.lock().clone()
    }

    pub(crate) fn data_dirs(&self) -> Vec<Option<Vec<u8>>> {
        self.data_dirs.lock().clone()
    }

    pub(crate) fn parse_hints(&self) -> Vec<(Option<String>, Option<String>)> {
        self.parse_hints.lock().clone()
    }

    pub(crate) fn expand_options(&self) -> Vec<ExpandOptions> {
        self.expand_options.lock().clone()
    }

    pub(crate) fn expansion_destroys(&self) -> Vec<usize> {
        self.expansion_destroys.lock().clone()
    }

    pub(crate) fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn native_calls(&self) -> usize {
        self.parse_calls() + self.expand_calls()
    }

    pub(crate) fn response_destroys(&self) -> usize {
        self.response_destroys.load(Ordering::SeqCst)
    }

    pub(crate) fn live_allocations(&self) -> usize {
        self.live_allocations.load(Ordering::SeqCst)
    }

    pub(crate) fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        // widen the window for a racing caller
        std::thread::yield_now();
    }

    fn leave(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Deterministic stand-in for libpostal.
///
/// Parsing splits on whitespace: a leading number is a `house_number`, any
/// five-digit token a `postcode`, everything else `road`. Expansion returns
/// the input after the lowercase and final-period rules, then one variant
/// per requested language tagged with that language. Empty input yields a
/// null result from both operations.
#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    stats: Arc<Stats>,
    failing: Option<Subsystem>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            stats: Arc::new(Stats::default()),
            failing: None,
        }
    }

    /// Make setup of `subsystem` report failure.
    pub(crate) fn failing(mut self, subsystem: Subsystem) -> Self {
        self.failing = Some(subsystem);
        self
    }

    pub(crate) fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    fn alloc_string(&self, s: &str) -> *mut c_char {
        self.stats.live_allocations.fetch_add(1, Ordering::SeqCst);
        malloc_c_string(s)
    }

    fn alloc_array(&self, items: &[String]) -> *mut *mut c_char {
        unsafe {
            let array =
                libc::calloc(items.len().max(1), size_of::<*mut c_char>()) as *mut *mut c_char;
            assert!(!array.is_null());
            self.stats.live_allocations.fetch_add(1, Ordering::SeqCst);
            for (i, item) in items.iter().enumerate() {
                *array.add(i) = self.alloc_string(item);
            }
            array
        }
    }

    unsafe fn free_array(&self, array: *mut *mut c_char, len: usize) {
        unsafe {
            for i in 0..len {
                let item = *array.add(i);
                if !item.is_null() {
                    libc::free(item as *mut libc::c_void);
                    self.stats.live_allocations.fetch_sub(1, Ordering::SeqCst);
                }
            }
            libc::free(array as *mut libc::c_void);
        }
        self.stats.live_allocations.fetch_sub(1, Ordering::SeqCst);
    }

    fn label(index: usize, token: &str) -> &'static str {
        let numeric = !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());
        match (index, numeric, token.len()) {
            (_, true, 5) => "postcode",
            (0, true, _) => "house_number",
            _ => "road",
        }
    }

    fn expand_text(address: &str, options: &ExpandOptions) -> Vec<String> {
        let mut base = address.trim().to_string();
        if options.lowercase {
            base = base.to_lowercase();
        }
        if options.delete_final_periods {
            base = base
                .split_whitespace()
                .map(|word| word.trim_end_matches('.'))
                .collect::<Vec<_>>()
                .join(" ");
        }

        let mut variants = vec![base.clone()];
        variants.extend(options.languages.iter().map(|language| format!("{base} [{language}]")));
        variants
    }
}

impl Provider for ScriptedProvider {
    fn setup(&mut self, subsystem: Subsystem, data_dir: Option<&CStr>) -> bool {
        self.stats.setups.lock().push(subsystem);
        self.stats
            .data_dirs
            .lock()
            .push(data_dir.map(|dir| dir.to_bytes().to_vec()));
        self.failing != Some(subsystem)
    }

    fn teardown(&mut self, subsystem: Subsystem) {
        self.stats.teardowns.lock().push(subsystem);
    }

    fn parser_default_options(&mut self) -> libpostal_address_parser_options_t {
        libpostal_address_parser_options_t {
            language: ptr::null_mut(),
            country: ptr::null_mut(),
        }
    }

    fn expand_default_options(&mut self) -> libpostal_normalize_options_t {
        default_normalize_options()
    }

    unsafe fn parse_address(
        &mut self,
        address: *mut c_char,
        options: libpostal_address_parser_options_t,
    ) -> *mut libpostal_address_parser_response_t {
        self.stats.enter();
        self.stats.parse_calls.fetch_add(1, Ordering::SeqCst);

        let address = unsafe { owned_string(address) };
        let hints = unsafe {
            (
                (!options.language.is_null()).then(|| owned_string(options.language)),
                (!options.country.is_null()).then(|| owned_string(options.country)),
            )
        };
        self.stats.parse_hints.lock().push(hints);

        let tokens: Vec<String> = address
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            self.stats.leave();
            return ptr::null_mut();
        }

        let labels: Vec<String> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| Self::label(i, token).to_string())
            .collect();

        let response = unsafe {
            let response = libc::malloc(size_of::<libpostal_address_parser_response_t>())
                as *mut libpostal_address_parser_response_t;
            assert!(!response.is_null());
            ptr::write(
                response,
                libpostal_address_parser_response_t {
                    num_components: tokens.len(),
                    components: self.alloc_array(&tokens),
                    labels: self.alloc_array(&labels),
                },
            );
            response
        };
        self.stats.live_allocations.fetch_add(1, Ordering::SeqCst);
        self.stats.leave();
        response
    }

    unsafe fn parser_response_destroy(
        &mut self,
        response: *mut libpostal_address_parser_response_t,
    ) {
        self.stats.response_destroys.fetch_add(1, Ordering::SeqCst);
        unsafe {
            let owned = ptr::read(response);
            self.free_array(owned.components, owned.num_components);
            self.free_array(owned.labels, owned.num_components);
            libc::free(response as *mut libc::c_void);
        }
        self.stats.live_allocations.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe fn expand_address(
        &mut self,
        input: *mut c_char,
        options: libpostal_normalize_options_t,
        n: *mut size_t,
    ) -> *mut *mut c_char {
        self.stats.enter();
        self.stats.expand_calls.fetch_add(1, Ordering::SeqCst);

        let input = unsafe { owned_string(input) };
        let languages = unsafe { owned_strings(options.languages, options.num_languages) };
        let observed = ExpandOptions::from_raw(&options).with_languages(languages);
        self.stats.expand_options.lock().push(observed.clone());

        if input.trim().is_empty() {
            unsafe { *n = 0 };
            self.stats.leave();
            return ptr::null_mut();
        }

        let variants = Self::expand_text(&input, &observed);
        unsafe { *n = variants.len() };
        let array = self.alloc_array(&variants);
        self.stats.leave();
        array
    }

    unsafe fn expansion_array_destroy(&mut self, expansions: *mut *mut c_char, n: size_t) {
        self.stats.expansion_destroys.lock().push(n);
        unsafe { self.free_array(expansions, n) };
    }
}

/// A context over a fresh [`ScriptedProvider`], plus its stats.
pub(crate) fn scripted() -> (Postal, Arc<Stats>) {
    let provider = ScriptedProvider::new();
    let stats = provider.stats();
    let config = PostalConfig::builder().compiled_data_dir().build();
    let postal = Postal::with_provider(provider, config).expect("scripted provider loads");
    (postal, stats)
}
