//! Option types and their translation to libpostal's C structs.

use crate::error::Rejection;
use crate::ffi::{libpostal_address_parser_options_t, libpostal_normalize_options_t};
use crate::types::AddressComponents;
use libc::c_char;
use std::ffi::CString;
use std::ptr;

/// Language and country hints for parsing.
///
/// `None` and an empty string both defer to libpostal's own default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserOptions {
    /// Language hint, e.g. `"en"`
    pub language: Option<String>,
    /// Country hint, e.g. `"us"`
    pub country: Option<String>,
}

impl ParserOptions {
    /// Set the language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the country hint.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// C copies of the parser hints, kept alive for the duration of a call.
#[derive(Debug)]
pub(crate) struct ParserHints {
    language: Option<CString>,
    country: Option<CString>,
}

impl ParserHints {
    pub(crate) fn new(options: &ParserOptions) -> Result<Self, Rejection> {
        Ok(Self {
            language: hint(options.language.as_deref(), "language")?,
            country: hint(options.country.as_deref(), "country")?,
        })
    }

    /// Overlay the hints that are set onto libpostal's defaults.
    pub(crate) fn apply(&self, raw: &mut libpostal_address_parser_options_t) {
        if let Some(language) = &self.language {
            raw.language = language.as_ptr() as *mut c_char;
        }
        if let Some(country) = &self.country {
            raw.country = country.as_ptr() as *mut c_char;
        }
    }
}

fn hint(value: Option<&str>, field: &'static str) -> Result<Option<CString>, Rejection> {
    match value {
        None | Some("") => Ok(None),
        Some(value) => CString::new(value)
            .map(Some)
            .map_err(|_| Rejection::InteriorNul { field }),
    }
}

macro_rules! expand_options {
    ($($(#[$doc:meta])* $field:ident),+ $(,)?) => {
        /// Normalization settings for address expansion.
        ///
        /// Start from [`Postal::default_expand_options`](crate::Postal::default_expand_options)
        /// and override what you need:
        ///
        /// ```rust,ignore
        /// let options = ExpandOptions {
        ///     languages: vec!["en".to_string()],
        ///     expand_numex: true,
        ///     ..postal.default_expand_options().clone()
        /// };
        /// ```
        #[derive(Debug, Clone, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct ExpandOptions {
            /// Languages to expand in, highest priority first. Empty means
            /// libpostal detects the language itself.
            pub languages: Vec<String>,
            /// Which component categories to expand
            pub address_components: AddressComponents,
            $($(#[$doc])* pub $field: bool,)+
        }

        impl ExpandOptions {
            /// Copy libpostal's scalar defaults. The language list starts empty.
            pub(crate) fn from_raw(raw: &libpostal_normalize_options_t) -> Self {
                Self {
                    languages: Vec::new(),
                    address_components: AddressComponents::from(raw.address_components),
                    $($field: raw.$field,)+
                }
            }

            /// Overwrite every scalar on `raw` and point it at `languages`.
            ///
            /// `raw` borrows from `languages` and must not outlive it.
            pub(crate) fn apply(
                &self,
                raw: &mut libpostal_normalize_options_t,
                languages: &mut LanguageArray,
            ) {
                raw.address_components = self.address_components.bits();
                $(raw.$field = self.$field;)+
                languages.apply(raw);
            }
        }
    };
}

expand_options! {
    /// Transliterate to Latin ASCII
    latin_ascii,
    /// Transliterate non-Latin scripts
    transliterate,
    /// Remove accents
    strip_accents,
    /// Unicode NFD decomposition
    decompose,
    /// Lowercase
    lowercase,
    /// Trim surrounding whitespace
    trim_string,
    /// Replace hyphens between words with spaces
    replace_word_hyphens,
    /// Remove hyphens between words
    delete_word_hyphens,
    /// Replace hyphens between numbers with spaces
    replace_numeric_hyphens,
    /// Remove hyphens between numbers
    delete_numeric_hyphens,
    /// Split "4B" into "4 B"
    split_alpha_from_numeric,
    /// Remove a trailing period
    delete_final_periods,
    /// Remove periods in acronyms ("U.S." to "US")
    delete_acronym_periods,
    /// Drop "'s" possessives in English
    drop_english_possessives,
    /// Remove apostrophes
    delete_apostrophes,
    /// Expand numeric expressions ("twenty" to "20")
    expand_numex,
    /// Treat Roman numerals as numbers
    roman_numerals,
}

impl ExpandOptions {
    /// Replace the language list.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the component mask.
    pub fn with_address_components(mut self, components: AddressComponents) -> Self {
        self.address_components = components;
        self
    }
}

/// A NULL-free C array of language codes owned by Rust.
///
/// libpostal only reads the array during `libpostal_expand_address`; it is
/// released when this value drops.
#[derive(Debug)]
pub(crate) struct LanguageArray {
    strings: Vec<CString>,
    pointers: Vec<*mut c_char>,
}

impl LanguageArray {
    pub(crate) fn new(languages: &[String]) -> Result<Self, Rejection> {
        let strings = languages
            .iter()
            .map(|language| {
                CString::new(language.as_str())
                    .map_err(|_| Rejection::InteriorNul { field: "languages" })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pointers = strings
            .iter()
            .map(|language| language.as_ptr() as *mut c_char)
            .collect();
        Ok(Self { strings, pointers })
    }

    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }

    fn apply(&mut self, raw: &mut libpostal_normalize_options_t) {
        if self.pointers.is_empty() {
            raw.languages = ptr::null_mut();
            raw.num_languages = 0;
        } else {
            raw.languages = self.pointers.as_mut_ptr();
            raw.num_languages = self.pointers.len();
        }
    }
}
