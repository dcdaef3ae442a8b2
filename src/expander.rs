//! Address expansion functionality.

use crate::Postal;
use crate::error::Rejection;
use crate::marshal::{self, ExpansionArray};
use crate::options::{ExpandOptions, LanguageArray};
use crate::types::AddressComponents;
use libc::c_char;
use tracing::{debug, trace};

impl Postal {
    /// Expand an address into its normalized variants.
    ///
    /// Every flag and the component mask in `options` are applied. An empty
    /// `languages` list lets libpostal detect the language; otherwise only
    /// the given languages are used, in order.
    ///
    /// Returns `None` only for input that cannot be handed to libpostal
    /// (invalid UTF-8, NUL bytes). An address with no expansions yields an
    /// empty `Vec`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use postal_facade::{ExpandOptions, Postal};
    ///
    /// let postal = Postal::new()?;
    /// let options = ExpandOptions {
    ///     languages: vec!["en".to_string()],
    ///     ..postal.default_expand_options().clone()
    /// };
    /// let variants = postal.expand_address("St. John's Rd.", &options).unwrap_or_default();
    /// # Ok::<(), postal_facade::Error>(())
    /// ```
    pub fn expand_address(
        &self,
        address: impl AsRef<[u8]>,
        options: &ExpandOptions,
    ) -> Option<Vec<String>> {
        self.try_expand_address(address, options).ok()
    }

    /// Expand with the defaults read at startup.
    pub fn expand(&self, address: impl AsRef<[u8]>) -> Option<Vec<String>> {
        self.expand_address(address, &self.expand_defaults)
    }

    /// Like [`Postal::expand_address`], but says why nothing came back.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::InvalidEncoding`] or [`Rejection::InteriorNul`]
    /// without calling libpostal. Never returns [`Rejection::ProviderMiss`]:
    /// a null expansion array is an empty result.
    pub fn try_expand_address(
        &self,
        address: impl AsRef<[u8]>,
        options: &ExpandOptions,
    ) -> Result<Vec<String>, Rejection> {
        let c_address = marshal::c_address(address.as_ref()).inspect_err(|rejection| {
            debug!(%rejection, "Rejected address before expansion");
        })?;
        let mut languages = LanguageArray::new(&options.languages)?;

        let mut handle = self.gate.lock();
        let provider = handle.provider();

        let mut raw_options = provider.expand_default_options();
        options.apply(&mut raw_options, &mut languages);

        let mut count = 0;
        let raw = unsafe {
            provider.expand_address(c_address.as_ptr() as *mut c_char, raw_options, &mut count)
        };
        let Some(expansions) = (unsafe { ExpansionArray::from_raw(provider, raw, count) }) else {
            debug!("libpostal returned no expansion array");
            return Ok(Vec::new());
        };

        let variants = expansions.to_vec();
        trace!(
            count = variants.len(),
            languages = languages.len(),
            "Expanded address"
        );
        Ok(variants)
    }
}

/// Address expander holding a full set of [`ExpandOptions`].
#[derive(Debug, Clone)]
pub struct AddressExpander<'a> {
    postal: &'a Postal,
    options: ExpandOptions,
}

impl<'a> AddressExpander<'a> {
    /// Create a new expander with the context's default options.
    pub fn new(postal: &'a Postal) -> Self {
        Self {
            postal,
            options: postal.default_expand_options().clone(),
        }
    }

    /// Set languages for expansion, highest priority first.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.with_languages(languages);
        self
    }

    /// Set which address components are expanded.
    pub fn with_address_components(mut self, components: AddressComponents) -> Self {
        self.options.address_components = components;
        self
    }

    /// Replace all options.
    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    /// Adjust individual flags.
    ///
    /// ```rust,ignore
    /// let expander = postal.expander().configure(|o| {
    ///     o.lowercase = false;
    ///     o.expand_numex = false;
    /// });
    /// ```
    pub fn configure(mut self, f: impl FnOnce(&mut ExpandOptions)) -> Self {
        f(&mut self.options);
        self
    }

    /// The options this expander sends.
    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expand an address string.
    pub fn expand(&self, address: impl AsRef<[u8]>) -> Option<Vec<String>> {
        self.postal.expand_address(address, &self.options)
    }

    /// Expand multiple addresses, one result per input in input order.
    pub fn expand_batch<A: AsRef<[u8]>>(&self, addresses: &[A]) -> Vec<Option<Vec<String>>> {
        addresses.iter().map(|address| self.expand(address)).collect()
    }

    /// Expand multiple addresses from rayon's worker threads.
    ///
    /// Results are in input order and equal those of
    /// [`AddressExpander::expand_batch`].
    #[cfg(feature = "parallel")]
    pub fn expand_batch_parallel<A>(&self, addresses: &[A]) -> Vec<Option<Vec<String>>>
    where
        A: AsRef<[u8]> + Sync,
    {
        use rayon::prelude::*;

        addresses
            .par_iter()
            .map(|address| self.expand(address))
            .collect()
    }
}
