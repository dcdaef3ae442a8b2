//! Address parsing functionality.

use crate::Postal;
use crate::error::Rejection;
use crate::marshal::{self, ParserResponse};
use crate::options::{ParserHints, ParserOptions};
use crate::types::{ParsedAddress, ParsedComponent};
use libc::c_char;
use tracing::{debug, trace};

impl Postal {
    /// Parse an address into ordered, labeled components.
    ///
    /// Returns `None` when the address is not valid UTF-8, when it or a hint
    /// contains a NUL byte, or when libpostal has no answer. Use
    /// [`Postal::try_parse_address`] to find out which.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use postal_facade::{ParserOptions, Postal};
    ///
    /// let postal = Postal::new()?;
    /// let options = ParserOptions::default().with_country("us");
    /// let components = postal.parse_address("781 Franklin Ave Brooklyn NY", &options);
    /// # Ok::<(), postal_facade::Error>(())
    /// ```
    pub fn parse_address(
        &self,
        address: impl AsRef<[u8]>,
        options: &ParserOptions,
    ) -> Option<Vec<ParsedComponent>> {
        self.try_parse_address(address, options).ok()
    }

    /// Parse with libpostal's default options.
    pub fn parse(&self, address: impl AsRef<[u8]>) -> Option<Vec<ParsedComponent>> {
        self.parse_address(address, &ParserOptions::default())
    }

    /// Like [`Postal::parse_address`], but says why nothing came back.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] for invalid input or a null libpostal response.
    /// Input is checked before the lock is taken, so a rejected address never
    /// reaches libpostal.
    pub fn try_parse_address(
        &self,
        address: impl AsRef<[u8]>,
        options: &ParserOptions,
    ) -> Result<Vec<ParsedComponent>, Rejection> {
        let c_address = marshal::c_address(address.as_ref()).inspect_err(|rejection| {
            debug!(%rejection, "Rejected address before parsing");
        })?;
        let hints = ParserHints::new(options)?;

        let mut handle = self.gate.lock();
        let provider = handle.provider();

        let mut raw_options = provider.parser_default_options();
        hints.apply(&mut raw_options);

        let raw = unsafe { provider.parse_address(c_address.as_ptr() as *mut c_char, raw_options) };
        let Some(response) = (unsafe { ParserResponse::from_raw(provider, raw) }) else {
            debug!("libpostal returned no parse response");
            return Err(Rejection::ProviderMiss);
        };

        let components = response.components();
        trace!(count = components.len(), "Parsed address");
        Ok(components)
    }
}

/// Address parser holding language and country hints.
#[derive(Debug, Clone)]
pub struct AddressParser<'a> {
    postal: &'a Postal,
    options: ParserOptions,
}

impl<'a> AddressParser<'a> {
    /// Create a new parser with default options.
    pub fn new(postal: &'a Postal) -> Self {
        Self {
            postal,
            options: ParserOptions::default(),
        }
    }

    /// Set language hint for parsing.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.options.language = Some(language.into());
        self
    }

    /// Set country hint for parsing.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.options.country = Some(country.into());
        self
    }

    /// Replace all hints.
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// The hints this parser sends.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse an address string into ordered components.
    pub fn parse(&self, address: impl AsRef<[u8]>) -> Option<Vec<ParsedComponent>> {
        self.postal.parse_address(address, &self.options)
    }

    /// Parse an address and group the components by label.
    pub fn parse_structured(&self, address: impl AsRef<[u8]>) -> Option<ParsedAddress> {
        self.parse(address)
            .map(|components| ParsedAddress::from_components(&components))
    }

    /// Parse multiple addresses, one result per input in input order.
    pub fn parse_batch<A: AsRef<[u8]>>(
        &self,
        addresses: &[A],
    ) -> Vec<Option<Vec<ParsedComponent>>> {
        addresses.iter().map(|address| self.parse(address)).collect()
    }

    /// Parse multiple addresses from rayon's worker threads.
    ///
    /// Every call still goes through the context's lock, so this only helps
    /// when callers do other work per address. Results are in input order
    /// and equal those of [`AddressParser::parse_batch`].
    #[cfg(feature = "parallel")]
    pub fn parse_batch_parallel<A>(&self, addresses: &[A]) -> Vec<Option<Vec<ParsedComponent>>>
    where
        A: AsRef<[u8]> + Sync,
    {
        use rayon::prelude::*;

        addresses
            .par_iter()
            .map(|address| self.parse(address))
            .collect()
    }
}
