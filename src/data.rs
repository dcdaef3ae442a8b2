//! Data directory resolution and checks for libpostal.

use crate::error::{Error, Result};
use crate::provider::Subsystem;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that points at an explicit data directory.
pub const DATA_DIR_ENV: &str = "LIBPOSTAL_DATA_DIR";

const CORE_FILES: &[&str] = &[
    "address_expansions/address_dictionary.dat",
    "numex/numex.dat",
    "transliteration/transliteration.dat",
];

const PARSER_FILES: &[&str] = &[
    "address_parser/address_parser_crf.dat",
    "address_parser/address_parser_phrases.dat",
    "address_parser/address_parser_postal_codes.dat",
    "address_parser/address_parser_vocab.trie",
];

const CLASSIFIER_FILES: &[&str] = &["language_classifier/language_classifier.dat"];

/// Expected file layout of a libpostal data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Describe the data directory rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The directory being described.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files, relative to the root, that a subsystem loads.
    pub fn required_files(subsystem: Subsystem) -> &'static [&'static str] {
        match subsystem {
            Subsystem::Core => CORE_FILES,
            Subsystem::Parser => PARSER_FILES,
            Subsystem::LanguageClassifier => CLASSIFIER_FILES,
        }
    }

    /// Check that every file a subsystem needs exists and is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataDir`] if the root is not a directory,
    /// [`Error::MissingData`] naming the first absent or empty file, or
    /// [`Error::IoError`] if a file cannot be inspected.
    pub fn verify(&self, subsystem: Subsystem) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::invalid_data_dir(&self.root));
        }

        for file in Self::required_files(subsystem) {
            let path = self.root.join(file);
            let populated = match std::fs::metadata(&path) {
                Ok(metadata) => metadata.is_file() && metadata.len() > 0,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            };

            if !populated {
                return Err(Error::missing_data(subsystem, path));
            }
        }

        debug!(%subsystem, root = %self.root.display(), "libpostal data present");
        Ok(())
    }

    /// Whether every subsystem's files are in place.
    pub fn is_complete(&self) -> bool {
        Subsystem::ALL
            .into_iter()
            .all(|subsystem| self.verify(subsystem).is_ok())
    }
}

/// Get the default data directory for libpostal.
///
/// `LIBPOSTAL_DATA_DIR` wins when it names an existing directory, then the
/// per-user data directory (`~/.local/share/libpostal` on Linux). `None`
/// means libpostal should use the directory it was compiled with.
pub fn default_data_dir() -> Option<PathBuf> {
    if let Some(env_data_dir) = std::env::var_os(DATA_DIR_ENV) {
        let path = PathBuf::from(env_data_dir);
        if path.is_dir() {
            return Some(path);
        }
        debug!(path = %path.display(), "{DATA_DIR_ENV} does not name a directory, ignoring");
    }

    dirs::data_dir()
        .map(|dir| dir.join("libpostal"))
        .filter(|dir| dir.is_dir())
}
