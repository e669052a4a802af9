//! Base translation catalog collaborator.
//!
//! The catalog owns the application's default messages. This crate only reads
//! from it and asks it to reload resource files through a [`CatalogHandle`].

mod yaml;

use std::collections::BTreeSet;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
    RwLockReadGuard,
    RwLockWriteGuard,
};

use thiserror::Error;

use crate::tree::{
    MessageMap,
    TreeShapeError,
};

pub use yaml::YamlCatalog;

/// Errors raised while discovering or reading translation resources.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read translation file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse translation file {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Translation file {path:?} must map language identifiers to messages")]
    NotAMapping { path: PathBuf },

    #[error("Translation file {path:?} has an unsupported value: {source}")]
    Shape {
        path: PathBuf,
        #[source]
        source: TreeShapeError,
    },

    #[error("Invalid translation file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Language identifiers recognized by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageSet(BTreeSet<String>);

impl LanguageSet {
    #[must_use]
    pub fn new(languages: impl IntoIterator<Item = String>) -> Self {
        Self(languages.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, language: &str) -> bool {
        self.0.contains(language)
    }

    /// Returns `language` if it is recognized.
    #[must_use]
    pub fn find_language<'a>(&self, language: &'a str) -> Option<&'a str> {
        (!language.is_empty() && self.contains(language)).then_some(language)
    }

    /// Keeps the recognized identifiers, in input order.
    #[must_use]
    pub fn find_languages<'a>(&self, languages: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        languages
            .into_iter()
            .filter_map(|language| self.find_language(language))
            .map(str::to_string)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Language a locale file belongs to, from its file stem
/// (`en` for `config/locales/en.yml`).
pub(crate) fn language_of(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().to_string())
}

/// Source of the base translation messages.
pub trait TranslationCatalog {
    /// Languages the catalog can serve.
    fn available_languages(&self) -> LanguageSet;

    /// Loaded message table for `language`, if any.
    fn translations_for(&self, language: &str) -> Option<MessageMap>;

    /// All known resource file locations (the load path).
    fn resource_paths(&self) -> Vec<PathBuf>;

    /// (Re)loads the given resource files into the in-memory tables.
    ///
    /// Loading is best effort; the returned list holds the paths that were
    /// actually loaded.
    ///
    /// # Errors
    /// Implementations may fail as a whole, e.g. when their backing storage
    /// is unreachable.
    fn load_resources(&mut self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, CatalogError>;
}

/// Shared handle to a catalog owned by the translation subsystem.
#[derive(Debug)]
pub struct CatalogHandle<C> {
    /// 共有カタログ
    inner: Arc<RwLock<C>>,
}

impl<C> Clone for CatalogHandle<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: TranslationCatalog> CatalogHandle<C> {
    pub fn new(catalog: C) -> Self {
        Self { inner: Arc::new(RwLock::new(catalog)) }
    }

    /// Read access to the catalog.
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the catalog, used for reloads.
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
