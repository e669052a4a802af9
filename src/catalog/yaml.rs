//! File-backed translation catalog.
//!
//! Locale files are YAML documents whose top-level keys are language
//! identifiers (`en: { label_x: ... }`). Files are discovered under a
//! workspace root with glob patterns; the file stem (`en` for
//! `config/locales/en.yml`) names the language a file belongs to.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;

use super::{
    CatalogError,
    LanguageSet,
    TranslationCatalog,
    language_of,
};
use crate::config::TranslationFilesConfig;
use crate::tree::{
    MessageMap,
    MessageTree,
    deep_merge,
};

/// Translation catalog backed by YAML locale files.
#[derive(Debug, Clone, Default)]
pub struct YamlCatalog {
    /// Known locale files, in load order.
    load_path: Vec<PathBuf>,
    /// Languages from configuration; `None` derives them from file stems.
    configured_languages: Option<LanguageSet>,
    /// Loaded tables, keyed by language.
    tables: BTreeMap<String, MessageMap>,
}

impl YamlCatalog {
    /// Creates a catalog over an explicit load path. Nothing is loaded yet.
    #[must_use]
    pub fn new(load_path: Vec<PathBuf>, available_languages: Option<Vec<String>>) -> Self {
        Self {
            load_path,
            configured_languages: available_languages.map(LanguageSet::new),
            tables: BTreeMap::new(),
        }
    }

    /// Discovers locale files under `root`. Nothing is loaded yet.
    ///
    /// # Errors
    /// Returns an error if a glob pattern is invalid.
    pub fn discover(
        root: &Path,
        files: &TranslationFilesConfig,
        available_languages: Option<Vec<String>>,
    ) -> Result<Self, CatalogError> {
        tracing::debug!(root = %root.display(), "Discovering translation files");
        let load_path =
            find_translation_files(root, &files.include_patterns, &files.exclude_patterns)?;
        tracing::debug!("Found {} translation files", load_path.len());
        Ok(Self::new(load_path, available_languages))
    }

    /// Loads every file on the load path.
    ///
    /// # Errors
    /// Never fails as a whole; unreadable files are skipped.
    pub fn load_all(&mut self) -> Result<Vec<PathBuf>, CatalogError> {
        let paths = self.load_path.clone();
        self.load_resources(&paths)
    }

    #[must_use]
    pub fn load_path(&self) -> &[PathBuf] {
        &self.load_path
    }
}

impl TranslationCatalog for YamlCatalog {
    fn available_languages(&self) -> LanguageSet {
        self.configured_languages.clone().unwrap_or_else(|| {
            LanguageSet::new(self.load_path.iter().filter_map(|path| language_of(path)))
        })
    }

    fn translations_for(&self, language: &str) -> Option<MessageMap> {
        self.tables.get(language).cloned()
    }

    fn resource_paths(&self) -> Vec<PathBuf> {
        self.load_path.clone()
    }

    fn load_resources(&mut self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, CatalogError> {
        let mut loaded = Vec::new();

        for path in paths {
            let document = match load_file(path) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Skipping translation file: {e}");
                    continue;
                }
            };

            for (language, messages) in document {
                let MessageTree::Node(messages) = messages else {
                    tracing::warn!(
                        path = %path.display(),
                        %language,
                        "Ignoring language entry that is not a mapping"
                    );
                    continue;
                };
                deep_merge(self.tables.entry(language).or_default(), messages);
            }

            loaded.push(path.clone());
        }

        tracing::debug!("Loaded {} of {} translation files", loaded.len(), paths.len());
        Ok(loaded)
    }
}

/// Reads one locale file into a language → messages mapping.
fn load_file(path: &Path) -> Result<MessageMap, CatalogError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;

    let value: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|source| CatalogError::Yaml { path: path.to_path_buf(), source })?;

    if value.is_null() {
        return Ok(MessageMap::new());
    }

    match MessageTree::from_yaml(&value)
        .map_err(|source| CatalogError::Shape { path: path.to_path_buf(), source })?
    {
        MessageTree::Node(document) => Ok(document),
        MessageTree::Leaf(_) => Err(CatalogError::NotAMapping { path: path.to_path_buf() }),
    }
}

/// Builds a glob set from `patterns`.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet, CatalogError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| CatalogError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Finds locale files under `root` matching `include_patterns` but not
/// `exclude_patterns` (both relative to `root`). Results are sorted.
fn find_translation_files(
    root: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>, CatalogError> {
    let include_set = build_glob_set(include_patterns)?;
    let exclude_set = build_glob_set(exclude_patterns)?;

    let mut found_files = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        if !include_set.is_match(relative_path) || exclude_set.is_match(relative_path) {
            continue;
        }

        found_files.push(path.to_path_buf());
    }

    found_files.sort();
    Ok(found_files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::{
        map,
        node,
        text,
    };

    /// `config/locales` 配下にロケールファイルを書き出す
    fn write_locale(root: &Path, name: &str, content: &str) -> PathBuf {
        let dir = root.join("config/locales");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn default_files() -> TranslationFilesConfig {
        TranslationFilesConfig::default()
    }

    #[googletest::test]
    fn discover_finds_locale_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        write_locale(temp_dir.path(), "fr.yml", "fr: {}\n");
        write_locale(temp_dir.path(), "en.yml", "en: {}\n");
        fs::write(temp_dir.path().join("README.md"), "readme").unwrap();

        let catalog = YamlCatalog::discover(temp_dir.path(), &default_files(), None).unwrap();

        let names: Vec<String> =
            catalog.load_path().iter().filter_map(|path| language_of(path)).collect();
        expect_that!(names, elements_are![eq("en"), eq("fr")]);
    }

    #[googletest::test]
    fn discover_respects_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        write_locale(temp_dir.path(), "en.yml", "en: {}\n");
        let vendored = temp_dir.path().join("node_modules/pkg/config/locales");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(vendored.join("de.yml"), "de: {}\n").unwrap();

        let catalog = YamlCatalog::discover(temp_dir.path(), &default_files(), None).unwrap();

        expect_that!(catalog.load_path(), len(eq(1)));
    }

    #[googletest::test]
    fn discover_rejects_invalid_pattern() {
        let temp_dir = TempDir::new().unwrap();
        let files = TranslationFilesConfig {
            include_patterns: vec!["**/{locales".to_string()],
            exclude_patterns: vec![],
        };

        let result = YamlCatalog::discover(temp_dir.path(), &files, None);

        expect_that!(
            result,
            err(displays_as(contains_substring("Invalid translation file pattern")))
        );
    }

    #[googletest::test]
    fn available_languages_from_file_stems() {
        let catalog = YamlCatalog::new(
            vec![PathBuf::from("config/locales/en.yml"), PathBuf::from("config/locales/ja.yml")],
            None,
        );

        let languages = catalog.available_languages();

        expect_that!(languages.iter().collect::<Vec<_>>(), elements_are![eq(&"en"), eq(&"ja")]);
    }

    #[googletest::test]
    fn available_languages_from_configuration() {
        let catalog = YamlCatalog::new(
            vec![PathBuf::from("config/locales/en.yml")],
            Some(vec!["en".to_string(), "de".to_string()]),
        );

        expect_that!(catalog.available_languages().contains("de"), eq(true));
    }

    #[googletest::test]
    fn load_all_merges_files_per_language() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_locale(root, "en.yml", "en:\n  date:\n    formats:\n      default: '%m/%d/%Y'\n");
        let plugin_dir = root.join("plugins/sample/config/locales");
        fs::create_dir_all(&plugin_dir).unwrap();
        fs::write(plugin_dir.join("en.yml"), "en:\n  label_sample: Sample\n").unwrap();

        let mut catalog = YamlCatalog::discover(root, &default_files(), None).unwrap();
        let loaded = catalog.load_all().unwrap();

        expect_that!(loaded, len(eq(2)));
        expect_that!(
            catalog.translations_for("en"),
            some(eq(&map([
                ("date", node([("formats", node([("default", text("%m/%d/%Y"))]))])),
                ("label_sample", text("Sample")),
            ])))
        );
        expect_that!(catalog.translations_for("fr"), none());
    }

    #[rstest]
    #[case::broken_yaml("en: [unclosed\n")]
    #[case::scalar_document("just text\n")]
    fn load_resources_skips_bad_files(#[case] content: &str) {
        let temp_dir = TempDir::new().unwrap();
        let good = write_locale(temp_dir.path(), "en.yml", "en:\n  label: Label\n");
        let bad = write_locale(temp_dir.path(), "fr.yml", content);
        let missing = temp_dir.path().join("config/locales/de.yml");

        let mut catalog = YamlCatalog::new(vec![good.clone(), bad.clone(), missing.clone()], None);
        let loaded = catalog.load_resources(&[good.clone(), bad, missing]).unwrap();

        assert_that!(loaded, elements_are![eq(&good)]);
        assert_that!(catalog.translations_for("en"), some(anything()));
    }

    #[googletest::test]
    fn reloading_picks_up_changed_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_locale(temp_dir.path(), "en.yml", "en:\n  label: Before\n");
        let mut catalog = YamlCatalog::new(vec![path.clone()], None);
        catalog.load_all().unwrap();

        fs::write(&path, "en:\n  label: After\n").unwrap();
        catalog.load_resources(&[path]).unwrap();

        expect_that!(catalog.translations_for("en"), some(eq(&map([("label", text("After"))]))));
    }
}
