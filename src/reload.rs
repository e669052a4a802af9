//! Reloading of base translation tables after a committed change.

use std::path::PathBuf;

use crate::catalog::{
    CatalogHandle,
    TranslationCatalog,
    language_of,
};

/// What a reload asked the catalog to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Recognized languages the reload covered.
    pub languages: Vec<String>,
    /// Resource files the catalog actually loaded.
    pub paths: Vec<PathBuf>,
}

/// Requests reloads through a shared catalog handle.
#[derive(Debug)]
pub struct ReloadTrigger<'a, C> {
    /// 再読み込み対象のカタログ
    catalog: &'a CatalogHandle<C>,
}

impl<'a, C: TranslationCatalog> ReloadTrigger<'a, C> {
    #[must_use]
    pub const fn new(catalog: &'a CatalogHandle<C>) -> Self {
        Self { catalog }
    }

    /// Reloads the resource files of `languages`, matched by file stem.
    ///
    /// Unrecognized identifiers are dropped and tables of other languages are
    /// left as they are. A failing catalog is logged, never propagated.
    pub fn reload<'l>(&self, languages: impl IntoIterator<Item = &'l str>) -> ReloadReport {
        let mut catalog = self.catalog.write();

        let languages = catalog.available_languages().find_languages(languages);
        if languages.is_empty() {
            tracing::debug!("No recognized languages to reload");
            return ReloadReport::default();
        }

        let targets: Vec<PathBuf> = catalog
            .resource_paths()
            .into_iter()
            .filter(|path| language_of(path).is_some_and(|stem| languages.contains(&stem)))
            .collect();

        let paths = match catalog.load_resources(&targets) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!("Failed to reload translations for {languages:?}: {e}");
                Vec::new()
            }
        };

        tracing::info!(
            "Reloaded {} of {} translation files for {languages:?}",
            paths.len(),
            targets.len()
        );
        ReloadReport { languages, paths }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::catalog::CatalogError;
    use crate::catalog::LanguageSet;
    use crate::test_utils::{
        RecordingCatalog,
        map,
        text,
    };
    use crate::tree::MessageMap;

    fn catalog() -> CatalogHandle<RecordingCatalog> {
        CatalogHandle::new(
            RecordingCatalog::with_resources([
                ("en", map([("label", text("Label"))])),
                ("ja", map([("label", text("ラベル"))])),
                ("fr", map([("label", text("Libellé"))])),
            ])
            .loaded(),
        )
    }

    #[googletest::test]
    fn reloads_only_requested_languages() {
        let handle = catalog();

        let report = ReloadTrigger::new(&handle).reload(["ja"]);

        expect_that!(report.languages, elements_are![eq("ja")]);
        expect_that!(report.paths, elements_are![eq(&PathBuf::from("config/locales/ja.yml"))]);
        expect_that!(
            handle.read().load_requests,
            elements_are![elements_are![eq(&PathBuf::from("config/locales/ja.yml"))]]
        );
    }

    #[googletest::test]
    fn drops_unrecognized_languages() {
        let handle = catalog();

        let report = ReloadTrigger::new(&handle).reload(["xx", "en", ""]);

        expect_that!(report.languages, elements_are![eq("en")]);
        expect_that!(report.paths, len(eq(1)));
    }

    #[googletest::test]
    fn nothing_recognized_requests_no_load() {
        let handle = catalog();

        let report = ReloadTrigger::new(&handle).reload(["xx"]);

        expect_that!(report, eq(&ReloadReport::default()));
        expect_that!(handle.read().load_requests, is_empty());
    }

    #[googletest::test]
    fn language_without_resource_loads_nothing() {
        let handle = catalog();
        handle.write().languages = LanguageSet::new(["de", "en"].map(str::to_string));

        let report = ReloadTrigger::new(&handle).reload(["de"]);

        expect_that!(report.languages, elements_are![eq("de")]);
        expect_that!(report.paths, is_empty());
    }

    /// 常に失敗するカタログ
    #[derive(Debug)]
    struct BrokenCatalog;

    impl TranslationCatalog for BrokenCatalog {
        fn available_languages(&self) -> LanguageSet {
            LanguageSet::new(["en".to_string()])
        }

        fn translations_for(&self, _language: &str) -> Option<MessageMap> {
            None
        }

        fn resource_paths(&self) -> Vec<PathBuf> {
            vec![PathBuf::from("config/locales/en.yml")]
        }

        fn load_resources(&mut self, _paths: &[PathBuf]) -> Result<Vec<PathBuf>, CatalogError> {
            Err(CatalogError::NotAMapping { path: PathBuf::from("config/locales/en.yml") })
        }
    }

    #[googletest::test]
    fn catalog_failure_is_not_propagated() {
        let handle = CatalogHandle::new(BrokenCatalog);

        let report = ReloadTrigger::new(&handle).reload(["en"]);

        expect_that!(report.languages, elements_are![eq("en")]);
        expect_that!(report.paths, is_empty());
    }
}
