//! The override store facade.
//!
//! [`OverrideStore`] owns one configuration value and its working copy.
//! Every edit runs through the same pipeline:
//!
//! 1. the merge engine mutates the working copy,
//! 2. the validator checks it against the catalog,
//! 3. the settings store persists it,
//! 4. the affected languages are reloaded in the catalog.
//!
//! A failed step stops the pipeline; the persisted value stays authoritative
//! and [`OverrideStore::discard_changes`] brings the working copy back in line
//! with it.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::catalog::{
    CatalogHandle,
    TranslationCatalog,
};
use crate::config::CustomizeSettings;
use crate::reload::{
    ReloadReport,
    ReloadTrigger,
};
use crate::setting::merge::{
    apply_override,
    apply_raw_override,
};
use crate::setting::{
    CustomMessages,
    MessageSetting,
};
use crate::store::{
    SettingsStore,
    StoreError,
};
use crate::tree::codec::{
    flatten,
    unflatten,
};
use crate::tree::{
    FlatMapping,
    MessageTree,
    OverrideTree,
};
use crate::validation::{
    ValidationErrors,
    Validator,
    format_validation_errors,
};

/// Why a change was not committed.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Custom messages failed validation:\n{}", format_validation_errors(.0))]
    Validation(ValidationErrors),

    #[error("Failed to persist custom messages: {0}")]
    Store(#[from] StoreError),
}

/// Custom message overrides for one configuration value.
#[derive(Debug)]
pub struct OverrideStore<S, C> {
    /// 永続化先
    store: S,
    /// 基準となる翻訳カタログ
    catalog: CatalogHandle<C>,
    /// 設定値の保存名
    setting_name: String,
    /// キー検証に使う言語
    base_language: String,
    /// 呼び出し元の現在の言語
    current_language: String,
    /// 作業中の設定値
    setting: MessageSetting,
}

impl<S: SettingsStore, C: TranslationCatalog> OverrideStore<S, C> {
    /// Loads the configured value from `store`, or starts from an enabled,
    /// empty one when nothing is stored yet.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn find_or_default(
        store: S,
        catalog: CatalogHandle<C>,
        settings: &CustomizeSettings,
    ) -> Result<Self, StoreError> {
        let setting = store.load(&settings.setting_name)?.unwrap_or_else(|| {
            tracing::debug!(name = %settings.setting_name, "No stored setting, using default");
            MessageSetting::default()
        });

        Ok(Self {
            store,
            catalog,
            setting_name: settings.setting_name.clone(),
            base_language: settings.base_language.clone(),
            current_language: settings.base_language.clone(),
            setting,
        })
    }

    /// Sets the language used when the messages are not a proper tree.
    #[must_use]
    pub fn with_current_language(mut self, language: impl Into<String>) -> Self {
        self.current_language = language.into();
        self
    }

    /// The working copy of the configuration value.
    #[must_use]
    pub const fn setting(&self) -> &MessageSetting {
        &self.setting
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogHandle<C> {
        &self.catalog
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.setting.enabled
    }

    /// Custom messages, either all languages or one language's subtree.
    ///
    /// Empty when the value is blank or raw text, when `check_enabled` is set
    /// and overrides are disabled, or when `language` is not recognized.
    #[must_use]
    pub fn custom_messages(&self, language: Option<&str>, check_enabled: bool) -> OverrideTree {
        if check_enabled && !self.enabled() {
            return OverrideTree::new();
        }
        let Some(tree) = self.setting.custom_messages.as_tree() else {
            return OverrideTree::new();
        };

        match language {
            None => tree.clone(),
            Some(language) => self
                .find_language(language)
                .and_then(|language| tree.get(&language))
                .and_then(MessageTree::as_node)
                .cloned()
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn custom_messages_to_flatten_hash(&self, language: Option<&str>) -> FlatMapping {
        flatten(&self.custom_messages(language, false))
    }

    /// The messages as editable YAML text.
    ///
    /// # Errors
    /// Returns an error if the tree cannot be serialized.
    pub fn custom_messages_to_yaml(&self) -> Result<String, serde_yaml::Error> {
        self.setting.custom_messages.to_yaml()
    }

    /// Replaces the messages of `language` with `messages`, given as a flat
    /// mapping. An empty mapping removes the language.
    ///
    /// # Errors
    /// Returns an error if the result fails validation or cannot be stored.
    /// The working copy keeps the rejected change in both cases.
    pub fn update_with_custom_messages(
        &mut self,
        messages: &FlatMapping,
        language: &str,
    ) -> Result<ReloadReport, SaveError> {
        let tree = match &self.setting.custom_messages {
            CustomMessages::Tree(tree) => tree.clone(),
            CustomMessages::Raw(_) => {
                tracing::debug!("Discarding raw messages before per-language update");
                OverrideTree::new()
            }
        };

        self.setting.custom_messages =
            CustomMessages::Tree(apply_override(tree, language, unflatten(messages)));
        self.commit(&[language.to_string()])
    }

    /// Replaces all messages with the result of parsing `yaml`.
    ///
    /// # Errors
    /// Returns an error if the text does not parse into a valid tree or
    /// cannot be stored.
    pub fn update_with_custom_messages_yaml(
        &mut self,
        yaml: &str,
    ) -> Result<ReloadReport, SaveError> {
        let mut languages = self.using_languages();
        apply_raw_override(&mut self.setting.custom_messages, yaml);
        for language in self.using_languages() {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        self.commit(&languages)
    }

    /// Flips the enabled flag and persists it along with the last stored
    /// messages. Unsaved changes in the working copy are dropped.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub fn toggle_enabled(&mut self) -> Result<ReloadReport, SaveError> {
        let mut setting = self.store.load(&self.setting_name)?.unwrap_or_default();
        setting.enabled = !self.setting.enabled;

        self.store.save(&self.setting_name, &setting)?;
        tracing::info!(name = %self.setting_name, enabled = setting.enabled, "Toggled custom messages");
        self.setting = setting;

        Ok(self.reload(&self.using_languages()))
    }

    /// Languages that currently carry overrides.
    ///
    /// Raw text falls back to the current language.
    #[must_use]
    pub fn using_languages(&self) -> Vec<String> {
        match &self.setting.custom_messages {
            CustomMessages::Tree(tree) => tree.keys().cloned().collect(),
            CustomMessages::Raw(_) => vec![self.current_language.clone()],
        }
    }

    /// Flattened base messages of `language`.
    ///
    /// A language whose table is not loaded yet is reloaded once; a table
    /// that is still missing afterwards reads as empty.
    #[must_use]
    pub fn available_messages(&self, language: &str) -> FlatMapping {
        let table = self.catalog.read().translations_for(language);
        let table = table.or_else(|| {
            tracing::debug!(language, "Translation table not loaded, reloading");
            self.reload(&[language.to_string()]);
            self.catalog.read().translations_for(language)
        });

        table.map(|table| flatten(&table)).unwrap_or_default()
    }

    #[must_use]
    pub fn find_language(&self, language: &str) -> Option<String> {
        self.catalog.read().available_languages().find_language(language).map(str::to_string)
    }

    #[must_use]
    pub fn find_languages<'l>(&self, languages: impl IntoIterator<Item = &'l str>) -> Vec<String> {
        self.catalog.read().available_languages().find_languages(languages)
    }

    /// Validates the working copy against the catalog.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let available_keys: BTreeSet<String> =
            self.available_messages(&self.base_language).into_keys().collect();
        let languages = self.catalog.read().available_languages();

        Validator::new(&languages, &available_keys).validate(&self.setting.custom_messages)
    }

    /// Replaces the working copy with the stored value.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn discard_changes(&mut self) -> Result<(), StoreError> {
        self.setting = self.store.load(&self.setting_name)?.unwrap_or_default();
        Ok(())
    }

    /// Validates and persists the working copy, then reloads `languages`.
    fn commit(&mut self, languages: &[String]) -> Result<ReloadReport, SaveError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SaveError::Validation(errors));
        }

        self.store.save(&self.setting_name, &self.setting)?;
        tracing::info!(name = %self.setting_name, "Saved custom messages");

        Ok(self.reload(languages))
    }

    /// 指定言語の翻訳テーブルを再読み込みする
    fn reload(&self, languages: &[String]) -> ReloadReport {
        ReloadTrigger::new(&self.catalog).reload(languages.iter().map(String::as_str))
    }
}
