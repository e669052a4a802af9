use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "translationFiles.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizeSettings {
    /// Name the configuration value is stored under in the settings store.
    pub setting_name: String,

    /// Language whose catalog defines the recognized message keys.
    pub base_language: String,

    /// Languages accepted as override targets.
    /// If unset, every language with a discovered locale file is accepted.
    pub available_languages: Option<Vec<String>>,

    pub translation_files: TranslationFilesConfig,

    /// Settings store file, relative to the workspace root.
    pub settings_file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationFilesConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl CustomizeSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Base language missing from `availableLanguages`
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.setting_name.is_empty() {
            errors.push(ValidationError::new(
                "settingName",
                "The setting name cannot be empty. Example: \"plugin_redmine_message_customize\"",
            ));
        }

        if self.base_language.is_empty() {
            errors.push(ValidationError::new(
                "baseLanguage",
                "The base language cannot be empty. Example: \"en\"",
            ));
        } else if let Some(languages) = &self.available_languages
            && !languages.contains(&self.base_language)
        {
            errors.push(ValidationError::new(
                "baseLanguage",
                format!(
                    "The base language '{}' must be one of availableLanguages: [{}]",
                    self.base_language,
                    languages.join(", ")
                ),
            ));
        }

        if let Some(languages) = &self.available_languages {
            for (index, language) in languages.iter().enumerate() {
                if language.is_empty() {
                    errors.push(ValidationError::new(
                        format!("availableLanguages[{index}]"),
                        "A language identifier cannot be empty",
                    ));
                }
            }
        }

        if self.translation_files.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "translationFiles.includePatterns",
                "At least one pattern is required. Example: [\"**/config/locales/*.yml\"]",
            ));
        }

        for (index, pattern) in self.translation_files.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("translationFiles.includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.translation_files.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("translationFiles.excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.settings_file.is_empty() {
            errors.push(ValidationError::new(
                "settingsFile",
                "The settings file cannot be empty. Example: \".message-customize/settings.json\"",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for TranslationFilesConfig {
    fn default() -> Self {
        Self {
            include_patterns: vec![
                "**/config/locales/*.yml".to_string(),
                "**/config/locales/*.yaml".to_string(),
            ],
            exclude_patterns: vec!["**/node_modules/**".to_string()],
        }
    }
}

impl Default for CustomizeSettings {
    fn default() -> Self {
        Self {
            setting_name: "plugin_redmine_message_customize".to_string(),
            base_language: "en".to_string(),
            available_languages: None,
            translation_files: TranslationFilesConfig::default(),
            settings_file: ".message-customize/settings.json".to_string(),
        }
    }
}
