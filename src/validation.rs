//! Pre-commit validation of custom messages.
//!
//! A pending error (raw text that failed to parse, or parsed into something
//! other than a message tree) is reported alone. Otherwise three checks run
//! and every failure is collected:
//!
//! 1. the tree can be written back as YAML and every language maps to a node,
//! 2. every language is recognized,
//! 3. every key path exists in the base language's catalog.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::catalog::LanguageSet;
use crate::setting::CustomMessages;
use crate::tree::codec::flatten;
use crate::tree::{
    MessageTree,
    OverrideTree,
};

/// Field that record-level errors are attached to.
pub const BASE_FIELD: &str = "base";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// The value is not shaped like a message tree.
    InvalidFormat,
    /// One or more top-level keys are not recognized languages.
    UnavailableLanguage,
    /// One or more key paths are missing from the base catalog.
    UnavailableKey,
    /// Raw YAML input could not be parsed at all.
    ParseFailure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub field: String,
    pub message: String,
}

/// Errors of one validation pass, in the order they were found.
pub type ValidationErrors = Vec<ValidationError>;

impl ValidationError {
    #[must_use]
    pub fn new(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { kind, field: field.into(), message: message.into() }
    }

    /// The parser's own message, surfaced verbatim.
    #[must_use]
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::ParseFailure, BASE_FIELD, message)
    }

    #[must_use]
    pub fn invalid_format(detail: Option<&str>) -> Self {
        let message = detail.map_or_else(
            || "Invalid YAML format.".to_string(),
            |detail| format!("Invalid YAML format. {detail}"),
        );
        Self::new(ValidationErrorKind::InvalidFormat, BASE_FIELD, message)
    }

    #[must_use]
    pub fn unavailable_languages(languages: &[&str]) -> Self {
        Self::new(
            ValidationErrorKind::UnavailableLanguage,
            BASE_FIELD,
            format!("The language is not available. [{}]", languages.join(", ")),
        )
    }

    #[must_use]
    pub fn unavailable_keys(keys: &[&str]) -> Self {
        Self::new(
            ValidationErrorKind::UnavailableKey,
            BASE_FIELD,
            format!("The key is not available. keys: [{}]", keys.join(", ")),
        )
    }
}

/// Numbered list of errors, one per line.
pub(crate) fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Checks custom messages against the recognized languages and keys.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    /// 利用可能な言語
    languages: &'a LanguageSet,
    /// 基準言語のフラット化済みキー
    available_keys: &'a BTreeSet<String>,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(languages: &'a LanguageSet, available_keys: &'a BTreeSet<String>) -> Self {
        Self { languages, available_keys }
    }

    /// Runs every check. An empty result means the messages may be committed.
    #[must_use]
    pub fn validate(&self, messages: &CustomMessages) -> ValidationErrors {
        let tree = match messages {
            CustomMessages::Raw(pending) => return vec![pending.error.clone()],
            CustomMessages::Tree(tree) => tree,
        };

        let mut errors = Vec::new();
        Self::check_format(tree, &mut errors);
        self.check_languages(tree, &mut errors);
        self.check_keys(tree, &mut errors);

        if !errors.is_empty() {
            tracing::debug!("Custom messages failed validation: {errors:?}");
        }
        errors
    }

    /// Every language maps to a node and the whole tree serializes.
    fn check_format(tree: &OverrideTree, errors: &mut ValidationErrors) {
        for (language, messages) in tree {
            if let MessageTree::Leaf(_) = messages {
                errors.push(ValidationError::invalid_format(Some(&format!(
                    "Messages for '{language}' must be a mapping of keys."
                ))));
            }
        }

        if let Err(e) = serde_yaml::to_string(tree) {
            errors.push(ValidationError::invalid_format(Some(&e.to_string())));
        }
    }

    /// Every top-level key is a recognized language.
    fn check_languages(&self, tree: &OverrideTree, errors: &mut ValidationErrors) {
        let unavailable: Vec<&str> = tree
            .keys()
            .map(String::as_str)
            .filter(|language| !self.languages.contains(language))
            .collect();

        if !unavailable.is_empty() {
            errors.push(ValidationError::unavailable_languages(&unavailable));
        }
    }

    /// Every flattened key exists in the base catalog.
    fn check_keys(&self, tree: &OverrideTree, errors: &mut ValidationErrors) {
        let used_keys: BTreeSet<String> = tree
            .values()
            .filter_map(MessageTree::as_node)
            .flat_map(|messages| flatten(messages).into_keys())
            .collect();

        let unavailable: Vec<&str> = used_keys
            .iter()
            .map(String::as_str)
            .filter(|key| !self.available_keys.contains(*key))
            .collect();

        if !unavailable.is_empty() {
            errors.push(ValidationError::unavailable_keys(&unavailable));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::setting::merge::parse_raw;
    use crate::test_utils::{
        map,
        node,
        text,
    };

    fn languages() -> LanguageSet {
        LanguageSet::new(["en", "ja"].map(str::to_string))
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|error| error.kind).collect()
    }

    fn keys() -> BTreeSet<String> {
        ["label_issue", "date.formats.default", "date.order"].map(str::to_string).into()
    }

    #[googletest::test]
    fn valid_tree_has_no_errors() {
        let messages = CustomMessages::Tree(map([
            ("en", node([("label_issue", text("Ticket"))])),
            ("ja", node([("date", node([("formats", node([("default", text("%Y/%m/%d"))]))]))])),
        ]));

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        expect_that!(errors, is_empty());
    }

    #[googletest::test]
    fn empty_tree_is_valid() {
        let errors = Validator::new(&languages(), &keys()).validate(&CustomMessages::default());

        expect_that!(errors, is_empty());
    }

    #[googletest::test]
    fn unavailable_language_reported_once() {
        let messages = CustomMessages::Tree(map([
            ("en", node([("label_issue", text("Ticket"))])),
            ("xx", node([("label_issue", text("?"))])),
        ]));

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnavailableLanguage]);
        expect_that!(
            errors,
            elements_are![all![
                field!(ValidationError.field, eq(BASE_FIELD)),
                field!(ValidationError.message, contains_substring("[xx]"))
            ]]
        );
    }

    #[googletest::test]
    fn all_offending_languages_named_together() {
        let messages = CustomMessages::Tree(map([
            ("en", node([])),
            ("xx", node([])),
            ("zz", node([])),
        ]));

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        expect_that!(
            errors,
            elements_are![field!(ValidationError.message, ends_with("[xx, zz]"))]
        );
    }

    #[googletest::test]
    fn unavailable_keys_collected_across_languages() {
        let messages = CustomMessages::Tree(map([
            ("en", node([("label_issue", text("Ticket")), ("label_unknown", text("?"))])),
            ("ja", node([("date", node([("missing", text("?"))]))])),
        ]));

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        assert_eq!(kinds(&errors), vec![ValidationErrorKind::UnavailableKey]);
        expect_that!(
            errors,
            elements_are![field!(
                ValidationError.message,
                eq("The key is not available. keys: [date.missing, label_unknown]")
            )]
        );
    }

    #[googletest::test]
    fn language_and_key_errors_are_independent() {
        let messages = CustomMessages::Tree(map([("xx", node([("label_unknown", text("?"))]))]));

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        assert_eq!(
            kinds(&errors),
            vec![ValidationErrorKind::UnavailableLanguage, ValidationErrorKind::UnavailableKey]
        );
    }

    #[googletest::test]
    fn leaf_under_language_is_invalid_format() {
        let messages = CustomMessages::Tree(map([("en", text("not a mapping"))]));

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidFormat]);
        expect_that!(
            errors,
            elements_are![field!(ValidationError.message, contains_substring("'en'"))]
        );
    }

    #[googletest::test]
    fn pending_parse_failure_suppresses_other_checks() {
        let messages = parse_raw("not: valid: yaml: [");

        let errors = Validator::new(&languages(), &keys()).validate(&messages);

        assert_eq!(kinds(&errors), vec![ValidationErrorKind::ParseFailure]);
    }

    #[googletest::test]
    fn validation_error_display() {
        let error = ValidationError::unavailable_languages(&["xx"]);

        expect_that!(error.to_string(), eq("base: The language is not available. [xx]"));
    }

    #[googletest::test]
    fn format_validation_errors_numbers_entries() {
        let formatted = format_validation_errors(&[
            ValidationError::unavailable_languages(&["xx"]),
            ValidationError::unavailable_keys(&["a.b"]),
        ]);

        expect_that!(formatted, contains_substring("1. base - The language is not available."));
        expect_that!(formatted, contains_substring("2. base - The key is not available."));
    }
}
