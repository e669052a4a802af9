//! Applying edits to the override tree.

use serde_yaml::Value;

use super::{
    CustomMessages,
    RawPending,
};
use crate::tree::{
    MessageMap,
    MessageTree,
    OverrideTree,
};
use crate::validation::ValidationError;

/// Sets the messages of one language.
///
/// A non-empty `messages` replaces that language's subtree as a whole; an
/// empty one removes the language. Other languages are left untouched.
#[must_use]
pub fn apply_override(mut tree: OverrideTree, language: &str, messages: MessageMap) -> OverrideTree {
    if messages.is_empty() {
        if tree.remove(language).is_some() {
            tracing::debug!(language, "Removed custom messages");
        }
    } else {
        tracing::debug!(language, count = messages.len(), "Replacing custom messages");
        tree.insert(language.to_string(), MessageTree::Node(messages));
    }
    tree
}

/// Replaces all custom messages with the result of parsing `raw`.
///
/// Text that does not parse, or parses into something other than a mapping,
/// is kept as a [`CustomMessages::Raw`] value so it can be shown again for
/// correction.
pub fn apply_raw_override(current: &mut CustomMessages, raw: &str) {
    let replaced = current.as_tree().map_or(0, OverrideTree::len);
    *current = parse_raw(raw);
    match current {
        CustomMessages::Tree(tree) => {
            tracing::debug!("Replaced {replaced} languages with {} from YAML", tree.len());
        }
        CustomMessages::Raw(pending) => {
            tracing::debug!("Keeping unparsed YAML: {}", pending.error.message);
        }
    }
}

/// Parses YAML text into custom messages.
///
/// Blank documents (empty text, `~`, `{}`, `[]`, `false`, whitespace) become
/// an empty tree.
#[must_use]
pub fn parse_raw(raw: &str) -> CustomMessages {
    let pending = |error| CustomMessages::Raw(RawPending { text: raw.to_string(), error });

    if raw.trim().is_empty() {
        return CustomMessages::default();
    }

    let value: Value = match serde_yaml::from_str(raw) {
        Ok(value) => value,
        Err(e) => return pending(ValidationError::parse_failure(e.to_string())),
    };

    if is_blank(&value) {
        return CustomMessages::default();
    }

    match MessageTree::from_yaml(&value) {
        Ok(MessageTree::Node(tree)) => CustomMessages::Tree(tree),
        Ok(MessageTree::Leaf(_)) => pending(ValidationError::invalid_format(None)),
        Err(e) => pending(ValidationError::invalid_format(Some(&e.to_string()))),
    }
}

/// Whether a parsed document carries no messages at all.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(mapping) => mapping.is_empty(),
        Value::Bool(true) | Value::Number(_) | Value::Tagged(_) => false,
    }
}
