//! Conversion between nested message trees and flat dotted-key mappings.

use super::{
    FlatMapping,
    LeafValue,
    MessageMap,
    MessageTree,
    deep_merge,
    join_path,
};

/// Flatten a nested message tree into a dotted-key mapping.
///
/// Only leaves produce entries; inner nodes contribute their key as a path
/// prefix.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
///
/// use message_customize::tree::codec::flatten;
/// use message_customize::tree::{
///     LeafValue,
///     MessageTree,
/// };
///
/// let formats = BTreeMap::from([(
///     "default".to_string(),
///     MessageTree::Leaf(LeafValue::from("%m/%d/%Y")),
/// )]);
/// let date = BTreeMap::from([("formats".to_string(), MessageTree::Node(formats))]);
/// let tree = BTreeMap::from([("date".to_string(), MessageTree::Node(date))]);
///
/// let flat = flatten(&tree);
/// assert_eq!(flat.get("date.formats.default"), Some(&LeafValue::from("%m/%d/%Y")));
/// assert_eq!(flat.len(), 1);
/// ```
#[must_use]
pub fn flatten(tree: &MessageMap) -> FlatMapping {
    let mut result = FlatMapping::new();
    flatten_into(tree, "", &mut result);
    result
}

/// Recursive worker for [`flatten`].
fn flatten_into(tree: &MessageMap, prefix: &str, result: &mut FlatMapping) {
    for (key, value) in tree {
        let full_key = join_path(prefix, key);
        match value {
            MessageTree::Node(children) => flatten_into(children, &full_key, result),
            MessageTree::Leaf(leaf) => {
                result.insert(full_key, leaf.clone());
            }
        }
    }
}

/// Rebuild a nested message tree from a dotted-key mapping.
///
/// Each key is split on `.` and the value is placed at the last segment.
/// Branches are deep-merged into one tree, so sibling keys under a shared
/// prefix end up in the same node. Text values shaped like a list literal
/// are parsed with [`parse_leaf_value`].
#[must_use]
pub fn unflatten(flat: &FlatMapping) -> MessageMap {
    let mut result = MessageMap::new();

    for (flat_key, value) in flat {
        if flat_key.is_empty() {
            tracing::warn!("Skipping message with an empty key");
            continue;
        }

        let leaf = match value {
            LeafValue::Text(text) => parse_leaf_value(text),
            LeafValue::List(_) => value.clone(),
        };

        // 'date.formats.default' => {date: {formats: {default: leaf}}}
        let mut segments = flat_key.split('.').rev();
        let mut branch = MessageMap::new();
        if let Some(last) = segments.next() {
            branch.insert(last.to_string(), MessageTree::Leaf(leaf));
        }
        for segment in segments {
            branch = MessageMap::from([(segment.to_string(), MessageTree::Node(branch))]);
        }

        deep_merge(&mut result, branch);
    }

    result
}

/// Interpret a submitted text value.
///
/// A value that starts with `[` and ends with `]` is read as a YAML flow
/// sequence (`["a", "b"]`). When that does not parse, or yields anything but
/// a list of scalars, the inner text is split on `,` and each item is
/// trimmed. Nested brackets and quoted commas are not understood by the
/// fallback. Any other value is kept as text.
#[must_use]
pub fn parse_leaf_value(value: &str) -> LeafValue {
    let Some(inner) = value.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
        return LeafValue::Text(value.to_string());
    };

    match serde_yaml::from_str::<serde_yaml::Value>(value).map(|v| MessageTree::from_yaml(&v)) {
        Ok(Ok(MessageTree::Leaf(list @ LeafValue::List(_)))) => list,
        _ => {
            tracing::debug!(value, "List literal did not parse as YAML; splitting on commas");
            LeafValue::List(inner.split(',').map(|item| item.trim().to_string()).collect())
        }
    }
}
