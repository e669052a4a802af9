//! The stored configuration value: enabled flag plus custom messages.
//!
//! Persisted as
//!
//! ```json
//! { "enabled": "true", "custom_messages": { "en": { "label_issue": "Ticket" } } }
//! ```
//!
//! where `custom_messages` may also hold raw text that has not been accepted
//! as a message tree yet.

pub mod merge;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::tree::OverrideTree;
use crate::validation::ValidationError;

/// Raw text kept in place of a message tree, with the reason it was not
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPending {
    pub text: String,
    pub error: ValidationError,
}

/// Custom messages for all languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomMessages {
    Tree(OverrideTree),
    Raw(RawPending),
}

impl Default for CustomMessages {
    fn default() -> Self {
        Self::Tree(OverrideTree::new())
    }
}

impl CustomMessages {
    #[must_use]
    pub const fn as_tree(&self) -> Option<&OverrideTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            Self::Raw(_) => None,
        }
    }

    /// True for an empty tree or whitespace-only raw text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Tree(tree) => tree.is_empty(),
            Self::Raw(pending) => pending.text.trim().is_empty(),
        }
    }

    /// Renders the messages for display and editing.
    ///
    /// An empty tree renders as an empty string; raw text is returned as is.
    ///
    /// # Errors
    /// Returns an error if the tree cannot be serialized.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        match self {
            _ if self.is_blank() => Ok(String::new()),
            Self::Tree(tree) => serde_yaml::to_string(tree),
            Self::Raw(pending) => Ok(pending.text.clone()),
        }
    }
}

impl Serialize for CustomMessages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Tree(tree) => tree.serialize(serializer),
            Self::Raw(pending) => serializer.serialize_str(&pending.text),
        }
    }
}

impl<'de> Deserialize<'de> for CustomMessages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        /// 保存形式
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Tree(OverrideTree),
            Text(String),
        }

        Ok(match Option::<Stored>::deserialize(deserializer)? {
            None => Self::default(),
            Some(Stored::Tree(tree)) => Self::Tree(tree),
            // Text is re-parsed so a pending value carries its error again.
            Some(Stored::Text(text)) => merge::parse_raw(&text),
        })
    }
}

/// The configuration value owned by the override store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSetting {
    #[serde(default = "enabled_by_default", with = "enabled_flag")]
    pub enabled: bool,

    #[serde(default)]
    pub custom_messages: CustomMessages,
}

impl Default for MessageSetting {
    fn default() -> Self {
        Self { enabled: enabled_by_default(), custom_messages: CustomMessages::default() }
    }
}

/// 未保存時は有効
const fn enabled_by_default() -> bool {
    true
}

/// The flag is stored as the strings `"true"` / `"false"`. Anything other
/// than `"false"` (or a literal `false`) reads as enabled.
mod enabled_flag {
    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
    };

    /// 保存されている値
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    /// 文字列として書き出す
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(enabled: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *enabled { "true" } else { "false" })
    }

    /// 真偽値と文字列のどちらも受け付ける
    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<Flag>::deserialize(deserializer)? {
            None => true,
            Some(Flag::Bool(enabled)) => enabled,
            Some(Flag::Text(text)) => text != "false",
        })
    }
}
