//! message-customize
//!
//! 翻訳メッセージを言語ごとに上書きするためのライブラリ。
//! 上書き内容は基準となる翻訳カタログのキーと言語に対して検証され、
//! 保存後に影響する言語の翻訳テーブルだけが再読み込みされます。

pub mod catalog;
pub mod config;
pub mod override_store;
pub mod reload;
pub mod setting;
pub mod store;
pub mod tree;
pub mod validation;

mod test_utils;

pub use override_store::{
    OverrideStore,
    SaveError,
};
