//! テスト用ユーティリティ関数
//!
//! 複数のテストモジュールで使用される共通のヘルパー関数を提供します。
#![cfg(test)]

use std::collections::BTreeSet;
use std::path::{
    Path,
    PathBuf,
};

use proptest::prelude::*;

use crate::catalog::{
    CatalogError,
    LanguageSet,
    TranslationCatalog,
};
use crate::tree::{
    FlatMapping,
    LeafValue,
    MessageMap,
    MessageTree,
    deep_merge,
};

/// テスト用のテキストリーフを作成する
pub(crate) fn text(value: &str) -> MessageTree {
    MessageTree::Leaf(LeafValue::from(value))
}

/// テスト用のリストリーフを作成する
pub(crate) fn list(values: &[&str]) -> MessageTree {
    MessageTree::Leaf(LeafValue::List(values.iter().map(|v| (*v).to_string()).collect()))
}

/// キーとサブツリーの組から `MessageMap` を作成する
pub(crate) fn map<'a>(entries: impl IntoIterator<Item = (&'a str, MessageTree)>) -> MessageMap {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

/// キーとサブツリーの組からノードを作成する
pub(crate) fn node<'a>(entries: impl IntoIterator<Item = (&'a str, MessageTree)>) -> MessageTree {
    MessageTree::Node(map(entries))
}

/// ドット区切りキーと文字列値の組から `FlatMapping` を作成する
pub(crate) fn flat<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> FlatMapping {
    entries.into_iter().map(|(key, value)| (key.to_string(), LeafValue::from(value))).collect()
}

/// `.` を含まない空でないキーセグメント
pub(crate) fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,6}"
}

/// `[` で始まらないテキスト (リストリテラルとして解釈されない)
fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 %/:,]{0,8}"
}

/// テキストまたはリストのリーフ
fn leaf_strategy() -> impl Strategy<Value = MessageTree> {
    prop_oneof![
        text_strategy().prop_map(|value| MessageTree::Leaf(LeafValue::Text(value))),
        prop::collection::vec(text_strategy(), 0..3)
            .prop_map(|values| MessageTree::Leaf(LeafValue::List(values))),
    ]
}

/// 空のノードを含まないメッセージツリー
pub(crate) fn message_map_strategy() -> impl Strategy<Value = MessageMap> {
    let tree = leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map(key_strategy(), inner, 1..4).prop_map(MessageTree::Node)
    });
    prop::collection::btree_map(key_strategy(), tree, 0..4)
}

/// メモリ上だけで動作する翻訳カタログ
///
/// `resources` に登録されたパスが読み込まれると、対応するテーブルが
/// `tables` に反映されます。読み込み要求は `load_requests` に記録されます。
#[derive(Debug, Default)]
pub(crate) struct RecordingCatalog {
    /// 利用可能な言語
    pub languages: LanguageSet,
    /// リソースパスと、その読み込みで得られる (言語, ツリー)
    pub resources: Vec<(PathBuf, String, MessageMap)>,
    /// 読み込み済みの翻訳テーブル
    pub tables: Vec<(String, MessageMap)>,
    /// `load_resources` に渡されたパスの履歴
    pub load_requests: Vec<Vec<PathBuf>>,
}

impl RecordingCatalog {
    /// 言語ごとに `config/locales/<lang>.yml` を持つカタログを作成する
    ///
    /// テーブルはまだ読み込まれていない状態になります。
    pub(crate) fn with_resources<'a>(
        resources: impl IntoIterator<Item = (&'a str, MessageMap)>,
    ) -> Self {
        let resources: Vec<(PathBuf, String, MessageMap)> = resources
            .into_iter()
            .map(|(lang, tree)| {
                (PathBuf::from(format!("config/locales/{lang}.yml")), lang.to_string(), tree)
            })
            .collect();
        let languages =
            LanguageSet::new(resources.iter().map(|(_, lang, _)| lang.clone()).collect::<BTreeSet<_>>());
        Self { languages, resources, tables: Vec::new(), load_requests: Vec::new() }
    }

    /// すべてのリソースを読み込んだ状態にする
    pub(crate) fn loaded(mut self) -> Self {
        let paths = self.resource_paths();
        let _ = self.load_resources(&paths);
        self.load_requests.clear();
        self
    }
}

impl TranslationCatalog for RecordingCatalog {
    fn available_languages(&self) -> LanguageSet {
        self.languages.clone()
    }

    fn translations_for(&self, language: &str) -> Option<MessageMap> {
        self.tables.iter().find(|(lang, _)| lang == language).map(|(_, tree)| tree.clone())
    }

    fn resource_paths(&self) -> Vec<PathBuf> {
        self.resources.iter().map(|(path, _, _)| path.clone()).collect()
    }

    fn load_resources(&mut self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, CatalogError> {
        self.load_requests.push(paths.to_vec());
        let mut loaded = Vec::new();
        for path in paths {
            let Some((_, lang, tree)) =
                self.resources.iter().find(|(p, _, _)| p.as_path() == Path::new(path))
            else {
                continue;
            };
            if let Some((_, table)) = self.tables.iter_mut().find(|(l, _)| l == lang) {
                deep_merge(table, tree.clone());
            } else {
                self.tables.push((lang.clone(), tree.clone()));
            }
            loaded.push(path.clone());
        }
        Ok(loaded)
    }
}
