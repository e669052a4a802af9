//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    CustomizeSettings,
};

/// ワークスペース直下の設定ファイル名
const CONFIG_FILE_NAME: &str = ".message-customize.json";

/// 設定管理を行う
///
/// ワークスペースの `.message-customize.json` を読み込んで検証し、
/// 上書き設定を保存するファイルの場所を決めます。
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: CustomizeSettings,

    /// ワークスペースのルートパス
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: CustomizeSettings::default(), workspace_root: None }
    }

    /// 設定を読み込む
    ///
    /// 設定ファイルがなければデフォルト値を使います。読み込みか検証に失敗した
    /// 場合、現在の設定とワークスペースルートは変更されません。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let settings = match &workspace_root {
            Some(root) => read_config_file(&root.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
            None => CustomizeSettings::default(),
        };
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &CustomizeSettings {
        &self.current_settings
    }

    /// 設定ストアファイルのパスを取得
    ///
    /// ワークスペースルートが未設定の場合はカレントディレクトリからの相対パスになります。
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.workspace_root
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.current_settings.settings_file)
    }
}

/// 設定ファイルを読み込む。ファイルがなければ `None`
fn read_config_file(config_path: &Path) -> Result<Option<CustomizeSettings>, ConfigError> {
    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);
    let content = std::fs::read_to_string(config_path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
