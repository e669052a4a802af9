//! Command-line front end for managing custom message overrides in a workspace.

use std::io::{
    self,
    Read as _,
    Write as _,
};
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use clap::{
    Parser,
    Subcommand,
};
use message_customize::catalog::{
    CatalogError,
    CatalogHandle,
    YamlCatalog,
};
use message_customize::config::{
    ConfigError,
    ConfigManager,
};
use message_customize::reload::ReloadReport;
use message_customize::store::{
    JsonFileStore,
    StoreError,
};
use message_customize::tree::FlatMapping;
use message_customize::tree::codec::parse_leaf_value;
use message_customize::{
    OverrideStore,
    SaveError,
};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "MESSAGE_CUSTOMIZE_LOG";

/// Override localized messages without editing the base translation files
#[derive(Debug, Parser)]
#[command(name = "message-customize", version)]
struct Cli {
    /// Command to run
    #[command(subcommand)]
    command: Command,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Language used when the stored messages are not a mapping
    #[arg(long)]
    language: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging (ignored when MESSAGE_CUSTOMIZE_LOG is set)
    #[arg(long, short)]
    verbose: bool,
}

/// Subcommands
#[derive(Debug, Subcommand)]
enum Command {
    /// Print the custom messages as YAML
    Show {
        /// Only this language's messages
        language: Option<String>,

        /// Print dotted KEY=VALUE lines instead of YAML
        #[arg(long)]
        flat: bool,
    },
    /// Set messages of one language
    Set {
        /// Language whose messages are set
        language: String,

        /// Messages as dotted-key assignments, e.g. label_issue=Ticket
        #[arg(value_name = "KEY=VALUE")]
        assignments: Vec<String>,

        /// Replace the language's messages instead of merging into them
        #[arg(long)]
        replace: bool,
    },
    /// Replace all custom messages with a YAML document ("-" reads stdin)
    Import {
        /// YAML file to import
        file: PathBuf,
    },
    /// Enable or disable the custom messages
    Toggle,
    /// Validate the stored custom messages against the catalog
    Check,
}

/// コマンド実行時のエラー
#[derive(Error, Debug)]
enum CliError {
    /// ワークスペース設定の読み込みエラー
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 翻訳カタログの探索・読み込みエラー
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// 設定ストアの読み書きエラー
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 更新の保存エラー
    #[error(transparent)]
    Save(#[from] SaveError),

    /// YAML 出力エラー
    #[error("Failed to render messages: {0}")]
    Render(#[from] serde_yaml::Error),

    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 代入形式ではない引数
    #[error("Expected KEY=VALUE, got '{0}'")]
    InvalidAssignment(String),

    /// 検証エラーの件数
    #[error("{0} validation errors")]
    Invalid(usize),
}

/// CLI が扱うストアの具体型
type Overrides = OverrideStore<JsonFileStore, YamlCatalog>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref(), cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            let _ = writeln!(io::stderr().lock(), "error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the tracing subscriber. The returned guard flushes the file
/// writer when dropped.
fn init_logging(log_file: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
        return None;
    };

    let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().map_or_else(|| "message-customize.log".into(), ToOwned::to_owned);
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).with_writer(writer).init();
    Some(guard)
}

/// ワークスペースを読み込み、サブコマンドを実行する
fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config_manager = ConfigManager::new();
    config_manager.load_settings(Some(cli.workspace.clone()))?;
    let settings = config_manager.get_settings();

    let mut catalog = YamlCatalog::discover(
        &cli.workspace,
        &settings.translation_files,
        settings.available_languages.clone(),
    )?;
    catalog.load_all()?;

    let store = JsonFileStore::new(config_manager.settings_path());
    let mut overrides =
        OverrideStore::find_or_default(store, CatalogHandle::new(catalog), settings)?;
    if let Some(language) = &cli.language {
        overrides = overrides.with_current_language(language.clone());
    }

    match &cli.command {
        Command::Show { language, flat } => show(&overrides, language.as_deref(), *flat),
        Command::Set { language, assignments, replace } => {
            let mut messages = if *replace {
                FlatMapping::new()
            } else {
                overrides.custom_messages_to_flatten_hash(Some(language.as_str()))
            };
            for assignment in assignments {
                let (key, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| CliError::InvalidAssignment(assignment.clone()))?;
                messages.insert(key.trim().to_string(), parse_leaf_value(value));
            }
            commit(overrides.update_with_custom_messages(&messages, language))
        }
        Command::Import { file } => {
            let yaml = if file.as_os_str() == "-" {
                let mut yaml = String::new();
                io::stdin().lock().read_to_string(&mut yaml)?;
                yaml
            } else {
                std::fs::read_to_string(file)?
            };
            commit(overrides.update_with_custom_messages_yaml(&yaml))
        }
        Command::Toggle => {
            overrides.toggle_enabled()?;
            let state = if overrides.enabled() { "enabled" } else { "disabled" };
            writeln!(io::stdout().lock(), "Custom messages {state}")?;
            Ok(())
        }
        Command::Check => {
            let errors = overrides.validate();
            let mut stdout = io::stdout().lock();
            for error in &errors {
                writeln!(stdout, "{error}")?;
            }
            if errors.is_empty() { Ok(()) } else { Err(CliError::Invalid(errors.len())) }
        }
    }
}

/// Writes the requested messages to stdout.
fn show(overrides: &Overrides, language: Option<&str>, flat: bool) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();

    if flat {
        for (key, value) in overrides.custom_messages_to_flatten_hash(language) {
            writeln!(stdout, "{key}={value}")?;
        }
        return Ok(());
    }

    let yaml = match language {
        Some(language) => {
            let messages = overrides.custom_messages(Some(language), false);
            if messages.is_empty() { String::new() } else { serde_yaml::to_string(&messages)? }
        }
        None => overrides.custom_messages_to_yaml()?,
    };
    write!(stdout, "{yaml}")?;
    Ok(())
}

/// Reports the outcome of an update, printing every validation error.
fn commit(result: Result<ReloadReport, SaveError>) -> Result<(), CliError> {
    match result {
        Ok(report) => {
            writeln!(io::stdout().lock(), "Saved. Reloaded languages: {}", report.languages.join(", "))?;
            Ok(())
        }
        Err(SaveError::Validation(errors)) => {
            let mut stderr = io::stderr().lock();
            for error in &errors {
                writeln!(stderr, "{error}")?;
            }
            Err(CliError::Invalid(errors.len()))
        }
        Err(e) => Err(e.into()),
    }
}
