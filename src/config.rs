use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::traits::RuleConfig;

/// パッケージデータベース（pkgdb）設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkgdbConfig {
    /// pkgdbのベースURL
    #[serde(default = "default_pkgdb_url")]
    pub url: String,

    /// リクエストのタイムアウト（秒）
    #[serde(default = "default_pkgdb_timeout_sec")]
    pub timeout_sec: u64,

    /// ネットワークエラー・サーバーエラー時の再試行回数
    #[serde(default = "default_pkgdb_retry_count")]
    pub retry_count: u32,

    /// 再試行間隔（秒）
    #[serde(default = "default_pkgdb_retry_interval_sec")]
    pub retry_interval_sec: u64,

    /// 1ページあたりの取得件数
    #[serde(default = "default_pkgdb_page_limit")]
    pub page_limit: u32,
}

fn default_pkgdb_url() -> String {
    "https://admin.fedoraproject.org/pkgdb".to_string()
}

fn default_pkgdb_timeout_sec() -> u64 {
    30
}

fn default_pkgdb_retry_count() -> u32 {
    0 // デフォルトでは再試行しない
}

fn default_pkgdb_retry_interval_sec() -> u64 {
    5
}

fn default_pkgdb_page_limit() -> u32 {
    100
}

impl Default for PkgdbConfig {
    fn default() -> Self {
        Self {
            url: default_pkgdb_url(),
            timeout_sec: default_pkgdb_timeout_sec(),
            retry_count: default_pkgdb_retry_count(),
            retry_interval_sec: default_pkgdb_retry_interval_sec(),
            page_limit: default_pkgdb_page_limit(),
        }
    }
}

/// 問い合わせ結果のキャッシュ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// キャッシュを有効にするかどうか
    #[serde(default)]
    pub enabled: bool,

    /// キャッシュの有効期間（秒）
    #[serde(default = "default_cache_ttl_sec")]
    pub ttl_sec: u64,
}

fn default_cache_ttl_sec() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_sec: default_cache_ttl_sec(),
        }
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル（省略可、デフォルト: info）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// ログファイルのパス（省略時は標準エラー出力）
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

/// メイン設定構造体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// pkgdb設定
    #[serde(default)]
    pub pkgdb: PkgdbConfig,

    /// キャッシュ設定
    #[serde(default)]
    pub cache: CacheConfig,

    /// ログ設定
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RuleConfig for Config {}

impl Config {
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.enabled
    }

    /// 設定値の妥当性を検証する
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pkgdb.url.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                reason: "pkgdb.url must not be empty".to_string(),
            });
        }

        url::Url::parse(&self.pkgdb.url).map_err(|e| ConfigError::ValidationError {
            reason: format!("pkgdb.url is not a valid URL: {}", e),
        })?;

        if self.pkgdb.timeout_sec == 0 {
            return Err(ConfigError::ValidationError {
                reason: "pkgdb.timeout_sec must be greater than 0".to_string(),
            });
        }

        if self.pkgdb.page_limit == 0 {
            return Err(ConfigError::ValidationError {
                reason: "pkgdb.page_limit must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// 設定ファイルのパスを取得
pub fn config_file_path() -> PathBuf {
    let mut path = dirs::config_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("fmn-rules");
    path.push("config.toml");
    path
}

/// 設定ファイルを読み込む
///
/// With no explicit path the default location is used, and a missing default
/// file yields the default configuration. An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents)?
        }
        None => {
            let default_path = config_file_path();
            if default_path.exists() {
                let contents = fs::read_to_string(default_path)?;
                toml::from_str(&contents)?
            } else {
                // ファイルが存在しない場合はデフォルト設定を返す
                Config::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// 設定ファイルを保存する
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent_dir) = path.parent() {
        // 設定ディレクトリが存在しない場合は作成
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir).map_err(|e| ConfigError::WriteError { source: e })?;
        }
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|e| ConfigError::WriteError { source: e })?;
    Ok(())
}
