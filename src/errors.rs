use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug)]
pub enum AppError {
    /// パッケージ所有者の問い合わせエラー
    #[error("Package lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// 設定関連エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// メッセージ関連エラー
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// 汎用エラー
    #[error("{message}")]
    Generic { message: String },
}

/// パッケージ所有者の問い合わせ（pkgdb）関連エラー
///
/// Predicates propagate these unchanged; nothing in the rule layer converts
/// a lookup failure into a negative match.
#[derive(Error, Debug)]
pub enum LookupError {
    /// ユーザーが存在しない
    #[error("User not found in package database: {username}")]
    UserNotFound { username: String },

    /// ネットワークエラー
    #[error("Network error: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },

    /// サーバーエラー
    #[error("Package database server error: {status} {message}")]
    ServerError { status: u16, message: String },

    /// レスポンスのパースエラー
    #[error("Response parsing failed: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// 不正なURL
    #[error("Invalid package database URL: {source}")]
    InvalidUrl {
        #[source]
        source: url::ParseError,
    },

    /// サービス利用不可
    #[error("Package lookup unavailable: {reason}")]
    Unavailable { reason: String },
}

/// 設定関連エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定ファイル読み込みエラー
    #[error("Failed to load config file: {source}")]
    LoadError {
        #[source]
        source: std::io::Error,
    },

    /// 設定ファイルパースエラー
    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    /// 設定ファイルのシリアライズエラー
    #[error("Failed to serialize config: {source}")]
    SerializeError {
        #[source]
        source: toml::ser::Error,
    },

    /// 設定バリデーションエラー
    #[error("Configuration validation failed: {reason}")]
    ValidationError { reason: String },

    /// 設定ファイル書き込みエラー
    #[error("Failed to write config file: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },
}

/// メッセージ読み込み関連エラー
#[derive(Error, Debug)]
pub enum MessageError {
    /// メッセージファイル読み込みエラー
    #[error("Failed to read message: {source}")]
    ReadError {
        #[source]
        source: std::io::Error,
    },

    /// メッセージのJSONパースエラー
    #[error("Failed to parse message: {source}")]
    ParseError {
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for LookupError {
    fn from(error: reqwest::Error) -> Self {
        LookupError::Network { source: error }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(error: serde_json::Error) -> Self {
        LookupError::Parse { source: error }
    }
}

impl From<url::ParseError> for LookupError {
    fn from(error: url::ParseError) -> Self {
        LookupError::InvalidUrl { source: error }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::LoadError { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::SerializeError { source: error }
    }
}

impl From<std::io::Error> for MessageError {
    fn from(error: std::io::Error) -> Self {
        MessageError::ReadError { source: error }
    }
}

impl From<serde_json::Error> for MessageError {
    fn from(error: serde_json::Error) -> Self {
        MessageError::ParseError { source: error }
    }
}
