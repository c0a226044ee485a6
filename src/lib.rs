pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod meta;
pub mod pkgdb;
pub mod rules;
pub mod traits;

pub use cache::CachedLookup;
pub use config::Config;
pub use errors::{AppError, ConfigError, LookupError, MessageError};
pub use meta::FedMessage;
pub use pkgdb::PkgdbClient;
pub use rules::{MatchResult, RuleContext, resolve_identity, user_filter, user_package_filter};
pub use traits::{MessageMeta, PackageLookup, RuleConfig};
