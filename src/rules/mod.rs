pub mod context;
pub mod generic;
pub mod result;

pub use context::{FASNICK_KEY, Identity, RuleContext, resolve_identity};
pub use generic::{user_filter, user_package_filter};
pub use result::MatchResult;
