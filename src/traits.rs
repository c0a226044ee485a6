use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::errors::LookupError;

/// Opaque engine configuration handed to every rule.
///
/// The rules in this crate never read it; it keeps the rule signature uniform
/// for rules that need engine-wide settings.
pub trait RuleConfig: Send + Sync {}

/// Metadata a rule can derive from a normalized message
pub trait MessageMeta {
    /// Usernames associated with the message (author, commenter, owner, ...)
    fn usernames(&self) -> HashSet<String>;

    /// Package names the message is about
    fn packages(&self) -> HashSet<String>;
}

/// Resolves the set of packages a user can commit to
pub trait PackageLookup: Send + Sync {
    fn packages_of_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<HashSet<String>, LookupError>> + Send;
}

impl<L: PackageLookup> PackageLookup for Arc<L> {
    fn packages_of_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<HashSet<String>, LookupError>> + Send {
        (**self).packages_of_user(username)
    }
}

impl RuleConfig for () {}
