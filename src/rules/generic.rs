use crate::errors::LookupError;
use crate::rules::context::{RuleContext, resolve_identity};
use crate::rules::result::MatchResult;
use crate::traits::{MessageMeta, PackageLookup, RuleConfig};

/// All messages of a user.
///
/// Matches messages associated with the given user (author, commenter,
/// owner, ...). Usernames are compared exactly.
pub fn user_filter<C, M>(
    _config: &C,
    message: &M,
    fasnick: Option<&str>,
    context: &RuleContext,
) -> MatchResult
where
    C: RuleConfig + ?Sized,
    M: MessageMeta + ?Sized,
{
    let Some(identity) = resolve_identity(fasnick, context) else {
        tracing::trace!("user_filter not applicable: no identity");
        return MatchResult::NotApplicable;
    };

    let matched = message.usernames().contains(identity.as_str());
    tracing::debug!(
        "user_filter for '{}': {}",
        identity.as_str(),
        if matched { "match" } else { "no match" }
    );

    MatchResult::from_bool(matched)
}

/// All messages concerning a user's packages.
///
/// Matches messages about packages the user holds **commit** ACLs on. The
/// lookup is queried once per call; its failures are returned unchanged.
pub async fn user_package_filter<C, M, L>(
    _config: &C,
    message: &M,
    lookup: &L,
    fasnick: Option<&str>,
    context: &RuleContext,
) -> Result<MatchResult, LookupError>
where
    C: RuleConfig + ?Sized,
    M: MessageMeta + ?Sized,
    L: PackageLookup,
{
    let Some(identity) = resolve_identity(fasnick, context) else {
        tracing::trace!("user_package_filter not applicable: no identity");
        return Ok(MatchResult::NotApplicable);
    };

    let owned = lookup.packages_of_user(identity.as_str()).await?;
    let message_packages = message.packages();
    let matched = !owned.is_disjoint(&message_packages);

    tracing::debug!(
        "user_package_filter for '{}': {} (owned: {}, message: {})",
        identity.as_str(),
        if matched { "match" } else { "no match" },
        owned.len(),
        message_packages.len()
    );

    Ok(MatchResult::from_bool(matched))
}
