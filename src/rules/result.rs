use std::fmt;

/// Outcome of evaluating a single rule against a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    Match,
    NoMatch,
    /// The rule lacked the context it needs (e.g. no user identity) and has no opinion
    NotApplicable,
}

impl MatchResult {
    pub fn from_bool(matched: bool) -> Self {
        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    pub fn is_match(self) -> bool {
        self == MatchResult::Match
    }

    pub fn is_applicable(self) -> bool {
        self != MatchResult::NotApplicable
    }

    /// Legacy nullable-boolean form (`None` = not applicable)
    pub fn as_option(self) -> Option<bool> {
        match self {
            MatchResult::Match => Some(true),
            MatchResult::NoMatch => Some(false),
            MatchResult::NotApplicable => None,
        }
    }
}

impl From<bool> for MatchResult {
    fn from(matched: bool) -> Self {
        MatchResult::from_bool(matched)
    }
}

impl From<Option<bool>> for MatchResult {
    fn from(value: Option<bool>) -> Self {
        value.map_or(MatchResult::NotApplicable, MatchResult::from_bool)
    }
}

impl From<MatchResult> for Option<bool> {
    fn from(result: MatchResult) -> Self {
        result.as_option()
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchResult::Match => "match",
            MatchResult::NoMatch => "no-match",
            MatchResult::NotApplicable => "not-applicable",
        };
        f.write_str(label)
    }
}
