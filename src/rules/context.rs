use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context key carrying the user identity
pub const FASNICK_KEY: &str = "fasnick";

/// Open-ended keyword arguments passed to a rule alongside the message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleContext {
    values: Map<String, Value>,
}

impl RuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a context from `key=value` pairs; every value is stored as a string
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut context = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty key in '{}'", pair));
            }
            context.insert(key, value);
        }
        Ok(context)
    }
}

impl From<Map<String, Value>> for RuleContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// A non-empty user identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Returns `None` for an empty name
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() { None } else { Some(Self(name)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolves the identity a rule should evaluate for.
///
/// The positional value is the default. A `fasnick` entry in the context
/// overrides it whenever the key is present: a string value is used as-is,
/// while `null` or any other type yields no identity. An empty name also
/// yields no identity.
pub fn resolve_identity(positional: Option<&str>, context: &RuleContext) -> Option<Identity> {
    let name = match context.get(FASNICK_KEY) {
        Some(Value::String(name)) => Some(name.as_str()),
        Some(other) => {
            tracing::trace!("Ignoring non-string fasnick in rule context: {}", other);
            None
        }
        None => positional,
    };

    name.and_then(Identity::new)
}
