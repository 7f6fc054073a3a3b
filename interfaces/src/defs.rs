use std::fmt;

use serde::{Deserialize, Serialize};

pub const MARKET_RELEVANT: &str = "MarketRelevant";
pub const CATEGORY: &str = "Category";
pub const SENTIMENT: &str = "Sentiment";
pub const CONFIDENCE: &str = "Confidence";
pub const EXPLANATION: &str = "Explanation";

/// Title text of one feed entry. Identity is the exact trimmed string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Headline(String);

impl Headline {
    /// Returns `None` when the title is blank after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Headline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Headline {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Field name to value mapping parsed from a classifier reply.
///
/// Keeps the order in which keys first appeared. Re-inserting a key replaces
/// its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    fields: Vec<(String, String)>,
}

impl Classification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn market_relevant(&self) -> Option<&str> {
        self.get(MARKET_RELEVANT)
    }

    pub fn category(&self) -> Option<&str> {
        self.get(CATEGORY)
    }

    pub fn sentiment(&self) -> Option<&str> {
        self.get(SENTIMENT)
    }

    pub fn confidence(&self) -> Option<&str> {
        self.get(CONFIDENCE)
    }

    pub fn explanation(&self) -> Option<&str> {
        self.get(EXPLANATION)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Classification {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut classification = Self::new();
        for (key, value) in iter {
            classification.insert(key, value);
        }
        classification
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NoActionReason {
    NotMarketRelevant,
    LowConfidence,
    RuleMismatch,
    Error(String),
}

impl fmt::Display for NoActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMarketRelevant => f.write_str("Not market relevant"),
            Self::LowConfidence => f.write_str("Low confidence"),
            Self::RuleMismatch => f.write_str("Rule mismatch"),
            Self::Error(description) => write!(f, "Error: {}", description),
        }
    }
}

/// Final (simulated) response to a headline. Always rendered through `Display`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Label of the rule that matched, e.g. `SELL BONDS (Paper Trade)`.
    Trade(String),
    NoAction(NoActionReason),
}

impl Action {
    pub fn is_trade(&self) -> bool {
        matches!(self, Self::Trade(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade(label) => f.write_str(label),
            Self::NoAction(reason) => write!(f, "NO ACTION ({})", reason),
        }
    }
}

/// One row of the rule table: exact category and sentiment produce `action`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRule {
    pub category: String,
    pub sentiment: String,
    pub action: String,
}

impl SignalRule {
    pub fn new(
        category: impl Into<String>,
        sentiment: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            sentiment: sentiment.into(),
            action: action.into(),
        }
    }

    pub fn matches(&self, category: Option<&str>, sentiment: Option<&str>) -> bool {
        category == Some(self.category.as_str()) && sentiment == Some(self.sentiment.as_str())
    }
}

pub fn default_rules() -> Vec<SignalRule> {
    vec![
        SignalRule::new("MonetaryPolicy", "Negative", "SELL BONDS (Paper Trade)"),
        SignalRule::new("FiscalPolicy", "Positive", "BUY EQUITIES (Paper Trade)"),
        SignalRule::new("Geopolitics", "Negative", "RISK OFF (Paper Trade)"),
    ]
}
