use std::num::IntErrorKind;

use tracing::{debug, warn};

use crate::defs::{default_rules, Action, Classification, NoActionReason, SignalRule};

pub const DEFAULT_CONFIDENCE_THRESHOLD: i64 = 70;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("confidence threshold out of range: {0}")]
    ThresholdOutOfRange(i64),
}

/// Reads the `Confidence` field. Missing or non-numeric values count as 0.
/// Integers too large for `i64` saturate.
pub fn parse_confidence(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim) else {
        return 0;
    };

    match raw.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// Maps a classification to exactly one action.
///
/// Evaluation order is fixed: relevance gate, confidence gate, then the rule
/// table top to bottom with the first match winning.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    threshold: i64,
    rules: Vec<SignalRule>,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD, default_rules())
    }
}

impl DecisionEngine {
    pub fn new(threshold: i64, rules: Vec<SignalRule>) -> Self {
        Self { threshold, rules }
    }

    pub fn with_threshold(threshold: i64) -> Self {
        Self::new(threshold, default_rules())
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn rules(&self) -> &[SignalRule] {
        &self.rules
    }

    pub fn evaluate(&self, classification: &Classification) -> Result<Action, DecisionError> {
        if !(0..=100).contains(&self.threshold) {
            return Err(DecisionError::ThresholdOutOfRange(self.threshold));
        }

        let confidence = parse_confidence(classification.confidence());

        if classification.market_relevant() != Some("Yes") {
            return Ok(Action::NoAction(NoActionReason::NotMarketRelevant));
        }

        if confidence < self.threshold {
            return Ok(Action::NoAction(NoActionReason::LowConfidence));
        }

        let category = classification.category();
        let sentiment = classification.sentiment();

        match self.rules.iter().find(|rule| rule.matches(category, sentiment)) {
            Some(rule) => {
                debug!(
                    "Rule matched: {} + {} -> {}",
                    rule.category, rule.sentiment, rule.action
                );
                Ok(Action::Trade(rule.action.clone()))
            }
            None => Ok(Action::NoAction(NoActionReason::RuleMismatch)),
        }
    }

    /// Never fails: evaluation errors become `NO ACTION (Error: ...)`.
    pub fn decide(&self, classification: &Classification) -> Action {
        match self.evaluate(classification) {
            Ok(action) => action,
            Err(e) => {
                warn!("Decision evaluation failed: {}", e);
                Action::NoAction(NoActionReason::Error(e.to_string()))
            }
        }
    }
}
