use crate::defs::Classification;

/// Turns a classifier reply into a `Classification`.
///
/// Every line holding a colon is split at the first colon into a trimmed key
/// and value. Other lines are dropped. A repeated key keeps the last value.
/// Malformed or empty input gives an empty mapping.
pub fn parse_response(text: &str) -> Classification {
    let mut classification = Classification::new();

    for line in text.split('\n') {
        if let Some((key, value)) = line.split_once(':') {
            classification.insert(key.trim(), value.trim());
        }
    }

    classification
}
