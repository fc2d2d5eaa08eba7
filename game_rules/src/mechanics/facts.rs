//! Extracted facts - typed view of what an extraction service found in a message.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::entities::ProfileField;
use crate::error::RulesError;

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl FactValue {
    pub fn text(value: impl Into<String>) -> Self {
        FactValue::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FactValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Whether the value carries nothing worth merging.
    pub fn is_empty(&self) -> bool {
        match self {
            FactValue::Number(_) => false,
            FactValue::Text(text) => text.trim().is_empty(),
            FactValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }

    /// The value as sequence items: comma-separated text is split, everything is trimmed
    /// and blank items are dropped.
    pub fn items(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            FactValue::Text(text) => text.split(',').collect(),
            FactValue::List(items) => items.iter().map(String::as_str).collect(),
            FactValue::Number(n) => return vec![n.to_string()],
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The value as a single trimmed text, `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            FactValue::Text(text) => text.trim().to_string(),
            FactValue::Number(n) => n.to_string(),
            FactValue::List(_) => self.items().join(", "),
        };
        (!text.is_empty()).then_some(text)
    }

    /// The value as an age. Text is accepted when it contains a number ("27", "27 years").
    pub fn as_age(&self) -> Option<u32> {
        match self {
            FactValue::Number(n) => u32::try_from(*n).ok().filter(|age| *age > 0),
            FactValue::Text(text) => {
                let digits: String = text
                    .trim()
                    .chars()
                    .skip_while(|c| !c.is_ascii_digit())
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse::<u32>().ok().filter(|age| *age > 0)
            }
            FactValue::List(_) => None,
        }
    }

    fn from_json(value: Value) -> Option<Self> {
        let fact = match value {
            Value::String(text) => FactValue::Text(text.trim().to_string()),
            Value::Number(number) => FactValue::Number(
                number
                    .as_i64()
                    .or_else(|| number.as_f64().map(|f| f as i64))?,
            ),
            Value::Array(items) => FactValue::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        Value::Number(number) => Some(number.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Null | Value::Bool(_) | Value::Object(_) => return None,
        };
        (!fact.is_empty()).then_some(fact)
    }
}

/// Field → value mapping returned by the extraction service for one message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedFacts {
    values: BTreeMap<ProfileField, FactValue>,
}

impl ExtractedFacts {
    /// An empty mapping ("no new facts").
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style. Empty values are ignored.
    pub fn with(mut self, field: ProfileField, value: FactValue) -> Self {
        self.insert(field, value);
        self
    }

    /// Add a value. Empty values are ignored.
    pub fn insert(&mut self, field: ProfileField, value: FactValue) {
        if !value.is_empty() {
            self.values.insert(field, value);
        }
    }

    pub fn get(&self, field: ProfileField) -> Option<&FactValue> {
        self.values.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileField, &FactValue)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Parse raw extraction output.
    ///
    /// Accepts a bare JSON object or one wrapped in a Markdown code fence.
    /// Unknown keys, nulls and blank values are dropped.
    pub fn from_json(raw: &str) -> Result<Self, RulesError> {
        let body = strip_code_fence(raw);
        let value: Value = serde_json::from_str(body).map_err(RulesError::invalid_facts)?;
        Self::from_value(value)
    }

    /// Build from an already parsed JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, RulesError> {
        let Value::Object(map) = value else {
            return Err(RulesError::invalid_facts("expected a JSON object"));
        };

        let mut facts = Self::new();
        for (key, value) in map {
            let Some(field) = ProfileField::from_key(&key) else {
                continue;
            };
            if let Some(fact) = FactValue::from_json(value) {
                facts.insert(field, fact);
            }
        }
        Ok(facts)
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let raw = raw.trim();
    let (start, marker_len) = match (raw.find("```json"), raw.find("```")) {
        (Some(start), _) => (start, "```json".len()),
        (None, Some(start)) => (start, "```".len()),
        (None, None) => return raw,
    };
    let body = &raw[start + marker_len..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let facts = ExtractedFacts::from_json(
            r#"{"name": "Hana", "age": 24, "likes": "tennis, baking", "mood": "great"}"#,
        )
        .unwrap();

        assert_eq!(facts.len(), 3);
        assert_eq!(facts.get(ProfileField::Name), Some(&FactValue::text("Hana")));
        assert_eq!(facts.get(ProfileField::Age), Some(&FactValue::Number(24)));
        assert_eq!(
            facts.get(ProfileField::Likes).unwrap().items(),
            vec!["tennis", "baking"]
        );
    }

    #[test]
    fn test_parse_fenced_output() {
        let raw = "Here you go:\n```json\n{\"fears\": [\"spiders\", \"\"], \"background\": null}\n```";
        let facts = ExtractedFacts::from_json(raw).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.get(ProfileField::Fears).unwrap().items(), vec!["spiders"]);
    }

    #[test]
    fn test_blank_values_are_dropped() {
        let facts = ExtractedFacts::from_json(r#"{"name": "  ", "likes": [], "occupation": ""}"#).unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_unparsable_output_is_an_error() {
        assert!(matches!(
            ExtractedFacts::from_json("I could not find anything"),
            Err(RulesError::InvalidFacts(_))
        ));
        assert!(ExtractedFacts::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_age_from_text() {
        assert_eq!(FactValue::text("27 years old").as_age(), Some(27));
        assert_eq!(FactValue::text("about 30").as_age(), Some(30));
        assert_eq!(FactValue::text("unknown").as_age(), None);
        assert_eq!(FactValue::Number(-3).as_age(), None);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(FactValue::text("  Daegu ").as_text(), Some("Daegu".to_string()));
        assert_eq!(FactValue::list(["a", " b "]).as_text(), Some("a, b".to_string()));
        assert_eq!(FactValue::text("").as_text(), None);
    }
}
