//! Submitted form fields and the sanitized values echoed back to views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw `application/x-www-form-urlencoded` fields, in submission order.
///
/// Repeated keys are kept, which is how multi-valued fields such as a book's
/// genres arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Append a field. Mostly useful for building submissions in tests.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((field.into(), value.into()));
        self
    }

    /// First value submitted for `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted for `field`: empty when absent, one element for a
    /// single submission, all of them in order otherwise.
    pub fn all(&self, field: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One field's sanitized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Single(v) => v,
            FieldValue::List(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn as_list(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(v) => vec![v.as_str()],
            FieldValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Field name to sanitized value, as handed to a form view.
pub type FormValues = BTreeMap<String, FieldValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_normalizes_to_sequence() {
        let empty = FormData::new();
        assert!(empty.all("genre").is_empty());

        let single = FormData::new().with("genre", "a");
        assert_eq!(single.all("genre"), vec!["a"]);

        let many = FormData::new().with("genre", "a").with("title", "t").with("genre", "b");
        assert_eq!(many.all("genre"), vec!["a", "b"]);
    }

    #[test]
    fn test_first_takes_earliest_value() {
        let form: FormData = vec![("name", "one"), ("name", "two")].into_iter().collect();
        assert_eq!(form.first("name"), Some("one"));
        assert_eq!(form.first("missing"), None);
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let single = serde_json::to_string(&FieldValue::Single("x".into())).unwrap();
        let list = serde_json::to_string(&FieldValue::List(vec!["a".into()])).unwrap();
        assert_eq!(single, "\"x\"");
        assert_eq!(list, "[\"a\"]");
    }
}
