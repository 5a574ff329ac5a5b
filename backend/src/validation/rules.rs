//! Ordered, named validation steps.
//!
//! A [`RuleSet`] is a list of [`FieldRule`]s; each rule is a list of
//! [`Step`]s run in order against one field. Sanitizing steps rewrite the
//! value, checking steps record a [`FieldError`] and let the chain continue, so
//! one submission reports every violated constraint at once.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::form::{FieldValue, FormData, FormValues};

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// One step of a field's pipeline.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Strip surrounding whitespace.
    Trim,
    /// Replace HTML-significant characters with entities.
    Escape,
    /// Fail when the value is empty.
    NotEmpty(&'static str),
    /// Fail unless the value is non-empty ASCII letters and digits.
    Alphanumeric(&'static str),
    /// Fail unless the value parses as an ISO-8601 calendar date.
    IsoDate(&'static str),
    /// Fail unless the value equals one of the listed literals.
    OneOf(&'static [&'static str], &'static str),
    /// Fail unless the value is a well-formed record identifier.
    Identifier(&'static str),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Trim => "trim",
            Step::Escape => "escape",
            Step::NotEmpty(_) => "not_empty",
            Step::Alphanumeric(_) => "alphanumeric",
            Step::IsoDate(_) => "iso_date",
            Step::OneOf(..) => "one_of",
            Step::Identifier(_) => "identifier",
        }
    }

    /// Run the step, rewriting `value` or returning the failure message.
    fn run(&self, value: &mut String) -> Result<(), &'static str> {
        match *self {
            Step::Trim => {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
                Ok(())
            }
            Step::Escape => {
                *value = escape_html(value);
                Ok(())
            }
            Step::NotEmpty(message) => check(!value.is_empty(), message),
            Step::Alphanumeric(message) => check(
                !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()),
                message,
            ),
            Step::IsoDate(message) => check(parse_iso_date(value).is_some(), message),
            Step::OneOf(allowed, message) => {
                check(allowed.iter().any(|a| *a == value.as_str()), message)
            }
            Step::Identifier(message) => check(Uuid::parse_str(value).is_ok(), message),
        }
    }
}

fn check(ok: bool, message: &'static str) -> Result<(), &'static str> {
    if ok {
        Ok(())
    } else {
        Err(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// Absent fields are treated as an empty string.
    Required,
    /// Absent or empty fields skip the whole pipeline.
    Optional,
    /// Normalized to a sequence; the pipeline runs on every element.
    Each,
}

/// The pipeline for one form field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    presence: Presence,
    steps: Vec<Step>,
}

impl FieldRule {
    pub fn required(field: &'static str) -> Self {
        Self::with_presence(field, Presence::Required)
    }

    pub fn optional(field: &'static str) -> Self {
        Self::with_presence(field, Presence::Optional)
    }

    pub fn each(field: &'static str) -> Self {
        Self::with_presence(field, Presence::Each)
    }

    fn with_presence(field: &'static str, presence: Presence) -> Self {
        Self {
            field,
            presence,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn trim(self) -> Self {
        self.step(Step::Trim)
    }

    pub fn escape(self) -> Self {
        self.step(Step::Escape)
    }

    pub fn not_empty(self, message: &'static str) -> Self {
        self.step(Step::NotEmpty(message))
    }

    pub fn alphanumeric(self, message: &'static str) -> Self {
        self.step(Step::Alphanumeric(message))
    }

    pub fn iso_date(self, message: &'static str) -> Self {
        self.step(Step::IsoDate(message))
    }

    pub fn one_of(self, allowed: &'static [&'static str], message: &'static str) -> Self {
        self.step(Step::OneOf(allowed, message))
    }

    pub fn identifier(self, message: &'static str) -> Self {
        self.step(Step::Identifier(message))
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::name).collect()
    }

    fn run_steps(&self, value: &mut String, errors: &mut Vec<FieldError>) {
        for step in &self.steps {
            if let Err(message) = step.run(value) {
                errors.push(FieldError::new(self.field, message));
            }
        }
    }

    fn apply(&self, form: &FormData, values: &mut FormValues, errors: &mut Vec<FieldError>) {
        match self.presence {
            Presence::Required => {
                let mut value = form.first(self.field).unwrap_or_default().to_string();
                self.run_steps(&mut value, errors);
                values.insert(self.field.to_string(), FieldValue::Single(value));
            }
            Presence::Optional => {
                let Some(raw) = form.first(self.field) else {
                    return;
                };
                let mut value = raw.to_string();
                if !value.is_empty() {
                    self.run_steps(&mut value, errors);
                }
                values.insert(self.field.to_string(), FieldValue::Single(value));
            }
            Presence::Each => {
                let list = form
                    .all(self.field)
                    .into_iter()
                    .map(|raw| {
                        let mut value = raw.to_string();
                        self.run_steps(&mut value, errors);
                        value
                    })
                    .collect();
                values.insert(self.field.to_string(), FieldValue::List(list));
            }
        }
    }
}

/// Every field rule for one form, in reporting order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Run every pipeline against `form`.
    pub fn apply(&self, form: &FormData) -> Sanitized {
        let mut values = FormValues::new();
        let mut errors = Vec::new();
        for rule in &self.rules {
            rule.apply(form, &mut values, &mut errors);
        }
        Sanitized { values, errors }
    }
}

/// Output of a [`RuleSet`]: the sanitized values and the accumulated errors.
#[derive(Debug, Clone, Default)]
pub struct Sanitized {
    pub values: FormValues,
    pub errors: Vec<FieldError>,
}

impl Sanitized {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Single value of `field`, empty when absent.
    pub fn text(&self, field: &str) -> &str {
        self.values.get(field).map(FieldValue::as_str).unwrap_or("")
    }

    /// All values of a multi-valued `field`.
    pub fn list(&self, field: &str) -> Vec<&str> {
        self.values
            .get(field)
            .map(FieldValue::as_list)
            .unwrap_or_default()
    }

    /// Optional date field, `None` when absent or empty.
    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        parse_iso_date(self.text(field))
    }
}

/// Parse an ISO-8601 calendar date.
///
/// Accepts `YYYY-MM-DD` as well as full date-times (with or without an
/// offset), keeping only the date part.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Replace the characters that are significant in HTML with entities.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_rule() -> RuleSet {
        RuleSet::new().rule(
            FieldRule::required("first_name")
                .trim()
                .not_empty("First name must be specified.")
                .escape()
                .alphanumeric("First name has non-alphanumeric characters."),
        )
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;&#x2F;b&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_trim_then_accept() {
        let out = name_rule().apply(&FormData::new().with("first_name", "  Frank  "));
        assert!(out.is_valid());
        assert_eq!(out.text("first_name"), "Frank");
    }

    #[test]
    fn test_every_violated_constraint_is_reported() {
        let out = name_rule().apply(&FormData::new().with("first_name", "   "));
        let messages: Vec<_> = out.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "First name must be specified.",
                "First name has non-alphanumeric characters."
            ]
        );
    }

    #[test]
    fn test_missing_required_field_counts_as_empty() {
        let out = name_rule().apply(&FormData::new());
        assert_eq!(out.errors.len(), 2);
        assert_eq!(out.text("first_name"), "");
    }

    #[test]
    fn test_optional_field_skips_when_empty() {
        let rules = RuleSet::new().rule(FieldRule::optional("due_back").iso_date("Invalid date"));
        assert!(rules.apply(&FormData::new()).is_valid());
        assert!(rules.apply(&FormData::new().with("due_back", "")).is_valid());

        let bad = rules.apply(&FormData::new().with("due_back", "31/12/2020"));
        assert_eq!(bad.errors, vec![FieldError::new("due_back", "Invalid date")]);
    }

    #[test]
    fn test_each_runs_per_element() {
        let rules = RuleSet::new().rule(FieldRule::each("genre").escape());
        let out = rules.apply(&FormData::new().with("genre", "a<b").with("genre", "c"));
        assert_eq!(out.list("genre"), vec!["a&lt;b", "c"]);

        let none = rules.apply(&FormData::new());
        assert!(none.list("genre").is_empty());
    }

    #[test]
    fn test_one_of_is_exact() {
        let rules = RuleSet::new().rule(FieldRule::required("status").one_of(
            &["Available", "Loaned"],
            "Invalid status",
        ));
        assert!(rules.apply(&FormData::new().with("status", "Loaned")).is_valid());
        assert!(!rules.apply(&FormData::new().with("status", "loaned")).is_valid());
    }

    #[test]
    fn test_parse_iso_date_variants() {
        let expected = NaiveDate::from_ymd_opt(1920, 10, 8);
        assert_eq!(parse_iso_date("1920-10-08"), expected);
        assert_eq!(parse_iso_date("1920-10-08T10:00:00Z"), expected);
        assert_eq!(parse_iso_date("1920-10-08T10:00:00"), expected);
        assert_eq!(parse_iso_date("1920-13-08"), None);
        assert_eq!(parse_iso_date("yesterday"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn test_step_names_follow_declaration_order() {
        let rules = name_rule();
        assert_eq!(
            rules.rules()[0].step_names(),
            vec!["trim", "not_empty", "escape", "alphanumeric"]
        );
    }
}
