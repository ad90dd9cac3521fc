//! Validation gate: pure, synchronous per-step field checks.
//!
//! Each [`StepDefinition`] declares its [`FieldRule`]s. Evaluation never does
//! I/O; checks that need the database (e.g. uniqueness) belong to the write
//! path and surface as persistence errors instead.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::{ValidateEmail, ValidateUrl};

use super::steps::StepDefinition;

/// Field name (or `field.index.key` for list items) to a user-facing message.
pub type FieldErrors = BTreeMap<String, String>;

/// Indonesian mobile numbers: `08xx`, `628xx` or `+628xx`, 10-15 digits total.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+62|62|0)8[1-9][0-9]{6,11}$").expect("valid regex"));

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("valid regex"));

/// The predicate a single field must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Present, a string, and not blank.
    RequiredString,
    /// When present, a string of at most this many characters.
    OptionalMaxLength(usize),
    /// Present and a calendar date strictly before today (UTC).
    DateInPast,
    /// Present and a list with at least this many entries.
    ArrayMinLength(usize),
    /// When present, every list entry is an object with these keys non-blank.
    ArrayItemsRequire(&'static [&'static str]),
    /// Present and one of the listed values.
    OneOf(&'static [&'static str]),
    /// Present and a well-formed email address.
    Email,
    /// Present and an Indonesian mobile number.
    Phone,
    /// When present and non-blank, a well-formed URL.
    OptionalUrl,
    /// When present and non-blank, a 5-digit postal code.
    OptionalPostalCode,
}

/// A rule bound to the field it checks.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub kind: RuleKind,
}

impl FieldRule {
    pub const fn new(field: &'static str, kind: RuleKind) -> Self {
        Self { field, kind }
    }
}

/// Outcome of gating one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub valid: bool,
    pub field_errors: FieldErrors,
}

impl StepValidation {
    fn passed() -> Self {
        Self {
            valid: true,
            field_errors: FieldErrors::new(),
        }
    }
}

/// Decide whether `step` passes on `data`.
///
/// Optional steps always pass, whatever they contain. Use
/// [`validate_fields`] to still show inline hints on an optional step.
pub fn validate_step(step: &StepDefinition, data: &Map<String, Value>) -> StepValidation {
    if !step.required {
        return StepValidation::passed();
    }
    let field_errors = validate_fields(step, data);
    StepValidation {
        valid: field_errors.is_empty(),
        field_errors,
    }
}

/// Evaluate every rule of `step` regardless of whether the step is required.
///
/// Only the first violation per field is reported.
pub fn validate_fields(step: &StepDefinition, data: &Map<String, Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in step.rules {
        for (field, message) in evaluate_rule(rule, data.get(rule.field)) {
            errors.entry(field).or_insert(message);
        }
    }
    errors
}

fn evaluate_rule(rule: &FieldRule, value: Option<&Value>) -> Vec<(String, String)> {
    let field = rule.field.to_string();
    let single = |message: Option<String>| message.map(|m| vec![(field.clone(), m)]);

    let found = match rule.kind {
        RuleKind::RequiredString => single(check_required_string(value)),
        RuleKind::OptionalMaxLength(max) => single(check_max_length(value, max)),
        RuleKind::DateInPast => single(check_date_in_past(value, Utc::now().date_naive())),
        RuleKind::ArrayMinLength(min) => single(check_array_min_length(value, min)),
        RuleKind::ArrayItemsRequire(keys) => Some(check_array_items(rule.field, value, keys)),
        RuleKind::OneOf(allowed) => single(check_one_of(value, allowed)),
        RuleKind::Email => single(check_email(value)),
        RuleKind::Phone => single(check_phone(value)),
        RuleKind::OptionalUrl => single(check_optional_url(value)),
        RuleKind::OptionalPostalCode => single(check_optional_postal_code(value)),
    };
    found.unwrap_or_default()
}

const REQUIRED: &str = "This field is required";

/// A string value with surrounding whitespace removed, `None` when absent or blank.
fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_required_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => None,
        Some(v) if !v.is_null() && !v.is_string() => Some("Must be text".to_string()),
        _ => Some(REQUIRED.to_string()),
    }
}

fn check_max_length(value: Option<&Value>, max: usize) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.chars().count() > max => {
            Some(format!("Must be at most {max} characters"))
        }
        Some(Value::String(_)) => None,
        Some(_) => Some("Must be text".to_string()),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn check_date_in_past(value: Option<&Value>, today: NaiveDate) -> Option<String> {
    let Some(raw) = non_blank(value) else {
        return Some(REQUIRED.to_string());
    };
    match parse_date(raw) {
        Some(date) if date < today => None,
        Some(_) => Some("Must be a date in the past".to_string()),
        None => Some("Must be a date in YYYY-MM-DD format".to_string()),
    }
}

fn check_array_min_length(value: Option<&Value>, min: usize) -> Option<String> {
    match value {
        Some(Value::Array(items)) if items.len() >= min => None,
        Some(Value::Array(_)) | None | Some(Value::Null) => {
            Some(format!("Add at least {min} item(s)"))
        }
        Some(_) => Some("Must be a list".to_string()),
    }
}

fn check_array_items(
    field: &str,
    value: Option<&Value>,
    keys: &[&str],
) -> Vec<(String, String)> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => return vec![(field.to_string(), "Must be a list".to_string())],
    };

    let mut errors = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            errors.push((format!("{field}.{idx}"), "Must be an object".to_string()));
            continue;
        };
        for key in keys {
            if non_blank(obj.get(*key)).is_none() {
                errors.push((format!("{field}.{idx}.{key}"), REQUIRED.to_string()));
            }
        }
    }
    errors
}

fn check_one_of(value: Option<&Value>, allowed: &[&str]) -> Option<String> {
    let Some(s) = non_blank(value) else {
        return Some(REQUIRED.to_string());
    };
    if allowed.contains(&s) {
        None
    } else {
        Some(format!("Must be one of: {}", allowed.join(", ")))
    }
}

fn check_email(value: Option<&Value>) -> Option<String> {
    let Some(s) = non_blank(value) else {
        return Some(REQUIRED.to_string());
    };
    if s.validate_email() {
        None
    } else {
        Some("Must be a valid email address".to_string())
    }
}

/// Strip the separators people commonly type into phone numbers.
fn normalize_phone(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')')).collect()
}

fn check_phone(value: Option<&Value>) -> Option<String> {
    let Some(s) = non_blank(value) else {
        return Some(REQUIRED.to_string());
    };
    if PHONE_RE.is_match(&normalize_phone(s)) {
        None
    } else {
        Some("Must be a valid Indonesian mobile number".to_string())
    }
}

fn check_optional_url(value: Option<&Value>) -> Option<String> {
    if is_absent(value) {
        return None;
    }
    match non_blank(value) {
        Some(s) if s.validate_url() => None,
        _ => Some("Must be a valid URL".to_string()),
    }
}

fn check_optional_postal_code(value: Option<&Value>) -> Option<String> {
    if is_absent(value) {
        return None;
    }
    match non_blank(value) {
        Some(s) if POSTAL_CODE_RE.is_match(s) => None,
        _ => Some("Must be a 5-digit postal code".to_string()),
    }
}
