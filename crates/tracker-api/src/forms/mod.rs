//! # Form Handling
//!
//! Bound form data, per-field error collection and the field cleaners
//! shared by the ticket form and the line-item formsets.
//!
//! Forms never fail a request on bad user input: every problem becomes a
//! message on the field it belongs to and the page is rendered again.
//! Only payloads that cannot be interpreted at all (see
//! [`formset::ManagementError`]) are rejected outright.

pub mod formset;
pub mod ticket_form;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracker_core::Money;

pub use formset::{
    ExpeditureForm, Formset, FormsetChanges, FormsetOptions, FormsetView, LineItemForm,
    ManagementError, MediaForm,
};
pub use ticket_form::{TicketForm, TicketFormView};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const INVALID_NUMBER: &str = "Enter a number.";
pub const INVALID_URL: &str = "Enter a valid URL.";
pub const NOT_NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

/// Date input formats, tried in order.
pub const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];

// -- Bound data ---------------------------------------------------------------

/// Decoded urlencoded form body.
///
/// Keeps every pair in submission order; lookups return the last value
/// for a key, the way browsers' repeated fields are usually read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Raw value of `key`, if submitted.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed value of `key`; missing keys read as blank.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).map(str::trim).unwrap_or("")
    }

    /// Checkbox semantics: checked when present and not blank, `false`
    /// or `0`.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key).map(str::trim) {
            None | Some("") => false,
            Some(v) => !v.eq_ignore_ascii_case("false") && v != "0",
        }
    }
}

// -- Errors -------------------------------------------------------------------

/// Messages per field name, in field order of first error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }
}

// -- Field cleaners -----------------------------------------------------------

/// Returned by the optional-field cleaners once the field's message has
/// been recorded in [`FieldErrors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected;

fn max_length_message(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {max} characters (it has {actual}).")
}

/// Clean a text field. Blank required fields and over-long values add an
/// error and yield `None`; blank optional fields yield `Some("")`.
pub fn clean_text(
    raw: &str,
    field: &str,
    required: bool,
    max: Option<usize>,
    errors: &mut FieldErrors,
) -> Option<String> {
    if raw.is_empty() {
        if required {
            errors.add(field, REQUIRED);
            return None;
        }
        return Some(String::new());
    }
    if let Some(max) = max {
        let len = raw.chars().count();
        if len > max {
            errors.add(field, max_length_message(max, len));
            return None;
        }
    }
    Some(raw.to_string())
}

/// Parse a date in one of [`DATE_INPUT_FORMATS`].
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Clean an optional date field.
pub fn clean_optional_date(
    raw: &str,
    field: &str,
    errors: &mut FieldErrors,
) -> Result<Option<NaiveDate>, Rejected> {
    if raw.is_empty() {
        return Ok(None);
    }
    match parse_date(raw) {
        Some(date) => Ok(Some(date)),
        None => {
            errors.add(field, INVALID_DATE);
            Err(Rejected)
        }
    }
}

/// Clean an optional non-negative integer field.
pub fn clean_optional_count(
    raw: &str,
    field: &str,
    errors: &mut FieldErrors,
) -> Result<Option<u32>, Rejected> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<i64>() {
        Ok(n) if n < 0 => {
            errors.add(field, NOT_NEGATIVE);
            Err(Rejected)
        }
        Ok(n) => match u32::try_from(n) {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                errors.add(field, format!("Ensure this value is less than or equal to {}.", u32::MAX));
                Err(Rejected)
            }
        },
        Err(_) => {
            errors.add(field, INVALID_INTEGER);
            Err(Rejected)
        }
    }
}

/// Clean an optional http(s) URL field.
pub fn clean_optional_url(
    raw: &str,
    field: &str,
    max: usize,
    errors: &mut FieldErrors,
) -> Result<Option<String>, Rejected> {
    if raw.is_empty() {
        return Ok(None);
    }
    // Scheme-less input such as "example.com/x" is read as http.
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    // The limit applies to the stored value, scheme included.
    let len = candidate.chars().count();
    if len > max {
        errors.add(field, max_length_message(max, len));
        return Err(Rejected);
    }
    match url::Url::parse(&candidate) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            Ok(Some(candidate))
        }
        _ => {
            errors.add(field, INVALID_URL);
            Err(Rejected)
        }
    }
}

/// Clean a required amount with at most `max_digits` significant digits.
pub fn clean_amount(
    raw: &str,
    field: &str,
    max_digits: usize,
    errors: &mut FieldErrors,
) -> Option<Money> {
    use tracker_core::AmountError;

    match Money::parse_with_max_digits(raw, max_digits) {
        Ok(amount) => Some(amount),
        Err(AmountError::Empty) => {
            errors.add(field, REQUIRED);
            None
        }
        Err(AmountError::NotANumber(_)) | Err(AmountError::Overflow) => {
            errors.add(field, INVALID_NUMBER);
            None
        }
        Err(other) => {
            errors.add(field, other.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn last_value_wins_and_values_are_trimmed() {
        let d = data(&[("a", "1"), ("a", "  2 ")]);
        assert_eq!(d.get("a"), Some("  2 "));
        assert_eq!(d.value("a"), "2");
        assert_eq!(d.value("missing"), "");
    }

    #[test]
    fn checkbox_truthiness() {
        let d = data(&[("on", "on"), ("blank", ""), ("no", "false"), ("zero", "0")]);
        assert!(d.flag("on"));
        assert!(!d.flag("blank"));
        assert!(!d.flag("no"));
        assert!(!d.flag("zero"));
        assert!(!d.flag("absent"));
    }

    #[test]
    fn dates_in_all_input_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 14);
        assert_eq!(parse_date("2026-03-14"), expected);
        assert_eq!(parse_date("14.03.2026"), expected);
        assert_eq!(parse_date("03/14/2026"), expected);
        assert_eq!(parse_date("14/03/2026"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn clean_text_rules() {
        let mut errors = FieldErrors::default();
        assert_eq!(clean_text("", "summary", true, None, &mut errors), None);
        assert_eq!(errors.get("summary"), [REQUIRED.to_string()]);

        let mut errors = FieldErrors::default();
        assert_eq!(clean_text("", "description", false, None, &mut errors), Some(String::new()));
        assert!(errors.is_empty());

        let mut errors = FieldErrors::default();
        assert_eq!(clean_text("abcd", "x", true, Some(3), &mut errors), None);
        assert!(errors.get("x")[0].contains("at most 3 characters (it has 4)"));
    }

    #[test]
    fn count_must_be_non_negative_integer() {
        let mut errors = FieldErrors::default();
        assert_eq!(clean_optional_count("12", "count", &mut errors), Ok(Some(12)));
        assert_eq!(clean_optional_count("", "count", &mut errors), Ok(None));
        assert!(errors.is_empty());
        assert!(clean_optional_count("-1", "count", &mut errors).is_err());
        assert!(clean_optional_count("1.5", "count", &mut errors).is_err());
        assert_eq!(errors.get("count"), [NOT_NEGATIVE.to_string(), INVALID_INTEGER.to_string()]);
    }

    #[test]
    fn urls_must_be_http() {
        let mut errors = FieldErrors::default();
        assert_eq!(
            clean_optional_url("https://commons.example.org/x", "url", 255, &mut errors),
            Ok(Some("https://commons.example.org/x".to_string()))
        );
        assert_eq!(
            clean_optional_url("example.org/photo", "url", 255, &mut errors),
            Ok(Some("http://example.org/photo".to_string()))
        );
        assert!(errors.is_empty());
        assert!(clean_optional_url("ftp://example.org", "url", 255, &mut errors).is_err());
        assert_eq!(errors.get("url"), [INVALID_URL.to_string()]);
    }

    #[test]
    fn url_length_counts_the_added_scheme() {
        let mut errors = FieldErrors::default();
        let raw = format!("example.org/{}", "a".repeat(243));
        assert_eq!(raw.chars().count(), 255);
        assert_eq!(clean_optional_url(&raw, "url", 255, &mut errors), Err(Rejected));
        assert!(errors.get("url")[0].contains("at most 255 characters (it has 262)"));

        let mut errors = FieldErrors::default();
        let fits = format!("example.org/{}", "a".repeat(236));
        let cleaned = clean_optional_url(&fits, "url", 255, &mut errors).unwrap().unwrap();
        assert_eq!(cleaned.chars().count(), 255);
        assert!(errors.is_empty());
    }

    #[test]
    fn amounts_report_field_messages() {
        let mut errors = FieldErrors::default();
        assert_eq!(
            clean_amount("12.5", "amount", 8, &mut errors),
            Some(Money::from_cents(1_250))
        );
        assert_eq!(clean_amount("", "amount", 8, &mut errors), None);
        assert_eq!(clean_amount("abc", "amount", 8, &mut errors), None);
        assert_eq!(clean_amount("1.234", "amount", 8, &mut errors), None);
        assert_eq!(clean_amount("1234567.00", "amount", 8, &mut errors), None);
        assert_eq!(
            errors.get("amount"),
            [
                REQUIRED.to_string(),
                INVALID_NUMBER.to_string(),
                "Ensure that there are no more than 2 decimal places.".to_string(),
                "Ensure that there are no more than 8 digits in total.".to_string(),
            ]
        );
    }
}
