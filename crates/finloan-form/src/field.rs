//! Form fields and their validation rules.
//!
//! [`validate_field`] is pure: it reads a [`FieldDescriptor`] and returns a
//! fresh [`FieldValidationResult`]. Showing the result is the job of a
//! [`FieldPresenter`](crate::wizard::FieldPresenter).

use serde::{Deserialize, Serialize};

pub const APPLICANT_NAME: &str = "applicant_name";
pub const GENDER: &str = "gender";
pub const MARRIED: &str = "married";
pub const DEPENDENTS: &str = "dependents";
pub const EDUCATION: &str = "education";
pub const SELF_EMPLOYED: &str = "self_employed";
pub const APPLICANT_INCOME: &str = "applicant_income";
pub const COAPPLICANT_INCOME: &str = "coapplicant_income";
pub const LOAN_AMOUNT: &str = "loan_amount";
pub const LOAN_AMOUNT_TERM: &str = "loan_amount_term";
pub const CREDIT_HISTORY: &str = "credit_history";
pub const PROPERTY_AREA: &str = "property_area";

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const INCOME_MESSAGE: &str = "Income must be at least 1000";
pub const LOAN_AMOUNT_MESSAGE: &str = "Loan amount must be between 10K and 1000K";
pub const NAME_MESSAGE: &str = "Name must be at least 2 characters";
pub const TERM_MESSAGE: &str = "Loan term must be a positive number of months";
pub const NUMBER_MESSAGE: &str = "Please enter a valid number";

/// Value written into a checked checkbox.
pub const CHECKED: &str = "Yes";

/// Input widget kind of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Numeric text
    Number,
    /// One of a fixed list of options; empty value means nothing chosen
    Select(Vec<String>),
    /// On/off; checked holds [`CHECKED`], unchecked is empty
    Checkbox,
}

/// A single input of the form together with its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            value: String::new(),
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn select(name: impl Into<String>, label: impl Into<String>, options: &[&str]) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        Self::new(name, label, FieldKind::Select(options))
    }

    pub fn checkbox(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Checkbox)
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set an initial value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.kind, FieldKind::Checkbox) && self.value == CHECKED
    }

    /// Flip a checkbox. Returns false for other kinds.
    pub fn toggle(&mut self) -> bool {
        if !matches!(self.kind, FieldKind::Checkbox) {
            return false;
        }
        self.value = if self.is_checked() {
            String::new()
        } else {
            CHECKED.to_string()
        };
        true
    }

    /// Move a select to the next (or previous) option, wrapping around.
    /// An empty select starts at the first (or last) option.
    pub fn cycle_option(&mut self, forward: bool) -> bool {
        let FieldKind::Select(options) = &self.kind else {
            return false;
        };
        if options.is_empty() {
            return false;
        }
        let len = options.len();
        let next = match options.iter().position(|o| *o == self.value) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.value = options[next].clone();
        true
    }

    /// Whether step and form validation check this field: required fields
    /// always, optional fields once they hold a value.
    pub fn is_gated(&self) -> bool {
        self.required || !self.value.is_empty()
    }

    /// Whether the user types into this field.
    pub fn accepts_text(&self) -> bool {
        matches!(self.kind, FieldKind::Text | FieldKind::Number)
    }
}

/// Outcome of validating one field. `message` is present only when invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationResult {
    pub valid: bool,
    pub message: Option<String>,
}

impl FieldValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Validate a single field.
///
/// Order: the required check, then the rule for the field name, then the
/// numeric check for other number fields. Rules only run against a non-empty
/// value, so an optional empty field is always valid.
pub fn validate_field(field: &FieldDescriptor) -> FieldValidationResult {
    let value = field.value.as_str();

    if field.required && value.trim().is_empty() {
        return FieldValidationResult::invalid(REQUIRED_MESSAGE);
    }

    if value.is_empty() {
        return FieldValidationResult::valid();
    }

    match field.name.as_str() {
        APPLICANT_INCOME => match leading_integer(value) {
            Some(income) if income >= 1000 => FieldValidationResult::valid(),
            _ => FieldValidationResult::invalid(INCOME_MESSAGE),
        },
        LOAN_AMOUNT => match leading_integer(value) {
            Some(amount) if (10..=1000).contains(&amount) => FieldValidationResult::valid(),
            _ => FieldValidationResult::invalid(LOAN_AMOUNT_MESSAGE),
        },
        LOAN_AMOUNT_TERM => match leading_integer(value) {
            Some(months) if months > 0 && u32::try_from(months).is_ok() => {
                FieldValidationResult::valid()
            }
            _ => FieldValidationResult::invalid(TERM_MESSAGE),
        },
        // The stored name is trimmed, so count what will be kept
        APPLICANT_NAME if value.trim().chars().count() < 2 => {
            FieldValidationResult::invalid(NAME_MESSAGE)
        }
        _ if matches!(field.kind, FieldKind::Number) => match leading_integer(value) {
            Some(n) if n >= 0 => FieldValidationResult::valid(),
            _ => FieldValidationResult::invalid(NUMBER_MESSAGE),
        },
        _ => FieldValidationResult::valid(),
    }
}

/// Parse the integer at the start of `value`.
///
/// Leading whitespace and a sign are accepted, trailing text is ignored
/// (`"1500abc"` is 1500). Returns `None` when no digit follows. Values out of
/// range saturate.
pub fn leading_integer(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut result: i64 = 0;
    let mut seen_digit = false;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        let digit = i64::from(b - b'0');
        result = result.saturating_mul(10).saturating_add(digit);
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { -result } else { result })
}
