//! The loan application form: fields grouped into steps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::field::{self, FieldDescriptor};

/// One page (fieldset) of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStep {
    /// 1-indexed step number
    pub number: usize,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

impl FormStep {
    pub fn new(number: usize, title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            number,
            title: title.into(),
            fields,
        }
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Fields the step gate validates; see [`FieldDescriptor::is_gated`].
    pub fn gated_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_gated())
    }
}

/// An ordered set of steps. Step numbers are assigned from position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanForm {
    steps: Vec<FormStep>,
}

impl LoanForm {
    /// Build a form from `(title, fields)` pairs, numbering steps from 1.
    pub fn from_steps(steps: Vec<(String, Vec<FieldDescriptor>)>) -> Self {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(i, (title, fields))| FormStep::new(i + 1, title, fields))
            .collect();
        Self { steps }
    }

    /// The three-step loan application.
    pub fn loan_application() -> Self {
        use field::*;

        Self::from_steps(vec![
            (
                "Personal Details".to_string(),
                vec![
                    FieldDescriptor::text(APPLICANT_NAME, "Full name").required(),
                    FieldDescriptor::select(GENDER, "Gender", &["Male", "Female"]).required(),
                    FieldDescriptor::select(MARRIED, "Married", &["Yes", "No"]).required(),
                    FieldDescriptor::select(DEPENDENTS, "Dependents", &["0", "1", "2", "3+"])
                        .required(),
                    FieldDescriptor::select(EDUCATION, "Education", &["Graduate", "Not Graduate"])
                        .required(),
                ],
            ),
            (
                "Income & Loan".to_string(),
                vec![
                    FieldDescriptor::select(SELF_EMPLOYED, "Self employed", &["Yes", "No"])
                        .required(),
                    FieldDescriptor::number(APPLICANT_INCOME, "Monthly income").required(),
                    FieldDescriptor::number(COAPPLICANT_INCOME, "Co-applicant income"),
                    FieldDescriptor::number(LOAN_AMOUNT, "Loan amount (thousands)").required(),
                    FieldDescriptor::number(LOAN_AMOUNT_TERM, "Loan term (months)")
                        .required()
                        .with_value("360"),
                ],
            ),
            (
                "Credit & Property".to_string(),
                vec![
                    FieldDescriptor::checkbox(CREDIT_HISTORY, "Meets credit guidelines"),
                    FieldDescriptor::select(PROPERTY_AREA, "Property area", &["Urban", "Semiurban", "Rural"])
                        .required(),
                ],
            ),
        ])
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[FormStep] {
        &self.steps
    }

    pub fn step(&self, number: usize) -> Option<&FormStep> {
        number.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn step_mut(&mut self, number: usize) -> Option<&mut FormStep> {
        let index = number.checked_sub(1)?;
        self.steps.get_mut(index)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.steps.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        self.steps
            .iter_mut()
            .flat_map(|s| s.fields.iter_mut())
            .find(|f| f.name == name)
    }

    /// Current value of `name`, empty when the field does not exist.
    pub fn value(&self, name: &str) -> &str {
        self.field(name).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// Set the value of `name`. Returns false for unknown fields.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.field_mut(name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Step number containing `name`.
    pub fn step_of(&self, name: &str) -> Option<usize> {
        self.steps
            .iter()
            .find(|s| s.fields.iter().any(|f| f.name == name))
            .map(|s| s.number)
    }

    /// Snapshot of every field value, keyed by field name.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.fields()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Copy values from a snapshot. Unknown names are ignored; returns how
    /// many fields were updated.
    pub fn restore(&mut self, values: &BTreeMap<String, String>) -> usize {
        let mut updated = 0;
        for (name, value) in values {
            if self.set_value(name, value.as_str()) {
                updated += 1;
            }
        }
        updated
    }
}

impl Default for LoanForm {
    fn default() -> Self {
        Self::loan_application()
    }
}

/// Field values saved mid-way through filling the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    pub saved_at: DateTime<Utc>,
    pub values: BTreeMap<String, String>,
}

impl FormDraft {
    pub fn capture(form: &LoanForm, saved_at: DateTime<Utc>) -> Self {
        Self {
            saved_at,
            values: form.values(),
        }
    }
}
