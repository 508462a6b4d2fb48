//! Typed loan application built from a validated form.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};
use crate::field::{self, leading_integer};
use crate::schema::LoanForm;

/// Default repayment term in months.
pub const DEFAULT_LOAN_TERM: u32 = 360;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dependents {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3+")]
    ThreePlus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Education {
    Graduate,
    #[serde(rename = "Not Graduate")]
    NotGraduate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyArea {
    Urban,
    Semiurban,
    Rural,
}

macro_rules! choice_enum {
    ($ty:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub fn label(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($label => Ok($ty::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

choice_enum!(Gender { Male => "Male", Female => "Female" });
choice_enum!(Dependents { Zero => "0", One => "1", Two => "2", ThreePlus => "3+" });
choice_enum!(Education { Graduate => "Graduate", NotGraduate => "Not Graduate" });
choice_enum!(PropertyArea { Urban => "Urban", Semiurban => "Semiurban", Rural => "Rural" });

/// A complete loan application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub applicant_name: String,
    pub gender: Gender,
    pub married: bool,
    pub dependents: Dependents,
    pub education: Education,
    pub self_employed: bool,
    pub applicant_income: i64,
    pub coapplicant_income: i64,
    /// In thousands
    pub loan_amount: i64,
    /// In months
    pub loan_amount_term: u32,
    pub credit_history: bool,
    pub property_area: PropertyArea,
    pub submitted_at: DateTime<Utc>,
}

impl LoanApplication {
    /// Convert form values. The form should already pass
    /// [`validate_complete_form`](crate::FormWizard::validate_complete_form);
    /// values that still do not convert are reported as [`FormError::InvalidValue`].
    pub fn from_form(form: &LoanForm, submitted_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            applicant_name: form.value(field::APPLICANT_NAME).trim().to_string(),
            gender: choice(form, field::GENDER)?,
            married: yes_no(form, field::MARRIED)?,
            dependents: choice(form, field::DEPENDENTS)?,
            education: choice(form, field::EDUCATION)?,
            self_employed: yes_no(form, field::SELF_EMPLOYED)?,
            applicant_income: integer(form, field::APPLICANT_INCOME)?,
            coapplicant_income: optional_integer(form, field::COAPPLICANT_INCOME)?.unwrap_or(0),
            loan_amount: integer(form, field::LOAN_AMOUNT)?,
            loan_amount_term: term(form)?,
            credit_history: form
                .field(field::CREDIT_HISTORY)
                .is_some_and(|f| f.is_checked()),
            property_area: choice(form, field::PROPERTY_AREA)?,
            submitted_at,
        })
    }

    /// Applicant plus co-applicant income.
    pub fn total_income(&self) -> i64 {
        self.applicant_income.saturating_add(self.coapplicant_income)
    }
}

fn require<'a>(form: &'a LoanForm, name: &str) -> Result<&'a str> {
    form.field(name)
        .map(|f| f.value.trim())
        .ok_or_else(|| FormError::UnknownField(name.to_string()))
}

fn choice<T: FromStr>(form: &LoanForm, name: &str) -> Result<T> {
    let value = require(form, name)?;
    value
        .parse()
        .map_err(|_| FormError::invalid_value(name, value))
}

fn yes_no(form: &LoanForm, name: &str) -> Result<bool> {
    match require(form, name)? {
        "Yes" => Ok(true),
        "No" => Ok(false),
        other => Err(FormError::invalid_value(name, other)),
    }
}

fn integer(form: &LoanForm, name: &str) -> Result<i64> {
    optional_integer(form, name)?.ok_or_else(|| FormError::invalid_value(name, ""))
}

fn optional_integer(form: &LoanForm, name: &str) -> Result<Option<i64>> {
    let value = require(form, name)?;
    if value.is_empty() {
        return Ok(None);
    }
    leading_integer(value)
        .map(Some)
        .ok_or_else(|| FormError::invalid_value(name, value))
}

fn term(form: &LoanForm) -> Result<u32> {
    match optional_integer(form, field::LOAN_AMOUNT_TERM)? {
        None => Ok(DEFAULT_LOAN_TERM),
        Some(months) => u32::try_from(months)
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| FormError::invalid_value(field::LOAN_AMOUNT_TERM, months.to_string())),
    }
}
