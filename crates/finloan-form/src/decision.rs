//! Rule-based approval decision.
//!
//! Scores the submitted application and approves it at
//! [`APPROVAL_THRESHOLD`] or above. Unlike the risk estimate shown while the
//! form is filled in, this is the outcome recorded with the submission.

use serde::Serialize;

use crate::application::{Education, LoanApplication, PropertyArea};
use crate::risk::loan_to_income_ratio;

/// Minimum score that approves an application.
pub const APPROVAL_THRESHOLD: u8 = 65;

/// Confidence reported for every rule-based decision, in percent.
pub const RULE_BASED_CONFIDENCE: f64 = 85.0;

pub const RULE_BASED_MODEL: &str = "Rule-based";

/// Approval score in `0..=100`.
///
/// | factor | points |
/// |---|---|
/// | credit history | 35 |
/// | total income >= 8000 / >= 5000 / >= 3000 | 25 / 20 / 15 |
/// | graduate | 15 |
/// | property area Urban / Semiurban | 10 / 5 |
/// | loan-to-income ratio <= 10 / <= 15 / <= 20 | 15 / 10 / 5 |
pub fn approval_score(application: &LoanApplication) -> u8 {
    let mut score: u32 = 0;

    if application.credit_history {
        score += 35;
    }

    score += match application.total_income() {
        i if i >= 8000 => 25,
        i if i >= 5000 => 20,
        i if i >= 3000 => 15,
        _ => 0,
    };

    if application.education == Education::Graduate {
        score += 15;
    }

    score += match application.property_area {
        PropertyArea::Urban => 10,
        PropertyArea::Semiurban => 5,
        PropertyArea::Rural => 0,
    };

    score += match loan_to_income_ratio(application) {
        Some(ratio) if ratio <= 10.0 => 15,
        Some(ratio) if ratio <= 15.0 => 10,
        Some(ratio) if ratio <= 20.0 => 5,
        _ => 0,
    };

    score.min(100) as u8
}

/// Final status stored with a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoanStatus {
    Approved,
    Rejected,
}

/// Outcome of scoring a submitted application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanDecision {
    pub approved: bool,
    pub status: LoanStatus,
    /// Approval score as a percentage
    pub approval_probability: f64,
    pub confidence: f64,
    pub model_used: &'static str,
}

impl LoanDecision {
    pub fn for_application(application: &LoanApplication) -> Self {
        let score = approval_score(application);
        let approved = score >= APPROVAL_THRESHOLD;
        Self {
            approved,
            status: if approved {
                LoanStatus::Approved
            } else {
                LoanStatus::Rejected
            },
            approval_probability: f64::from(score),
            confidence: RULE_BASED_CONFIDENCE,
            model_used: RULE_BASED_MODEL,
        }
    }
}
