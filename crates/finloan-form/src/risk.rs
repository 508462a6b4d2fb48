//! Client-side risk heuristic.
//!
//! A rough score shown to the applicant before submission. It is not the
//! lender's decision model.

use serde::Serialize;

use crate::application::{Education, LoanApplication};

/// Estimated monthly repayment per unit of principal.
pub const MONTHLY_PAYMENT_FACTOR: f64 = 0.008;

/// Weighted score in `0..=100`; higher is safer.
///
/// | factor | points |
/// |---|---|
/// | credit history | 40 |
/// | graduate | 20 |
/// | total income > 8000 / > 5000 / > 3000 | 25 / 15 / 10 |
/// | loan-to-income ratio < 3 / < 5 | 10 / 5 |
/// | not self-employed | 5 |
pub fn calculate_risk_score(application: &LoanApplication) -> u8 {
    let mut score: u32 = 0;

    if application.credit_history {
        score += 40;
    }

    if application.education == Education::Graduate {
        score += 20;
    }

    let total_income = application.total_income();
    score += match total_income {
        i if i > 8000 => 25,
        i if i > 5000 => 15,
        i if i > 3000 => 10,
        _ => 0,
    };

    if let Some(ratio) = loan_to_income_ratio(application) {
        if ratio < 3.0 {
            score += 10;
        } else if ratio < 5.0 {
            score += 5;
        }
    }

    if !application.self_employed {
        score += 5;
    }

    score.min(100) as u8
}

/// `loan_amount * 1000 / total_income`; `None` when income is not positive.
pub fn loan_to_income_ratio(application: &LoanApplication) -> Option<f64> {
    let total_income = application.total_income();
    if total_income <= 0 {
        return None;
    }
    Some((application.loan_amount as f64 * 1000.0) / total_income as f64)
}

/// Risk band derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => RiskLevel::Low,
            50..=69 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Summary figures shown alongside the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanInsights {
    pub total_income: i64,
    /// Zero when income is zero
    pub loan_to_income_ratio: f64,
    pub monthly_payment: f64,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
}

impl LoanInsights {
    pub fn for_application(application: &LoanApplication) -> Self {
        let risk_score = calculate_risk_score(application);
        Self {
            total_income: application.total_income(),
            loan_to_income_ratio: loan_to_income_ratio(application).unwrap_or(0.0),
            monthly_payment: application.loan_amount as f64 * 1000.0 * MONTHLY_PAYMENT_FACTOR,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
        }
    }
}
