//! Loan application form and step wizard.
//!
//! This crate holds everything about the form that does not depend on a
//! terminal: the field schema, pure field validation, the three-step
//! [`FormWizard`] state machine, debounced validation scheduling, and the
//! typed [`LoanApplication`] with its risk estimate and approval decision.
//!
//! ## Example
//!
//! ```
//! use finloan_form::{FormWizard, HeadlessView, Transition};
//!
//! let mut wizard = FormWizard::default();
//! // Step 1 is empty, so the wizard refuses to move on
//! let transition = wizard.advance(1, &mut HeadlessView);
//! assert!(matches!(transition, Transition::Blocked { .. }));
//! assert_eq!(wizard.current_step(), 1);
//! ```

pub mod application;
pub mod decision;
pub mod error;
pub mod field;
pub mod format;
pub mod risk;
pub mod scheduler;
pub mod schema;
pub mod wizard;

pub use application::LoanApplication;
pub use decision::{LoanDecision, LoanStatus, approval_score};
pub use error::{FormError, Result};
pub use field::{FieldDescriptor, FieldKind, FieldValidationResult, validate_field};
pub use risk::{LoanInsights, RiskLevel, calculate_risk_score};
pub use scheduler::ValidationScheduler;
pub use schema::{FormDraft, FormStep, LoanForm};
pub use wizard::{
    FieldPresenter, FormWizard, HeadlessView, StepRenderer, StepStatus, Transition, WizardState,
    WizardView,
};
