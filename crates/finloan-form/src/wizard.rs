//! Multi-step form wizard.
//!
//! [`FormWizard`] owns the [`LoanForm`] and a [`WizardState`] and decides
//! which step is visible. Forward movement is gated on the validity of the
//! current step, recomputed on every attempt; backward movement is always
//! allowed. Both directions are no-ops at the ends of the form.
//!
//! Rendering is delegated to a [`StepRenderer`] and field feedback to a
//! [`FieldPresenter`], so the wizard runs headless in tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::application::LoanApplication;
use crate::error::{FormError, Result};
use crate::field::{FieldValidationResult, validate_field};
use crate::schema::LoanForm;

/// Warning surfaced when the current step blocks advancing.
pub const STEP_INCOMPLETE_WARNING: &str = "Please complete all required fields in this step.";

/// Warning surfaced when the whole form blocks submission.
pub const FORM_INCOMPLETE_WARNING: &str = "Please fill in all required fields correctly.";

/// Display capability the wizard needs from its view.
pub trait StepRenderer {
    /// Make `step` the visible step.
    fn show(&mut self, step: usize);
    /// Flag `step` as completed in the step indicator.
    fn mark_completed(&mut self, step: usize);
    /// Flag `step` as the active step in the step indicator.
    fn mark_active(&mut self, step: usize);
    /// Set the progress bar, 0 to 100.
    fn set_progress(&mut self, percent: u16);
}

/// Applies a validation result to the on-screen field.
pub trait FieldPresenter {
    fn present(&mut self, field: &str, result: &FieldValidationResult);
}

/// Both halves of a wizard view.
pub trait WizardView: StepRenderer + FieldPresenter {}

impl<T: StepRenderer + FieldPresenter + ?Sized> WizardView for T {}

/// View that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessView;

impl StepRenderer for HeadlessView {
    fn show(&mut self, _step: usize) {}
    fn mark_completed(&mut self, _step: usize) {}
    fn mark_active(&mut self, _step: usize) {}
    fn set_progress(&mut self, _percent: u16) {}
}

impl FieldPresenter for HeadlessView {
    fn present(&mut self, _field: &str, _result: &FieldValidationResult) {}
}

/// Display status of a step in the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Active,
    Upcoming,
}

/// Which step is visible and which steps last validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    current_step: usize,
    total_steps: usize,
    step_validity: BTreeMap<usize, bool>,
}

impl WizardState {
    /// Start at step 1 with every step invalid.
    ///
    /// A wizard always has at least one step.
    pub fn new(total_steps: usize) -> Self {
        let total_steps = total_steps.max(1);
        Self {
            current_step: 1,
            total_steps,
            step_validity: (1..=total_steps).map(|s| (s, false)).collect(),
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Result of the latest validation of `step`; false when never validated.
    pub fn is_step_valid(&self, step: usize) -> bool {
        self.step_validity.get(&step).copied().unwrap_or(false)
    }

    pub fn step_status(&self, step: usize) -> StepStatus {
        if step < self.current_step {
            StepStatus::Completed
        } else if step == self.current_step {
            StepStatus::Active
        } else {
            StepStatus::Upcoming
        }
    }

    /// Progress through the form, `current / total` as a whole percentage.
    pub fn progress_percent(&self) -> u16 {
        progress_percent(self.current_step, self.total_steps)
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 1
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    fn contains(&self, step: usize) -> bool {
        (1..=self.total_steps).contains(&step)
    }

    fn record_validity(&mut self, step: usize, valid: bool) {
        self.step_validity.insert(step, valid);
    }
}

fn progress_percent(step: usize, total: usize) -> u16 {
    if total == 0 {
        return 0;
    }
    (step.min(total) * 100 / total) as u16
}

/// Outcome of an advance or retreat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The visible step changed.
    Moved { from: usize, to: usize },
    /// The step has invalid required fields; nothing changed.
    Blocked { step: usize, message: &'static str },
    /// Already at the first (retreat) or last (advance) step.
    AtBoundary { step: usize },
    /// The request named a step other than the visible one; ignored.
    StepMismatch { requested: usize, current: usize },
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }

    /// Warning to surface to the user, if any.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Transition::Blocked { message, .. } => Some(*message),
            _ => None,
        }
    }
}

/// Controller for the multi-step loan form.
#[derive(Debug, Clone)]
pub struct FormWizard {
    form: LoanForm,
    state: WizardState,
}

impl FormWizard {
    pub fn new(form: LoanForm) -> Self {
        let state = WizardState::new(form.total_steps());
        Self { form, state }
    }

    pub fn form(&self) -> &LoanForm {
        &self.form
    }

    /// Mutable access for editing field values. Step structure must not be
    /// changed through this.
    pub fn form_mut(&mut self) -> &mut LoanForm {
        &mut self.form
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    /// Render the current step. Call once after construction.
    pub fn render<V: StepRenderer + ?Sized>(&self, view: &mut V) {
        transition_view(view, self.state.current_step, self.state.total_steps);
    }

    /// Validate one field by name and present the result.
    pub fn validate_field<P: FieldPresenter + ?Sized>(
        &self,
        name: &str,
        presenter: &mut P,
    ) -> Option<FieldValidationResult> {
        let field = self.form.field(name)?;
        let result = validate_field(field);
        presenter.present(name, &result);
        Some(result)
    }

    /// Validate every required field of `step`, plus optional fields that
    /// hold a value, and record the outcome.
    ///
    /// Every field is evaluated, even after the first failure, so the view
    /// shows all problems at once.
    pub fn validate_step<P: FieldPresenter + ?Sized>(&mut self, step: usize, presenter: &mut P) -> bool {
        let Some(form_step) = self.form.step(step) else {
            warn!(step, "validation requested for unknown step");
            return false;
        };

        let mut valid = true;
        for field in form_step.gated_fields() {
            let result = validate_field(field);
            presenter.present(&field.name, &result);
            if !result.valid {
                debug!(step, field = %field.name, message = ?result.message, "field invalid");
                valid = false;
            }
        }

        self.state.record_validity(step, valid);
        valid
    }

    /// Move forward from `step` if it validates.
    pub fn advance<V: WizardView + ?Sized>(&mut self, step: usize, view: &mut V) -> Transition {
        let current = self.state.current_step;
        if step != current {
            warn!(requested = step, current, "advance requested from a step that is not visible");
            return Transition::StepMismatch {
                requested: step,
                current,
            };
        }

        if !self.validate_step(step, view) {
            info!(step, "advance blocked by invalid fields");
            return Transition::Blocked {
                step,
                message: STEP_INCOMPLETE_WARNING,
            };
        }

        if step >= self.state.total_steps {
            return Transition::AtBoundary { step };
        }

        self.go_to(step + 1, view);
        Transition::Moved {
            from: step,
            to: step + 1,
        }
    }

    /// Move back from `step`. Never validates.
    pub fn retreat<V: StepRenderer + ?Sized>(&mut self, step: usize, view: &mut V) -> Transition {
        let current = self.state.current_step;
        if step != current {
            warn!(requested = step, current, "retreat requested from a step that is not visible");
            return Transition::StepMismatch {
                requested: step,
                current,
            };
        }

        if step <= 1 {
            return Transition::AtBoundary { step };
        }

        self.go_to(step - 1, view);
        Transition::Moved {
            from: step,
            to: step - 1,
        }
    }

    /// Validate every required or filled-in field, across all steps.
    pub fn validate_complete_form<P: FieldPresenter + ?Sized>(&self, presenter: &mut P) -> bool {
        let mut valid = true;
        for field in self.form.fields().filter(|f| f.is_gated()) {
            let result = validate_field(field);
            presenter.present(&field.name, &result);
            valid &= result.valid;
        }
        valid
    }

    /// Names of gated fields that currently fail validation.
    pub fn invalid_fields(&self) -> Vec<String> {
        self.form
            .fields()
            .filter(|f| f.is_gated() && !validate_field(f).valid)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Final gate: build the application once the whole form validates.
    pub fn submit<P: FieldPresenter + ?Sized>(
        &self,
        presenter: &mut P,
        submitted_at: DateTime<Utc>,
    ) -> Result<LoanApplication> {
        if !self.validate_complete_form(presenter) {
            let invalid_fields = self.invalid_fields();
            info!(?invalid_fields, "submission blocked");
            return Err(FormError::Incomplete { invalid_fields });
        }

        let application = LoanApplication::from_form(&self.form, submitted_at)?;
        info!(applicant = %application.applicant_name, "application submitted");
        Ok(application)
    }

    fn go_to<V: StepRenderer + ?Sized>(&mut self, step: usize, view: &mut V) {
        debug_assert!(self.state.contains(step));
        debug!(from = self.state.current_step, to = step, "step transition");
        self.state.current_step = step;
        transition_view(view, step, self.state.total_steps);
    }
}

impl Default for FormWizard {
    fn default() -> Self {
        Self::new(LoanForm::loan_application())
    }
}

fn transition_view<V: StepRenderer + ?Sized>(view: &mut V, step: usize, total: usize) {
    view.show(step);
    for done in 1..step {
        view.mark_completed(done);
    }
    view.mark_active(step);
    view.set_progress(progress_percent(step, total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::*;

    #[derive(Debug, Default)]
    struct RecordingView {
        calls: Vec<String>,
        feedback: BTreeMap<String, FieldValidationResult>,
    }

    impl StepRenderer for RecordingView {
        fn show(&mut self, step: usize) {
            self.calls.push(format!("show {step}"));
        }
        fn mark_completed(&mut self, step: usize) {
            self.calls.push(format!("completed {step}"));
        }
        fn mark_active(&mut self, step: usize) {
            self.calls.push(format!("active {step}"));
        }
        fn set_progress(&mut self, percent: u16) {
            self.calls.push(format!("progress {percent}"));
        }
    }

    impl FieldPresenter for RecordingView {
        fn present(&mut self, field: &str, result: &FieldValidationResult) {
            self.feedback.insert(field.to_string(), result.clone());
        }
    }

    fn fill_step_one(wizard: &mut FormWizard) {
        let form = wizard.form_mut();
        form.set_value(APPLICANT_NAME, "Priya Sharma");
        form.set_value(GENDER, "Female");
        form.set_value(MARRIED, "No");
        form.set_value(DEPENDENTS, "0");
        form.set_value(EDUCATION, "Graduate");
    }

    fn fill_step_two(wizard: &mut FormWizard) {
        let form = wizard.form_mut();
        form.set_value(SELF_EMPLOYED, "No");
        form.set_value(APPLICANT_INCOME, "6000");
        form.set_value(LOAN_AMOUNT, "150");
    }

    #[test]
    fn test_initial_state() {
        let wizard = FormWizard::default();
        let state = wizard.state();
        assert_eq!(state.current_step(), 1);
        assert_eq!(state.total_steps(), 3);
        for step in 1..=3 {
            assert!(!state.is_step_valid(step));
        }
        assert_eq!(state.step_status(1), StepStatus::Active);
        assert_eq!(state.step_status(2), StepStatus::Upcoming);
    }

    #[test]
    fn test_wizard_state_never_empty() {
        let state = WizardState::new(0);
        assert_eq!(state.total_steps(), 1);
        assert!(state.is_first_step() && state.is_last_step());
    }

    #[test]
    fn test_advance_blocked_by_invalid_field() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        wizard.form_mut().set_value(APPLICANT_NAME, "A");
        let mut view = RecordingView::default();

        let transition = wizard.advance(1, &mut view);

        assert_eq!(
            transition,
            Transition::Blocked {
                step: 1,
                message: STEP_INCOMPLETE_WARNING
            }
        );
        assert_eq!(transition.warning(), Some(STEP_INCOMPLETE_WARNING));
        assert_eq!(wizard.current_step(), 1);
        assert!(!wizard.state().is_step_valid(1));
        assert!(view.calls.is_empty());
        assert_eq!(
            view.feedback[APPLICANT_NAME].message.as_deref(),
            Some(NAME_MESSAGE)
        );
        assert!(view.feedback[GENDER].valid);
    }

    #[test]
    fn test_advance_valid_step() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        let mut view = RecordingView::default();

        let transition = wizard.advance(1, &mut view);

        assert_eq!(transition, Transition::Moved { from: 1, to: 2 });
        assert_eq!(wizard.current_step(), 2);
        assert!(wizard.state().is_step_valid(1));
        assert_eq!(
            view.calls,
            vec!["show 2", "completed 1", "active 2", "progress 66"]
        );
        assert_eq!(wizard.state().step_status(1), StepStatus::Completed);
    }

    #[test]
    fn test_validity_is_recomputed_each_attempt() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        let mut view = HeadlessView;
        assert!(wizard.advance(1, &mut view).is_moved());
        assert!(wizard.retreat(2, &mut view).is_moved());

        // Break a field after the step once validated
        wizard.form_mut().set_value(EDUCATION, "");
        assert!(!wizard.advance(1, &mut view).is_moved());
        assert_eq!(wizard.current_step(), 1);
        assert!(!wizard.state().is_step_valid(1));
    }

    #[test]
    fn test_retreat_ignores_validity() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        let mut view = RecordingView::default();
        wizard.advance(1, &mut view);
        view.calls.clear();

        // Step 2 is entirely empty
        let transition = wizard.retreat(2, &mut view);

        assert_eq!(transition, Transition::Moved { from: 2, to: 1 });
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(view.calls, vec!["show 1", "active 1", "progress 33"]);
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut wizard = FormWizard::default();
        let mut view = RecordingView::default();

        assert_eq!(wizard.retreat(1, &mut view), Transition::AtBoundary { step: 1 });
        assert_eq!(wizard.current_step(), 1);

        fill_step_one(&mut wizard);
        fill_step_two(&mut wizard);
        wizard.form_mut().set_value(PROPERTY_AREA, "Urban");
        wizard.advance(1, &mut view);
        wizard.advance(2, &mut view);
        assert_eq!(wizard.current_step(), 3);

        view.calls.clear();
        assert_eq!(wizard.advance(3, &mut view), Transition::AtBoundary { step: 3 });
        assert_eq!(wizard.current_step(), 3);
        assert!(wizard.state().is_step_valid(3));
        assert!(view.calls.is_empty());
    }

    #[test]
    fn test_step_mismatch_is_ignored() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        let mut view = RecordingView::default();

        assert_eq!(
            wizard.advance(2, &mut view),
            Transition::StepMismatch {
                requested: 2,
                current: 1
            }
        );
        assert_eq!(wizard.current_step(), 1);
        assert!(view.feedback.is_empty());
        assert!(!wizard.state().is_step_valid(2));
    }

    #[test]
    fn test_validate_step_skips_empty_optional_fields() {
        let mut wizard = FormWizard::default();
        fill_step_two(&mut wizard);
        let mut view = RecordingView::default();

        assert!(wizard.validate_step(2, &mut view));
        assert!(!view.feedback.contains_key(COAPPLICANT_INCOME));
        assert_eq!(view.feedback.len(), 4);
    }

    #[test]
    fn test_filled_optional_field_gates_step() {
        let mut wizard = FormWizard::default();
        fill_step_two(&mut wizard);
        wizard.form_mut().set_value(COAPPLICANT_INCOME, "lots");
        let mut view = RecordingView::default();

        assert!(!wizard.validate_step(2, &mut view));
        assert_eq!(
            view.feedback.get(COAPPLICANT_INCOME).and_then(|r| r.message.as_deref()),
            Some(NUMBER_MESSAGE)
        );
        assert_eq!(wizard.invalid_fields(), vec![COAPPLICANT_INCOME.to_string()]);
    }

    #[test]
    fn test_gate_agrees_with_conversion() {
        let cases = [
            (LOAN_AMOUNT_TERM, "abc"),
            (LOAN_AMOUNT_TERM, "0"),
            (COAPPLICANT_INCOME, "lots"),
        ];
        for (name, value) in cases {
            let mut wizard = FormWizard::default();
            fill_step_one(&mut wizard);
            fill_step_two(&mut wizard);
            wizard.form_mut().set_value(PROPERTY_AREA, "Urban");
            wizard.form_mut().set_value(name, value);

            let mut view = RecordingView::default();
            assert!(!wizard.validate_complete_form(&mut view), "{name}={value:?}");
            let err = wizard.submit(&mut view, Utc::now()).unwrap_err();
            assert_eq!(
                err,
                FormError::Incomplete {
                    invalid_fields: vec![name.to_string()]
                }
            );
        }
    }

    #[test]
    fn test_validate_step_unknown_step() {
        let mut wizard = FormWizard::default();
        assert!(!wizard.validate_step(9, &mut HeadlessView));
        assert!(!wizard.validate_step(0, &mut HeadlessView));
    }

    #[test]
    fn test_validate_complete_form_spans_steps() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        fill_step_two(&mut wizard);
        let mut view = RecordingView::default();

        assert!(!wizard.validate_complete_form(&mut view));
        assert_eq!(view.feedback.len(), 10);
        assert!(!view.feedback[PROPERTY_AREA].valid);
        assert_eq!(wizard.invalid_fields(), vec![PROPERTY_AREA.to_string()]);

        wizard.form_mut().set_value(PROPERTY_AREA, "Rural");
        assert!(wizard.validate_complete_form(&mut view));
        assert!(wizard.invalid_fields().is_empty());
    }

    #[test]
    fn test_submit_requires_complete_form() {
        let mut wizard = FormWizard::default();
        fill_step_one(&mut wizard);
        let err = wizard.submit(&mut HeadlessView, Utc::now()).unwrap_err();
        match err {
            FormError::Incomplete { invalid_fields } => {
                assert!(invalid_fields.contains(&LOAN_AMOUNT.to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        fill_step_two(&mut wizard);
        wizard.form_mut().set_value(PROPERTY_AREA, "Semiurban");
        let application = wizard.submit(&mut HeadlessView, Utc::now()).unwrap();
        assert_eq!(application.applicant_name, "Priya Sharma");
    }

    #[test]
    fn test_render_initial_step() {
        let wizard = FormWizard::default();
        let mut view = RecordingView::default();
        wizard.render(&mut view);
        assert_eq!(view.calls, vec!["show 1", "active 1", "progress 33"]);
    }

    #[test]
    fn test_validate_field_by_name() {
        let mut wizard = FormWizard::default();
        wizard.form_mut().set_value(LOAN_AMOUNT, "5000");
        let mut view = RecordingView::default();

        let result = wizard.validate_field(LOAN_AMOUNT, &mut view).unwrap();
        assert!(!result.valid);
        assert_eq!(view.feedback[LOAN_AMOUNT], result);
        assert!(wizard.validate_field("nope", &mut view).is_none());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 0), 0);
    }
}
