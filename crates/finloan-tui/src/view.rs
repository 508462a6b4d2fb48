//! Screen-side state the wizard drives.
//!
//! [`FormView`] is what the form crate's controller talks to. It records the
//! visible step, the step indicator markers, the progress value, and the
//! message shown under each field. The UI module reads it when drawing.

use std::collections::{BTreeMap, BTreeSet};

use finloan_form::{FieldPresenter, FieldValidationResult, StepRenderer};

/// Step indicator and progress bar state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepProgress {
    visible: usize,
    completed: BTreeSet<usize>,
    active: Option<usize>,
    percent: u16,
}

impl StepProgress {
    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn percent(&self) -> u16 {
        self.percent
    }
}

impl StepRenderer for StepProgress {
    fn show(&mut self, step: usize) {
        // Markers are rebuilt after every transition
        self.visible = step;
        self.completed.clear();
        self.active = None;
    }

    fn mark_completed(&mut self, step: usize) {
        self.completed.insert(step);
    }

    fn mark_active(&mut self, step: usize) {
        self.active = Some(step);
    }

    fn set_progress(&mut self, percent: u16) {
        self.percent = percent.min(100);
    }
}

/// Visual validity state of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFeedback {
    Valid,
    Invalid(String),
}

/// Per-field validation feedback. Fields never validated have no entry.
#[derive(Debug, Clone, Default)]
pub struct FeedbackBoard {
    entries: BTreeMap<String, FieldFeedback>,
}

impl FeedbackBoard {
    pub fn get(&self, field: &str) -> Option<&FieldFeedback> {
        self.entries.get(field)
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        match self.entries.get(field) {
            Some(FieldFeedback::Invalid(message)) => Some(message),
            _ => None,
        }
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .values()
            .filter(|f| matches!(f, FieldFeedback::Invalid(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl FieldPresenter for FeedbackBoard {
    fn present(&mut self, field: &str, result: &FieldValidationResult) {
        let feedback = match &result.message {
            Some(message) if !result.valid => FieldFeedback::Invalid(message.clone()),
            _ => FieldFeedback::Valid,
        };
        self.entries.insert(field.to_string(), feedback);
    }
}

/// Everything the wizard renders into.
#[derive(Debug, Clone, Default)]
pub struct FormView {
    pub progress: StepProgress,
    pub feedback: FeedbackBoard,
}

impl StepRenderer for FormView {
    fn show(&mut self, step: usize) {
        self.progress.show(step);
    }

    fn mark_completed(&mut self, step: usize) {
        self.progress.mark_completed(step);
    }

    fn mark_active(&mut self, step: usize) {
        self.progress.mark_active(step);
    }

    fn set_progress(&mut self, percent: u16) {
        self.progress.set_progress(percent);
    }
}

impl FieldPresenter for FormView {
    fn present(&mut self, field: &str, result: &FieldValidationResult) {
        self.feedback.present(field, result);
    }
}
