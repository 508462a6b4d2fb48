//! Terminal front end for the FinLoan application wizard.
//!
//! Drives a [`finloan_form::FormWizard`] from keyboard input and draws it
//! with ratatui: a step indicator and progress bar, the fields of the
//! visible step with their validation messages, a live estimate on the last
//! step, and transient alert banners.

pub mod alert;
pub mod app;
pub mod error;
pub mod event;
pub mod ui;
pub mod view;

pub use alert::{Alert, AlertQueue, AlertSeverity};
pub use app::App;
pub use error::{AppResult, TuiError};
pub use event::{AppEvent, InputHandler};
pub use view::{FeedbackBoard, FieldFeedback, FormView, StepProgress};
