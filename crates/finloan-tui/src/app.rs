//! Main application state and event loop for the loan wizard.

use std::io;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use finloan_core::{FormConfig, LocalStorage};
use finloan_form::wizard::FORM_INCOMPLETE_WARNING;
use finloan_form::{
    FieldDescriptor, FieldPresenter, FieldValidationResult, FormDraft, FormError, FormWizard,
    LoanApplication, Transition, ValidationScheduler,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, error, info, warn};

use crate::alert::{AlertQueue, AlertSeverity};
use crate::error::{AppResult, TuiError};
use crate::event::{AppEvent, InputHandler};
use crate::ui;
use crate::view::FormView;

/// Storage key used for drafts when none is given.
pub const DEFAULT_DRAFT_KEY: &str = "draft";

/// Banner shown when handling an event fails.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Upper bound on how long the loop blocks waiting for input.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wizard application state.
#[derive(Debug)]
pub struct App {
    wizard: FormWizard,
    view: FormView,
    input: InputHandler,
    /// Index of the focused field within the visible step
    focus: usize,
    scheduler: ValidationScheduler,
    alerts: AlertQueue,
    storage: Option<LocalStorage>,
    draft_key: String,
    should_exit: bool,
    outcome: Option<LoanApplication>,
}

impl App {
    pub fn new(config: &FormConfig, storage: Option<LocalStorage>) -> Self {
        let wizard = FormWizard::default();
        let mut view = FormView::default();
        wizard.render(&mut view);

        Self {
            wizard,
            view,
            input: InputHandler::new(),
            focus: 0,
            scheduler: ValidationScheduler::new(config.validation_debounce()),
            alerts: AlertQueue::new(config.alert_duration()),
            storage,
            draft_key: DEFAULT_DRAFT_KEY.to_string(),
            should_exit: false,
            outcome: None,
        }
    }

    pub fn with_draft_key(mut self, key: impl Into<String>) -> Self {
        self.draft_key = key.into();
        self
    }

    pub fn wizard(&self) -> &FormWizard {
        &self.wizard
    }

    pub fn view(&self) -> &FormView {
        &self.view
    }

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }

    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn draft_key(&self) -> &str {
        &self.draft_key
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// The submitted application, once the form has been submitted.
    pub fn outcome(&self) -> Option<&LoanApplication> {
        self.outcome.as_ref()
    }

    /// Field with focus in the visible step.
    pub fn focused_field(&self) -> Option<&FieldDescriptor> {
        self.wizard
            .form()
            .step(self.wizard.current_step())?
            .fields
            .get(self.focus)
    }

    fn focused_name(&self) -> AppResult<String> {
        self.focused_field()
            .map(|f| f.name.clone())
            .ok_or_else(|| {
                TuiError::internal(format!(
                    "no field at index {} on step {}",
                    self.focus,
                    self.wizard.current_step()
                ))
            })
    }

    fn step_len(&self) -> usize {
        self.wizard
            .form()
            .step(self.wizard.current_step())
            .map(|s| s.fields.len())
            .unwrap_or(0)
    }

    /// Translate a key press and handle it.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> AppResult<()> {
        let event = self
            .input
            .handle_key(key, self.focused_field().map(|f| &f.kind));
        self.handle_event(event, now)
    }

    /// Apply one event to the wizard.
    pub fn handle_event(&mut self, event: AppEvent, now: Instant) -> AppResult<()> {
        match event {
            AppEvent::NextField => self.move_focus(true),
            AppEvent::PrevField => self.move_focus(false),
            AppEvent::Input(c) => self.edit_text(now, |value| value.push(c)),
            AppEvent::Backspace => self.edit_text(now, |value| {
                value.pop();
            }),
            AppEvent::ClearField => self.clear_field(now),
            AppEvent::CycleOption { forward } => {
                self.edit_choice(|field| field.cycle_option(forward))
            }
            AppEvent::Toggle => self.edit_choice(FieldDescriptor::toggle),
            AppEvent::NextStep => {
                if self.wizard.state().is_last_step() {
                    self.submit(now)
                } else {
                    self.advance(now);
                    Ok(())
                }
            }
            AppEvent::PrevStep => {
                self.retreat(now);
                Ok(())
            }
            AppEvent::SaveDraft => {
                self.save_draft(now);
                Ok(())
            }
            AppEvent::LoadDraft => {
                self.load_draft(now);
                Ok(())
            }
            AppEvent::DismissAlert => {
                self.alerts.dismiss_latest();
                Ok(())
            }
            AppEvent::Quit | AppEvent::ForceQuit => {
                info!(?event, "leaving wizard without submitting");
                self.should_exit = true;
                Ok(())
            }
            AppEvent::None => Ok(()),
        }
    }

    /// Fire due debounced validations and drop expired alerts.
    pub fn tick(&mut self, now: Instant) {
        for name in self.scheduler.take_due(now) {
            debug!(field = %name, "debounced validation");
            self.wizard.validate_field(&name, &mut self.view);
        }
        self.alerts.prune(now);
    }

    /// Show an alert banner.
    pub fn notify(&mut self, severity: AlertSeverity, message: impl Into<String>, now: Instant) {
        self.alerts.push(severity, message, now);
    }

    /// Record a failed event and tell the user, keeping the wizard alive.
    pub fn report_error(&mut self, err: &TuiError, now: Instant) {
        error!(error = %err, "error while handling input");
        self.notify(AlertSeverity::Danger, UNEXPECTED_ERROR_MESSAGE, now);
    }

    /// How long the loop may block before the next timer is due.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        [self.scheduler.next_deadline(), self.alerts.next_expiry()]
            .into_iter()
            .flatten()
            .map(|deadline| deadline.saturating_duration_since(now))
            .fold(POLL_INTERVAL, Duration::min)
    }

    /// Leaving a field validates it right away and drops its pending
    /// debounced validation.
    fn blur(&mut self) -> AppResult<()> {
        let name = self.focused_name()?;
        self.scheduler.cancel(&name);
        self.wizard.validate_field(&name, &mut self.view);
        Ok(())
    }

    fn move_focus(&mut self, forward: bool) -> AppResult<()> {
        let len = self.step_len();
        if len == 0 {
            return Err(TuiError::internal("visible step has no fields"));
        }
        self.blur()?;
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
        Ok(())
    }

    fn edit_text(&mut self, now: Instant, edit: impl FnOnce(&mut String)) -> AppResult<()> {
        let name = self.focused_name()?;
        let field = self
            .wizard
            .form_mut()
            .field_mut(&name)
            .ok_or_else(|| FormError::UnknownField(name.clone()))?;
        if !field.accepts_text() {
            return Ok(());
        }
        edit(&mut field.value);
        self.scheduler.schedule(&name, now);
        Ok(())
    }

    fn clear_field(&mut self, now: Instant) -> AppResult<()> {
        let accepts_text = self.focused_field().is_some_and(FieldDescriptor::accepts_text);
        if accepts_text {
            return self.edit_text(now, String::clear);
        }
        self.edit_choice(|field| {
            field.value.clear();
            true
        })
    }

    /// Select and checkbox changes validate immediately.
    fn edit_choice(&mut self, edit: impl FnOnce(&mut FieldDescriptor) -> bool) -> AppResult<()> {
        let name = self.focused_name()?;
        let field = self
            .wizard
            .form_mut()
            .field_mut(&name)
            .ok_or_else(|| FormError::UnknownField(name.clone()))?;
        if edit(field) {
            self.wizard.validate_field(&name, &mut self.view);
        }
        Ok(())
    }

    fn advance(&mut self, now: Instant) {
        let step = self.wizard.current_step();
        let transition = self.wizard.advance(step, &mut self.view);
        self.after_transition(&transition, now);
    }

    fn retreat(&mut self, now: Instant) {
        let step = self.wizard.current_step();
        let transition = self.wizard.retreat(step, &mut self.view);
        self.after_transition(&transition, now);
    }

    fn after_transition(&mut self, transition: &Transition, now: Instant) {
        if transition.is_moved() {
            self.scheduler.cancel_all();
            self.focus = 0;
        }
        if let Some(message) = transition.warning() {
            self.notify(AlertSeverity::Warning, message, now);
        }
    }

    fn submit(&mut self, now: Instant) -> AppResult<()> {
        self.scheduler.cancel_all();
        match self.wizard.submit(&mut self.view, Utc::now()) {
            Ok(application) => {
                self.notify(AlertSeverity::Success, "Application submitted.", now);
                self.outcome = Some(application);
                self.should_exit = true;
                Ok(())
            }
            Err(FormError::Incomplete { invalid_fields }) => {
                warn!(?invalid_fields, "submission blocked");
                self.notify(AlertSeverity::Warning, FORM_INCOMPLETE_WARNING, now);
                Ok(())
            }
            Err(FormError::InvalidValue { field, value }) => {
                warn!(%field, %value, "submission blocked by unconvertible value");
                let result = FieldValidationResult::invalid(format!("{value:?} is not a valid value"));
                self.view.present(&field, &result);
                self.notify(AlertSeverity::Warning, FORM_INCOMPLETE_WARNING, now);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save_draft(&mut self, now: Instant) {
        let Some(storage) = &self.storage else {
            self.notify(AlertSeverity::Warning, "Draft storage is not available.", now);
            return;
        };

        let draft = FormDraft::capture(self.wizard.form(), Utc::now());
        if storage.save(&self.draft_key, &draft) {
            info!(key = %self.draft_key, "draft saved");
            self.notify(AlertSeverity::Success, "Draft saved.", now);
        } else {
            self.notify(AlertSeverity::Danger, "Could not save the draft.", now);
        }
    }

    /// Restore the draft stored under the draft key. Returns whether one was
    /// found.
    pub fn load_draft(&mut self, now: Instant) -> bool {
        let Some(storage) = &self.storage else {
            self.notify(AlertSeverity::Warning, "Draft storage is not available.", now);
            return false;
        };

        let Some(draft) = storage.load::<FormDraft>(&self.draft_key) else {
            self.notify(AlertSeverity::Info, "No saved draft found.", now);
            return false;
        };

        let restored = self.wizard.form_mut().restore(&draft.values);
        self.scheduler.cancel_all();
        self.view.feedback.clear();
        info!(key = %self.draft_key, restored, saved_at = %draft.saved_at, "draft restored");
        self.notify(
            AlertSeverity::Success,
            format!("Draft restored ({restored} fields)."),
            now,
        );
        true
    }

    /// Run the wizard in the terminal until the user submits or quits.
    pub fn run(mut self) -> AppResult<Option<LoanApplication>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result.map(|()| self.outcome)
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        loop {
            terminal
                .draw(|f| ui::draw(f, self))
                .map_err(|e| TuiError::RenderFailed(e.to_string()))?;

            if self.should_exit {
                break;
            }

            if event::poll(self.poll_timeout(Instant::now()))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                let now = Instant::now();
                match self.handle_key(key, now) {
                    Ok(()) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => self.report_error(&err, now),
                }
            }

            self.tick(Instant::now());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finloan_form::field::*;
    use tempfile::TempDir;

    fn app() -> App {
        App::new(&FormConfig::default(), None)
    }

    fn app_with_storage() -> (App, TempDir) {
        let dir = TempDir::new().unwrap();
        let app = App::new(&FormConfig::default(), Some(LocalStorage::new(dir.path())));
        (app, dir)
    }

    fn type_text(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            app.handle_event(AppEvent::Input(c), now).unwrap();
        }
    }

    fn focus_on(app: &mut App, name: &str) {
        let now = Instant::now();
        for _ in 0..app.step_len() {
            if app.focused_field().map(|f| f.name.as_str()) == Some(name) {
                return;
            }
            app.handle_event(AppEvent::NextField, now).unwrap();
        }
        panic!("{name} is not on the visible step");
    }

    fn set(app: &mut App, name: &str, value: &str) {
        assert!(app.wizard.form_mut().set_value(name, value));
    }

    fn fill_step_one(app: &mut App) {
        set(app, APPLICANT_NAME, "Ana Ruiz");
        set(app, GENDER, "Female");
        set(app, MARRIED, "No");
        set(app, DEPENDENTS, "0");
        set(app, EDUCATION, "Graduate");
    }

    fn fill_step_two(app: &mut App) {
        set(app, SELF_EMPLOYED, "No");
        set(app, APPLICANT_INCOME, "6000");
        set(app, LOAN_AMOUNT, "150");
    }

    #[test]
    fn test_starts_on_step_one() {
        let app = app();
        assert_eq!(app.wizard().current_step(), 1);
        assert_eq!(app.view().progress.percent(), 33);
        assert_eq!(app.focused_field().map(|f| f.name.as_str()), Some(APPLICANT_NAME));
        assert_eq!(app.draft_key(), DEFAULT_DRAFT_KEY);
    }

    #[test]
    fn test_typing_validates_after_debounce() {
        let mut app = app();
        let start = Instant::now();
        type_text(&mut app, "A", start);
        assert!(app.scheduler().is_pending(APPLICANT_NAME));
        assert!(app.view().feedback.get(APPLICANT_NAME).is_none());

        app.tick(start + Duration::from_millis(499));
        assert!(app.view().feedback.get(APPLICANT_NAME).is_none());

        app.tick(start + Duration::from_millis(500));
        assert_eq!(app.view().feedback.error(APPLICANT_NAME), Some(NAME_MESSAGE));
    }

    #[test]
    fn test_later_keystroke_supersedes_pending_validation() {
        let mut app = app();
        let start = Instant::now();
        type_text(&mut app, "A", start);
        type_text(&mut app, "n", start + Duration::from_millis(300));

        app.tick(start + Duration::from_millis(600));
        assert!(app.view().feedback.get(APPLICANT_NAME).is_none());

        app.tick(start + Duration::from_millis(800));
        assert!(app.view().feedback.error(APPLICANT_NAME).is_none());
        assert_eq!(app.wizard().form().value(APPLICANT_NAME), "An");
    }

    #[test]
    fn test_blur_validates_immediately() {
        let mut app = app();
        let now = Instant::now();
        type_text(&mut app, "A", now);
        app.handle_event(AppEvent::NextField, now).unwrap();

        assert!(!app.scheduler().is_pending(APPLICANT_NAME));
        assert_eq!(app.view().feedback.error(APPLICANT_NAME), Some(NAME_MESSAGE));
        assert_eq!(app.focused_field().map(|f| f.name.as_str()), Some(GENDER));
    }

    #[test]
    fn test_focus_wraps_within_step() {
        let mut app = app();
        let now = Instant::now();
        app.handle_event(AppEvent::PrevField, now).unwrap();
        assert_eq!(app.focused_field().map(|f| f.name.as_str()), Some(EDUCATION));
        app.handle_event(AppEvent::NextField, now).unwrap();
        assert_eq!(app.focus(), 0);
    }

    #[test]
    fn test_select_change_validates_immediately() {
        let mut app = app();
        focus_on(&mut app, GENDER);
        app.handle_event(AppEvent::CycleOption { forward: true }, Instant::now())
            .unwrap();
        assert_eq!(app.wizard().form().value(GENDER), "Male");
        assert!(app.view().feedback.error(GENDER).is_none());

        app.handle_event(AppEvent::ClearField, Instant::now()).unwrap();
        assert_eq!(app.view().feedback.error(GENDER), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn test_text_events_ignored_on_select() {
        let mut app = app();
        focus_on(&mut app, GENDER);
        app.handle_event(AppEvent::Input('x'), Instant::now()).unwrap();
        assert_eq!(app.wizard().form().value(GENDER), "");
        assert!(app.scheduler().is_empty());
    }

    #[test]
    fn test_blocked_advance_raises_warning() {
        let mut app = app();
        let now = Instant::now();
        app.handle_event(AppEvent::NextStep, now).unwrap();

        assert_eq!(app.wizard().current_step(), 1);
        let alert = app.alerts().visible().next().unwrap();
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert_eq!(alert.message, finloan_form::wizard::STEP_INCOMPLETE_WARNING);

        app.tick(now + Duration::from_secs(5));
        assert!(app.alerts().is_empty());
    }

    #[test]
    fn test_advance_resets_focus_and_pending() {
        let mut app = app();
        let now = Instant::now();
        fill_step_one(&mut app);
        focus_on(&mut app, APPLICANT_NAME);
        type_text(&mut app, "a", now);

        app.handle_event(AppEvent::NextStep, now).unwrap();
        assert_eq!(app.wizard().current_step(), 2);
        assert_eq!(app.focus(), 0);
        assert!(app.scheduler().is_empty());
        assert!(app.alerts().is_empty());

        app.handle_event(AppEvent::PrevStep, now).unwrap();
        assert_eq!(app.wizard().current_step(), 1);
        app.handle_event(AppEvent::PrevStep, now).unwrap();
        assert_eq!(app.wizard().current_step(), 1);
    }

    #[test]
    fn test_submit_on_last_step() {
        let mut app = app();
        let now = Instant::now();
        fill_step_one(&mut app);
        app.handle_event(AppEvent::NextStep, now).unwrap();
        fill_step_two(&mut app);
        app.handle_event(AppEvent::NextStep, now).unwrap();
        assert_eq!(app.wizard().current_step(), 3);

        app.handle_event(AppEvent::NextStep, now).unwrap();
        assert!(!app.should_exit());
        assert_eq!(
            app.alerts().visible().next().map(|a| a.message.as_str()),
            Some(FORM_INCOMPLETE_WARNING)
        );
        assert_eq!(app.view().feedback.error(PROPERTY_AREA), Some(REQUIRED_MESSAGE));

        focus_on(&mut app, PROPERTY_AREA);
        app.handle_event(AppEvent::CycleOption { forward: false }, now)
            .unwrap();
        focus_on(&mut app, CREDIT_HISTORY);
        app.handle_event(AppEvent::Toggle, now).unwrap();
        app.handle_event(AppEvent::NextStep, now).unwrap();

        assert!(app.should_exit());
        let application = app.outcome().unwrap();
        assert_eq!(application.applicant_name, "Ana Ruiz");
        assert!(application.credit_history);
        assert_eq!(application.loan_amount_term, 360);
    }

    #[test]
    fn test_unconvertible_values_block_submit_at_field_level() {
        let cases = [
            (LOAN_AMOUNT_TERM, "abc", TERM_MESSAGE),
            (LOAN_AMOUNT_TERM, "0", TERM_MESSAGE),
            (COAPPLICANT_INCOME, "lots", NUMBER_MESSAGE),
        ];
        for (name, value, message) in cases {
            let mut app = app();
            let now = Instant::now();
            fill_step_one(&mut app);
            app.handle_event(AppEvent::NextStep, now).unwrap();
            fill_step_two(&mut app);
            set(&mut app, name, value);

            // Step 2 itself now refuses the bad value
            app.handle_event(AppEvent::NextStep, now).unwrap();
            assert_eq!(app.wizard().current_step(), 2, "{name}={value:?}");
            assert_eq!(app.view().feedback.error(name), Some(message));

            // Fix it to leave step 2, then break it again before submitting
            let fallback = if name == LOAN_AMOUNT_TERM { "360" } else { "" };
            set(&mut app, name, fallback);
            app.handle_event(AppEvent::NextStep, now).unwrap();
            set(&mut app, PROPERTY_AREA, "Urban");
            set(&mut app, name, value);
            app.handle_event(AppEvent::NextStep, now).unwrap();

            assert!(!app.should_exit());
            assert!(app.outcome().is_none());
            assert_eq!(app.view().feedback.error(name), Some(message));
            let severities: Vec<_> = app.alerts().visible().map(|a| a.severity).collect();
            assert!(!severities.contains(&AlertSeverity::Danger));
            assert_eq!(
                app.alerts().visible().next().map(|a| a.message.as_str()),
                Some(FORM_INCOMPLETE_WARNING)
            );
        }
    }

    #[test]
    fn test_draft_round_trip() {
        let (mut app, _dir) = app_with_storage();
        let now = Instant::now();
        fill_step_one(&mut app);
        app.handle_event(AppEvent::SaveDraft, now).unwrap();
        assert_eq!(
            app.alerts().visible().next().map(|a| a.severity),
            Some(AlertSeverity::Success)
        );

        set(&mut app, APPLICANT_NAME, "");
        assert!(app.load_draft(now));
        assert_eq!(app.wizard().form().value(APPLICANT_NAME), "Ana Ruiz");
    }

    #[test]
    fn test_missing_draft_and_storage() {
        let (mut app, _dir) = app_with_storage();
        let now = Instant::now();
        assert!(!app.load_draft(now));
        assert_eq!(
            app.alerts().visible().next().map(|a| a.severity),
            Some(AlertSeverity::Info)
        );

        let mut detached = self::app();
        detached.handle_event(AppEvent::SaveDraft, now).unwrap();
        assert_eq!(
            detached.alerts().visible().next().map(|a| a.severity),
            Some(AlertSeverity::Warning)
        );
    }

    #[test]
    fn test_invalid_draft_key_degrades() {
        let (app, _dir) = app_with_storage();
        let mut app = app.with_draft_key("../escape");
        app.handle_event(AppEvent::SaveDraft, Instant::now()).unwrap();
        assert_eq!(
            app.alerts().visible().next().map(|a| a.severity),
            Some(AlertSeverity::Danger)
        );
    }

    #[test]
    fn test_report_error_shows_banner() {
        let mut app = app();
        let now = Instant::now();
        app.report_error(&TuiError::internal("boom"), now);
        let alert = app.alerts().visible().next().unwrap();
        assert_eq!(alert.severity, AlertSeverity::Danger);
        assert_eq!(alert.message, UNEXPECTED_ERROR_MESSAGE);
        assert!(!app.should_exit());
    }

    #[test]
    fn test_poll_timeout_tracks_deadlines() {
        let mut app = app();
        let now = Instant::now();
        assert_eq!(app.poll_timeout(now), POLL_INTERVAL);

        type_text(&mut app, "x", now);
        assert_eq!(app.poll_timeout(now + Duration::from_millis(450)), Duration::from_millis(50));
        assert_eq!(app.poll_timeout(now + Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        app.handle_event(AppEvent::Quit, Instant::now()).unwrap();
        assert!(app.should_exit());
        assert!(app.outcome().is_none());
    }
}
