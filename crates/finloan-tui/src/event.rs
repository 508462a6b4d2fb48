//! Event handling for the loan wizard.
//!
//! Maps keyboard input to application events. What a key means depends on
//! the kind of field that has focus: letters type into text fields, arrows
//! cycle select options, and space flips checkboxes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use finloan_form::FieldKind;

/// Application events produced from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Move focus to the next field (blurs the current one)
    NextField,
    /// Move focus to the previous field (blurs the current one)
    PrevField,
    /// Character typed into the focused text field
    Input(char),
    /// Delete the last character of the focused text field
    Backspace,
    /// Clear the focused field
    ClearField,
    /// Select the next or previous option of the focused select
    CycleOption { forward: bool },
    /// Flip the focused checkbox
    Toggle,
    /// Continue to the next step, or submit on the last one
    NextStep,
    /// Go back one step
    PrevStep,
    /// Save the current values as a draft
    SaveDraft,
    /// Restore the saved draft
    LoadDraft,
    /// Dismiss the newest alert
    DismissAlert,
    /// Leave the wizard without submitting
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// No action
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle a key event given the kind of the focused field.
    pub fn handle_key(&self, key: KeyEvent, focused: Option<&FieldKind>) -> AppEvent {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => AppEvent::ForceQuit,
                KeyCode::Char('s') => AppEvent::SaveDraft,
                KeyCode::Char('o') => AppEvent::LoadDraft,
                KeyCode::Char('p') => AppEvent::PrevStep,
                KeyCode::Char('n') => AppEvent::NextStep,
                KeyCode::Char('u') => AppEvent::ClearField,
                KeyCode::Char('d') => AppEvent::DismissAlert,
                _ => AppEvent::None,
            };
        }

        match key.code {
            KeyCode::Esc => return AppEvent::Quit,
            KeyCode::Tab | KeyCode::Down => return AppEvent::NextField,
            KeyCode::BackTab | KeyCode::Up => return AppEvent::PrevField,
            KeyCode::Enter | KeyCode::PageDown => return AppEvent::NextStep,
            KeyCode::PageUp => return AppEvent::PrevStep,
            _ => {}
        }

        match focused {
            Some(FieldKind::Text) | Some(FieldKind::Number) => Self::handle_text(key),
            Some(FieldKind::Select(_)) => match key.code {
                KeyCode::Right | KeyCode::Char(' ') => AppEvent::CycleOption { forward: true },
                KeyCode::Left => AppEvent::CycleOption { forward: false },
                KeyCode::Backspace | KeyCode::Delete => AppEvent::ClearField,
                _ => AppEvent::None,
            },
            Some(FieldKind::Checkbox) => match key.code {
                KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => AppEvent::Toggle,
                _ => AppEvent::None,
            },
            None => AppEvent::None,
        }
    }

    fn handle_text(key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char(c) => AppEvent::Input(c),
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Delete => AppEvent::ClearField,
            _ => AppEvent::None,
        }
    }
}
