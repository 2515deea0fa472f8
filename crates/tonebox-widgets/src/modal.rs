#![forbid(unsafe_code)]

//! Modal prompt behavior shared by dialogs.
//!
//! [`ModalState`] tracks whether a prompt is showing and turns the Escape key
//! into a [`ModalAction`] according to [`PromptConfig`].

use tonebox_core::event::{Event, KeyCode, KeyEvent};

/// Modal action emitted by `ModalState::handle_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    /// Escape was pressed.
    EscapePressed,
}

/// Prompt behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    /// Escape cancels the prompt.
    pub close_on_escape: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            close_on_escape: true,
        }
    }
}

impl PromptConfig {
    pub fn close_on_escape(mut self, close: bool) -> Self {
        self.close_on_escape = close;
        self
    }
}

/// Stateful helper for modal close behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModalState {
    open: bool,
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Handle events and return a modal action if triggered.
    ///
    /// The modal stays open; the caller decides what the action means.
    pub fn handle_event(&self, event: &Event, config: &PromptConfig) -> Option<ModalAction> {
        if !self.open {
            return None;
        }

        match event {
            Event::Key(key @ KeyEvent {
                code: KeyCode::Escape,
                ..
            }) if key.is_press() && config.close_on_escape => Some(ModalAction::EscapePressed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonebox_core::event::KeyEventKind;

    fn escape() -> Event {
        Event::key(KeyCode::Escape)
    }

    #[test]
    fn closed_modal_ignores_escape() {
        let state = ModalState::default();
        assert!(!state.is_open());
        assert_eq!(state.handle_event(&escape(), &PromptConfig::default()), None);
    }

    #[test]
    fn escape_emits_action_when_enabled() {
        let mut state = ModalState::default();
        state.open();
        assert_eq!(
            state.handle_event(&escape(), &PromptConfig::default()),
            Some(ModalAction::EscapePressed)
        );
        let config = PromptConfig::default().close_on_escape(false);
        assert_eq!(state.handle_event(&escape(), &config), None);
    }

    #[test]
    fn escape_release_is_ignored() {
        let mut state = ModalState::default();
        state.open();
        let release = Event::Key(KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release));
        assert_eq!(state.handle_event(&release, &PromptConfig::default()), None);
        state.close();
        assert!(!state.is_open());
    }
}
