#![forbid(unsafe_code)]

//! Channel settings prompt.
//!
//! A modal dialog with four bounded fields: pitch channels, drum (noise)
//! channels, patterns per channel and instruments per channel. Confirming
//! turns the fields into one [`ChangeGroup`] and records it on the host as a
//! single undo step; cancelling undoes the frame the host pushed when the
//! prompt was opened.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──open()──► Open ──confirm()──► Confirmed ──┐
//!                       │                             ├──► Closed
//!                       └───cancel()────► Cancelled ──┘
//! ```
//!
//! `open()` registers eleven listeners and `close()` removes the same
//! eleven. Events reach the prompt only through those listeners, so once the
//! prompt is closed every event is ignored.
//!
//! # Event routing
//!
//! [`ChannelSettingsPrompt::handle_event`] takes the event together with the
//! [`Target`] it was delivered to. Key presses first reach the container's
//! key-down listener (Enter confirms unless a button has focus, Escape
//! cancels), then the field's key-press filter, then the field itself.

use std::fmt;

use tonebox_core::event::{Event, KeyCode, KeyEvent};
use tonebox_song::{
    Bounds, ChangeChannelCount, ChangeGroup, ChangeInstrumentsPerChannel,
    ChangePatternsPerChannel, DocumentError, DocumentHost, PromptKind, RecordOutcome,
};

use crate::listeners::{ListenerId, ListenerKind, ListenerRegistry};
use crate::modal::{ModalAction, ModalState, PromptConfig};
use crate::number_input::{KeyFilter, NumberInput};

pub const TITLE: &str = "Channel Settings";

/// The four editable parameters, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    PitchChannels,
    NoiseChannels,
    PatternsPerChannel,
    InstrumentsPerChannel,
}

impl FieldId {
    pub const ALL: [FieldId; 4] = [
        FieldId::PitchChannels,
        FieldId::NoiseChannels,
        FieldId::PatternsPerChannel,
        FieldId::InstrumentsPerChannel,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PitchChannels => "Pitch channels:",
            Self::NoiseChannels => "Drum channels:",
            Self::PatternsPerChannel => "Patterns per channel:",
            Self::InstrumentsPerChannel => "Instruments per channel:",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::PitchChannels => 0,
            Self::NoiseChannels => 1,
            Self::PatternsPerChannel => 2,
            Self::InstrumentsPerChannel => 3,
        }
    }
}

/// Where an event was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Field(FieldId),
    OkayButton,
    CancelButton,
    /// The prompt body; receives key-downs bubbling up from any child.
    Container,
}

impl Target {
    #[must_use]
    pub const fn is_button(self) -> bool {
        matches!(self, Self::OkayButton | Self::CancelButton)
    }

    /// Tab order: fields, then Okay, then Cancel.
    const ORDER: [Target; 6] = [
        Target::Field(FieldId::PitchChannels),
        Target::Field(FieldId::NoiseChannels),
        Target::Field(FieldId::PatternsPerChannel),
        Target::Field(FieldId::InstrumentsPerChannel),
        Target::OkayButton,
        Target::CancelButton,
    ];
}

/// What a listener does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Confirm,
    Cancel,
    FilterKey,
    ClampOnBlur,
    ContainerKeyDown,
}

/// Static description of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: FieldId,
    pub label: &'static str,
    pub initial: u32,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptState {
    Created,
    Open,
    Confirmed,
    Cancelled,
    Closed,
}

impl fmt::Display for PromptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Open => "open",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Terminal result of a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Confirmed(RecordOutcome),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    /// The operation is not allowed in the current state.
    InvalidTransition {
        from: PromptState,
        operation: &'static str,
    },
    /// The host refused the change group; the prompt stays open.
    Record(DocumentError),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, operation } => {
                write!(f, "cannot {operation} a prompt that is {from}")
            }
            Self::Record(e) => write!(f, "failed to record channel settings: {e}"),
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidTransition { .. } => None,
            Self::Record(e) => Some(e),
        }
    }
}

impl From<DocumentError> for PromptError {
    fn from(e: DocumentError) -> Self {
        Self::Record(e)
    }
}

#[derive(Debug, Clone)]
pub struct PromptField {
    pub spec: FieldSpec,
    pub input: NumberInput,
}

/// The channel settings dialog.
#[derive(Debug)]
pub struct ChannelSettingsPrompt {
    fields: [PromptField; 4],
    state: PromptState,
    outcome: Option<PromptOutcome>,
    focus: Target,
    listeners: ListenerRegistry<Target, PromptAction>,
    registered: Vec<ListenerId>,
    modal: ModalState,
    config: PromptConfig,
}

impl ChannelSettingsPrompt {
    /// Create a prompt seeded from the host's song and bounds.
    pub fn new<H: DocumentHost + ?Sized>(host: &H) -> Self {
        Self::with_config(host, PromptConfig::default())
    }

    pub fn with_config<H: DocumentHost + ?Sized>(host: &H, config: PromptConfig) -> Self {
        let song = host.song();
        let bounds = host.bounds();
        let field = |id: FieldId, initial: u32, bounds: Bounds| PromptField {
            spec: FieldSpec {
                id,
                label: id.label(),
                initial,
                bounds,
            },
            input: NumberInput::new(initial, bounds.min, bounds.max),
        };

        Self {
            fields: [
                field(FieldId::PitchChannels, song.pitch_channel_count, bounds.pitch_channels),
                field(FieldId::NoiseChannels, song.noise_channel_count, bounds.noise_channels),
                field(
                    FieldId::PatternsPerChannel,
                    song.patterns_per_channel,
                    bounds.patterns_per_channel,
                ),
                field(
                    FieldId::InstrumentsPerChannel,
                    song.instruments_per_channel,
                    bounds.instruments_per_channel,
                ),
            ],
            state: PromptState::Created,
            outcome: None,
            focus: Target::Container,
            listeners: ListenerRegistry::new(),
            registered: Vec::new(),
            modal: ModalState::default(),
            config,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn state(&self) -> PromptState {
        self.state
    }

    /// How the prompt ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<PromptOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn focus(&self) -> Target {
        self.focus
    }

    #[must_use]
    pub fn fields(&self) -> &[PromptField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> &NumberInput {
        &self.fields[id.index()].input
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut NumberInput {
        &mut self.fields[id.index()].input
    }

    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry<Target, PromptAction> {
        &self.listeners
    }

    // --- Lifecycle ---

    /// Show the prompt: wire up listeners and focus the first field.
    pub fn open(&mut self) -> Result<(), PromptError> {
        self.expect_state(PromptState::Created, "open")?;

        let mut add = |target, kind, action| {
            let id = self.listeners.add(target, kind, action);
            self.registered.push(id);
        };
        add(Target::OkayButton, ListenerKind::Click, PromptAction::Confirm);
        add(Target::CancelButton, ListenerKind::Click, PromptAction::Cancel);
        for id in FieldId::ALL {
            add(Target::Field(id), ListenerKind::KeyPress, PromptAction::FilterKey);
        }
        for id in FieldId::ALL {
            add(Target::Field(id), ListenerKind::Blur, PromptAction::ClampOnBlur);
        }
        add(Target::Container, ListenerKind::KeyDown, PromptAction::ContainerKeyDown);

        self.state = PromptState::Open;
        self.modal.open();

        let first = Target::Field(FieldId::PitchChannels);
        self.focus = first;
        let input = self.field_mut(FieldId::PitchChannels);
        input.set_focused(true);
        input.select_all();

        tracing::debug!(listeners = self.registered.len(), "channel settings opened");
        Ok(())
    }

    /// The change group the current field values produce.
    ///
    /// Edits are ordered patterns, instruments, then channel counts, so new
    /// channels are created with the final pattern and instrument counts.
    pub fn change_group<H: DocumentHost + ?Sized>(&self, host: &H) -> ChangeGroup {
        let value = |id: FieldId| self.field(id).read_validated();

        let mut group = ChangeGroup::new("Channel settings")
            .with_merge_key(PromptKind::ChannelSettings.merge_key());
        group.push(Box::new(ChangePatternsPerChannel::new(
            host,
            value(FieldId::PatternsPerChannel),
        )));
        group.push(Box::new(ChangeInstrumentsPerChannel::new(
            host,
            value(FieldId::InstrumentsPerChannel),
        )));
        group.push(Box::new(ChangeChannelCount::new(
            host,
            value(FieldId::PitchChannels),
            value(FieldId::NoiseChannels),
        )));
        group
    }

    /// Apply the field values as one undoable edit and close.
    ///
    /// If the host rejects the group the prompt stays open and the host's
    /// prompt reference is restored.
    pub fn confirm<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<PromptOutcome, PromptError> {
        self.expect_state(PromptState::Open, "confirm")?;

        let group = self.change_group(host);
        let previous_prompt = host.prompt();
        host.set_prompt(None);

        match host.record(group, true) {
            Ok(recorded) => {
                tracing::debug!(outcome = ?recorded, "channel settings confirmed");
                Ok(self.finish(PromptState::Confirmed, PromptOutcome::Confirmed(recorded)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "channel settings rejected");
                host.set_prompt(previous_prompt);
                Err(PromptError::Record(e))
            }
        }
    }

    /// Discard the prompt, undoing the frame pushed when it opened.
    pub fn cancel<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<PromptOutcome, PromptError> {
        self.expect_state(PromptState::Open, "cancel")?;
        host.undo();
        tracing::debug!("channel settings cancelled");
        Ok(self.finish(PromptState::Cancelled, PromptOutcome::Cancelled))
    }

    /// Container key-down: Enter confirms unless a button is the target,
    /// Escape cancels when enabled.
    pub fn key_down<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: Target,
        key: &KeyEvent,
    ) -> Result<Option<PromptOutcome>, PromptError> {
        if self.state != PromptState::Open || !key.is_press() {
            return Ok(None);
        }

        if key.code == KeyCode::Enter && !target.is_button() {
            return self.confirm(host).map(Some);
        }
        if let Some(ModalAction::EscapePressed) =
            self.modal.handle_event(&Event::Key(*key), &self.config)
        {
            return self.cancel(host).map(Some);
        }
        Ok(None)
    }

    /// Tear down: remove every listener `open()` registered.
    ///
    /// Only the first call has any effect.
    pub fn close(&mut self) {
        if self.state == PromptState::Closed {
            return;
        }

        let mut removed = 0;
        for id in self.registered.drain(..) {
            if self.listeners.remove(id) {
                removed += 1;
            }
        }
        for field in &mut self.fields {
            field.input.set_focused(false);
        }
        self.focus = Target::Container;
        self.modal.close();
        self.state = PromptState::Closed;
        tracing::debug!(removed, "channel settings closed");
    }

    fn finish(&mut self, state: PromptState, outcome: PromptOutcome) -> PromptOutcome {
        self.state = state;
        self.outcome = Some(outcome);
        self.close();
        outcome
    }

    fn expect_state(
        &self,
        expected: PromptState,
        operation: &'static str,
    ) -> Result<(), PromptError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PromptError::InvalidTransition {
                from: self.state,
                operation,
            })
        }
    }

    // --- Events ---

    /// Deliver `event` to `target`.
    ///
    /// Returns the prompt's outcome if the event confirmed or cancelled it.
    pub fn handle_event<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: Target,
        event: &Event,
    ) -> Result<Option<PromptOutcome>, PromptError> {
        if self.state != PromptState::Open {
            return Ok(None);
        }

        match event {
            Event::Key(key) if key.is_press() => self.dispatch_key(host, target, key),
            Event::Key(_) => Ok(None),
            Event::Mouse(_) if event.is_click() => self.dispatch_click(host, target),
            Event::Mouse(_) => Ok(None),
            Event::Paste(_) => {
                if let Target::Field(id) = target {
                    self.field_mut(id).handle_event(event);
                }
                Ok(None)
            }
            Event::Focus(true) => {
                self.move_focus(target);
                Ok(None)
            }
            Event::Focus(false) => {
                if let Target::Field(id) = target {
                    self.dispatch_blur(id);
                }
                Ok(None)
            }
        }
    }

    /// Deliver `event` to whatever currently has focus.
    pub fn handle_focused_event<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: &Event,
    ) -> Result<Option<PromptOutcome>, PromptError> {
        let target = self.focus;
        self.handle_event(host, target, event)
    }

    fn dispatch_key<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: Target,
        key: &KeyEvent,
    ) -> Result<Option<PromptOutcome>, PromptError> {
        // Key-downs bubble to the container before any default action
        if self.listeners.has(&Target::Container, ListenerKind::KeyDown)
            && let Some(outcome) = self.key_down(host, target, key)?
        {
            return Ok(Some(outcome));
        }

        match key.code {
            KeyCode::Tab => {
                self.move_focus(self.neighbour(target, 1));
                return Ok(None);
            }
            KeyCode::BackTab => {
                self.move_focus(self.neighbour(target, -1));
                return Ok(None);
            }
            _ => {}
        }

        match target {
            Target::Field(id) => {
                if self.listeners.has(&target, ListenerKind::KeyPress)
                    && !key.ctrl()
                    && let Some(code) = key.char_code()
                    && KeyFilter::for_code(code) == KeyFilter::Reject
                {
                    tracing::trace!(field = ?id, code, "keystroke rejected");
                    return Ok(None);
                }
                self.field_mut(id).handle_event(&Event::Key(*key));
                Ok(None)
            }
            // Enter and Space activate a focused button
            Target::OkayButton | Target::CancelButton
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) =>
            {
                self.dispatch_click(host, target)
            }
            _ => Ok(None),
        }
    }

    fn dispatch_click<H: DocumentHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: Target,
    ) -> Result<Option<PromptOutcome>, PromptError> {
        let action = self
            .listeners
            .actions(&target, ListenerKind::Click)
            .next()
            .copied();

        match action {
            Some(PromptAction::Confirm) => self.confirm(host).map(Some),
            Some(PromptAction::Cancel) => self.cancel(host).map(Some),
            _ => {
                if matches!(target, Target::Field(_)) {
                    self.move_focus(target);
                }
                Ok(None)
            }
        }
    }

    fn dispatch_blur(&mut self, id: FieldId) {
        if self.listeners.has(&Target::Field(id), ListenerKind::Blur) {
            self.field_mut(id).blur();
        }
    }

    /// Move focus, settling the field that loses it.
    fn move_focus(&mut self, to: Target) {
        if to == self.focus {
            return;
        }
        if let Target::Field(id) = self.focus {
            self.dispatch_blur(id);
            self.field_mut(id).set_focused(false);
        }
        self.focus = to;
        if let Target::Field(id) = to {
            let input = self.field_mut(id);
            input.set_focused(true);
            input.select_all();
        }
    }

    fn neighbour(&self, from: Target, step: isize) -> Target {
        let order = Target::ORDER;
        let len = order.len() as isize;
        let Some(index) = order.iter().position(|t| *t == from) else {
            return order[0];
        };
        order[(index as isize + step).rem_euclid(len) as usize]
    }
}
