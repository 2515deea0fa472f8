#![forbid(unsafe_code)]

//! The host document: a song, its bounds and its undo history.
//!
//! Dialogs never touch [`SongDocument`] directly. They go through the
//! [`DocumentHost`] trait, which is the whole surface a prompt needs: read
//! the song and bounds, record a change group, undo, and manage the open
//! prompt reference.
//!
//! # Speculative prompt frames
//!
//! [`SongDocument::open_prompt`] pushes an empty, keyed [`ChangeGroup`] onto
//! the history before a prompt is shown. Cancelling the prompt undoes that
//! frame. Confirming records the real group as mergeable, which folds it into
//! the frame so the whole prompt is a single undo step.

use std::fmt;

use tonebox_runtime::{CommandError, HistoryConfig, HistoryManager, PushOutcome, UndoableCmd};

use crate::changes::ChangeGroup;
use crate::config::ChannelBounds;
use crate::model::Song;

/// Prompts that can be open over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    ChannelSettings,
}

impl PromptKind {
    /// Merge key used for the prompt's history frame.
    #[must_use]
    pub const fn merge_key(self) -> &'static str {
        match self {
            Self::ChannelSettings => "prompt.channel_settings",
        }
    }

    #[must_use]
    pub fn from_merge_key(key: &str) -> Option<Self> {
        match key {
            "prompt.channel_settings" => Some(Self::ChannelSettings),
            _ => None,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ChannelSettings => "Channel Settings",
        }
    }
}

/// What [`DocumentHost::record`] did with a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Applied and stored as a new history entry.
    Recorded,
    /// Applied and folded into the newest history entry.
    Merged,
    /// Nothing to apply; history left as is (minus any empty prompt frame).
    Skipped,
}

/// Errors raised by the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A change in the recorded group refused to apply.
    Rejected(CommandError),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(e) => write!(f, "change rejected: {e}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(e) => Some(e),
        }
    }
}

impl From<CommandError> for DocumentError {
    fn from(e: CommandError) -> Self {
        Self::Rejected(e)
    }
}

/// The document surface a prompt works against.
pub trait DocumentHost {
    /// Current song state.
    fn song(&self) -> &Song;

    /// Configured channel bounds.
    fn bounds(&self) -> &ChannelBounds;

    /// Apply `group` atomically and store it in history.
    ///
    /// When `mergeable` is set the group may fold into a compatible newest
    /// entry instead of opening a new one.
    fn record(&mut self, group: ChangeGroup, mergeable: bool)
    -> Result<RecordOutcome, DocumentError>;

    /// Revert the newest history entry. Returns `false` if there was none.
    fn undo(&mut self) -> bool;

    /// The prompt currently open over this document, if any.
    fn prompt(&self) -> Option<PromptKind>;

    fn set_prompt(&mut self, prompt: Option<PromptKind>);
}

/// A song plus its undo history.
#[derive(Debug)]
pub struct SongDocument {
    song: Song,
    bounds: ChannelBounds,
    history: HistoryManager<Song>,
    prompt: Option<PromptKind>,
    revision: u64,
    selected_channel: usize,
}

impl Default for SongDocument {
    fn default() -> Self {
        Self::new(Song::default(), ChannelBounds::default())
    }
}

impl SongDocument {
    #[must_use]
    pub fn new(song: Song, bounds: ChannelBounds) -> Self {
        Self::with_history_config(song, bounds, HistoryConfig::default())
    }

    #[must_use]
    pub fn with_history_config(song: Song, bounds: ChannelBounds, config: HistoryConfig) -> Self {
        let problems = bounds.validate();
        if !problems.is_empty() {
            tracing::warn!(?problems, "channel bounds failed validation");
        }
        Self {
            song,
            bounds,
            history: HistoryManager::new(config),
            prompt: None,
            revision: 0,
            selected_channel: 0,
        }
    }

    /// Push an empty frame for `kind` and mark it as the open prompt.
    pub fn open_prompt(&mut self, kind: PromptKind) {
        let frame = ChangeGroup::new(kind.title()).with_merge_key(kind.merge_key());
        self.history.push(Box::new(frame));
        self.prompt = Some(kind);
        tracing::debug!(prompt = kind.title(), "prompt opened");
    }

    /// Reapply the newest undone entry. Returns `false` if there was none.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.song) {
            None => false,
            Some(Ok(_)) => {
                self.changed();
                true
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "redo failed");
                false
            }
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn history(&self) -> &HistoryManager<Song> {
        &self.history
    }

    /// Bumped on every applied change, undo and redo.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn selected_channel(&self) -> usize {
        self.selected_channel
    }

    pub fn select_channel(&mut self, channel: usize) {
        self.selected_channel = channel;
        self.clamp_selection();
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let last = self.song.channel_count().saturating_sub(1);
        self.selected_channel = self.selected_channel.min(last);
    }

    /// Drop an empty frame keyed like `group` from the top of history.
    fn discard_matching_frame(&mut self, group: &ChangeGroup) {
        let Some(key) = group.merge_key() else {
            return;
        };
        let matches = self
            .history
            .next_undo()
            .is_some_and(|top| top.metadata().merge_key == Some(key));
        if matches && self.history.discard_noop_top() {
            tracing::debug!("discarded empty prompt frame");
        }
    }
}

impl DocumentHost for SongDocument {
    fn song(&self) -> &Song {
        &self.song
    }

    fn bounds(&self) -> &ChannelBounds {
        &self.bounds
    }

    fn record(
        &mut self,
        mut group: ChangeGroup,
        mergeable: bool,
    ) -> Result<RecordOutcome, DocumentError> {
        if group.is_noop() {
            if mergeable {
                self.discard_matching_frame(&group);
            }
            tracing::debug!(description = group.description(), "record skipped no-op group");
            return Ok(RecordOutcome::Skipped);
        }

        group.execute(&mut self.song)?;
        let outcome = if mergeable {
            self.history.push_or_merge(Box::new(group))
        } else {
            self.history.push(Box::new(group));
            PushOutcome::Pushed
        };
        self.changed();

        let outcome = match outcome {
            PushOutcome::Pushed => RecordOutcome::Recorded,
            PushOutcome::Merged => RecordOutcome::Merged,
        };
        tracing::debug!(?outcome, revision = self.revision, "recorded change group");
        Ok(outcome)
    }

    fn undo(&mut self) -> bool {
        let Some((prompt_frame, empty)) = self.history.next_undo().map(|top| {
            let kind = top.metadata().merge_key.and_then(PromptKind::from_merge_key);
            (kind, top.is_noop())
        }) else {
            return false;
        };

        // An untouched prompt frame is dropped, not moved to the redo stack
        if prompt_frame.is_some() && empty && self.history.discard_noop_top() {
            self.prompt = None;
            tracing::debug!("discarded empty prompt frame on undo");
            return true;
        }

        match self.history.undo(&mut self.song) {
            None => false,
            Some(Ok(_)) => {
                if prompt_frame.is_some() {
                    self.prompt = None;
                }
                self.changed();
                true
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "undo failed");
                false
            }
        }
    }

    fn prompt(&self) -> Option<PromptKind> {
        self.prompt
    }

    fn set_prompt(&mut self, prompt: Option<PromptKind>) {
        self.prompt = prompt;
    }
}
