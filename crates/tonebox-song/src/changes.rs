#![forbid(unsafe_code)]

//! Undoable song edits.
//!
//! Each edit is built from the document it will be applied to, capturing the
//! current value and the configured bounds. Execution re-checks the bounds
//! and snapshots the song, so undo restores the exact prior channel data.
//!
//! Edits are meant to be pushed into a [`ChangeGroup`] and recorded through
//! [`DocumentHost::record`](crate::DocumentHost::record).

use std::any::Any;

use tonebox_runtime::{CommandBatch, CommandMetadata, CommandResult, UndoableCmd};

use crate::config::Bounds;
use crate::document::DocumentHost;
use crate::model::Song;

/// An atomic group of song edits.
pub type ChangeGroup = CommandBatch<Song>;

/// Approximate retained size of a song snapshot.
fn snapshot_size(song: &Song) -> usize {
    std::mem::size_of::<Song>()
        + song
            .channels
            .iter()
            .map(|c| {
                std::mem::size_of_val(c)
                    + c.bars.len() * std::mem::size_of::<u32>()
                    + c.instruments.len() * std::mem::size_of::<crate::model::Instrument>()
                    + c.patterns
                        .iter()
                        .map(|p| {
                            std::mem::size_of_val(p)
                                + p.notes.len() * std::mem::size_of::<crate::model::Note>()
                        })
                        .sum::<usize>()
            })
            .sum::<usize>()
}

/// Apply `edit` after snapshotting the song into `before`.
fn apply_with_snapshot(before: &mut Option<Song>, song: &mut Song, edit: impl FnOnce(&mut Song)) {
    *before = Some(song.clone());
    edit(song);
}

fn restore_snapshot(before: &mut Option<Song>, song: &mut Song) {
    if let Some(snapshot) = before.take() {
        *song = snapshot;
    }
}

// ============================================================================
// Patterns per channel
// ============================================================================

/// Set how many patterns every channel holds.
pub struct ChangePatternsPerChannel {
    value: u32,
    previous: u32,
    bounds: Bounds,
    before: Option<Song>,
    metadata: CommandMetadata,
}

impl ChangePatternsPerChannel {
    pub fn new<H: DocumentHost + ?Sized>(doc: &H, value: u32) -> Self {
        Self {
            value,
            previous: doc.song().patterns_per_channel,
            bounds: doc.bounds().patterns_per_channel,
            before: None,
            metadata: CommandMetadata::new("Change patterns per channel"),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl UndoableCmd<Song> for ChangePatternsPerChannel {
    fn execute(&mut self, song: &mut Song) -> CommandResult {
        self.bounds.check("patterns per channel", self.value)?;
        if song.patterns_per_channel == self.value {
            self.before = None;
            return Ok(());
        }
        let value = self.value;
        apply_with_snapshot(&mut self.before, song, |s| s.set_patterns_per_channel(value));
        Ok(())
    }

    fn undo(&mut self, song: &mut Song) -> CommandResult {
        restore_snapshot(&mut self.before, song);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.metadata.size_bytes()
            + self.before.as_ref().map_or(0, snapshot_size)
    }

    fn is_noop(&self) -> bool {
        self.value == self.previous
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_name(&self) -> &'static str {
        "ChangePatternsPerChannel"
    }
}

// ============================================================================
// Instruments per channel
// ============================================================================

/// Set how many instruments every channel holds.
pub struct ChangeInstrumentsPerChannel {
    value: u32,
    previous: u32,
    bounds: Bounds,
    before: Option<Song>,
    metadata: CommandMetadata,
}

impl ChangeInstrumentsPerChannel {
    pub fn new<H: DocumentHost + ?Sized>(doc: &H, value: u32) -> Self {
        Self {
            value,
            previous: doc.song().instruments_per_channel,
            bounds: doc.bounds().instruments_per_channel,
            before: None,
            metadata: CommandMetadata::new("Change instruments per channel"),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl UndoableCmd<Song> for ChangeInstrumentsPerChannel {
    fn execute(&mut self, song: &mut Song) -> CommandResult {
        self.bounds.check("instruments per channel", self.value)?;
        if song.instruments_per_channel == self.value {
            self.before = None;
            return Ok(());
        }
        let value = self.value;
        apply_with_snapshot(&mut self.before, song, |s| {
            s.set_instruments_per_channel(value)
        });
        Ok(())
    }

    fn undo(&mut self, song: &mut Song) -> CommandResult {
        restore_snapshot(&mut self.before, song);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.metadata.size_bytes()
            + self.before.as_ref().map_or(0, snapshot_size)
    }

    fn is_noop(&self) -> bool {
        self.value == self.previous
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_name(&self) -> &'static str {
        "ChangeInstrumentsPerChannel"
    }
}

// ============================================================================
// Channel count
// ============================================================================

/// Set the number of pitch and noise channels together.
pub struct ChangeChannelCount {
    pitch: u32,
    noise: u32,
    previous: (u32, u32),
    pitch_bounds: Bounds,
    noise_bounds: Bounds,
    before: Option<Song>,
    metadata: CommandMetadata,
}

impl ChangeChannelCount {
    pub fn new<H: DocumentHost + ?Sized>(doc: &H, pitch: u32, noise: u32) -> Self {
        let song = doc.song();
        Self {
            pitch,
            noise,
            previous: (song.pitch_channel_count, song.noise_channel_count),
            pitch_bounds: doc.bounds().pitch_channels,
            noise_bounds: doc.bounds().noise_channels,
            before: None,
            metadata: CommandMetadata::new("Change channel count"),
        }
    }

    /// `(pitch, noise)`.
    pub fn counts(&self) -> (u32, u32) {
        (self.pitch, self.noise)
    }
}

impl UndoableCmd<Song> for ChangeChannelCount {
    fn execute(&mut self, song: &mut Song) -> CommandResult {
        self.pitch_bounds.check("pitch channels", self.pitch)?;
        self.noise_bounds.check("noise channels", self.noise)?;
        if (song.pitch_channel_count, song.noise_channel_count) == (self.pitch, self.noise) {
            self.before = None;
            return Ok(());
        }
        let (pitch, noise) = (self.pitch, self.noise);
        apply_with_snapshot(&mut self.before, song, |s| s.set_channel_counts(pitch, noise));
        Ok(())
    }

    fn undo(&mut self, song: &mut Song) -> CommandResult {
        restore_snapshot(&mut self.before, song);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.metadata.size_bytes()
            + self.before.as_ref().map_or(0, snapshot_size)
    }

    fn is_noop(&self) -> bool {
        (self.pitch, self.noise) == self.previous
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_name(&self) -> &'static str {
        "ChangeChannelCount"
    }
}
