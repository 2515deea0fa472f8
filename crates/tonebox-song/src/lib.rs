#![forbid(unsafe_code)]

//! Tonebox Song
//!
//! The song model and the edits the channel settings dialog applies to it.
//!
//! # Role in Tonebox
//! - [`model`]: channels, patterns, instruments and bars.
//! - [`config`]: the inclusive bounds each channel-settings parameter obeys.
//! - [`changes`]: undoable edits bundled into a [`ChangeGroup`].
//! - [`document`]: [`SongDocument`], the host that applies groups and owns
//!   the undo history, behind the [`DocumentHost`] trait.

pub mod changes;
pub mod config;
pub mod document;
pub mod model;

pub use changes::{
    ChangeChannelCount, ChangeGroup, ChangeInstrumentsPerChannel, ChangePatternsPerChannel,
};
pub use config::{Bounds, ChannelBounds, ConfigError};
pub use document::{DocumentError, DocumentHost, PromptKind, RecordOutcome, SongDocument};
pub use model::{Channel, ChannelKind, Instrument, InstrumentKind, Note, Pattern, Song};
