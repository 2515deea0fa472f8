#![forbid(unsafe_code)]

//! Tonebox
//!
//! Song editing with an undoable channel settings dialog.
//!
//! # Crates
//! - [`core`]: normalized input events.
//! - [`runtime`]: undoable commands, change batches and the history stack.
//! - [`song`]: the song model, channel bounds and [`SongDocument`].
//! - [`widgets`]: the number input and [`ChannelSettingsPrompt`].
//!
//! # Example
//! ```
//! use tonebox::prelude::*;
//!
//! let mut doc = SongDocument::default();
//! let mut prompt = tonebox::open_channel_settings(&mut doc).unwrap();
//!
//! prompt.field_mut(FieldId::PatternsPerChannel).set_value("16");
//! prompt.confirm(&mut doc).unwrap();
//!
//! assert_eq!(doc.song().patterns_per_channel, 16);
//! assert!(doc.undo());
//! assert_eq!(doc.song().patterns_per_channel, 8);
//! ```

pub mod error;
pub mod logging;

pub use tonebox_core as core;
pub use tonebox_runtime as runtime;
pub use tonebox_song as song;
pub use tonebox_widgets as widgets;

pub use error::{Error, Result};
pub use tonebox_song::{DocumentHost, PromptKind, SongDocument};
pub use tonebox_widgets::ChannelSettingsPrompt;

/// Commonly used types.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use tonebox_core::{Event, KeyCode, KeyEvent, Modifiers};
    pub use tonebox_runtime::{HistoryConfig, HistoryManager, UndoableCmd};
    pub use tonebox_song::{
        Bounds, ChangeGroup, ChannelBounds, DocumentHost, PromptKind, RecordOutcome, Song,
        SongDocument,
    };
    pub use tonebox_widgets::{
        ChannelSettingsPrompt, FieldId, NumberInput, PromptConfig, PromptOutcome, PromptState,
        Target,
    };
}

/// Open the channel settings dialog over `doc`.
///
/// Pushes the prompt's frame onto the document's history, then builds the
/// prompt from the current song and opens it.
pub fn open_channel_settings(doc: &mut SongDocument) -> Result<ChannelSettingsPrompt> {
    doc.open_prompt(PromptKind::ChannelSettings);
    let mut prompt = ChannelSettingsPrompt::new(&*doc);
    prompt.open()?;
    Ok(prompt)
}
