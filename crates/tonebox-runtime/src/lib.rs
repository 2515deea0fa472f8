#![forbid(unsafe_code)]

//! Tonebox Runtime
//!
//! Reversible edits for Tonebox documents.
//!
//! # Role in Tonebox
//! Every change a user makes to a song goes through an [`undo::UndoableCmd`].
//! Commands are grouped into [`undo::CommandBatch`]es so a single dialog
//! confirmation becomes a single undo step, and the
//! [`undo::HistoryManager`] owns the undo/redo stacks for a document.
//!
//! The runtime is generic over the edited target type, so it has no
//! knowledge of songs; `tonebox-song` supplies the concrete commands.

pub mod undo;

pub use undo::{
    CommandBatch, CommandError, CommandMetadata, CommandResult, HistoryConfig, HistoryManager,
    MergeConfig, PushOutcome, UndoableCmd,
};
