#![forbid(unsafe_code)]

//! Undo/Redo command history framework.
//!
//! This module provides infrastructure for reversible operations on a
//! document. It implements the Command Pattern with support for:
//!
//! - **Reversibility**: Every command can be undone and redone
//! - **Atomic batches**: Several commands execute, undo and redo as one unit
//! - **Merging**: A batch can absorb a following compatible batch
//! - **Memory management**: Commands report size for bounded history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     HistoryManager<T>                           │
//! │  ┌──────────────────┐          ┌──────────────────┐             │
//! │  │   Undo Stack     │          │   Redo Stack     │             │
//! │  │  ┌────────────┐  │          │  ┌────────────┐  │             │
//! │  │  │ BatchN     │  │  undo()  │  │ Batch1     │  │             │
//! │  │  ├────────────┤  │ ──────►  │  ├────────────┤  │             │
//! │  │  │ Batch2     │  │          │  │ Batch2     │  │             │
//! │  │  ├────────────┤  │  ◄────── │  ├────────────┤  │             │
//! │  │  │ Batch1     │  │  redo()  │  │ BatchN     │  │             │
//! │  │  └────────────┘  │          │  └────────────┘  │             │
//! │  └──────────────────┘          └──────────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Commands Receive Their Target
//!
//! Commands never hold a reference to the document they edit. The target is
//! passed to `execute`/`undo`/`redo`, so commands are plain owned values that
//! can sit in history while the document keeps being edited.
//!
//! ## Merge Strategy
//!
//! Batches carry an optional merge key. When a batch is pushed with
//! [`HistoryManager::push_or_merge`] and the newest undo entry is a batch
//! with the same key, the new batch is folded into it instead of creating a
//! new history frame. Undoing the merged entry reverts both.
//!
//! This is what lets a modal prompt open a speculative frame and later
//! replace it with the real edit.

pub mod command;
pub mod history;

pub use command::{
    CommandBatch, CommandError, CommandMetadata, CommandResult, MergeConfig, UndoableCmd,
};
pub use history::{HistoryConfig, HistoryManager, PushOutcome};
