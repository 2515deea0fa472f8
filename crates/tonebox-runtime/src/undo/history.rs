#![forbid(unsafe_code)]

//! History stack for undo/redo operations.
//!
//! This module provides the [`HistoryManager`] which maintains dual stacks
//! for undo and redo operations with support for:
//!
//! - **Memory limits**: Oldest commands evicted when budget exceeded
//! - **Depth limits**: Maximum number of commands in history
//! - **Branch handling**: New actions clear the redo stack
//! - **Merging**: A compatible new entry folds into the newest one
//!
//! # Invariants
//!
//! 1. `total_bytes` always equals sum of `size_bytes()` for all commands
//! 2. `undo_stack.len() <= config.max_depth` (after any operation)
//! 3. `total_bytes <= config.max_bytes` (after any operation, if enforced)
//! 4. Redo stack is cleared whenever a new command is pushed or merged
//!
//! # Memory Model
//!
//! Commands are stored in `VecDeque` for O(1) eviction from the front.
//!
//! ```text
//! push(cmd5)
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [cmd1, cmd2, cmd3, cmd4, cmd5]    │
//! │ Redo Stack: []                                 │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [cmd1, cmd2, cmd3]                │
//! │ Redo Stack: [cmd4, cmd5]                       │
//! └───────────────────────────────────────────────┘
//!
//! push(cmd6)  <-- new branch, clears redo
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [cmd1, cmd2, cmd3, cmd6]          │
//! │ Redo Stack: []                                 │
//! └───────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

use super::command::{CommandError, MergeConfig, UndoableCmd};

/// Configuration for the history manager.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of commands to keep in undo history.
    pub max_depth: usize,
    /// Maximum total bytes for all commands (0 = unlimited).
    pub max_bytes: usize,
    /// Configuration for command merging.
    pub merge_config: MergeConfig,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_bytes: 10 * 1024 * 1024, // 10 MB
            merge_config: MergeConfig::default(),
        }
    }
}

impl HistoryConfig {
    /// Create a new configuration with custom limits.
    #[must_use]
    pub fn new(max_depth: usize, max_bytes: usize) -> Self {
        Self {
            max_depth,
            max_bytes,
            merge_config: MergeConfig::default(),
        }
    }

    /// Set the merge configuration.
    #[must_use]
    pub fn with_merge_config(mut self, config: MergeConfig) -> Self {
        self.merge_config = config;
        self
    }

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes: 0,
            merge_config: MergeConfig::default(),
        }
    }
}

/// What happened to a command handed to [`HistoryManager::push_or_merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Stored as a new undo entry.
    Pushed,
    /// Folded into the previous undo entry.
    Merged,
}

/// Manager for undo/redo history over a target of type `T`.
///
/// Commands are expected to be executed before they are pushed; the
/// manager only calls `undo`/`redo` on them.
pub struct HistoryManager<T> {
    /// Commands available for undo (newest at back).
    undo_stack: VecDeque<Box<dyn UndoableCmd<T>>>,
    /// Commands available for redo (newest at back).
    redo_stack: VecDeque<Box<dyn UndoableCmd<T>>>,
    /// Configuration for limits and merging.
    config: HistoryConfig,
    /// Total bytes used by all commands.
    total_bytes: usize,
}

impl<T> fmt::Debug for HistoryManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("total_bytes", &self.total_bytes)
            .field("config", &self.config)
            .finish()
    }
}

impl<T> Default for HistoryManager<T> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<T> HistoryManager<T> {
    /// Create a new history manager with the given configuration.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
            total_bytes: 0,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Push an executed command as a new undo entry.
    ///
    /// This clears the redo stack (new branch) and enforces limits.
    pub fn push(&mut self, cmd: Box<dyn UndoableCmd<T>>) {
        self.clear_redo();
        tracing::debug!(description = cmd.description(), "history push");
        self.total_bytes += cmd.size_bytes();
        self.undo_stack.push_back(cmd);
        self.enforce_limits();
    }

    /// Push an executed command, folding it into the newest undo entry when
    /// that entry accepts it.
    pub fn push_or_merge(&mut self, cmd: Box<dyn UndoableCmd<T>>) -> PushOutcome {
        self.clear_redo();

        match self.try_merge(cmd) {
            Ok(()) => {
                self.enforce_limits();
                PushOutcome::Merged
            }
            Err(cmd) => {
                self.push(cmd);
                PushOutcome::Pushed
            }
        }
    }

    /// Undo the last command.
    ///
    /// Moves the command from undo stack to redo stack and calls undo().
    ///
    /// # Returns
    ///
    /// - `Ok(description)` if undo succeeded
    /// - `Err(error)` if undo failed (command remains on undo stack)
    /// - `None` if no commands to undo
    pub fn undo(&mut self, target: &mut T) -> Option<Result<String, CommandError>> {
        let mut cmd = self.undo_stack.pop_back()?;
        let description = cmd.description().to_string();

        let old_size = cmd.size_bytes();
        let result = cmd.undo(target);
        self.resize(old_size, cmd.size_bytes());

        match result {
            Ok(()) => {
                tracing::debug!(description = %description, "history undo");
                self.redo_stack.push_back(cmd);
                Some(Ok(description))
            }
            Err(e) => {
                tracing::warn!(description = %description, error = %e, "history undo failed");
                self.undo_stack.push_back(cmd);
                Some(Err(e))
            }
        }
    }

    /// Redo the last undone command.
    ///
    /// # Returns
    ///
    /// - `Ok(description)` if redo succeeded
    /// - `Err(error)` if redo failed (command remains on redo stack)
    /// - `None` if no commands to redo
    pub fn redo(&mut self, target: &mut T) -> Option<Result<String, CommandError>> {
        let mut cmd = self.redo_stack.pop_back()?;
        let description = cmd.description().to_string();

        let old_size = cmd.size_bytes();
        let result = cmd.redo(target);
        self.resize(old_size, cmd.size_bytes());

        match result {
            Ok(()) => {
                tracing::debug!(description = %description, "history redo");
                self.undo_stack.push_back(cmd);
                self.enforce_limits();
                Some(Ok(description))
            }
            Err(e) => {
                tracing::warn!(description = %description, error = %e, "history redo failed");
                self.redo_stack.push_back(cmd);
                Some(Err(e))
            }
        }
    }

    /// Drop the newest undo entry if undoing it would change nothing.
    ///
    /// Returns `true` if an entry was removed.
    pub fn discard_noop_top(&mut self) -> bool {
        if !self.undo_stack.back().is_some_and(|c| c.is_noop()) {
            return false;
        }
        if let Some(cmd) = self.undo_stack.pop_back() {
            self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
            tracing::debug!(description = cmd.description(), "history discard no-op entry");
        }
        true
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Get the undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The entry the next `undo()` would revert.
    #[must_use]
    pub fn next_undo(&self) -> Option<&dyn UndoableCmd<T>> {
        self.undo_stack.back().map(|c| c.as_ref())
    }

    /// The entry the next `redo()` would reapply.
    #[must_use]
    pub fn next_redo(&self) -> Option<&dyn UndoableCmd<T>> {
        self.redo_stack.back().map(|c| c.as_ref())
    }

    /// Get the description of the next undo command.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Get the description of the next redo command.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// Get total memory usage in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.total_bytes
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Clear all history (both undo and redo).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_bytes = 0;
    }

    /// Clear only the redo stack.
    fn clear_redo(&mut self) {
        for cmd in self.redo_stack.drain(..) {
            self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
        }
    }

    /// Enforce depth and memory limits by evicting oldest commands.
    fn enforce_limits(&mut self) {
        while self.undo_stack.len() > self.config.max_depth {
            if let Some(cmd) = self.undo_stack.pop_front() {
                self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
            }
        }

        if self.config.max_bytes > 0 {
            while self.total_bytes > self.config.max_bytes {
                // Future history goes first
                if let Some(cmd) = self.redo_stack.pop_front() {
                    self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
                    continue;
                }

                if let Some(cmd) = self.undo_stack.pop_front() {
                    self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
                } else {
                    break;
                }
            }
        }
    }

    /// Try to merge a command into the last one on the undo stack.
    ///
    /// Returns `Ok(())` if merged, `Err(cmd)` if not merged.
    fn try_merge(
        &mut self,
        cmd: Box<dyn UndoableCmd<T>>,
    ) -> Result<(), Box<dyn UndoableCmd<T>>> {
        let Some(last) = self.undo_stack.back_mut() else {
            return Err(cmd);
        };

        if !last.can_merge(cmd.as_ref(), &self.config.merge_config) {
            return Err(cmd);
        }

        let old_size = last.size_bytes();
        last.accept_merge(cmd)?;

        let new_size = last.size_bytes();
        tracing::debug!(description = last.description(), "history merge");
        self.resize(old_size, new_size);
        Ok(())
    }

    /// Account for an entry whose size changed while it stayed in history.
    ///
    /// Commands may grow or shrink on undo/redo (e.g. dropping a snapshot),
    /// so every transition re-measures.
    fn resize(&mut self, old_size: usize, new_size: usize) {
        self.total_bytes = self.total_bytes.saturating_sub(old_size) + new_size;
    }
}

// ============================================================================
// Tests
// ============================================================================
