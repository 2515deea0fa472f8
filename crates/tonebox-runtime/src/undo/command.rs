#![forbid(unsafe_code)]

//! Undoable command infrastructure for the undo/redo system.
//!
//! This module provides the [`UndoableCmd`] trait for reversible operations
//! on a target of type `T`, and [`CommandBatch`], the ordered group that
//! turns several commands into one atomic history entry.
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` restores prior state exactly
//! - `undo()` followed by `redo()` restores the executed state exactly
//! - A batch whose `execute()` fails leaves the target as it found it
//! - `size_bytes()` MUST be accurate for memory budgeting
//!
//! # Failure Modes
//!
//! - **Out of range**: a command's value violates the target's limits
//!   - Mitigation: validate in `execute()` before touching the target
//! - **State drift**: external changes invalidate undo data
//!   - Mitigation: commands snapshot what they replace at execute time

use std::any::Any;
use std::fmt;
use std::time::{Duration, Instant};

/// Metadata attached to every command for tracing and UI display.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Human-readable description for UI (e.g., "Change channel count").
    pub description: String,
    /// When the command was created.
    pub timestamp: Instant,
    /// Batches with equal keys may merge into one history entry.
    pub merge_key: Option<&'static str>,
}

impl CommandMetadata {
    /// Create new metadata with the given description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamp: Instant::now(),
            merge_key: None,
        }
    }

    /// Set the merge key.
    #[must_use]
    pub fn with_merge_key(mut self, key: &'static str) -> Self {
        self.merge_key = Some(key);
        self
    }

    /// Size in bytes for memory accounting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.description.len()
    }
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self::new("Unknown")
    }
}

/// Result of command execution or undo.
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur during command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A value lies outside its inclusive bounds.
    OutOfRange {
        what: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    /// Command cannot be executed in current state.
    InvalidState(String),
    /// Generic error with message.
    Other(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                what,
                value,
                min,
                max,
            } => write!(f, "{what} {value} out of range {min}..={max}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Configuration for batch merging behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeConfig {
    /// Maximum time between the two batches' creation (`None` = no limit).
    pub max_delay: Option<Duration>,
    /// Maximum number of members a merged batch may hold.
    pub max_merged_len: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_delay: None,
            max_merged_len: 64,
        }
    }
}

/// A reversible command that can be undone and redone against a target.
pub trait UndoableCmd<T>: Send {
    /// Execute the command, applying its effect.
    fn execute(&mut self, target: &mut T) -> CommandResult;

    /// Undo the command, reverting its effect.
    fn undo(&mut self, target: &mut T) -> CommandResult;

    /// Redo the command after it was undone.
    fn redo(&mut self, target: &mut T) -> CommandResult {
        self.execute(target)
    }

    /// Human-readable description for UI display.
    fn description(&self) -> &str;

    /// Size of this command in bytes for memory budgeting.
    fn size_bytes(&self) -> usize;

    /// Whether executing this command would leave the target unchanged.
    fn is_noop(&self) -> bool {
        false
    }

    /// Check if `next` may be folded into this command.
    fn can_merge(&self, _next: &dyn UndoableCmd<T>, _config: &MergeConfig) -> bool {
        false
    }

    /// Fold an already executed `next` into this command.
    ///
    /// Returns the command back if it was not absorbed.
    fn accept_merge(
        &mut self,
        next: Box<dyn UndoableCmd<T>>,
    ) -> Result<(), Box<dyn UndoableCmd<T>>> {
        Err(next)
    }

    /// Get the command metadata.
    fn metadata(&self) -> &CommandMetadata;

    /// Downcast to concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Debug description of the command.
    fn debug_name(&self) -> &'static str {
        "UndoableCmd"
    }
}

impl<T> fmt::Debug for dyn UndoableCmd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.debug_name())
            .field("description", &self.description())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// An ordered group of commands that execute and undo together.
///
/// Commands run in push order and are undone in reverse, so a later
/// command always observes the state left by the earlier ones.
pub struct CommandBatch<T> {
    /// Commands in execution order.
    commands: Vec<Box<dyn UndoableCmd<T>>>,
    /// Batch metadata.
    metadata: CommandMetadata,
    /// Number of leading commands currently applied.
    executed_to: usize,
}

impl<T> fmt::Debug for CommandBatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBatch")
            .field("commands_count", &self.commands.len())
            .field("metadata", &self.metadata)
            .field("executed_to", &self.executed_to)
            .finish()
    }
}

impl<T> CommandBatch<T> {
    /// Create a new command batch.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            metadata: CommandMetadata::new(description),
            executed_to: 0,
        }
    }

    /// Set the merge key (builder).
    #[must_use]
    pub fn with_merge_key(mut self, key: &'static str) -> Self {
        self.metadata.merge_key = Some(key);
        self
    }

    /// Add a command to the batch.
    pub fn push(&mut self, cmd: Box<dyn UndoableCmd<T>>) {
        self.commands.push(cmd);
    }

    /// Add a pre-executed command to the batch.
    ///
    /// Use this for commands that have already been executed externally.
    /// The command will be properly undone when the batch is undone.
    pub fn push_executed(&mut self, cmd: Box<dyn UndoableCmd<T>>) {
        self.commands.push(cmd);
        self.executed_to = self.commands.len();
    }

    /// Number of commands in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the commands in execution order.
    pub fn commands(&self) -> impl Iterator<Item = &dyn UndoableCmd<T>> {
        self.commands.iter().map(|c| c.as_ref())
    }

    /// The merge key, if any.
    #[must_use]
    pub fn merge_key(&self) -> Option<&'static str> {
        self.metadata.merge_key
    }
}

impl<T: 'static> UndoableCmd<T> for CommandBatch<T> {
    fn execute(&mut self, target: &mut T) -> CommandResult {
        for i in 0..self.commands.len() {
            if let Err(e) = self.commands[i].execute(target) {
                // Roll back the executed prefix so the batch is all-or-nothing
                for j in (0..i).rev() {
                    let _ = self.commands[j].undo(target);
                }
                self.executed_to = 0;
                return Err(e);
            }
            self.executed_to = i + 1;
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut T) -> CommandResult {
        for i in (0..self.executed_to).rev() {
            self.commands[i].undo(target)?;
            self.executed_to = i;
        }
        Ok(())
    }

    fn redo(&mut self, target: &mut T) -> CommandResult {
        self.execute(target)
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.metadata.size_bytes()
            + self.commands.iter().map(|c| c.size_bytes()).sum::<usize>()
    }

    fn is_noop(&self) -> bool {
        self.commands.iter().all(|c| c.is_noop())
    }

    fn can_merge(&self, next: &dyn UndoableCmd<T>, config: &MergeConfig) -> bool {
        let Some(next) = next.as_any().downcast_ref::<Self>() else {
            return false;
        };

        let (Some(ours), Some(theirs)) = (self.metadata.merge_key, next.metadata.merge_key) else {
            return false;
        };
        if ours != theirs {
            return false;
        }

        // An empty batch is a placeholder frame and absorbs its follow-up
        // however long it took to arrive
        if !self.commands.is_empty()
            && let Some(max_delay) = config.max_delay
        {
            let elapsed = next
                .metadata
                .timestamp
                .saturating_duration_since(self.metadata.timestamp);
            if elapsed > max_delay {
                return false;
            }
        }

        self.commands.len() < config.max_merged_len
    }

    fn accept_merge(
        &mut self,
        next: Box<dyn UndoableCmd<T>>,
    ) -> Result<(), Box<dyn UndoableCmd<T>>> {
        if next.as_any().downcast_ref::<Self>().is_none() {
            return Err(next);
        }
        self.push_executed(next);
        Ok(())
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_name(&self) -> &'static str {
        "CommandBatch"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Adds `delta` to an `i64`, refusing to go past `limit`.
    struct AddCmd {
        delta: i64,
        limit: i64,
        metadata: CommandMetadata,
    }

    impl AddCmd {
        fn new(delta: i64) -> Self {
            Self {
                delta,
                limit: i64::MAX,
                metadata: CommandMetadata::new("Add"),
            }
        }

        fn limited(delta: i64, limit: i64) -> Self {
            Self {
                limit,
                ..Self::new(delta)
            }
        }
    }

    impl UndoableCmd<i64> for AddCmd {
        fn execute(&mut self, target: &mut i64) -> CommandResult {
            if *target + self.delta > self.limit {
                return Err(CommandError::InvalidState("limit exceeded".into()));
            }
            *target += self.delta;
            Ok(())
        }

        fn undo(&mut self, target: &mut i64) -> CommandResult {
            *target -= self.delta;
            Ok(())
        }

        fn description(&self) -> &str {
            &self.metadata.description
        }

        fn size_bytes(&self) -> usize {
            std::mem::size_of::<Self>()
        }

        fn is_noop(&self) -> bool {
            self.delta == 0
        }

        fn metadata(&self) -> &CommandMetadata {
            &self.metadata
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn batch_of(deltas: &[i64]) -> CommandBatch<i64> {
        let mut batch = CommandBatch::new("Batch");
        for &d in deltas {
            batch.push(Box::new(AddCmd::new(d)));
        }
        batch
    }

    #[test]
    fn test_command_metadata_size() {
        let meta = CommandMetadata::new("Test command");
        let size = meta.size_bytes();
        assert!(size >= std::mem::size_of::<CommandMetadata>() + "Test command".len());
    }

    #[test]
    fn test_command_metadata_builders() {
        let meta = CommandMetadata::new("Test").with_merge_key("prompt");
        assert_eq!(meta.description, "Test");
        assert_eq!(meta.merge_key, Some("prompt"));
    }

    #[test]
    fn test_command_batch_execute_undo() {
        let mut value = 0i64;
        let mut batch = batch_of(&[5, 10]);

        batch.execute(&mut value).unwrap();
        assert_eq!(value, 15);

        batch.undo(&mut value).unwrap();
        assert_eq!(value, 0);

        batch.redo(&mut value).unwrap();
        assert_eq!(value, 15);
    }

    #[test]
    fn test_command_batch_rolls_back_on_failure() {
        let mut value = 0i64;
        let mut batch = CommandBatch::new("Failing");
        batch.push(Box::new(AddCmd::new(3)));
        batch.push(Box::new(AddCmd::new(4)));
        batch.push(Box::new(AddCmd::limited(100, 50)));

        let err = batch.execute(&mut value).unwrap_err();
        assert!(matches!(err, CommandError::InvalidState(_)));
        assert_eq!(value, 0, "executed prefix must be rolled back");

        // Nothing is applied, so undo is a no-op.
        batch.undo(&mut value).unwrap();
        assert_eq!(value, 0);
    }

    #[test]
    fn test_command_batch_preserves_order() {
        let batch = batch_of(&[1, 2, 3]);
        let order: Vec<i64> = batch
            .commands()
            .map(|c| c.as_any().downcast_ref::<AddCmd>().unwrap().delta)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_command_batch_empty_is_noop() {
        let batch: CommandBatch<i64> = CommandBatch::new("Empty");
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert!(batch.is_noop());
    }

    #[test]
    fn test_command_batch_noop_when_all_members_noop() {
        assert!(batch_of(&[0, 0]).is_noop());
        assert!(!batch_of(&[0, 1]).is_noop());
    }

    #[test]
    fn test_batch_merge_requires_equal_keys() {
        let config = MergeConfig::default();
        let a = batch_of(&[1]).with_merge_key("prompt");
        let b = batch_of(&[2]).with_merge_key("prompt");
        let c = batch_of(&[3]).with_merge_key("other");
        let d = batch_of(&[4]);

        assert!(a.can_merge(&b, &config));
        assert!(!a.can_merge(&c, &config));
        assert!(!a.can_merge(&d, &config));
        assert!(!d.can_merge(&a, &config));
    }

    #[test]
    fn test_batch_merge_rejects_non_batches() {
        let config = MergeConfig::default();
        let a = batch_of(&[1]).with_merge_key("prompt");
        assert!(!a.can_merge(&AddCmd::new(1), &config));

        let mut a = a;
        assert!(a.accept_merge(Box::new(AddCmd::new(1))).is_err());
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_batch_merge_respects_max_delay() {
        let config = MergeConfig {
            max_delay: Some(Duration::from_millis(10)),
            ..MergeConfig::default()
        };
        let a = batch_of(&[1]).with_merge_key("k");
        let mut b = batch_of(&[2]).with_merge_key("k");
        b.metadata.timestamp = a.metadata.timestamp + Duration::from_secs(1);
        assert!(!a.can_merge(&b, &config));

        b.metadata.timestamp = a.metadata.timestamp;
        assert!(a.can_merge(&b, &config));
    }

    #[test]
    fn test_empty_batch_merges_regardless_of_delay() {
        let config = MergeConfig {
            max_delay: Some(Duration::from_millis(1)),
            ..MergeConfig::default()
        };
        let frame: CommandBatch<i64> = CommandBatch::new("Frame").with_merge_key("k");
        let mut late = batch_of(&[2]).with_merge_key("k");
        late.metadata.timestamp = frame.metadata.timestamp + Duration::from_secs(60);
        assert!(frame.can_merge(&late, &config));

        let other = batch_of(&[3]).with_merge_key("other");
        assert!(!frame.can_merge(&other, &config));
    }

    #[test]
    fn test_batch_merge_respects_max_len() {
        let config = MergeConfig {
            max_merged_len: 2,
            ..MergeConfig::default()
        };
        let a = batch_of(&[1, 2]).with_merge_key("k");
        let b = batch_of(&[3]).with_merge_key("k");
        assert!(!a.can_merge(&b, &config));
    }

    #[test]
    fn test_merged_batch_undoes_both() {
        let mut value = 0i64;
        let mut first = batch_of(&[1]).with_merge_key("k");
        first.execute(&mut value).unwrap();

        let mut second = batch_of(&[10]).with_merge_key("k");
        second.execute(&mut value).unwrap();
        assert_eq!(value, 11);

        first.accept_merge(Box::new(second)).unwrap();
        assert_eq!(first.len(), 2);

        first.undo(&mut value).unwrap();
        assert_eq!(value, 0);
        first.redo(&mut value).unwrap();
        assert_eq!(value, 11);
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError::OutOfRange {
            what: "patterns per channel",
            value: 99,
            min: 1,
            max: 64,
        };
        let text = err.to_string();
        assert!(text.contains("patterns per channel"));
        assert!(text.contains("99"));
        assert!(text.contains("1..=64"));
        assert_eq!(CommandError::Other("boom".into()).to_string(), "boom");
    }

    #[test]
    fn test_merge_config_default() {
        let config = MergeConfig::default();
        assert_eq!(config.max_delay, None);
        assert_eq!(config.max_merged_len, 64);
    }

    #[test]
    fn test_debug_implementations() {
        let batch = batch_of(&[1]);
        let debug_str = format!("{:?}", batch);
        assert!(debug_str.contains("CommandBatch"));

        let boxed: Box<dyn UndoableCmd<i64>> = Box::new(batch_of(&[1]));
        let debug_str = format!("{:?}", boxed);
        assert!(debug_str.contains("CommandBatch"));
    }
}
