#![forbid(unsafe_code)]

//! Property tests for [`HistoryManager`] invariants.
//!
//! Validates:
//! - Random push/undo/redo sequences keep the target in sync with a model.
//! - Depth limits are never exceeded.
//! - Memory accounting matches the sum of stored command sizes.
//! - A batch that fails midway leaves the target untouched.

use std::any::Any;

use proptest::prelude::*;

use tonebox_runtime::undo::{
    CommandBatch, CommandError, CommandMetadata, CommandResult, HistoryConfig, HistoryManager,
    UndoableCmd,
};

// ============================================================================
// Strategy helpers
// ============================================================================

/// Sets a slot of the target vector, remembering the old value.
struct SetSlot {
    index: usize,
    value: i32,
    old: Option<i32>,
    metadata: CommandMetadata,
}

impl SetSlot {
    fn new(index: usize, value: i32) -> Self {
        Self {
            index,
            value,
            old: None,
            metadata: CommandMetadata::new("Set slot"),
        }
    }
}

impl UndoableCmd<Vec<i32>> for SetSlot {
    fn execute(&mut self, target: &mut Vec<i32>) -> CommandResult {
        let Some(slot) = target.get_mut(self.index) else {
            return Err(CommandError::InvalidState(format!(
                "slot {} missing",
                self.index
            )));
        };
        self.old = Some(*slot);
        *slot = self.value;
        Ok(())
    }

    fn undo(&mut self, target: &mut Vec<i32>) -> CommandResult {
        if let (Some(old), Some(slot)) = (self.old, target.get_mut(self.index)) {
            *slot = old;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.metadata.size_bytes()
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

const SLOTS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Push(Vec<(usize, i32)>),
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop::collection::vec((0..SLOTS, any::<i32>()), 1..4).prop_map(Op::Push),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

fn executed_batch(target: &mut Vec<i32>, edits: &[(usize, i32)]) -> Box<dyn UndoableCmd<Vec<i32>>> {
    let mut batch = CommandBatch::new("Edit");
    for &(index, value) in edits {
        batch.push(Box::new(SetSlot::new(index, value)));
    }
    batch.execute(target).expect("in-range edits execute");
    Box::new(batch)
}

// ============================================================================
// Invariant 1: Target tracks a snapshot model
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn history_matches_snapshot_model(ops in ops_strategy(60)) {
        let mut target = vec![0; SLOTS];
        let mut mgr = HistoryManager::new(HistoryConfig::unlimited());
        let mut undo_model: Vec<Vec<i32>> = Vec::new();
        let mut redo_model: Vec<Vec<i32>> = Vec::new();

        for op in ops {
            match op {
                Op::Push(edits) => {
                    undo_model.push(target.clone());
                    redo_model.clear();
                    let cmd = executed_batch(&mut target, &edits);
                    mgr.push(cmd);
                }
                Op::Undo => {
                    let before = target.clone();
                    let result = mgr.undo(&mut target);
                    match undo_model.pop() {
                        Some(expected) => {
                            prop_assert!(matches!(result, Some(Ok(_))));
                            redo_model.push(before);
                            prop_assert_eq!(&target, &expected);
                        }
                        None => prop_assert!(result.is_none()),
                    }
                }
                Op::Redo => {
                    let before = target.clone();
                    let result = mgr.redo(&mut target);
                    match redo_model.pop() {
                        Some(expected) => {
                            prop_assert!(matches!(result, Some(Ok(_))));
                            prop_assert_eq!(&target, &expected);
                            undo_model.push(before);
                        }
                        None => prop_assert!(result.is_none()),
                    }
                }
            }
            prop_assert_eq!(mgr.undo_depth(), undo_model.len());
            prop_assert_eq!(mgr.redo_depth(), redo_model.len());
        }
    }
}

// ============================================================================
// Invariant 2: Depth limit is never exceeded
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn depth_limit_never_exceeded(
        max_depth in 1usize..10,
        ops in ops_strategy(80),
    ) {
        let mut target = vec![0; SLOTS];
        let mut mgr = HistoryManager::new(HistoryConfig::new(max_depth, 0));

        for op in ops {
            match op {
                Op::Push(edits) => {
                    let cmd = executed_batch(&mut target, &edits);
                    mgr.push(cmd);
                }
                Op::Undo => {
                    mgr.undo(&mut target);
                }
                Op::Redo => {
                    mgr.redo(&mut target);
                }
            }
            prop_assert!(mgr.undo_depth() <= max_depth);
        }
    }
}

// ============================================================================
// Invariant 3: Memory accounting is exact
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn memory_usage_is_sum_of_sizes(ops in ops_strategy(60)) {
        let mut target = vec![0; SLOTS];
        let mut mgr = HistoryManager::new(HistoryConfig::unlimited());
        let mut model_bytes = 0usize;
        let mut undo_sizes: Vec<usize> = Vec::new();
        let mut redo_sizes: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Push(edits) => {
                    let cmd = executed_batch(&mut target, &edits);
                    for size in redo_sizes.drain(..) {
                        model_bytes -= size;
                    }
                    let size = cmd.size_bytes();
                    model_bytes += size;
                    undo_sizes.push(size);
                    mgr.push(cmd);
                }
                Op::Undo => {
                    if mgr.undo(&mut target).is_some() {
                        if let Some(size) = undo_sizes.pop() {
                            redo_sizes.push(size);
                        }
                    }
                }
                Op::Redo => {
                    if mgr.redo(&mut target).is_some() {
                        if let Some(size) = redo_sizes.pop() {
                            undo_sizes.push(size);
                        }
                    }
                }
            }
            prop_assert_eq!(mgr.memory_usage(), model_bytes);
        }
    }
}

// ============================================================================
// Invariant 4: Failing batches are all-or-nothing
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn failing_batch_leaves_target_untouched(
        initial in prop::collection::vec(any::<i32>(), SLOTS),
        good in prop::collection::vec((0..SLOTS, any::<i32>()), 0..5),
    ) {
        let mut target = initial.clone();
        let mut batch: CommandBatch<Vec<i32>> = CommandBatch::new("Edit");
        for &(index, value) in &good {
            batch.push(Box::new(SetSlot::new(index, value)));
        }
        batch.push(Box::new(SetSlot::new(SLOTS + 1, 0)));

        prop_assert!(batch.execute(&mut target).is_err());
        prop_assert_eq!(target, initial);
    }
}
