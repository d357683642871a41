use crate::model::task::Task;
use crate::ops::tree::count_leaves;

/// A move into `in-progress` that would push its leaf count past the limit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("WIP limit reached: {current} in progress + {incoming} incoming > limit {limit}")]
pub struct WipViolation {
    pub current: usize,
    pub incoming: usize,
    pub limit: usize,
}

/// How many leaves a task adds to a column: 1 for a leaf, otherwise the
/// leaves of its subtree.
pub fn incoming_contribution(task: &Task) -> usize {
    if task.children.is_empty() {
        1
    } else {
        count_leaves(&task.children)
    }
}

/// Admission check for moving or duplicating `incoming` into an
/// `in-progress` column currently holding `in_progress`.
pub fn admit(in_progress: &[Task], incoming: &Task, limit: usize) -> Result<(), WipViolation> {
    let current = count_leaves(in_progress);
    let incoming = incoming_contribution(incoming);
    if current + incoming > limit {
        return Err(WipViolation {
            current,
            incoming,
            limit,
        });
    }
    Ok(())
}

/// Admission check for an `in-progress` forest rebuilt by a move, drop or
/// insert. Lifting a sole child out of its parent turns the parent into a
/// leaf, so the rebuilt forest is counted rather than the moved task.
/// A change that does not raise the leaf count always passes.
pub fn admit_rebuilt(before: &[Task], after: &[Task], limit: usize) -> Result<(), WipViolation> {
    let current = count_leaves(before);
    let next = count_leaves(after);
    if next > current && next > limit {
        return Err(WipViolation {
            current,
            incoming: next - current,
            limit,
        });
    }
    Ok(())
}
