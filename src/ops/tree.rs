//! Pure helpers over a task forest.
//!
//! Every function that changes a forest takes it by reference and returns a
//! rebuilt copy: the nodes along the path to the change are rebuilt and
//! everything else is cloned unchanged. Callers commit the result as a whole.

use crate::model::column::{ColumnId, Columns};
use crate::model::task::Task;

/// Where a task lives inside a column map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLocation {
    pub column: ColumnId,
    /// Immediate parent, `None` for top-level tasks
    pub parent_id: Option<String>,
    /// Index within the parent's children (or the column)
    pub sibling_index: usize,
    /// Nesting depth (0 = top-level)
    pub depth: usize,
}

/// Where to put a task relative to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
    /// Last child of the target
    Child,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Depth-first search; a node's children are searched before its later siblings.
pub fn find<'a>(forest: &'a [Task], id: &str) -> Option<&'a Task> {
    for task in forest {
        if task.id == id {
            return Some(task);
        }
        if let Some(t) = find(&task.children, id) {
            return Some(t);
        }
    }
    None
}

fn find_mut<'a>(forest: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    for task in forest.iter_mut() {
        if task.id == id {
            return Some(task);
        }
        if let Some(t) = find_mut(&mut task.children, id) {
            return Some(t);
        }
    }
    None
}

/// Find a task anywhere on the board, returning its column too.
pub fn find_in_columns<'a>(columns: &'a Columns, id: &str) -> Option<(ColumnId, &'a Task)> {
    columns
        .iter()
        .find_map(|(column, forest)| find(forest, id).map(|t| (column, t)))
}

/// The immediate parent of `id`, if it is nested.
pub fn find_parent<'a>(forest: &'a [Task], id: &str) -> Option<&'a Task> {
    for task in forest {
        if task.children.iter().any(|c| c.id == id) {
            return Some(task);
        }
        if let Some(p) = find_parent(&task.children, id) {
            return Some(p);
        }
    }
    None
}

/// Locate a task on the board: column, parent, sibling index and depth.
pub fn locate(columns: &Columns, id: &str) -> Option<TaskLocation> {
    for (column, forest) in columns.iter() {
        if let Some((parent_id, sibling_index, depth)) = locate_in_list(forest, id, None, 0) {
            return Some(TaskLocation {
                column,
                parent_id,
                sibling_index,
                depth,
            });
        }
    }
    None
}

fn locate_in_list(
    tasks: &[Task],
    id: &str,
    parent_id: Option<&str>,
    depth: usize,
) -> Option<(Option<String>, usize, usize)> {
    for (i, task) in tasks.iter().enumerate() {
        if task.id == id {
            return Some((parent_id.map(str::to_string), i, depth));
        }
        if let Some(found) = locate_in_list(&task.children, id, Some(&task.id), depth + 1) {
            return Some(found);
        }
    }
    None
}

/// True iff `candidate_id` is somewhere below `ancestor_id`. A task is not
/// its own descendant.
pub fn is_descendant(forest: &[Task], ancestor_id: &str, candidate_id: &str) -> bool {
    match find(forest, ancestor_id) {
        Some(ancestor) => find(&ancestor.children, candidate_id).is_some(),
        None => false,
    }
}

/// `is_descendant` across every column of a board.
pub fn is_descendant_in_columns(columns: &Columns, ancestor_id: &str, candidate_id: &str) -> bool {
    match find_in_columns(columns, ancestor_id) {
        Some((_, ancestor)) => find(&ancestor.children, candidate_id).is_some(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// Count undecomposed work: a node with children contributes the sum of its
/// children's leaves, never itself.
pub fn count_leaves(forest: &[Task]) -> usize {
    forest
        .iter()
        .map(|t| {
            if t.children.is_empty() {
                1
            } else {
                count_leaves(&t.children)
            }
        })
        .sum()
}

/// Total number of nodes at every depth.
pub fn count_nodes(forest: &[Task]) -> usize {
    forest.iter().map(|t| 1 + count_nodes(&t.children)).sum()
}

/// Visit every task depth-first, parents before children.
pub fn for_each_task(tasks: &[Task], f: &mut dyn FnMut(&Task)) {
    for task in tasks {
        f(task);
        for_each_task(&task.children, f);
    }
}

// ---------------------------------------------------------------------------
// Copy-on-write rebuilds
// ---------------------------------------------------------------------------

/// Return a new forest with `id` (and its subtree) excised.
pub fn remove(forest: &[Task], id: &str) -> Vec<Task> {
    forest
        .iter()
        .filter(|t| t.id != id)
        .map(|t| {
            if find(&t.children, id).is_some() {
                Task {
                    children: remove(&t.children, id),
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect()
}

/// `remove` applied to whichever column holds `id`.
pub fn remove_from_columns(columns: &Columns, id: &str) -> Columns {
    match find_in_columns(columns, id) {
        Some((column, _)) => columns.with_column(column, remove(columns.get(column), id)),
        None => columns.clone(),
    }
}

/// Rebuild the forest with `f` applied to the task `id`. Returns `None` when
/// the task is not present.
pub fn update(forest: &[Task], id: &str, f: impl FnOnce(&mut Task)) -> Option<Vec<Task>> {
    let mut next = forest.to_vec();
    let task = find_mut(&mut next, id)?;
    f(task);
    Some(next)
}

/// `update` applied to whichever column holds `id`.
pub fn update_in_columns(columns: &Columns, id: &str, f: impl FnOnce(&mut Task)) -> Option<Columns> {
    let (column, _) = find_in_columns(columns, id)?;
    let forest = update(columns.get(column), id, f)?;
    Some(columns.with_column(column, forest))
}

/// Rebuild the forest with `task` placed relative to `target_id`. `Child`
/// appends to the target's children and expands it. Returns `None` when the
/// target is not present.
pub fn insert_relative(
    forest: &[Task],
    target_id: &str,
    task: Task,
    placement: Placement,
) -> Option<Vec<Task>> {
    let mut next = forest.to_vec();
    if insert_relative_in(&mut next, target_id, task, placement) {
        Some(next)
    } else {
        None
    }
}

fn insert_relative_in(
    tasks: &mut Vec<Task>,
    target_id: &str,
    task: Task,
    placement: Placement,
) -> bool {
    if let Some(idx) = tasks.iter().position(|t| t.id == target_id) {
        match placement {
            Placement::Before => tasks.insert(idx, task),
            Placement::After => tasks.insert(idx + 1, task),
            Placement::Child => {
                let target = &mut tasks[idx];
                target.children.push(task);
                target.is_expanded = Some(true);
            }
        }
        return true;
    }
    // Recurse into the one subtree that holds the target
    match tasks
        .iter()
        .position(|t| find(&t.children, target_id).is_some())
    {
        Some(idx) => insert_relative_in(&mut tasks[idx].children, target_id, task, placement),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Id allocation
// ---------------------------------------------------------------------------

/// Sequential id allocator for one project. Ids look like `t-014`; the
/// sequence starts after the highest number already in use.
#[derive(Debug, Clone)]
pub struct IdSeq {
    prefix: String,
    next: usize,
}

impl IdSeq {
    pub const TASK_PREFIX: &'static str = "t";

    /// Allocator positioned after every task id on the board
    pub fn for_columns(columns: &Columns) -> IdSeq {
        let prefix_dash = format!("{}-", Self::TASK_PREFIX);
        let mut max = 0usize;
        for (_, forest) in columns.iter() {
            for_each_task(forest, &mut |task: &Task| {
                bump_max(&task.id, &prefix_dash, &mut max);
                if let Some(source) = &task.source_id {
                    bump_max(source, &prefix_dash, &mut max);
                }
            });
        }
        IdSeq {
            prefix: Self::TASK_PREFIX.to_string(),
            next: max + 1,
        }
    }

    /// Allocator over an arbitrary set of existing ids
    pub fn with_prefix<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> IdSeq {
        let prefix_dash = format!("{}-", prefix);
        let mut max = 0usize;
        for id in existing {
            bump_max(id, &prefix_dash, &mut max);
        }
        IdSeq {
            prefix: prefix.to_string(),
            next: max + 1,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{}-{:03}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

fn bump_max(id: &str, prefix_dash: &str, max: &mut usize) {
    if let Some(n) = id
        .strip_prefix(prefix_dash)
        .and_then(|num| num.parse::<usize>().ok())
        && n > *max
    {
        *max = n;
    }
}

/// Deep copy of `task` where every node gets a fresh id.
pub fn clone_with_fresh_ids(task: &Task, ids: &mut IdSeq) -> Task {
    let mut copy = task.shallow_copy(ids.next_id());
    copy.children = task
        .children
        .iter()
        .map(|c| clone_with_fresh_ids(c, ids))
        .collect();
    copy
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
