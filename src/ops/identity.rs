//! Duplicate-and-group: copying a task into another column while keeping
//! its parent context, linked by identity rather than by reference.
//!
//! A task's identity is its `source_id` when it has one, otherwise its own
//! id. Tasks sharing an identity are "the same task in different places".

use crate::model::column::{ColumnId, Columns};
use crate::model::task::Task;
use crate::ops::tree::{self, IdSeq, Placement};

/// How a grouped drop lands in the destination column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    /// An equivalent parent already exists there; append to its children
    Existing { parent_id: String },
    /// No equivalent parent; append a fresh parent copy to the column
    NewParent,
}

/// Duplicate a task under a new id. The copy keeps the scalar fields, has no
/// children, and points back at the original's identity.
pub fn duplicate(task: &Task, new_id: String) -> Task {
    let mut copy = task.shallow_copy(new_id);
    copy.source_id = Some(task.identity().to_string());
    copy
}

/// Find a task in `forest` (depth-first) that shares `identity`.
pub fn find_matching<'a>(forest: &'a [Task], identity: &str) -> Option<&'a Task> {
    for task in forest {
        if task.id == identity || task.source_id.as_deref() == Some(identity) {
            return Some(task);
        }
        if let Some(t) = find_matching(&task.children, identity) {
            return Some(t);
        }
    }
    None
}

/// Decide where a task pulled out of `source_parent` should go in `target`.
pub fn resolve(columns: &Columns, target: ColumnId, source_parent: &Task) -> Grouping {
    match find_matching(columns.get(target), source_parent.identity()) {
        Some(matching) => Grouping::Existing {
            parent_id: matching.id.clone(),
        },
        None => Grouping::NewParent,
    }
}

/// Place `task` into `target` under a parent equivalent to `source_parent`,
/// reusing one that already exists there or synthesizing a copy. Returns the
/// rebuilt column map and the id of the parent that received the task.
pub fn group_into(
    columns: &Columns,
    target: ColumnId,
    source_parent: &Task,
    task: Task,
    ids: &mut IdSeq,
) -> (Columns, String) {
    match resolve(columns, target, source_parent) {
        Grouping::Existing { parent_id } => {
            let forest = tree::insert_relative(
                columns.get(target),
                &parent_id,
                task.clone(),
                Placement::Child,
            );
            match forest {
                Some(forest) => (columns.with_column(target, forest), parent_id),
                // resolve() found it in this very forest; unreachable in practice
                None => append_parent_copy(columns, target, source_parent, task, ids),
            }
        }
        Grouping::NewParent => append_parent_copy(columns, target, source_parent, task, ids),
    }
}

fn append_parent_copy(
    columns: &Columns,
    target: ColumnId,
    source_parent: &Task,
    task: Task,
    ids: &mut IdSeq,
) -> (Columns, String) {
    let mut parent = duplicate(source_parent, ids.next_id());
    parent.is_expanded = Some(true);
    parent.children.push(task);
    let parent_id = parent.id.clone();

    let mut forest = columns.get(target).to_vec();
    forest.push(parent);
    (columns.with_column(target, forest), parent_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Columns {
        let mut a = Task::new("t-001", "A");
        a.children.push(Task::new("t-002", "B"));
        a.children.push(Task::new("t-003", "C"));
        Columns {
            backlog: vec![a],
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_links_to_identity() {
        let original = Task::new("t-001", "A");
        let copy = duplicate(&original, "t-009".into());
        assert_eq!(copy.id, "t-009");
        assert_eq!(copy.source_id.as_deref(), Some("t-001"));
        assert_eq!(copy.content, "A");

        // a duplicate of a duplicate points at the root identity
        let second = duplicate(&copy, "t-010".into());
        assert_eq!(second.source_id.as_deref(), Some("t-001"));
    }

    #[test]
    fn find_matching_by_id_or_source() {
        let mut copy = Task::new("t-100", "A copy");
        copy.source_id = Some("t-001".into());
        let forest = vec![Task::new("t-050", "other"), copy];
        assert_eq!(find_matching(&forest, "t-001").unwrap().id, "t-100");
        assert_eq!(find_matching(&forest, "t-050").unwrap().id, "t-050");
        assert!(find_matching(&forest, "t-999").is_none());
    }

    #[test]
    fn first_group_synthesizes_parent_then_reuses_it() {
        let columns = board();
        let parent = columns.backlog[0].clone();
        let mut ids = IdSeq::for_columns(&columns);

        let b = duplicate(&parent.children[0], ids.next_id());
        let (columns, first_parent) = group_into(&columns, ColumnId::Todo, &parent, b, &mut ids);
        assert_eq!(columns.todo.len(), 1);
        assert_eq!(columns.todo[0].id, first_parent);
        assert_eq!(columns.todo[0].source_id.as_deref(), Some("t-001"));
        assert_eq!(columns.todo[0].children.len(), 1);

        let c = duplicate(&parent.children[1], ids.next_id());
        let (columns, second_parent) = group_into(&columns, ColumnId::Todo, &parent, c, &mut ids);
        assert_eq!(second_parent, first_parent);
        assert_eq!(columns.todo.len(), 1);
        assert_eq!(columns.todo[0].children.len(), 2);
        assert_eq!(columns.todo[0].is_expanded, Some(true));
    }

    #[test]
    fn resolve_matches_original_parent_by_own_id() {
        let mut columns = board();
        columns.todo.push(Task::new("t-001-alias", "unrelated"));
        let parent = columns.backlog[0].clone();
        assert_eq!(resolve(&columns, ColumnId::Todo, &parent), Grouping::NewParent);
        assert_eq!(
            resolve(&columns, ColumnId::Backlog, &parent),
            Grouping::Existing {
                parent_id: "t-001".into()
            }
        );
    }
}
