//! Commit a finished drag gesture against a column map.
//!
//! Cycles are refused before anything is built. The WIP limit is checked
//! against the rebuilt `in-progress` column. The result is either a
//! complete new column map or no change at all.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::column::{ColumnId, Columns};
use crate::model::task::Task;
use crate::ops::drag::{self, DragState, DropTarget, InsertPosition};
use crate::ops::identity;
use crate::ops::tree::{self, IdSeq, Placement};
use crate::ops::wip::{self, WipViolation};

/// A released drag, ready to commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRequest {
    pub task_id: String,
    pub state: DragState,
    /// The duplicate/group modifier was held on release
    pub duplicate: bool,
}

/// Where a committed drop put the task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    ColumnTop,
    ColumnBottom,
    Before(String),
    After(String),
    ChildOf(String),
    /// Placed under an equivalent parent in another column
    Grouped { parent_id: String },
    /// The target vanished; appended to the backlog instead
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing actionable; the board is unchanged
    Unchanged,
    Committed {
        columns: Columns,
        /// Id of the placed task (a fresh id when duplicated)
        task_id: String,
        column: ColumnId,
        landing: Landing,
        duplicated: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    #[error(transparent)]
    Wip(#[from] WipViolation),
}

/// Destination after resolving the drop target against the current board
#[derive(Debug, Clone)]
enum Resolved {
    Column(ColumnId),
    Task { column: ColumnId, id: String },
    Fallback,
}

impl Resolved {
    fn column(&self) -> ColumnId {
        match self {
            Resolved::Column(c) => *c,
            Resolved::Task { column, .. } => *column,
            Resolved::Fallback => ColumnId::Backlog,
        }
    }
}

/// Apply a drop to `columns`, enforcing the WIP limit on `in-progress`.
/// Releasing with `DragState::None` leaves the board unchanged.
pub fn apply_drop(
    columns: &Columns,
    request: &DropRequest,
    wip_limit: usize,
) -> Result<DropOutcome, DropError> {
    let task_id = request.task_id.as_str();
    let Some(location) = tree::locate(columns, task_id) else {
        debug!(task_id, "dragged task no longer exists");
        return Ok(DropOutcome::Unchanged);
    };
    let Some(target) = request.state.target() else {
        return Ok(DropOutcome::Unchanged);
    };

    let source_forest = columns.get(location.column);
    let Some(dragged) = tree::find(source_forest, task_id) else {
        return Ok(DropOutcome::Unchanged);
    };
    let parent = location
        .parent_id
        .as_deref()
        .and_then(|pid| tree::find(source_forest, pid));

    let resolved = match target {
        DropTarget::Column(column) => Resolved::Column(*column),
        DropTarget::Task(target_id) => {
            if drag::forms_cycle(columns, task_id, target_id) {
                debug!(
                    task_id,
                    target_id = target_id.as_str(),
                    "drop onto self or descendant ignored"
                );
                return Ok(DropOutcome::Unchanged);
            }
            match tree::find_in_columns(columns, target_id) {
                Some((column, _)) => Resolved::Task {
                    column,
                    id: target_id.clone(),
                },
                None => Resolved::Fallback,
            }
        }
    };
    let dest = resolved.column();

    let grouped_parent = parent.filter(|_| request.duplicate && dest != location.column);
    let duplicating = request.duplicate && (parent.is_none() || grouped_parent.is_some());

    let mut ids = IdSeq::for_columns(columns);
    let (working, incoming) = if duplicating {
        (
            columns.clone(),
            identity::duplicate(dragged, ids.next_id()),
        )
    } else {
        (tree::remove_from_columns(columns, task_id), dragged.clone())
    };

    let enters_in_progress =
        dest == ColumnId::InProgress && (location.column != ColumnId::InProgress || duplicating);
    if enters_in_progress {
        wip::admit(working.get(ColumnId::InProgress), &incoming, wip_limit)
            .map_err(|violation| rejected(task_id, violation))?;
    }

    let placed_id = incoming.id.clone();
    let (next, landing) = match grouped_parent {
        Some(parent) => {
            let (next, parent_id) =
                identity::group_into(&working, dest, parent, incoming, &mut ids);
            (next, Landing::Grouped { parent_id })
        }
        None => place(&working, &request.state, &resolved, incoming),
    };

    // moving inside the column can still turn a parent into a leaf
    wip::admit_rebuilt(
        columns.get(ColumnId::InProgress),
        next.get(ColumnId::InProgress),
        wip_limit,
    )
    .map_err(|violation| rejected(task_id, violation))?;

    let column = if landing == Landing::Fallback {
        ColumnId::Backlog
    } else {
        dest
    };

    info!(
        task_id,
        placed_id = placed_id.as_str(),
        column = column.as_str(),
        duplicated = duplicating,
        "drop committed"
    );
    Ok(DropOutcome::Committed {
        columns: next,
        task_id: placed_id,
        column,
        landing,
        duplicated: duplicating,
    })
}

fn rejected(task_id: &str, violation: WipViolation) -> DropError {
    warn!(
        task_id,
        current = violation.current,
        incoming = violation.incoming,
        limit = violation.limit,
        "drop rejected by WIP limit"
    );
    violation.into()
}

fn place(
    columns: &Columns,
    state: &DragState,
    resolved: &Resolved,
    task: Task,
) -> (Columns, Landing) {
    match resolved {
        Resolved::Fallback => append(columns, ColumnId::Backlog, task, Landing::Fallback),
        Resolved::Column(column) => match state {
            DragState::Insert {
                position: InsertPosition::Top,
                ..
            } => {
                let mut forest = columns.get(*column).to_vec();
                forest.insert(0, task);
                (columns.with_column(*column, forest), Landing::ColumnTop)
            }
            _ => append(columns, *column, task, Landing::ColumnBottom),
        },
        Resolved::Task { column, id } => {
            let (placement, landing) = match state {
                DragState::Insert {
                    position: InsertPosition::Top,
                    ..
                } => (Placement::Before, Landing::Before(id.clone())),
                DragState::Insert {
                    position: InsertPosition::Bottom,
                    ..
                } => (Placement::After, Landing::After(id.clone())),
                DragState::Nest { .. } | DragState::None => {
                    (Placement::Child, Landing::ChildOf(id.clone()))
                }
            };
            match tree::insert_relative(columns.get(*column), id, task.clone(), placement) {
                Some(forest) => (columns.with_column(*column, forest), landing),
                None => append(columns, ColumnId::Backlog, task, Landing::Fallback),
            }
        }
    }
}

fn append(
    columns: &Columns,
    column: ColumnId,
    task: Task,
    landing: Landing,
) -> (Columns, Landing) {
    let mut forest = columns.get(column).to_vec();
    forest.push(task);
    (columns.with_column(column, forest), landing)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str) -> Task {
        Task::new(id, format!("Task {}", id))
    }

    fn with_children(id: &str, children: Vec<Task>) -> Task {
        let mut t = leaf(id);
        t.children = children;
        t
    }

    fn request(task_id: &str, state: DragState, duplicate: bool) -> DropRequest {
        DropRequest {
            task_id: task_id.into(),
            state,
            duplicate,
        }
    }

    fn nest(target: &str) -> DragState {
        DragState::Nest {
            target: DropTarget::Task(target.into()),
        }
    }

    fn insert(position: InsertPosition, target: DropTarget) -> DragState {
        DragState::Insert { position, target }
    }

    fn committed(outcome: DropOutcome) -> (Columns, String, Landing) {
        match outcome {
            DropOutcome::Committed {
                columns,
                task_id,
                landing,
                ..
            } => (columns, task_id, landing),
            DropOutcome::Unchanged => panic!("expected a committed drop"),
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn board() -> Columns {
        Columns {
            backlog: vec![
                with_children("t-001", vec![leaf("t-002"), leaf("t-003")]),
                leaf("t-004"),
            ],
            todo: vec![leaf("t-005")],
            ..Default::default()
        }
    }

    #[test]
    fn drop_on_self_or_descendant_is_noop() {
        let columns = board();
        for target in ["t-001", "t-002", "t-003"] {
            for state in [
                nest(target),
                insert(InsertPosition::Top, DropTarget::Task(target.into())),
                insert(InsertPosition::Bottom, DropTarget::Task(target.into())),
            ] {
                let outcome = apply_drop(&columns, &request("t-001", state, false), 10).unwrap();
                assert_eq!(outcome, DropOutcome::Unchanged);
            }
        }
    }

    #[test]
    fn none_state_is_noop() {
        let columns = board();
        let outcome = apply_drop(&columns, &request("t-004", DragState::None, false), 10).unwrap();
        assert_eq!(outcome, DropOutcome::Unchanged);
    }

    #[test]
    fn insert_at_column_top_and_bottom() {
        let columns = board();
        let top = insert(InsertPosition::Top, DropTarget::Column(ColumnId::Todo));
        let (next, _, landing) = committed(apply_drop(&columns, &request("t-004", top, false), 10).unwrap());
        assert_eq!(ids(&next.todo), vec!["t-004", "t-005"]);
        assert_eq!(ids(&next.backlog), vec!["t-001"]);
        assert_eq!(landing, Landing::ColumnTop);

        let bottom = insert(InsertPosition::Bottom, DropTarget::Column(ColumnId::Todo));
        let (next, _, _) = committed(apply_drop(&columns, &request("t-004", bottom, false), 10).unwrap());
        assert_eq!(ids(&next.todo), vec!["t-005", "t-004"]);
    }

    #[test]
    fn insert_next_to_nested_task() {
        let columns = board();
        let state = insert(InsertPosition::Top, DropTarget::Task("t-003".into()));
        let (next, _, landing) = committed(apply_drop(&columns, &request("t-005", state, false), 10).unwrap());
        assert_eq!(ids(&next.backlog[0].children), vec!["t-002", "t-005", "t-003"]);
        assert!(next.todo.is_empty());
        assert_eq!(landing, Landing::Before("t-003".into()));
    }

    #[test]
    fn nest_reparents_and_expands() {
        let columns = board();
        let (next, _, landing) =
            committed(apply_drop(&columns, &request("t-002", nest("t-004"), false), 10).unwrap());
        assert_eq!(ids(&next.backlog[0].children), vec!["t-003"]);
        assert_eq!(ids(&next.backlog[1].children), vec!["t-002"]);
        assert_eq!(next.backlog[1].is_expanded, Some(true));
        assert_eq!(landing, Landing::ChildOf("t-004".into()));
    }

    #[test]
    fn vanished_target_falls_back_to_backlog_bottom() {
        let columns = board();
        let (next, _, landing) =
            committed(apply_drop(&columns, &request("t-005", nest("t-999"), false), 10).unwrap());
        assert_eq!(ids(&next.backlog), vec!["t-001", "t-004", "t-005"]);
        assert!(next.todo.is_empty());
        assert_eq!(landing, Landing::Fallback);
    }

    #[test]
    fn wip_rejects_fourth_leaf() {
        let columns = Columns {
            todo: vec![leaf("t-010")],
            in_progress: vec![leaf("t-001"), leaf("t-002"), leaf("t-003")],
            ..Default::default()
        };
        let state = insert(InsertPosition::Bottom, DropTarget::Column(ColumnId::InProgress));
        let err = apply_drop(&columns, &request("t-010", state, false), 3).unwrap_err();
        assert!(matches!(err, DropError::Wip(WipViolation { current: 3, incoming: 1, limit: 3 })));
    }

    #[test]
    fn wip_counts_parent_leaves() {
        let columns = Columns {
            todo: vec![with_children("t-010", vec![leaf("t-011"), leaf("t-012")])],
            in_progress: vec![leaf("t-001")],
            ..Default::default()
        };
        let state = insert(InsertPosition::Top, DropTarget::Column(ColumnId::InProgress));
        assert!(apply_drop(&columns, &request("t-010", state.clone(), false), 3).is_err());

        let (next, _, _) = committed(apply_drop(&columns, &request("t-010", state, false), 4).unwrap());
        assert_eq!(tree::count_leaves(&next.in_progress), 3);
        assert!(next.todo.is_empty());
    }

    #[test]
    fn wip_applies_to_task_targets_in_progress() {
        let columns = Columns {
            todo: vec![leaf("t-010")],
            in_progress: vec![leaf("t-001")],
            ..Default::default()
        };
        let err = apply_drop(&columns, &request("t-010", nest("t-001"), false), 1);
        assert!(err.is_err());
    }

    #[test]
    fn reorder_inside_full_in_progress_is_allowed() {
        let columns = Columns {
            in_progress: vec![leaf("t-001"), leaf("t-002"), leaf("t-003")],
            ..Default::default()
        };
        let state = insert(InsertPosition::Top, DropTarget::Column(ColumnId::InProgress));
        let (next, _, _) = committed(apply_drop(&columns, &request("t-003", state, false), 3).unwrap());
        assert_eq!(ids(&next.in_progress), vec!["t-003", "t-001", "t-002"]);
    }

    #[test]
    fn lifting_sole_child_out_of_parent_counts_against_limit() {
        let columns = Columns {
            in_progress: vec![with_children("t-001", vec![leaf("t-002")])],
            ..Default::default()
        };
        let state = insert(InsertPosition::Bottom, DropTarget::Task("t-001".into()));
        let err = apply_drop(&columns, &request("t-002", state.clone(), false), 1).unwrap_err();
        assert!(matches!(err, DropError::Wip(WipViolation { current: 1, incoming: 1, limit: 1 })));

        let (next, _, landing) =
            committed(apply_drop(&columns, &request("t-002", state, false), 2).unwrap());
        assert_eq!(ids(&next.in_progress), vec!["t-001", "t-002"]);
        assert_eq!(landing, Landing::After("t-001".into()));
    }

    #[test]
    fn moving_child_between_parents_in_progress_is_allowed() {
        let columns = Columns {
            in_progress: vec![
                with_children("t-001", vec![leaf("t-002"), leaf("t-003")]),
                with_children("t-004", vec![leaf("t-005")]),
            ],
            ..Default::default()
        };
        let (next, _, _) =
            committed(apply_drop(&columns, &request("t-003", nest("t-004"), false), 3).unwrap());
        assert_eq!(tree::count_leaves(&next.in_progress), 3);
        assert_eq!(ids(&next.in_progress[1].children), vec!["t-005", "t-003"]);
    }

    #[test]
    fn duplicate_top_level_leaves_original() {
        let columns = board();
        let state = insert(InsertPosition::Bottom, DropTarget::Column(ColumnId::Done));
        let outcome = apply_drop(&columns, &request("t-001", state, true), 10).unwrap();
        let DropOutcome::Committed {
            columns: next,
            task_id,
            duplicated,
            ..
        } = outcome
        else {
            panic!("expected commit");
        };
        assert!(duplicated);
        assert_eq!(next.backlog, columns.backlog);
        assert_eq!(next.done.len(), 1);
        assert_eq!(next.done[0].id, task_id);
        assert_eq!(next.done[0].source_id.as_deref(), Some("t-001"));
        assert!(next.done[0].children.is_empty());
    }

    #[test]
    fn grouped_duplicate_creates_then_reuses_parent() {
        let columns = board();
        let to_todo = insert(InsertPosition::Bottom, DropTarget::Column(ColumnId::Todo));

        let (first, _, landing) =
            committed(apply_drop(&columns, &request("t-002", to_todo.clone(), true), 10).unwrap());
        assert_eq!(first.backlog, columns.backlog);
        assert_eq!(first.todo.len(), 2);
        let group = &first.todo[1];
        assert_eq!(group.source_id.as_deref(), Some("t-001"));
        assert_eq!(group.children.len(), 1);
        assert_eq!(group.children[0].source_id.as_deref(), Some("t-002"));
        assert_eq!(landing, Landing::Grouped { parent_id: group.id.clone() });

        let (second, _, _) =
            committed(apply_drop(&first, &request("t-003", to_todo, true), 10).unwrap());
        assert_eq!(second.todo.len(), 2);
        assert_eq!(second.todo[1].children.len(), 2);
        assert_eq!(second.todo[1].children[1].source_id.as_deref(), Some("t-003"));
    }

    #[test]
    fn grouping_takes_precedence_over_task_target() {
        let columns = board();
        let (next, _, landing) =
            committed(apply_drop(&columns, &request("t-002", nest("t-005"), true), 10).unwrap());
        assert!(next.todo[0].children.is_empty());
        assert!(matches!(landing, Landing::Grouped { .. }));
    }

    #[test]
    fn modifier_within_same_column_moves() {
        let columns = board();
        let state = insert(InsertPosition::Bottom, DropTarget::Column(ColumnId::Backlog));
        let (next, placed, _) = committed(apply_drop(&columns, &request("t-002", state, true), 10).unwrap());
        assert_eq!(placed, "t-002");
        assert_eq!(ids(&next.backlog), vec!["t-001", "t-004", "t-002"]);
        assert_eq!(ids(&next.backlog[0].children), vec!["t-003"]);
    }
}
