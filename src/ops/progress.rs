use indexmap::IndexMap;
use serde::Serialize;

use crate::model::column::{ColumnId, Columns};
use crate::model::task::Task;

/// Completed vs total leaves under one identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    /// Completion as a whole percentage (0 when there is nothing to do)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.done * 100) / self.total) as u8
    }
}

/// Aggregate leaf completion for every identity that owns children somewhere
/// on the board. Copies of a parent spread over several columns pool their
/// leaves under the shared identity. A leaf counts as done when it is
/// flagged completed or sits in the `done` column.
///
/// Keys appear in board order of first occurrence.
pub fn progress_map(columns: &Columns) -> IndexMap<String, Progress> {
    let mut map = IndexMap::new();
    for (column, forest) in columns.iter() {
        for task in forest {
            collect(task, column, &mut map);
        }
    }
    map
}

fn collect(task: &Task, column: ColumnId, map: &mut IndexMap<String, Progress>) {
    if task.children.is_empty() {
        return;
    }
    let (done, total) = leaf_tally(&task.children, column);
    let entry = map.entry(task.identity().to_string()).or_default();
    entry.done += done;
    entry.total += total;
    for child in &task.children {
        collect(child, column, map);
    }
}

fn leaf_tally(tasks: &[Task], column: ColumnId) -> (usize, usize) {
    tasks.iter().fold((0, 0), |(done, total), t| {
        if t.children.is_empty() {
            let finished = t.is_completed() || column == ColumnId::Done;
            (done + usize::from(finished), total + 1)
        } else {
            let (d, n) = leaf_tally(&t.children, column);
            (done + d, total + n)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, completed: bool) -> Task {
        let mut t = Task::new(id, id);
        if completed {
            t.completed = Some(true);
        }
        t
    }

    #[test]
    fn pools_copies_across_columns() {
        let mut original = Task::new("t-001", "Feature");
        original.children = vec![leaf("t-002", false), leaf("t-003", true)];

        let mut copy = Task::new("t-010", "Feature");
        copy.source_id = Some("t-001".into());
        copy.children = vec![leaf("t-011", false)];

        let columns = Columns {
            backlog: vec![original],
            done: vec![copy],
            ..Default::default()
        };
        let map = progress_map(&columns);
        // t-003 completed, t-011 in done
        assert_eq!(map["t-001"], Progress { done: 2, total: 3 });
        assert_eq!(map["t-001"].percent(), 66);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn nested_parents_get_their_own_entries() {
        let mut inner = Task::new("t-002", "Inner");
        inner.children = vec![leaf("t-003", true), leaf("t-004", true)];
        let mut outer = Task::new("t-001", "Outer");
        outer.children = vec![inner, leaf("t-005", false)];

        let columns = Columns {
            todo: vec![outer, leaf("t-006", false)],
            ..Default::default()
        };
        let map = progress_map(&columns);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["t-001", "t-002"]);
        assert_eq!(map["t-001"], Progress { done: 2, total: 3 });
        assert_eq!(map["t-002"].percent(), 100);
    }

    #[test]
    fn empty_progress_is_zero_percent() {
        assert_eq!(Progress::default().percent(), 0);
        assert!(progress_map(&Columns::default()).is_empty());
    }
}
