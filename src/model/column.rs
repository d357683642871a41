use serde::{Deserialize, Serialize};

use super::task::Task;

/// One of the four fixed board columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnId {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl ColumnId {
    /// All columns in board order
    pub const ALL: [ColumnId; 4] = [
        ColumnId::Backlog,
        ColumnId::Todo,
        ColumnId::InProgress,
        ColumnId::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnId::Backlog => "backlog",
            ColumnId::Todo => "todo",
            ColumnId::InProgress => "in-progress",
            ColumnId::Done => "done",
        }
    }

    /// Human-readable column title
    pub fn title(self) -> &'static str {
        match self {
            ColumnId::Backlog => "Backlog",
            ColumnId::Todo => "To Do",
            ColumnId::InProgress => "In Progress",
            ColumnId::Done => "Done",
        }
    }

    /// Parse a column id. Accepts `in_progress` and `doing` as aliases.
    pub fn parse(s: &str) -> Option<ColumnId> {
        match s {
            "backlog" => Some(ColumnId::Backlog),
            "todo" => Some(ColumnId::Todo),
            "in-progress" | "in_progress" | "doing" => Some(ColumnId::InProgress),
            "done" => Some(ColumnId::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ColumnId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnId::parse(s).ok_or_else(|| format!("unknown column: {}", s))
    }
}

/// The per-project column map: one ordered task forest per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    #[serde(default)]
    pub backlog: Vec<Task>,
    #[serde(default)]
    pub todo: Vec<Task>,
    #[serde(default, rename = "in-progress")]
    pub in_progress: Vec<Task>,
    #[serde(default)]
    pub done: Vec<Task>,
}

impl Columns {
    /// Top-level tasks of a column
    pub fn get(&self, column: ColumnId) -> &[Task] {
        match column {
            ColumnId::Backlog => &self.backlog,
            ColumnId::Todo => &self.todo,
            ColumnId::InProgress => &self.in_progress,
            ColumnId::Done => &self.done,
        }
    }

    pub fn get_mut(&mut self, column: ColumnId) -> &mut Vec<Task> {
        match column {
            ColumnId::Backlog => &mut self.backlog,
            ColumnId::Todo => &mut self.todo,
            ColumnId::InProgress => &mut self.in_progress,
            ColumnId::Done => &mut self.done,
        }
    }

    /// Iterate columns in board order
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &[Task])> {
        ColumnId::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Copy of this map with one column replaced
    pub fn with_column(&self, column: ColumnId, tasks: Vec<Task>) -> Columns {
        let mut next = self.clone();
        *next.get_mut(column) = tasks;
        next
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, tasks)| tasks.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for column in ColumnId::ALL {
            assert_eq!(ColumnId::parse(column.as_str()), Some(column));
            assert_eq!(column.to_string(), column.as_str());
        }
        assert_eq!(ColumnId::parse("doing"), Some(ColumnId::InProgress));
        assert_eq!(ColumnId::parse("later"), None);
    }

    #[test]
    fn in_progress_uses_kebab_case_key() {
        let mut columns = Columns::default();
        columns.in_progress.push(Task::new("t-001", "Work"));
        let json = serde_json::to_value(&columns).unwrap();
        assert_eq!(json["in-progress"][0]["id"], "t-001");
        assert_eq!(
            serde_json::to_value(ColumnId::InProgress).unwrap(),
            "in-progress"
        );
    }

    #[test]
    fn with_column_leaves_original_untouched() {
        let columns = Columns::default();
        let next = columns.with_column(ColumnId::Todo, vec![Task::new("t-001", "A")]);
        assert!(columns.is_empty());
        assert_eq!(next.get(ColumnId::Todo).len(), 1);
    }
}
