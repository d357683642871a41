use indexmap::IndexMap;
use serde::Serialize;

use crate::model::column::ColumnId;
use crate::model::project::Project;
use crate::model::task::{Priority, Task};
use crate::ops::drop::{DropOutcome, Landing};
use crate::ops::progress::Progress;
use crate::ops::search::SearchHit;
use crate::ops::tree;
use crate::util::unicode::{fit_to_width, pad_to_width};

/// Widest task text shown on one line
pub const CONTENT_WIDTH: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub content: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ColumnJson {
    pub column: ColumnId,
    pub leaves: usize,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub project_id: String,
    pub name: String,
    pub wip_limit: usize,
    pub columns: Vec<ColumnJson>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: String,
    pub wip_limit: usize,
    pub active: bool,
    pub tasks: usize,
}

#[derive(Serialize)]
pub struct ProgressJson {
    pub identity: String,
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub column: ColumnId,
    pub task_id: String,
    pub path: Vec<String>,
    pub content: String,
}

#[derive(Serialize)]
pub struct DropJson {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing: Option<String>,
    pub duplicated: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        source_id: task.source_id.clone(),
        content: task.content.clone(),
        completed: task.is_completed(),
        priority: task.priority.filter(|p| *p != Priority::None),
        children: task.children.iter().map(task_to_json).collect(),
    }
}

pub fn board_to_json(project: &Project) -> BoardJson {
    BoardJson {
        project_id: project.id.clone(),
        name: project.name.clone(),
        wip_limit: project.wip_limit,
        columns: project
            .columns
            .iter()
            .map(|(column, tasks)| ColumnJson {
                column,
                leaves: tree::count_leaves(tasks),
                tasks: tasks.iter().map(task_to_json).collect(),
            })
            .collect(),
    }
}

pub fn project_to_json(project: &Project, active: bool) -> ProjectJson {
    ProjectJson {
        id: project.id.clone(),
        name: project.name.clone(),
        description: project.description.clone(),
        status: status_str(project).to_string(),
        wip_limit: project.wip_limit,
        active,
        tasks: task_count(project),
    }
}

pub fn progress_to_json(progress: &IndexMap<String, Progress>) -> Vec<ProgressJson> {
    progress
        .iter()
        .map(|(identity, p)| ProgressJson {
            identity: identity.clone(),
            done: p.done,
            total: p.total,
            percent: p.percent(),
        })
        .collect()
}

pub fn search_hit_to_json(hit: &SearchHit, project: &Project) -> SearchHitJson {
    let content = tree::find(project.columns.get(hit.column), &hit.task_id)
        .map(|t| t.content.clone())
        .unwrap_or_default();
    SearchHitJson {
        column: hit.column,
        task_id: hit.task_id.clone(),
        path: hit.path.clone(),
        content,
    }
}

pub fn drop_to_json(outcome: &DropOutcome) -> DropJson {
    match outcome {
        DropOutcome::Unchanged => DropJson {
            changed: false,
            task_id: None,
            column: None,
            landing: None,
            duplicated: false,
        },
        DropOutcome::Committed {
            task_id,
            column,
            landing,
            duplicated,
            ..
        } => DropJson {
            changed: true,
            task_id: Some(task_id.clone()),
            column: Some(*column),
            landing: Some(format_landing(landing)),
            duplicated: *duplicated,
        },
    }
}

fn status_str(project: &Project) -> &'static str {
    project.status.map(|s| s.as_str()).unwrap_or("-")
}

fn task_count(project: &Project) -> usize {
    project
        .columns
        .iter()
        .map(|(_, tasks)| tree::count_nodes(tasks))
        .sum()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One task as `[x] id content !!! (done/total)`
pub fn format_task_line(task: &Task, progress: &IndexMap<String, Progress>) -> String {
    let check = if task.is_completed() { 'x' } else { ' ' };
    let mut line = format!(
        "[{}] {} {}",
        check,
        task.id,
        fit_to_width(&task.content, CONTENT_WIDTH)
    );
    let marker = task.priority.map(|p| p.marker()).unwrap_or("");
    if !marker.is_empty() {
        line.push(' ');
        line.push_str(marker);
    }
    if !task.children.is_empty()
        && let Some(p) = progress.get(task.identity())
    {
        line.push_str(&format!(" ({}/{})", p.done, p.total));
    }
    line
}

/// A task and its subtasks, two spaces per level
pub fn format_task_tree(
    task: &Task,
    indent: usize,
    progress: &IndexMap<String, Progress>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{}{}",
        "  ".repeat(indent),
        format_task_line(task, progress)
    )];
    for child in &task.children {
        lines.extend(format_task_tree(child, indent + 1, progress));
    }
    lines
}

fn format_column_header(project: &Project, column: ColumnId) -> String {
    let leaves = tree::count_leaves(project.columns.get(column));
    if column == ColumnId::InProgress {
        format!("== {} [{}/{}] ==", column.title(), leaves, project.wip_limit)
    } else {
        format!("== {} [{}] ==", column.title(), leaves)
    }
}

/// The whole board, one column after another
pub fn format_board(project: &Project, progress: &IndexMap<String, Progress>) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", project.name, project.id)];
    if !project.description.is_empty() {
        lines.push(project.description.clone());
    }
    for (column, tasks) in project.columns.iter() {
        lines.push(String::new());
        lines.push(format_column_header(project, column));
        if tasks.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for task in tasks {
            lines.extend(format_task_tree(task, 0, progress));
        }
    }
    lines
}

/// One row of `tb project list`
pub fn format_project_line(project: &Project, active: bool) -> String {
    let marker = if active { '*' } else { ' ' };
    format!(
        "{} {} {} {:<9} wip {}  {} tasks",
        marker,
        project.id,
        pad_to_width(&project.name, 24),
        status_str(project),
        project.wip_limit,
        task_count(project)
    )
}

pub fn format_landing(landing: &Landing) -> String {
    match landing {
        Landing::ColumnTop => "top of column".to_string(),
        Landing::ColumnBottom => "bottom of column".to_string(),
        Landing::Before(id) => format!("before {}", id),
        Landing::After(id) => format!("after {}", id),
        Landing::ChildOf(id) => format!("under {}", id),
        Landing::Grouped { parent_id } => format!("grouped under {}", parent_id),
        Landing::Fallback => "backlog (target vanished)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::progress::progress_map;
    use insta::assert_snapshot;

    fn project() -> Project {
        let mut project = Project::new("p-001", "Demo", 3);
        let mut parent = Task::new("t-001", "Parent");
        let mut one = Task::new("t-002", "Child one");
        one.completed = Some(true);
        parent.children = vec![one, Task::new("t-003", "Child two")];
        project.columns.backlog.push(parent);

        let mut work = Task::new("t-004", "Work");
        work.priority = Some(Priority::High);
        project.columns.in_progress.push(work);
        project
    }

    #[test]
    fn board_rendering() {
        let project = project();
        let progress = progress_map(&project.columns);
        let output = format_board(&project, &progress).join("\n");
        assert_snapshot!(output, @r"
Demo (p-001)

== Backlog [2] ==
[ ] t-001 Parent (1/2)
  [x] t-002 Child one
  [ ] t-003 Child two

== To Do [0] ==
  (empty)

== In Progress [1/3] ==
[ ] t-004 Work !!!

== Done [0] ==
  (empty)
");
    }

    #[test]
    fn long_content_is_truncated() {
        let task = Task::new("t-001", "x".repeat(100));
        let line = format_task_line(&task, &IndexMap::new());
        assert!(line.ends_with('\u{2026}'));
        assert_eq!(line.chars().count(), "[ ] t-001 ".len() + CONTENT_WIDTH);
    }

    #[test]
    fn project_json_counts_nested_tasks() {
        let json = project_to_json(&project(), true);
        assert_eq!(json.tasks, 4);
        assert_eq!(json.status, "-");
    }

    #[test]
    fn unchanged_drop_json() {
        let json = drop_to_json(&DropOutcome::Unchanged);
        assert!(!json.changed);
        assert!(json.landing.is_none());
    }
}
