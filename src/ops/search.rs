use std::ops::Range;

use regex::Regex;

use crate::model::column::ColumnId;
use crate::model::project::Project;
use crate::model::task::Task;

/// A task whose content matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub column: ColumnId,
    pub task_id: String,
    /// Ids of the enclosing tasks, outermost first
    pub path: Vec<String>,
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search task content across every column of a project, optionally limited
/// to one column. Hits come back in board order.
pub fn search_tasks(
    project: &Project,
    re: &Regex,
    column_filter: Option<ColumnId>,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for (column, forest) in project.columns.iter() {
        if column_filter.is_some_and(|c| c != column) {
            continue;
        }
        let mut path = Vec::new();
        search_list(forest, re, column, &mut path, &mut hits);
    }
    hits
}

fn search_list(
    tasks: &[Task],
    re: &Regex,
    column: ColumnId,
    path: &mut Vec<String>,
    hits: &mut Vec<SearchHit>,
) {
    for task in tasks {
        let spans = find_matches(re, &task.content);
        if !spans.is_empty() {
            hits.push(SearchHit {
                column,
                task_id: task.id.clone(),
                path: path.clone(),
                spans,
            });
        }
        path.push(task.id.clone());
        search_list(&task.children, re, column, path, hits);
        path.pop();
    }
}
