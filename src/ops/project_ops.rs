//! Project and task CRUD over `AppData`.
//!
//! Each operation takes the current document and returns a new one. An
//! unknown project id (or task id) is a no-op: the returned document equals
//! the input. Any real change stamps the owning project's `updated_at`.

use crate::model::app_data::{AppData, Theme};
use crate::model::column::{ColumnId, Columns};
use crate::model::project::{Project, ProjectPatch, ProjectStatus};
use crate::model::task::{Task, TaskPatch};
use crate::ops::drop::{self, DropError, DropOutcome, DropRequest};
use crate::ops::tree::{self, IdSeq, Placement};
use crate::ops::wip::{self, WipViolation};

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Add a project at the end of the list. The first project becomes active.
pub fn add_project(
    data: &AppData,
    name: &str,
    description: &str,
    wip_limit: usize,
) -> (AppData, String) {
    let mut ids = IdSeq::with_prefix("p", data.projects.iter().map(|p| p.id.as_str()));
    let id = ids.next_id();

    let mut project = Project::new(id.clone(), name, wip_limit);
    project.description = description.to_string();
    project.touch();

    let mut next = data.clone();
    next.projects.push(project);
    if next.active_project_id.is_none() {
        next.active_project_id = Some(id.clone());
    }
    (next, id)
}

/// Remove a project. If it was active, the first remaining one takes over.
pub fn delete_project(data: &AppData, project_id: &str) -> AppData {
    if data.project(project_id).is_none() {
        return data.clone();
    }
    let mut next = data.clone();
    next.projects.retain(|p| p.id != project_id);
    if next.active_project_id.as_deref() == Some(project_id) {
        next.active_project_id = next.projects.first().map(|p| p.id.clone());
    }
    next
}

pub fn update_project(data: &AppData, project_id: &str, patch: &ProjectPatch) -> AppData {
    with_project(data, project_id, |project| {
        if let Some(name) = &patch.name {
            project.name = name.clone();
        }
        if let Some(description) = &patch.description {
            project.description = description.clone();
        }
        if let Some(status) = patch.status {
            project.status = Some(status);
        }
        true
    })
}

/// Projects grouped by portfolio status, in `ProjectStatus::ALL` order.
/// Projects without a status count as active. Empty groups are kept.
pub fn portfolio(data: &AppData) -> Vec<(ProjectStatus, Vec<&Project>)> {
    ProjectStatus::ALL
        .iter()
        .map(|&status| {
            let members = data
                .projects
                .iter()
                .filter(|p| p.status.unwrap_or(ProjectStatus::Active) == status)
                .collect();
            (status, members)
        })
        .collect()
}

pub fn set_active_project(data: &AppData, project_id: &str) -> AppData {
    if data.project(project_id).is_none() {
        return data.clone();
    }
    AppData {
        active_project_id: Some(project_id.to_string()),
        ..data.clone()
    }
}

pub fn set_theme(data: &AppData, theme: Theme) -> AppData {
    AppData {
        theme,
        ..data.clone()
    }
}

/// Change the WIP limit. Tasks already in progress are never evicted; the
/// new limit applies to later moves.
pub fn update_wip_limit(data: &AppData, project_id: &str, wip_limit: usize) -> AppData {
    with_project(data, project_id, |project| {
        project.wip_limit = wip_limit;
        true
    })
}

/// Replace a project's whole column map in one step.
pub fn update_project_columns(
    data: &AppData,
    project_id: &str,
    columns: Columns,
) -> AppData {
    with_project(data, project_id, |project| {
        project.columns = columns;
        true
    })
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Append a new top-level task to a column. Returns its id. A new task in
/// `in-progress` obeys the WIP limit.
pub fn add_task(
    data: &AppData,
    project_id: &str,
    column: ColumnId,
    content: &str,
) -> Result<(AppData, Option<String>), WipViolation> {
    let Some(project) = data.project(project_id) else {
        return Ok((data.clone(), None));
    };
    let id = IdSeq::for_columns(&project.columns).next_id();
    let task = Task::new(id.clone(), content);
    if column == ColumnId::InProgress {
        wip::admit(&project.columns.in_progress, &task, project.wip_limit)?;
    }

    let mut forest = project.columns.get(column).to_vec();
    forest.push(task);
    let columns = project.columns.with_column(column, forest);
    Ok((update_project_columns(data, project_id, columns), Some(id)))
}

/// Append a new child under `parent_id` and expand the parent. Under a
/// parent in `in-progress` the extra leaf obeys the WIP limit.
pub fn add_child_task(
    data: &AppData,
    project_id: &str,
    parent_id: &str,
    content: &str,
) -> Result<(AppData, Option<String>), WipViolation> {
    let Some(project) = data.project(project_id) else {
        return Ok((data.clone(), None));
    };
    let Some((column, _)) = tree::find_in_columns(&project.columns, parent_id) else {
        return Ok((data.clone(), None));
    };
    let id = IdSeq::for_columns(&project.columns).next_id();
    let child = Task::new(id.clone(), content);
    let Some(forest) =
        tree::insert_relative(project.columns.get(column), parent_id, child, Placement::Child)
    else {
        return Ok((data.clone(), None));
    };
    if column == ColumnId::InProgress {
        wip::admit_rebuilt(&project.columns.in_progress, &forest, project.wip_limit)?;
    }

    let columns = project.columns.with_column(column, forest);
    Ok((update_project_columns(data, project_id, columns), Some(id)))
}

pub fn update_task(data: &AppData, project_id: &str, task_id: &str, patch: &TaskPatch) -> AppData {
    if patch.is_empty() {
        return data.clone();
    }
    with_project(data, project_id, |project| {
        match tree::update_in_columns(&project.columns, task_id, |task| patch.apply(task)) {
            Some(columns) => {
                project.columns = columns;
                true
            }
            None => false,
        }
    })
}

pub fn toggle_expanded(data: &AppData, project_id: &str, task_id: &str) -> AppData {
    with_project(data, project_id, |project| {
        let toggled = tree::update_in_columns(&project.columns, task_id, |task| {
            task.is_expanded = Some(!task.is_expanded.unwrap_or(false));
        });
        match toggled {
            Some(columns) => {
                project.columns = columns;
                true
            }
            None => false,
        }
    })
}

/// Delete a task and its whole subtree.
pub fn delete_task(data: &AppData, project_id: &str, task_id: &str) -> AppData {
    with_project(data, project_id, |project| {
        if tree::find_in_columns(&project.columns, task_id).is_none() {
            return false;
        }
        project.columns = tree::remove_from_columns(&project.columns, task_id);
        true
    })
}

/// Deep-clone a task with fresh ids, appending `suffix` to the copy's
/// content, and insert the copy right after the original. Returns the new id.
pub fn clone_task(
    data: &AppData,
    project_id: &str,
    task_id: &str,
    suffix: &str,
) -> (AppData, Option<String>) {
    let mut new_id = None;
    let next = with_project(data, project_id, |project| {
        let Some((column, original)) = tree::find_in_columns(&project.columns, task_id) else {
            return false;
        };
        let mut ids = IdSeq::for_columns(&project.columns);
        let mut copy = tree::clone_with_fresh_ids(original, &mut ids);
        copy.content.push_str(suffix);
        let copy_id = copy.id.clone();

        match tree::insert_relative(project.columns.get(column), task_id, copy, Placement::After) {
            Some(forest) => {
                project.columns = project.columns.with_column(column, forest);
                new_id = Some(copy_id);
                true
            }
            None => false,
        }
    });
    (next, new_id)
}

/// Programmatic move: the task (with its subtree) becomes the last top-level
/// task of `column`. Moves into `in-progress` obey the WIP limit.
pub fn move_to_column(
    data: &AppData,
    project_id: &str,
    task_id: &str,
    column: ColumnId,
) -> Result<AppData, WipViolation> {
    let Some(project) = data.project(project_id) else {
        return Ok(data.clone());
    };
    let Some(location) = tree::locate(&project.columns, task_id) else {
        return Ok(data.clone());
    };
    if location.column == column && location.parent_id.is_none() {
        return Ok(data.clone());
    }
    let Some((_, task)) = tree::find_in_columns(&project.columns, task_id) else {
        return Ok(data.clone());
    };
    let task = task.clone();

    let remaining = tree::remove_from_columns(&project.columns, task_id);
    if column == ColumnId::InProgress && location.column != ColumnId::InProgress {
        wip::admit(remaining.get(ColumnId::InProgress), &task, project.wip_limit)?;
    }
    let mut forest = remaining.get(column).to_vec();
    forest.push(task);
    let columns = remaining.with_column(column, forest);
    // lifting a nested task to the top can turn its parent into a leaf
    wip::admit_rebuilt(
        &project.columns.in_progress,
        columns.get(ColumnId::InProgress),
        project.wip_limit,
    )?;

    Ok(with_project(data, project_id, |project| {
        project.columns = columns;
        true
    }))
}

/// Commit a finished drag against one project.
pub fn apply_drop(
    data: &AppData,
    project_id: &str,
    request: &DropRequest,
) -> Result<(AppData, DropOutcome), DropError> {
    let Some(project) = data.project(project_id) else {
        return Ok((data.clone(), DropOutcome::Unchanged));
    };
    let outcome = drop::apply_drop(&project.columns, request, project.wip_limit)?;
    let next = match &outcome {
        DropOutcome::Committed { columns, .. } => {
            update_project_columns(data, project_id, columns.clone())
        }
        DropOutcome::Unchanged => data.clone(),
    };
    Ok((next, outcome))
}

/// Copy `data`, run `f` on the addressed project, and stamp `updated_at` when
/// `f` reports a change. Unknown projects leave the copy untouched.
fn with_project(
    data: &AppData,
    project_id: &str,
    f: impl FnOnce(&mut Project) -> bool,
) -> AppData {
    let mut next = data.clone();
    let Some(project) = next.project_mut(project_id) else {
        return next;
    };
    if f(project) {
        project.touch();
        next
    } else {
        data.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
