//! A live editing session over one stored document.
//!
//! [`Board`] owns the current [`AppData`], applies the pure operations from
//! [`crate::ops`] to it, and hands every changed snapshot to the debounced
//! [`Saver`]. Readers always see a fully committed document.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::io::interchange::{self, InterchangeError};
use crate::io::saver::{SaveStatus, Saver};
use crate::io::store::{Store, StoreError};
use crate::model::app_data::{AppData, Theme};
use crate::model::column::ColumnId;
use crate::model::config::BoardConfig;
use crate::model::project::{Project, ProjectPatch};
use crate::model::task::TaskPatch;
use crate::ops::drag::{self, DragOver, DragSession, DragState};
use crate::ops::drop::{DropError, DropOutcome, DropRequest};
use crate::ops::project_ops;
use crate::ops::tree;
use crate::ops::wip::WipViolation;

/// Error type for board operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("no projects yet (create one with `tb project add`)")]
    NoProject,
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("cannot drop {task} onto {target}: it is the task itself or one of its subtasks")]
    Cycle { task: String, target: String },
    #[error(transparent)]
    Wip(#[from] WipViolation),
}

impl From<DropError> for TaskError {
    fn from(e: DropError) -> Self {
        match e {
            DropError::Wip(v) => TaskError::Wip(v),
        }
    }
}

pub struct Board {
    data: AppData,
    config: BoardConfig,
    saver: Saver,
}

impl Board {
    /// Load document `key` from `store` (an empty document if absent).
    pub fn open(
        store: Arc<dyn Store>,
        key: &str,
        config: BoardConfig,
    ) -> Result<Board, StoreError> {
        let data = store.load(key)?.unwrap_or_default();
        let debounce = Duration::from_millis(config.save.debounce_ms);
        let saver = Saver::new(store, key, debounce, data.version)?;
        debug!(key, version = data.version, projects = data.projects.len(), "board opened");
        Ok(Board {
            data,
            config,
            saver,
        })
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn save_status(&self) -> &SaveStatus {
        self.saver.status()
    }

    /// Drive the debounced saver; call regularly from an event loop.
    pub fn tick(&mut self, now: Instant) {
        self.saver.poll(now);
    }

    /// Write everything outstanding and wait for it.
    pub fn flush(&mut self) -> SaveStatus {
        let status = self.saver.flush();
        self.data.version = self.saver.version();
        status
    }

    fn commit(&mut self, next: AppData) {
        if next == self.data {
            return;
        }
        self.data = next;
        self.saver.request(self.data.clone(), Instant::now());
    }

    /// Resolve an explicit project id, or the active project when `None`.
    pub fn project(&self, project_id: Option<&str>) -> Result<&Project, TaskError> {
        match project_id {
            Some(id) => self
                .data
                .project(id)
                .ok_or_else(|| TaskError::ProjectNotFound(id.to_string())),
            None => self.data.active_project().ok_or(TaskError::NoProject),
        }
    }

    fn project_id(&self, project_id: Option<&str>) -> Result<String, TaskError> {
        self.project(project_id).map(|p| p.id.clone())
    }

    fn require_task(&self, pid: &str, task_id: &str) -> Result<(), TaskError> {
        let project = self.project(Some(pid))?;
        match tree::find_in_columns(&project.columns, task_id) {
            Some(_) => Ok(()),
            None => Err(TaskError::NotFound(task_id.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create a project; `wip_limit` defaults to the configured one.
    pub fn add_project(
        &mut self,
        name: &str,
        description: &str,
        wip_limit: Option<usize>,
    ) -> String {
        let wip = wip_limit.unwrap_or(self.config.board.default_wip_limit);
        let (next, id) = project_ops::add_project(&self.data, name, description, wip);
        self.commit(next);
        id
    }

    pub fn delete_project(&mut self, project_id: &str) -> Result<(), TaskError> {
        let pid = self.project_id(Some(project_id))?;
        self.commit(project_ops::delete_project(&self.data, &pid));
        Ok(())
    }

    pub fn update_project(
        &mut self,
        project_id: Option<&str>,
        patch: &ProjectPatch,
    ) -> Result<(), TaskError> {
        let pid = self.project_id(project_id)?;
        self.commit(project_ops::update_project(&self.data, &pid, patch));
        Ok(())
    }

    pub fn set_active_project(&mut self, project_id: &str) -> Result<(), TaskError> {
        let pid = self.project_id(Some(project_id))?;
        self.commit(project_ops::set_active_project(&self.data, &pid));
        Ok(())
    }

    pub fn set_wip_limit(
        &mut self,
        project_id: Option<&str>,
        wip_limit: usize,
    ) -> Result<(), TaskError> {
        let pid = self.project_id(project_id)?;
        self.commit(project_ops::update_wip_limit(&self.data, &pid, wip_limit));
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.commit(project_ops::set_theme(&self.data, theme));
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn add_task(
        &mut self,
        project_id: Option<&str>,
        column: ColumnId,
        content: &str,
    ) -> Result<String, TaskError> {
        let pid = self.project_id(project_id)?;
        let (next, id) = project_ops::add_task(&self.data, &pid, column, content)?;
        let id = id.ok_or(TaskError::ProjectNotFound(pid))?;
        self.commit(next);
        Ok(id)
    }

    pub fn add_child_task(
        &mut self,
        project_id: Option<&str>,
        parent_id: &str,
        content: &str,
    ) -> Result<String, TaskError> {
        let pid = self.project_id(project_id)?;
        let (next, id) = project_ops::add_child_task(&self.data, &pid, parent_id, content)?;
        let id = id.ok_or_else(|| TaskError::NotFound(parent_id.to_string()))?;
        self.commit(next);
        Ok(id)
    }

    pub fn update_task(
        &mut self,
        project_id: Option<&str>,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<(), TaskError> {
        let pid = self.project_id(project_id)?;
        self.require_task(&pid, task_id)?;
        self.commit(project_ops::update_task(&self.data, &pid, task_id, patch));
        Ok(())
    }

    pub fn toggle_expanded(
        &mut self,
        project_id: Option<&str>,
        task_id: &str,
    ) -> Result<(), TaskError> {
        let pid = self.project_id(project_id)?;
        self.require_task(&pid, task_id)?;
        self.commit(project_ops::toggle_expanded(&self.data, &pid, task_id));
        Ok(())
    }

    pub fn delete_task(
        &mut self,
        project_id: Option<&str>,
        task_id: &str,
    ) -> Result<(), TaskError> {
        let pid = self.project_id(project_id)?;
        self.require_task(&pid, task_id)?;
        self.commit(project_ops::delete_task(&self.data, &pid, task_id));
        Ok(())
    }

    /// Deep-clone a task next to the original. Returns the copy's id.
    pub fn clone_task(
        &mut self,
        project_id: Option<&str>,
        task_id: &str,
    ) -> Result<String, TaskError> {
        let pid = self.project_id(project_id)?;
        let suffix = self.config.board.clone_suffix.clone();
        let (next, id) = project_ops::clone_task(&self.data, &pid, task_id, &suffix);
        let id = id.ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        self.commit(next);
        Ok(id)
    }

    pub fn move_task(
        &mut self,
        project_id: Option<&str>,
        task_id: &str,
        column: ColumnId,
    ) -> Result<(), TaskError> {
        let pid = self.project_id(project_id)?;
        self.require_task(&pid, task_id)?;
        let next = project_ops::move_to_column(&self.data, &pid, task_id, column)?;
        self.commit(next);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------------

    /// Reclassify a drag for the latest pointer input against `project_id`.
    pub fn hover<'s>(
        &self,
        project_id: Option<&str>,
        session: &'s mut DragSession,
        over: &DragOver,
    ) -> Result<&'s DragState, TaskError> {
        let project = self.project(project_id)?;
        Ok(session.over(&project.columns, over, self.config.board.column_drop_offset))
    }

    /// End a drag session and commit its drop.
    pub fn release(
        &mut self,
        project_id: Option<&str>,
        session: DragSession,
    ) -> Result<DropOutcome, TaskError> {
        self.drop(project_id, &session.finish())
    }

    /// Commit a drop request. Targets that would create a cycle are reported
    /// as errors instead of being silently ignored.
    pub fn drop(
        &mut self,
        project_id: Option<&str>,
        request: &DropRequest,
    ) -> Result<DropOutcome, TaskError> {
        let pid = self.project_id(project_id)?;
        self.require_task(&pid, &request.task_id)?;
        if let Some(drag::DropTarget::Task(target)) = request.state.target() {
            let project = self.project(Some(pid.as_str()))?;
            if drag::forms_cycle(&project.columns, &request.task_id, target) {
                return Err(TaskError::Cycle {
                    task: request.task_id.clone(),
                    target: target.clone(),
                });
            }
        }
        let (next, outcome) = project_ops::apply_drop(&self.data, &pid, request)?;
        self.commit(next);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Interchange
    // -----------------------------------------------------------------------

    pub fn export(&self) -> Result<String, InterchangeError> {
        interchange::export(&self.data)
    }

    /// Replace the whole document with imported text. On error nothing changes.
    pub fn import(&mut self, text: &str) -> Result<(), InterchangeError> {
        let next = interchange::apply(&self.data, text)?;
        self.commit(next);
        Ok(())
    }
}
