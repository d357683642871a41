//! Human-editable TOML rendering of the whole document.

use std::collections::HashSet;

use tracing::warn;

use crate::model::app_data::AppData;
use crate::ops::tree;

#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    #[error("could not render document: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("could not parse document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate project id: {0}")]
    DuplicateProject(String),
    #[error("duplicate task id {task} in project {project}")]
    DuplicateTask { project: String, task: String },
    #[error("active project {0} does not exist")]
    UnknownActiveProject(String),
}

/// Render `data` as TOML. The store-owned `_version` is left out.
pub fn export(data: &AppData) -> Result<String, InterchangeError> {
    let data = AppData {
        version: 0,
        ..data.clone()
    };
    let mut text = toml::to_string_pretty(&data)?;
    // `_version = 0` is noise for a human reader
    text = text
        .lines()
        .filter(|line| !line.starts_with("_version"))
        .collect::<Vec<_>>()
        .join("\n");
    text.push('\n');
    Ok(text)
}

/// Parse TOML text into a document without validating it.
pub fn parse(text: &str) -> Result<AppData, InterchangeError> {
    Ok(toml::from_str(text)?)
}

/// Check the structural rules an imported document must satisfy.
pub fn validate(data: &AppData) -> Result<(), InterchangeError> {
    let mut project_ids = HashSet::new();
    for project in &data.projects {
        if !project_ids.insert(project.id.as_str()) {
            return Err(InterchangeError::DuplicateProject(project.id.clone()));
        }

        let mut task_ids = HashSet::new();
        let mut duplicate = None;
        for (_, forest) in project.columns.iter() {
            tree::for_each_task(forest, &mut |task| {
                if !task_ids.insert(task.id.clone()) && duplicate.is_none() {
                    duplicate = Some(task.id.clone());
                }
            });
        }
        if let Some(task) = duplicate {
            return Err(InterchangeError::DuplicateTask {
                project: project.id.clone(),
                task,
            });
        }
    }

    if let Some(active) = &data.active_project_id
        && !data.projects.is_empty()
        && data.project(active).is_none()
    {
        return Err(InterchangeError::UnknownActiveProject(active.clone()));
    }
    Ok(())
}

/// Replace `current` with the document in `text`. On any error `current`
/// stays authoritative; the imported document inherits its version.
pub fn apply(current: &AppData, text: &str) -> Result<AppData, InterchangeError> {
    let imported = parse(text).and_then(|data| {
        validate(&data)?;
        Ok(data)
    });
    match imported {
        Ok(data) => Ok(AppData {
            version: current.version,
            ..data
        }),
        Err(e) => {
            warn!(error = %e, "import rejected");
            Err(e)
        }
    }
}
