use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    /// Parse a priority name
    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            "none" => Some(Priority::None),
            _ => None,
        }
    }

    /// Short marker used in text output
    pub fn marker(self) -> &'static str {
        match self {
            Priority::High => "!!!",
            Priority::Medium => "!!",
            Priority::Low => "!",
            Priority::None => "",
        }
    }
}

/// A node in a column's task forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque id, unique within a project
    pub id: String,
    /// Identity of the task this one was duplicated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Free-form text
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Done flag for leaves, aggregated by the progress map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Display-only expand flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
    /// Sub-tasks (recursive, exclusively owned)
    #[serde(default)]
    pub children: Vec<Task>,
}

impl Task {
    /// Create a new leaf task stamped with the current time
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            source_id: None,
            content: content.into(),
            created_at: Utc::now(),
            completed: None,
            priority: None,
            is_expanded: None,
            children: Vec::new(),
        }
    }

    /// The logical identity shared by this task and all its duplicates.
    pub fn identity(&self) -> &str {
        self.source_id.as_deref().unwrap_or(&self.id)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.completed == Some(true)
    }

    /// Copy of the scalar fields under a new id, without children.
    pub fn shallow_copy(&self, id: impl Into<String>) -> Task {
        Task {
            id: id.into(),
            source_id: self.source_id.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
            completed: self.completed,
            priority: self.priority,
            is_expanded: self.is_expanded,
            children: Vec::new(),
        }
    }
}

/// Partial update applied by `update_task`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub content: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub is_expanded: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.is_expanded.is_none()
    }

    /// Apply the patch to a task in place
    pub fn apply(&self, task: &mut Task) {
        if let Some(content) = &self.content {
            task.content = content.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = Some(completed);
        }
        if let Some(priority) = self.priority {
            task.priority = Some(priority);
        }
        if let Some(expanded) = self.is_expanded {
            task.is_expanded = Some(expanded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_falls_back_to_own_id() {
        let mut task = Task::new("t-001", "Write docs");
        assert_eq!(task.identity(), "t-001");
        task.source_id = Some("t-000".into());
        assert_eq!(task.identity(), "t-000");
    }

    #[test]
    fn shallow_copy_drops_children() {
        let mut parent = Task::new("t-001", "Parent");
        parent.priority = Some(Priority::High);
        parent.children.push(Task::new("t-002", "Child"));

        let copy = parent.shallow_copy("t-003");
        assert_eq!(copy.id, "t-003");
        assert_eq!(copy.content, "Parent");
        assert_eq!(copy.priority, Some(Priority::High));
        assert!(copy.children.is_empty());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut task = Task::new("t-001", "Old");
        task.priority = Some(Priority::Low);
        let patch = TaskPatch {
            content: Some("New".into()),
            completed: Some(true),
            ..Default::default()
        };
        patch.apply(&mut task);
        assert_eq!(task.content, "New");
        assert!(task.is_completed());
        assert_eq!(task.priority, Some(Priority::Low));
    }

    #[test]
    fn serializes_camel_case_and_skips_empty_options() {
        let mut task = Task::new("t-001", "Plan");
        task.source_id = Some("t-000".into());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["sourceId"], "t-000");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("isExpanded").is_none());
        assert!(json.get("priority").is_none());
    }
}
