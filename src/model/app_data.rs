use serde::{Deserialize, Serialize};

use super::project::Project;

/// Color theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Theme> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Process-wide root document: every project plus UI preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project_id: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    /// Optimistic-concurrency counter owned by the store
    #[serde(default, rename = "_version")]
    pub version: u64,
}

impl AppData {
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    /// The active project, falling back to the first one
    pub fn active_project(&self) -> Option<&Project> {
        self.active_project_id
            .as_deref()
            .and_then(|id| self.project(id))
            .or_else(|| self.projects.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_field_is_underscored() {
        let data = AppData {
            version: 7,
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["_version"], 7);
        assert_eq!(json["theme"], "light");
    }

    #[test]
    fn minimal_document_uses_defaults() {
        let data: AppData = serde_json::from_str("{}").unwrap();
        assert!(data.projects.is_empty());
        assert!(data.active_project_id.is_none());
        assert_eq!(data.theme, Theme::Light);
        assert_eq!(data.version, 0);
    }

    #[test]
    fn active_project_falls_back_to_first() {
        let mut data = AppData::default();
        data.projects.push(Project::new("p-001", "One", 3));
        data.projects.push(Project::new("p-002", "Two", 3));
        assert_eq!(data.active_project().unwrap().id, "p-001");

        data.active_project_id = Some("p-002".into());
        assert_eq!(data.active_project().unwrap().id, "p-002");

        data.active_project_id = Some("gone".into());
        assert_eq!(data.active_project().unwrap().id, "p-001");
    }
}
