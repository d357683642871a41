use serde::{Deserialize, Serialize};

/// Configuration from treeboard.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub save: SaveConfig,
    #[serde(default)]
    pub board: BoardSettings,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Edits within this window collapse into one save
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        SaveConfig {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    /// WIP limit given to newly created projects
    #[serde(default = "default_wip_limit")]
    pub default_wip_limit: usize,
    /// Distance from the top of a column (px) separating "insert at top"
    /// from "insert at bottom" when hovering the column background
    #[serde(default = "default_column_drop_offset")]
    pub column_drop_offset: f64,
    /// Appended to the content of a cloned task
    #[serde(default = "default_clone_suffix")]
    pub clone_suffix: String,
}

impl Default for BoardSettings {
    fn default() -> Self {
        BoardSettings {
            default_wip_limit: default_wip_limit(),
            column_drop_offset: default_column_drop_offset(),
            clone_suffix: default_clone_suffix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when TREEBOARD_LOG / RUST_LOG are unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_wip_limit() -> usize {
    3
}

fn default_column_drop_offset() -> f64 {
    50.0
}

fn default_clone_suffix() -> String {
    " (copy)".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: BoardConfig = toml::from_str("").unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.save.debounce_ms, 1000);
        assert_eq!(config.board.default_wip_limit, 3);
        assert_eq!(config.board.column_drop_offset, 50.0);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: BoardConfig = toml::from_str(
            r#"
[board]
default_wip_limit = 5
"#,
        )
        .unwrap();
        assert_eq!(config.board.default_wip_limit, 5);
        assert_eq!(config.board.clone_suffix, " (copy)");
        assert_eq!(config.save.debounce_ms, 1000);
    }
}
