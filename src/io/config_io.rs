use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::store::atomic_write;
use crate::model::config::BoardConfig;

pub const CONFIG_FILE: &str = "treeboard.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Config file that sits next to a data file
pub fn config_path_for(data_file: &Path) -> PathBuf {
    match data_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(CONFIG_FILE),
        _ => PathBuf::from(CONFIG_FILE),
    }
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for formatting-preserving edits. A missing file yields defaults.
pub fn read_config(path: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let config: BoardConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

pub fn load_config(path: &Path) -> Result<BoardConfig, ConfigError> {
    read_config(path).map(|(config, _)| config)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    atomic_write(path, doc.to_string().as_bytes()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Integer,
    Float,
    Text,
}

const KEYS: &[(&str, &str, ValueKind)] = &[
    ("save", "debounce_ms", ValueKind::Integer),
    ("board", "default_wip_limit", ValueKind::Integer),
    ("board", "column_drop_offset", ValueKind::Float),
    ("board", "clone_suffix", ValueKind::Text),
    ("log", "level", ValueKind::Text),
];

/// Set a dotted key (`board.default_wip_limit`) from its command-line text.
/// The edited document must still deserialize as a config.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, raw: &str) -> Result<(), ConfigError> {
    let Some(&(section, field, kind)) = KEYS
        .iter()
        .find(|&&(section, field, _)| key.split_once('.') == Some((section, field)))
    else {
        return Err(ConfigError::UnknownKey(key.to_string()));
    };

    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    };
    let value = match kind {
        ValueKind::Integer => {
            let n: u32 = raw.parse().map_err(|_| invalid())?;
            toml_edit::value(i64::from(n))
        }
        ValueKind::Float => {
            let f: f64 = raw.parse().map_err(|_| invalid())?;
            if !f.is_finite() || f < 0.0 {
                return Err(invalid());
            }
            toml_edit::value(f)
        }
        ValueKind::Text => toml_edit::value(raw),
    };

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = value;
    toml::from_str::<BoardConfig>(&doc.to_string())?;
    Ok(())
}
