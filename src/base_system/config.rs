//! 配置文件读写与带注释生成。
//!
//! 配置是一层扁平的键值表：用户文件中的键覆盖默认值，缺失的键在加载后写回文件，
//! 未知的键只记录警告。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value in {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
    fn fields() -> &'static [FieldMeta];

    /// 合并用户配置后调用；返回 Err 时加载失败。
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

pub fn load_or_create<T: ConfigSpec>(config_path: Option<&Path>) -> Result<T, ConfigError> {
    load_or_create_with_base::<T>(config_path, None)
}

/// `config_path` 优先；否则使用 `base_dir/FILE_NAME`，都未指定时为当前目录。
pub fn load_or_create_with_base<T: ConfigSpec>(
    config_path: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<T, ConfigError> {
    let path = resolve_path::<T>(config_path, base_dir);

    if !path.exists() {
        let default_config = T::default();
        write_with_comments(&default_config, &path)?;
        info!("已生成默认配置文件: {}", path.display());
        return Ok(default_config);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let user = parse_user_mapping(&raw, &path)?;

    for key in unknown_keys::<T>(&user) {
        warn!("配置文件 {} 中存在未知的键: {key}", path.display());
    }
    let missing = missing_keys::<T>(&user);

    let mut merged = match serde_yaml::to_value(T::default()).map_err(ConfigError::Serialize)? {
        Value::Mapping(map) => map,
        _ => {
            return Err(ConfigError::Validation(
                "config must serialize to a mapping".to_string(),
            ));
        }
    };
    for (key, value) in user {
        merged.insert(key, value);
    }

    let config: T =
        serde_yaml::from_value(Value::Mapping(merged)).map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?;
    config.validate().map_err(ConfigError::Validation)?;

    if !missing.is_empty() {
        info!("补全配置文件缺失的键: {}", missing.join(", "));
        write_with_comments(&config, &path)?;
    }

    Ok(config)
}

pub fn write_with_comments<T: ConfigSpec>(config: &T, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let yaml = generate_yaml_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 按 `fields()` 的顺序输出，每个键之前是它的说明注释。
pub fn generate_yaml_with_comments<T: ConfigSpec>(config: &T) -> Result<String, ConfigError> {
    let Value::Mapping(mapping) = serde_yaml::to_value(config).map_err(ConfigError::Serialize)?
    else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut out = String::new();
    for field in T::fields() {
        for line in field.description.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
        let key = Value::String(field.name.to_string());
        let val = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let entry = serde_yaml::to_string(&Mapping::from_iter([(key, val)]))
            .map_err(ConfigError::Serialize)?;
        out.push_str(entry.trim_end());
        out.push('\n');
    }
    Ok(out)
}

/// 空文件视为空表；顶层不是表时报错。
fn parse_user_mapping(raw: &str, path: &Path) -> Result<Mapping, ConfigError> {
    let doc: Value = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match doc {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::Validation(format!(
            "{} must contain a key/value mapping",
            path.display()
        ))),
    }
}

fn missing_keys<T: ConfigSpec>(user: &Mapping) -> Vec<&'static str> {
    T::fields()
        .iter()
        .map(|f| f.name)
        .filter(|name| !user.contains_key(*name))
        .collect()
}

fn unknown_keys<T: ConfigSpec>(user: &Mapping) -> Vec<String> {
    user.keys()
        .map(|k| match k {
            Value::String(s) => s.clone(),
            other => format!("{other:?}"),
        })
        .filter(|k| !T::fields().iter().any(|f| f.name == k))
        .collect()
}

fn resolve_path<T: ConfigSpec>(path: Option<&Path>, base_dir: Option<&Path>) -> PathBuf {
    match (path, base_dir) {
        (Some(p), _) => p.to_path_buf(),
        (None, Some(base)) => base.join(T::FILE_NAME),
        (None, None) => PathBuf::from(T::FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_system::context::Config;

    #[test]
    fn first_load_writes_commented_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config: Config = load_or_create_with_base(None, Some(dir.path())).unwrap();
        assert_eq!(config.max_records, 100);

        let written = fs::read_to_string(dir.path().join(Config::FILE_NAME)).unwrap();
        assert!(written.contains("# Python Windows 下载页地址"));
        assert!(written.contains("page_url:"));
        assert!(written.contains("https://www.python.org/downloads/windows/"));
    }

    #[test]
    fn user_values_are_merged_and_missing_keys_restored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "max_records: 7\narch_suffix: arm64.exe\n").unwrap();

        let config: Config = load_or_create(Some(&path)).unwrap();
        assert_eq!(config.max_records, 7);
        assert_eq!(config.arch_suffix, "arm64.exe");
        assert_eq!(config.scan_margin, 100);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("scan_margin: 100"));
        assert!(rewritten.contains("max_records: 7"));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yml");
        fs::write(&path, "").unwrap();
        let config: Config = load_or_create(Some(&path)).unwrap();
        assert_eq!(config.arch_suffix, "amd64.exe");
        assert!(fs::read_to_string(&path).unwrap().contains("arch_suffix:"));
    }

    #[test]
    fn unknown_keys_are_reported_but_ignored() {
        let mut user = Mapping::new();
        user.insert(Value::from("max_record"), Value::from(5));
        user.insert(Value::from("max_records"), Value::from(5));
        assert_eq!(unknown_keys::<Config>(&user), ["max_record"]);
        assert!(!missing_keys::<Config>(&user).contains(&"max_records"));
    }

    #[test]
    fn non_mapping_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.yml");
        fs::write(&path, "- 1\n- 2\n").unwrap();
        let err = load_or_create::<Config>(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn wrong_value_type_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.yml");
        fs::write(&path, "max_records: many\n").unwrap();
        let err = load_or_create::<Config>(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn invalid_limits_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "response_capacity: 64\ntruncation_margin: 128\n").unwrap();
        let err = load_or_create::<Config>(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        fs::write(&path, "max_records: [1, 2\n").unwrap();
        let err = load_or_create::<Config>(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
