// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Sectioned configuration loading.
//!
//! All mech-rs components read their settings from a section of one
//! shared `mech-rs.toml`, searched in the current directory, the XDG
//! config directory, and `/etc/mech-rs`.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {0}: {1}")]
    Read(PathBuf, String),

    #[error("cannot parse config file {0}: {1}")]
    Parse(PathBuf, String),
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("mech-rs.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mech-rs").join("mech-rs.toml"));
    }
    paths.push(PathBuf::from("/etc/mech-rs/mech-rs.toml"));
    paths
}

/// Deserialize one named section of a TOML file, or `None` when the
/// file does not carry that section.
fn read_section<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Option<T>, ConfigError> {
    let parse = |message: String| ConfigError::Parse(path.to_path_buf(), message);

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| parse(e.to_string()))?;

    match table.get(key) {
        None => Ok(None),
        Some(section) => {
            // Round-trip the section through text so serde defaults
            // apply to every omitted field.
            let text = toml::to_string(section).map_err(|e| parse(e.to_string()))?;
            let config = toml::from_str::<T>(&text).map_err(|e| parse(e.to_string()))?;
            Ok(Some(config))
        }
    }
}

/// A configuration section of `mech-rs.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key, e.g. `"mech-server"`.
    fn section_key() -> &'static str;

    /// Load the section from an explicit path; the file must exist and
    /// carry the section.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        read_section::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::Parse(
                path.to_path_buf(),
                format!("missing [{}] section", Self::section_key()),
            )
        })
    }

    /// Walk the default search paths and load the first file carrying
    /// the section. Falls back to defaults when none does, reporting
    /// the path actually used.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in search_paths() {
            if !path.exists() {
                continue;
            }
            if let Some(config) = read_section::<Self>(&path, Self::section_key())? {
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        count: u32,
    }

    impl ConfigFile for Sample {
        fn section_key() -> &'static str {
            "sample"
        }
    }

    #[test]
    fn test_read_section_applies_defaults() {
        let dir = std::env::temp_dir();
        let path = dir.join("mech-app-config-test.toml");
        std::fs::write(&path, "[sample]\nname = \"porch\"\n[other]\nx = 1\n").unwrap();

        let sample = Sample::load_from_file(&path).unwrap();
        assert_eq!(sample.name, "porch");
        assert_eq!(sample.count, 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("mech-app-config-missing.toml");
        std::fs::write(&path, "[other]\nx = 1\n").unwrap();

        assert!(matches!(
            Sample::load_from_file(&path),
            Err(ConfigError::Parse(_, _))
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let path = Path::new("/nonexistent/mech-rs.toml");
        assert!(matches!(
            Sample::load_from_file(path),
            Err(ConfigError::Read(_, _))
        ));
    }
}
