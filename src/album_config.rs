//! Per-album configuration sidecar (`bilder.json`).
//!
//! An album directory may carry a JSON file that overrides the display title,
//! attaches captions to images and protects the album with a username/password
//! pair. Every field is optional; a missing file means defaults for all of them.
//!
//! ```json
//! {
//!   "Title": "Cats!",
//!   "Captions": { "a.jpg": "hi" },
//!   "User": "guest",
//!   "Pass": "secret"
//! }
//! ```
//!
//! Unlike the server config, unknown keys are ignored: sidecars are written by
//! hand next to photos and a stray key should not hide a whole album's captions.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parsed contents of an album sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DirConfig {
    pub title: String,
    pub captions: HashMap<String, String>,
    pub user: String,
    pub pass: String,
}

impl DirConfig {
    /// Caption for `file`, empty when none is configured.
    pub fn caption(&self, file: &str) -> &str {
        self.captions.get(file).map(String::as_str).unwrap_or("")
    }

    /// Display title: the override when set, the directory name otherwise.
    pub fn title_or<'a>(&'a self, dir_name: &'a str) -> &'a str {
        if self.title.is_empty() {
            dir_name
        } else {
            &self.title
        }
    }
}

pub fn parse(json: &str) -> Result<DirConfig, DirConfigError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load(path: &Path) -> Result<DirConfig, DirConfigError> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let cfg = parse(
            r#"{"Title":"Cats!","Captions":{"a.jpg":"hi"},"User":"u","Pass":"p"}"#,
        )
        .unwrap();
        assert_eq!(cfg.title, "Cats!");
        assert_eq!(cfg.caption("a.jpg"), "hi");
        assert_eq!(cfg.user, "u");
        assert_eq!(cfg.pass, "p");
    }

    #[test]
    fn missing_fields_default() {
        let cfg = parse(r#"{"Captions":{"b.jpg":"there"}}"#).unwrap();
        assert_eq!(cfg.title, "");
        assert_eq!(cfg.user, "");
        assert_eq!(cfg.caption("b.jpg"), "there");
        assert_eq!(cfg.caption("missing.jpg"), "");
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(parse("{}").unwrap(), DirConfig::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = parse(r#"{"Title":"t","Layout":"grid"}"#).unwrap();
        assert_eq!(cfg.title, "t");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(parse("{\"Title\":"), Err(DirConfigError::Json(_))));
    }

    #[test]
    fn title_falls_back_to_directory_name() {
        let cfg = DirConfig::default();
        assert_eq!(cfg.title_or("cats"), "cats");
        let cfg = DirConfig {
            title: "Cats!".into(),
            ..DirConfig::default()
        };
        assert_eq!(cfg.title_or("cats"), "Cats!");
    }

    #[test]
    fn load_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = load(&tmp.path().join("bilder.json")).unwrap_err();
        assert!(matches!(err, DirConfigError::Io(_)));
    }
}
