#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

/// Writes `content` as `dockhook.yaml` inside `dir`.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("dockhook.yaml");
    fs::write(&path, content).expect("failed to write config");
    path
}

/// Writes a shell script named `name` inside `dir`, meant to be run via `/bin/sh`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{body}\n")).expect("failed to write script");
    path
}

/// Reads the lines of `path`, or nothing if it does not exist.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
