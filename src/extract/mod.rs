//! Source tree scanner producing the city snapshot
//!
//! Walks a directory, recognizes source files by extension, pulls package and
//! class names out with per-language patterns and attaches per-file git
//! history. Packages and classes come out sorted by name.

pub mod git;
pub mod languages;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::model::{CityData, ClassRecord, PackageRecord};
use languages::Language;

/// Directories never descended into (hidden directories are skipped too)
pub const EXCLUDED_DIRS: [&str; 7] = [
    ".git",
    "node_modules",
    "target",
    "build",
    "dist",
    "vendor",
    "__pycache__",
];

const DEFAULT_PACKAGE: &str = "default";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("cannot read {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Collect commit history with `git log`
    pub git: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { git: true }
    }
}

/// Classes found in one file, before git metadata is attached
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedFile {
    pub package: String,
    pub classes: Vec<(String, u64)>,
}

fn is_excluded(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name.as_ref())
}

pub fn count_loc(source: &str) -> u64 {
    source.lines().filter(|l| !l.trim().is_empty()).count() as u64
}

/// Dot-joined parent directories of a root-relative path
pub fn directory_package(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    std::path::Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        DEFAULT_PACKAGE.to_string()
    } else {
        parts.join(".")
    }
}

/// Split `loc` evenly over `n` parts; the first part takes the remainder
fn split_loc(loc: u64, n: usize) -> Vec<u64> {
    let n = n.max(1) as u64;
    let (base, rem) = (loc / n, loc % n);
    (0..n).map(|i| if i == 0 { base + rem } else { base }).collect()
}

pub fn scan_source(language: &Language, relative: &Path, source: &str) -> ScannedFile {
    let package = language
        .package_name(source)
        .unwrap_or_else(|| directory_package(relative));

    let mut names = language.class_names(source);
    if names.is_empty() {
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        names.push(stem);
    }

    let shares = split_loc(count_loc(source), names.len());
    ScannedFile {
        package,
        classes: names.into_iter().zip(shares).collect(),
    }
}

pub fn extract(root: &Path, options: &ExtractOptions) -> Result<CityData, ExtractError> {
    if !root.is_dir() {
        return Err(ExtractError::NotADirectory(root.to_path_buf()));
    }

    let use_git = options.git && git::is_repository(root);
    if options.git && !use_git {
        tracing::info!("{} is not a git work tree, skipping history", root.display());
    }

    let mut packages: BTreeMap<String, Vec<ClassRecord>> = BTreeMap::new();
    let mut files = 0usize;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ExtractError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(language) = languages::for_path(entry.path()) else {
            continue;
        };
        let source = match std::fs::read_to_string(entry.path()) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let scanned = scan_source(language, relative, &source);
        let history = if use_git { git::file_history(root, relative) } else { None };
        tracing::debug!(
            "{} ({}): {} classes in {}",
            relative.display(),
            language.name,
            scanned.classes.len(),
            scanned.package
        );

        let records = packages.entry(scanned.package).or_default();
        records.extend(scanned.classes.into_iter().map(|(name, lines_of_code)| ClassRecord {
            name,
            lines_of_code,
            git_metadata: history.clone(),
        }));
        files += 1;
    }

    let packages: Vec<PackageRecord> = packages
        .into_iter()
        .map(|(name, mut classes)| {
            classes.sort_by(|a, b| a.name.cmp(&b.name));
            PackageRecord { name, classes }
        })
        .collect();

    let data = CityData { packages };
    tracing::info!(
        "Extracted {} classes in {} packages from {} files",
        data.class_count(),
        data.packages.len(),
        files
    );
    Ok(data)
}
