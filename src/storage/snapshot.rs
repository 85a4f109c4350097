//! Snapshot and file-group input
//!
//! A snapshot is a JSON or YAML document `{ packages: [...] }`. File groups
//! map package names to a locality key. Both formats are picked by file
//! extension; unknown extensions try JSON first, then YAML.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{GraphError, Package, PackageGraph, PackageId};
use crate::order::FileGroups;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Document format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    /// Try JSON, then YAML
    Detect,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Format::Json,
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Detect,
        }
    }
}

/// Top-level snapshot document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Snapshot {
    /// Builds the package graph
    pub fn into_graph(self) -> Result<PackageGraph, SnapshotError> {
        Ok(PackageGraph::from_packages(self.packages)?)
    }
}

/// Reads a snapshot file and builds its package graph
pub fn load_snapshot(path: &Path) -> Result<PackageGraph, SnapshotError> {
    let content = read(path)?;
    let snapshot: Snapshot = parse(&content, Format::from_path(path), &path.display().to_string())?;
    snapshot.into_graph()
}

/// Parses snapshot text in the given format
pub fn parse_snapshot(content: &str, format: Format) -> Result<Snapshot, SnapshotError> {
    parse(content, format, "snapshot")
}

/// Reads a file-group map and resolves its package names against `graph`
pub fn load_groups(path: &Path, graph: &PackageGraph) -> Result<FileGroups, SnapshotError> {
    let content = read(path)?;
    let names: BTreeMap<String, String> =
        parse(&content, Format::from_path(path), &path.display().to_string())?;
    resolve_groups(names, graph)
}

/// Maps package names to ids; every name has to exist in `graph`
pub fn resolve_groups(
    names: BTreeMap<String, String>,
    graph: &PackageGraph,
) -> Result<FileGroups, SnapshotError> {
    names
        .into_iter()
        .map(|(name, group)| Ok((resolve(graph, &name)?, group)))
        .collect()
}

/// Looks up a package by name
pub fn resolve(graph: &PackageGraph, name: &str) -> Result<PackageId, SnapshotError> {
    graph
        .find(name)
        .ok_or_else(|| SnapshotError::UnknownPackage(name.to_string()))
}

fn read(path: &Path) -> Result<String, SnapshotError> {
    fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: serde::de::DeserializeOwned>(
    content: &str,
    format: Format,
    what: &str,
) -> Result<T, SnapshotError> {
    let parse_error = |message: String| SnapshotError::Parse {
        what: what.to_string(),
        message,
    };

    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Detect => match serde_json::from_str(content) {
            Ok(value) => Ok(value),
            Err(_) => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string())),
        },
    }
}
