//! Domain models for pkgorder
//!
//! The package graph snapshot the ordering engine reads. Contains no I/O.

mod graph;
mod package;
pub mod version;

pub use graph::{DepEdge, GraphError, PackageGraph, Relation};
pub use package::{
    Action, DepKind, Dependency, Needs, Package, PackageId, Priority, Slot, VersionChange,
    VersionInfo,
};
