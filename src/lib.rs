//! pkgorder - Install ordering for package transactions
//!
//! Given a snapshot of packages with their dependency relations and the
//! actions a transaction applies to them, pkgorder computes the sequences in
//! which packages are unpacked, configured and removed so that every
//! pre-dependency holds at each step.

pub mod cli;
pub mod domain;
pub mod order;
pub mod storage;

pub use domain::{Package, PackageGraph, PackageId};
pub use order::{Mode, OrderError, OrderList, Planner};
