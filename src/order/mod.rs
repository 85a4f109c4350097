//! # Ordering Engine
//!
//! Computes the sequence in which a transaction's packages are handled.
//!
//! ## Modes
//!
//! | Mode | Candidates | Constraints honoured |
//! |------|------------|----------------------|
//! | `critical` | selected packages | conflicts, essential pre-dependencies |
//! | `unpack` | selected packages | pre-dependencies, dependencies, removals |
//! | `configure` | installing packages | dependencies on configured packages |
//!
//! ## Traversal
//!
//! Each candidate is visited depth first. A package is placed once everything
//! it needs ahead of it is placed. Running back into a package that is still
//! being visited is a loop: the closing edge goes into the [`LoopRecord`], the
//! packages on the cycle are flagged `Loop`, and the pass continues with the
//! remaining candidates before failing with [`OrderError::CycleUnresolved`].
//!
//! ## Key Types
//!
//! - [`OrderList`] - Flag store, output sequence and the `order_*` entry points
//! - [`Planner`] - Runs all three modes and breaks unpack loops
//! - [`Policy`] - Which dependency edges constrain a mode

mod error;
mod flags;
mod list;
mod loops;
mod planner;
mod policy;
mod presort;
mod visit;

pub use error::OrderError;
pub use flags::{FlagStore, Flags, Lifecycle};
pub use list::{OrderConfig, OrderList, DEFAULT_MAX_DEPTH};
pub use loops::{LoopEdge, LoopRecord, DEFAULT_LOOP_CAPACITY};
pub use planner::{Planner, PlannerConfig, TransactionPlan};
pub use policy::{Mode, Policy, PolicySet, Strength};
pub use presort::{FileGroups, Placement, Score, SortKey};
