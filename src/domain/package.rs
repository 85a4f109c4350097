//! Package domain model
//!
//! A package has up to two versions in a transaction: the one currently
//! installed and the candidate chosen upstream by dependency resolution.
//! Which of them the transaction acts on is carried by [`Action`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::version;

/// Dense package identifier, stable for the lifetime of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub u32);

impl PackageId {
    /// Returns the identifier as a slice index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type of a dependency relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepKind {
    Depends,
    PreDepends,
    Conflicts,
    Breaks,
}

impl DepKind {
    /// Returns true for the negative relations
    pub fn is_negative(&self) -> bool {
        matches!(self, DepKind::Conflicts | DepKind::Breaks)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DepKind::Depends => "Depends",
            DepKind::PreDepends => "PreDepends",
            DepKind::Conflicts => "Conflicts",
            DepKind::Breaks => "Breaks",
        }
    }
}

/// How far a pre-dependency target must have progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Needs {
    /// Target only has to be unpacked
    Unpacked,
    /// Target has to be fully configured
    #[default]
    Configured,
}

/// A typed dependency declared by a version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "type")]
    pub kind: DepKind,
    /// Package or capability name
    pub target: String,
    #[serde(default)]
    pub needs: Needs,
}

impl Dependency {
    pub fn depends(target: impl Into<String>) -> Self {
        Self {
            kind: DepKind::Depends,
            target: target.into(),
            needs: Needs::Configured,
        }
    }

    pub fn pre_depends(target: impl Into<String>, needs: Needs) -> Self {
        Self {
            kind: DepKind::PreDepends,
            target: target.into(),
            needs,
        }
    }

    pub fn conflicts(target: impl Into<String>) -> Self {
        Self {
            kind: DepKind::Conflicts,
            target: target.into(),
            needs: Needs::Configured,
        }
    }

    pub fn breaks(target: impl Into<String>) -> Self {
        Self {
            kind: DepKind::Breaks,
            target: target.into(),
            needs: Needs::Configured,
        }
    }
}

/// One version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub depends: Vec<Dependency>,
    #[serde(default)]
    pub provides: Vec<String>,
}

impl VersionInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            depends: Vec::new(),
            provides: Vec::new(),
        }
    }

    pub fn with_depends(mut self, dep: Dependency) -> Self {
        self.depends.push(dep);
        self
    }

    pub fn with_provides(mut self, capability: impl Into<String>) -> Self {
        self.provides.push(capability.into());
        self
    }

    /// Returns true if any declared dependency is a pre-dependency
    pub fn has_pre_depends(&self) -> bool {
        self.depends.iter().any(|d| d.kind == DepKind::PreDepends)
    }
}

/// Which version of a package a relation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Current,
    Candidate,
}

/// Archive priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Required,
    Important,
    Standard,
    #[default]
    Optional,
    Extra,
}

impl Priority {
    /// Higher rank sorts earlier
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Required => 4,
            Priority::Important => 3,
            Priority::Standard => 2,
            Priority::Optional => 1,
            Priority::Extra => 0,
        }
    }
}

/// What the transaction does with a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Keep,
    Install,
    Upgrade,
    Downgrade,
    Reinstall,
    Remove,
}

impl Action {
    /// Returns true if the package takes part in the transaction
    pub fn is_selected(&self) -> bool {
        !matches!(self, Action::Keep)
    }

    /// Returns true if the candidate version gets unpacked and configured
    pub fn installs(&self) -> bool {
        matches!(
            self,
            Action::Install | Action::Upgrade | Action::Downgrade | Action::Reinstall
        )
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Action::Remove)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Keep => "keep",
            Action::Install => "install",
            Action::Upgrade => "upgrade",
            Action::Downgrade => "downgrade",
            Action::Reinstall => "reinstall",
            Action::Remove => "remove",
        }
    }
}

/// Version movement derived from the two slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionChange {
    Keep,
    Install,
    Upgrade,
    Downgrade,
    Reinstall,
    Remove,
}

impl VersionChange {
    /// Higher rank sorts earlier
    pub fn rank(&self) -> u8 {
        match self {
            VersionChange::Remove => 4,
            VersionChange::Upgrade => 3,
            VersionChange::Reinstall | VersionChange::Install => 2,
            VersionChange::Downgrade => 1,
            VersionChange::Keep => 0,
        }
    }
}

/// A package entry of the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    #[serde(skip_deserializing, default = "unassigned_id")]
    pub id: PackageId,
    pub name: String,
    #[serde(default)]
    pub essential: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub current: Option<VersionInfo>,
    #[serde(default)]
    pub candidate: Option<VersionInfo>,
    #[serde(default)]
    pub action: Action,
}

fn unassigned_id() -> PackageId {
    PackageId(u32::MAX)
}

impl Package {
    /// Creates a package with no versions that the transaction keeps
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: unassigned_id(),
            name: name.into(),
            essential: false,
            priority: Priority::default(),
            current: None,
            candidate: None,
            action: Action::Keep,
        }
    }

    /// Creates a package whose candidate version gets installed
    pub fn install(name: impl Into<String>, candidate: VersionInfo) -> Self {
        let mut pkg = Self::new(name);
        pkg.candidate = Some(candidate);
        pkg.action = Action::Install;
        pkg
    }

    /// Creates an installed package marked for removal
    pub fn remove(name: impl Into<String>, current: VersionInfo) -> Self {
        let mut pkg = Self::new(name);
        pkg.current = Some(current);
        pkg.action = Action::Remove;
        pkg
    }

    pub fn essential(mut self) -> Self {
        self.essential = true;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_current(mut self, current: VersionInfo) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Returns the version in the given slot
    pub fn version(&self, slot: Slot) -> Option<&VersionInfo> {
        match slot {
            Slot::Current => self.current.as_ref(),
            Slot::Candidate => self.candidate.as_ref(),
        }
    }

    /// Returns the version the transaction acts on
    pub fn acting_version(&self) -> Option<&VersionInfo> {
        if self.action.is_remove() {
            self.current.as_ref()
        } else {
            self.candidate.as_ref().or(self.current.as_ref())
        }
    }

    /// Classifies the version movement by comparing the two slots
    pub fn change(&self) -> VersionChange {
        match self.action {
            Action::Keep => VersionChange::Keep,
            Action::Remove => VersionChange::Remove,
            _ => match (&self.current, &self.candidate) {
                (None, _) => VersionChange::Install,
                (Some(_), None) => VersionChange::Reinstall,
                (Some(cur), Some(cand)) => match version::compare(&cand.version, &cur.version) {
                    Ordering::Greater => VersionChange::Upgrade,
                    Ordering::Less => VersionChange::Downgrade,
                    Ordering::Equal => VersionChange::Reinstall,
                },
            },
        }
    }
}
