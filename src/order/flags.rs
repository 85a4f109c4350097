//! Per-package ordering state
//!
//! One byte per package. `UNPACKED`, `CONFIGURED` and `REMOVED` form the
//! lifecycle group and are never set together; a package with none of them
//! is "now" (untouched by the transaction so far).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::domain::PackageId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Placement finished
    pub const ADDED: Flags = Flags(1 << 0);
    /// Visit in progress
    pub const ADD_PENDING: Flags = Flags(1 << 1);
    /// Configure right after unpacking
    pub const IMMEDIATE: Flags = Flags(1 << 2);
    /// Member of an unresolved cycle
    pub const LOOP: Flags = Flags(1 << 3);
    pub const UNPACKED: Flags = Flags(1 << 4);
    pub const CONFIGURED: Flags = Flags(1 << 5);
    pub const REMOVED: Flags = Flags(1 << 6);
    /// Present in the output sequence
    pub const IN_LIST: Flags = Flags(1 << 7);

    pub const STATES: Flags = Flags(Self::UNPACKED.0 | Self::CONFIGURED.0 | Self::REMOVED.0);
    /// Cleared by every ordering pass
    pub const PASS: Flags =
        Flags(Self::ADDED.0 | Self::ADD_PENDING.0 | Self::LOOP.0 | Self::IN_LIST.0);
    /// Cleared between independent mode invocations
    pub const TRANSIENT: Flags = Flags(Self::ADD_PENDING.0 | Self::LOOP.0 | Self::IMMEDIATE.0);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn without(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 8] = [
            (Flags::ADDED, "Added"),
            (Flags::ADD_PENDING, "AddPending"),
            (Flags::IMMEDIATE, "Immediate"),
            (Flags::LOOP, "Loop"),
            (Flags::UNPACKED, "UnPacked"),
            (Flags::CONFIGURED, "Configured"),
            (Flags::REMOVED, "Removed"),
            (Flags::IN_LIST, "InList"),
        ];

        let names: Vec<_> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Flags({})", names.join(" | "))
    }
}

/// Lifecycle stage of a package within a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Now,
    UnPacked,
    Configured,
    Removed,
}

impl Lifecycle {
    fn bits(self) -> Flags {
        match self {
            Lifecycle::Now => Flags::NONE,
            Lifecycle::UnPacked => Flags::UNPACKED,
            Lifecycle::Configured => Flags::CONFIGURED,
            Lifecycle::Removed => Flags::REMOVED,
        }
    }
}

/// Dense flag array indexed by package id
#[derive(Debug, Clone)]
pub struct FlagStore {
    flags: Vec<Flags>,
}

impl FlagStore {
    pub fn new(len: usize) -> Self {
        Self {
            flags: vec![Flags::NONE; len],
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, pkg: PackageId) -> Flags {
        self.flags[pkg.index()]
    }

    /// Returns true if every bit of `f` is set for the package
    pub fn is(&self, pkg: PackageId, f: Flags) -> bool {
        self.get(pkg).contains(f)
    }

    pub fn set(&mut self, pkg: PackageId, f: Flags) {
        self.flags[pkg.index()] |= f;
    }

    pub fn clear(&mut self, pkg: PackageId, f: Flags) {
        let slot = &mut self.flags[pkg.index()];
        *slot = slot.without(f);
    }

    /// Clears `mask` and then sets `state`
    pub fn replace(&mut self, pkg: PackageId, state: Flags, mask: Flags) {
        let slot = &mut self.flags[pkg.index()];
        *slot = slot.without(mask) | state;
    }

    pub fn lifecycle(&self, pkg: PackageId) -> Lifecycle {
        let f = self.get(pkg);
        if f.contains(Flags::CONFIGURED) {
            Lifecycle::Configured
        } else if f.contains(Flags::UNPACKED) {
            Lifecycle::UnPacked
        } else if f.contains(Flags::REMOVED) {
            Lifecycle::Removed
        } else {
            Lifecycle::Now
        }
    }

    pub fn set_lifecycle(&mut self, pkg: PackageId, stage: Lifecycle) {
        self.replace(pkg, stage.bits(), Flags::STATES);
    }

    /// Returns true if no lifecycle bit is set
    pub fn is_now(&self, pkg: PackageId) -> bool {
        !self.get(pkg).intersects(Flags::STATES)
    }

    /// Clears `mask` on every package
    pub fn wipe(&mut self, mask: Flags) {
        for f in &mut self.flags {
            *f = f.without(mask);
        }
    }

    /// Iterates over packages having every bit of `f`
    pub fn with(&self, f: Flags) -> impl Iterator<Item = PackageId> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(move |(_, flags)| flags.contains(f))
            .map(|(idx, _)| PackageId(idx as u32))
    }
}
