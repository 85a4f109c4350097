//! Deterministic initial iteration order
//!
//! Candidates are ordered by file group first (so packages from the same
//! archive or medium stay together), then by [`Score`]. The sort is stable:
//! candidates equal on every key keep their input order.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::{Package, PackageId};

/// Locality key per package, typically the archive or medium a file came from
pub type FileGroups = HashMap<PackageId, String>;

/// Tie-break keys, compared in field order, larger first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub removal: bool,
    pub essential: bool,
    pub immediate: bool,
    pub pre_depends: bool,
    /// [`crate::domain::Priority::rank`]
    pub priority: u8,
    /// [`crate::domain::VersionChange::rank`]
    pub change: u8,
}

impl Score {
    pub fn of(pkg: &Package, immediate: bool) -> Self {
        Self {
            removal: pkg.action.is_remove(),
            essential: pkg.essential,
            immediate,
            pre_depends: !pkg.action.is_remove()
                && pkg.acting_version().is_some_and(|v| v.has_pre_depends()),
            priority: pkg.priority.rank(),
            change: pkg.change().rank(),
        }
    }

    /// Blended weight, for display only
    pub fn weight(&self) -> u32 {
        let mut weight = 0;
        if self.removal {
            weight += 200;
        }
        if self.essential {
            weight += 100;
        }
        if self.pre_depends {
            weight += 50;
        }
        if self.immediate {
            weight += 10;
        }
        weight + self.priority as u32 + self.change as u32
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.removal
            .cmp(&other.removal)
            .then_with(|| self.essential.cmp(&other.essential))
            .then_with(|| self.immediate.cmp(&other.immediate))
            .then_with(|| self.pre_depends.cmp(&other.pre_depends))
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.change.cmp(&other.change))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Where a candidate stands with respect to file groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "group")]
pub enum Placement<'a> {
    /// Needs no file (removals)
    NoFile,
    File(&'a str),
    /// Should have a file but none was delivered
    Missing,
}

impl Placement<'_> {
    fn rank(&self) -> u8 {
        match self {
            Placement::NoFile => 0,
            Placement::File(_) => 1,
            Placement::Missing => 2,
        }
    }
}

impl Ord for Placement<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Placement::File(a), Placement::File(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Placement<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Full pre-sort key of one candidate
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SortKey<'a> {
    pub id: PackageId,
    /// `None` when no file groups are in use
    pub placement: Option<Placement<'a>>,
    pub score: Score,
}

impl<'a> SortKey<'a> {
    pub fn new(pkg: &Package, immediate: bool, groups: Option<&'a FileGroups>) -> Self {
        let placement = groups.map(|groups| match groups.get(&pkg.id) {
            Some(group) => Placement::File(group.as_str()),
            None if pkg.action.is_remove() => Placement::NoFile,
            None => Placement::Missing,
        });

        Self {
            id: pkg.id,
            placement,
            score: Score::of(pkg, immediate),
        }
    }
}

/// Group first, then higher score first
pub fn compare(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    a.placement
        .cmp(&b.placement)
        .then_with(|| b.score.cmp(&a.score))
}

/// Stable sort of `keys` by [`compare`]
pub fn sort(keys: &mut [SortKey<'_>]) {
    keys.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dependency, Needs, Priority, VersionInfo};

    fn pkg(id: u32, name: &str) -> Package {
        let mut pkg = Package::install(name, VersionInfo::new("1.0"));
        pkg.id = PackageId(id);
        pkg
    }

    fn order(keys: &[SortKey<'_>]) -> Vec<u32> {
        keys.iter().map(|k| k.id.0).collect()
    }

    #[test]
    fn score_keys_in_order() {
        let plain = Score::of(&pkg(0, "a"), false);
        let essential = Score::of(&pkg(1, "b").essential(), false);
        let removal = Score::of(&Package::remove("c", VersionInfo::new("1")), false);

        assert!(removal > essential);
        assert!(essential > plain);
        assert!(Score::of(&pkg(0, "a"), true) > plain);
    }

    #[test]
    fn pre_depends_and_priority_count() {
        let mut with_pre = pkg(0, "a");
        with_pre.candidate = Some(
            VersionInfo::new("1.0").with_depends(Dependency::pre_depends("x", Needs::Configured)),
        );
        let required = pkg(1, "b").with_priority(Priority::Required);

        assert!(Score::of(&with_pre, false) > Score::of(&required, false));
        assert!(Score::of(&required, false) > Score::of(&pkg(2, "c"), false));
    }

    #[test]
    fn weight_blends_keys() {
        let essential = Score::of(&pkg(0, "a").essential(), true);
        // essential + immediate + optional + install
        assert_eq!(essential.weight(), 100 + 10 + 1 + 2);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let pkgs: Vec<_> = (0..4).map(|i| pkg(i, &format!("p{}", i))).collect();
        let mut keys: Vec<_> = pkgs.iter().rev().map(|p| SortKey::new(p, false, None)).collect();

        sort(&mut keys);

        assert_eq!(order(&keys), vec![3, 2, 1, 0]);
    }

    #[test]
    fn groups_come_before_score() {
        let a = pkg(0, "a");
        let b = pkg(1, "b").essential();
        let c = pkg(2, "c");
        let gone = {
            let mut p = Package::remove("d", VersionInfo::new("1"));
            p.id = PackageId(3);
            p
        };
        let groups: FileGroups = [
            (PackageId(0), "cd1".to_string()),
            (PackageId(1), "cd2".to_string()),
        ]
        .into_iter()
        .collect();

        let mut keys: Vec<_> = [&c, &b, &a, &gone]
            .iter()
            .map(|p| SortKey::new(p, false, Some(&groups)))
            .collect();
        sort(&mut keys);

        // removal (no file), cd1, cd2, missing
        assert_eq!(order(&keys), vec![3, 0, 1, 2]);
    }

    #[test]
    fn equal_group_and_score_keep_input_order() {
        let a = pkg(0, "a");
        let b = pkg(1, "b");
        let groups: FileGroups = [
            (PackageId(0), "pool".to_string()),
            (PackageId(1), "pool".to_string()),
        ]
        .into_iter()
        .collect();

        let mut keys = vec![
            SortKey::new(&b, false, Some(&groups)),
            SortKey::new(&a, false, Some(&groups)),
        ];
        sort(&mut keys);

        assert_eq!(order(&keys), vec![1, 0]);
    }
}
