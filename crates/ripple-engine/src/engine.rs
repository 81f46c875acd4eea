use indexmap::{IndexMap, IndexSet};
use ripple_core::{ChangeRecord, ChangeType, DependencyKind, ManifestSnapshot, PackageInfo};
use ripple_graph::{DependentIndex, GroupIndex};
use ripple_version::{next_version, parse_version, rewrite_range};
use semver::Version;
use tracing::{debug, trace, warn};

use crate::error::PlanFailure;
use crate::options::EngineOptions;
use crate::plan::{BumpDecision, BumpPlan, RangeRewrite};

/// Mutable state of one planning run. Every field only grows.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkingState {
    change_types: IndexMap<String, ChangeType>,
    /// Change type a package hands on to its dependents.
    dependent_change_types: IndexMap<String, ChangeType>,
    modified: IndexSet<String>,
    /// Packages with at least one change record of their own.
    recorded: IndexSet<String>,
}

impl WorkingState {
    fn new(snapshot: &ManifestSnapshot) -> Self {
        let none_for_all = || {
            snapshot
                .names()
                .map(|name| (name.to_string(), ChangeType::None))
                .collect::<IndexMap<_, _>>()
        };
        Self {
            change_types: none_for_all(),
            dependent_change_types: none_for_all(),
            modified: IndexSet::new(),
            recorded: IndexSet::new(),
        }
    }

    fn change_type(&self, package: &str) -> ChangeType {
        self.change_types.get(package).copied().unwrap_or_default()
    }

    fn dependent_change_type(&self, package: &str) -> ChangeType {
        self.dependent_change_types
            .get(package)
            .copied()
            .unwrap_or_default()
    }

    /// Joins `change_type` and `dependent_change_type` into `package`.
    /// Returns whether anything grew.
    fn escalate(
        &mut self,
        package: &str,
        change_type: ChangeType,
        dependent_change_type: ChangeType,
    ) -> bool {
        let (Some(current), Some(carried)) = (
            self.change_types.get_mut(package),
            self.dependent_change_types.get_mut(package),
        ) else {
            return false;
        };

        let mut changed = false;

        let next = current.merge(change_type);
        if next > *current {
            trace!(package, from = %current, to = %next, "escalated change type");
            *current = next;
            changed = true;
        }

        let next_carried = carried.merge(dependent_change_type);
        if next_carried > *carried {
            *carried = next_carried;
            changed = true;
        }

        if !next.is_none() && self.modified.insert(package.to_string()) {
            changed = true;
        }

        changed
    }
}

/// Plans versions for one snapshot under fixed options.
///
/// The dependent index and group assignment are built once; [`BumpEngine::plan`]
/// can be called for any number of change record sets.
pub struct BumpEngine<'a> {
    snapshot: &'a ManifestSnapshot,
    options: &'a EngineOptions,
    dependents: DependentIndex,
    groups: GroupIndex,
}

impl<'a> BumpEngine<'a> {
    #[must_use]
    pub fn new(snapshot: &'a ManifestSnapshot, options: &'a EngineOptions) -> Self {
        Self {
            snapshot,
            options,
            dependents: DependentIndex::build(snapshot),
            groups: GroupIndex::resolve(&options.groups, snapshot),
        }
    }

    #[must_use]
    pub fn plan(&self, records: &[ChangeRecord]) -> BumpPlan {
        let mut state = WorkingState::new(self.snapshot);
        let unknown_packages = Self::seed(&mut state, records);
        self.run_to_fixpoint(&mut state);
        self.finalize(&state, unknown_packages)
    }

    fn seed(state: &mut WorkingState, records: &[ChangeRecord]) -> Vec<String> {
        let mut unknown = IndexSet::new();

        for record in records {
            let name = record.package_name.as_str();
            if !state.change_types.contains_key(name) {
                debug!(package = name, "dropping change record for unknown package");
                unknown.insert(name.to_string());
                continue;
            }
            state.recorded.insert(name.to_string());
            state.escalate(name, record.change_type, record.dependent_change_type);
        }

        debug!(
            records = records.len(),
            seeded = state.modified.len(),
            unknown = unknown.len(),
            "seeded change types"
        );

        unknown.into_iter().collect()
    }

    fn run_to_fixpoint(&self, state: &mut WorkingState) {
        let mut passes = 0_usize;
        loop {
            passes += 1;
            if !self.run_pass(state) {
                break;
            }
        }
        debug!(passes, modified = state.modified.len(), "reached fixpoint");
    }

    /// One propagation pass followed by one group pass.
    fn run_pass(&self, state: &mut WorkingState) -> bool {
        let mut changed = false;
        if self.options.propagate_to_dependencies {
            changed |= self.propagate(state);
        }
        changed |= self.sync_groups(state);
        changed
    }

    fn propagate(&self, state: &mut WorkingState) -> bool {
        let sources: Vec<&str> = self
            .snapshot
            .names()
            .filter(|name| state.modified.contains(*name))
            .collect();

        let mut changed = false;
        for source in sources {
            let carried = state.dependent_change_type(source);
            if carried.is_none() {
                continue;
            }
            for dependent in self.dependents.dependents_of(source) {
                if !self.escalates_through(dependent.kind) {
                    continue;
                }
                changed |= state.escalate(&dependent.name, carried, carried);
            }
        }
        changed
    }

    fn escalates_through(&self, kind: DependencyKind) -> bool {
        kind != DependencyKind::Peer || self.options.escalate_peer_dependents
    }

    fn sync_groups(&self, state: &mut WorkingState) -> bool {
        let mut changed = false;
        for group in self.groups.groups() {
            let group_type =
                ChangeType::merge_all(group.members.iter().map(|m| state.change_type(m)));
            if group_type.is_none() {
                continue;
            }
            let group_dependent_type = ChangeType::merge_all(
                group.members.iter().map(|m| state.dependent_change_type(m)),
            );
            for member in &group.members {
                changed |= state.escalate(member, group_type, group_dependent_type);
            }
        }
        changed
    }

    fn finalize(&self, state: &WorkingState, unknown_packages: Vec<String>) -> BumpPlan {
        let mut failures: Vec<PlanFailure> = self
            .groups
            .conflicts()
            .iter()
            .map(|conflict| PlanFailure::AmbiguousGroupMembership {
                package: conflict.package.clone(),
                groups: conflict.groups.clone(),
            })
            .collect();

        let identifier = self.options.prerelease_identifier.as_deref();
        let mut new_versions: IndexMap<&str, Version> = IndexMap::new();
        for package in self.snapshot.iter() {
            let change_type = state.change_type(&package.name);
            if change_type.is_none() {
                continue;
            }
            let result = parse_version(&package.version)
                .and_then(|current| next_version(&current, change_type, identifier));
            match result {
                Ok(version) => {
                    debug!(
                        package = %package.name,
                        from = %package.version,
                        to = %version,
                        change_type = %change_type,
                        "planned version"
                    );
                    new_versions.insert(&package.name, version);
                }
                Err(source) => {
                    warn!(
                        package = %package.name,
                        error = %source,
                        "skipping package with unusable version"
                    );
                    failures.push(PlanFailure::VersionParse {
                        package: package.name.clone(),
                        source,
                    });
                }
            }
        }

        let mut decisions = IndexMap::new();
        for package in self.snapshot.iter() {
            let change_type = state.change_type(&package.name);
            let new_version = new_versions.get(package.name.as_str());
            let bumped = new_version.is_some();

            if !change_type.is_none() && !bumped {
                continue;
            }
            if !bumped && !self.options.refresh_dependent_ranges {
                continue;
            }

            let range_rewrites = Self::range_rewrites(package, &new_versions);
            if !bumped && range_rewrites.is_empty() {
                continue;
            }

            let decision = BumpDecision {
                name: package.name.clone(),
                change_type,
                current_version: package.version.clone(),
                new_version: new_version
                    .map_or_else(|| package.version.clone(), ToString::to_string),
                range_rewrites,
                is_newly_modified: bumped && !state.recorded.contains(&package.name),
                is_new_package: bumped
                    && self
                        .options
                        .baseline_packages
                        .as_ref()
                        .is_some_and(|baseline| !baseline.contains(&package.name)),
            };
            decisions.insert(package.name.clone(), decision);
        }

        BumpPlan {
            workspace_root: self.options.workspace_root.clone(),
            decisions,
            failures,
            unknown_packages,
        }
    }

    fn range_rewrites(
        package: &PackageInfo,
        new_versions: &IndexMap<&str, Version>,
    ) -> Vec<RangeRewrite> {
        let mut rewrites = Vec::new();
        for kind in DependencyKind::ALL {
            for (dependency, old_range) in package.dependencies(kind) {
                if dependency == &package.name {
                    continue;
                }
                let Some(version) = new_versions.get(dependency.as_str()) else {
                    continue;
                };
                let new_range = rewrite_range(old_range, version);
                if new_range == *old_range {
                    continue;
                }
                rewrites.push(RangeRewrite {
                    dependency: dependency.clone(),
                    kind,
                    old_range: old_range.clone(),
                    new_range,
                });
            }
        }
        rewrites
    }
}

/// Plans a single run: builds an engine for `snapshot` and applies `records`.
#[must_use]
pub fn plan_bumps(
    snapshot: &ManifestSnapshot,
    records: &[ChangeRecord],
    options: &EngineOptions,
) -> BumpPlan {
    BumpEngine::new(snapshot, options).plan(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::PackageGroup;

    fn make_package(name: &str) -> PackageInfo {
        PackageInfo::new(name, "1.0.0", format!("packages/{name}"))
    }

    fn diamond() -> ManifestSnapshot {
        ManifestSnapshot::from_packages([
            make_package("base"),
            make_package("left").with_dependency(DependencyKind::Runtime, "base", "^1.0.0"),
            make_package("right").with_dependency(DependencyKind::Dev, "base", "1.0.0"),
            make_package("top")
                .with_dependency(DependencyKind::Runtime, "left", "^1.0.0")
                .with_dependency(DependencyKind::Runtime, "right", "^1.0.0"),
            make_package("island"),
        ])
    }

    fn state_at_fixpoint(
        engine: &BumpEngine<'_>,
        snapshot: &ManifestSnapshot,
        records: &[ChangeRecord],
    ) -> WorkingState {
        let mut state = WorkingState::new(snapshot);
        BumpEngine::seed(&mut state, records);
        engine.run_to_fixpoint(&mut state);
        state
    }

    #[test]
    fn seed_merges_records_for_same_package() {
        let snapshot = diamond();
        let mut state = WorkingState::new(&snapshot);
        let records = [
            ChangeRecord::new("base", ChangeType::Patch)
                .with_dependent_change_type(ChangeType::Minor),
            ChangeRecord::new("base", ChangeType::Major)
                .with_dependent_change_type(ChangeType::Patch),
        ];

        BumpEngine::seed(&mut state, &records);

        assert_eq!(state.change_type("base"), ChangeType::Major);
        assert_eq!(state.dependent_change_type("base"), ChangeType::Minor);
        assert!(state.modified.contains("base"));
    }

    #[test]
    fn seed_reports_unknown_packages_once() {
        let snapshot = diamond();
        let mut state = WorkingState::new(&snapshot);
        let records = [
            ChangeRecord::new("ghost", ChangeType::Patch),
            ChangeRecord::new("ghost", ChangeType::Minor),
        ];

        let unknown = BumpEngine::seed(&mut state, &records);

        assert_eq!(unknown, vec!["ghost"]);
        assert!(state.modified.is_empty());
        assert!(!state.change_types.contains_key("ghost"));
    }

    #[test]
    fn seed_with_none_change_type_does_not_mark_modified() {
        let snapshot = diamond();
        let mut state = WorkingState::new(&snapshot);

        BumpEngine::seed(&mut state, &[ChangeRecord::new("base", ChangeType::None)]);

        assert!(state.modified.is_empty());
        assert!(state.recorded.contains("base"));
    }

    #[test]
    fn escalate_never_lowers_change_type() {
        let snapshot = diamond();
        let mut state = WorkingState::new(&snapshot);
        state.escalate("base", ChangeType::Major, ChangeType::Patch);

        let changed = state.escalate("base", ChangeType::Patch, ChangeType::None);

        assert!(!changed);
        assert_eq!(state.change_type("base"), ChangeType::Major);
        assert_eq!(state.dependent_change_type("base"), ChangeType::Patch);
    }

    #[test]
    fn pass_after_fixpoint_changes_nothing() {
        let snapshot = diamond();
        let options = EngineOptions::default()
            .with_propagation(true)
            .with_group(PackageGroup::new("sides", ["left", "right", "island"]));
        let engine = BumpEngine::new(&snapshot, &options);
        let records = [ChangeRecord::new("base", ChangeType::Minor)];
        let mut state = state_at_fixpoint(&engine, &snapshot, &records);
        let before = state.clone();

        let changed = engine.run_pass(&mut state);

        assert!(!changed);
        assert_eq!(state, before);
    }

    #[test]
    fn fixpoint_reaches_transitive_dependents() {
        let snapshot = diamond();
        let options = EngineOptions::default().with_propagation(true);
        let engine = BumpEngine::new(&snapshot, &options);
        let records = [ChangeRecord::new("base", ChangeType::Major)];

        let state = state_at_fixpoint(&engine, &snapshot, &records);

        assert_eq!(state.change_type("base"), ChangeType::Major);
        assert_eq!(state.change_type("left"), ChangeType::Patch);
        assert_eq!(state.change_type("right"), ChangeType::Patch);
        assert_eq!(state.change_type("top"), ChangeType::Patch);
        assert_eq!(state.change_type("island"), ChangeType::None);
    }

    #[test]
    fn fixpoint_terminates_on_dependency_cycle() {
        let snapshot = ManifestSnapshot::from_packages([
            make_package("a").with_dependency(DependencyKind::Runtime, "b", "1.0.0"),
            make_package("b").with_dependency(DependencyKind::Runtime, "a", "1.0.0"),
        ]);
        let options = EngineOptions::default().with_propagation(true);
        let engine = BumpEngine::new(&snapshot, &options);
        let records = [ChangeRecord::new("a", ChangeType::Minor)
            .with_dependent_change_type(ChangeType::Major)];

        let state = state_at_fixpoint(&engine, &snapshot, &records);

        assert_eq!(state.change_type("a"), ChangeType::Major);
        assert_eq!(state.change_type("b"), ChangeType::Major);
    }

    #[test]
    fn dependent_change_type_none_stops_propagation() {
        let snapshot = diamond();
        let options = EngineOptions::default().with_propagation(true);
        let engine = BumpEngine::new(&snapshot, &options);
        let records = [ChangeRecord::new("base", ChangeType::Major)
            .with_dependent_change_type(ChangeType::None)];

        let state = state_at_fixpoint(&engine, &snapshot, &records);

        assert_eq!(state.modified.len(), 1);
        assert_eq!(state.change_type("left"), ChangeType::None);
    }
}
