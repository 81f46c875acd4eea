use std::path::PathBuf;

use indexmap::IndexMap;
use ripple_core::{ChangeType, DependencyKind};

use crate::error::PlanFailure;

/// A dependency range in a dependent's manifest that must change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRewrite {
    pub dependency: String,
    pub kind: DependencyKind,
    pub old_range: String,
    pub new_range: String,
}

/// The planned outcome for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpDecision {
    pub name: String,
    pub change_type: ChangeType,
    pub current_version: String,
    /// Equal to `current_version` when the package only receives range rewrites.
    pub new_version: String,
    pub range_rewrites: Vec<RangeRewrite>,
    /// Bumped without a change record of its own.
    pub is_newly_modified: bool,
    /// Bumped and absent from the baseline package set.
    pub is_new_package: bool,
}

impl BumpDecision {
    #[must_use]
    pub fn is_bumped(&self) -> bool {
        !self.change_type.is_none()
    }

    /// The rewritten range for `dependency` under `kind`, if it changes.
    #[must_use]
    pub fn range_for(&self, kind: DependencyKind, dependency: &str) -> Option<&str> {
        self.range_rewrites
            .iter()
            .find(|r| r.kind == kind && r.dependency == dependency)
            .map(|r| r.new_range.as_str())
    }
}

/// Result of planning: decisions for every package whose manifest changes,
/// plus the per-package failures that did not stop the run.
#[derive(Debug)]
pub struct BumpPlan {
    pub workspace_root: PathBuf,
    /// Keyed by package name, in snapshot order.
    pub decisions: IndexMap<String, BumpDecision>,
    pub failures: Vec<PlanFailure>,
    /// Packages named by change records but absent from the snapshot.
    pub unknown_packages: Vec<String>,
}

impl BumpPlan {
    #[must_use]
    pub fn decision(&self, name: &str) -> Option<&BumpDecision> {
        self.decisions.get(name)
    }

    /// Decisions that carry a version bump.
    pub fn modified_packages(&self) -> impl Iterator<Item = &BumpDecision> {
        self.decisions.values().filter(|d| d.is_bumped())
    }

    /// The new version of `name`, if it is bumped.
    #[must_use]
    pub fn new_version(&self, name: &str) -> Option<&str> {
        self.decision(name)
            .filter(|d| d.is_bumped())
            .map(|d| d.new_version.as_str())
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
