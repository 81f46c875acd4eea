use std::path::PathBuf;

use indexmap::IndexSet;
use ripple_core::PackageGroup;

/// Knobs for a single planning run.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Escalate dependents of bumped packages by their dependent change type.
    pub propagate_to_dependencies: bool,
    /// Rewrite ranges in dependents that are not bumped themselves.
    pub refresh_dependent_ranges: bool,
    /// Let peer dependency edges escalate, not only receive range rewrites.
    pub escalate_peer_dependents: bool,
    /// Identifier used for new prerelease suffixes, e.g. `beta` in `2.0.0-beta.0`.
    pub prerelease_identifier: Option<String>,
    pub groups: Vec<PackageGroup>,
    /// Packages that existed at the comparison baseline. Bumped packages
    /// outside it are flagged as new.
    pub baseline_packages: Option<IndexSet<String>>,
    /// Passed through to the plan untouched.
    pub workspace_root: PathBuf,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            propagate_to_dependencies: false,
            refresh_dependent_ranges: true,
            escalate_peer_dependents: false,
            prerelease_identifier: None,
            groups: Vec::new(),
            baseline_packages: None,
            workspace_root: PathBuf::new(),
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn with_propagation(mut self, propagate: bool) -> Self {
        self.propagate_to_dependencies = propagate;
        self
    }

    #[must_use]
    pub fn with_range_refresh(mut self, refresh: bool) -> Self {
        self.refresh_dependent_ranges = refresh;
        self
    }

    #[must_use]
    pub fn with_peer_escalation(mut self, escalate: bool) -> Self {
        self.escalate_peer_dependents = escalate;
        self
    }

    #[must_use]
    pub fn with_prerelease_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.prerelease_identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: PackageGroup) -> Self {
        self.groups.push(group);
        self
    }

    #[must_use]
    pub fn with_baseline_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baseline_packages = Some(packages.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }
}
