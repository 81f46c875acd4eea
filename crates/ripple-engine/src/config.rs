use std::collections::HashSet;
use std::path::PathBuf;

use ripple_core::ManifestSnapshot;
use ripple_graph::GroupDefinition;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::options::EngineOptions;

fn default_true() -> bool {
    true
}

/// Planning configuration as written by users, e.g.
///
/// ```toml
/// propagate_to_dependencies = true
/// prerelease_identifier = "beta"
///
/// [[groups]]
/// name = "ui"
/// include = ["packages/ui/*"]
/// exclude = ["packages/ui/playground"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RippleConfig {
    #[serde(default)]
    pub propagate_to_dependencies: bool,
    #[serde(default = "default_true")]
    pub refresh_dependent_ranges: bool,
    #[serde(default)]
    pub escalate_peer_dependents: bool,
    #[serde(default)]
    pub prerelease_identifier: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            propagate_to_dependencies: false,
            refresh_dependent_ranges: true,
            escalate_peer_dependents: false,
            prerelease_identifier: None,
            groups: Vec::new(),
        }
    }
}

impl RippleConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or unknown keys, and
    /// `ConfigError::DuplicateGroup` if two groups share a name.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;

        let mut seen = HashSet::new();
        for group in &config.groups {
            if !seen.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateGroup {
                    name: group.name.clone(),
                });
            }
        }

        Ok(config)
    }

    /// Resolves group globs against the snapshot and produces run options.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Group` if a group pattern does not compile.
    pub fn into_options(
        self,
        snapshot: &ManifestSnapshot,
        workspace_root: impl Into<PathBuf>,
    ) -> Result<EngineOptions, ConfigError> {
        let workspace_root = workspace_root.into();
        let groups = self
            .groups
            .iter()
            .map(|definition| definition.resolve_members(snapshot, &workspace_root))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EngineOptions {
            propagate_to_dependencies: self.propagate_to_dependencies,
            refresh_dependent_ranges: self.refresh_dependent_ranges,
            escalate_peer_dependents: self.escalate_peer_dependents,
            prerelease_identifier: self.prerelease_identifier,
            groups,
            baseline_packages: None,
            workspace_root,
        })
    }
}
