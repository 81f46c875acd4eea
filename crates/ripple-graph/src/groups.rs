use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use indexmap::{IndexMap, IndexSet};
use ripple_core::{ManifestSnapshot, PackageGroup};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::GroupError;

/// A release group as configured: membership by glob over package paths
/// relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDefinition {
    pub name: String,
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl GroupDefinition {
    /// Matches the include and exclude patterns against every package path.
    ///
    /// `*` does not cross path separators, so `packages/*` matches
    /// `packages/a` but not `packages/a/b`.
    ///
    /// # Errors
    ///
    /// Returns `GroupError::GlobPattern` if a pattern does not compile.
    pub fn resolve_members(
        &self,
        snapshot: &ManifestSnapshot,
        workspace_root: &Path,
    ) -> Result<PackageGroup, GroupError> {
        let include = self.build_glob_set(&self.include)?;
        let exclude = self.build_glob_set(&self.exclude)?;

        let members: IndexSet<String> = snapshot
            .iter()
            .filter(|package| {
                let relative = package
                    .path
                    .strip_prefix(workspace_root)
                    .unwrap_or(&package.path);
                include.is_match(relative) && !exclude.is_match(relative)
            })
            .map(|package| package.name.clone())
            .collect();

        debug!(group = %self.name, members = members.len(), "resolved group members");

        Ok(PackageGroup {
            name: self.name.clone(),
            members,
        })
    }

    fn build_glob_set(&self, patterns: &[String]) -> Result<GlobSet, GroupError> {
        let glob_error = |pattern: String, source| GroupError::GlobPattern {
            group: self.name.clone(),
            pattern,
            source,
        };

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let trimmed = pattern.trim_start_matches("./");
            let glob = GlobBuilder::new(trimmed)
                .literal_separator(true)
                .build()
                .map_err(|source| glob_error(pattern.clone(), source))?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|source| glob_error(patterns.join(", "), source))
    }
}

/// A package claimed by more than one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMembership {
    pub package: String,
    pub groups: Vec<String>,
}

/// Package-to-group assignment.
///
/// Packages outside the snapshot are dropped from every group. A package
/// listed by several groups is reported in [`GroupIndex::conflicts`] and
/// removed from all of them rather than assigned to one arbitrarily.
/// Groups sharing a name are one group: their members are unioned at the
/// position of the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    groups: Vec<PackageGroup>,
    by_package: IndexMap<String, usize>,
    conflicts: Vec<AmbiguousMembership>,
}

impl GroupIndex {
    #[must_use]
    pub fn resolve(groups: &[PackageGroup], snapshot: &ManifestSnapshot) -> Self {
        let groups = merge_by_name(groups);
        let mut claims: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for group in &groups {
            for member in group.members.iter().filter(|m| snapshot.contains(m)) {
                claims.entry(member.as_str()).or_default().push(&group.name);
            }
        }

        let conflicts: Vec<AmbiguousMembership> = claims
            .iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(package, names)| AmbiguousMembership {
                package: (*package).to_string(),
                groups: names.iter().map(|n| (*n).to_string()).collect(),
            })
            .collect();

        for conflict in &conflicts {
            warn!(
                package = %conflict.package,
                groups = %conflict.groups.join(", "),
                "package belongs to more than one group; excluded from group sync"
            );
        }

        let mut resolved = Vec::with_capacity(groups.len());
        let mut by_package = IndexMap::new();
        for group in &groups {
            let members: IndexSet<String> = group
                .members
                .iter()
                .filter(|m| claims.get(m.as_str()).is_some_and(|names| names.len() == 1))
                .cloned()
                .collect();
            for member in &members {
                by_package.insert(member.clone(), resolved.len());
            }
            resolved.push(PackageGroup {
                name: group.name.clone(),
                members,
            });
        }

        Self {
            groups: resolved,
            by_package,
            conflicts,
        }
    }

    #[must_use]
    pub fn group_of(&self, package: &str) -> Option<&PackageGroup> {
        self.by_package.get(package).map(|&index| &self.groups[index])
    }

    /// Groups in configuration order, restricted to unambiguous snapshot members.
    #[must_use]
    pub fn groups(&self) -> &[PackageGroup] {
        &self.groups
    }

    #[must_use]
    pub fn conflicts(&self) -> &[AmbiguousMembership] {
        &self.conflicts
    }
}

fn merge_by_name(groups: &[PackageGroup]) -> Vec<PackageGroup> {
    let mut merged: IndexMap<&str, PackageGroup> = IndexMap::with_capacity(groups.len());
    for group in groups {
        match merged.get_mut(group.name.as_str()) {
            Some(existing) => {
                debug!(group = %group.name, "merging repeated group definition");
                existing.members.extend(group.members.iter().cloned());
            }
            None => {
                merged.insert(&group.name, group.clone());
            }
        }
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::PackageInfo;

    fn make_package(name: &str, path: &str) -> PackageInfo {
        PackageInfo::new(name, "1.0.0", path)
    }

    fn snapshot() -> ManifestSnapshot {
        ManifestSnapshot::from_packages([
            make_package("pkg-1", "/repo/packages/grp/1"),
            make_package("pkg-2", "/repo/packages/grp/2"),
            make_package("commonlib", "/repo/packages/commonlib"),
            make_package("unrelated", "/repo/unrelated/pkg-4"),
        ])
    }

    fn definition(include: &[&str], exclude: &[&str]) -> GroupDefinition {
        GroupDefinition {
            name: "grp".to_string(),
            include: include.iter().map(ToString::to_string).collect(),
            exclude: exclude.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn resolve_members_matches_relative_paths() {
        let group = definition(&["packages/grp/*"], &[])
            .resolve_members(&snapshot(), Path::new("/repo"))
            .expect("valid globs");

        let members: Vec<_> = group.members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["pkg-1", "pkg-2"]);
    }

    #[test]
    fn resolve_members_star_does_not_cross_directories() {
        let group = definition(&["packages/*"], &[])
            .resolve_members(&snapshot(), Path::new("/repo"))
            .expect("valid globs");

        let members: Vec<_> = group.members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["commonlib"]);
    }

    #[test]
    fn resolve_members_applies_exclude() {
        let group = definition(&["packages/**"], &["packages/grp/2"])
            .resolve_members(&snapshot(), Path::new("/repo"))
            .expect("valid globs");

        assert!(group.contains("pkg-1"));
        assert!(!group.contains("pkg-2"));
        assert!(group.contains("commonlib"));
        assert!(!group.contains("unrelated"));
    }

    #[test]
    fn resolve_members_accepts_dot_slash_prefix() {
        let group = definition(&["./unrelated/*"], &[])
            .resolve_members(&snapshot(), Path::new("/repo"))
            .expect("valid globs");

        assert!(group.contains("unrelated"));
    }

    #[test]
    fn resolve_members_reports_bad_pattern() {
        let err = definition(&["packages/[grp"], &[])
            .resolve_members(&snapshot(), Path::new("/repo"))
            .expect_err("pattern should not compile");

        let msg = err.to_string();
        assert!(msg.contains("packages/[grp"));
        assert!(msg.contains("grp"));
    }

    #[test]
    fn group_definition_deserializes_from_toml() {
        let toml = r#"
name = "grp"
include = ["packages/grp/*"]
"#;

        let parsed: GroupDefinition = toml::from_str(toml).expect("should parse");

        assert_eq!(parsed.name, "grp");
        assert!(parsed.exclude.is_empty());
    }

    #[test]
    fn resolve_assigns_each_member_its_group() {
        let groups = [
            PackageGroup::new("grp", ["pkg-1", "pkg-2"]),
            PackageGroup::new("solo", ["commonlib"]),
        ];

        let index = GroupIndex::resolve(&groups, &snapshot());

        assert_eq!(index.group_of("pkg-2").map(|g| g.name.as_str()), Some("grp"));
        assert_eq!(index.group_of("commonlib").map(|g| g.name.as_str()), Some("solo"));
        assert!(index.group_of("unrelated").is_none());
        assert!(index.conflicts().is_empty());
    }

    #[test]
    fn resolve_drops_members_missing_from_snapshot() {
        let groups = [PackageGroup::new("grp", ["pkg-1", "ghost"])];

        let index = GroupIndex::resolve(&groups, &snapshot());

        let members: Vec<_> = index.groups()[0].members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["pkg-1"]);
    }

    #[test]
    fn resolve_reports_overlapping_membership() {
        let groups = [
            PackageGroup::new("first", ["pkg-1", "pkg-2"]),
            PackageGroup::new("second", ["pkg-2", "commonlib"]),
        ];

        let index = GroupIndex::resolve(&groups, &snapshot());

        assert_eq!(
            index.conflicts(),
            &[AmbiguousMembership {
                package: "pkg-2".to_string(),
                groups: vec!["first".to_string(), "second".to_string()],
            }]
        );
        assert!(index.group_of("pkg-2").is_none());
        assert!(!index.groups()[0].contains("pkg-2"));
        assert!(!index.groups()[1].contains("pkg-2"));
        assert_eq!(index.group_of("pkg-1").map(|g| g.name.as_str()), Some("first"));
    }

    #[test]
    fn resolve_merges_groups_sharing_a_name() {
        let groups = [
            PackageGroup::new("grp", ["pkg-1", "pkg-2"]),
            PackageGroup::new("solo", ["commonlib"]),
            PackageGroup::new("grp", ["pkg-2", "unrelated"]),
        ];

        let index = GroupIndex::resolve(&groups, &snapshot());

        assert!(index.conflicts().is_empty());
        assert_eq!(index.groups().len(), 2);
        assert_eq!(index.group_of("pkg-2").map(|g| g.name.as_str()), Some("grp"));
        assert_eq!(index.group_of("unrelated").map(|g| g.name.as_str()), Some("grp"));
        let members: Vec<_> = index.groups()[0].members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["pkg-1", "pkg-2", "unrelated"]);
    }
}
