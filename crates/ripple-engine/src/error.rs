use ripple_graph::GroupError;
use ripple_version::VersionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse ripple configuration")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("group '{name}' is defined more than once")]
    DuplicateGroup { name: String },
}

/// A per-package problem collected while planning. The rest of the plan is
/// still computed.
#[derive(Debug, Error)]
pub enum PlanFailure {
    #[error("failed to compute new version for '{package}'")]
    VersionParse {
        package: String,
        #[source]
        source: VersionError,
    },

    #[error("package '{package}' belongs to more than one group: {}", groups.join(", "))]
    AmbiguousGroupMembership { package: String, groups: Vec<String> },
}

impl PlanFailure {
    #[must_use]
    pub fn package(&self) -> &str {
        match self {
            Self::VersionParse { package, .. } | Self::AmbiguousGroupMembership { package, .. } => {
                package
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_membership_lists_groups() {
        let err = PlanFailure::AmbiguousGroupMembership {
            package: "pkg-2".to_string(),
            groups: vec!["first".to_string(), "second".to_string()],
        };

        let msg = err.to_string();

        assert!(msg.contains("pkg-2"));
        assert!(msg.contains("first, second"));
        assert_eq!(err.package(), "pkg-2");
    }

    #[test]
    fn duplicate_group_error_includes_name() {
        let err = ConfigError::DuplicateGroup {
            name: "grp".to_string(),
        };

        assert!(err.to_string().contains("'grp'"));
    }
}
