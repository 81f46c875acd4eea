use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Magnitude of a version bump.
///
/// Variants are declared in lattice order, so the derived `Ord` is the merge
/// order: first by [`ChangeType::rank`], then a pre-variant below the stable
/// variant of the same rank. `prerelease` sits below `prepatch` at rank 1.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    #[default]
    None,
    Prerelease,
    Prepatch,
    Patch,
    Preminor,
    Minor,
    Premajor,
    Major,
}

impl ChangeType {
    /// Ordinal used for propagation: none 0, patch 1, minor 2, major 3.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Prerelease | Self::Prepatch | Self::Patch => 1,
            Self::Preminor | Self::Minor => 2,
            Self::Premajor | Self::Major => 3,
        }
    }

    #[must_use]
    pub const fn is_prerelease(self) -> bool {
        matches!(
            self,
            Self::Prerelease | Self::Prepatch | Self::Preminor | Self::Premajor
        )
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Lattice join of two change types.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Joins every change type in `types`, `None` for an empty input.
    #[must_use]
    pub fn merge_all(types: impl IntoIterator<Item = Self>) -> Self {
        types.into_iter().fold(Self::None, Self::merge)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Prerelease => "prerelease",
            Self::Prepatch => "prepatch",
            Self::Patch => "patch",
            Self::Preminor => "preminor",
            Self::Minor => "minor",
            Self::Premajor => "premajor",
            Self::Major => "major",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ChangeType; 8] = [
        ChangeType::None,
        ChangeType::Prerelease,
        ChangeType::Prepatch,
        ChangeType::Patch,
        ChangeType::Preminor,
        ChangeType::Minor,
        ChangeType::Premajor,
        ChangeType::Major,
    ];

    #[test]
    fn ordering_follows_base_levels() {
        assert!(ChangeType::None < ChangeType::Patch);
        assert!(ChangeType::Patch < ChangeType::Minor);
        assert!(ChangeType::Minor < ChangeType::Major);
    }

    #[test]
    fn pre_variants_share_rank_with_base_level() {
        assert_eq!(ChangeType::Premajor.rank(), ChangeType::Major.rank());
        assert_eq!(ChangeType::Preminor.rank(), ChangeType::Minor.rank());
        assert_eq!(ChangeType::Prepatch.rank(), ChangeType::Patch.rank());
        assert_eq!(ChangeType::Prerelease.rank(), ChangeType::Patch.rank());
    }

    #[test]
    fn pre_variant_never_outranks_lower_stable_level() {
        assert!(ChangeType::Preminor > ChangeType::Patch);
        assert!(ChangeType::Premajor > ChangeType::Minor);
        assert!(ChangeType::Prepatch < ChangeType::Patch);
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a.merge(b), b.merge(a));
                for c in ALL {
                    assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
                }
            }
        }
    }

    #[test]
    fn merge_never_decreases_rank() {
        for a in ALL {
            for b in ALL {
                assert!(a.merge(b).rank() >= a.rank());
            }
        }
    }

    #[test]
    fn merge_all_of_empty_is_none() {
        assert_eq!(ChangeType::merge_all([]), ChangeType::None);
        assert_eq!(
            ChangeType::merge_all([ChangeType::Patch, ChangeType::Minor, ChangeType::Patch]),
            ChangeType::Minor
        );
    }

    #[test]
    fn is_prerelease_only_for_pre_variants() {
        let pre: Vec<_> = ALL.into_iter().filter(|t| t.is_prerelease()).collect();
        assert_eq!(
            pre,
            vec![
                ChangeType::Prerelease,
                ChangeType::Prepatch,
                ChangeType::Preminor,
                ChangeType::Premajor
            ]
        );
    }

    #[test]
    fn deserializes_lowercase_names() {
        let parsed: ChangeType = serde_json::from_str("\"preminor\"").expect("valid change type");
        assert_eq!(parsed, ChangeType::Preminor);
        assert_eq!(parsed.to_string(), "preminor");
    }
}
