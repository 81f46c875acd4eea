use ripple_core::ChangeType;
use semver::{BuildMetadata, Prerelease, Version};

use crate::error::VersionError;

/// Parses a manifest version string.
///
/// # Errors
///
/// Returns `VersionError::InvalidVersion` if `input` is not a semantic version.
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    Version::parse(input.trim()).map_err(|source| VersionError::InvalidVersion {
        version: input.to_string(),
        source,
    })
}

#[derive(Clone, Copy)]
enum Level {
    Major,
    Minor,
    Patch,
}

/// Computes the version that follows `version` for the given change type.
///
/// Pre-variants bump the base level and then append `<identifier>.0`, or
/// just `0` when no identifier is configured. `prerelease` on a version that
/// already has a prerelease suffix only increments its last numeric part.
///
/// # Errors
///
/// Returns `VersionError::InvalidPrerelease` if the identifier does not form a
/// valid prerelease suffix, and `VersionError::Overflow` if a numeric
/// component cannot be incremented.
pub fn next_version(
    version: &Version,
    change_type: ChangeType,
    prerelease_identifier: Option<&str>,
) -> Result<Version, VersionError> {
    let identifier = prerelease_identifier.filter(|id| !id.trim().is_empty());

    match change_type {
        ChangeType::None => Ok(version.clone()),
        ChangeType::Major => release(version, Level::Major),
        ChangeType::Minor => release(version, Level::Minor),
        ChangeType::Patch => release(version, Level::Patch),
        ChangeType::Premajor => with_fresh_prerelease(release(version, Level::Major)?, identifier),
        ChangeType::Preminor => with_fresh_prerelease(release(version, Level::Minor)?, identifier),
        ChangeType::Prepatch => with_fresh_prerelease(release(version, Level::Patch)?, identifier),
        ChangeType::Prerelease if version.pre.is_empty() => {
            with_fresh_prerelease(release(version, Level::Patch)?, identifier)
        }
        ChangeType::Prerelease => increment_prerelease(version),
    }
}

fn release(version: &Version, level: Level) -> Result<Version, VersionError> {
    let overflow = || VersionError::Overflow {
        version: version.clone(),
    };

    let next = match level {
        Level::Major => Version::new(version.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
        Level::Minor => Version::new(
            version.major,
            version.minor.checked_add(1).ok_or_else(overflow)?,
            0,
        ),
        Level::Patch => Version::new(
            version.major,
            version.minor,
            version.patch.checked_add(1).ok_or_else(overflow)?,
        ),
    };

    Ok(next)
}

fn with_fresh_prerelease(
    mut version: Version,
    identifier: Option<&str>,
) -> Result<Version, VersionError> {
    let suffix = match identifier {
        Some(id) => format!("{}.0", id.trim()),
        None => "0".to_string(),
    };
    version.pre = parse_prerelease(&suffix)?;
    Ok(version)
}

fn increment_prerelease(version: &Version) -> Result<Version, VersionError> {
    let mut parts: Vec<String> = version.pre.as_str().split('.').map(str::to_string).collect();

    let last_numeric = parts
        .iter()
        .rposition(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));

    match last_numeric {
        Some(index) => {
            let current: u64 = parts[index]
                .parse()
                .map_err(|_| VersionError::Overflow {
                    version: version.clone(),
                })?;
            let bumped = current.checked_add(1).ok_or_else(|| VersionError::Overflow {
                version: version.clone(),
            })?;
            parts[index] = bumped.to_string();
        }
        None => parts.push("0".to_string()),
    }

    let mut next = version.clone();
    next.pre = parse_prerelease(&parts.join("."))?;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

fn parse_prerelease(suffix: &str) -> Result<Prerelease, VersionError> {
    Prerelease::new(suffix).map_err(|source| VersionError::InvalidPrerelease {
        prerelease: suffix.to_string(),
        source,
    })
}
