use semver::Version;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("invalid version '{version}'")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid prerelease suffix '{prerelease}'")]
    InvalidPrerelease {
        prerelease: String,
        #[source]
        source: semver::Error,
    },

    #[error("version component overflow while bumping '{version}'")]
    Overflow { version: Version },
}
