use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("invalid glob pattern '{pattern}' in group '{group}'")]
    GlobPattern {
        group: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
