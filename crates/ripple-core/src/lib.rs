mod change;
mod package;
mod severity;

pub use change::{ChangeMetadata, ChangeRecord};
pub use package::{DependencyKind, ManifestSnapshot, PackageGroup, PackageInfo};
pub use severity::ChangeType;
