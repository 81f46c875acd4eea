use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ChangeType;

/// Free-form details attached to a change record. Opaque to version planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Any other field, kept as raw JSON.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// An author-declared request to bump one package.
///
/// A missing `dependentChangeType` resolves to `patch` at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub package_name: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(default = "default_dependent_change_type")]
    pub dependent_change_type: ChangeType,
    #[serde(flatten)]
    pub metadata: ChangeMetadata,
}

fn default_dependent_change_type() -> ChangeType {
    ChangeType::Patch
}

impl ChangeRecord {
    #[must_use]
    pub fn new(package_name: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            package_name: package_name.into(),
            change_type,
            dependent_change_type: default_dependent_change_type(),
            metadata: ChangeMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_dependent_change_type(mut self, dependent_change_type: ChangeType) -> Self {
        self.dependent_change_type = dependent_change_type;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.metadata.comment = Some(comment.into());
        self
    }
}
