mod dependents;
mod error;
mod groups;

pub use dependents::{Dependent, DependentIndex};
pub use error::GroupError;
pub use groups::{AmbiguousMembership, GroupDefinition, GroupIndex};
