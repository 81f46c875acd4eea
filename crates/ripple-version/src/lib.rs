mod bump;
mod error;
mod range;

pub use bump::{next_version, parse_version};
pub use error::VersionError;
pub use range::{RangeOperator, RangeStyle, rewrite_range};
