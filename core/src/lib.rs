pub mod error;
pub mod report;

pub use error::ScanError;
pub use report::{Finding, Report, SizeDirection, Summary};
