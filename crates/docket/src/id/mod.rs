mod case_id;
mod error;
mod format;

pub use case_id::*;
pub use error::*;
pub use format::*;
