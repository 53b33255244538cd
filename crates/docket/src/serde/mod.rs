mod case_id;

pub use case_id::*;
