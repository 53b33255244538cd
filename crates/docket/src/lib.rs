//! Year-scoped, gap-filling case number allocation.
//!
//! Case numbers have the form `YYYYSSS`: a four-digit calendar year and a
//! zero-padded sequence in `[1, 999]`, e.g. `2025042`. [`CaseIdAllocator`]
//! previews the lowest free number of the current year against any async
//! [`CaseStore`] while keeping reads cheap:
//!
//! - a short-lived single-slot cache serves repeated previews;
//! - a live subscription keeps the watermark current and evicts a preview as
//!   soon as another client takes it;
//! - a quick probe point-reads the few numbers after the watermark;
//! - a full scan reads the year's keys in one query when the probe comes up
//!   empty or a gap is known to exist below the watermark.
//!
//! Previews are advisory. [`CaseIdAllocator::claim`] performs the
//! authoritative create-if-absent write and retries on conflict.
//!
//! ```
//! use docket::{CaseIdFormat, lowest_free};
//!
//! let format = CaseIdFormat::default();
//! let used = ["2025001", "2025002", "2025004"].map(|s| format.parse(s).unwrap());
//! assert_eq!(lowest_free(2025, used).unwrap().to_string(), "2025003");
//! ```
//!
//! ## Features
//!
//! - `tracing`: emit `tracing` events for cache hits, probe and scan results,
//!   retries and watcher failures.
//! - `serde`: (de)serialize [`CaseId`] as its 7-digit string, or as an
//!   integer through [`as_case_raw`].
//! - `all`: both of the above.

mod allocator;
mod error;
mod futures;
mod id;
mod monitor;
mod retry;
#[cfg(feature = "serde")]
mod serde;
mod status;
mod store;
mod time;

pub use crate::allocator::*;
pub use crate::error::*;
pub use crate::futures::*;
pub use crate::id::*;
pub use crate::monitor::*;
pub use crate::retry::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::status::*;
pub use crate::store::*;
pub use crate::time::*;
