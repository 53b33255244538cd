mod cache;
mod client;
mod config;
mod orchestrator;
mod probe;
mod scan;
mod state;
mod watcher;

pub use cache::*;
pub use client::*;
pub use config::*;
pub use orchestrator::*;
pub use probe::*;
pub use scan::*;
pub(crate) use state::*;
pub(crate) use watcher::*;
