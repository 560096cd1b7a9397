//! Profile types and storage

pub mod store;
mod types;

pub use store::{LoadSummary, ProfileStore};
pub use types::*;
