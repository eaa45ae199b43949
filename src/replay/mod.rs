//! Offline counterpart of the live pipeline: load persisted events and
//! replay them through the same aggregation logic.

pub mod loader;
pub mod replayer;

pub use loader::{load_directory, LoadError, LoadedData};
pub use replayer::replay;
