//! # postindex core
//!
//! Runtime-free logic shared by the index builder and the retrieval client:
//! the item model and shard schema, shard partitioning, filtering, the
//! pagination window, the retrieval state machine, the render projection,
//! and the debounce/throttle timers.
//!
//! This crate contains no tokio, filesystem I/O, or HTTP. Fetching goes
//! through the [`source::ShardSource`] trait; the application crate supplies
//! the network and filesystem implementations and drives the state machine.

pub mod error;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod render;
pub mod shard;
pub mod source;
pub mod state;
pub mod timer;

pub use error::FetchError;
pub use models::{IndexSummary, Item, Shard};
pub use state::{LoadMode, RetrievalState};
