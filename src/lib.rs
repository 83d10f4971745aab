//! An ordered in-memory key-value index backed by a skip list, with bulk
//! load and dump to a flat `key:value` text file.
//!
//! [SkipIndex](skiplist::SkipIndex) is the single-owner engine;
//! [SyncSkipIndex](sync_skiplist::SyncSkipIndex) shares it between threads
//! behind one coarse lock. [LineFormat](store::LineFormat) moves either of
//! them to and from delimiter-separated text.
#![warn(
    // missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
pub mod index;
pub mod skiplist;
pub mod store;
pub mod sync_skiplist;

pub use index::OrderedIndex;
pub use skiplist::SkipIndex;
pub use store::{LineFormat, StoreError};
pub use sync_skiplist::SyncSkipIndex;
