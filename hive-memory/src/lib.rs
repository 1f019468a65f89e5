#![deny(missing_docs)]
//! Memory backends for hive.
//!
//! - [`ListMemory`]: chronological, unranked, in-process
//! - [`RetrievalMemory`]: ranked lexical retrieval, optionally persisted
//!   as one JSON file per memory name
//!
//! Both implement [`hive_core::Memory`] and [`hive_factory::MemoryKind`], so
//! the component factory can open and cache them by name.

mod list;
mod retrieval;
mod score;

pub use list::ListMemory;
pub use retrieval::RetrievalMemory;
