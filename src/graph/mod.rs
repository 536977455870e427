//! Live graph construction.
//!
//! ```text
//! handle → normalize ─┬─ object    → ObjectGraphBuilder      → LiveGraph
//!                     └─ container → CollectionsGraphBuilder → CollectionsGraph
//! ```

pub mod live;
pub mod builder;
pub mod collections;
pub mod factory;

pub use live::{LiveGraph, CollectionsGraph, CollectionElement};
pub use builder::ObjectGraphBuilder;
pub use collections::CollectionsGraphBuilder;
pub use factory::{LiveGraphFactory, BuiltGraph};
