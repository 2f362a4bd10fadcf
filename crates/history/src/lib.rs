//! Reconstruction of workflow execution histories into logical operations,
//! and the list, tree, and timeline projections drawn from them.
//!
//! Nothing in this crate performs I/O. A fetched event slice goes in through
//! [`HistorySnapshot::build`]; everything else is derived from it.

pub mod classify;
pub mod cursor;
pub mod details;
pub mod event;
pub mod list;
pub mod outline;
pub mod reset;
pub mod selection;
pub mod timeline;
pub mod tree;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{GroupKind, classify};
pub use event::RawEvent;
pub use selection::{HistorySnapshot, HistoryView, Projection};
pub use timeline::{TimeRange, TimelineLane, project_timeline};
pub use tree::{NodeKey, NodePath, OperationNode, build_tree};
