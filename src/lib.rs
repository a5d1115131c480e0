pub mod binary_minheap;
pub mod error;
pub mod graph;

pub use crate::binary_minheap::IndexedBinaryHeap;
pub use crate::error::{IPQError, IPQResult};
pub use crate::graph::{Edge, Graph};
