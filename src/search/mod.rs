pub mod arena;
pub mod frontier;
pub mod or_tree;

pub use arena::{NodeArena, NodeId, Solvability};
pub use frontier::{Frontier, DEFAULT_FRONTIER_CAP};
pub use or_tree::{OrTree, SearchLimits, SearchOutcome, SearchStats, DEAD, DEFAULT_MAX_RESTARTS};
