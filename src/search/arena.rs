use crate::model::Assignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Cached solvability of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Solvability {
    #[default]
    Unknown,
    Solvable,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub assignment: Assignment,
    pub children: Vec<NodeId>,
    pub state: Solvability,
}

/// Index-addressed node storage for one search episode. Nodes are never
/// freed individually; the whole arena is dropped on restart.
#[derive(Debug)]
pub struct NodeArena {
    nodes: Vec<Node>,
    limit: usize,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::with_limit(MAX_NODES)
    }
}

/// Every id must fit in a `u32`.
pub const MAX_NODES: usize = u32::MAX as usize;

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena that holds at most `limit` nodes (capped at [`MAX_NODES`]).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            limit: limit.clamp(1, MAX_NODES),
        }
    }

    /// Stores a node, or returns `None` once the arena is full.
    pub fn alloc(&mut self, assignment: Assignment) -> Option<NodeId> {
        if self.is_full() {
            return None;
        }
        let id = NodeId(u32::try_from(self.nodes.len()).ok()?);
        self.nodes.push(Node {
            assignment,
            children: Vec::new(),
            state: Solvability::Unknown,
        });
        Some(id)
    }

    /// Drops every node and stores `root` as the only one.
    pub fn reset(&mut self, root: Assignment) -> NodeId {
        self.nodes.clear();
        self.nodes.push(Node {
            assignment: root,
            children: Vec::new(),
            state: Solvability::Unknown,
        });
        NodeId(0)
    }

    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.limit
    }

    #[inline(always)]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Records a resolved state. Resolved and expanded nodes are never
    /// read again, so their assignment buffer is released.
    pub fn resolve(&mut self, id: NodeId, state: Solvability) {
        let node = self.get_mut(id);
        node.state = state;
        if state == Solvability::Dead {
            node.assignment = Assignment::default();
        }
    }

    /// Moves the assignment out, leaving an empty one behind.
    pub fn take_assignment(&mut self, id: NodeId) -> Assignment {
        std::mem::take(&mut self.get_mut(id).assignment)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotId;

    #[test]
    fn test_dead_nodes_release_their_assignment() {
        let mut arena = NodeArena::new();
        let a = arena
            .alloc(Assignment::from_slots(vec![Some(SlotId(0)), None]))
            .unwrap();
        let b = arena.alloc(Assignment::unassigned(2)).unwrap();

        arena.resolve(a, Solvability::Dead);
        arena.resolve(b, Solvability::Solvable);

        assert_eq!(arena.get(a).state, Solvability::Dead);
        assert!(arena.get(a).assignment.is_empty());
        assert_eq!(arena.get(b).assignment.len(), 2);
    }

    #[test]
    fn test_reset_leaves_only_the_root() {
        let mut arena = NodeArena::new();
        arena.alloc(Assignment::unassigned(1));
        arena.alloc(Assignment::unassigned(1));
        let root = arena.reset(Assignment::unassigned(3));
        assert_eq!(root.index(), 0);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(root).assignment.len(), 3);
        assert_eq!(arena.alloc(Assignment::unassigned(1)).unwrap().index(), 1);
    }

    #[test]
    fn test_full_arena_refuses_new_nodes() {
        let mut arena = NodeArena::with_limit(2);
        assert!(arena.alloc(Assignment::unassigned(1)).is_some());
        assert!(arena.alloc(Assignment::unassigned(1)).is_some());
        assert!(arena.is_full());
        assert_eq!(arena.alloc(Assignment::unassigned(1)), None);
        assert_eq!(arena.len(), 2);

        // A reset always has room for the root.
        arena.reset(Assignment::unassigned(1));
        assert!(!arena.is_full());
    }

    #[test]
    fn test_limit_never_exceeds_id_range() {
        let arena = NodeArena::with_limit(usize::MAX);
        assert_eq!(arena.limit, MAX_NODES);
        assert!(NodeId(u32::MAX).index() == MAX_NODES);
    }
}
