use crate::search::arena::NodeId;

/// Default bound on open nodes before the search restarts from its root.
pub const DEFAULT_FRONTIER_CAP: usize = 28_000;

/// Set of open node ids with O(1) insert, remove and uniform pick.
///
/// `items` holds the members in insertion order, perturbed only by
/// swap-removal, so picks are reproducible for a given RNG stream.
#[derive(Debug)]
pub struct Frontier {
    items: Vec<NodeId>,
    positions: Vec<Option<usize>>,
    cap: usize,
}

impl Frontier {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            positions: Vec::new(),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_over_cap(&self) -> bool {
        self.items.len() > self.cap
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.positions.get(id.index()), Some(Some(_)))
    }

    /// Returns false if `id` was already present.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        if self.positions.len() <= id.index() {
            self.positions.resize(id.index() + 1, None);
        }
        self.positions[id.index()] = Some(self.items.len());
        self.items.push(id);
        true
    }

    /// Returns false if `id` was not present.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(pos) = self.positions.get_mut(id.index()).and_then(Option::take) else {
            return false;
        };
        self.items.swap_remove(pos);
        if let Some(&moved) = self.items.get(pos) {
            self.positions[moved.index()] = Some(pos);
        }
        true
    }

    pub fn pick(&self, rng: &mut fastrand::Rng) -> Option<NodeId> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items[rng.usize(..self.items.len())])
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.positions.clear();
    }
}
