use crate::error::{SchedError, SfResult};
use crate::model::{Assignment, ProblemContext};
use crate::rules::ConstraintOracle;
use crate::search::arena::{NodeArena, NodeId, Solvability};
use crate::search::frontier::{Frontier, DEFAULT_FRONTIER_CAP};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Score of a node that can never be completed.
pub const DEAD: u32 = u32::MAX;

pub const DEFAULT_MAX_RESTARTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Assignment),
    Exhausted,
}

impl SearchOutcome {
    pub fn found(self) -> Option<Assignment> {
        match self {
            SearchOutcome::Found(a) => Some(a),
            SearchOutcome::Exhausted => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct SearchLimits {
    #[builder(default = DEFAULT_FRONTIER_CAP)]
    pub frontier_cap: usize,
    /// Frontier resets allowed per call before giving up.
    #[builder(default = DEFAULT_MAX_RESTARTS)]
    pub max_restarts: usize,
    #[builder(default, setter(strip_option))]
    pub deadline: Option<Instant>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Counters for the most recent call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expansions: usize,
    pub dead_ends: usize,
    pub jumps: usize,
    pub restarts: usize,
    pub peak_frontier: usize,
    pub nodes_allocated: usize,
}

impl SearchStats {
    pub fn absorb(&mut self, other: &SearchStats) {
        self.expansions += other.expansions;
        self.dead_ends += other.dead_ends;
        self.jumps += other.jumps;
        self.restarts += other.restarts;
        self.nodes_allocated += other.nodes_allocated;
        self.peak_frontier = self.peak_frontier.max(other.peak_frontier);
    }
}

/// Randomised or-tree search over partial assignments.
///
/// Cold-start mode ([`search`](Self::search)) walks the tree depth-first
/// along a random child and, on a dead end, jumps to a random open node
/// anywhere in the tree. Guided mode ([`crossover`](Self::crossover)) fills
/// each free entry from two parents and only branches where neither fits.
pub struct OrTree<C> {
    ctx: Arc<ProblemContext>,
    oracle: Arc<C>,
    limits: SearchLimits,
    arena: NodeArena,
    frontier: Frontier,
    root: Assignment,
    stats: SearchStats,
}

impl<C: ConstraintOracle> OrTree<C> {
    pub fn new(ctx: Arc<ProblemContext>, oracle: Arc<C>, limits: SearchLimits) -> Self {
        Self {
            frontier: Frontier::new(limits.frontier_cap),
            arena: NodeArena::new(),
            root: Assignment::default(),
            stats: SearchStats::default(),
            ctx,
            oracle,
            limits,
        }
    }

    pub fn context(&self) -> &ProblemContext {
        &self.ctx
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.limits.deadline = deadline;
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// 0 for a complete feasible assignment, [`DEAD`] for one that breaks a
    /// rule, otherwise the number of unassigned entries.
    pub fn score(&self, assignment: &Assignment) -> u32 {
        if !self.oracle.is_partially_feasible(assignment) {
            return DEAD;
        }
        if assignment.is_complete() {
            return if self.oracle.is_fully_feasible(assignment) {
                0
            } else {
                DEAD
            };
        }
        u32::try_from(assignment.unassigned_count()).map_or(DEAD - 1, |n| n.min(DEAD - 1))
    }

    /// One candidate per slot of the class's kind that keeps `assignment`
    /// partially feasible.
    pub fn altern(&self, assignment: &Assignment, class: usize) -> Vec<Assignment> {
        let mut probe = assignment.clone();
        let mut viable = Vec::new();
        for &slot in self.ctx.candidate_slots(class) {
            probe.set(class, Some(slot));
            if self.oracle.is_partially_feasible(&probe) {
                viable.push(probe.clone());
            }
        }
        viable
    }

    /// Next unassigned class in priority order starting at `cursor`,
    /// wrapping. Returns the class and its position in the order.
    fn next_class(&self, assignment: &Assignment, cursor: usize) -> Option<(usize, usize)> {
        let order = self.ctx.priority_order();
        let n = order.len();
        (0..n)
            .map(|k| (cursor + k) % n)
            .find(|&pos| assignment.get(order[pos]).is_none())
            .map(|pos| (order[pos], pos))
    }

    fn check_len(&self, assignment: &Assignment, what: &str) -> SfResult<()> {
        if assignment.len() != self.ctx.num_classes() {
            return Err(SchedError::Validation(format!(
                "{} has {} entries, problem has {} classes",
                what,
                assignment.len(),
                self.ctx.num_classes()
            )));
        }
        Ok(())
    }

    fn timed_out(&self) -> bool {
        self.limits.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drops the whole tree and reseeds the frontier with a fresh root.
    fn restart(&mut self) -> NodeId {
        self.frontier.clear();
        let root = self.arena.reset(self.root.clone());
        self.frontier.insert(root);
        self.stats.nodes_allocated += 1;
        root
    }

    /// Expands `node` on the next class after `cursor`. Returns the order
    /// position that was assigned, or `None` when no child is viable.
    fn expand(&mut self, node: NodeId, cursor: usize) -> Option<usize> {
        let (class, pos) = self.next_class(&self.arena.get(node).assignment, cursor)?;
        let parent = self.arena.take_assignment(node);
        let options = self.altern(&parent, class);
        if options.is_empty() {
            return None;
        }

        self.frontier.remove(node);
        self.stats.expansions += 1;

        // A full arena keeps whatever children fit; the caller restarts.
        let mut children = Vec::with_capacity(options.len());
        for option in options {
            let Some(child) = self.arena.alloc(option) else {
                break;
            };
            self.frontier.insert(child);
            children.push(child);
        }
        self.stats.nodes_allocated += children.len();
        self.arena.get_mut(node).children = children;
        Some(pos)
    }

    /// Cold-start search from `initial`.
    pub fn search(
        &mut self,
        initial: &Assignment,
        rng: &mut fastrand::Rng,
    ) -> SfResult<SearchOutcome> {
        self.check_len(initial, "Initial assignment")?;
        self.stats = SearchStats::default();
        self.root = initial.clone();

        let mut current = self.restart();
        let mut cursor = 0usize;
        self.stats.peak_frontier = self.frontier.len();

        let outcome = loop {
            if self.timed_out() {
                debug!("Search deadline reached");
                break SearchOutcome::Exhausted;
            }

            let expanded = match self.score(&self.arena.get(current).assignment) {
                0 => {
                    self.arena.resolve(current, Solvability::Solvable);
                    self.frontier.remove(current);
                    break SearchOutcome::Found(self.arena.take_assignment(current));
                }
                DEAD => None,
                _ => self.expand(current, cursor),
            };

            let Some(pos) = expanded else {
                self.arena.resolve(current, Solvability::Dead);
                self.frontier.remove(current);
                self.stats.dead_ends += 1;
                match self.frontier.pick(rng) {
                    Some(next) => {
                        current = next;
                        cursor = 0;
                        self.stats.jumps += 1;
                        continue;
                    }
                    None => break SearchOutcome::Exhausted,
                }
            };

            if self.frontier.is_over_cap() || self.arena.is_full() {
                self.stats.restarts += 1;
                if self.stats.restarts > self.limits.max_restarts {
                    warn!(
                        "Tree outgrew its limits {} times (frontier cap {}), giving up",
                        self.stats.restarts,
                        self.frontier.cap()
                    );
                    break SearchOutcome::Exhausted;
                }
                debug!(
                    "Frontier at {} of {} nodes, arena at {}, restarting from root",
                    self.frontier.len(),
                    self.frontier.cap(),
                    self.arena.len()
                );
                current = self.restart();
                cursor = 0;
                continue;
            }
            self.stats.peak_frontier = self.stats.peak_frontier.max(self.frontier.len());

            let children = &self.arena.get(current).children;
            current = children[rng.usize(..children.len())];
            cursor = pos + 1;
        };

        debug!(
            "Search {}: {} expansions, {} dead ends, {} jumps, {} restarts, peak frontier {}",
            if outcome.is_found() { "found" } else { "exhausted" },
            self.stats.expansions,
            self.stats.dead_ends,
            self.stats.jumps,
            self.stats.restarts,
            self.stats.peak_frontier
        );
        Ok(outcome)
    }

    /// Guided search: builds a child of `p1` and `p2` on top of `child`,
    /// whose assigned entries are kept.
    pub fn crossover(
        &mut self,
        p1: &Assignment,
        p2: &Assignment,
        child: &Assignment,
        rng: &mut fastrand::Rng,
    ) -> SfResult<SearchOutcome> {
        self.check_len(p1, "First parent")?;
        self.check_len(p2, "Second parent")?;
        self.check_len(child, "Child")?;
        self.stats = SearchStats::default();

        let mut child = child.clone();
        for class in 0..child.len() {
            if child.get(class).is_some() {
                continue;
            }
            if self.timed_out() {
                debug!("Crossover deadline reached");
                return Ok(SearchOutcome::Exhausted);
            }

            let (v1, v2) = (p1.get(class), p2.get(class));
            child.set(class, v1);
            let s1 = self.joint_score(&child, class, p1, p2);
            if s1 <= 1 {
                continue;
            }

            child.set(class, v2);
            let s2 = self.joint_score(&child, class, p1, p2);
            if s2 <= 1 {
                continue;
            }

            if s1 != DEAD && s2 != DEAD {
                child.set(class, if rng.bool() { v1 } else { v2 });
                continue;
            }

            child.set(class, None);
            let mut options = self.altern(&child, class);
            self.stats.expansions += 1;
            if options.is_empty() {
                self.stats.dead_ends += 1;
                debug!("Crossover stuck on {}: no viable slot", self.ctx.class(class));
                return Ok(SearchOutcome::Exhausted);
            }
            child = options.swap_remove(rng.usize(..options.len()));
        }

        if self.oracle.is_fully_feasible(&child) {
            Ok(SearchOutcome::Found(child))
        } else {
            Ok(SearchOutcome::Exhausted)
        }
    }

    /// 0 when `child` is already a full solution, then 1, 2 or 3 as its
    /// entry at `class` agrees with both, one, or neither parent.
    fn joint_score(
        &self,
        child: &Assignment,
        class: usize,
        p1: &Assignment,
        p2: &Assignment,
    ) -> u32 {
        if !self.oracle.is_partially_feasible(child) {
            return DEAD;
        }
        if child.is_complete() && self.oracle.is_fully_feasible(child) {
            return 0;
        }
        let value = child.get(class);
        match (value == p1.get(class), value == p2.get(class)) {
            (true, true) => 1,
            (true, false) | (false, true) => 2,
            (false, false) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, ProblemSpec, SlotId, SlotSpec};
    use crate::rules::HardConstraints;

    fn tree(courses: &[&str], slots: usize, cap: usize) -> OrTree<HardConstraints> {
        let spec = ProblemSpec {
            courses: courses.iter().map(|c| c.to_string()).collect(),
            course_slots: (0..slots)
                .map(|h| SlotSpec {
                    day: Day::Monday,
                    time: format!("{}:00", 8 + h),
                    max: 1,
                    min: 0,
                })
                .collect(),
            ..Default::default()
        };
        let ctx = Arc::new(ProblemContext::from_spec(&spec).unwrap());
        let oracle = Arc::new(HardConstraints::new(ctx.clone()));
        let limits = SearchLimits::builder().frontier_cap(cap).build();
        OrTree::new(ctx, oracle, limits)
    }

    #[test]
    fn test_restart_leaves_single_root() {
        let mut t = tree(&["A 1 LEC 01", "A 2 LEC 01"], 3, 100);
        t.root = t.ctx.initial().clone();
        let first = t.restart();
        t.expand(first, 0).unwrap();
        assert_eq!(t.frontier_len(), 3);

        let root = t.restart();
        assert_eq!(t.frontier_len(), 1);
        assert_eq!(t.arena.len(), 1);
        assert!(t.frontier.contains(root));
    }

    #[test]
    fn test_next_class_wraps_and_skips_assigned() {
        let t = tree(&["A 1 LEC 01", "A 2 LEC 01", "A 3 LEC 01"], 3, 100);
        let order = t.ctx.priority_order().to_vec();

        let mut a = Assignment::unassigned(3);
        a.set(order[2], Some(SlotId(0)));
        // Cursor past the end wraps back to the front of the order.
        assert_eq!(t.next_class(&a, 2), Some((order[0], 0)));
        assert_eq!(t.next_class(&a, 1), Some((order[1], 1)));

        a.set(order[0], Some(SlotId(1)));
        a.set(order[1], Some(SlotId(2)));
        assert_eq!(t.next_class(&a, 0), None);
    }

    #[test]
    fn test_score_levels() {
        let t = tree(&["A 1 LEC 01", "A 2 LEC 01"], 2, 100);
        let mut a = Assignment::unassigned(2);
        assert_eq!(t.score(&a), 2);

        a.set(0, Some(SlotId(0)));
        assert_eq!(t.score(&a), 1);

        // Both in a slot with max 1.
        a.set(1, Some(SlotId(0)));
        assert_eq!(t.score(&a), DEAD);

        a.set(1, Some(SlotId(1)));
        assert_eq!(t.score(&a), 0);
    }

    #[test]
    fn test_cap_below_branching_gives_up() {
        // Root fans out to 4 children, which always breaches a cap of 2.
        let mut t = tree(&["A 1 LEC 01", "A 2 LEC 01"], 4, 2);
        let mut rng = fastrand::Rng::with_seed(1);
        let outcome = t.search(&t.ctx.initial().clone(), &mut rng).unwrap();
        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert_eq!(t.stats().restarts, DEFAULT_MAX_RESTARTS + 1);
        assert!(t.stats().peak_frontier <= 2);
    }

    #[test]
    fn test_full_arena_restarts_instead_of_overflowing() {
        let mut t = tree(&["A 1 LEC 01", "A 2 LEC 01"], 4, 100);
        // Room for the root and two of its four children.
        t.arena = NodeArena::with_limit(3);
        let mut rng = fastrand::Rng::with_seed(5);
        let outcome = t.search(&t.ctx.initial().clone(), &mut rng).unwrap();

        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert_eq!(t.stats().restarts, DEFAULT_MAX_RESTARTS + 1);
        assert!(t.arena.len() <= 3);
    }
}
