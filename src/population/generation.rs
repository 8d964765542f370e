use crate::error::SfResult;
use crate::model::Assignment;
use crate::population::selector::RouletteSelector;
use crate::rules::{ConstraintOracle, FitnessOracle};
use crate::search::{OrTree, SearchOutcome};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessStats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

/// What one control cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    Reduced { removed: usize },
    Crossover { inserted: bool },
    /// Fewer than two parents could be drawn.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_pop: usize,
    pub num_remove: usize,
    pub selection_retries: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_pop: 10,
            num_remove: 1,
            selection_retries: 16,
        }
    }
}

/// A pool of complete feasible assignments, refined one action per cycle.
pub struct Generation<C, F> {
    members: Vec<Assignment>,
    tree: OrTree<C>,
    fitness: Arc<F>,
    params: GenerationParams,
}

impl<C: ConstraintOracle, F: FitnessOracle> Generation<C, F> {
    pub fn new(
        members: Vec<Assignment>,
        tree: OrTree<C>,
        fitness: Arc<F>,
        params: GenerationParams,
    ) -> Self {
        Self {
            members,
            tree,
            fitness,
            params,
        }
    }

    pub fn members(&self) -> &[Assignment] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Assignment> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn tree(&self) -> &OrTree<C> {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut OrTree<C> {
        &mut self.tree
    }

    /// Runs one cycle: reduce when over capacity, otherwise crossover.
    pub fn control(&mut self, rng: &mut fastrand::Rng) -> SfResult<CycleAction> {
        if self.members.len() > self.params.max_pop {
            let removed = self.reduce();
            Ok(CycleAction::Reduced { removed })
        } else {
            self.crossover(rng)
        }
    }

    /// Removes the individuals with the highest fitness. Returns how many
    /// were removed.
    pub fn reduce(&mut self) -> usize {
        let len = self.members.len();
        let k = self
            .params
            .num_remove
            .max(len.saturating_sub(self.params.max_pop))
            .min(len);
        if k == 0 {
            return 0;
        }

        // Min-heap holding the k worst seen so far; its top is the mildest.
        let mut worst: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::with_capacity(k + 1);
        for (i, member) in self.members.iter().enumerate() {
            worst.push(Reverse((self.fitness.fitness(member), i)));
            if worst.len() > k {
                worst.pop();
            }
        }

        let mut doomed = vec![false; len];
        for Reverse((_, i)) in worst {
            doomed[i] = true;
        }
        let mut idx = 0;
        self.members.retain(|_| {
            let keep = !doomed[idx];
            idx += 1;
            keep
        });

        debug!("Reduced population by {} to {}", k, self.members.len());
        k
    }

    /// Draws two distinct parents and inserts their child on success.
    pub fn crossover(&mut self, rng: &mut fastrand::Rng) -> SfResult<CycleAction> {
        if self.members.len() < 2 {
            return Ok(CycleAction::Skipped);
        }

        let wheel = RouletteSelector::new(&self.members, &*self.fitness);
        let retries = self.params.selection_retries;
        let Some(first) = wheel.select_with_retries(rng, None, retries) else {
            return Ok(CycleAction::Skipped);
        };
        let Some(second) = wheel.select_with_retries(rng, Some(first), retries) else {
            return Ok(CycleAction::Skipped);
        };

        let start = self.tree.context().initial().clone();
        let outcome = self.tree.crossover(
            &self.members[first],
            &self.members[second],
            &start,
            rng,
        )?;

        match outcome {
            SearchOutcome::Found(child) => {
                self.members.push(child);
                Ok(CycleAction::Crossover { inserted: true })
            }
            SearchOutcome::Exhausted => Ok(CycleAction::Crossover { inserted: false }),
        }
    }

    /// Min, max and mean fitness, recomputed from scratch.
    pub fn stats(&self) -> Option<FitnessStats> {
        if self.members.is_empty() {
            return None;
        }
        let values: Vec<u64> = self
            .members
            .iter()
            .map(|m| self.fitness.fitness(m))
            .collect();
        let min = values.iter().copied().min()?;
        let max = values.iter().copied().max()?;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
        Some(FitnessStats { min, max, mean })
    }

    /// The member with the lowest fitness; earliest wins ties.
    pub fn best(&self) -> Option<(&Assignment, u64)> {
        self.members
            .iter()
            .map(|m| (m, self.fitness.fitness(m)))
            .min_by_key(|&(_, f)| f)
    }
}
