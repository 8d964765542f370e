use crate::config::PenaltyWeights;
use crate::model::{Assignment, ProblemContext, SlotKind};
use crate::rules::{FitnessOracle, FITNESS_MAX};
use std::sync::Arc;

/// Unweighted category penalties plus the weighted total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitnessBreakdown {
    pub min_filled: u64,
    pub pref: u64,
    pub pair: u64,
    pub sec_diff: u64,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct SoftConstraints {
    ctx: Arc<ProblemContext>,
    weights: PenaltyWeights,
}

impl SoftConstraints {
    pub fn new(ctx: Arc<ProblemContext>, weights: PenaltyWeights) -> Self {
        Self { ctx, weights }
    }

    pub fn weights(&self) -> &PenaltyWeights {
        &self.weights
    }

    /// `None` when the assignment does not belong to this problem.
    pub fn breakdown(&self, assignment: &Assignment) -> Option<FitnessBreakdown> {
        if assignment.len() != self.ctx.num_classes() {
            return None;
        }

        let w = &self.weights;
        let min_filled = self.eval_min_filled(assignment);
        let pref = self.eval_pref(assignment);
        let pair = self.eval_pair(assignment);
        let sec_diff = self.eval_sec_diff(assignment);

        let total = w
            .w_min_filled
            .saturating_mul(min_filled)
            .saturating_add(w.w_pref.saturating_mul(pref))
            .saturating_add(w.w_pair.saturating_mul(pair))
            .saturating_add(w.w_sec_diff.saturating_mul(sec_diff));

        Some(FitnessBreakdown {
            min_filled,
            pref,
            pair,
            sec_diff,
            total,
        })
    }

    fn eval_min_filled(&self, assignment: &Assignment) -> u64 {
        let ctx = &*self.ctx;
        let mut counts = vec![0usize; ctx.slots().len()];
        for (_, slot) in assignment.assigned() {
            counts[slot.index()] += 1;
        }

        ctx.slots()
            .iter()
            .zip(&counts)
            .filter(|(slot, count)| **count < slot.min)
            .map(|(slot, _)| match slot.kind {
                SlotKind::Course => self.weights.pen_course_min,
                SlotKind::Lab => self.weights.pen_lab_min,
            })
            .fold(0, u64::saturating_add)
    }

    fn eval_pref(&self, assignment: &Assignment) -> u64 {
        self.ctx
            .preferences()
            .iter()
            .filter(|p| assignment.get(p.class) != Some(p.slot))
            .map(|p| p.value)
            .fold(0, u64::saturating_add)
    }

    fn eval_pair(&self, assignment: &Assignment) -> u64 {
        let ctx = &*self.ctx;
        let broken = ctx
            .pairs()
            .iter()
            .filter(|&&(a, b)| match (assignment.get(a), assignment.get(b)) {
                (Some(sa), Some(sb)) => !ctx.slot(sa).same_time(ctx.slot(sb)),
                _ => false,
            })
            .count() as u64;
        broken.saturating_mul(self.weights.pen_not_paired)
    }

    fn eval_sec_diff(&self, assignment: &Assignment) -> u64 {
        let mut penalty = 0u64;
        for group in self.ctx.section_groups() {
            let mut seen: Vec<(usize, u64)> = Vec::new();
            for slot in group.iter().filter_map(|&c| assignment.get(c)) {
                match seen.iter_mut().find(|(s, _)| *s == slot.index()) {
                    Some((_, count)) => *count += 1,
                    None => seen.push((slot.index(), 1)),
                }
            }
            for (_, count) in seen {
                let extra = (count - 1).saturating_mul(self.weights.pen_section);
                penalty = penalty.saturating_add(extra);
            }
        }
        penalty
    }
}

impl FitnessOracle for SoftConstraints {
    fn fitness(&self, assignment: &Assignment) -> u64 {
        self.breakdown(assignment).map_or(FITNESS_MAX, |b| b.total)
    }
}
