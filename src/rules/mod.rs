pub mod hard;
pub mod soft;

pub use hard::{HardConstraints, Violation};
pub use soft::{FitnessBreakdown, SoftConstraints};

use crate::model::Assignment;

/// Fitness reported for inputs that cannot be scored.
pub const FITNESS_MAX: u64 = u64::MAX;

/// Mandatory scheduling rules.
pub trait ConstraintOracle {
    /// Checks every rule that depends only on assigned entries.
    fn is_partially_feasible(&self, assignment: &Assignment) -> bool;

    /// Partial feasibility plus every entry assigned.
    fn is_fully_feasible(&self, assignment: &Assignment) -> bool {
        assignment.is_complete() && self.is_partially_feasible(assignment)
    }
}

/// Soft-preference penalty. Lower is better.
pub trait FitnessOracle {
    fn fitness(&self, assignment: &Assignment) -> u64;
}
