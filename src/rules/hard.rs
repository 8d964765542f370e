use crate::model::{Assignment, ProblemContext, SlotId};
use crate::rules::ConstraintOracle;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    WrongLength { expected: usize, actual: usize },
    WrongSlotKind { class: usize, slot: SlotId },
    OverCapacity { slot: SlotId },
    CourseLabOverlap { course: usize, lab: usize },
    Incompatible { a: usize, b: usize },
    PartialAssignment { class: usize },
    Unwanted { class: usize, slot: SlotId },
    EveningSection { class: usize },
    Level500Clash { a: usize, b: usize },
    Unassigned { class: usize },
}

/// A violation with class and slot indices resolved to names.
pub struct DescribedViolation<'a> {
    violation: &'a Violation,
    ctx: &'a ProblemContext,
}

impl fmt::Display for DescribedViolation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = |i: usize| self.ctx.class(i);
        let slot = |s: SlotId| self.ctx.slot(s).label();
        match *self.violation {
            Violation::WrongLength { expected, actual } => {
                write!(f, "assignment has {} entries, expected {}", actual, expected)
            }
            Violation::WrongSlotKind { class: c, slot: s } => {
                write!(f, "{} placed in {} slot {}", class(c), self.ctx.slot(s).kind, slot(s))
            }
            Violation::OverCapacity { slot: s } => {
                write!(f, "{} over capacity (max {})", slot(s), self.ctx.slot(s).max)
            }
            Violation::CourseLabOverlap { course, lab } => {
                write!(f, "{} overlaps its lab {}", class(course), class(lab))
            }
            Violation::Incompatible { a, b } => {
                write!(f, "{} overlaps incompatible {}", class(a), class(b))
            }
            Violation::PartialAssignment { class: c } => {
                write!(f, "{} moved away from its fixed slot", class(c))
            }
            Violation::Unwanted { class: c, slot: s } => {
                write!(f, "{} placed in unwanted slot {}", class(c), slot(s))
            }
            Violation::EveningSection { class: c } => {
                write!(f, "evening section {} placed before 18:00", class(c))
            }
            Violation::Level500Clash { a, b } => {
                write!(f, "500-level {} shares a slot with {}", class(a), class(b))
            }
            Violation::Unassigned { class: c } => write!(f, "{} is unassigned", class(c)),
        }
    }
}

impl Violation {
    pub fn describe<'a>(&'a self, ctx: &'a ProblemContext) -> DescribedViolation<'a> {
        DescribedViolation {
            violation: self,
            ctx,
        }
    }
}

/// The mandatory rule catalog. Every rule is monotone: removing assigned
/// entries never turns a passing assignment into a failing one.
#[derive(Debug, Clone)]
pub struct HardConstraints {
    ctx: Arc<ProblemContext>,
}

impl HardConstraints {
    pub fn new(ctx: Arc<ProblemContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ProblemContext {
        &self.ctx
    }

    /// Every violation, including unassigned entries.
    pub fn violations(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut found = Vec::new();
        self.scan(assignment, false, &mut found);
        if found.is_empty() || !matches!(found[0], Violation::WrongLength { .. }) {
            found.extend(
                (0..assignment.len())
                    .filter(|&c| assignment.get(c).is_none())
                    .map(|class| Violation::Unassigned { class }),
            );
        }
        found
    }

    /// Pushes violations of the partial rules into `out`, stopping after the
    /// first one when `first_only` is set.
    fn scan(&self, assignment: &Assignment, first_only: bool, out: &mut Vec<Violation>) {
        let ctx = &*self.ctx;
        let n = ctx.num_classes();

        macro_rules! report {
            ($v:expr) => {{
                out.push($v);
                if first_only {
                    return;
                }
            }};
        }

        if assignment.len() != n {
            out.push(Violation::WrongLength {
                expected: n,
                actual: assignment.len(),
            });
            return;
        }

        let mut counts = vec![0usize; ctx.slots().len()];
        let mut course_500: Vec<(usize, SlotId)> = Vec::new();
        let mut lab_500: Vec<(usize, SlotId)> = Vec::new();

        for (class, slot_id) in assignment.assigned() {
            let slot = ctx.slot(slot_id);
            if slot.kind != ctx.kind_of(class) {
                report!(Violation::WrongSlotKind {
                    class,
                    slot: slot_id
                });
                continue;
            }

            counts[slot_id.index()] += 1;
            if counts[slot_id.index()] == slot.max + 1 {
                report!(Violation::OverCapacity { slot: slot_id });
            }

            if let Some(fixed) = ctx.initial().get(class) {
                if fixed != slot_id {
                    report!(Violation::PartialAssignment { class });
                }
            }

            let rules = ctx.rules(class);
            if rules.unwanted.contains(&slot_id) {
                report!(Violation::Unwanted {
                    class,
                    slot: slot_id
                });
            }

            let id = ctx.class(class);
            if id.is_evening() && !slot.is_evening() {
                report!(Violation::EveningSection { class });
            }

            let meeting = slot.meeting();
            for &other in &rules.incompatible {
                if other > class {
                    if let Some(other_slot) = assignment.get(other) {
                        if meeting.overlaps(&ctx.slot(other_slot).meeting()) {
                            report!(Violation::Incompatible { a: class, b: other });
                        }
                    }
                }
            }

            if ctx.is_course(class) {
                for &lab in &rules.linked {
                    if let Some(lab_slot) = assignment.get(lab) {
                        if meeting.overlaps(&ctx.slot(lab_slot).meeting()) {
                            report!(Violation::CourseLabOverlap { course: class, lab });
                        }
                    }
                }
            }

            if id.is_level_500() {
                let seen = if ctx.is_course(class) {
                    &mut course_500
                } else {
                    &mut lab_500
                };
                if let Some(&(other, _)) = seen.iter().find(|(_, s)| *s == slot_id) {
                    report!(Violation::Level500Clash { a: other, b: class });
                }
                seen.push((class, slot_id));
            }
        }
    }
}

impl ConstraintOracle for HardConstraints {
    fn is_partially_feasible(&self, assignment: &Assignment) -> bool {
        let mut found = Vec::new();
        self.scan(assignment, true, &mut found);
        found.is_empty()
    }
}
