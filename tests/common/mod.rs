#![allow(dead_code)]

use schedforge::config::PenaltyWeights;
use schedforge::model::{Day, PreferenceSpec, ProblemContext, ProblemSpec, SlotRef, SlotSpec};
use schedforge::rules::{HardConstraints, SoftConstraints};
use schedforge::search::{OrTree, SearchLimits};
use std::sync::Arc;

/// Builder for ProblemSpec to keep fixtures readable
pub struct ProblemBuilder {
    spec: ProblemSpec,
}

impl ProblemBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            spec: ProblemSpec {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn course_slot(mut self, day: Day, time: &str, max: usize, min: usize) -> Self {
        self.spec.course_slots.push(SlotSpec {
            day,
            time: time.to_string(),
            max,
            min,
        });
        self
    }

    pub fn lab_slot(mut self, day: Day, time: &str, max: usize, min: usize) -> Self {
        self.spec.lab_slots.push(SlotSpec {
            day,
            time: time.to_string(),
            max,
            min,
        });
        self
    }

    pub fn courses(mut self, names: &[&str]) -> Self {
        self.spec.courses.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn labs(mut self, names: &[&str]) -> Self {
        self.spec.labs.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn not_compatible(mut self, a: &str, b: &str) -> Self {
        self.spec
            .not_compatible
            .push((a.to_string(), b.to_string()));
        self
    }

    pub fn unwanted(mut self, class: &str, day: Day, time: &str) -> Self {
        self.spec.unwanted.push(slot_ref(class, day, time));
        self
    }

    pub fn preference(mut self, class: &str, day: Day, time: &str, value: u64) -> Self {
        self.spec.preferences.push(PreferenceSpec {
            class: class.to_string(),
            day,
            time: time.to_string(),
            value,
        });
        self
    }

    pub fn pair(mut self, a: &str, b: &str) -> Self {
        self.spec.pairs.push((a.to_string(), b.to_string()));
        self
    }

    pub fn partial(mut self, class: &str, day: Day, time: &str) -> Self {
        self.spec
            .partial_assignments
            .push(slot_ref(class, day, time));
        self
    }

    pub fn spec(self) -> ProblemSpec {
        self.spec
    }

    pub fn build(self) -> Arc<ProblemContext> {
        Arc::new(ProblemContext::from_spec(&self.spec).expect("fixture should be valid"))
    }
}

fn slot_ref(class: &str, day: Day, time: &str) -> SlotRef {
    SlotRef {
        class: class.to_string(),
        day,
        time: time.to_string(),
    }
}

/// A small department: two lecture sections with tutorials, an open
/// tutorial, an evening section, two 500-level courses and a fixed slot.
pub fn department() -> ProblemBuilder {
    ProblemBuilder::new("department")
        .course_slot(Day::Monday, "8:00", 3, 1)
        .course_slot(Day::Monday, "9:00", 3, 0)
        .course_slot(Day::Monday, "10:00", 2, 0)
        .course_slot(Day::Monday, "11:00", 2, 0)
        .course_slot(Day::Tuesday, "8:00", 2, 0)
        .course_slot(Day::Tuesday, "9:30", 2, 1)
        .course_slot(Day::Tuesday, "12:30", 2, 0)
        .course_slot(Day::Monday, "18:00", 2, 0)
        .lab_slot(Day::Monday, "8:00", 2, 0)
        .lab_slot(Day::Monday, "10:00", 2, 0)
        .lab_slot(Day::Tuesday, "8:00", 2, 0)
        .lab_slot(Day::Tuesday, "10:00", 2, 1)
        .lab_slot(Day::Friday, "8:00", 2, 0)
        .lab_slot(Day::Friday, "10:00", 2, 0)
        .courses(&[
            "CPSC 231 LEC 01",
            "CPSC 231 LEC 02",
            "CPSC 331 LEC 01",
            "CPSC 433 LEC 01",
            "CPSC 433 LEC 02",
            "SENG 300 LEC 01",
            "CPSC 567 LEC 01",
            "CPSC 501 LEC 01",
            "CPSC 441 LEC 90",
        ])
        .labs(&[
            "CPSC 231 LEC 01 TUT 01",
            "CPSC 231 LEC 02 TUT 01",
            "CPSC 433 TUT 01",
            "SENG 300 LEC 01 TUT 01",
            "CPSC 567 TUT 01",
        ])
        .not_compatible("CPSC 331 LEC 01", "CPSC 433 LEC 01")
        .not_compatible("CPSC 567 LEC 01", "SENG 300 LEC 01 TUT 01")
        .unwanted("CPSC 433 LEC 01", Day::Monday, "8:00")
        .preference("CPSC 433 LEC 01", Day::Tuesday, "9:30", 10)
        .preference("CPSC 231 LEC 01 TUT 01", Day::Friday, "10:00", 3)
        .pair("SENG 300 LEC 01", "CPSC 331 LEC 01")
        .partial("CPSC 231 LEC 01", Day::Monday, "8:00")
}

/// Four courses over three slots where one slot only takes a single class.
pub fn tight_capacity() -> ProblemBuilder {
    ProblemBuilder::new("tight")
        .course_slot(Day::Monday, "8:00", 1, 0)
        .course_slot(Day::Monday, "9:00", 2, 0)
        .course_slot(Day::Tuesday, "8:00", 1, 0)
        .courses(&["A 101 LEC 01", "A 102 LEC 01", "A 103 LEC 01", "A 104 LEC 01"])
}

/// Three courses, a single slot holding two.
pub fn overbooked() -> ProblemBuilder {
    ProblemBuilder::new("overbooked")
        .course_slot(Day::Monday, "8:00", 2, 0)
        .courses(&["A 101 LEC 01", "A 102 LEC 01", "A 103 LEC 01"])
}

pub fn hard(ctx: &Arc<ProblemContext>) -> Arc<HardConstraints> {
    Arc::new(HardConstraints::new(ctx.clone()))
}

pub fn soft(ctx: &Arc<ProblemContext>) -> Arc<SoftConstraints> {
    Arc::new(SoftConstraints::new(ctx.clone(), PenaltyWeights::default()))
}

pub fn tree(ctx: &Arc<ProblemContext>) -> OrTree<HardConstraints> {
    OrTree::new(ctx.clone(), hard(ctx), SearchLimits::default())
}

pub fn tree_with(ctx: &Arc<ProblemContext>, limits: SearchLimits) -> OrTree<HardConstraints> {
    OrTree::new(ctx.clone(), hard(ctx), limits)
}

pub fn rng(seed: u64) -> fastrand::Rng {
    fastrand::Rng::with_seed(seed)
}
