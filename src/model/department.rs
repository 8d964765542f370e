//! Standing department policies. They are applied to every instance before
//! names are resolved, so the rest of the engine only sees ordinary slots,
//! classes and rules.

use crate::error::{SchedError, SfResult};
use crate::model::class::ClassId;
use crate::model::problem::{ProblemSpec, SlotRef, SlotSpec};
use crate::model::slot::{format_time, parse_time, Day};
use tracing::debug;

type SlotAt = (Day, u16);

/// No lecture may start here; the course slot is withdrawn.
pub const LECTURE_BLACKOUT: SlotAt = (Day::Tuesday, 11 * 60);

/// Lab slot that holds the quiz tutorials.
pub const QUIZ_SLOT: SlotAt = (Day::Tuesday, 18 * 60);

/// Course slots that overlap the quiz slot.
const QUIZ_CLASHES: [SlotAt; 2] = [(Day::Tuesday, 17 * 60), (Day::Tuesday, 18 * 60 + 30)];

const QUIZ_DEPT: &str = "CPSC";

/// Course number and the number of its quiz tutorial.
const QUIZ_COURSES: [(&str, &str); 2] = [("313", "813"), ("413", "913")];

pub(crate) fn apply(spec: &ProblemSpec) -> SfResult<ProblemSpec> {
    let mut spec = spec.clone();

    let before = spec.course_slots.len();
    spec.course_slots
        .retain(|slot| !is_at(slot.day, &slot.time, LECTURE_BLACKOUT));
    if spec.course_slots.len() != before {
        debug!("Withdrew course slot {}", label(LECTURE_BLACKOUT));
    }

    for (course, quiz) in QUIZ_COURSES {
        reserve_quiz(&mut spec, course, quiz)?;
    }
    Ok(spec)
}

/// If any section of `course` is offered, pins its quiz tutorial to the quiz
/// slot and keeps every section of the course clear of it.
fn reserve_quiz(spec: &mut ProblemSpec, course: &str, quiz: &str) -> SfResult<()> {
    let in_course = |raw: &str| {
        raw.parse::<ClassId>()
            .map(|id| id.dept == QUIZ_DEPT && id.number == course)
            .unwrap_or(false)
    };
    let lectures: Vec<String> = spec
        .courses
        .iter()
        .filter(|c| in_course(c.as_str()))
        .cloned()
        .collect();
    let labs: Vec<String> = spec
        .labs
        .iter()
        .filter(|l| in_course(l.as_str()))
        .cloned()
        .collect();
    if lectures.is_empty() && labs.is_empty() {
        return Ok(());
    }

    let quiz_id = ClassId {
        dept: QUIZ_DEPT.to_string(),
        number: quiz.to_string(),
        lecture: None,
        tutorial: Some("01".to_string()),
    };
    let quiz_name = quiz_id.to_string();
    let is_quiz = |raw: &str| raw.parse::<ClassId>().map(|id| id == quiz_id).unwrap_or(false);

    if !has_slot(&spec.lab_slots, QUIZ_SLOT) {
        return Err(SchedError::Config(format!(
            "{} {} is offered but there is no lab slot {}",
            QUIZ_DEPT,
            course,
            label(QUIZ_SLOT)
        )));
    }
    if let Some(rule) = spec
        .partial_assignments
        .iter()
        .find(|r| is_quiz(r.class.as_str()) && !is_at(r.day, &r.time, QUIZ_SLOT))
    {
        return Err(SchedError::Config(format!(
            "'{}' must be at {}, not {} {}",
            quiz_name,
            label(QUIZ_SLOT),
            rule.day,
            rule.time
        )));
    }
    if spec
        .unwanted
        .iter()
        .any(|r| is_quiz(r.class.as_str()) && is_at(r.day, &r.time, QUIZ_SLOT))
    {
        return Err(SchedError::Config(format!(
            "'{}' is unwanted at {}, the only slot it may take",
            quiz_name,
            label(QUIZ_SLOT)
        )));
    }

    if !spec.labs.iter().any(|l| is_quiz(l.as_str())) {
        spec.labs.push(quiz_name.clone());
    }
    spec.partial_assignments.push(slot_ref(&quiz_name, QUIZ_SLOT));

    for clash in QUIZ_CLASHES {
        if has_slot(&spec.course_slots, clash) {
            for lecture in &lectures {
                spec.unwanted.push(slot_ref(lecture, clash));
            }
        }
    }
    for lab in &labs {
        spec.unwanted.push(slot_ref(lab, QUIZ_SLOT));
    }

    debug!(
        "Reserved {} for '{}' ({} lectures, {} labs kept clear)",
        label(QUIZ_SLOT),
        quiz_name,
        lectures.len(),
        labs.len()
    );
    Ok(())
}

fn is_at(day: Day, time: &str, at: SlotAt) -> bool {
    day == at.0 && parse_time(time).ok() == Some(at.1)
}

fn has_slot(slots: &[SlotSpec], at: SlotAt) -> bool {
    slots.iter().any(|s| is_at(s.day, &s.time, at))
}

fn slot_ref(class: &str, at: SlotAt) -> SlotRef {
    SlotRef {
        class: class.to_string(),
        day: at.0,
        time: format_time(at.1),
    }
}

fn label(at: SlotAt) -> String {
    format!("{} {}", at.0, format_time(at.1))
}
