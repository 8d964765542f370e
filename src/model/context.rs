use crate::error::{SchedError, SfResult};
use crate::model::assignment::Assignment;
use crate::model::class::ClassId;
use crate::model::department;
use crate::model::problem::{ProblemSpec, SlotSpec};
use crate::model::slot::{parse_time, Day, Slot, SlotId, SlotKind};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Added to the priority score of evening sections; they have the fewest
/// usable slots.
pub const EVENING_PRIORITY_BONUS: usize = 50;

/// Per-class rule indexes, resolved to class and slot indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRules {
    pub unwanted: Vec<SlotId>,
    pub incompatible: Vec<usize>,
    /// For a course, the labs attached to it; for a lab, its courses.
    pub linked: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preference {
    pub class: usize,
    pub slot: SlotId,
    pub value: u64,
}

type SlotKey = (SlotKind, Day, u16);

/// Immutable description of one problem instance. Built once, then shared
/// read-only by the search engine and the rule oracles.
#[derive(Debug, Clone)]
pub struct ProblemContext {
    name: String,
    classes: Vec<ClassId>,
    num_courses: usize,
    slots: Vec<Slot>,
    course_slots: Vec<SlotId>,
    lab_slots: Vec<SlotId>,
    slot_index: HashMap<SlotKey, SlotId>,
    class_index: HashMap<ClassId, usize>,
    rules: Vec<ClassRules>,
    preferences: Vec<Preference>,
    pairs: Vec<(usize, usize)>,
    section_groups: Vec<Vec<usize>>,
    initial: Assignment,
    priority: Vec<usize>,
}

impl ProblemContext {
    /// Resolves `spec` after the standing department policies in
    /// [`department`] have been applied to it.
    pub fn from_spec(spec: &ProblemSpec) -> SfResult<Self> {
        let spec = &department::apply(spec)?;
        let mut slots = Vec::with_capacity(spec.course_slots.len() + spec.lab_slots.len());
        let mut slot_index = HashMap::new();
        let course_slots = register_slots(
            &spec.course_slots,
            SlotKind::Course,
            &mut slots,
            &mut slot_index,
        )?;
        let lab_slots =
            register_slots(&spec.lab_slots, SlotKind::Lab, &mut slots, &mut slot_index)?;

        let mut classes = Vec::with_capacity(spec.courses.len() + spec.labs.len());
        let mut class_index = HashMap::new();
        for (raw, want_lab) in spec
            .courses
            .iter()
            .map(|c| (c, false))
            .chain(spec.labs.iter().map(|l| (l, true)))
        {
            let id: ClassId = raw.parse()?;
            if id.is_lab() != want_lab {
                return Err(SchedError::Validation(format!(
                    "'{}' is listed as a {} but is a {}",
                    raw,
                    if want_lab { "lab" } else { "course" },
                    if id.is_lab() { "lab" } else { "course" },
                )));
            }
            if class_index.insert(id.clone(), classes.len()).is_some() {
                return Err(SchedError::Config(format!("Duplicate class '{}'", raw)));
            }
            classes.push(id);
        }

        let mut ctx = Self {
            name: spec.name.clone(),
            num_courses: spec.courses.len(),
            rules: vec![ClassRules::default(); classes.len()],
            initial: Assignment::unassigned(classes.len()),
            classes,
            slots,
            course_slots,
            lab_slots,
            slot_index,
            class_index,
            preferences: Vec::new(),
            pairs: Vec::new(),
            section_groups: Vec::new(),
            priority: Vec::new(),
        };

        ctx.link_labs();
        ctx.resolve_rules(spec)?;
        ctx.resolve_partial_assignments(spec)?;
        ctx.group_sections();
        ctx.priority = ctx.compute_priority_order();

        debug!(
            "Problem '{}': {} courses, {} labs, {} slots, {} fixed",
            ctx.name,
            ctx.num_courses,
            ctx.classes.len() - ctx.num_courses,
            ctx.slots.len(),
            ctx.classes.len() - ctx.initial.unassigned_count()
        );

        Ok(ctx)
    }

    fn link_labs(&mut self) {
        for course in 0..self.num_courses {
            for lab in self.num_courses..self.classes.len() {
                if self.classes[course].owns_lab(&self.classes[lab]) {
                    self.rules[course].linked.push(lab);
                    self.rules[lab].linked.push(course);
                }
            }
        }
    }

    fn resolve_rules(&mut self, spec: &ProblemSpec) -> SfResult<()> {
        for (a, b) in &spec.not_compatible {
            let (Some(a), Some(b)) = (self.lookup_rule_class(a)?, self.lookup_rule_class(b)?)
            else {
                continue;
            };
            if a != b && !self.rules[a].incompatible.contains(&b) {
                self.rules[a].incompatible.push(b);
                self.rules[b].incompatible.push(a);
            }
        }

        for rule in &spec.unwanted {
            let Some(class) = self.lookup_rule_class(&rule.class)? else {
                continue;
            };
            let Some(slot) = self.lookup_rule_slot(class, rule.day, &rule.time)? else {
                continue;
            };
            if !self.rules[class].unwanted.contains(&slot) {
                self.rules[class].unwanted.push(slot);
            }
        }

        for pref in &spec.preferences {
            let Some(class) = self.lookup_rule_class(&pref.class)? else {
                continue;
            };
            let Some(slot) = self.lookup_rule_slot(class, pref.day, &pref.time)? else {
                continue;
            };
            self.preferences.push(Preference {
                class,
                slot,
                value: pref.value,
            });
        }

        for (a, b) in &spec.pairs {
            let (Some(a), Some(b)) = (self.lookup_rule_class(a)?, self.lookup_rule_class(b)?)
            else {
                continue;
            };
            let pair = (a.min(b), a.max(b));
            if a != b && !self.pairs.contains(&pair) {
                self.pairs.push(pair);
            }
        }

        Ok(())
    }

    fn resolve_partial_assignments(&mut self, spec: &ProblemSpec) -> SfResult<()> {
        for rule in &spec.partial_assignments {
            let id: ClassId = rule.class.parse()?;
            let class = *self.class_index.get(&id).ok_or_else(|| {
                SchedError::Config(format!(
                    "Partial assignment names unknown class '{}'",
                    rule.class
                ))
            })?;
            let start = parse_time(&rule.time)?;
            let slot = self
                .find_slot(self.kind_of(class), rule.day, start)
                .ok_or_else(|| {
                    SchedError::Config(format!(
                        "Partial assignment of '{}' names unknown {} slot {} {}",
                        rule.class,
                        self.kind_of(class),
                        rule.day,
                        rule.time
                    ))
                })?;

            match self.initial.get(class) {
                Some(existing) if existing != slot => {
                    return Err(SchedError::Config(format!(
                        "Conflicting partial assignments for '{}': {} and {}",
                        rule.class,
                        self.slot(existing).label(),
                        self.slot(slot).label()
                    )));
                }
                _ => self.initial.set(class, Some(slot)),
            }
        }
        Ok(())
    }

    fn group_sections(&mut self) {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut by_course: HashMap<(&str, &str), usize> = HashMap::new();
        for (i, class) in self.classes[..self.num_courses].iter().enumerate() {
            let group = *by_course
                .entry((class.dept.as_str(), class.number.as_str()))
                .or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
            groups[group].push(i);
        }
        groups.retain(|g| g.len() > 1);
        self.section_groups = groups;
    }

    /// Most constrained first. The sort is stable, so ties keep index order.
    fn compute_priority_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.classes.len()).collect();
        order.sort_by_key(|&i| Reverse(self.priority_score(i)));
        order
    }

    pub fn priority_score(&self, class: usize) -> usize {
        let rules = &self.rules[class];
        let attached_labs = if self.is_course(class) {
            rules.linked.len()
        } else {
            0
        };
        let evening = if self.classes[class].is_evening() {
            EVENING_PRIORITY_BONUS
        } else {
            0
        };
        rules.unwanted.len() + rules.incompatible.len() + attached_labs + evening
    }

    fn lookup_rule_class(&self, raw: &str) -> SfResult<Option<usize>> {
        let id: ClassId = raw.parse()?;
        let found = self.class_index.get(&id).copied();
        if found.is_none() {
            warn!("Ignoring rule for unknown class '{}'", raw);
        }
        Ok(found)
    }

    fn lookup_rule_slot(&self, class: usize, day: Day, time: &str) -> SfResult<Option<SlotId>> {
        let start = parse_time(time)?;
        let found = self.find_slot(self.kind_of(class), day, start);
        if found.is_none() {
            warn!(
                "Ignoring rule for '{}': no {} slot at {} {}",
                self.classes[class],
                self.kind_of(class),
                day,
                time
            );
        }
        Ok(found)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn num_courses(&self) -> usize {
        self.num_courses
    }

    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    pub fn class(&self, class: usize) -> &ClassId {
        &self.classes[class]
    }

    pub fn class_index(&self, raw: &str) -> Option<usize> {
        let id: ClassId = raw.parse().ok()?;
        self.class_index.get(&id).copied()
    }

    #[inline(always)]
    pub fn is_course(&self, class: usize) -> bool {
        class < self.num_courses
    }

    pub fn kind_of(&self, class: usize) -> SlotKind {
        if self.is_course(class) {
            SlotKind::Course
        } else {
            SlotKind::Lab
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline(always)]
    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    pub fn course_slots(&self) -> &[SlotId] {
        &self.course_slots
    }

    pub fn lab_slots(&self) -> &[SlotId] {
        &self.lab_slots
    }

    /// Slots of the right kind for `class`.
    pub fn candidate_slots(&self, class: usize) -> &[SlotId] {
        if self.is_course(class) {
            &self.course_slots
        } else {
            &self.lab_slots
        }
    }

    pub fn find_slot(&self, kind: SlotKind, day: Day, start: u16) -> Option<SlotId> {
        self.slot_index.get(&(kind, day, start)).copied()
    }

    pub fn rules(&self, class: usize) -> &ClassRules {
        &self.rules[class]
    }

    pub fn preferences(&self) -> &[Preference] {
        &self.preferences
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Lecture sections of the same course, for courses with more than one.
    pub fn section_groups(&self) -> &[Vec<usize>] {
        &self.section_groups
    }

    /// All-unassigned, with partial assignments filled in.
    pub fn initial(&self) -> &Assignment {
        &self.initial
    }

    pub fn is_fixed(&self, class: usize) -> bool {
        self.initial.get(class).is_some()
    }

    pub fn priority_order(&self) -> &[usize] {
        &self.priority
    }

    /// Class name to slot label, for assigned entries only.
    pub fn describe(&self, assignment: &Assignment) -> BTreeMap<String, String> {
        assignment
            .assigned()
            .map(|(class, slot)| (self.classes[class].to_string(), self.slot(slot).label()))
            .collect()
    }

    /// Inverse of [`describe`](Self::describe). Classes missing from the map
    /// stay unassigned.
    pub fn parse_assignment(&self, entries: &BTreeMap<String, String>) -> SfResult<Assignment> {
        let mut assignment = Assignment::unassigned(self.classes.len());
        for (raw_class, label) in entries {
            let class = self.class_index(raw_class).ok_or_else(|| {
                SchedError::Validation(format!("Unknown class '{}'", raw_class))
            })?;
            let (day, time) = label.trim().split_once(' ').ok_or_else(|| {
                SchedError::Validation(format!("Invalid slot label '{}'", label))
            })?;
            let day: Day = day
                .parse()
                .map_err(|_| SchedError::Validation(format!("Invalid day in '{}'", label)))?;
            let slot = self
                .find_slot(self.kind_of(class), day, parse_time(time)?)
                .ok_or_else(|| {
                    SchedError::Validation(format!(
                        "No {} slot '{}' for '{}'",
                        self.kind_of(class),
                        label,
                        raw_class
                    ))
                })?;
            assignment.set(class, Some(slot));
        }
        Ok(assignment)
    }
}

fn register_slots(
    specs: &[SlotSpec],
    kind: SlotKind,
    slots: &mut Vec<Slot>,
    index: &mut HashMap<SlotKey, SlotId>,
) -> SfResult<Vec<SlotId>> {
    let mut ids = Vec::with_capacity(specs.len());
    for spec in specs {
        let start = parse_time(&spec.time)?;
        let id = SlotId(slots.len() as u32);
        if index.insert((kind, spec.day, start), id).is_some() {
            return Err(SchedError::Config(format!(
                "Duplicate {} slot {} {}",
                kind, spec.day, spec.time
            )));
        }
        slots.push(Slot {
            day: spec.day,
            start,
            max: spec.max,
            min: spec.min,
            kind,
        });
        ids.push(id);
    }
    Ok(ids)
}
