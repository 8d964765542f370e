use crate::error::{SchedError, SfResult};
use crate::model::slot::Day;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum_macros::EnumString;
use tracing::warn;

/// On-disk form of a timetabling instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSpec {
    pub name: String,
    pub course_slots: Vec<SlotSpec>,
    pub lab_slots: Vec<SlotSpec>,
    pub courses: Vec<String>,
    pub labs: Vec<String>,
    pub not_compatible: Vec<(String, String)>,
    pub unwanted: Vec<SlotRef>,
    pub preferences: Vec<PreferenceSpec>,
    pub pairs: Vec<(String, String)>,
    pub partial_assignments: Vec<SlotRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub day: Day,
    pub time: String,
    pub max: usize,
    #[serde(default)]
    pub min: usize,
}

/// A class pinned to, or barred from, a `(day, time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRef {
    pub class: String,
    pub day: Day,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSpec {
    pub class: String,
    pub day: Day,
    pub time: String,
    pub value: u64,
}

impl ProblemSpec {
    /// Reads `.json` files as JSON and anything else as the sectioned text
    /// format (see [`from_text`](Self::from_text)).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&content),
            _ => Self::from_text(&content),
        }
    }

    pub fn from_json(content: &str) -> SfResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses the sectioned text format. A line ending in `:` opens a
    /// section; entries are one per line with comma-separated fields:
    ///
    /// ```text
    /// Name:
    /// ShortExample
    ///
    /// Course slots:
    /// MO, 8:00, 3, 2
    ///
    /// Courses:
    /// CPSC 433 LEC 01
    ///
    /// Preferences:
    /// MO, 8:00, CPSC 433 LEC 01, 10
    /// ```
    ///
    /// Slots are `day, time, max, min`; unwanted and partial assignments are
    /// `class, day, time`; not compatible and pair are `class, class`.
    /// Unknown sections are skipped.
    pub fn from_text(content: &str) -> SfResult<Self> {
        let mut spec = Self::default();
        let mut section: Option<Section> = None;
        let mut skipping = false;

        for (n, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let at = TextLine { number: n + 1, text: line };

            if let Some(header) = line.strip_suffix(':') {
                match Section::from_str(header.trim()) {
                    Ok(s) => {
                        section = Some(s);
                        skipping = false;
                    }
                    Err(_) => {
                        warn!("Skipping unknown section '{}' (line {})", header, at.number);
                        skipping = true;
                    }
                }
                continue;
            }
            if skipping {
                continue;
            }

            match section {
                None => return Err(at.invalid("entry before any section header")),
                Some(Section::Name) => spec.name = line.to_string(),
                Some(Section::CourseSlots) => spec.course_slots.push(at.slot()?),
                Some(Section::LabSlots) => spec.lab_slots.push(at.slot()?),
                Some(Section::Courses) => spec.courses.push(at.class_name()),
                Some(Section::Labs) => spec.labs.push(at.class_name()),
                Some(Section::NotCompatible) => spec.not_compatible.push(at.class_pair()?),
                Some(Section::Unwanted) => spec.unwanted.push(at.slot_ref()?),
                Some(Section::Preferences) => spec.preferences.push(at.preference()?),
                Some(Section::Pair) => spec.pairs.push(at.class_pair()?),
                Some(Section::PartialAssignments) => {
                    spec.partial_assignments.push(at.slot_ref()?)
                }
            }
        }
        Ok(spec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum Section {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "course slots")]
    CourseSlots,
    #[strum(serialize = "lab slots")]
    LabSlots,
    #[strum(serialize = "courses")]
    Courses,
    #[strum(serialize = "labs")]
    Labs,
    #[strum(serialize = "not compatible")]
    NotCompatible,
    #[strum(serialize = "unwanted")]
    Unwanted,
    #[strum(serialize = "preferences")]
    Preferences,
    #[strum(serialize = "pair")]
    Pair,
    #[strum(serialize = "partial assignments")]
    PartialAssignments,
}

struct TextLine<'a> {
    number: usize,
    text: &'a str,
}

impl TextLine<'_> {
    fn invalid(&self, why: &str) -> SchedError {
        SchedError::Validation(format!("line {}: {} ('{}')", self.number, why, self.text))
    }

    fn fields(&self, expected: &[usize]) -> SfResult<Vec<&str>> {
        let fields: Vec<&str> = self.text.split(',').map(str::trim).collect();
        if !expected.contains(&fields.len()) || fields.iter().any(|f| f.is_empty()) {
            return Err(self.invalid(&format!("expected {:?} fields", expected)));
        }
        Ok(fields)
    }

    fn day(&self, raw: &str) -> SfResult<Day> {
        raw.parse()
            .map_err(|_| self.invalid(&format!("unknown day '{}'", raw)))
    }

    fn number<T: FromStr>(&self, raw: &str) -> SfResult<T> {
        raw.parse()
            .map_err(|_| self.invalid(&format!("'{}' is not a number", raw)))
    }

    fn class_name(&self) -> String {
        normalize(self.text)
    }

    fn slot(&self) -> SfResult<SlotSpec> {
        let f = self.fields(&[3, 4])?;
        Ok(SlotSpec {
            day: self.day(f[0])?,
            time: f[1].to_string(),
            max: self.number(f[2])?,
            min: match f.get(3) {
                Some(min) => self.number(min)?,
                None => 0,
            },
        })
    }

    fn class_pair(&self) -> SfResult<(String, String)> {
        let f = self.fields(&[2])?;
        Ok((normalize(f[0]), normalize(f[1])))
    }

    fn slot_ref(&self) -> SfResult<SlotRef> {
        let f = self.fields(&[3])?;
        Ok(SlotRef {
            class: normalize(f[0]),
            day: self.day(f[1])?,
            time: f[2].to_string(),
        })
    }

    fn preference(&self) -> SfResult<PreferenceSpec> {
        let f = self.fields(&[4])?;
        Ok(PreferenceSpec {
            day: self.day(f[0])?,
            time: f[1].to_string(),
            class: normalize(f[2]),
            value: self.number(f[3])?,
        })
    }
}

/// Collapses runs of whitespace inside a class name.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_fill_their_fields() {
        let spec = ProblemSpec::from_text(
            "Name:\nShort\n\nCourse slots:\nMO, 8:00, 3, 2\nTU, 9:30, 2\n\n\
             Lab slots:\nFR, 10:00, 2, 1\n\nCourses:\nCPSC  433 LEC 01\n\n\
             Labs:\nCPSC 433 LEC 01 TUT 01\n\n\
             Preferences:\nTU, 9:30, CPSC 433 LEC 01, 10\n",
        )
        .unwrap();

        assert_eq!(spec.name, "Short");
        assert_eq!(spec.course_slots.len(), 2);
        assert_eq!(spec.course_slots[0].min, 2);
        assert_eq!(spec.course_slots[1].min, 0);
        assert_eq!(spec.lab_slots[0].day, Day::Friday);
        assert_eq!(spec.courses, vec!["CPSC 433 LEC 01".to_string()]);
        assert_eq!(spec.preferences[0].value, 10);
        assert_eq!(spec.preferences[0].class, "CPSC 433 LEC 01");
    }

    #[test]
    fn test_headers_ignore_case_and_unknown_sections_are_skipped() {
        let spec =
            ProblemSpec::from_text("COURSES:\nCPSC 231 LEC 01\nRooms:\nICT 102\n").unwrap();
        assert_eq!(spec.courses, vec!["CPSC 231 LEC 01".to_string()]);
    }

    #[test]
    fn test_bad_lines_report_their_number() {
        let err = ProblemSpec::from_text("Course slots:\nMO, 8:00, many, 1\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let err = ProblemSpec::from_text("CPSC 231 LEC 01\n").unwrap_err();
        assert!(matches!(err, SchedError::Validation(_)));

        let err = ProblemSpec::from_text("Unwanted:\nCPSC 231 LEC 01, WE, 8:00\n").unwrap_err();
        assert!(err.to_string().contains("unknown day"), "{}", err);
    }
}
