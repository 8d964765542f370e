use crate::error::{SchedError, SfResult};
use std::fmt;
use std::str::FromStr;

/// A parsed section identifier such as `CPSC 433 LEC 01` or
/// `CPSC 433 LEC 01 TUT 02`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassId {
    pub dept: String,
    pub number: String,
    pub lecture: Option<String>,
    /// Section of the tutorial or lab component, if any.
    pub tutorial: Option<String>,
}

impl ClassId {
    pub fn is_lab(&self) -> bool {
        self.tutorial.is_some()
    }

    /// Evening sections carry a section number starting with 9.
    pub fn is_evening(&self) -> bool {
        self.lecture
            .as_deref()
            .or(self.tutorial.as_deref())
            .is_some_and(|s| s.starts_with('9'))
    }

    pub fn is_level_500(&self) -> bool {
        self.number.starts_with('5')
    }

    pub fn same_course(&self, other: &ClassId) -> bool {
        self.dept == other.dept && self.number == other.number
    }

    /// True when `lab` is attached to this lecture section: either it names
    /// the section, or it names no lecture and so serves all of them.
    pub fn owns_lab(&self, lab: &ClassId) -> bool {
        !self.is_lab()
            && lab.is_lab()
            && self.same_course(lab)
            && (lab.lecture.is_none() || lab.lecture == self.lecture)
    }
}

impl FromStr for ClassId {
    type Err = SchedError;

    fn from_str(raw: &str) -> SfResult<Self> {
        let invalid = |why: &str| SchedError::Validation(format!("Class '{}': {}", raw, why));
        let tokens: Vec<&str> = raw.split_whitespace().collect();

        if tokens.len() < 2 {
            return Err(invalid("expected at least a department and a number"));
        }
        if tokens.len() % 2 != 0 {
            return Err(invalid("section kinds and numbers must come in pairs"));
        }

        let mut id = ClassId {
            dept: tokens[0].to_string(),
            number: tokens[1].to_string(),
            lecture: None,
            tutorial: None,
        };

        for pair in tokens[2..].chunks(2) {
            let section = pair[1].to_string();
            match pair[0] {
                "LEC" if id.lecture.is_none() && id.tutorial.is_none() => {
                    id.lecture = Some(section)
                }
                "TUT" | "LAB" if id.tutorial.is_none() => id.tutorial = Some(section),
                other => return Err(invalid(&format!("unexpected component '{}'", other))),
            }
        }

        if id.lecture.is_none() && id.tutorial.is_none() {
            return Err(invalid("missing LEC, TUT or LAB component"));
        }

        Ok(id)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dept, self.number)?;
        if let Some(lec) = &self.lecture {
            write!(f, " LEC {}", lec)?;
        }
        if let Some(tut) = &self.tutorial {
            write!(f, " TUT {}", tut)?;
        }
        Ok(())
    }
}
