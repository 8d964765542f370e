use crate::error::{SchedError, SfResult};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

const MINUTES_PER_HOUR: u16 = 60;
const EVENING_START: u16 = 18 * MINUTES_PER_HOUR;

// Weekday bits: Monday is bit 0, Friday is bit 4.
const MON: u8 = 1 << 0;
const TUE: u8 = 1 << 1;
const WED: u8 = 1 << 2;
const THU: u8 = 1 << 3;
const FRI: u8 = 1 << 4;

/// The day code a slot is published under. A code stands for a weekly
/// meeting pattern rather than a single weekday.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
pub enum Day {
    #[strum(serialize = "MO")]
    #[serde(rename = "MO")]
    Monday,
    #[strum(serialize = "TU")]
    #[serde(rename = "TU")]
    Tuesday,
    #[strum(serialize = "FR")]
    #[serde(rename = "FR")]
    Friday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Course,
    Lab,
}

/// Index into the slot table of a `ProblemContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The weekly time footprint of a slot, used for overlap checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meeting {
    pub days: u8,
    pub start: u16,
    pub end: u16,
}

impl Meeting {
    pub fn overlaps(&self, other: &Meeting) -> bool {
        self.days & other.days != 0 && self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub day: Day,
    /// Minutes after midnight.
    pub start: u16,
    pub max: usize,
    pub min: usize,
    pub kind: SlotKind,
}

impl Slot {
    pub fn is_evening(&self) -> bool {
        self.start >= EVENING_START
    }

    pub fn meeting(&self) -> Meeting {
        let (days, duration) = match (self.kind, self.day) {
            (SlotKind::Course, Day::Monday) => (MON | WED | FRI, 60),
            (SlotKind::Course, Day::Tuesday) => (TUE | THU, 90),
            (SlotKind::Course, Day::Friday) => (FRI, 60),
            (SlotKind::Lab, Day::Monday) => (MON | WED, 60),
            (SlotKind::Lab, Day::Tuesday) => (TUE | THU, 60),
            (SlotKind::Lab, Day::Friday) => (FRI, 120),
        };
        Meeting {
            days,
            start: self.start,
            end: self.start + duration,
        }
    }

    /// Same day code and start time, regardless of kind.
    pub fn same_time(&self, other: &Slot) -> bool {
        self.day == other.day && self.start == other.start
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.day, format_time(self.start))
    }
}

/// Parses `H:MM` / `HH:MM` into minutes after midnight.
pub fn parse_time(raw: &str) -> SfResult<u16> {
    let invalid = || SchedError::Validation(format!("Invalid time '{}'", raw));
    let (h, m) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u16 = h.trim().parse().map_err(|_| invalid())?;
    let minutes: u16 = m.trim().parse().map_err(|_| invalid())?;
    if hours >= 24 || minutes >= MINUTES_PER_HOUR {
        return Err(invalid());
    }
    Ok(hours * MINUTES_PER_HOUR + minutes)
}

pub fn format_time(minutes: u16) -> String {
    format!(
        "{}:{:02}",
        minutes / MINUTES_PER_HOUR,
        minutes % MINUTES_PER_HOUR
    )
}
