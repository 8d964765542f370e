pub mod assignment;
pub mod class;
pub mod context;
pub mod department;
pub mod problem;
pub mod slot;

pub use assignment::Assignment;
pub use class::ClassId;
pub use context::{ClassRules, Preference, ProblemContext};
pub use problem::{PreferenceSpec, ProblemSpec, SlotRef, SlotSpec};
pub use slot::{Day, Meeting, Slot, SlotId, SlotKind};
