use crate::model::slot::SlotId;

/// One entry per class, courses first and labs after. `None` marks an
/// unassigned class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Assignment {
    slots: Vec<Option<SlotId>>,
}

impl Assignment {
    pub fn unassigned(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn from_slots(slots: Vec<Option<SlotId>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, class: usize) -> Option<SlotId> {
        self.slots[class]
    }

    #[inline(always)]
    pub fn set(&mut self, class: usize, slot: Option<SlotId>) {
        self.slots[class] = slot;
    }

    pub fn as_slice(&self) -> &[Option<SlotId>] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<SlotId>> + '_ {
        self.slots.iter().copied()
    }

    /// Iterates `(class, slot)` over assigned entries only.
    pub fn assigned(&self) -> impl Iterator<Item = (usize, SlotId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|slot| (i, slot)))
    }

    pub fn unassigned_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
