use std::collections::HashSet;

use crate::grid_config::{Choice, GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// A (possibly partial) mapping from slots to chosen words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An assignment over `slot_count` slots with nothing chosen yet.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            word_ids: vec![None; slot_count],
            assigned_count: 0,
        }
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids.get(slot_id).copied().flatten()
    }

    /// Assign a word to a slot, returning the word it replaced.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        let previous = self.word_ids[slot_id].replace(word_id);
        if previous.is_none() {
            self.assigned_count += 1;
        }
        previous
    }

    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.word_ids[slot_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    /// Number of slots with a word.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Assigned (slot, word) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.word_ids
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }
}

/// Is this assignment free of conflicts? Every assigned word has to fit its slot, no word can be
/// used twice, and crossing slots that are both assigned have to agree on their shared letter.
#[must_use]
pub fn is_consistent(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> bool {
    let mut used_word_ids: HashSet<WordId> = HashSet::with_capacity(assignment.len());

    for (slot_id, word_id) in assignment.iter() {
        let Some(slot_config) = config.slot_configs.get(slot_id) else {
            return false;
        };
        let Some(word) = word_list.words.get(word_id) else {
            return false;
        };

        if word.length() != slot_config.length || !used_word_ids.insert(word_id) {
            return false;
        }

        for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
            let Some(crossing) = crossing else {
                continue;
            };
            let Some(other_word_id) = assignment.get(crossing.other_slot_id) else {
                continue;
            };
            let other_glyph = word_list
                .words
                .get(other_word_id)
                .and_then(|other_word| other_word.glyphs.get(crossing.other_slot_cell));

            if other_glyph != Some(&word.glyphs[cell_idx]) {
                return false;
            }
        }
    }

    true
}

/// Does every slot in the grid have a word?
#[must_use]
pub fn is_complete(config: &GridConfig, assignment: &Assignment) -> bool {
    (0..config.slot_count()).all(|slot_id| assignment.get(slot_id).is_some())
}
