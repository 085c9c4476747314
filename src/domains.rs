//! Candidate-word sets for every slot. Every removal is recorded on a trail, so a caller can take a
//! `Checkpoint` before making tentative changes and later `restore` the exact prior state.

use bit_set::BitSet;

use crate::grid_config::{GridConfig, SlotId};
use crate::util::glyphs_in_cell;
use crate::word_list::{WordId, WordList};

/// A position in the removal trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStore {
    /// For each slot, the ids of the words still considered possible.
    domains: Vec<BitSet>,

    /// Cached sizes of `domains`, since `BitSet::len` has to scan.
    sizes: Vec<usize>,

    /// Every removal made so far, in order.
    trail: Vec<(SlotId, WordId)>,
}

impl DomainStore {
    /// Give every slot each word of the right length. This establishes node consistency; a slot
    /// can come out of it with an empty domain.
    #[must_use]
    pub fn initialize(config: &GridConfig, word_list: &WordList) -> DomainStore {
        let domains: Vec<BitSet> = config
            .slot_configs
            .iter()
            .map(|slot_config| {
                let mut domain = BitSet::with_capacity(word_list.len());
                for (word_id, word) in word_list.words.iter().enumerate() {
                    if word.length() == slot_config.length {
                        domain.insert(word_id);
                    }
                }
                domain
            })
            .collect();

        let sizes = domains.iter().map(BitSet::len).collect();

        DomainStore {
            domains,
            sizes,
            trail: vec![],
        }
    }

    #[must_use]
    pub fn domain(&self, slot_id: SlotId) -> &BitSet {
        &self.domains[slot_id]
    }

    /// The remaining options for a slot, in ascending id order.
    pub fn options(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[slot_id].iter()
    }

    #[must_use]
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.sizes[slot_id]
    }

    #[must_use]
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.sizes[slot_id] == 0
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    /// The lowest-numbered slot with no options left, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.sizes.iter().position(|&size| size == 0)
    }

    /// Does every option for every slot have that slot's length?
    #[must_use]
    pub fn is_node_consistent(&self, config: &GridConfig, word_list: &WordList) -> bool {
        config.slot_configs.iter().all(|slot_config| {
            self.options(slot_config.id)
                .all(|word_id| word_list.word(word_id).length() == slot_config.length)
        })
    }

    /// Remove a word from a slot's domain, returning whether it was there.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.domains[slot_id].remove(word_id) {
            return false;
        }
        self.sizes[slot_id] -= 1;
        self.trail.push((slot_id, word_id));
        true
    }

    /// Reduce a slot's domain to the single given word. The word should already be in the domain.
    pub fn restrict_to(&mut self, slot_id: SlotId, word_id: WordId) {
        let others: Vec<WordId> = self.options(slot_id).filter(|&w| w != word_id).collect();
        for other in others {
            self.remove(slot_id, other);
        }
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.trail.len())
    }

    /// Undo every removal made since the checkpoint was taken.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        while self.trail.len() > checkpoint.0 {
            if let Some((slot_id, word_id)) = self.trail.pop() {
                self.domains[slot_id].insert(word_id);
                self.sizes[slot_id] += 1;
            }
        }
    }

    /// Make `slot_id` arc-consistent with `other_slot_id`: remove every option whose letter at the
    /// shared cell doesn't appear at that cell in any of the other slot's current options. Returns
    /// whether anything was removed. Slots that don't cross are left alone.
    pub fn revise(
        &mut self,
        config: &GridConfig,
        word_list: &WordList,
        slot_id: SlotId,
        other_slot_id: SlotId,
    ) -> bool {
        let Some(overlap) = config.overlap(slot_id, other_slot_id) else {
            return false;
        };

        let supported_glyphs =
            glyphs_in_cell(word_list, overlap.other_index, self.options(other_slot_id));

        let unsupported: Vec<WordId> = self
            .options(slot_id)
            .filter(|&word_id| {
                word_list
                    .word(word_id)
                    .glyphs
                    .get(overlap.index)
                    .map_or(true, |&glyph| !supported_glyphs.contains(glyph))
            })
            .collect();

        for &word_id in &unsupported {
            self.remove(slot_id, word_id);
        }

        !unsupported.is_empty()
    }
}
