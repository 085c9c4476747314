//! This module contains an implementation of the AC-3 algorithm for establishing and maintaining
//! arc consistency. For our purposes, a grid is arc-consistent when every option for every slot
//! has, for each crossing slot, at least one option placing the same letter in the shared cell.
//! For example, if 1D doesn't have any options starting with the letter A, we want to remove any
//! options for 1A that start with the letter A.
//!
//! We keep revising arcs until no more eliminations are possible or some slot runs out of options.

use bit_set::BitSet;
use log::trace;
use std::collections::VecDeque;

use crate::domains::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordList;

/// An ordered pair of crossing slots, meaning "`slot_id` must stay consistent with
/// `other_slot_id`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    pub slot_id: SlotId,
    pub other_slot_id: SlotId,
}

/// Every arc in the grid: one per ordered pair of crossing slots.
#[must_use]
pub fn all_arcs(config: &GridConfig) -> Vec<Arc> {
    config
        .slot_configs
        .iter()
        .flat_map(|slot_config| {
            slot_config.neighbors.iter().map(move |&other_slot_id| Arc {
                slot_id: slot_config.id,
                other_slot_id,
            })
        })
        .collect()
}

/// Result from a successful call to `ac3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many revisions removed at least one option.
    pub revisions: usize,
}

/// Result from a failed call to `ac3`, identifying the slot whose options ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
    pub revisions: usize,
}

/// Result from a call to `ac3`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// FIFO worklist of arcs that never holds the same arc twice.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    queued: BitSet,
    slot_count: usize,
}

impl ArcQueue {
    fn new(slot_count: usize) -> ArcQueue {
        ArcQueue {
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
            slot_count,
        }
    }

    fn key(&self, arc: Arc) -> usize {
        arc.slot_id * self.slot_count + arc.other_slot_id
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(self.key(arc)) {
            self.queue.push_back(arc);
        }
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        let key = self.key(arc);
        self.queued.remove(key);
        Some(arc)
    }
}

/// Prune `domains` until every arc in the worklist is consistent. With `initial_arcs` of `None`
/// the worklist starts with every arc in the grid; otherwise it starts with just the given arcs.
/// Whenever a slot loses options, the arcs pointing at it from its other crossings are revisited.
/// Fails as soon as any slot's domain is emptied, leaving the prunings made so far in place (the
/// caller can roll them back with a `Checkpoint`).
pub fn ac3(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    initial_arcs: Option<&[Arc]>,
) -> ArcConsistencyResult {
    let mut queue = ArcQueue::new(config.slot_count());

    match initial_arcs {
        Some(arcs) => arcs.iter().for_each(|&arc| queue.enqueue(arc)),
        None => all_arcs(config).into_iter().for_each(|arc| queue.enqueue(arc)),
    }

    let mut revisions = 0;

    while let Some(Arc { slot_id, other_slot_id }) = queue.pop_front() {
        if !domains.revise(config, word_list, slot_id, other_slot_id) {
            continue;
        }
        revisions += 1;

        if domains.is_empty(slot_id) {
            trace!("AC-3 emptied slot {slot_id} while revising against slot {other_slot_id}");
            return Err(ArcConsistencyFailure { slot_id, revisions });
        }

        for &neighbor_id in config.neighbors(slot_id) {
            if neighbor_id != other_slot_id {
                queue.enqueue(Arc {
                    slot_id: neighbor_id,
                    other_slot_id: slot_id,
                });
            }
        }
    }

    Ok(ArcConsistencySuccess { revisions })
}

#[cfg(test)]
mod tests {
    use crate::arc_consistency::{ac3, all_arcs, Arc, ArcConsistencyFailure};
    use crate::domains::DomainStore;
    use crate::grid_config::GridConfig;
    use crate::word_list::WordList;

    const STRUCTURE: &str = "#___#\n#_##_\n#_##_\n#_##_\n#____\n";
    const WORDS: [&str; 10] =
        ["ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN"];

    fn options(domains: &DomainStore, word_list: &WordList, slot_id: usize) -> Vec<String> {
        domains.options(slot_id).map(|w| word_list.word(w).string.clone()).collect()
    }

    #[test]
    fn test_all_arcs_covers_both_directions() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();

        let arcs = all_arcs(&config);

        assert_eq!(arcs.len(), 6);
        assert!(arcs.contains(&Arc { slot_id: 0, other_slot_id: 3 }));
        assert!(arcs.contains(&Arc { slot_id: 3, other_slot_id: 0 }));
        assert!(!arcs.contains(&Arc { slot_id: 1, other_slot_id: 2 }));
    }

    #[test]
    fn test_global_ac3_prunes_to_fixpoint() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(WORDS);
        let mut domains = DomainStore::initialize(&config, &word_list);

        let result = ac3(&config, &word_list, &mut domains, None);

        assert!(result.is_ok());
        assert_eq!(options(&domains, &word_list, 0), vec!["SEVEN"]);
        assert_eq!(options(&domains, &word_list, 1), vec!["SIX"]);
        assert_eq!(options(&domains, &word_list, 2), vec!["FIVE", "NINE"]);
        assert_eq!(options(&domains, &word_list, 3), vec!["NINE"]);
    }

    #[test]
    fn test_ac3_without_crossings_is_a_no_op() {
        let config = GridConfig::from_structure_str("___").unwrap();
        let word_list = WordList::new(["CAT", "DOG", "ABCDE"]);
        let mut domains = DomainStore::initialize(&config, &word_list);
        let before = domains.clone();

        let result = ac3(&config, &word_list, &mut domains, None);

        assert_eq!(result.map(|success| success.revisions), Ok(0));
        assert_eq!(domains, before);
    }

    #[test]
    fn test_ac3_fails_when_a_domain_empties() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(["THREE", "TWO", "FOUR", "FIVE"]);
        let mut domains = DomainStore::initialize(&config, &word_list);

        let result = ac3(&config, &word_list, &mut domains, None);

        assert!(matches!(result, Err(ArcConsistencyFailure { .. })));
    }

    #[test]
    fn test_ac3_with_explicit_arcs_only_starts_from_those_arcs() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(WORDS);
        let mut domains = DomainStore::initialize(&config, &word_list);
        let seven = word_list.find("SEVEN").unwrap();
        domains.restrict_to(0, seven);

        let arcs = [
            Arc { slot_id: 1, other_slot_id: 0 },
            Arc { slot_id: 3, other_slot_id: 0 },
        ];
        let result = ac3(&config, &word_list, &mut domains, Some(&arcs));

        assert!(result.is_ok());
        assert_eq!(options(&domains, &word_list, 1), vec!["SIX"]);
        assert_eq!(options(&domains, &word_list, 3), vec!["NINE"]);
        // Slot 3 shrank, so the arc from slot 2 to slot 3 was revisited.
        assert_eq!(options(&domains, &word_list, 2), vec!["FIVE", "NINE"]);
    }
}
