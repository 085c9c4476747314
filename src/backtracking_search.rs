//! This module implements grid-filling as a depth-first backtracking search. Slots are chosen by
//! minimum remaining values with the degree heuristic as a tie-break, words are tried in
//! least-constraining-value order, and arc consistency is maintained by running AC-3 on the arcs
//! into each newly-assigned slot (forward checking). Every domain change made below a choice is
//! recorded on the domain store's trail, and rolled back exactly when the choice is abandoned.

use instant::{Duration, Instant};
use log::{debug, trace};
use smallvec::SmallVec;
use std::cmp::Reverse;

use crate::arc_consistency::{ac3, Arc};
use crate::consistency::{is_complete, is_consistent, Assignment};
use crate::domains::{Checkpoint, DomainStore};
use crate::grid_config::{Choice, GridConfig, SlotId};
use crate::util::{build_glyph_counts_for_cell, GlyphCounts};
use crate::word_list::{WordId, WordList};
use crate::{CHECK_INVARIANTS, MAX_SLOT_LENGTH};

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// How many search nodes (slot selections) we expanded.
    pub states: u64,

    /// How many candidate words were rejected or undone.
    pub backtracks: u64,

    /// How many arc revisions removed at least one option.
    pub revisions: u64,

    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,

    /// One choice per slot, in slot order.
    pub choices: Vec<Choice>,
}

/// Why no fill exists. None of these leave a partial fill behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFailure {
    /// No word in the list has the right length for this slot.
    EmptyDomain(SlotId),

    /// Establishing arc consistency before searching emptied this slot's domain.
    InitialArcConsistency(SlotId),

    /// Every branch of the search was tried without completing the grid.
    HardFailure,
}

/// All of the mutable state for a single fill attempt.
#[derive(Debug, Clone)]
pub struct FillContext<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: DomainStore,
    assignment: Assignment,
    statistics: Statistics,
}

impl<'a> FillContext<'a> {
    /// Set up a fill attempt with node-consistent domains and nothing assigned.
    #[must_use]
    pub fn new(config: &'a GridConfig, word_list: &'a WordList) -> FillContext<'a> {
        FillContext {
            config,
            word_list,
            domains: DomainStore::initialize(config, word_list),
            assignment: Assignment::new(config.slot_count()),
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }

    #[must_use]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Check that every slot has options and make the whole grid arc-consistent. This is the
    /// starting point for the search; it can only fail if the grid is unfillable.
    pub fn enforce_initial_consistency(&mut self) -> Result<(), FillFailure> {
        if let Some(slot_id) = self.domains.first_empty_slot() {
            debug!("Slot {slot_id} has no words of length {}", self.config.slot_configs[slot_id].length);
            return Err(FillFailure::EmptyDomain(slot_id));
        }

        match ac3(self.config, self.word_list, &mut self.domains, None) {
            Ok(success) => {
                self.statistics.revisions += success.revisions as u64;
                debug!("Initial arc consistency made {} revisions", success.revisions);
                Ok(())
            }
            Err(failure) => {
                self.statistics.revisions += failure.revisions as u64;
                debug!("Initial arc consistency emptied slot {}", failure.slot_id);
                Err(FillFailure::InitialArcConsistency(failure.slot_id))
            }
        }
    }

    /// Choose the unassigned slot with the fewest remaining options, preferring slots with more
    /// crossings and then lower ids.
    #[must_use]
    pub fn select_unassigned(&self) -> Option<SlotId> {
        (0..self.config.slot_count())
            .filter(|&slot_id| self.assignment.get(slot_id).is_none())
            .min_by_key(|&slot_id| {
                (
                    self.domains.len(slot_id),
                    Reverse(self.config.neighbors(slot_id).len()),
                    slot_id,
                )
            })
    }

    /// Order a slot's options by how many options each would rule out of the unassigned slots
    /// crossing it, fewest first, with ties going to the lower word id.
    #[must_use]
    pub fn order_values(&self, slot_id: SlotId) -> Vec<WordId> {
        let slot_config = &self.config.slot_configs[slot_id];

        // For each cell crossing an unassigned slot: that slot's option count, and how many of
        // its options place each glyph in the shared cell.
        let crossing_counts: SmallVec<[Option<(usize, GlyphCounts)>; MAX_SLOT_LENGTH]> =
            slot_config
                .crossings
                .iter()
                .map(|&crossing| {
                    crossing
                        .filter(|crossing| self.assignment.get(crossing.other_slot_id).is_none())
                        .map(|crossing| {
                            (
                                self.domains.len(crossing.other_slot_id),
                                build_glyph_counts_for_cell(
                                    self.word_list,
                                    crossing.other_slot_cell,
                                    self.domains.options(crossing.other_slot_id),
                                ),
                            )
                        })
                })
                .collect();

        let mut ranked: Vec<(usize, WordId)> = self
            .domains
            .options(slot_id)
            .map(|word_id| {
                let word = self.word_list.word(word_id);
                let eliminated: usize = crossing_counts
                    .iter()
                    .zip(&word.glyphs)
                    .map(|(counts, &glyph)| match counts {
                        Some((option_count, glyph_counts)) => {
                            option_count - glyph_counts[glyph] as usize
                        }
                        None => 0,
                    })
                    .sum();
                (eliminated, word_id)
            })
            .collect();

        ranked.sort_unstable();
        ranked.into_iter().map(|(_, word_id)| word_id).collect()
    }

    /// Tentatively make a choice: assign the word, check the assignment, reduce the slot's domain
    /// to the word and propagate into its crossings. On success, returns the checkpoint to hand to
    /// `retract` to undo all of it. On failure nothing is left changed.
    pub fn extend(&mut self, choice: Choice) -> Option<Checkpoint> {
        let Choice { slot_id, word_id } = choice;

        if self.assignment.get(slot_id).is_some() || !self.domains.contains(slot_id, word_id) {
            return None;
        }

        let checkpoint = self.domains.checkpoint();
        self.assignment.assign(slot_id, word_id);

        if !is_consistent(self.config, self.word_list, &self.assignment) {
            self.assignment.unassign(slot_id);
            return None;
        }

        self.domains.restrict_to(slot_id, word_id);

        let arcs: SmallVec<[Arc; MAX_SLOT_LENGTH]> = self
            .config
            .neighbors(slot_id)
            .iter()
            .map(|&neighbor_id| Arc {
                slot_id: neighbor_id,
                other_slot_id: slot_id,
            })
            .collect();

        match ac3(self.config, self.word_list, &mut self.domains, Some(&arcs)) {
            Ok(success) => {
                self.statistics.revisions += success.revisions as u64;
                Some(checkpoint)
            }
            Err(failure) => {
                self.statistics.revisions += failure.revisions as u64;
                trace!(
                    "Choosing {:?} for slot {slot_id} empties slot {}",
                    self.word_list.word(word_id).string,
                    failure.slot_id
                );
                self.retract(slot_id, checkpoint);
                None
            }
        }
    }

    /// Undo a choice made by `extend`, along with every domain change made since its checkpoint.
    pub fn retract(&mut self, slot_id: SlotId, checkpoint: Checkpoint) {
        self.assignment.unassign(slot_id);
        self.domains.restore(checkpoint);
    }

    /// Search for a complete assignment extending the current one. Returns false (with the state
    /// as it was on entry) if there isn't one.
    fn backtrack(&mut self) -> bool {
        if is_complete(self.config, &self.assignment) {
            return true;
        }
        let Some(slot_id) = self.select_unassigned() else {
            return true;
        };

        self.statistics.states += 1;
        trace!(
            "State {}: filling slot {slot_id} with {} options ({} of {} slots assigned)",
            self.statistics.states,
            self.domains.len(slot_id),
            self.assignment.len(),
            self.config.slot_count()
        );

        for word_id in self.order_values(slot_id) {
            if let Some(checkpoint) = self.extend(Choice { slot_id, word_id }) {
                if self.backtrack() {
                    return true;
                }
                self.retract(slot_id, checkpoint);
            }
            self.statistics.backtracks += 1;
        }

        false
    }

    /// Run initial consistency, then search. `statistics().duration` covers both, whatever the
    /// outcome.
    pub fn search(&mut self) -> Result<(), FillFailure> {
        let start = Instant::now();

        let outcome = self.enforce_initial_consistency().and_then(|()| {
            if self.backtrack() {
                Ok(())
            } else {
                Err(FillFailure::HardFailure)
            }
        });

        self.statistics.duration = start.elapsed();
        outcome
    }

    /// Run the whole fill and hand back the result.
    pub fn solve(mut self) -> Result<FillSuccess, FillFailure> {
        if let Err(failure) = self.search() {
            debug!("Fill failed ({:?}) after {:?}", failure, self.statistics);
            return Err(failure);
        }

        if CHECK_INVARIANTS {
            assert!(
                self.domains.is_node_consistent(self.config, self.word_list),
                "Domains lost node consistency"
            );
            assert!(
                is_consistent(self.config, self.word_list, &self.assignment)
                    && is_complete(self.config, &self.assignment),
                "Search returned an invalid fill"
            );
        }

        debug!("Found a fill: {:?}", self.statistics);

        Ok(FillSuccess {
            choices: self.assignment.choices(),
            assignment: self.assignment,
            statistics: self.statistics,
        })
    }
}

/// Search for a valid fill for the given grid.
pub fn find_fill(config: &GridConfig, word_list: &WordList) -> Result<FillSuccess, FillFailure> {
    FillContext::new(config, word_list).solve()
}

#[cfg(test)]
mod tests {
    use crate::backtracking_search::{find_fill, FillContext, FillFailure};
    use crate::consistency::{is_complete, is_consistent};
    use crate::grid_config::{render_grid, Choice, GridConfig};
    use crate::word_list::WordList;
    use instant::Duration;

    const STRUCTURE: &str = "#___#\n#_##_\n#_##_\n#_##_\n#____\n";
    const WORDS: [&str; 10] =
        ["ONE", "TWO", "THREE", "FOUR", "FIVE", "SIX", "SEVEN", "EIGHT", "NINE", "TEN"];

    #[test]
    fn test_find_fill_for_single_slot() {
        let config = GridConfig::from_structure_str("___").unwrap();
        let word_list = WordList::new(["CAT", "DOG", "ABCDE"]);

        let result = find_fill(&config, &word_list).expect("Failed to find a fill");

        assert_eq!(result.assignment.get(0), word_list.find("CAT"));
        assert_eq!(result.statistics.states, 1);
        assert_eq!(result.statistics.backtracks, 0);
    }

    #[test]
    fn test_find_fill_for_small_structure() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(WORDS);

        let result = find_fill(&config, &word_list).expect("Failed to find a fill");

        assert!(is_consistent(&config, &word_list, &result.assignment));
        assert!(is_complete(&config, &result.assignment));
        assert_eq!(result.choices.len(), 4);
        assert_eq!(
            render_grid(&config, &word_list, &result.choices),
            "█SIX█\n█E██F\n█V██I\n█E██V\n█NINE"
        );
    }

    #[test]
    fn test_fill_is_reproducible() {
        let config = GridConfig::from_structure_str("____\n_##_\n_##_\n____").unwrap();
        let word_list = WordList::new([
            "ABLE", "AREA", "EARN", "NEAR", "ARMS", "SEAL", "LAND", "DARE", "ERAS", "ALSO",
            "ODDS", "SODA", "AXES", "EASE",
        ]);

        let first = find_fill(&config, &word_list).map(|result| result.choices);
        let second = find_fill(&config, &word_list).map(|result| result.choices);

        assert_eq!(first, second);
    }

    #[test]
    fn test_uniqueness_exhausts_search() {
        let config = GridConfig::from_structure_str("___\n###\n___\n###\n___").unwrap();
        let word_list = WordList::new(["CAT", "DOG"]);

        let result = find_fill(&config, &word_list);

        assert_eq!(result.map(|r| r.choices), Err(FillFailure::HardFailure));
    }

    #[test]
    fn test_missing_length_fails_before_search() {
        let config = GridConfig::from_structure_str("___\n###\n____").unwrap();
        let word_list = WordList::new(["CAT", "DOG"]);

        let result = find_fill(&config, &word_list);

        assert_eq!(result.map(|r| r.choices), Err(FillFailure::EmptyDomain(1)));
    }

    #[test]
    fn test_initial_arc_consistency_failure() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(["THREE", "TWO", "FOUR", "FIVE"]);

        let result = find_fill(&config, &word_list);

        assert!(matches!(
            result.map(|r| r.choices),
            Err(FillFailure::InitialArcConsistency(_))
        ));
    }

    #[test]
    fn test_fill_fails_gracefully() {
        // Four slots but only three distinct words.
        let config = GridConfig::from_structure_str("__\n__").unwrap();
        let word_list = WordList::new(["AB", "BA", "AA"]);

        let result = find_fill(&config, &word_list);

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_grid_is_trivially_filled() {
        let config = GridConfig::from_structure_str("#_#\n###").unwrap();
        let word_list = WordList::new(["CAT"]);

        let result = find_fill(&config, &word_list).expect("Failed to find a fill");

        assert!(result.choices.is_empty());
    }

    #[test]
    fn test_select_unassigned_uses_mrv_then_degree() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(WORDS);
        let mut context = FillContext::new(&config, &word_list);

        // Before any propagation: slot 0 has 3 options, slots 2 and 3 have 3, slot 1 has 4. Slots
        // 0 and 3 have two crossings, slot 2 has one.
        assert_eq!(context.select_unassigned(), Some(0));

        context.enforce_initial_consistency().unwrap();
        // Slots 0, 1 and 3 are down to one option; 0 is first among the two-crossing ones.
        assert_eq!(context.select_unassigned(), Some(0));

        let seven = word_list.find("SEVEN").unwrap();
        let checkpoint = context.extend(Choice { slot_id: 0, word_id: seven });
        assert!(checkpoint.is_some());
        assert_eq!(context.select_unassigned(), Some(3));
    }

    #[test]
    fn test_order_values_prefers_least_constraining() {
        // One across slot crossed by two down slots at its first and last cells.
        let config = GridConfig::from_structure_str("___\n_#_").unwrap();
        let word_list = WordList::new(["XYZ", "ABA", "AB", "AA", "BA", "XB"]);
        let context = FillContext::new(&config, &word_list);

        let across = (0..config.slot_count())
            .find(|&slot_id| config.slot_configs[slot_id].length == 3)
            .unwrap();

        // "ABA" leaves AB and AA in both downs; "XYZ" leaves only XB in one and nothing in the
        // other.
        assert_eq!(
            context.order_values(across),
            vec![word_list.find("ABA").unwrap(), word_list.find("XYZ").unwrap()]
        );
    }

    #[test]
    fn test_exhausted_search_records_statistics() {
        // Two unconnected slots and a single word, which may only be used once.
        let config = GridConfig::from_structure_str("___\n###\n___").unwrap();
        let word_list = WordList::new(["CAT"]);
        let mut context = FillContext::new(&config, &word_list);

        assert_eq!(context.search(), Err(FillFailure::HardFailure));
        assert!(context.statistics().states > 0);
        assert!(context.statistics().backtracks > 0);
        assert!(context.statistics().duration > Duration::ZERO);
    }

    #[test]
    fn test_failed_extend_leaves_no_trace() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(WORDS);
        let mut context = FillContext::new(&config, &word_list);
        let before = (context.domains().clone(), context.assignment().clone());

        // THREE ends in E, and none of the four-letter options start with E.
        let three = word_list.find("THREE").unwrap();
        assert!(context.extend(Choice { slot_id: 0, word_id: three }).is_none());

        assert_eq!((context.domains().clone(), context.assignment().clone()), before);
    }

    #[test]
    fn test_retract_restores_state() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(WORDS);
        let mut context = FillContext::new(&config, &word_list);
        let before = (context.domains().clone(), context.assignment().clone());

        let seven = word_list.find("SEVEN").unwrap();
        let checkpoint = context
            .extend(Choice { slot_id: 0, word_id: seven })
            .expect("SEVEN should be a viable choice");
        assert_eq!(context.domains().len(1), 1);

        let six = word_list.find("SIX").unwrap();
        let inner = context.extend(Choice { slot_id: 1, word_id: six }).unwrap();
        context.retract(1, inner);
        context.retract(0, checkpoint);

        assert_eq!((context.domains().clone(), context.assignment().clone()), before);
    }
}
