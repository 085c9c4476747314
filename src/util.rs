use bit_set::BitSet;
use smallvec::SmallVec;

use crate::word_list::{WordId, WordList};
use crate::MAX_GLYPH_COUNT;

/// Number of occurrences of each glyph in one cell across a slot's options, indexed by `GlyphId`.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// Count how many of the given options place each glyph in the given cell.
pub fn build_glyph_counts_for_cell<I>(word_list: &WordList, cell_idx: usize, options: I) -> GlyphCounts
where
    I: IntoIterator<Item = WordId>,
{
    let mut result: GlyphCounts = (0..word_list.glyph_count()).map(|_| 0).collect();

    for word_id in options {
        if let Some(&glyph) = word_list.word(word_id).glyphs.get(cell_idx) {
            result[glyph] += 1;
        }
    }

    result
}

/// The set of glyphs that at least one of the given options places in the given cell.
pub fn glyphs_in_cell<I>(word_list: &WordList, cell_idx: usize, options: I) -> BitSet
where
    I: IntoIterator<Item = WordId>,
{
    let mut result = BitSet::with_capacity(word_list.glyph_count());

    for word_id in options {
        if let Some(&glyph) = word_list.word(word_id).glyphs.get(cell_idx) {
            result.insert(glyph);
        }
    }

    result
}
