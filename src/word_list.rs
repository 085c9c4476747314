use smallvec::SmallVec;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{CrosswordError, CrosswordResult};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// An identifier for a given letter or whatever, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// Number of cells this word occupies, which is its char count rather than its byte count.
    #[must_use]
    pub fn length(&self) -> usize {
        self.glyphs.len()
    }
}

/// The vocabulary available to a fill. Every distinct (normalized) string appears exactly once, so
/// two slots hold the same word iff they hold the same `WordId`.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,
    pub words: Vec<Word>,
    glyph_ids_by_char: HashMap<char, GlyphId>,
    word_ids_by_string: HashMap<String, WordId>,
}

/// Entries are compared case-insensitively, so everything is stored uppercase.
fn normalize_word(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

impl WordList {
    /// Build a word list from raw entries, skipping blanks and ignoring repeats.
    pub fn new<I, S>(raw_words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList::default();
        for raw_word in raw_words {
            word_list.add_word(raw_word.as_ref());
        }
        word_list
    }

    /// Load a newline-separated vocabulary file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CrosswordResult<WordList> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CrosswordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(WordList::new(contents.lines()))
    }

    /// Add a single entry, returning its id. Adding a word that's already present returns the
    /// existing id.
    pub fn add_word(&mut self, raw_word: &str) -> Option<WordId> {
        let string = normalize_word(raw_word)?;

        if let Some(&word_id) = self.word_ids_by_string.get(&string) {
            return Some(word_id);
        }

        let glyphs = string
            .chars()
            .map(|char| {
                *self.glyph_ids_by_char.entry(char).or_insert_with(|| {
                    self.glyphs.push(char);
                    self.glyphs.len() - 1
                })
            })
            .collect();

        let word_id = self.words.len();
        self.word_ids_by_string.insert(string.clone(), word_id);
        self.words.push(Word { string, glyphs });
        Some(word_id)
    }

    /// Look up a word by its text, using the same normalization as loading.
    #[must_use]
    pub fn find(&self, raw_word: &str) -> Option<WordId> {
        normalize_word(raw_word).and_then(|string| self.word_ids_by_string.get(&string).copied())
    }

    #[must_use]
    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of distinct glyphs across all words.
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}
