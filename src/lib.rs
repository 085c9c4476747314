//! Crossword filling as a constraint satisfaction problem: each slot gets exactly one word from a
//! word list so that lengths match, no word repeats, and crossing slots agree on shared letters.
//! Domains are made node- and arc-consistent up front, then a backtracking search maintains arc
//! consistency as it assigns words.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod consistency;
pub mod domains;
pub mod error;
pub mod grid_config;
pub mod util;
pub mod word_list;

pub use backtracking_search::{find_fill, FillContext, FillFailure, FillSuccess, Statistics};
pub use consistency::{is_complete, is_consistent, Assignment};
pub use error::{CrosswordError, CrosswordResult};
pub use grid_config::{render_grid, Choice, GridConfig};
pub use word_list::WordList;

pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum number of distinct characters/rebuses/whatever appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
