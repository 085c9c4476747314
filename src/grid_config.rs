use smallvec::SmallVec;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{CrosswordError, CrosswordResult};
use crate::word_list::{WordId, WordList};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Rendered in place of blocked cells.
pub const BLOCK_CHAR: char = '█';

/// Marks a fillable cell in a structure file.
pub const OPEN_CHAR: char = '_';

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// The pair of intra-word indices at which two slots share a cell: the first slot's `index`-th
/// letter must equal the second slot's `other_index`-th letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub index: usize,
    pub other_index: usize,
}

/// The geometry of a single slot, as supplied to `GridConfig::from_slots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridEntry {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl GridEntry {
    /// Generate the coords for each cell of this entry.
    pub fn cell_coords(self) -> impl Iterator<Item = GridCoord> {
        (0..self.length).map(move |cell_idx| {
            let (row, col) = self.start_cell;
            match self.direction {
                Direction::Across => (row, col + cell_idx),
                Direction::Down => (row + cell_idx, col),
            }
        })
    }
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// For each cell in the slot, the slot crossing it there (if any).
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,

    /// Ids of every slot crossing this one, ascending.
    pub neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    /// The geometry this slot was built from.
    #[must_use]
    pub fn entry(&self) -> GridEntry {
        GridEntry {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> {
        self.entry().cell_coords()
    }
}

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A struct representing the aspects of a grid that are static during filling. Nothing in the fill
/// process mutates it.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub height: usize,
    pub width: usize,

    /// Indexed by row, then column; `true` for fillable cells.
    pub open_cells: Vec<Vec<bool>>,

    pub slot_configs: Vec<SlotConfig>,
}

impl GridConfig {
    /// Generate a grid config from a structure string, with `_` representing fillable cells and
    /// anything else representing blocks. Rows shorter than the longest one are padded with
    /// blocks.
    pub fn from_structure_str(structure: &str) -> CrosswordResult<GridConfig> {
        let rows: Vec<Vec<char>> = structure.lines().map(|line| line.chars().collect()).collect();
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);

        let open_cells: Vec<Vec<bool>> = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|col| row.get(col) == Some(&OPEN_CHAR))
                    .collect()
            })
            .collect();

        let is_open = |row: usize, col: usize| open_cells[row][col];

        // Slots are declared in row-major order of their starting cells, with a down slot coming
        // before an across slot that starts in the same cell.
        let mut entries: Vec<GridEntry> = vec![];
        for row in 0..height {
            for col in 0..width {
                if !is_open(row, col) {
                    continue;
                }

                if row == 0 || !is_open(row - 1, col) {
                    let length = (row..height).take_while(|&r| is_open(r, col)).count();
                    if length > 1 {
                        entries.push(GridEntry {
                            start_cell: (row, col),
                            direction: Direction::Down,
                            length,
                        });
                    }
                }

                if col == 0 || !is_open(row, col - 1) {
                    let length = (col..width).take_while(|&c| is_open(row, c)).count();
                    if length > 1 {
                        entries.push(GridEntry {
                            start_cell: (row, col),
                            direction: Direction::Across,
                            length,
                        });
                    }
                }
            }
        }

        GridConfig::build(height, width, open_cells, &entries)
    }

    pub fn from_structure_file<P: AsRef<Path>>(path: P) -> CrosswordResult<GridConfig> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CrosswordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        GridConfig::from_structure_str(&contents)
    }

    /// Generate a grid config from explicit slot geometry. The fillable cells are exactly the
    /// cells covered by some slot.
    pub fn from_slots(
        height: usize,
        width: usize,
        entries: &[GridEntry],
    ) -> CrosswordResult<GridConfig> {
        let mut open_cells = vec![vec![false; width]; height];

        for (entry_idx, entry) in entries.iter().enumerate() {
            if entry.length < 2 {
                return Err(CrosswordError::InvalidGrid(format!(
                    "slot {entry_idx} has length {}, but slots need at least two cells",
                    entry.length
                )));
            }
            for (row, col) in entry.cell_coords() {
                if row >= height || col >= width {
                    return Err(CrosswordError::InvalidGrid(format!(
                        "slot {entry_idx} leaves the {height}x{width} grid at ({row}, {col})"
                    )));
                }
                open_cells[row][col] = true;
            }
        }

        GridConfig::build(height, width, open_cells, entries)
    }

    /// Compute crossings and neighbors for the given entries, rejecting geometry where slots
    /// share more than one cell or more than two slots meet in a cell.
    fn build(
        height: usize,
        width: usize,
        open_cells: Vec<Vec<bool>>,
        entries: &[GridEntry],
    ) -> CrosswordResult<GridConfig> {
        // Build a map from cell location to (entry index, cell index within entry), which we can
        // then use to calculate crossings.
        let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> =
            HashMap::new();

        for (entry_idx, entry) in entries.iter().enumerate() {
            for (cell_idx, loc) in entry.cell_coords().enumerate() {
                let cell_entries = entries_by_loc.entry(loc).or_default();
                if cell_entries.len() == 2 {
                    return Err(CrosswordError::InvalidGrid(format!(
                        "more than two slots cover cell {loc:?}"
                    )));
                }
                cell_entries.push((entry_idx, cell_idx));
            }
        }

        let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(entries.len());

        for (entry_idx, entry) in entries.iter().enumerate() {
            let mut crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = SmallVec::new();
            let mut neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]> = SmallVec::new();

            for loc in entry.cell_coords() {
                let crossing = entries_by_loc[&loc]
                    .iter()
                    .find(|&&(other_entry_idx, _)| other_entry_idx != entry_idx)
                    .map(|&(other_slot_id, other_slot_cell)| Crossing {
                        other_slot_id,
                        other_slot_cell,
                    });

                if let Some(crossing) = crossing {
                    if neighbors.contains(&crossing.other_slot_id) {
                        return Err(CrosswordError::InvalidGrid(format!(
                            "slots {entry_idx} and {} share more than one cell",
                            crossing.other_slot_id
                        )));
                    }
                    if entries[crossing.other_slot_id].direction == entry.direction {
                        return Err(CrosswordError::InvalidGrid(format!(
                            "slots {entry_idx} and {} run in the same direction through {loc:?}",
                            crossing.other_slot_id
                        )));
                    }
                    neighbors.push(crossing.other_slot_id);
                }
                crossings.push(crossing);
            }

            neighbors.sort_unstable();

            slot_configs.push(SlotConfig {
                id: entry_idx,
                start_cell: entry.start_cell,
                direction: entry.direction,
                length: entry.length,
                crossings,
                neighbors,
            });
        }

        Ok(GridConfig {
            height,
            width,
            open_cells,
            slot_configs,
        })
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// Where do these two slots cross, if they do?
    #[must_use]
    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<Overlap> {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == other_slot_id => Some(Overlap {
                    index: cell_idx,
                    other_index: crossing.other_slot_cell,
                }),
                _ => None,
            })
    }

    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.slot_configs[slot_id].neighbors
    }
}

/// Turn the given grid config and fill choices into a rendered string.
#[must_use]
pub fn render_grid(config: &GridConfig, word_list: &WordList, choices: &[Choice]) -> String {
    let mut grid: Vec<Vec<char>> = config
        .open_cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|&open| if open { ' ' } else { BLOCK_CHAR })
                .collect()
        })
        .collect();

    for &Choice { slot_id, word_id } in choices {
        let slot_config = &config.slot_configs[slot_id];
        let word = word_list.word(word_id);

        for ((row, col), &glyph) in slot_config.cell_coords().zip(&word.glyphs) {
            grid[row][col] = word_list.glyphs[glyph];
        }
    }

    grid.iter()
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::grid_config::{
        render_grid, Choice, Crossing, Direction, GridConfig, GridEntry, Overlap,
    };
    use crate::word_list::WordList;

    const STRUCTURE: &str = "#___#\n#_##_\n#_##_\n#_##_\n#____\n";

    #[test]
    fn test_slots_are_declared_in_scan_order() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();

        let slots: Vec<_> = config
            .slot_configs
            .iter()
            .map(|slot| (slot.start_cell, slot.direction, slot.length))
            .collect();

        assert_eq!(
            slots,
            vec![
                ((0, 1), Direction::Down, 5),
                ((0, 1), Direction::Across, 3),
                ((1, 4), Direction::Down, 4),
                ((4, 1), Direction::Across, 4),
            ]
        );
    }

    #[test]
    fn test_overlaps_and_neighbors() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();

        assert_eq!(config.overlap(0, 1), Some(Overlap { index: 0, other_index: 0 }));
        assert_eq!(config.overlap(0, 3), Some(Overlap { index: 4, other_index: 0 }));
        assert_eq!(config.overlap(3, 0), Some(Overlap { index: 0, other_index: 4 }));
        assert_eq!(config.overlap(2, 3), Some(Overlap { index: 3, other_index: 3 }));
        assert_eq!(config.overlap(1, 2), None);
        assert_eq!(config.overlap(1, 1), None);

        assert_eq!(config.neighbors(0), &[1, 3]);
        assert_eq!(config.neighbors(3), &[0, 2]);
        assert_eq!(
            config.slot_configs[2].crossings[3],
            Some(Crossing { other_slot_id: 3, other_slot_cell: 3 })
        );
    }

    #[test]
    fn test_slot_cells_follow_direction() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();

        let down: Vec<_> = config.slot_configs[2].cell_coords().collect();
        assert_eq!(down, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);

        let across: Vec<_> = config.slot_configs[3].cell_coords().collect();
        assert_eq!(across, vec![(4, 1), (4, 2), (4, 3), (4, 4)]);
        assert_eq!(
            config.slot_configs[3].entry(),
            GridEntry { start_cell: (4, 1), direction: Direction::Across, length: 4 }
        );
    }

    #[test]
    fn test_single_cells_and_ragged_rows() {
        let config = GridConfig::from_structure_str("_#__\n_\n").unwrap();

        assert_eq!(config.width, 4);
        assert_eq!(config.slot_count(), 2);
        assert_eq!(config.slot_configs[0].direction, Direction::Down);
        assert_eq!(config.slot_configs[1].start_cell, (0, 2));
        assert!(!config.open_cells[1][3]);
    }

    #[test]
    fn test_from_slots_rejects_bad_geometry() {
        let too_short = [GridEntry { start_cell: (0, 0), direction: Direction::Across, length: 1 }];
        assert!(GridConfig::from_slots(3, 3, &too_short).is_err());

        let outside = [GridEntry { start_cell: (0, 2), direction: Direction::Across, length: 2 }];
        assert!(GridConfig::from_slots(3, 3, &outside).is_err());

        let parallel = [
            GridEntry { start_cell: (0, 0), direction: Direction::Across, length: 3 },
            GridEntry { start_cell: (0, 1), direction: Direction::Across, length: 2 },
        ];
        assert!(GridConfig::from_slots(3, 3, &parallel).is_err());
    }

    #[test]
    fn test_render_grid() {
        let config = GridConfig::from_structure_str(STRUCTURE).unwrap();
        let word_list = WordList::new(["seven", "six", "five", "nine"]);

        let partial = render_grid(&config, &word_list, &[Choice { slot_id: 1, word_id: 1 }]);
        assert_eq!(partial, "█SIX█\n█ ██ \n█ ██ \n█ ██ \n█    ");

        let choices: Vec<Choice> =
            (0..4).map(|slot_id| Choice { slot_id, word_id: slot_id }).collect();
        assert_eq!(
            render_grid(&config, &word_list, &choices),
            "█SIX█\n█E██F\n█V██I\n█E██V\n█NINE"
        );
    }
}
