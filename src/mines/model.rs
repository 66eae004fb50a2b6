//! Game state: a grid of flag-bit cells with mine placement, flood-fill
//! opening and flag/question marking.

use bitflags::bitflags;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("field must have at least one cell")]
    EmptyField,
    #[error("{rows}x{cols} cells exceed the supported field size")]
    FieldTooLarge { rows: u32, cols: u32 },
    #[error("{mines} mines do not fit into {cells} cells")]
    TooManyMines { mines: u32, cells: u32 },
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct CellFlags: u8 {
        const MINE = 1 << 0;
        const OPEN = 1 << 1;
        const FLAG = 1 << 2;
        /// The mine that ended the game.
        const TRAP = 1 << 3;
        const QUESTION = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    neighbours: u8,
    flags: CellFlags,
}

/// Deterministic splitmix64 generator, seeded per game so layouts are
/// reproducible from the CLI.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn next_below(&mut self, bound: u32) -> u32 {
        (self.next_u64() % u64::from(bound)) as u32
    }
}

#[derive(Debug)]
pub struct Model {
    rows: u32,
    cols: u32,
    mines: u32,
    opened: u32,
    flagged: u32,
    trapped: bool,
    cells: Vec<Cell>,
}

impl Model {
    pub fn new(rows: u32, cols: u32, mines: u32, rng: &mut SplitMix64) -> Result<Self, ModelError> {
        if rows == 0 || cols == 0 {
            return Err(ModelError::EmptyField);
        }
        let Some(cells) = rows.checked_mul(cols) else {
            return Err(ModelError::FieldTooLarge { rows, cols });
        };
        if mines >= cells {
            return Err(ModelError::TooManyMines { mines, cells });
        }
        let mut model = Self {
            rows,
            cols,
            mines,
            opened: 0,
            flagged: 0,
            trapped: false,
            cells: vec![Cell::default(); cells as usize],
        };
        model.place_mines(rng);
        model.calc_neighbours();
        Ok(model)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn mines(&self) -> u32 {
        self.mines
    }

    pub fn flags(&self) -> u32 {
        self.flagged
    }

    pub fn is_trapped(&self) -> bool {
        self.trapped
    }

    /// Won when every mine carries a flag and no flag is misplaced.
    pub fn is_done(&self) -> bool {
        self.flagged == self.mines
            && self
                .cells
                .iter()
                .all(|c| !(c.flags.contains(CellFlags::FLAG) && !c.flags.contains(CellFlags::MINE)))
    }

    pub fn is_open(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).flags.contains(CellFlags::OPEN)
    }

    pub fn is_flag(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).flags.contains(CellFlags::FLAG)
    }

    pub fn is_question(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).flags.contains(CellFlags::QUESTION)
    }

    pub fn is_mine(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).flags.contains(CellFlags::MINE)
    }

    pub fn is_trap_mine(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).flags.contains(CellFlags::TRAP)
    }

    pub fn mines_nearby(&self, row: u32, col: u32) -> u8 {
        self.cell(row, col).neighbours
    }

    /// Opens a cell; opening a mine traps the game, opening a cell with
    /// no neighbouring mines flood-opens the area around it.
    pub fn open(&mut self, row: u32, col: u32) {
        if self.open_one(row, col) && self.mines_nearby(row, col) == 0 {
            self.open_around(row, col);
        }
    }

    /// Cycles a closed cell through flag, question and clear.
    pub fn mark(&mut self, row: u32, col: u32) {
        let cell = self.cell_mut(row, col);
        if cell.flags.contains(CellFlags::OPEN) {
            return;
        }
        if cell.flags.contains(CellFlags::FLAG) {
            cell.flags.remove(CellFlags::FLAG);
            cell.flags.insert(CellFlags::QUESTION);
            self.flagged -= 1;
        } else if cell.flags.contains(CellFlags::QUESTION) {
            cell.flags.remove(CellFlags::QUESTION);
        } else {
            cell.flags.insert(CellFlags::FLAG);
            self.flagged += 1;
        }
    }

    fn cell(&self, row: u32, col: u32) -> &Cell {
        &self.cells[(row * self.cols + col) as usize]
    }

    fn cell_mut(&mut self, row: u32, col: u32) -> &mut Cell {
        &mut self.cells[(row * self.cols + col) as usize]
    }

    /// True when the cell was newly opened and is safe to flood from.
    fn open_one(&mut self, row: u32, col: u32) -> bool {
        let cell = self.cell_mut(row, col);
        if cell.flags.contains(CellFlags::OPEN) {
            return false;
        }
        cell.flags.insert(CellFlags::OPEN);
        if cell.flags.contains(CellFlags::FLAG) {
            cell.flags.remove(CellFlags::FLAG);
            self.flagged -= 1;
        } else {
            self.cell_mut(row, col).flags.remove(CellFlags::QUESTION);
        }
        self.opened += 1;
        if self.cell(row, col).flags.contains(CellFlags::MINE) {
            self.cell_mut(row, col).flags.insert(CellFlags::TRAP);
            self.trapped = true;
            return false;
        }
        true
    }

    fn open_around(&mut self, row: u32, col: u32) {
        let max_row = self.rows - 1;
        let max_col = self.cols - 1;
        if row > 0 {
            if col > 0 {
                self.open(row - 1, col - 1);
            }
            self.open(row - 1, col);
            if col < max_col {
                self.open(row - 1, col + 1);
            }
        }
        if col > 0 {
            self.open(row, col - 1);
        }
        if col < max_col {
            self.open(row, col + 1);
        }
        if row < max_row {
            if col > 0 {
                self.open(row + 1, col - 1);
            }
            self.open(row + 1, col);
            if col < max_col {
                self.open(row + 1, col + 1);
            }
        }
    }

    fn place_mines(&mut self, rng: &mut SplitMix64) {
        let mut placed = 0;
        while placed < self.mines {
            let row = rng.next_below(self.rows);
            let col = rng.next_below(self.cols);
            if self.cell(row, col).flags.contains(CellFlags::MINE) {
                continue;
            }
            self.cell_mut(row, col).flags.insert(CellFlags::MINE);
            placed += 1;
        }
    }

    fn calc_neighbours(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.is_mine(row, col) {
                    continue;
                }
                let mut count = 0;
                for dr in -1i64..=1 {
                    for dc in -1i64..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        let r = row as i64 + dr;
                        let c = col as i64 + dc;
                        if r >= 0
                            && c >= 0
                            && r < self.rows as i64
                            && c < self.cols as i64
                            && self.is_mine(r as u32, c as u32)
                        {
                            count += 1;
                        }
                    }
                }
                self.cell_mut(row, col).neighbours = count;
            }
        }
    }
}
