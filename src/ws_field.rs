// Mine field data and generation
// Owns the tile grid, places mines and derives adjacency numbers

use rand::prelude::*;
use std::error::Error;
use std::fmt;
use tracing::{debug, info};

/// Tile number used to mark a mine (numbers 0-8 are adjacency counts)
pub const MINE: u8 = 9;

/// Visibility state of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Closed,
    Open,
    Flagged,
}

/// A single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    number: u8,            // Adjacent mine count (0-8) or MINE, fixed after generation
    pub state: TileState,  // Changes during play
}

impl Tile {
    /// Adjacent mine count, or `MINE`
    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_mine(&self) -> bool {
        self.number == MINE
    }

    pub fn is_open(&self) -> bool {
        self.state == TileState::Open
    }
}

/// Reasons a field cannot be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    ZeroWidth,
    ZeroHeight,
    NoMines,
    TooManyMines { mines: usize, cells: usize },
    OutOfBounds { row: usize, column: usize },
    DuplicateMine { row: usize, column: usize },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::ZeroWidth => write!(f, "width must be at least 1"),
            FieldError::ZeroHeight => write!(f, "height must be at least 1"),
            FieldError::NoMines => write!(f, "at least one mine is required"),
            FieldError::TooManyMines { mines, cells } => {
                write!(f, "{} mines do not fit in {} tiles", mines, cells)
            }
            FieldError::OutOfBounds { row, column } => {
                write!(f, "tile ({}, {}) is outside the field", row, column)
            }
            FieldError::DuplicateMine { row, column } => {
                write!(f, "tile ({}, {}) holds more than one mine", row, column)
            }
        }
    }
}

impl Error for FieldError {}

/// Check field parameters before anything is allocated.
/// A field needs at least one safe tile, so `mine_count < width * height`.
pub fn validate(width: usize, height: usize, mine_count: usize) -> Result<(), FieldError> {
    if width == 0 {
        return Err(FieldError::ZeroWidth);
    }
    if height == 0 {
        return Err(FieldError::ZeroHeight);
    }
    if mine_count == 0 {
        return Err(FieldError::NoMines);
    }
    let cells = width.checked_mul(height).ok_or(FieldError::TooManyMines {
        mines: mine_count,
        cells: usize::MAX,
    })?;
    if mine_count >= cells {
        return Err(FieldError::TooManyMines { mines: mine_count, cells });
    }
    Ok(())
}

/// Rectangular grid of tiles with a fixed mine layout
#[derive(Debug, Clone)]
pub struct MineField {
    width: usize,
    height: usize,
    mine_count: usize,
    tiles: Vec<Tile>, // Row-major
}

impl MineField {
    /// Generate a field using the thread-local RNG
    pub fn new(width: usize, height: usize, mine_count: usize) -> Result<Self, FieldError> {
        Self::with_rng(width, height, mine_count, &mut thread_rng())
    }

    /// Generate a field drawing mine positions from `rng`.
    /// The same seeded generator always produces the same layout.
    pub fn with_rng<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        mine_count: usize,
        rng: &mut R,
    ) -> Result<Self, FieldError> {
        validate(width, height, mine_count)?;
        info!(width, height, mine_count, "creating mine field");

        let mut field = Self::empty(width, height, mine_count);
        field.place_mines(rng);
        field.adjust_numbers();
        debug!("generated field:\n{}", field.dump());
        Ok(field)
    }

    /// Build a field with mines at the given `(row, column)` positions
    pub fn from_mines(
        width: usize,
        height: usize,
        mines: &[(usize, usize)],
    ) -> Result<Self, FieldError> {
        validate(width, height, mines.len())?;

        let mut field = Self::empty(width, height, mines.len());
        for &(row, column) in mines {
            if row >= height || column >= width {
                return Err(FieldError::OutOfBounds { row, column });
            }
            let idx = field.index(row, column);
            if field.tiles[idx].is_mine() {
                return Err(FieldError::DuplicateMine { row, column });
            }
            field.tiles[idx].number = MINE;
        }
        field.adjust_numbers();
        Ok(field)
    }

    fn empty(width: usize, height: usize, mine_count: usize) -> Self {
        MineField {
            width,
            height,
            mine_count,
            tiles: vec![
                Tile {
                    number: 0,
                    state: TileState::Closed
                };
                width * height
            ],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    fn index(&self, row: usize, column: usize) -> usize {
        row * self.width + column
    }

    /// Tile at (row, column). Panics when out of bounds.
    pub fn tile(&self, row: usize, column: usize) -> &Tile {
        assert!(
            row < self.height && column < self.width,
            "tile ({}, {}) outside {}x{} field",
            row,
            column,
            self.width,
            self.height
        );
        &self.tiles[self.index(row, column)]
    }

    pub(crate) fn tile_mut(&mut self, row: usize, column: usize) -> &mut Tile {
        assert!(
            row < self.height && column < self.width,
            "tile ({}, {}) outside {}x{} field",
            row,
            column,
            self.width,
            self.height
        );
        let idx = self.index(row, column);
        &mut self.tiles[idx]
    }

    /// Non-panicking lookup
    pub fn get(&self, row: usize, column: usize) -> Option<&Tile> {
        if row < self.height && column < self.width {
            Some(&self.tiles[self.index(row, column)])
        } else {
            None
        }
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Positions of the up to 8 neighbours of (row, column), clipped to the grid
    pub fn neighbours(&self, row: usize, column: usize) -> impl Iterator<Item = (usize, usize)> {
        let rows = row.saturating_sub(1)..=(row + 1).min(self.height - 1);
        let columns = column.saturating_sub(1)..=(column + 1).min(self.width - 1);
        rows.flat_map(move |r| columns.clone().map(move |c| (r, c)))
            .filter(move |&pos| pos != (row, column))
    }

    /// Uniform draw per mine, probing forward (with wrap) past cells that already hold one.
    /// Cells after a run of mines are slightly favoured; fine for play.
    fn place_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.tiles.len();
        for _ in 0..self.mine_count {
            let mut spot = rng.gen_range(0..n);
            while self.tiles[spot].is_mine() {
                spot = (spot + 1) % n;
            }
            self.tiles[spot].number = MINE;
        }
    }

    fn adjust_numbers(&mut self) {
        for row in 0..self.height {
            for column in 0..self.width {
                if !self.tile(row, column).is_mine() {
                    let count = self.count_mines_around(row, column);
                    self.tile_mut(row, column).number = count;
                }
            }
        }
    }

    fn count_mines_around(&self, row: usize, column: usize) -> u8 {
        self.neighbours(row, column)
            .filter(|&(r, c)| self.tile(r, c).is_mine())
            .count() as u8
    }

    fn dump(&self) -> String {
        let mut out = String::with_capacity(self.tiles.len() * 2);
        for row in self.tiles.chunks(self.width) {
            for tile in row {
                if tile.is_mine() {
                    out.push_str("* ");
                } else {
                    out.push_str(&format!("{} ", tile.number));
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn brute_force_count(field: &MineField, row: usize, column: usize) -> u8 {
        let mut count = 0;
        for r in 0..field.height() as isize {
            for c in 0..field.width() as isize {
                let dr = (r - row as isize).abs();
                let dc = (c - column as isize).abs();
                if (dr, dc) != (0, 0) && dr <= 1 && dc <= 1 && field.tile(r as usize, c as usize).is_mine() {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn generated_fields_hold_exact_mine_count_and_numbers() {
        let params = [(9, 9, 10), (16, 16, 40), (30, 16, 99), (1, 2, 1), (5, 1, 4), (4, 4, 15)];
        for seed in 0..20u64 {
            for &(w, h, m) in &params {
                let mut rng = StdRng::seed_from_u64(seed);
                let field = MineField::with_rng(w, h, m, &mut rng).unwrap();
                let mines = field.tiles().iter().filter(|t| t.is_mine()).count();
                assert_eq!(mines, m, "seed {} params {:?}", seed, (w, h, m));
                for row in 0..h {
                    for column in 0..w {
                        let tile = field.tile(row, column);
                        assert_eq!(tile.state, TileState::Closed);
                        if !tile.is_mine() {
                            assert_eq!(tile.number(), brute_force_count(&field, row, column));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a = MineField::with_rng(16, 16, 40, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = MineField::with_rng(16, 16, 40, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.tiles(), b.tiles());
    }

    #[test]
    fn nearly_full_field_terminates() {
        let field = MineField::with_rng(3, 3, 8, &mut StdRng::seed_from_u64(1)).unwrap();
        let safe: Vec<_> = field.tiles().iter().filter(|t| !t.is_mine()).collect();
        assert_eq!(safe.len(), 1);
    }

    #[test]
    fn rejects_impossible_fields() {
        assert_eq!(MineField::new(0, 5, 1).unwrap_err(), FieldError::ZeroWidth);
        assert_eq!(MineField::new(5, 0, 1).unwrap_err(), FieldError::ZeroHeight);
        assert_eq!(MineField::new(5, 5, 0).unwrap_err(), FieldError::NoMines);
        assert_eq!(
            MineField::new(3, 3, 9).unwrap_err(),
            FieldError::TooManyMines { mines: 9, cells: 9 }
        );
        assert!(MineField::new(3, 3, 8).is_ok());
    }

    #[test]
    fn fixed_mine_in_corner() {
        // * 1 .
        // 1 1 .
        // . . .
        let field = MineField::from_mines(3, 3, &[(0, 0)]).unwrap();
        assert!(field.tile(0, 0).is_mine());
        assert_eq!(field.tile(0, 1).number(), 1);
        assert_eq!(field.tile(1, 0).number(), 1);
        assert_eq!(field.tile(1, 1).number(), 1);
        assert_eq!(field.tile(2, 2).number(), 0);
        assert_eq!(field.tile(0, 2).number(), 0);
    }

    #[test]
    fn fixed_mines_validation() {
        assert_eq!(
            MineField::from_mines(3, 3, &[(3, 0)]).unwrap_err(),
            FieldError::OutOfBounds { row: 3, column: 0 }
        );
        assert_eq!(
            MineField::from_mines(3, 3, &[(1, 1), (1, 1)]).unwrap_err(),
            FieldError::DuplicateMine { row: 1, column: 1 }
        );
    }

    #[test]
    fn neighbours_are_clipped() {
        let field = MineField::from_mines(4, 3, &[(0, 0)]).unwrap();
        assert_eq!(field.neighbours(0, 0).count(), 3);
        assert_eq!(field.neighbours(0, 1).count(), 5);
        assert_eq!(field.neighbours(1, 1).count(), 8);
        assert_eq!(field.neighbours(2, 3).count(), 3);
        assert!(field.neighbours(1, 1).all(|p| p != (1, 1)));
    }

    #[test]
    fn single_column_neighbours() {
        let field = MineField::from_mines(1, 3, &[(0, 0)]).unwrap();
        let around: Vec<_> = field.neighbours(1, 0).collect();
        assert_eq!(around, vec![(0, 0), (2, 0)]);
        assert_eq!(field.tile(1, 0).number(), 1);
        assert_eq!(field.tile(2, 0).number(), 0);
    }

    #[test]
    fn get_is_bounds_checked() {
        let field = MineField::from_mines(2, 2, &[(0, 0)]).unwrap();
        assert!(field.get(1, 1).is_some());
        assert!(field.get(2, 0).is_none());
        assert!(field.get(0, 2).is_none());
    }

    #[test]
    #[should_panic]
    fn tile_out_of_bounds_panics() {
        let field = MineField::from_mines(2, 2, &[(0, 0)]).unwrap();
        field.tile(0, 2);
    }
}
