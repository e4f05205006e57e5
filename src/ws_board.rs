// Board controller: reveal, flag, chord and flood logic on top of a MineField
// Tracks the remaining safe tiles and derives win/loss

use tracing::{debug, info};

use crate::ws_field::{FieldError, MineField, Tile, TileState};

/// Game result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_over(self) -> bool {
        self != Outcome::Playing
    }
}

/// Interaction state for one game
#[derive(Debug, Clone)]
pub struct Board {
    field: MineField,
    remaining_safe: usize, // Safe tiles still closed or flagged
    outcome: Outcome,
}

impl Board {
    pub fn new(width: usize, height: usize, mine_count: usize) -> Result<Self, FieldError> {
        Ok(Self::from_field(MineField::new(width, height, mine_count)?))
    }

    /// Take ownership of a freshly generated field
    pub fn from_field(field: MineField) -> Self {
        let remaining_safe = field.width() * field.height() - field.mine_count();
        Board {
            field,
            remaining_safe,
            outcome: Outcome::Playing,
        }
    }

    /// New board with the same dimensions and mine count; nothing else carries over
    pub fn retry(&self) -> Result<Self, FieldError> {
        Self::new(self.width(), self.height(), self.mine_count())
    }

    pub fn width(&self) -> usize {
        self.field.width()
    }

    pub fn height(&self) -> usize {
        self.field.height()
    }

    pub fn mine_count(&self) -> usize {
        self.field.mine_count()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn remaining_safe_tiles(&self) -> usize {
        self.remaining_safe
    }

    pub fn field(&self) -> &MineField {
        &self.field
    }

    pub fn tile(&self, row: usize, column: usize) -> &Tile {
        self.field.tile(row, column)
    }

    pub fn flag_count(&self) -> usize {
        self.field
            .tiles()
            .iter()
            .filter(|t| t.state == TileState::Flagged)
            .count()
    }

    /// Mine counter value; negative when the player over-flags
    pub fn remaining_mines(&self) -> isize {
        self.mine_count() as isize - self.flag_count() as isize
    }

    /// Primary click: chord on an open number, otherwise reveal
    pub fn handle_left_click(&mut self, row: usize, column: usize) {
        let tile = self.field.tile(row, column);
        if tile.is_open() && tile.number() > 0 {
            self.chord(row, column);
        } else {
            self.reveal(row, column);
        }
    }

    /// Secondary click: toggle a flag on a closed tile
    pub fn handle_right_click(&mut self, row: usize, column: usize) {
        if self.outcome.is_over() {
            return;
        }
        let tile = self.field.tile_mut(row, column);
        tile.state = match tile.state {
            TileState::Closed => TileState::Flagged,
            TileState::Flagged => TileState::Closed,
            TileState::Open => TileState::Open,
        };
    }

    /// Open one tile; flags and open tiles are left alone
    pub fn reveal(&mut self, row: usize, column: usize) {
        if self.outcome.is_over() {
            return;
        }
        let tile = *self.field.tile(row, column);
        if tile.state != TileState::Closed {
            return;
        }
        debug!(row, column, number = tile.number(), "reveal");

        if tile.is_mine() {
            self.field.tile_mut(row, column).state = TileState::Open;
            self.explode();
            return;
        }
        if tile.number() == 0 {
            self.flood_reveal(row, column);
        } else {
            self.field.tile_mut(row, column).state = TileState::Open;
            self.remaining_safe -= 1;
        }
        self.check_win();
    }

    /// Reveal every neighbour of an open number once its flags match the number.
    /// Under- or over-flagged neighbourhoods are left untouched.
    pub fn chord(&mut self, row: usize, column: usize) {
        if self.outcome.is_over() {
            return;
        }
        let center = *self.field.tile(row, column);
        if !center.is_open() || center.is_mine() {
            return;
        }
        let around: Vec<(usize, usize)> = self.field.neighbours(row, column).collect();
        let flags = around
            .iter()
            .filter(|&&(r, c)| self.field.tile(r, c).state == TileState::Flagged)
            .count();
        if flags != center.number() as usize {
            debug!(row, column, flags, number = center.number(), "chord refused");
            return;
        }
        debug!(row, column, "chord");
        for (r, c) in around {
            // reveal() stops as soon as the game is over
            self.reveal(r, c);
        }
    }

    /// Open the connected zero region around (row, column) plus its numbered border.
    /// Tiles are opened as they are queued, so each one enters the stack at most once
    /// and the stack never holds more than the board. Returns the number of tiles visited.
    fn flood_reveal(&mut self, row: usize, column: usize) -> usize {
        self.flood_open(row, column);
        let mut stack = vec![(row, column)];
        let mut around = Vec::with_capacity(8);
        let mut visited = 0usize;
        while let Some((r, c)) = stack.pop() {
            visited += 1;
            if self.field.tile(r, c).number() != 0 {
                continue;
            }
            let field = &self.field;
            around.clear();
            around.extend(field.neighbours(r, c).filter(|&(nr, nc)| !field.tile(nr, nc).is_open()));
            for &(nr, nc) in &around {
                self.flood_open(nr, nc);
                stack.push((nr, nc));
            }
        }
        debug!(row, column, visited, "flood reveal");
        visited
    }

    // Flags are cleared along the way; only safe tiles count toward the win
    fn flood_open(&mut self, row: usize, column: usize) {
        let tile = self.field.tile_mut(row, column);
        tile.state = TileState::Open;
        if !tile.is_mine() {
            self.remaining_safe -= 1;
        }
    }

    fn explode(&mut self) {
        info!(remaining_safe = self.remaining_safe, "mine hit, game lost");
        self.outcome = Outcome::Lost;
        for row in 0..self.height() {
            for column in 0..self.width() {
                let tile = self.field.tile_mut(row, column);
                if tile.is_mine() {
                    tile.state = TileState::Open;
                }
            }
        }
    }

    fn check_win(&mut self) {
        if self.remaining_safe == 0 && self.outcome == Outcome::Playing {
            info!("all safe tiles open, game won");
            self.outcome = Outcome::Won;
        }
    }
}
