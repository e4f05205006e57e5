// Screen flow and per-screen state
// Title -> difficulty -> (custom form) -> game, driven by explicit navigation messages

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::ws_board::{Board, Outcome};
use crate::ws_field::MineField;
use crate::ws_game::{Config, Difficulty};

/// Navigation messages produced by input handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Play,              // title -> difficulty selection
    Back,              // one step back in the menu
    OpenCustom,        // difficulty -> custom form
    Start(Difficulty), // any menu -> game
    SubmitCustom,      // validate the custom form and start
    Retry,             // new board with the same parameters
    Menu,              // game -> title, dropping the board
    Quit,
}

/// Menu sub-states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuState {
    Title,
    Difficulty,
    Custom(CustomForm),
}

#[derive(Debug)]
pub enum Screen {
    Menu(MenuState),
    Game(GameScreen),
}

/// Input form for a custom field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomForm {
    pub fields: [String; 3], // width, height, mines
    pub focus: usize,
    pub error: Option<String>,
}

pub const CUSTOM_LABELS: [&str; 3] = ["Width:", "Height:", "Mines:"];
const CUSTOM_MAX_DIGITS: usize = 4;

impl CustomForm {
    /// Prefill with the last custom parameters
    pub fn from_config(cfg: &Config) -> Self {
        CustomForm {
            fields: [
                cfg.custom_width.to_string(),
                cfg.custom_height.to_string(),
                cfg.custom_mines.to_string(),
            ],
            focus: 0,
            error: None,
        }
    }

    pub fn push_digit(&mut self, c: char) {
        let field = &mut self.fields[self.focus];
        if c.is_ascii_digit() && field.len() < CUSTOM_MAX_DIGITS {
            field.push(c);
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].pop();
        self.error = None;
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    /// Parse into a custom difficulty; the error text is shown under the form
    pub fn parse(&self) -> Result<Difficulty, String> {
        let mut values = [0usize; 3];
        for (value, field) in values.iter_mut().zip(&self.fields) {
            *value = field.trim().parse().unwrap_or(0);
        }
        let d = Difficulty::Custom(values[0], values[1], values[2]);
        d.validate().map_err(|e| format!("Field not possible! ({})", e))?;
        Ok(d)
    }
}

pub const MIN_ZOOM: u16 = 1;
pub const MAX_ZOOM: u16 = 4;

/// Viewport over the board: top-left tile plus zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Camera {
    pub row: usize,
    pub column: usize,
    pub zoom: u16,
}

/// Where a mouse drag started, in terminal cells, and the camera at that moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragAnchor {
    pub x: u16,
    pub y: u16,
    pub camera: Camera,
}

/// Size of the board viewport in terminal cells plus the tile geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub tile_size: u16, // theme columns per tile at zoom 1
}

impl Default for Camera {
    fn default() -> Self {
        Camera { row: 0, column: 0, zoom: 1 }
    }
}

impl Camera {
    /// Terminal (columns, rows) covered by one tile
    pub fn tile_cells(&self, tile_size: u16) -> (u16, u16) {
        (tile_size.max(1) * self.zoom, self.zoom)
    }

    /// Number of whole tiles visible as (columns, rows)
    pub fn visible(&self, view: &Viewport) -> (usize, usize) {
        let (tw, th) = self.tile_cells(view.tile_size);
        ((view.width / tw) as usize, (view.height / th) as usize)
    }

    /// Keep the view inside the board
    pub fn clamp(&mut self, view: &Viewport, board_w: usize, board_h: usize) {
        let (cols, rows) = self.visible(view);
        self.column = self.column.min(board_w.saturating_sub(cols));
        self.row = self.row.min(board_h.saturating_sub(rows));
    }

    pub fn pan(&mut self, drow: isize, dcol: isize, view: &Viewport, board_w: usize, board_h: usize) {
        self.row = self.row.saturating_add_signed(drow);
        self.column = self.column.saturating_add_signed(dcol);
        self.clamp(view, board_w, board_h);
    }

    pub fn zoom_by(&mut self, delta: i16, view: &Viewport, board_w: usize, board_h: usize) {
        let zoom = (self.zoom as i16 + delta).clamp(MIN_ZOOM as i16, MAX_ZOOM as i16);
        self.zoom = zoom as u16;
        self.clamp(view, board_w, board_h);
    }

    /// Scroll just enough to keep (row, column) on screen
    pub fn follow(&mut self, row: usize, column: usize, view: &Viewport, board_w: usize, board_h: usize) {
        let (cols, rows) = self.visible(view);
        let (cols, rows) = (cols.max(1), rows.max(1));
        if column < self.column {
            self.column = column;
        } else if column >= self.column + cols {
            self.column = column + 1 - cols;
        }
        if row < self.row {
            self.row = row;
        } else if row >= self.row + rows {
            self.row = row + 1 - rows;
        }
        self.clamp(view, board_w, board_h);
    }

    /// Move the camera with a drag: the board follows the pointer
    pub fn drag(anchor: &DragAnchor, x: u16, y: u16, view: &Viewport, board_w: usize, board_h: usize) -> Camera {
        let mut cam = anchor.camera;
        let (tw, th) = cam.tile_cells(view.tile_size);
        let dcol = (anchor.x as isize - x as isize) / tw as isize;
        let drow = (anchor.y as isize - y as isize) / th as isize;
        cam.pan(drow, dcol, view, board_w, board_h);
        cam
    }

    /// Tile under a terminal position, if any
    pub fn tile_at(&self, x: u16, y: u16, view: &Viewport, field: &MineField) -> Option<(usize, usize)> {
        if x < view.x || y < view.y || x >= view.x + view.width || y >= view.y + view.height {
            return None;
        }
        let (tw, th) = self.tile_cells(view.tile_size);
        let column = self.column + ((x - view.x) / tw) as usize;
        let row = self.row + ((y - view.y) / th) as usize;
        field.get(row, column).map(|_| (row, column))
    }
}

/// An active game plus its presentation state
#[derive(Debug)]
pub struct GameScreen {
    pub board: Board,
    pub difficulty: Difficulty,
    pub camera: Camera,
    pub cursor: (usize, usize), // (row, column)
    pub quit_dialog: bool,
    started: Option<Instant>,
    finished: Option<Duration>,
}

impl GameScreen {
    pub fn new(difficulty: Difficulty, board: Board) -> Self {
        GameScreen {
            board,
            difficulty,
            camera: Camera::default(),
            cursor: (0, 0),
            quit_dialog: false,
            started: None,
            finished: None,
        }
    }

    /// Seconds since the first click, frozen when the game ends
    pub fn elapsed_secs(&self) -> u64 {
        match (self.finished, self.started) {
            (Some(d), _) => d.as_secs(),
            (None, Some(t0)) => t0.elapsed().as_secs(),
            (None, None) => 0,
        }
    }

    fn accepts_input(&self) -> bool {
        !self.quit_dialog && self.board.outcome() == Outcome::Playing
    }

    /// Counters that change whenever a move changes some tile state
    fn snapshot(&self) -> (usize, usize, Outcome) {
        (self.board.remaining_safe_tiles(), self.board.flag_count(), self.board.outcome())
    }

    // The clock starts on the first move that changes the board
    fn after_move(&mut self, before: (usize, usize, Outcome)) {
        if self.started.is_none() && self.snapshot() != before {
            self.started = Some(Instant::now());
        }
        if self.board.outcome().is_over() && self.finished.is_none() {
            self.finished = Some(self.started.map(|t0| t0.elapsed()).unwrap_or_default());
            info!(outcome = ?self.board.outcome(), secs = self.elapsed_secs(), "game finished");
        }
    }

    /// Primary click; chords on open numbers only when auto-chord is enabled
    pub fn left_click(&mut self, row: usize, column: usize, auto_chord: bool) {
        if !self.accepts_input() {
            return;
        }
        let before = self.snapshot();
        if auto_chord {
            self.board.handle_left_click(row, column);
        } else {
            self.board.reveal(row, column);
        }
        self.after_move(before);
    }

    pub fn right_click(&mut self, row: usize, column: usize) {
        if !self.accepts_input() {
            return;
        }
        let before = self.snapshot();
        self.board.handle_right_click(row, column);
        self.after_move(before);
    }

    pub fn chord(&mut self, row: usize, column: usize) {
        if !self.accepts_input() {
            return;
        }
        let before = self.snapshot();
        self.board.chord(row, column);
        self.after_move(before);
    }

    pub fn move_cursor(&mut self, drow: isize, dcol: isize) {
        let row = self.cursor.0.saturating_add_signed(drow).min(self.board.height() - 1);
        let column = self.cursor.1.saturating_add_signed(dcol).min(self.board.width() - 1);
        self.cursor = (row, column);
    }
}

/// Top-level application state
#[derive(Debug)]
pub struct App {
    pub screen: Screen,
    pub running: bool,
}

impl Default for App {
    fn default() -> Self {
        App {
            screen: Screen::Menu(MenuState::Title),
            running: true,
        }
    }
}

impl App {
    /// Apply a navigation message; `cfg` remembers the chosen difficulty
    pub fn navigate(&mut self, nav: Nav, cfg: &mut Config) {
        debug!(?nav, "navigate");
        let mut start = None;
        match (&mut self.screen, nav) {
            (_, Nav::Quit) => self.running = false,
            (Screen::Menu(state @ MenuState::Title), Nav::Play) => *state = MenuState::Difficulty,
            (Screen::Menu(state @ MenuState::Difficulty), Nav::Back) => *state = MenuState::Title,
            (Screen::Menu(state @ MenuState::Difficulty), Nav::OpenCustom) => {
                *state = MenuState::Custom(CustomForm::from_config(cfg))
            }
            (Screen::Menu(state @ MenuState::Custom(_)), Nav::Back) => *state = MenuState::Difficulty,
            (Screen::Menu(MenuState::Custom(form)), Nav::SubmitCustom) => match form.parse() {
                Ok(d) => start = Some(d),
                Err(msg) => form.error = Some(msg),
            },
            (Screen::Menu(_), Nav::Start(d)) => start = Some(d),
            (Screen::Game(game), Nav::Retry) => match game.board.retry() {
                Ok(board) => {
                    info!(difficulty = game.difficulty.name(), "retry");
                    *game = GameScreen::new(game.difficulty, board);
                }
                Err(e) => info!(error = %e, "retry failed"),
            },
            (screen @ Screen::Game(_), Nav::Menu) => {
                info!("back to menu");
                *screen = Screen::Menu(MenuState::Title);
            }
            (_, nav) => debug!(?nav, "ignored navigation"),
        }
        if let Some(d) = start {
            self.start(d, cfg);
        }
    }

    fn start(&mut self, d: Difficulty, cfg: &mut Config) {
        match d.new_board() {
            Ok(board) => {
                info!(difficulty = d.name(), params = ?d.params(), "starting game");
                cfg.set_difficulty(d);
                self.screen = Screen::Game(GameScreen::new(d, board));
            }
            Err(e) => {
                let mut form = CustomForm::from_config(cfg);
                form.error = Some(format!("Field not possible! ({})", e));
                self.screen = Screen::Menu(MenuState::Custom(form));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Viewport {
        Viewport { x: 10, y: 5, width: 20, height: 6, tile_size: 2 }
    }

    #[test]
    fn menu_flow() {
        let mut cfg = Config::default();
        let mut app = App::default();
        app.navigate(Nav::Play, &mut cfg);
        assert!(matches!(app.screen, Screen::Menu(MenuState::Difficulty)));
        app.navigate(Nav::Back, &mut cfg);
        assert!(matches!(app.screen, Screen::Menu(MenuState::Title)));
        app.navigate(Nav::Play, &mut cfg);
        app.navigate(Nav::Start(Difficulty::Intermediate), &mut cfg);
        match &app.screen {
            Screen::Game(g) => assert_eq!((g.board.width(), g.board.height(), g.board.mine_count()), (16, 16, 40)),
            _ => panic!("expected game screen"),
        }
        assert_eq!(cfg.difficulty, Difficulty::Intermediate);
        app.navigate(Nav::Menu, &mut cfg);
        assert!(matches!(app.screen, Screen::Menu(MenuState::Title)));
        app.navigate(Nav::Quit, &mut cfg);
        assert!(!app.running);
    }

    #[test]
    fn custom_form_rejects_impossible_field() {
        let mut cfg = Config::default();
        let mut app = App::default();
        app.navigate(Nav::Play, &mut cfg);
        app.navigate(Nav::OpenCustom, &mut cfg);
        if let Screen::Menu(MenuState::Custom(form)) = &mut app.screen {
            form.fields = ["3".into(), "3".into(), "9".into()];
        }
        app.navigate(Nav::SubmitCustom, &mut cfg);
        match &app.screen {
            Screen::Menu(MenuState::Custom(form)) => {
                assert!(form.error.as_deref().unwrap().starts_with("Field not possible!"))
            }
            _ => panic!("expected custom form"),
        }
        assert_eq!(cfg.difficulty, Difficulty::Easy);

        if let Screen::Menu(MenuState::Custom(form)) = &mut app.screen {
            form.fields[2] = "8".into();
        }
        app.navigate(Nav::SubmitCustom, &mut cfg);
        assert!(matches!(app.screen, Screen::Game(_)));
        assert_eq!(cfg.difficulty, Difficulty::Custom(3, 3, 8));
        assert_eq!(cfg.custom_mines, 8);
    }

    #[test]
    fn custom_form_editing() {
        let mut form = CustomForm::from_config(&Config::default());
        form.fields[0].clear();
        form.push_digit('1');
        form.push_digit('x');
        form.push_digit('2');
        assert_eq!(form.fields[0], "12");
        form.next_field();
        form.backspace();
        assert_eq!(form.fields[1], "2");
        form.prev_field();
        form.prev_field();
        assert_eq!(form.focus, 2);
        form.fields = [String::new(), "5".into(), "1".into()];
        assert!(form.parse().is_err());
    }

    #[test]
    fn retry_replaces_board_with_same_parameters() {
        let mut cfg = Config::default();
        let mut app = App::default();
        app.navigate(Nav::Start(Difficulty::Easy), &mut cfg);
        if let Screen::Game(g) = &mut app.screen {
            g.right_click(0, 0);
            g.quit_dialog = true;
        }
        app.navigate(Nav::Retry, &mut cfg);
        match &app.screen {
            Screen::Game(g) => {
                assert_eq!(g.board.flag_count(), 0);
                assert_eq!(g.board.mine_count(), 10);
                assert!(!g.quit_dialog);
                assert_eq!(g.elapsed_secs(), 0);
            }
            _ => panic!("expected game screen"),
        }
    }

    #[test]
    fn clock_waits_for_a_move_that_changes_the_board() {
        let field = MineField::from_mines(3, 3, &[(0, 0)]).unwrap();
        let mut g = GameScreen::new(Difficulty::Custom(3, 3, 1), Board::from_field(field));
        g.right_click(1, 1);
        g.started = None;
        // flagged tile: the click is ignored
        g.left_click(1, 1, true);
        assert!(g.started.is_none());
        // chord on a closed tile does nothing either
        g.chord(0, 1);
        assert!(g.started.is_none());
        g.right_click(1, 1);
        assert!(g.started.is_some());

        let field = MineField::from_mines(3, 3, &[(0, 0)]).unwrap();
        let mut g = GameScreen::new(Difficulty::Custom(3, 3, 1), Board::from_field(field));
        g.left_click(0, 1, true);
        assert!(g.started.is_some());
        assert_eq!(g.board.outcome(), Outcome::Playing);
    }

    #[test]
    fn game_screen_respects_auto_chord_setting() {
        let field = MineField::from_mines(3, 3, &[(0, 0)]).unwrap();
        let mut g = GameScreen::new(Difficulty::Custom(3, 3, 1), Board::from_field(field));
        g.left_click(1, 1, false);
        g.right_click(0, 0);
        g.left_click(1, 1, false);
        assert!(!g.board.tile(2, 2).is_open());
        g.left_click(1, 1, true);
        assert!(g.board.tile(2, 2).is_open());
        assert_eq!(g.board.outcome(), Outcome::Won);
    }

    #[test]
    fn quit_dialog_blocks_board_input() {
        let field = MineField::from_mines(3, 3, &[(0, 0)]).unwrap();
        let mut g = GameScreen::new(Difficulty::Custom(3, 3, 1), Board::from_field(field));
        g.quit_dialog = true;
        g.left_click(2, 2, true);
        g.right_click(1, 1);
        assert_eq!(g.board.remaining_safe_tiles(), 8);
        assert_eq!(g.board.flag_count(), 0);
    }

    #[test]
    fn cursor_is_clamped() {
        let field = MineField::from_mines(4, 3, &[(0, 0)]).unwrap();
        let mut g = GameScreen::new(Difficulty::Custom(4, 3, 1), Board::from_field(field));
        g.move_cursor(-1, -1);
        assert_eq!(g.cursor, (0, 0));
        g.move_cursor(10, 10);
        assert_eq!(g.cursor, (2, 3));
    }

    #[test]
    fn camera_maps_mouse_to_tiles() {
        let cam = Camera::default();
        let v = view();
        let hard = MineField::from_mines(30, 16, &[(0, 0)]).unwrap();
        assert_eq!(cam.tile_at(10, 5, &v, &hard), Some((0, 0)));
        assert_eq!(cam.tile_at(13, 6, &v, &hard), Some((1, 1)));
        assert_eq!(cam.tile_at(9, 5, &v, &hard), None);
        assert_eq!(cam.tile_at(30, 5, &v, &hard), None);
        // zoomed in: tiles are 4 columns by 2 rows
        let cam = Camera { row: 2, column: 3, zoom: 2 };
        assert_eq!(cam.tile_at(18, 8, &v, &hard), Some((3, 5)));
        // board smaller than the view
        let small = MineField::from_mines(4, 4, &[(0, 0)]).unwrap();
        assert_eq!(Camera::default().tile_at(20, 5, &v, &small), None);
    }

    #[test]
    fn camera_pan_zoom_and_follow_stay_in_bounds() {
        let v = view(); // 10 x 6 tiles at zoom 1
        let mut cam = Camera::default();
        assert_eq!(cam.visible(&v), (10, 6));
        cam.pan(100, 100, &v, 30, 16);
        assert_eq!((cam.row, cam.column), (10, 20));
        cam.pan(-3, -25, &v, 30, 16);
        assert_eq!((cam.row, cam.column), (7, 0));
        cam.zoom_by(10, &v, 30, 16);
        assert_eq!(cam.zoom, MAX_ZOOM);
        cam.zoom_by(-10, &v, 30, 16);
        assert_eq!(cam.zoom, MIN_ZOOM);

        let mut cam = Camera::default();
        cam.follow(15, 29, &v, 30, 16);
        assert_eq!((cam.row, cam.column), (10, 20));
        cam.follow(0, 0, &v, 30, 16);
        assert_eq!((cam.row, cam.column), (0, 0));
        // small boards never scroll
        cam.pan(5, 5, &v, 4, 4);
        assert_eq!((cam.row, cam.column), (0, 0));
    }

    #[test]
    fn camera_drag_moves_opposite_to_pointer() {
        let v = view();
        let anchor = DragAnchor { x: 20, y: 8, camera: Camera { row: 5, column: 5, zoom: 1 } };
        let cam = Camera::drag(&anchor, 16, 6, &v, 30, 16);
        assert_eq!((cam.row, cam.column), (7, 7));
        let cam = Camera::drag(&anchor, 24, 10, &v, 30, 16);
        assert_eq!((cam.row, cam.column), (3, 3));
    }
}
