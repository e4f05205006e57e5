// Visual themes for the terminal renderer
// A theme is a sprite table indexed like a sprite sheet plus a few colors

use ratatui::style::{Color, Modifier};
use term_color_support::ColorSupport;

use crate::ws_field::{Tile, TileState, MINE};

/// Sprite indices: 0-8 are numbers, then mine, closed tile and flag
pub const SPRITE_MINE: usize = MINE as usize;
pub const SPRITE_CLOSED: usize = 10;
pub const SPRITE_FLAG: usize = 11;
pub const SPRITE_COUNT: usize = 12;

/// A glyph with its foreground color
pub type Sprite = (&'static str, Color);

/// How titles and headings are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub modifier: Modifier,
    pub letter_spacing: usize, // spaces inserted between title letters
}

impl Font {
    /// Spread a title out according to the letter spacing
    pub fn layout(&self, text: &str) -> String {
        let gap = " ".repeat(self.letter_spacing);
        text.chars()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(&gap)
    }
}

/// Everything the renderer needs from a theme
pub trait Theme {
    fn name(&self) -> &'static str;

    /// Terminal columns per tile at zoom 1
    fn tile_size(&self) -> u16;

    /// Sprite at `index` (see the SPRITE_* constants)
    fn sprite(&self, index: usize) -> Sprite;

    fn background(&self) -> Color;
    fn font(&self) -> Font;
    fn font_color(&self) -> Color;
}

/// Sprite index for a tile as the player sees it
pub fn sprite_index(tile: &Tile) -> usize {
    match tile.state {
        TileState::Open => tile.number() as usize,
        TileState::Closed => SPRITE_CLOSED,
        TileState::Flagged => SPRITE_FLAG,
    }
}

/// Windows Terminal "Campbell" palette: ((R, G, B), 256-color index)
fn campbell(color: Color) -> Option<((u8, u8, u8), u8)> {
    Some(match color {
        Color::Black => ((12, 12, 12), 232),
        Color::Red => ((197, 15, 31), 160),
        Color::Green => ((19, 161, 14), 28),
        Color::Yellow => ((193, 156, 0), 178),
        Color::Blue => ((0, 55, 218), 20),
        Color::Magenta => ((136, 23, 152), 90),
        Color::Cyan => ((58, 150, 221), 38),
        Color::Gray => ((204, 204, 204), 250),
        Color::DarkGray => ((118, 118, 118), 243),
        Color::LightRed => ((231, 72, 86), 203),
        Color::LightGreen => ((22, 198, 12), 46),
        Color::LightYellow => ((249, 241, 165), 229),
        Color::LightBlue => ((59, 120, 255), 63),
        Color::LightMagenta => ((180, 0, 158), 163),
        Color::LightCyan => ((97, 214, 214), 116),
        Color::White => ((242, 242, 242), 255),
        _ => return None,
    })
}

/// Color depth the terminal can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    TrueColor,
    Indexed256,
    Basic,
}

impl ColorDepth {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        if support.has_16m {
            ColorDepth::TrueColor
        } else if support.has_256 {
            ColorDepth::Indexed256
        } else {
            ColorDepth::Basic
        }
    }

    /// Map a named ANSI color to the same look on every terminal.
    /// Rgb colors are downgraded to the nearest gray ramp step on 256-color terminals.
    pub fn adapt(self, color: Color) -> Color {
        match (self, color) {
            (ColorDepth::Basic, c) => c,
            (ColorDepth::TrueColor, c) => match campbell(c) {
                Some(((r, g, b), _)) => Color::Rgb(r, g, b),
                None => c,
            },
            (ColorDepth::Indexed256, Color::Rgb(r, g, b)) => {
                let level = (r as u16 + g as u16 + b as u16) / 3;
                Color::Indexed(232 + (level * 23 / 255) as u8)
            }
            (ColorDepth::Indexed256, c) => match campbell(c) {
                Some((_, idx)) => Color::Indexed(idx),
                None => c,
            },
        }
    }
}

const NUMBER_COLORS: [Color; 9] = [
    Color::Reset,
    Color::Blue,
    Color::Green,
    Color::Red,
    Color::Magenta,
    Color::Yellow,
    Color::Cyan,
    Color::Black,
    Color::DarkGray,
];

/// Unicode glyphs on a silver board
pub struct ClassicTheme {
    sheet: [Sprite; SPRITE_COUNT],
    background: Color,
    font_color: Color,
}

impl ClassicTheme {
    pub fn new(depth: ColorDepth) -> Self {
        const GLYPHS: [&str; SPRITE_COUNT] = [" ", "1", "2", "3", "4", "5", "6", "7", "8", "☼", "■", "⚑"];
        let mut sheet = [(" ", Color::Reset); SPRITE_COUNT];
        for (i, glyph) in GLYPHS.iter().enumerate() {
            let color = match i {
                0..=8 => NUMBER_COLORS[i],
                SPRITE_MINE => Color::Black,
                SPRITE_CLOSED => Color::White,
                _ => Color::Red,
            };
            sheet[i] = (*glyph, depth.adapt(color));
        }
        ClassicTheme {
            sheet,
            background: depth.adapt(Color::Rgb(0xc0, 0xc0, 0xc0)),
            font_color: depth.adapt(Color::Yellow),
        }
    }
}

impl Theme for ClassicTheme {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn tile_size(&self) -> u16 {
        2
    }

    fn sprite(&self, index: usize) -> Sprite {
        self.sheet[index.min(SPRITE_COUNT - 1)]
    }

    fn background(&self) -> Color {
        self.background
    }

    fn font(&self) -> Font {
        Font {
            modifier: Modifier::BOLD,
            letter_spacing: 1,
        }
    }

    fn font_color(&self) -> Color {
        self.font_color
    }
}

/// Plain ASCII for terminals without good Unicode fonts
pub struct AsciiTheme {
    depth: ColorDepth,
}

impl AsciiTheme {
    pub fn new(depth: ColorDepth) -> Self {
        AsciiTheme { depth }
    }
}

impl Theme for AsciiTheme {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn tile_size(&self) -> u16 {
        2
    }

    fn sprite(&self, index: usize) -> Sprite {
        const GLYPHS: [&str; SPRITE_COUNT] = [".", "1", "2", "3", "4", "5", "6", "7", "8", "*", "#", "F"];
        let index = index.min(SPRITE_COUNT - 1);
        let color = match index {
            0 => Color::DarkGray,
            1..=8 => NUMBER_COLORS[index],
            SPRITE_MINE => Color::LightRed,
            SPRITE_CLOSED => Color::Gray,
            _ => Color::Yellow,
        };
        (GLYPHS[index], self.depth.adapt(color))
    }

    fn background(&self) -> Color {
        self.depth.adapt(Color::Black)
    }

    fn font(&self) -> Font {
        Font {
            modifier: Modifier::empty(),
            letter_spacing: 0,
        }
    }

    fn font_color(&self) -> Color {
        self.depth.adapt(Color::White)
    }
}

pub const THEME_NAMES: [&str; 2] = ["classic", "ascii"];

/// Look up a theme by name, falling back to classic
pub fn theme_by_name(name: &str, depth: ColorDepth) -> Box<dyn Theme> {
    match name {
        "ascii" => Box::new(AsciiTheme::new(depth)),
        _ => Box::new(ClassicTheme::new(depth)),
    }
}

/// Name of the theme after `current` in THEME_NAMES
pub fn next_theme_name(current: &str) -> &'static str {
    let pos = THEME_NAMES.iter().position(|n| *n == current).unwrap_or(0);
    THEME_NAMES[(pos + 1) % THEME_NAMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_board::Board;
    use crate::ws_field::MineField;

    #[test]
    fn sprite_index_follows_tile_state() {
        let mut board = Board::from_field(MineField::from_mines(3, 3, &[(0, 0)]).unwrap());
        assert_eq!(sprite_index(board.tile(1, 1)), SPRITE_CLOSED);
        board.handle_right_click(0, 0);
        assert_eq!(sprite_index(board.tile(0, 0)), SPRITE_FLAG);
        board.handle_left_click(1, 1);
        assert_eq!(sprite_index(board.tile(1, 1)), 1);
        board.handle_right_click(0, 0);
        board.handle_left_click(0, 0);
        assert_eq!(sprite_index(board.tile(0, 0)), SPRITE_MINE);
    }

    #[test]
    fn themes_cover_every_sprite() {
        for name in THEME_NAMES {
            let theme = theme_by_name(name, ColorDepth::Basic);
            assert_eq!(theme.name(), name);
            for i in 0..SPRITE_COUNT {
                assert!(!theme.sprite(i).0.is_empty());
            }
            assert_eq!(theme.sprite(3).0, "3");
        }
    }

    #[test]
    fn unknown_theme_falls_back_to_classic() {
        assert_eq!(theme_by_name("neon", ColorDepth::Basic).name(), "classic");
        assert_eq!(next_theme_name("classic"), "ascii");
        assert_eq!(next_theme_name("ascii"), "classic");
        assert_eq!(next_theme_name("neon"), "ascii");
    }

    #[test]
    fn color_depth_mapping() {
        assert_eq!(ColorDepth::TrueColor.adapt(Color::Red), Color::Rgb(197, 15, 31));
        assert_eq!(ColorDepth::Indexed256.adapt(Color::Red), Color::Indexed(160));
        assert_eq!(ColorDepth::Basic.adapt(Color::Red), Color::Red);
        assert_eq!(ColorDepth::TrueColor.adapt(Color::Rgb(1, 2, 3)), Color::Rgb(1, 2, 3));
        assert_eq!(ColorDepth::Indexed256.adapt(Color::Rgb(255, 255, 255)), Color::Indexed(255));
    }

    #[test]
    fn font_spacing() {
        let font = Font { modifier: Modifier::BOLD, letter_spacing: 1 };
        assert_eq!(font.layout("WYRM"), "W Y R M");
    }
}
