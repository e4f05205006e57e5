use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::ws_board::Outcome;
use crate::ws_field::TileState;
use crate::ws_game::{save_config, Config, Difficulty};
use crate::ws_screen::{App, Camera, CustomForm, DragAnchor, GameScreen, MenuState, Nav, Screen, Viewport, CUSTOM_LABELS};
use crate::ws_theme::{next_theme_name, sprite_index, theme_by_name, ColorDepth, Theme, SPRITE_FLAG};

const TITLE: &str = "WYRMSWEEPER";
const BUTTON_WIDTH: u16 = 30;
const MIN_TWIDTH: u16 = 44;
const MIN_THEIGHT: u16 = 16;

/// Something a button or key can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nav(Nav),
    CycleTheme,
    CloseDialog,
}

// Runtime UI variables; geometry is recorded while drawing and used for mouse hit tests
#[derive(Debug, Default)]
struct UiState {
    buttons: Vec<(Rect, Action)>, // clickable buttons of the last frame, in menu order
    fields: Vec<Rect>,            // custom form inputs
    selected: usize,              // keyboard focus among buttons
    hovered: Option<usize>,
    pressed: Option<usize>,
    viewport: Option<Viewport>,   // board area of the last frame
    drag: Option<DragAnchor>,     // middle button held on the board
}

impl UiState {
    fn reset_menu(&mut self) {
        self.selected = 0;
        self.hovered = None;
        self.pressed = None;
        self.drag = None;
    }
}

/// Colors and glyphs currently in use
struct Look {
    depth: ColorDepth,
    theme: Box<dyn Theme>,
}

/// Buttons on the current screen, in focus order
fn menu_items(app: &App, cfg: &Config) -> Vec<(String, Action)> {
    match &app.screen {
        Screen::Menu(MenuState::Title) => vec![
            ("Play".to_string(), Action::Nav(Nav::Play)),
            (format!("Theme: {}", cfg.theme), Action::CycleTheme),
            ("Quit".to_string(), Action::Nav(Nav::Quit)),
        ],
        Screen::Menu(MenuState::Difficulty) => {
            let mut items: Vec<(String, Action)> = Difficulty::PRESETS
                .iter()
                .map(|d| {
                    let (w, h, n) = d.params();
                    (format!("{:<13}{:>2}x{:<2} {:>3} mines", d.name(), w, h, n), Action::Nav(Nav::Start(*d)))
                })
                .collect();
            items.push(("Custom...".to_string(), Action::Nav(Nav::OpenCustom)));
            items.push(("Back".to_string(), Action::Nav(Nav::Back)));
            items
        }
        Screen::Menu(MenuState::Custom(_)) => vec![
            ("Start".to_string(), Action::Nav(Nav::SubmitCustom)),
            ("Back".to_string(), Action::Nav(Nav::Back)),
        ],
        Screen::Game(game) if game.quit_dialog => vec![
            ("Yes".to_string(), Action::Nav(Nav::Menu)),
            ("No".to_string(), Action::CloseDialog),
        ],
        Screen::Game(game) if game.board.outcome().is_over() => vec![
            ("Retry".to_string(), Action::Nav(Nav::Retry)),
            ("Menu".to_string(), Action::Nav(Nav::Menu)),
        ],
        Screen::Game(_) => Vec::new(),
    }
}

/// Key hints for the header row
fn key_hints(app: &App) -> &'static [(&'static str, &'static str)] {
    match &app.screen {
        Screen::Menu(MenuState::Custom(_)) => &[("Tab", "Next field"), ("Enter", "Start"), ("Esc", "Back")],
        Screen::Menu(_) => &[("↑↓", "Select"), ("Enter", "Choose"), ("T", "Theme"), ("Esc", "Back")],
        Screen::Game(_) => &[
            ("Space", "Reveal"),
            ("F", "Flag"),
            ("Enter", "Chord"),
            ("WASD", "Pan"),
            ("+/-", "Zoom"),
            ("R", "Retry"),
        ],
    }
}

pub fn run(cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, cfg);

    // Save current settings before exiting
    save_config(cfg);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    let depth = ColorDepth::detect();
    let mut look = Look {
        depth,
        theme: theme_by_name(&cfg.theme, depth),
    };
    info!(theme = look.theme.name(), ?depth, "starting ui");

    let mut app = App::default();
    let mut ui = UiState::default();
    let mut saved = cfg.clone();

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    while app.running {
        terminal.draw(|f| draw(f, &app, cfg, look.theme.as_ref(), &mut ui))?;

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            let action = match event::read()? {
                Event::Key(key) => handle_key(key, &mut app, cfg, &mut ui),
                Event::Mouse(mouse) => handle_mouse(mouse, &mut app, cfg, &mut ui),
                _ => None,
            };
            if let Some(action) = action {
                apply(action, &mut app, cfg, &mut ui, &mut look);
            }
            if let Screen::Game(game) = &mut app.screen {
                if let Some(view) = ui.viewport {
                    game.camera.clamp(&view, game.board.width(), game.board.height());
                }
            }
            if *cfg != saved {
                save_config(cfg);
                saved = cfg.clone();
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn apply(action: Action, app: &mut App, cfg: &mut Config, ui: &mut UiState, look: &mut Look) {
    match action {
        Action::Nav(nav) => {
            app.navigate(nav, cfg);
            ui.reset_menu();
        }
        Action::CycleTheme => {
            cfg.theme = next_theme_name(&cfg.theme).to_string();
            look.theme = theme_by_name(&cfg.theme, look.depth);
            info!(theme = look.theme.name(), "theme changed");
        }
        Action::CloseDialog => {
            if let Screen::Game(game) = &mut app.screen {
                game.quit_dialog = false;
            }
            ui.reset_menu();
        }
    }
}

fn step(selected: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (selected + 1) % len
    } else {
        (selected + len - 1) % len
    }
}

fn handle_key(key: KeyEvent, app: &mut App, cfg: &Config, ui: &mut UiState) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Nav(Nav::Quit));
    }
    let items = menu_items(app, cfg);
    let chosen = items.get(ui.selected).map(|(_, a)| *a);

    match &mut app.screen {
        Screen::Menu(MenuState::Custom(form)) => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => form.push_digit(c),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Enter => return Some(Action::Nav(Nav::SubmitCustom)),
            KeyCode::Esc => return Some(Action::Nav(Nav::Back)),
            _ => {}
        },
        Screen::Menu(state) => match key.code {
            KeyCode::Up | KeyCode::BackTab => ui.selected = step(ui.selected, items.len(), false),
            KeyCode::Down | KeyCode::Tab => ui.selected = step(ui.selected, items.len(), true),
            KeyCode::Enter | KeyCode::Char(' ') => return chosen,
            KeyCode::Char('t') | KeyCode::Char('T') => return Some(Action::CycleTheme),
            KeyCode::Char(c @ '1'..='4') if *state == MenuState::Difficulty => {
                let idx = c as usize - '1' as usize;
                return items.get(idx).map(|(_, a)| *a);
            }
            KeyCode::Esc if *state == MenuState::Title => return Some(Action::Nav(Nav::Quit)),
            KeyCode::Esc => return Some(Action::Nav(Nav::Back)),
            _ => {}
        },
        Screen::Game(game) if game.quit_dialog => match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => ui.selected = step(ui.selected, items.len(), true),
            KeyCode::Enter | KeyCode::Char(' ') => return chosen,
            KeyCode::Char('y') | KeyCode::Char('Y') => return Some(Action::Nav(Nav::Menu)),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Some(Action::CloseDialog),
            _ => {}
        },
        Screen::Game(game) if game.board.outcome().is_over() => match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => ui.selected = step(ui.selected, items.len(), true),
            KeyCode::Enter | KeyCode::Char(' ') => return chosen,
            KeyCode::Char('r') | KeyCode::Char('R') => return Some(Action::Nav(Nav::Retry)),
            KeyCode::Char('m') | KeyCode::Char('M') | KeyCode::Esc => return Some(Action::Nav(Nav::Menu)),
            _ => {}
        },
        Screen::Game(game) => return handle_game_key(key, game, cfg, ui),
    }
    None
}

fn handle_game_key(key: KeyEvent, game: &mut GameScreen, cfg: &Config, ui: &mut UiState) -> Option<Action> {
    let (w, h) = (game.board.width(), game.board.height());
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let mut pan = (0isize, 0isize);
    let mut cursor = (0isize, 0isize);
    match key.code {
        KeyCode::Up if shift => pan = (-1, 0),
        KeyCode::Down if shift => pan = (1, 0),
        KeyCode::Left if shift => pan = (0, -1),
        KeyCode::Right if shift => pan = (0, 1),
        KeyCode::Up => cursor = (-1, 0),
        KeyCode::Down => cursor = (1, 0),
        KeyCode::Left => cursor = (0, -1),
        KeyCode::Right => cursor = (0, 1),
        KeyCode::Char('w') => pan = (-1, 0),
        KeyCode::Char('s') => pan = (1, 0),
        KeyCode::Char('a') => pan = (0, -1),
        KeyCode::Char('d') => pan = (0, 1),
        KeyCode::Char(' ') => game.left_click(game.cursor.0, game.cursor.1, cfg.auto_chord),
        KeyCode::Char('f') | KeyCode::Char('F') => game.right_click(game.cursor.0, game.cursor.1),
        KeyCode::Enter => game.chord(game.cursor.0, game.cursor.1),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            if let Some(view) = ui.viewport {
                game.camera.zoom_by(1, &view, w, h);
            }
        }
        KeyCode::Char('-') => {
            if let Some(view) = ui.viewport {
                game.camera.zoom_by(-1, &view, w, h);
            }
        }
        KeyCode::Char('r') | KeyCode::Char('R') => return Some(Action::Nav(Nav::Retry)),
        KeyCode::Esc => {
            game.quit_dialog = true;
            ui.reset_menu();
        }
        _ => {}
    }
    if cursor != (0, 0) {
        game.move_cursor(cursor.0, cursor.1);
    }
    if let Some(view) = ui.viewport {
        if pan != (0, 0) {
            game.camera.pan(pan.0, pan.1, &view, w, h);
        }
        if cursor != (0, 0) {
            game.camera.follow(game.cursor.0, game.cursor.1, &view, w, h);
        }
    }
    None
}

fn contains(r: &Rect, x: u16, y: u16) -> bool {
    x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height
}

fn handle_mouse(m: MouseEvent, app: &mut App, cfg: &Config, ui: &mut UiState) -> Option<Action> {
    let (x, y) = (m.column, m.row);
    let hit = ui.buttons.iter().position(|(r, _)| contains(r, x, y));

    // Board tile under the pointer, only while the board takes input
    let tile = match (&app.screen, ui.viewport) {
        (Screen::Game(game), Some(view)) if !game.quit_dialog => {
            game.camera.tile_at(x, y, &view, game.board.field())
        }
        _ => None,
    };

    match m.kind {
        MouseEventKind::Moved => {
            ui.hovered = hit;
            if let (Screen::Game(game), Some(pos)) = (&mut app.screen, tile) {
                game.cursor = pos;
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if hit.is_some() {
                ui.pressed = hit;
                return None;
            }
            match &mut app.screen {
                Screen::Menu(MenuState::Custom(form)) => {
                    if let Some(i) = ui.fields.iter().position(|r| contains(r, x, y)) {
                        form.focus = i;
                    }
                }
                Screen::Game(game) => {
                    if let Some((row, column)) = tile {
                        game.cursor = (row, column);
                        game.left_click(row, column, cfg.auto_chord);
                    }
                }
                _ => {}
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(i) = ui.pressed.take() {
                if hit == Some(i) {
                    return ui.buttons.get(i).map(|(_, a)| *a);
                }
            }
        }
        MouseEventKind::Down(MouseButton::Right) => match &mut app.screen {
            // right click backs out of the custom form
            Screen::Menu(MenuState::Custom(_)) => return Some(Action::Nav(Nav::Back)),
            Screen::Game(game) => {
                if let Some((row, column)) = tile {
                    game.right_click(row, column);
                }
            }
            _ => {}
        },
        MouseEventKind::Down(MouseButton::Middle) => {
            if let Screen::Game(game) = &app.screen {
                ui.drag = Some(DragAnchor { x, y, camera: game.camera });
            }
        }
        MouseEventKind::Drag(MouseButton::Middle) => {
            if let (Screen::Game(game), Some(anchor), Some(view)) = (&mut app.screen, ui.drag, ui.viewport) {
                game.camera = Camera::drag(&anchor, x, y, &view, game.board.width(), game.board.height());
            }
        }
        MouseEventKind::Up(MouseButton::Middle) => {
            // a middle click without movement chords
            if let (Screen::Game(game), Some(anchor)) = (&mut app.screen, ui.drag.take()) {
                if (anchor.x, anchor.y) == (x, y) {
                    if let Some((row, column)) = tile {
                        game.chord(row, column);
                    }
                }
            }
        }
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
            if let (Screen::Game(game), Some(view)) = (&mut app.screen, ui.viewport) {
                let delta = if m.kind == MouseEventKind::ScrollUp { 1 } else { -1 };
                game.camera.zoom_by(delta, &view, game.board.width(), game.board.height());
            }
        }
        _ => debug!(kind = ?m.kind, "unhandled mouse event"),
    }
    None
}

fn draw<B: Backend>(f: &mut Frame<B>, app: &App, cfg: &Config, theme: &dyn Theme, ui: &mut UiState) {
    let size = f.size();
    ui.buttons.clear();
    ui.fields.clear();
    ui.viewport = None;

    // If terminal too small, render a centered warning and skip normal UI
    if size.width < MIN_TWIDTH || size.height < MIN_THEIGHT {
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", MIN_TWIDTH, MIN_THEIGHT))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40u16.min(size.width), 4u16.min(size.height), size);
        f.render_widget(warn, area);
        return;
    }

    // layout: top key row, center screen, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Length(3), Constraint::Min(6), Constraint::Length(3)].as_ref())
        .split(size);

    draw_key_row(f, chunks[0], key_hints(app));
    f.render_widget(Block::default().style(Style::default().bg(theme.background())), chunks[1]);

    let items = menu_items(app, cfg);
    match &app.screen {
        Screen::Menu(MenuState::Title) => draw_title(f, chunks[1], theme, &items, ui),
        Screen::Menu(MenuState::Difficulty) => draw_button_column(f, chunks[1], &items, ui, "Difficulty"),
        Screen::Menu(MenuState::Custom(form)) => draw_custom(f, chunks[1], form, &items, ui),
        Screen::Game(game) => {
            draw_board(f, chunks[1], game, cfg, theme, ui);
            if game.quit_dialog {
                draw_dialog(f, centered_block(34, 6, size), "Quit", "Quit to menu?", &items, ui, Color::White);
            } else if game.board.outcome() == Outcome::Won {
                draw_dialog(f, bottom_centered_block(36, 6, chunks[1]), "Success", "Field cleared. You win!", &items, ui, Color::Green);
            } else if game.board.outcome() == Outcome::Lost {
                draw_dialog(f, bottom_centered_block(36, 6, chunks[1]), "Failure", "Boom! You hit a mine.", &items, ui, Color::Red);
            }
        }
    }

    draw_status(f, chunks[2], app, cfg, theme);
}

fn draw_key_row<B: Backend>(f: &mut Frame<B>, area: Rect, hints: &[(&str, &str)]) {
    let mut spans_vec: Vec<Span> = vec![Span::raw(" ")];
    for (i, (key, rest)) in hints.iter().enumerate() {
        if i > 0 {
            spans_vec.push(Span::raw("   "));
        }
        spans_vec.push(Span::styled(key.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
        spans_vec.push(Span::raw(format!(": {}", rest)));
    }
    let row = Paragraph::new(Spans::from(spans_vec)).block(Block::default().borders(Borders::ALL)).alignment(Alignment::Left);
    f.render_widget(row, area);
}

fn button_style(idx: usize, ui: &UiState) -> Style {
    let base = Style::default().fg(Color::Black).add_modifier(Modifier::BOLD);
    if ui.pressed == Some(idx) {
        base.bg(Color::Green)
    } else if ui.hovered == Some(idx) || ui.selected == idx {
        base.bg(Color::White)
    } else {
        base.bg(Color::Gray)
    }
}

/// Draw one button and register it for mouse hit tests
fn draw_button<B: Backend>(f: &mut Frame<B>, rect: Rect, label: &str, action: Action, ui: &mut UiState) {
    let idx = ui.buttons.len();
    let btn = Paragraph::new(Spans::from(Span::styled(format!(" {} ", label), button_style(idx, ui))))
        .style(button_style(idx, ui))
        .alignment(Alignment::Center);
    f.render_widget(btn, rect);
    ui.buttons.push((rect, action));
}

fn draw_title<B: Backend>(f: &mut Frame<B>, area: Rect, theme: &dyn Theme, items: &[(String, Action)], ui: &mut UiState) {
    let font = theme.font();
    let title = font.layout(TITLE);
    let title_rect = Rect::new(area.x, area.y + area.height / 4, area.width, 1);
    let p = Paragraph::new(Spans::from(Span::styled(title, Style::default().fg(theme.font_color()).add_modifier(font.modifier))))
        .alignment(Alignment::Center);
    f.render_widget(p, title_rect);

    let below = Rect::new(area.x, area.y + area.height / 2, area.width, area.height - area.height / 2);
    let x = below.x + below.width.saturating_sub(BUTTON_WIDTH) / 2;
    for (i, (label, action)) in items.iter().enumerate() {
        let y = below.y + (i as u16) * 2;
        if y >= below.y + below.height {
            break;
        }
        draw_button(f, Rect::new(x, y, BUTTON_WIDTH.min(below.width), 1), label, *action, ui);
    }
}

fn draw_button_column<B: Backend>(f: &mut Frame<B>, area: Rect, items: &[(String, Action)], ui: &mut UiState, title: &str) {
    let height = (items.len() as u16) * 2 + 1;
    let mrect = centered_block(BUTTON_WIDTH + 4, height + 2, area);
    f.render_widget(Clear, mrect);
    f.render_widget(Block::default().borders(Borders::ALL).title(title.to_string()), mrect);
    for (i, (label, action)) in items.iter().enumerate() {
        let y = mrect.y + 2 + (i as u16) * 2;
        if y >= mrect.y + mrect.height.saturating_sub(1) {
            break;
        }
        draw_button(f, Rect::new(mrect.x + 2, y, BUTTON_WIDTH, 1), label, *action, ui);
    }
}

fn draw_custom<B: Backend>(
    f: &mut Frame<B>,
    area: Rect,
    form: &CustomForm,
    items: &[(String, Action)],
    ui: &mut UiState,
) {
    let mrect = centered_block(44, 12, area);
    f.render_widget(Clear, mrect);
    f.render_widget(Block::default().borders(Borders::ALL).title("Custom Field"), mrect);
    let inner = Rect::new(mrect.x + 2, mrect.y + 2, mrect.width.saturating_sub(4), mrect.height.saturating_sub(3));

    // Width, height and mines rows - label and input on the same line
    for (i, label) in CUSTOM_LABELS.iter().enumerate() {
        let y = inner.y + i as u16;
        let label_p = Paragraph::new(Spans::from(Span::raw(format!("{:<12}", label))));
        f.render_widget(label_p, Rect::new(inner.x, y, 12, 1));
        let input_style = if form.focus == i {
            Style::default().bg(Color::Yellow).fg(Color::Black)
        } else {
            Style::default().bg(Color::DarkGray)
        };
        let input_rect = Rect::new(inner.x + 12, y, 6, 1);
        f.render_widget(Paragraph::new(Span::styled(format!("{:<6}", form.fields[i]), input_style)), input_rect);
        ui.fields.push(input_rect);
    }

    if let Some(err) = &form.error {
        let err_p = Paragraph::new(Span::styled(err.clone(), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)))
            .alignment(Alignment::Center);
        f.render_widget(err_p, Rect::new(inner.x, inner.y + 4, inner.width, 2));
    }

    let btn_w = 10u16;
    let total = btn_w * items.len() as u16 + 2 * (items.len().saturating_sub(1) as u16);
    let mut bx = inner.x + inner.width.saturating_sub(total) / 2;
    let by = inner.y + inner.height.saturating_sub(1);
    for (label, action) in items {
        draw_button(f, Rect::new(bx, by, btn_w, 1), label, *action, ui);
        bx += btn_w + 2;
    }
}

fn draw_dialog<B: Backend>(
    f: &mut Frame<B>,
    rect: Rect,
    title: &str,
    message: &str,
    items: &[(String, Action)],
    ui: &mut UiState,
    accent: Color,
) {
    f.render_widget(Clear, rect);
    f.render_widget(Block::default().borders(Borders::ALL).title(Span::styled(title.to_string(), Style::default().fg(accent))), rect);
    let inner = Rect::new(rect.x + 1, rect.y + 1, rect.width.saturating_sub(2), rect.height.saturating_sub(2));
    let lines = vec![Spans::from(Span::raw("")), Spans::from(Span::raw(message.to_string()))];
    f.render_widget(Paragraph::new(Text::from(lines)).alignment(Alignment::Center), inner);

    let btn_w = 9u16;
    let total = btn_w * items.len() as u16 + 2 * (items.len().saturating_sub(1) as u16);
    let mut bx = inner.x + inner.width.saturating_sub(total) / 2;
    let by = inner.y + inner.height.saturating_sub(1);
    for (label, action) in items {
        draw_button(f, Rect::new(bx, by, btn_w, 1), label, *action, ui);
        bx += btn_w + 2;
    }
}

fn draw_board<B: Backend>(f: &mut Frame<B>, area: Rect, game: &GameScreen, cfg: &Config, theme: &dyn Theme, ui: &mut UiState) {
    let board = &game.board;
    let cam = game.camera;
    let (tw, th) = cam.tile_cells(theme.tile_size());

    let want_w = (board.width() as u16).saturating_mul(tw).saturating_add(2);
    let want_h = (board.height() as u16).saturating_mul(th).saturating_add(2);
    let outer = centered_block(want_w.min(area.width), want_h.min(area.height), area);
    let view = Viewport {
        x: outer.x + 1,
        y: outer.y + 1,
        width: outer.width.saturating_sub(2),
        height: outer.height.saturating_sub(2),
        tile_size: theme.tile_size(),
    };
    ui.viewport = Some(view);

    let (cols, rows) = cam.visible(&view);
    let last_row = (cam.row + rows).min(board.height());
    let last_col = (cam.column + cols).min(board.width());
    let bg = theme.background();
    let cursor_bg = Color::LightBlue;
    let show_cursor = cfg.show_cursor && board.outcome() == Outcome::Playing && !game.quit_dialog;

    let mut lines = Vec::with_capacity(rows * th as usize);
    for row in cam.row..last_row {
        for line in 0..th {
            let mut spans = Vec::with_capacity(cols);
            for column in cam.column..last_col {
                let tile = board.tile(row, column);
                let mut index = sprite_index(tile);
                // mines left closed on a won board are shown flagged
                if board.outcome() == Outcome::Won && tile.is_mine() && tile.state == TileState::Closed {
                    index = SPRITE_FLAG;
                }
                let (glyph, fg) = theme.sprite(index);
                let mut style = Style::default().fg(fg).bg(bg);
                if show_cursor && game.cursor == (row, column) {
                    style = style.bg(cursor_bg);
                }
                let text = if line == th / 2 {
                    let gw = glyph.width().min(tw as usize);
                    let left = (tw as usize - gw + 1) / 2;
                    format!("{}{}{}", " ".repeat(left), glyph, " ".repeat(tw as usize - gw - left))
                } else {
                    " ".repeat(tw as usize)
                };
                spans.push(Span::styled(text, style));
            }
            lines.push(Spans::from(spans));
        }
    }

    let title = format!("{} {}x{}", game.difficulty.name(), board.width(), board.height());
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title).title_alignment(Alignment::Center))
        .style(Style::default().bg(bg))
        .alignment(Alignment::Left);
    f.render_widget(Clear, outer);
    f.render_widget(paragraph, outer);
}

fn draw_status<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App, cfg: &Config, theme: &dyn Theme) {
    // status row (left info + right-aligned key)
    let (left_text, right_key, right_rest) = match &app.screen {
        Screen::Game(game) => {
            let state = match game.board.outcome() {
                Outcome::Playing => "",
                Outcome::Won => "  Cleared!",
                Outcome::Lost => "  Exploded!",
            };
            (
                format!(" Mines: {}   Time: {}s{} ", game.board.remaining_mines(), game.elapsed_secs(), state),
                "Esc",
                "Menu",
            )
        }
        Screen::Menu(_) => (
            format!(" Wyrmsweeper v{}   Theme: {}   Last: {} ", env!("CARGO_PKG_VERSION"), theme.name(), cfg.difficulty.name()),
            "^C",
            "Quit",
        ),
    };
    let inner_w = area.width.saturating_sub(2) as usize;
    let left_w = left_text.as_str().width();
    // account for the ": " added between the key and its label
    let right_w = right_key.width() + 2 + right_rest.width();
    let mid_spaces = if inner_w > left_w + right_w + 1 { inner_w - left_w - right_w - 1 } else { 1 };
    let status_spans = vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(mid_spaces)),
        Span::styled(right_key.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::raw(format!(": {} ", right_rest)),
    ];
    let status = Paragraph::new(Text::from(Spans::from(status_spans)))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(status, area);
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn centered_block(w: u16, h: u16, r: Rect) -> Rect { center_rect(w, h, r) }

fn bottom_centered_block(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + r.height.saturating_sub(height);
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn drive(app: &mut App, cfg: &mut Config, ui: &mut UiState, codes: &[KeyCode]) {
        let mut look = Look { depth: ColorDepth::Basic, theme: theme_by_name(&cfg.theme, ColorDepth::Basic) };
        for code in codes {
            if let Some(action) = handle_key(press(*code), app, cfg, ui) {
                apply(action, app, cfg, ui, &mut look);
            }
        }
    }

    #[test]
    fn keyboard_reaches_a_game() {
        let mut cfg = Config::default();
        let mut app = App::default();
        let mut ui = UiState::default();
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Enter, KeyCode::Char('3')]);
        match &app.screen {
            Screen::Game(g) => assert_eq!(g.difficulty, Difficulty::Hard),
            _ => panic!("expected game"),
        }
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Esc]);
        match &app.screen {
            Screen::Game(g) => assert!(g.quit_dialog),
            _ => panic!("expected game"),
        }
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Char('n')]);
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Esc, KeyCode::Enter]);
        assert!(matches!(app.screen, Screen::Menu(MenuState::Title)));
    }

    #[test]
    fn theme_button_cycles_theme() {
        let mut cfg = Config::default();
        let mut app = App::default();
        let mut ui = UiState::default();
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Down, KeyCode::Enter]);
        assert_eq!(cfg.theme, "ascii");
        assert!(matches!(app.screen, Screen::Menu(MenuState::Title)));
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Down, KeyCode::Enter]);
        assert!(!app.running);
    }

    #[test]
    fn custom_form_by_keyboard() {
        let mut cfg = Config::default();
        let mut app = App::default();
        let mut ui = UiState::default();
        drive(&mut app, &mut cfg, &mut ui, &[KeyCode::Enter, KeyCode::Char('4')]);
        assert!(matches!(app.screen, Screen::Menu(MenuState::Custom(_))));
        let mut keys = vec![KeyCode::Backspace, KeyCode::Backspace, KeyCode::Char('5'), KeyCode::Tab];
        keys.extend([KeyCode::Backspace, KeyCode::Backspace, KeyCode::Char('5'), KeyCode::Tab]);
        keys.extend([KeyCode::Backspace, KeyCode::Backspace, KeyCode::Char('3'), KeyCode::Enter]);
        drive(&mut app, &mut cfg, &mut ui, &keys);
        match &app.screen {
            Screen::Game(g) => assert_eq!(g.difficulty, Difficulty::Custom(5, 5, 3)),
            _ => panic!("expected game"),
        }
    }

    #[test]
    fn dialog_geometry_fits_small_areas() {
        let r = Rect::new(0, 0, 20, 5);
        assert_eq!(center_rect(30, 8, r), Rect::new(0, 0, 20, 5));
        assert_eq!(bottom_centered_block(10, 2, r), Rect::new(5, 3, 10, 2));
        assert!(contains(&Rect::new(2, 2, 3, 1), 4, 2));
        assert!(!contains(&Rect::new(2, 2, 3, 1), 5, 2));
    }
}
