/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Grid y grows upward, terminal rows grow downward: grid row `y` is drawn
/// on screen row `MAP_ROW + (height - 1 - y)`.

use std::collections::HashSet;
use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use nightwatch::domain::coord::{Direction, GridCoord};
use nightwatch::domain::rules;
use nightwatch::sim::evaluate::Goal;
use nightwatch::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 14, g: 14, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 30, g: 24, b: 48 };
const LIGHT_BG: Color = Color::Rgb { r: 70, g: 52, b: 18 };
const FLOOR_FG: Color = Color::Rgb { r: 50, g: 50, b: 70 };
const WALL: Color = Color::Rgb { r: 110, g: 110, b: 120 };
const EXHIBIT: Color = Color::Rgb { r: 120, g: 190, b: 255 };
const EXHIBIT_HOME: Color = Color::Rgb { r: 90, g: 230, b: 120 };
const TARGET: Color = Color::Rgb { r: 60, g: 150, b: 80 };
const FLAME: Color = Color::Rgb { r: 255, g: 200, b: 60 };
const DARK_CANDLE: Color = Color::Rgb { r: 120, g: 100, b: 90 };

// ── Renderer ──

/// Each grid cell = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const FLAME_ROW: usize = 1;
const MAP_ROW: usize = 3;
const MAP_COL: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame (level switch, restart).
    pub fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    pub fn render(&mut self, world: &WorldState, level: usize, level_count: usize) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.compose_game(world, level, level_count);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState, level: usize, level_count: usize) {
        // ── HUD rows ──
        let goal = match w.goal {
            Goal::Targets => "place the exhibits",
            Goal::RestoreStart => "restore every exhibit",
        };
        let hud = format!(
            " {} ({}/{})  │  Turn {}/{}  │  Relights {}  │  Goal: {} ",
            w.level_name, level + 1, level_count, w.turn, w.max_turns, w.relights_remaining, goal,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        self.compose_flames(w);

        // ── Map ──
        let lit: HashSet<GridCoord> = w.candles.iter().flat_map(|c| c.lit_tiles(&w.grid)).collect();
        let targets: HashSet<GridCoord> = w.exhibits.iter().filter_map(|e| e.target).collect();
        let board = w.board();

        for y in 0..w.grid.height {
            for x in 0..w.grid.width {
                let coord = GridCoord::new(x, y);
                let bg = if lit.contains(&coord) { LIGHT_BG } else { Cell::BASE_BG };
                let [c0, c1] = if w.grid.is_blocked(coord) {
                    [Cell::new('█', WALL, bg), Cell::new('█', WALL, bg)]
                } else if coord == w.player.position {
                    let arrow = arrow(w.player.applied_pose.facing);
                    let fg = if w.player.applied_pose.pushing { FLAME } else { Color::White };
                    [Cell::new('@', fg, bg), Cell::new(arrow, fg, bg)]
                } else if let Some(i) = board.exhibit_at(coord) {
                    let fg = if w.exhibits[i].at_target() { EXHIBIT_HOME } else { EXHIBIT };
                    let hint = rules::exhibit_preview(&board, i).map_or(' ', arrow);
                    [Cell::new('◆', fg, bg), Cell::new(hint, Color::DarkGrey, bg)]
                } else if let Some(i) = board.candle_at(coord) {
                    let fg = if w.candles[i].is_lit() { FLAME } else { DARK_CANDLE };
                    [Cell::new('¡', fg, bg), Cell::new(key_label(i), fg, bg)]
                } else if targets.contains(&coord) {
                    [Cell::new('[', TARGET, bg), Cell::new(']', TARGET, bg)]
                } else {
                    [Cell::new('·', FLOOR_FG, bg), Cell::new(' ', FLOOR_FG, bg)]
                };
                let row = MAP_ROW + grid_row(w.grid.height, y);
                let col = MAP_COL + x as usize * CELL_W;
                self.front.set(col, row, c0);
                self.front.set(col + 1, row, c1);
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + w.grid.height.max(0) as usize + 1;
        if !w.message.is_empty() {
            let bg = match w.phase {
                Phase::Playing => Color::Rgb { r: 200, g: 180, b: 50 },
                Phase::Won => Color::Rgb { r: 60, g: 180, b: 90 },
                Phase::TimeExpired | Phase::Collided => Color::Rgb { r: 200, g: 60, b: 60 },
            };
            self.front.fill_row(msg_row, bg);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", w.message), Color::Black, bg);
        }

        // ── Help bar ──
        let help = if w.is_ended() {
            " R:Retry  N/P:Next/Prev gallery  Q:Quit"
        } else {
            " WASD/Arrows:Move  1-9:Relight  R:Restart  N/P:Gallery  Q:Quit"
        };
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_flames(&mut self, w: &WorldState) {
        let mut x = 1;
        for (i, candle) in w.candles.iter().enumerate().take(9) {
            let fg = if candle.is_lit() { FLAME } else { DARK_CANDLE };
            let label = format!("{}:", i + 1);
            self.front.put_str(x, FLAME_ROW, &label, fg, Cell::BASE_BG);
            x += label.len();
            let bar: String = (0..candle.max_flame_turns())
                .map(|n| if n < candle.remaining_flame() { '█' } else { '░' })
                .collect();
            self.front.put_str(x, FLAME_ROW, &bar, fg, Cell::BASE_BG);
            x += bar.chars().count() + 2;
        }
    }
}

/// Screen row offset of grid row `y` (row 0 at the bottom).
fn grid_row(height: i32, y: i32) -> usize {
    (height - 1 - y).max(0) as usize
}

fn arrow(dir: Direction) -> char {
    match dir {
        Direction::Up => '↑',
        Direction::Down => '↓',
        Direction::Left => '←',
        Direction::Right => '→',
    }
}

fn key_label(index: usize) -> char {
    char::from_digit(index as u32 + 1, 10).unwrap_or('+')
}
