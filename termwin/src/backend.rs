// ABOUTME: Seam between the binding layer and a native windowing engine.
// ABOUTME: Methods mirror the curses primitives; failure is the `Sentinel`, never a panic.

use std::fmt;

use crate::cell::Cell;

/// Opaque identity of one native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WinId(pub u32);

impl fmt::Display for WinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a reserved startup line is carved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Top,
    Bottom,
}

impl Alignment {
    pub fn from_top(top: bool) -> Self {
        if top {
            Alignment::Top
        } else {
            Alignment::Bottom
        }
    }
}

/// The engine's failure value. Carries no detail, like the curses `ERR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel;

pub type NativeResult<T = ()> = Result<T, Sentinel>;

/// Copy of the physical screen after the last `doupdate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenImage {
    pub rows: i32,
    pub cols: i32,
    /// Row-major, `rows * cols` cells.
    pub cells: Vec<Cell>,
    pub cursor: (i32, i32),
    pub cursor_visibility: i32,
    /// Number of completed `doupdate` calls.
    pub frames: u64,
    /// Rows transmitted by the last `doupdate`.
    pub rows_updated: usize,
    pub bells: u32,
    pub flashes: u32,
}

impl ScreenImage {
    pub fn cell(&self, y: i32, x: i32) -> Option<Cell> {
        if y < 0 || x < 0 || y >= self.rows || x >= self.cols {
            return None;
        }
        self.cells
            .get(y as usize * self.cols as usize + x as usize)
            .copied()
    }

    /// Glyphs of row `y` as text.
    pub fn row_text(&self, y: i32) -> String {
        (0..self.cols)
            .filter_map(|x| self.cell(y, x))
            .map(|c| c.glyph() as char)
            .collect()
    }
}

/// A curses-style windowing engine.
///
/// Every method takes `&self`: `initialize` calls back into the binding layer,
/// which draws through this same trait before `initialize` returns.
/// Implementations must not hold internal borrows across that callback.
pub trait Backend {
    // Session lifecycle.

    /// Ask for one more reserved line. Only meaningful before `initialize`.
    fn reserve_line(&self, alignment: Alignment) -> bool;

    /// Start the engine. `on_reserved` runs once per pending reservation, in
    /// registration order, with the line's window and its width. Returns the
    /// full-screen root window.
    fn initialize(&self, on_reserved: &mut dyn FnMut(WinId, i32)) -> Option<WinId>;

    fn end(&self) -> NativeResult;
    fn is_ended(&self) -> bool;

    /// `(lines, cols)` of the whole terminal.
    fn screen_size(&self) -> (i32, i32);

    /// Push the virtual screen to the physical one.
    fn doupdate(&self) -> NativeResult;

    // Window management.

    fn newwin(&self, lines: i32, cols: i32, y: i32, x: i32) -> Option<WinId>;
    /// Sub-window at absolute screen coordinates, sharing `parent`'s cells.
    fn subwin(&self, parent: WinId, lines: i32, cols: i32, y: i32, x: i32) -> Option<WinId>;
    /// Sub-window at coordinates relative to `parent`.
    fn derwin(&self, parent: WinId, lines: i32, cols: i32, y: i32, x: i32) -> Option<WinId>;
    fn dupwin(&self, win: WinId) -> Option<WinId>;
    fn delwin(&self, win: WinId) -> NativeResult;
    fn mvwin(&self, win: WinId, y: i32, x: i32) -> NativeResult;
    fn mvderwin(&self, win: WinId, y: i32, x: i32) -> NativeResult;

    fn syncup(&self, win: WinId);
    fn syncdown(&self, win: WinId);
    fn cursyncup(&self, win: WinId);
    fn syncok(&self, win: WinId, on: bool) -> NativeResult;

    fn getyx(&self, win: WinId) -> (i32, i32);
    /// Position relative to the parent, `(-1, -1)` for top-level windows.
    fn getparyx(&self, win: WinId) -> (i32, i32);
    fn getbegyx(&self, win: WinId) -> (i32, i32);
    fn getmaxyx(&self, win: WinId) -> (i32, i32);
    fn wmove(&self, win: WinId, y: i32, x: i32) -> NativeResult;

    // Options.

    fn keypad(&self, win: WinId, on: bool) -> NativeResult;
    fn nodelay(&self, win: WinId, on: bool) -> NativeResult;
    fn timeout(&self, win: WinId, delay_ms: i32);
    fn scrollok(&self, win: WinId, on: bool) -> NativeResult;
    fn setscrreg(&self, win: WinId, top: i32, bottom: i32) -> NativeResult;
    fn immedok(&self, win: WinId, on: bool);

    // Refresh and change tracking.

    fn wnoutrefresh(&self, win: WinId) -> NativeResult;
    fn touchln(&self, win: WinId, y: i32, n: i32, changed: bool) -> NativeResult;
    /// `None` when `y` is outside the window.
    fn is_linetouched(&self, win: WinId, y: i32) -> Option<bool>;
    fn is_wintouched(&self, win: WinId) -> bool;

    // Drawing.

    fn erase(&self, win: WinId) -> NativeResult;
    fn clear(&self, win: WinId) -> NativeResult;
    fn clrtobot(&self, win: WinId) -> NativeResult;
    fn clrtoeol(&self, win: WinId) -> NativeResult;
    fn addch(&self, win: WinId, ch: Cell) -> NativeResult;
    /// Copy cells at the cursor without moving it or wrapping. `n < 0` means all.
    fn addchnstr(&self, win: WinId, cells: &[Cell], n: i32) -> NativeResult;
    /// Add at most `n` bytes (`n < 0` for all) up to the first NUL.
    fn addnstr(&self, win: WinId, s: &[u8], n: i32) -> NativeResult;
    fn insch(&self, win: WinId, ch: Cell) -> NativeResult;
    fn insnstr(&self, win: WinId, s: &[u8], n: i32) -> NativeResult;
    fn delch(&self, win: WinId) -> NativeResult;
    /// Insert `n` lines above the cursor line, or delete `-n` lines from it.
    fn insdelln(&self, win: WinId, n: i32) -> NativeResult;
    fn hline(&self, win: WinId, ch: Cell, n: i32) -> NativeResult;
    fn vline(&self, win: WinId, ch: Cell, n: i32) -> NativeResult;
    /// Sides then corners: left, right, top, bottom, tl, tr, bl, br. Zero cells
    /// select the line-drawing defaults.
    fn border(&self, win: WinId, cells: [Cell; 8]) -> NativeResult;
    fn scrl(&self, win: WinId, n: i32) -> NativeResult;

    fn attrset(&self, win: WinId, attr: u32) -> NativeResult;
    fn attr_get(&self, win: WinId) -> u32;
    fn bkgdset(&self, win: WinId, ch: Cell);
    /// Set the background and repaint every cell that carried the old one.
    fn bkgd(&self, win: WinId, ch: Cell) -> NativeResult;
    fn getbkgd(&self, win: WinId) -> Cell;

    // Read-back.

    fn inch(&self, win: WinId) -> Cell;
    fn inchnstr(&self, win: WinId, n: i32) -> NativeResult<Vec<Cell>>;
    fn innstr(&self, win: WinId, n: i32) -> NativeResult<Vec<u8>>;

    #[allow(clippy::too_many_arguments)]
    fn copywin(
        &self,
        src: WinId,
        dst: WinId,
        sminrow: i32,
        smincol: i32,
        dminrow: i32,
        dmincol: i32,
        dmaxrow: i32,
        dmaxcol: i32,
        overlay: bool,
    ) -> NativeResult;

    // Input.

    fn getch(&self, win: WinId) -> NativeResult<i32>;
    fn ungetch(&self, key: i32) -> NativeResult;
    fn flushinp(&self);
    /// Read a line of at most `n` bytes (`n < 0` for the engine's limit).
    fn getnstr(&self, win: WinId, n: i32) -> NativeResult<Vec<u8>>;

    // Color.

    fn start_color(&self) -> NativeResult;
    fn has_colors(&self) -> bool;
    fn init_pair(&self, pair: i16, fg: i16, bg: i16) -> NativeResult;
    fn pair_content(&self, pair: i16) -> NativeResult<(i16, i16)>;
    fn colors(&self) -> i32;
    fn color_pairs(&self) -> i32;

    // Terminal modes.

    /// Returns the previous visibility.
    fn curs_set(&self, visibility: i32) -> NativeResult<i32>;
    fn beep(&self) -> NativeResult;
    fn flash(&self) -> NativeResult;
    fn cbreak(&self, on: bool) -> NativeResult;
    fn echo(&self, on: bool) -> NativeResult;
    fn raw(&self, on: bool) -> NativeResult;
    fn nl(&self, on: bool) -> NativeResult;
    fn halfdelay(&self, tenths: i32) -> NativeResult;

    fn napms(&self, ms: i32) -> NativeResult {
        if ms < 0 {
            return Err(Sentinel);
        }
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
        Ok(())
    }

    /// The physical screen, for engines that keep one in memory.
    fn screen_image(&self) -> Option<ScreenImage> {
        None
    }

    // Composites built from the primitives above.

    fn wrefresh(&self, win: WinId) -> NativeResult {
        self.wnoutrefresh(win)?;
        self.doupdate()
    }

    fn touchwin(&self, win: WinId) -> NativeResult {
        let (lines, _) = self.getmaxyx(win);
        self.touchln(win, 0, lines, true)
    }

    fn untouchwin(&self, win: WinId) -> NativeResult {
        let (lines, _) = self.getmaxyx(win);
        self.touchln(win, 0, lines, false)
    }

    fn redrawln(&self, win: WinId, start: i32, n: i32) -> NativeResult {
        self.touchln(win, start, n, true)
    }

    fn redrawwin(&self, win: WinId) -> NativeResult {
        self.touchwin(win)
    }

    fn draw_box(&self, win: WinId, verch: Cell, horch: Cell) -> NativeResult {
        let zero = Cell::from_bits(0);
        self.border(win, [verch, verch, horch, horch, zero, zero, zero, zero])
    }

    fn echochar(&self, win: WinId, ch: Cell) -> NativeResult {
        self.addch(win, ch)?;
        self.wrefresh(win)
    }

    fn deleteln(&self, win: WinId) -> NativeResult {
        self.insdelln(win, -1)
    }

    fn insertln(&self, win: WinId) -> NativeResult {
        self.insdelln(win, 1)
    }

    fn attron(&self, win: WinId, attr: u32) -> NativeResult {
        self.attrset(win, self.attr_get(win) | attr)
    }

    fn attroff(&self, win: WinId, attr: u32) -> NativeResult {
        self.attrset(win, self.attr_get(win) & !attr)
    }

    /// Copy the non-blank cells of `src` where the two windows overlap on screen.
    fn overlay(&self, src: WinId, dst: WinId) -> NativeResult {
        copy_overlap(self, src, dst, true)
    }

    /// Copy every cell of `src` where the two windows overlap on screen.
    fn overwrite(&self, src: WinId, dst: WinId) -> NativeResult {
        copy_overlap(self, src, dst, false)
    }
}

fn copy_overlap<B: Backend + ?Sized>(backend: &B, src: WinId, dst: WinId, overlay: bool) -> NativeResult {
    let (sy, sx) = backend.getbegyx(src);
    let (sh, sw) = backend.getmaxyx(src);
    let (dy, dx) = backend.getbegyx(dst);
    let (dh, dw) = backend.getmaxyx(dst);
    if sh <= 0 || dh <= 0 {
        return Err(Sentinel);
    }

    let top = sy.max(dy);
    let left = sx.max(dx);
    let bottom = (sy + sh).min(dy + dh) - 1;
    let right = (sx + sw).min(dx + dw) - 1;
    if top > bottom || left > right {
        return Ok(());
    }

    backend.copywin(
        src,
        dst,
        top - sy,
        left - sx,
        top - dy,
        left - dx,
        bottom - dy,
        right - dx,
        overlay,
    )
}
