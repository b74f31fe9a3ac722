// ABOUTME: In-memory windowing engine implementing Backend without touching a real terminal.
// ABOUTME: Keeps windows, the virtual and physical screens, the input queue and the color table.

mod surface;
mod window;

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use log::debug;

use crate::backend::{Alignment, Backend, NativeResult, ScreenImage, Sentinel, WinId};
use crate::cell::Cell;
use crate::config::EngineConfig;
use crate::constants::{COLOR_BLACK, COLOR_WHITE, KEY_BACKSPACE, KEY_LEFT};
use crate::error::Result;
use crate::input::decode_key;

use self::surface::Screen;
use self::window::Window;

/// Keys `ungetch` can hold before refusing more.
const PUSHBACK_LIMIT: usize = 256;

/// Line length `getnstr` accepts when the caller gives no limit.
const LINE_LIMIT: usize = 1024;

/// Whether `len` cells starting at `start` fit inside `0..limit`.
fn span_fits(start: i32, len: i32, limit: i32) -> bool {
    start >= 0 && len > 0 && start.checked_add(len).is_some_and(|end| end <= limit)
}

struct State {
    windows: BTreeMap<WinId, Window>,
    next_id: u32,
    stdscr: Option<WinId>,
    pending: Vec<Alignment>,
    reserved: usize,
    initialized: bool,
    ended: bool,
    screen: Screen,
    raw_input: VecDeque<u8>,
    pushback: Vec<i32>,
    color_started: bool,
    pairs: Vec<(i16, i16)>,
    echo: bool,
    cbreak: bool,
    raw: bool,
    nl: bool,
    half_delay: i32,
}

impl State {
    fn insert(&mut self, win: Window) -> WinId {
        self.next_id += 1;
        let id = WinId(self.next_id);
        self.windows.insert(id, win);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputModes {
    pub echo: bool,
    pub cbreak: bool,
    pub raw: bool,
    pub nl: bool,
    pub half_delay: i32,
}

/// Curses window model kept entirely in memory.
pub struct Headless {
    config: EngineConfig,
    state: RefCell<State>,
}

impl Headless {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let state = State {
            windows: BTreeMap::new(),
            next_id: 0,
            stdscr: None,
            pending: Vec::new(),
            reserved: 0,
            initialized: false,
            ended: false,
            screen: Screen::new(config.lines, config.cols),
            raw_input: VecDeque::new(),
            pushback: Vec::new(),
            color_started: false,
            pairs: Vec::new(),
            echo: true,
            cbreak: false,
            raw: false,
            nl: true,
            half_delay: 0,
        };
        Ok(Self {
            config,
            state: RefCell::new(state),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Queue bytes as if typed at the keyboard.
    pub fn feed_input(&self, bytes: &[u8]) {
        self.state.borrow_mut().raw_input.extend(bytes);
    }

    /// Number of live native windows, reserved lines and the root included.
    pub fn window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }

    /// Terminal input modes as last set through the mode primitives.
    pub fn input_modes(&self) -> InputModes {
        let state = self.state.borrow();
        InputModes {
            echo: state.echo,
            cbreak: state.cbreak,
            raw: state.raw,
            nl: state.nl,
            half_delay: state.half_delay,
        }
    }

    /// How long a read on `win` would wait, in milliseconds: 0 for
    /// `nodelay`, negative for blocking. Input here never blocks; the value is
    /// what a terminal-backed engine would honour.
    pub fn read_timeout(&self, win: WinId) -> Option<i32> {
        let half_delay = self.state.borrow().half_delay;
        self.read(win, |w| {
            if w.nodelay {
                0
            } else if w.delay >= 0 {
                w.delay
            } else if half_delay > 0 {
                half_delay * 100
            } else {
                -1
            }
        })
    }

    fn read<R>(&self, win: WinId, f: impl FnOnce(&Window) -> R) -> Option<R> {
        self.state.borrow().windows.get(&win).map(f)
    }

    fn with_window<R>(&self, win: WinId, f: impl FnOnce(&mut Window) -> R) -> Option<R> {
        self.state.borrow_mut().windows.get_mut(&win).map(f)
    }

    /// Run a mutating primitive, then honour the window's `syncok` and
    /// `immedok` settings.
    fn edit(&self, win: WinId, f: impl FnOnce(&mut Window) -> NativeResult) -> NativeResult {
        let (result, sync, immed) = self
            .with_window(win, |w| (f(w), w.sync, w.immed))
            .ok_or(Sentinel)?;
        if sync {
            self.syncup(win);
        }
        if immed {
            self.wrefresh(win)?;
        }
        result
    }

    /// Next key from the pushback stack or the raw queue.
    fn next_key(&self, keypad: bool) -> Option<i32> {
        let mut state = self.state.borrow_mut();
        if let Some(key) = state.pushback.pop() {
            return Some(key);
        }
        let (key, used) = {
            let bytes = state.raw_input.make_contiguous();
            if keypad {
                decode_key(bytes)?
            } else {
                (i32::from(*bytes.first()?), 1)
            }
        };
        state.raw_input.drain(..used);
        if state.nl && key == i32::from(b'\r') {
            return Some(i32::from(b'\n'));
        }
        Some(key)
    }

    fn echo_on(&self) -> bool {
        self.state.borrow().echo
    }
}

impl Backend for Headless {
    fn reserve_line(&self, alignment: Alignment) -> bool {
        let mut state = self.state.borrow_mut();
        if state.reserved + state.pending.len() >= self.config.max_reserved_lines {
            debug!("Reservation refused: {} lines already reserved", self.config.max_reserved_lines);
            return false;
        }
        state.pending.push(alignment);
        true
    }

    fn initialize(&self, on_reserved: &mut dyn FnMut(WinId, i32)) -> Option<WinId> {
        let cols = self.config.cols;
        let (root, lines) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let pending = std::mem::take(&mut state.pending);

            let existing = state.stdscr.filter(|id| state.windows.contains_key(id));
            let (mut top, mut bottom) = match existing.and_then(|id| state.windows.get(&id)) {
                Some(w) => (w.beg.0, w.beg.0 + w.rows),
                None => (0, self.config.lines),
            };
            if bottom - top - (pending.len() as i32) < 1 {
                debug!("Initialization failed: {} reserved lines leave no room", pending.len());
                return None;
            }

            let mut lines = Vec::with_capacity(pending.len());
            for alignment in pending {
                let y = match alignment {
                    Alignment::Top => {
                        top += 1;
                        top - 1
                    }
                    Alignment::Bottom => {
                        bottom -= 1;
                        bottom
                    }
                };
                let id = state.insert(Window::new(1, cols, y, 0, self.config.tab_size));
                lines.push(id);
            }
            state.reserved += lines.len();

            let root = match existing {
                Some(id) => {
                    if let Some(w) = state.windows.get_mut(&id) {
                        w.reshape(bottom - top, top);
                    }
                    id
                }
                None => {
                    let id = state.insert(Window::new(bottom - top, cols, top, 0, self.config.tab_size));
                    state.stdscr = Some(id);
                    state.screen.request_clear();
                    id
                }
            };
            state.initialized = true;
            state.ended = false;
            (root, lines)
        };

        for id in lines {
            on_reserved(id, cols);
        }
        Some(root)
    }

    fn end(&self) -> NativeResult {
        let mut state = self.state.borrow_mut();
        if !state.initialized || state.ended {
            return Err(Sentinel);
        }
        state.ended = true;
        Ok(())
    }

    fn is_ended(&self) -> bool {
        self.state.borrow().ended
    }

    fn screen_size(&self) -> (i32, i32) {
        (self.config.lines, self.config.cols)
    }

    fn doupdate(&self) -> NativeResult {
        let mut state = self.state.borrow_mut();
        state.screen.update();
        state.ended = false;
        Ok(())
    }

    fn newwin(&self, lines: i32, cols: i32, y: i32, x: i32) -> Option<WinId> {
        let (max_y, max_x) = self.screen_size();
        let lines = if lines == 0 { max_y.checked_sub(y)? } else { lines };
        let cols = if cols == 0 { max_x.checked_sub(x)? } else { cols };
        if !span_fits(y, lines, max_y) || !span_fits(x, cols, max_x) {
            return None;
        }
        let id = self
            .state
            .borrow_mut()
            .insert(Window::new(lines, cols, y, x, self.config.tab_size));
        debug!("Created window {id} ({lines}x{cols} at {y},{x})");
        Some(id)
    }

    fn subwin(&self, parent: WinId, lines: i32, cols: i32, y: i32, x: i32) -> Option<WinId> {
        let (beg_y, beg_x) = self.read(parent, |p| p.beg)?;
        self.derwin(parent, lines, cols, y.checked_sub(beg_y)?, x.checked_sub(beg_x)?)
    }

    fn derwin(&self, parent: WinId, lines: i32, cols: i32, y: i32, x: i32) -> Option<WinId> {
        let mut state = self.state.borrow_mut();
        let child = {
            let p = state.windows.get(&parent)?;
            let lines = if lines == 0 { p.rows.checked_sub(y)? } else { lines };
            let cols = if cols == 0 { p.cols.checked_sub(x)? } else { cols };
            if !span_fits(y, lines, p.rows) || !span_fits(x, cols, p.cols) {
                return None;
            }
            Window::derived(parent, p, lines, cols, y, x)
        };
        let id = state.insert(child);
        debug!("Created sub-window {id} of {parent}");
        Some(id)
    }

    fn dupwin(&self, win: WinId) -> Option<WinId> {
        let copy = self.read(win, Window::duplicate)?;
        Some(self.state.borrow_mut().insert(copy))
    }

    fn delwin(&self, win: WinId) -> NativeResult {
        let mut state = self.state.borrow_mut();
        state.windows.remove(&win).ok_or(Sentinel)?;
        if state.stdscr == Some(win) {
            state.stdscr = None;
        }
        debug!("Deleted window {win}");
        Ok(())
    }

    fn mvwin(&self, win: WinId, y: i32, x: i32) -> NativeResult {
        let (max_y, max_x) = self.screen_size();
        self.edit(win, |w| {
            if w.parent.is_some() || !span_fits(y, w.rows, max_y) || !span_fits(x, w.cols, max_x) {
                return Err(Sentinel);
            }
            w.beg = (y, x);
            w.touch_all(true);
            Ok(())
        })
    }

    fn mvderwin(&self, win: WinId, y: i32, x: i32) -> NativeResult {
        let mut state = self.state.borrow_mut();
        let parent = state.windows.get(&win).and_then(|w| w.parent).ok_or(Sentinel)?;
        let frame = state.windows.get(&parent).map(Window::frame).ok_or(Sentinel)?;
        let w = state.windows.get_mut(&win).ok_or(Sentinel)?;
        if !span_fits(y, w.rows, frame.rows) || !span_fits(x, w.cols, frame.cols) {
            return Err(Sentinel);
        }
        w.reposition(frame, y, x);
        Ok(())
    }

    fn syncup(&self, win: WinId) {
        let mut state = self.state.borrow_mut();
        let Some(w) = state.windows.get(&win) else {
            return;
        };
        let mut rows: Vec<i32> = w.touched_rows().collect();
        let (mut parent, mut par) = (w.parent, w.par);
        while let Some(id) = parent {
            let Some(p) = state.windows.get_mut(&id) else {
                break;
            };
            for y in rows.iter_mut() {
                *y += par.0;
                let _ = p.touch_range(*y, 1, true);
            }
            (parent, par) = (p.parent, p.par);
        }
    }

    fn syncdown(&self, win: WinId) {
        let mut state = self.state.borrow_mut();
        let Some(w) = state.windows.get(&win) else {
            return;
        };
        let mut touched = vec![false; w.rows.max(0) as usize];
        let (mut parent, mut offset) = (w.parent, w.par.0);
        while let Some(id) = parent {
            let Some(p) = state.windows.get(&id) else {
                break;
            };
            for (y, flag) in touched.iter_mut().enumerate() {
                if p.is_line_touched(y as i32 + offset) == Some(true) {
                    *flag = true;
                }
            }
            offset += p.par.0;
            parent = p.parent;
        }
        if let Some(w) = state.windows.get_mut(&win) {
            for (y, &t) in touched.iter().enumerate() {
                if t {
                    let _ = w.touch_range(y as i32, 1, true);
                }
            }
        }
    }

    fn cursyncup(&self, win: WinId) {
        let mut state = self.state.borrow_mut();
        let Some(w) = state.windows.get(&win) else {
            return;
        };
        let (mut y, mut x) = (w.cur_y, w.cur_x);
        let (mut parent, mut par) = (w.parent, w.par);
        while let Some(id) = parent {
            let Some(p) = state.windows.get_mut(&id) else {
                break;
            };
            y += par.0;
            x += par.1;
            let _ = p.set_cursor(y, x);
            (parent, par) = (p.parent, p.par);
        }
    }

    fn syncok(&self, win: WinId, on: bool) -> NativeResult {
        self.with_window(win, |w| w.sync = on).ok_or(Sentinel)
    }

    fn getyx(&self, win: WinId) -> (i32, i32) {
        self.read(win, |w| (w.cur_y, w.cur_x)).unwrap_or((-1, -1))
    }

    fn getparyx(&self, win: WinId) -> (i32, i32) {
        self.read(win, |w| w.par).unwrap_or((-1, -1))
    }

    fn getbegyx(&self, win: WinId) -> (i32, i32) {
        self.read(win, |w| w.beg).unwrap_or((-1, -1))
    }

    fn getmaxyx(&self, win: WinId) -> (i32, i32) {
        self.read(win, |w| (w.rows, w.cols)).unwrap_or((-1, -1))
    }

    fn wmove(&self, win: WinId, y: i32, x: i32) -> NativeResult {
        self.with_window(win, |w| w.set_cursor(y, x)).ok_or(Sentinel)?
    }

    fn keypad(&self, win: WinId, on: bool) -> NativeResult {
        self.with_window(win, |w| w.keypad = on).ok_or(Sentinel)
    }

    fn nodelay(&self, win: WinId, on: bool) -> NativeResult {
        self.with_window(win, |w| w.nodelay = on).ok_or(Sentinel)
    }

    fn timeout(&self, win: WinId, delay_ms: i32) {
        self.with_window(win, |w| w.delay = delay_ms);
    }

    fn scrollok(&self, win: WinId, on: bool) -> NativeResult {
        self.with_window(win, |w| w.scroll = on).ok_or(Sentinel)
    }

    fn setscrreg(&self, win: WinId, top: i32, bottom: i32) -> NativeResult {
        self.with_window(win, |w| w.set_scroll_region(top, bottom)).ok_or(Sentinel)?
    }

    fn immedok(&self, win: WinId, on: bool) {
        self.with_window(win, |w| w.immed = on);
    }

    fn wnoutrefresh(&self, win: WinId) -> NativeResult {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let w = state.windows.get_mut(&win).ok_or(Sentinel)?;
        if std::mem::take(&mut w.clear_on_refresh) {
            state.screen.request_clear();
        }
        for y in w.take_touched() {
            state.screen.stage(w.beg.0 + y, w.beg.1, &w.line(y));
        }
        state.screen.set_cursor(w.beg.0 + w.cur_y, w.beg.1 + w.cur_x);
        Ok(())
    }

    fn touchln(&self, win: WinId, y: i32, n: i32, changed: bool) -> NativeResult {
        self.with_window(win, |w| w.touch_range(y, n, changed)).ok_or(Sentinel)?
    }

    fn is_linetouched(&self, win: WinId, y: i32) -> Option<bool> {
        self.read(win, |w| w.is_line_touched(y)).flatten()
    }

    fn is_wintouched(&self, win: WinId) -> bool {
        self.read(win, Window::is_touched).unwrap_or(false)
    }

    fn erase(&self, win: WinId) -> NativeResult {
        self.edit(win, |w| {
            w.erase();
            Ok(())
        })
    }

    fn clear(&self, win: WinId) -> NativeResult {
        self.edit(win, |w| {
            w.erase();
            w.clear_on_refresh = true;
            Ok(())
        })
    }

    fn clrtobot(&self, win: WinId) -> NativeResult {
        self.edit(win, |w| {
            w.clear_to_bottom();
            Ok(())
        })
    }

    fn clrtoeol(&self, win: WinId) -> NativeResult {
        self.edit(win, |w| {
            w.clear_to_eol();
            Ok(())
        })
    }

    fn addch(&self, win: WinId, ch: Cell) -> NativeResult {
        self.edit(win, |w| w.add_char(ch))
    }

    fn addchnstr(&self, win: WinId, cells: &[Cell], n: i32) -> NativeResult {
        self.edit(win, |w| w.add_cells(cells, n))
    }

    fn addnstr(&self, win: WinId, s: &[u8], n: i32) -> NativeResult {
        self.edit(win, |w| w.add_str(s, n))
    }

    fn insch(&self, win: WinId, ch: Cell) -> NativeResult {
        self.edit(win, |w| w.insert_char(ch))
    }

    fn insnstr(&self, win: WinId, s: &[u8], n: i32) -> NativeResult {
        self.edit(win, |w| w.insert_str(s, n))
    }

    fn delch(&self, win: WinId) -> NativeResult {
        self.edit(win, Window::delete_char)
    }

    fn insdelln(&self, win: WinId, n: i32) -> NativeResult {
        self.edit(win, |w| w.insert_delete_lines(n))
    }

    fn hline(&self, win: WinId, ch: Cell, n: i32) -> NativeResult {
        self.edit(win, |w| w.hline(ch, n))
    }

    fn vline(&self, win: WinId, ch: Cell, n: i32) -> NativeResult {
        self.edit(win, |w| w.vline(ch, n))
    }

    fn border(&self, win: WinId, cells: [Cell; 8]) -> NativeResult {
        self.edit(win, |w| w.border(cells))
    }

    fn scrl(&self, win: WinId, n: i32) -> NativeResult {
        self.edit(win, |w| w.scroll(n))
    }

    fn attrset(&self, win: WinId, attr: u32) -> NativeResult {
        self.with_window(win, |w| w.attrs = attr).ok_or(Sentinel)
    }

    fn attr_get(&self, win: WinId) -> u32 {
        self.read(win, |w| w.attrs).unwrap_or(0)
    }

    fn bkgdset(&self, win: WinId, ch: Cell) {
        self.with_window(win, |w| w.set_background(ch));
    }

    fn bkgd(&self, win: WinId, ch: Cell) -> NativeResult {
        self.edit(win, |w| {
            w.repaint_background(ch);
            Ok(())
        })
    }

    fn getbkgd(&self, win: WinId) -> Cell {
        self.read(win, |w| w.bkgd).unwrap_or(Cell::BLANK)
    }

    fn inch(&self, win: WinId) -> Cell {
        self.read(win, |w| w.cell(w.cur_y, w.cur_x)).unwrap_or(Cell::BLANK)
    }

    fn inchnstr(&self, win: WinId, n: i32) -> NativeResult<Vec<Cell>> {
        self.read(win, |w| w.read_cells(n)).ok_or(Sentinel)
    }

    fn innstr(&self, win: WinId, n: i32) -> NativeResult<Vec<u8>> {
        self.read(win, |w| w.read_cells(n).iter().map(|c| c.glyph()).collect())
            .ok_or(Sentinel)
    }

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
    ) -> NativeResult {
        let extent = |min: i32, max: i32| max.checked_sub(min).and_then(|d| d.checked_add(1));
        let height = extent(dminrow, dmaxrow).ok_or(Sentinel)?;
        let width = extent(dmincol, dmaxcol).ok_or(Sentinel)?;
        if height <= 0 || width <= 0 || dminrow < 0 || dmincol < 0 {
            return Err(Sentinel);
        }
        let rows = self
            .read(src, |s| {
                if !span_fits(sminrow, height, s.rows) || !span_fits(smincol, width, s.cols) {
                    return None;
                }
                Some(
                    (sminrow..sminrow + height)
                        .map(|y| s.line(y)[smincol as usize..(smincol + width) as usize].to_vec())
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .ok_or(Sentinel)?;

        self.edit(dst, |d| {
            if dmaxrow >= d.rows || dmaxcol >= d.cols {
                return Err(Sentinel);
            }
            for (y, row) in (dminrow..).zip(&rows) {
                d.paste(y, dmincol, row, overlay);
            }
            Ok(())
        })
    }

    fn getch(&self, win: WinId) -> NativeResult<i32> {
        let keypad = self.read(win, |w| w.keypad).ok_or(Sentinel)?;
        if self.is_wintouched(win) {
            self.wrefresh(win)?;
        }
        let key = self.next_key(keypad).ok_or(Sentinel)?;
        if self.echo_on() && (0x20..0x7f).contains(&key) {
            let _ = self.addch(win, Cell::from(key as u8));
        }
        Ok(key)
    }

    fn ungetch(&self, key: i32) -> NativeResult {
        let mut state = self.state.borrow_mut();
        if state.pushback.len() >= PUSHBACK_LIMIT {
            return Err(Sentinel);
        }
        state.pushback.push(key);
        Ok(())
    }

    fn flushinp(&self) {
        let mut state = self.state.borrow_mut();
        state.raw_input.clear();
        state.pushback.clear();
    }

    fn getnstr(&self, win: WinId, n: i32) -> NativeResult<Vec<u8>> {
        let keypad = self.read(win, |w| w.keypad).ok_or(Sentinel)?;
        let max = usize::try_from(n).unwrap_or(LINE_LIMIT);
        let echo = self.echo_on();
        let mut line = Vec::new();
        loop {
            let key = self.next_key(keypad).ok_or(Sentinel)?;
            match key {
                0x0a | 0x0d => break,
                0x08 | 0x7f | KEY_BACKSPACE | KEY_LEFT => {
                    if line.pop().is_some() && echo {
                        let _ = self.addnstr(win, b"\x08 \x08", -1);
                    }
                }
                0..=0xff if line.len() < max => {
                    line.push(key as u8);
                    if echo {
                        let _ = self.addch(win, Cell::from(key as u8));
                    }
                }
                _ => {}
            }
        }
        Ok(line)
    }

    fn start_color(&self) -> NativeResult {
        if self.config.colors == 0 {
            return Err(Sentinel);
        }
        let mut state = self.state.borrow_mut();
        if !state.color_started {
            state.pairs = vec![(COLOR_WHITE, COLOR_BLACK); self.config.color_pairs as usize];
            state.color_started = true;
        }
        Ok(())
    }

    fn has_colors(&self) -> bool {
        self.config.colors > 0
    }

    fn init_pair(&self, pair: i16, fg: i16, bg: i16) -> NativeResult {
        let colors = self.colors();
        let mut state = self.state.borrow_mut();
        if !state.color_started {
            return Err(Sentinel);
        }
        let in_range = |c: i16| (-1..colors).contains(&i32::from(c));
        if pair < 1 || !in_range(fg) || !in_range(bg) {
            return Err(Sentinel);
        }
        let slot = state.pairs.get_mut(pair as usize).ok_or(Sentinel)?;
        *slot = (fg, bg);
        Ok(())
    }

    fn pair_content(&self, pair: i16) -> NativeResult<(i16, i16)> {
        let state = self.state.borrow();
        usize::try_from(pair)
            .ok()
            .and_then(|p| state.pairs.get(p))
            .copied()
            .ok_or(Sentinel)
    }

    fn colors(&self) -> i32 {
        if self.state.borrow().color_started {
            self.config.colors
        } else {
            0
        }
    }

    fn color_pairs(&self) -> i32 {
        self.state.borrow().pairs.len() as i32
    }

    fn curs_set(&self, visibility: i32) -> NativeResult<i32> {
        if !(0..=2).contains(&visibility) {
            return Err(Sentinel);
        }
        let mut state = self.state.borrow_mut();
        Ok(std::mem::replace(&mut state.screen.cursor_visibility, visibility))
    }

    fn beep(&self) -> NativeResult {
        self.state.borrow_mut().screen.bells += 1;
        Ok(())
    }

    fn flash(&self) -> NativeResult {
        self.state.borrow_mut().screen.flashes += 1;
        Ok(())
    }

    fn cbreak(&self, on: bool) -> NativeResult {
        let mut state = self.state.borrow_mut();
        state.cbreak = on;
        if !on {
            state.half_delay = 0;
        }
        Ok(())
    }

    fn echo(&self, on: bool) -> NativeResult {
        self.state.borrow_mut().echo = on;
        Ok(())
    }

    fn raw(&self, on: bool) -> NativeResult {
        self.state.borrow_mut().raw = on;
        Ok(())
    }

    fn nl(&self, on: bool) -> NativeResult {
        self.state.borrow_mut().nl = on;
        Ok(())
    }

    fn halfdelay(&self, tenths: i32) -> NativeResult {
        if !(1..=255).contains(&tenths) {
            return Err(Sentinel);
        }
        let mut state = self.state.borrow_mut();
        state.cbreak = true;
        state.half_delay = tenths;
        Ok(())
    }

    fn napms(&self, ms: i32) -> NativeResult {
        if ms < 0 {
            return Err(Sentinel);
        }
        Ok(())
    }

    fn screen_image(&self) -> Option<ScreenImage> {
        Some(self.state.borrow().screen.image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{KEY_F1, KEY_UP};

    fn engine(lines: i32, cols: i32) -> Headless {
        let config = EngineConfig {
            lines,
            cols,
            ..EngineConfig::default()
        };
        Headless::new(config).unwrap()
    }

    fn started(lines: i32, cols: i32) -> (Headless, WinId) {
        let engine = engine(lines, cols);
        let root = engine.initialize(&mut |_, _| {}).unwrap();
        (engine, root)
    }

    fn row(engine: &Headless, win: WinId, y: i32) -> String {
        engine.wmove(win, y, 0).unwrap();
        String::from_utf8(engine.innstr(win, -1).unwrap()).unwrap()
    }

    #[test]
    fn reserved_lines_are_carved_in_order() {
        let engine = engine(10, 20);
        assert!(engine.reserve_line(Alignment::Top));
        assert!(engine.reserve_line(Alignment::Bottom));
        assert!(engine.reserve_line(Alignment::Top));

        let mut seen = Vec::new();
        let root = engine.initialize(&mut |id, cols| seen.push((id, cols))).unwrap();

        let positions: Vec<_> = seen.iter().map(|&(id, _)| engine.getbegyx(id)).collect();
        assert_eq!(positions, vec![(0, 0), (9, 0), (1, 0)]);
        assert!(seen.iter().all(|&(_, cols)| cols == 20));
        assert_eq!(engine.getbegyx(root), (2, 0));
        assert_eq!(engine.getmaxyx(root), (7, 20));
    }

    #[test]
    fn reservations_are_capped() {
        let engine = engine(24, 80);
        for _ in 0..5 {
            assert!(engine.reserve_line(Alignment::Top));
        }
        assert!(!engine.reserve_line(Alignment::Bottom));
    }

    #[test]
    fn initialize_fails_without_room() {
        let engine = engine(2, 10);
        engine.reserve_line(Alignment::Top);
        engine.reserve_line(Alignment::Bottom);
        let mut calls = 0;
        assert_eq!(engine.initialize(&mut |_, _| calls += 1), None);
        assert_eq!(calls, 0);
        // The failed reservations are gone.
        assert!(engine.initialize(&mut |_, _| calls += 1).is_some());
        assert_eq!(calls, 0);
    }

    #[test]
    fn reinitialize_shrinks_root_and_keeps_id() {
        let (engine, root) = started(6, 10);
        engine.addnstr(root, b"top", -1).unwrap();
        engine.wmove(root, 1, 0).unwrap();
        engine.addnstr(root, b"second", -1).unwrap();
        engine.reserve_line(Alignment::Top);
        let again = engine.initialize(&mut |_, _| {}).unwrap();
        assert_eq!(again, root);
        assert_eq!(engine.getbegyx(root), (1, 0));
        assert_eq!(engine.getmaxyx(root), (5, 10));
        assert_eq!(row(&engine, root, 0), "second    ");
    }

    #[test]
    fn callback_can_draw_during_initialize() {
        let engine = engine(5, 8);
        engine.reserve_line(Alignment::Bottom);
        let root = engine
            .initialize(&mut |id, _| {
                engine.addnstr(id, b"status", -1).unwrap();
                engine.wnoutrefresh(id).unwrap();
            })
            .unwrap();
        engine.wrefresh(root).unwrap();
        let image = engine.screen_image().unwrap();
        assert_eq!(image.row_text(4), "status  ");
    }

    #[test]
    fn refresh_flow_reaches_physical_screen() {
        let (engine, root) = started(3, 6);
        engine.addnstr(root, b"hello", -1).unwrap();
        assert!(engine.is_wintouched(root));
        engine.wnoutrefresh(root).unwrap();
        assert!(!engine.is_wintouched(root));
        assert_eq!(engine.screen_image().unwrap().row_text(0), "      ");

        engine.doupdate().unwrap();
        let image = engine.screen_image().unwrap();
        assert_eq!(image.row_text(0), "hello ");
        assert_eq!(image.cursor, (0, 5));
        assert_eq!(image.frames, 1);
    }

    #[test]
    fn sub_window_edits_need_touch_or_sync() {
        let (engine, root) = started(4, 8);
        engine.wrefresh(root).unwrap();
        let sub = engine.subwin(root, 2, 4, 1, 2).unwrap();
        assert_eq!(engine.getparyx(sub), (1, 2));
        engine.addnstr(sub, b"ab", -1).unwrap();
        assert!(!engine.is_wintouched(root));

        engine.syncup(sub);
        assert_eq!(engine.is_linetouched(root, 1), Some(true));
        assert_eq!(engine.is_linetouched(root, 2), Some(false));
        engine.wrefresh(root).unwrap();
        assert_eq!(engine.screen_image().unwrap().row_text(1), "  ab    ");

        engine.syncok(sub, true).unwrap();
        engine.wmove(sub, 1, 0).unwrap();
        engine.addch(sub, Cell::from(b'z')).unwrap();
        assert_eq!(engine.is_linetouched(root, 2), Some(true));
    }

    #[test]
    fn syncdown_pulls_parent_touches() {
        let (engine, root) = started(4, 8);
        let sub = engine.derwin(root, 2, 4, 2, 0).unwrap();
        engine.untouchwin(sub).unwrap();
        engine.touchln(root, 3, 1, true).unwrap();
        engine.syncdown(sub);
        assert_eq!(engine.is_linetouched(sub, 0), Some(false));
        assert_eq!(engine.is_linetouched(sub, 1), Some(true));
    }

    #[test]
    fn window_creation_bounds() {
        let (engine, root) = started(10, 20);
        assert!(engine.newwin(5, 5, 8, 0).is_none());
        assert!(engine.newwin(-1, 5, 0, 0).is_none());
        let full = engine.newwin(0, 0, 2, 3).unwrap();
        assert_eq!(engine.getmaxyx(full), (8, 17));
        assert!(engine.derwin(root, 3, 3, 9, 0).is_none());
        assert!(engine.subwin(root, 2, 2, 1, 1).is_some());
    }

    #[test]
    fn mvwin_stays_on_screen() {
        let (engine, root) = started(10, 20);
        let win = engine.newwin(3, 5, 0, 0).unwrap();
        assert_eq!(engine.mvwin(win, 7, 15), Ok(()));
        assert_eq!(engine.getbegyx(win), (7, 15));
        assert_eq!(engine.mvwin(win, 8, 0), Err(Sentinel));
        assert_eq!(engine.mvwin(win, 0, -1), Err(Sentinel));

        let sub = engine.derwin(root, 2, 2, 1, 1).unwrap();
        assert_eq!(engine.mvwin(sub, 3, 3), Err(Sentinel));
        assert_eq!(engine.mvderwin(sub, 4, 4), Ok(()));
        assert_eq!(engine.getbegyx(sub), (4, 4));
        assert_eq!(engine.mvderwin(sub, 9, 0), Err(Sentinel));
        assert_eq!(engine.mvderwin(win, 0, 0), Err(Sentinel));
    }

    #[test]
    fn extreme_geometry_is_refused() {
        let (engine, root) = started(10, 20);
        assert!(engine.newwin(i32::MAX, 1, 1, 0).is_none());
        assert!(engine.newwin(0, 0, i32::MIN, i32::MIN).is_none());
        assert!(engine.newwin(1, 1, i32::MAX, i32::MAX).is_none());
        assert!(engine.derwin(root, i32::MAX, 1, 1, 0).is_none());
        assert!(engine.derwin(root, 0, 0, i32::MIN, 0).is_none());
        assert!(engine.subwin(root, 1, 1, i32::MIN, i32::MIN).is_none());

        let win = engine.newwin(2, 2, 0, 0).unwrap();
        assert_eq!(engine.mvwin(win, i32::MAX, 0), Err(Sentinel));
        assert_eq!(engine.mvwin(win, 0, i32::MIN), Err(Sentinel));
        let sub = engine.derwin(root, 2, 2, 0, 0).unwrap();
        assert_eq!(engine.mvderwin(sub, i32::MAX, i32::MAX), Err(Sentinel));
        assert_eq!(engine.getbegyx(sub), (0, 0));

        assert_eq!(engine.copywin(root, win, 0, 0, i32::MIN, 0, i32::MAX, 1, false), Err(Sentinel));
        assert_eq!(engine.copywin(root, win, i32::MAX, 0, 0, 0, 1, 1, false), Err(Sentinel));
        assert_eq!(engine.touchln(root, 1, i32::MAX, true), Ok(()));
        assert_eq!(engine.insdelln(root, i32::MIN), Ok(()));
        assert_eq!(engine.hline(root, Cell::from(b'-'), i32::MAX), Ok(()));
        assert_eq!(engine.window_count(), 3);
    }

    #[test]
    fn orphaned_sub_window_cannot_move() {
        let (engine, _root) = started(10, 20);
        let parent = engine.newwin(5, 5, 0, 0).unwrap();
        let child = engine.derwin(parent, 2, 2, 0, 0).unwrap();
        engine.delwin(parent).unwrap();
        assert_eq!(engine.mvderwin(child, 1, 1), Err(Sentinel));
        assert_eq!(engine.addnstr(child, b"ok", -1), Ok(()));
        assert_eq!(engine.delwin(parent), Err(Sentinel));
    }

    #[test]
    fn overlay_skips_blanks_overwrite_does_not() {
        let (engine, _root) = started(10, 20);
        let src = engine.newwin(1, 4, 0, 0).unwrap();
        let dst = engine.newwin(1, 4, 0, 2).unwrap();
        engine.addnstr(src, b"a b", -1).unwrap();
        engine.addnstr(dst, b"wxyz", -1).ok();

        engine.overlay(src, dst).unwrap();
        assert_eq!(row(&engine, dst, 0), "bxyz");

        engine.overwrite(src, dst).unwrap();
        assert_eq!(row(&engine, dst, 0), "b yz");
    }

    #[test]
    fn copywin_rejects_out_of_range() {
        let (engine, root) = started(10, 20);
        let small = engine.newwin(2, 2, 0, 0).unwrap();
        assert_eq!(engine.copywin(root, small, 0, 0, 0, 0, 2, 1, false), Err(Sentinel));
        assert_eq!(engine.copywin(root, small, 0, 0, 0, 0, 1, 1, false), Ok(()));
    }

    #[test]
    fn getch_decodes_with_keypad() {
        let (engine, root) = started(3, 10);
        engine.echo(false).unwrap();
        engine.feed_input(b"\x1b[A\x1bOPq");
        assert_eq!(engine.getch(root), Ok(0x1b));
        engine.keypad(root, true).unwrap();
        assert_eq!(engine.getch(root), Ok(i32::from(b'[')));
        assert_eq!(engine.getch(root), Ok(i32::from(b'A')));
        assert_eq!(engine.getch(root), Ok(KEY_F1));
        assert_eq!(engine.getch(root), Ok(i32::from(b'q')));
        assert_eq!(engine.getch(root), Err(Sentinel));
    }

    #[test]
    fn pushback_comes_first_and_is_bounded() {
        let (engine, root) = started(3, 10);
        engine.echo(false).unwrap();
        engine.feed_input(b"x");
        engine.ungetch(KEY_UP).unwrap();
        assert_eq!(engine.getch(root), Ok(KEY_UP));
        assert_eq!(engine.getch(root), Ok(i32::from(b'x')));
        for _ in 0..PUSHBACK_LIMIT {
            engine.ungetch(1).unwrap();
        }
        assert_eq!(engine.ungetch(1), Err(Sentinel));
        engine.flushinp();
        assert_eq!(engine.getch(root), Err(Sentinel));
    }

    #[test]
    fn getch_echoes_and_refreshes() {
        let (engine, root) = started(3, 10);
        engine.feed_input(b"hi");
        engine.getch(root).unwrap();
        engine.getch(root).unwrap();
        assert_eq!(row(&engine, root, 0), "hi        ");
    }

    #[test]
    fn getnstr_edits_line() {
        let (engine, root) = started(3, 10);
        engine.feed_input(b"abx\x7fc\rrest");
        assert_eq!(engine.getnstr(root, 10), Ok(b"abc".to_vec()));
        assert_eq!(row(&engine, root, 0), "abc       ");
        assert_eq!(engine.getnstr(root, 2), Err(Sentinel));
    }

    #[test]
    fn colors_require_start() {
        let engine = engine(5, 5);
        assert!(engine.has_colors());
        assert_eq!(engine.colors(), 0);
        assert_eq!(engine.init_pair(1, 2, 3), Err(Sentinel));
        engine.start_color().unwrap();
        assert_eq!(engine.colors(), 8);
        assert_eq!(engine.color_pairs(), 64);
        assert_eq!(engine.init_pair(1, 2, 3), Ok(()));
        assert_eq!(engine.pair_content(1), Ok((2, 3)));
        assert_eq!(engine.pair_content(0), Ok((COLOR_WHITE, COLOR_BLACK)));
        assert_eq!(engine.init_pair(0, 1, 1), Err(Sentinel));
        assert_eq!(engine.init_pair(64, 1, 1), Err(Sentinel));
        assert_eq!(engine.init_pair(2, 8, 0), Err(Sentinel));
        assert_eq!(engine.init_pair(2, -1, -1), Ok(()));
    }

    #[test]
    fn cursor_visibility_and_modes() {
        let (engine, _root) = started(3, 3);
        assert_eq!(engine.curs_set(0), Ok(1));
        assert_eq!(engine.curs_set(2), Ok(0));
        assert_eq!(engine.curs_set(3), Err(Sentinel));
        assert_eq!(engine.halfdelay(0), Err(Sentinel));
        assert_eq!(engine.halfdelay(5), Ok(()));
        let modes = engine.input_modes();
        assert!(modes.cbreak && modes.echo && modes.nl);
        assert_eq!(modes.half_delay, 5);
        engine.cbreak(false).unwrap();
        assert_eq!(engine.input_modes().half_delay, 0);
        engine.beep().unwrap();
        assert_eq!(engine.screen_image().unwrap().bells, 1);
    }

    #[test]
    fn read_timeout_follows_delay_settings() {
        let (engine, root) = started(3, 3);
        assert_eq!(engine.read_timeout(root), Some(-1));
        engine.halfdelay(3).unwrap();
        assert_eq!(engine.read_timeout(root), Some(300));
        engine.timeout(root, 50);
        assert_eq!(engine.read_timeout(root), Some(50));
        engine.nodelay(root, true).unwrap();
        assert_eq!(engine.read_timeout(root), Some(0));
        assert_eq!(engine.read_timeout(WinId(999)), None);
    }

    #[test]
    fn end_and_resume() {
        let engine = engine(3, 3);
        assert_eq!(engine.end(), Err(Sentinel));
        let root = engine.initialize(&mut |_, _| {}).unwrap();
        assert_eq!(engine.end(), Ok(()));
        assert!(engine.is_ended());
        assert_eq!(engine.end(), Err(Sentinel));
        engine.wrefresh(root).unwrap();
        assert!(!engine.is_ended());
    }

    #[test]
    fn clear_forces_full_repaint() {
        let (engine, root) = started(4, 4);
        engine.wrefresh(root).unwrap();
        engine.wmove(root, 1, 0).unwrap();
        engine.clrtoeol(root).unwrap();
        engine.wrefresh(root).unwrap();
        assert_eq!(engine.screen_image().unwrap().rows_updated, 0);
        engine.clear(root).unwrap();
        engine.wrefresh(root).unwrap();
        assert_eq!(engine.screen_image().unwrap().rows_updated, 4);
    }

    #[test]
    fn immedok_refreshes_each_change() {
        let (engine, root) = started(2, 4);
        engine.immedok(root, true);
        engine.addch(root, Cell::from(b'k')).unwrap();
        assert_eq!(engine.screen_image().unwrap().row_text(0), "k   ");
    }
}
