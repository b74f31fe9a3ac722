// ABOUTME: One headless window: geometry, cursor, options and the drawing primitives.
// ABOUTME: Sub-windows hold the same surface as their parent at an offset, so edits show through both.

use std::cell::RefCell;
use std::rc::Rc;

use memchr::memchr;

use crate::backend::{NativeResult, Sentinel, WinId};
use crate::cell::{pair_number, Cell, A_COLOR};
use crate::constants::{
    ACS_HLINE, ACS_LLCORNER, ACS_LRCORNER, ACS_ULCORNER, ACS_URCORNER, ACS_VLINE,
};
use crate::input::unctrl;

use super::surface::Surface;

/// Placement of a window, copied out so a child can be re-anchored while
/// the parent stays in the window table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub(crate) beg: (i32, i32),
    off: (i32, i32),
    pub(crate) rows: i32,
    pub(crate) cols: i32,
}

pub(crate) struct Window {
    surface: Rc<RefCell<Surface>>,
    pub(crate) parent: Option<WinId>,
    /// Position on the screen.
    pub(crate) beg: (i32, i32),
    /// Position relative to the parent.
    pub(crate) par: (i32, i32),
    /// Position of cell (0, 0) inside the surface.
    off: (i32, i32),
    pub(crate) rows: i32,
    pub(crate) cols: i32,
    pub(crate) cur_y: i32,
    pub(crate) cur_x: i32,
    pub(crate) attrs: u32,
    pub(crate) bkgd: Cell,
    touched: Vec<bool>,
    pub(crate) scroll: bool,
    pub(crate) keypad: bool,
    pub(crate) nodelay: bool,
    pub(crate) delay: i32,
    pub(crate) immed: bool,
    pub(crate) sync: bool,
    pub(crate) clear_on_refresh: bool,
    scroll_top: i32,
    scroll_bottom: i32,
    tab_size: i32,
}

impl Window {
    /// A top-level window owning a fresh surface.
    pub(crate) fn new(rows: i32, cols: i32, y: i32, x: i32, tab_size: i32) -> Self {
        let surface = Rc::new(RefCell::new(Surface::new(rows, cols)));
        Self::with_surface(surface, None, rows, cols, (y, x), (-1, -1), (0, 0), tab_size)
    }

    /// A sub-window of `parent` at parent-relative `(y, x)`.
    pub(crate) fn derived(parent_id: WinId, parent: &Window, rows: i32, cols: i32, y: i32, x: i32) -> Self {
        let mut win = Self::with_surface(
            Rc::clone(&parent.surface),
            Some(parent_id),
            rows,
            cols,
            (parent.beg.0 + y, parent.beg.1 + x),
            (y, x),
            (parent.off.0 + y, parent.off.1 + x),
            parent.tab_size,
        );
        win.attrs = parent.attrs;
        win.bkgd = parent.bkgd;
        win
    }

    /// Independent copy with its own surface.
    pub(crate) fn duplicate(&self) -> Self {
        let mut copy = Self::new(self.rows, self.cols, self.beg.0, self.beg.1, self.tab_size);
        {
            let mut surface = copy.surface.borrow_mut();
            for y in 0..self.rows {
                surface.span_mut(y, 0, self.cols).copy_from_slice(&self.line(y));
            }
        }
        copy.cur_y = self.cur_y;
        copy.cur_x = self.cur_x;
        copy.attrs = self.attrs;
        copy.bkgd = self.bkgd;
        copy.touched = self.touched.clone();
        copy.scroll = self.scroll;
        copy.keypad = self.keypad;
        copy.nodelay = self.nodelay;
        copy.delay = self.delay;
        copy.scroll_top = self.scroll_top;
        copy.scroll_bottom = self.scroll_bottom;
        copy
    }

    #[allow(clippy::too_many_arguments)]
    fn with_surface(
        surface: Rc<RefCell<Surface>>,
        parent: Option<WinId>,
        rows: i32,
        cols: i32,
        beg: (i32, i32),
        par: (i32, i32),
        off: (i32, i32),
        tab_size: i32,
    ) -> Self {
        Self {
            surface,
            parent,
            beg,
            par,
            off,
            rows,
            cols,
            cur_y: 0,
            cur_x: 0,
            attrs: 0,
            bkgd: Cell::BLANK,
            touched: vec![false; rows as usize],
            scroll: false,
            keypad: false,
            nodelay: false,
            delay: -1,
            immed: false,
            sync: false,
            clear_on_refresh: false,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            tab_size,
        }
    }

    pub(crate) fn frame(&self) -> Frame {
        Frame {
            beg: self.beg,
            off: self.off,
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Re-anchor inside the parent described by `parent` after `mvderwin`.
    pub(crate) fn reposition(&mut self, parent: Frame, y: i32, x: i32) {
        self.par = (y, x);
        self.beg = (parent.beg.0 + y, parent.beg.1 + x);
        self.off = (parent.off.0 + y, parent.off.1 + x);
        self.touch_all(true);
    }

    /// Re-carve a top-level window to a new screen area, keeping the rows
    /// that are still inside it.
    pub(crate) fn reshape(&mut self, rows: i32, y: i32) {
        let mut next = Surface::new(rows, self.cols);
        for row in 0..rows {
            let source = row + y - self.beg.0;
            if (0..self.rows).contains(&source) {
                next.span_mut(row, 0, self.cols).copy_from_slice(&self.line(source));
            }
        }
        self.surface = Rc::new(RefCell::new(next));
        self.rows = rows;
        self.beg.0 = y;
        self.off = (0, 0);
        self.touched = vec![true; rows as usize];
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.cur_y = self.cur_y.min(rows - 1);
    }

    pub(crate) fn contains(&self, y: i32, x: i32) -> bool {
        (0..self.rows).contains(&y) && (0..self.cols).contains(&x)
    }

    pub(crate) fn cell(&self, y: i32, x: i32) -> Cell {
        self.surface.borrow().get(self.off.0 + y, self.off.1 + x)
    }

    fn put(&mut self, y: i32, x: i32, cell: Cell) {
        self.surface.borrow_mut().set(self.off.0 + y, self.off.1 + x, cell);
        self.touch_line(y);
    }

    /// Copy of row `y`.
    pub(crate) fn line(&self, y: i32) -> Vec<Cell> {
        self.surface
            .borrow()
            .span(self.off.0 + y, self.off.1, self.cols)
            .to_vec()
    }

    fn set_line(&mut self, y: i32, cells: &[Cell]) {
        self.surface
            .borrow_mut()
            .span_mut(self.off.0 + y, self.off.1, self.cols)
            .copy_from_slice(cells);
        self.touch_line(y);
    }

    // Change tracking.

    fn touch_line(&mut self, y: i32) {
        if let Some(t) = self.touched.get_mut(y as usize) {
            *t = true;
        }
    }

    pub(crate) fn touch_all(&mut self, changed: bool) {
        self.touched.fill(changed);
    }

    pub(crate) fn touch_range(&mut self, y: i32, n: i32, changed: bool) -> NativeResult {
        if y < 0 || y >= self.rows || n < 0 {
            return Err(Sentinel);
        }
        let end = y.saturating_add(n).min(self.rows);
        self.touched[y as usize..end as usize].fill(changed);
        Ok(())
    }

    pub(crate) fn is_line_touched(&self, y: i32) -> Option<bool> {
        usize::try_from(y).ok().and_then(|y| self.touched.get(y)).copied()
    }

    pub(crate) fn is_touched(&self) -> bool {
        self.touched.iter().any(|&t| t)
    }

    /// Rows touched since the last refresh, clearing the flags.
    pub(crate) fn take_touched(&mut self) -> Vec<i32> {
        let rows = (0..self.rows).filter(|&y| self.touched[y as usize]).collect();
        self.touch_all(false);
        rows
    }

    pub(crate) fn touched_rows(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.rows).filter(move |&y| self.touched[y as usize])
    }

    // Options.

    pub(crate) fn set_cursor(&mut self, y: i32, x: i32) -> NativeResult {
        if !self.contains(y, x) {
            return Err(Sentinel);
        }
        self.cur_y = y;
        self.cur_x = x;
        Ok(())
    }

    pub(crate) fn set_scroll_region(&mut self, top: i32, bottom: i32) -> NativeResult {
        if top < 0 || bottom >= self.rows || bottom <= top {
            return Err(Sentinel);
        }
        self.scroll_top = top;
        self.scroll_bottom = bottom;
        Ok(())
    }

    // Rendering.

    /// Combine a cell with the window's attributes and background.
    fn render(&self, ch: Cell) -> Cell {
        let base = if ch.is_blank() && ch.attr_bits() == 0 {
            self.bkgd
        } else {
            ch.with_attr(self.bkgd.attr_bits() & !A_COLOR)
        };
        let out = base.with_attr(self.attrs & !A_COLOR);
        if out.color_pair() != 0 {
            return out;
        }
        match pair_number(self.attrs) {
            0 => out.with_pair(self.bkgd.color_pair()),
            pair => out.with_pair(pair),
        }
    }

    fn blank(&self) -> Cell {
        self.bkgd
    }

    // Text output.

    pub(crate) fn add_char(&mut self, ch: Cell) -> NativeResult {
        let attrs = ch.attr_bits();
        match ch.glyph() {
            b'\n' => {
                self.clear_to_eol();
                self.cur_x = 0;
                self.advance_line()
            }
            b'\r' => {
                self.cur_x = 0;
                Ok(())
            }
            0x08 => {
                self.cur_x = (self.cur_x - 1).max(0);
                Ok(())
            }
            b'\t' => {
                let stop = (self.cur_x / self.tab_size + 1) * self.tab_size;
                for _ in self.cur_x..stop.min(self.cols) {
                    self.put_char(Cell::BLANK.with_attr(attrs))?;
                }
                Ok(())
            }
            0x00..=0x1f | 0x7f => {
                for byte in unctrl(ch).bytes() {
                    self.put_char(Cell::from(byte).with_attr(attrs))?;
                }
                Ok(())
            }
            _ => self.put_char(ch),
        }
    }

    /// Store one cell at the cursor and advance, wrapping at the right edge.
    fn put_char(&mut self, ch: Cell) -> NativeResult {
        let cell = self.render(ch);
        self.put(self.cur_y, self.cur_x, cell);
        self.cur_x += 1;
        if self.cur_x < self.cols {
            return Ok(());
        }
        self.cur_x = 0;
        if self.advance_line().is_err() {
            self.cur_x = self.cols - 1;
            return Err(Sentinel);
        }
        Ok(())
    }

    fn advance_line(&mut self) -> NativeResult {
        if self.cur_y == self.scroll_bottom {
            if !self.scroll {
                return Err(Sentinel);
            }
            self.scroll_region(1);
            Ok(())
        } else if self.cur_y < self.rows - 1 {
            self.cur_y += 1;
            Ok(())
        } else {
            Err(Sentinel)
        }
    }

    pub(crate) fn add_str(&mut self, s: &[u8], n: i32) -> NativeResult {
        for &byte in limit(s, n) {
            self.add_char(Cell::from(byte))?;
        }
        Ok(())
    }

    /// Copy cells from the cursor to at most the end of the line; the cursor stays.
    pub(crate) fn add_cells(&mut self, cells: &[Cell], n: i32) -> NativeResult {
        let n = if n < 0 { cells.len() } else { (n as usize).min(cells.len()) };
        let (y, mut x) = (self.cur_y, self.cur_x);
        for &cell in cells[..n].iter().take_while(|c| c.glyph() != 0) {
            if x >= self.cols {
                break;
            }
            self.put(y, x, cell);
            x += 1;
        }
        Ok(())
    }

    pub(crate) fn insert_char(&mut self, ch: Cell) -> NativeResult {
        match ch.glyph() {
            0x00..=0x1f | 0x7f => {
                let attrs = ch.attr_bits();
                for byte in unctrl(ch).bytes().rev() {
                    self.insert_rendered(self.render(Cell::from(byte).with_attr(attrs)));
                }
            }
            _ => self.insert_rendered(self.render(ch)),
        }
        Ok(())
    }

    fn insert_rendered(&mut self, cell: Cell) {
        let mut line = self.line(self.cur_y);
        let x = self.cur_x as usize;
        line.insert(x, cell);
        line.pop();
        self.set_line(self.cur_y, &line);
    }

    pub(crate) fn insert_str(&mut self, s: &[u8], n: i32) -> NativeResult {
        for &byte in limit(s, n).iter().rev() {
            self.insert_char(Cell::from(byte))?;
        }
        Ok(())
    }

    pub(crate) fn delete_char(&mut self) -> NativeResult {
        let mut line = self.line(self.cur_y);
        line.remove(self.cur_x as usize);
        line.push(self.blank());
        self.set_line(self.cur_y, &line);
        Ok(())
    }

    /// Positive `n` opens blank lines at the cursor line; negative `n` removes lines there.
    pub(crate) fn insert_delete_lines(&mut self, n: i32) -> NativeResult {
        let top = self.cur_y;
        let bottom = self.rows - 1;
        self.shift_lines(top, bottom, n.saturating_neg());
        Ok(())
    }

    /// Move lines `top..=bottom` up by `n` (down when negative), filling with blanks.
    fn shift_lines(&mut self, top: i32, bottom: i32, n: i32) {
        if n == 0 || top > bottom {
            return;
        }
        let height = bottom - top + 1;
        let n = n.clamp(-height, height);
        let blank = vec![self.blank(); self.cols as usize];
        let lines: Vec<Vec<Cell>> = (top..=bottom).map(|y| self.line(y)).collect();
        for (i, y) in (top..=bottom).enumerate() {
            let source = i as i32 + n;
            if (0..height).contains(&source) {
                self.set_line(y, &lines[source as usize]);
            } else {
                self.set_line(y, &blank);
            }
        }
    }

    fn scroll_region(&mut self, n: i32) {
        self.shift_lines(self.scroll_top, self.scroll_bottom, n);
    }

    pub(crate) fn scroll(&mut self, n: i32) -> NativeResult {
        if !self.scroll {
            return Err(Sentinel);
        }
        self.scroll_region(n);
        Ok(())
    }

    // Lines and borders.

    pub(crate) fn hline(&mut self, ch: Cell, n: i32) -> NativeResult {
        let ch = self.render(default_glyph(ch, ACS_HLINE));
        let end = self.cur_x.saturating_add(n.max(0)).min(self.cols);
        for x in self.cur_x..end {
            self.put(self.cur_y, x, ch);
        }
        Ok(())
    }

    pub(crate) fn vline(&mut self, ch: Cell, n: i32) -> NativeResult {
        let ch = self.render(default_glyph(ch, ACS_VLINE));
        let end = self.cur_y.saturating_add(n.max(0)).min(self.rows);
        for y in self.cur_y..end {
            self.put(y, self.cur_x, ch);
        }
        Ok(())
    }

    pub(crate) fn border(&mut self, cells: [Cell; 8]) -> NativeResult {
        let defaults = [
            ACS_VLINE,
            ACS_VLINE,
            ACS_HLINE,
            ACS_HLINE,
            ACS_ULCORNER,
            ACS_URCORNER,
            ACS_LLCORNER,
            ACS_LRCORNER,
        ];
        let mut parts = [Cell::BLANK; 8];
        for (slot, (&cell, &fallback)) in parts.iter_mut().zip(cells.iter().zip(&defaults)) {
            *slot = self.render(default_glyph(cell, fallback));
        }
        let [ls, rs, ts, bs, tl, tr, bl, br] = parts;
        let (right, bottom) = (self.cols - 1, self.rows - 1);

        for x in 1..right {
            self.put(0, x, ts);
            self.put(bottom, x, bs);
        }
        for y in 1..bottom {
            self.put(y, 0, ls);
            self.put(y, right, rs);
        }
        self.put(0, 0, tl);
        self.put(0, right, tr);
        self.put(bottom, 0, bl);
        self.put(bottom, right, br);
        Ok(())
    }

    // Clearing.

    pub(crate) fn erase(&mut self) {
        let blank = vec![self.blank(); self.cols as usize];
        for y in 0..self.rows {
            self.set_line(y, &blank);
        }
        self.cur_y = 0;
        self.cur_x = 0;
    }

    pub(crate) fn clear_to_eol(&mut self) {
        let blank = self.blank();
        for x in self.cur_x..self.cols {
            self.put(self.cur_y, x, blank);
        }
    }

    pub(crate) fn clear_to_bottom(&mut self) {
        self.clear_to_eol();
        let blank = vec![self.blank(); self.cols as usize];
        for y in self.cur_y + 1..self.rows {
            self.set_line(y, &blank);
        }
    }

    // Background.

    pub(crate) fn set_background(&mut self, ch: Cell) {
        self.bkgd = if ch.glyph() == 0 { ch.with_glyph(b' ') } else { ch };
    }

    /// Swap the background, repainting cells that carried the old one.
    pub(crate) fn repaint_background(&mut self, ch: Cell) {
        let old = self.bkgd;
        self.set_background(ch);
        let new = self.bkgd;
        for y in 0..self.rows {
            let line: Vec<Cell> = self
                .line(y)
                .into_iter()
                .map(|c| {
                    let glyph = if c.glyph() == old.glyph() { new.glyph() } else { c.glyph() };
                    let attrs = (c.attributes() - old.attributes()) | new.attributes();
                    let pair = if c.color_pair() == old.color_pair() {
                        new.color_pair()
                    } else {
                        c.color_pair()
                    };
                    Cell::new(glyph, attrs, pair)
                })
                .collect();
            self.set_line(y, &line);
        }
    }

    // Read-back.

    pub(crate) fn read_cells(&self, n: i32) -> Vec<Cell> {
        let line = self.line(self.cur_y);
        let rest = &line[self.cur_x as usize..];
        let n = if n < 0 { rest.len() } else { (n as usize).min(rest.len()) };
        rest[..n].to_vec()
    }

    /// Write `cells` at `(y, x)`, skipping blanks when `overlay` is set.
    pub(crate) fn paste(&mut self, y: i32, x: i32, cells: &[Cell], overlay: bool) {
        for (col, &cell) in (x..).zip(cells) {
            if overlay && cell.is_blank() {
                continue;
            }
            self.put(y, col, cell);
        }
    }
}

/// Bytes of `s` before the first NUL, at most `n` of them (`n < 0` for all).
pub(crate) fn limit(s: &[u8], n: i32) -> &[u8] {
    let s = match memchr(0, s) {
        Some(nul) => &s[..nul],
        None => s,
    };
    if n < 0 {
        s
    } else {
        &s[..(n as usize).min(s.len())]
    }
}

fn default_glyph(ch: Cell, fallback: u32) -> Cell {
    if ch.glyph() == 0 {
        Cell::from_bits(fallback).with_attr(ch.attr_bits())
    } else {
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attributes;

    fn text(win: &Window, y: i32) -> String {
        win.line(y).iter().map(|c| c.glyph() as char).collect()
    }

    #[test]
    fn wraps_at_right_edge() {
        let mut win = Window::new(3, 4, 0, 0, 8);
        win.add_str(b"abcdef", -1).unwrap();
        assert_eq!(text(&win, 0), "abcd");
        assert_eq!(text(&win, 1), "ef  ");
        assert_eq!((win.cur_y, win.cur_x), (1, 2));
    }

    #[test]
    fn bottom_right_write_stores_then_fails() {
        let mut win = Window::new(2, 3, 0, 0, 8);
        win.set_cursor(1, 2).unwrap();
        assert_eq!(win.add_char(Cell::from(b'z')), Err(Sentinel));
        assert_eq!(win.cell(1, 2).glyph(), b'z');
        assert_eq!((win.cur_y, win.cur_x), (1, 2));
    }

    #[test]
    fn scrolls_when_enabled() {
        let mut win = Window::new(2, 3, 0, 0, 8);
        win.scroll = true;
        win.add_str(b"abc", -1).unwrap();
        win.add_str(b"def", -1).unwrap();
        assert_eq!(text(&win, 0), "def");
        assert_eq!(text(&win, 1), "   ");
    }

    #[test]
    fn controls_and_tabs() {
        let mut win = Window::new(2, 12, 0, 0, 4);
        win.add_str(b"a\tb\x01", -1).unwrap();
        assert_eq!(text(&win, 0), "a   b^A     ");
        win.add_str(b"x\ny", -1).unwrap();
        assert_eq!((win.cur_y, win.cur_x), (1, 1));
    }

    #[test]
    fn strings_stop_at_nul_and_limit() {
        let mut win = Window::new(1, 8, 0, 0, 8);
        win.add_str(b"ab\0cd", -1).unwrap();
        win.add_str(b"xyz", 2).unwrap();
        assert_eq!(text(&win, 0), "abxy    ");
    }

    #[test]
    fn sub_window_shares_cells() {
        let mut parent = Window::new(4, 6, 0, 0, 8);
        let mut child = Window::derived(WinId(1), &parent, 2, 3, 1, 2);
        assert_eq!(child.beg, (1, 2));
        child.add_str(b"hi", -1).unwrap();
        assert_eq!(text(&parent, 1), "  hi  ");
        parent.set_cursor(2, 2).unwrap();
        parent.add_char(Cell::from(b'!')).unwrap();
        assert_eq!(child.cell(1, 0).glyph(), b'!');
    }

    #[test]
    fn attributes_and_background_render() {
        let mut win = Window::new(1, 4, 0, 0, 8);
        win.attrs = Attributes::BOLD.bits();
        win.set_background(Cell::from(b'.').with_attr(crate::cell::color_pair(3)));
        win.add_char(Cell::from(b'x')).unwrap();
        assert_eq!(win.cell(0, 0).unpack(), (b'x', Attributes::BOLD, 3));
        win.add_char(Cell::BLANK).unwrap();
        assert_eq!(win.cell(0, 1).unpack(), (b'.', Attributes::BOLD, 3));
    }

    #[test]
    fn insert_and_delete_chars() {
        let mut win = Window::new(1, 5, 0, 0, 8);
        win.add_str(b"abcd", -1).unwrap();
        win.set_cursor(0, 1).unwrap();
        win.insert_str(b"XY", -1).unwrap();
        assert_eq!(text(&win, 0), "aXYbc");
        win.delete_char().unwrap();
        assert_eq!(text(&win, 0), "aYbc ");
    }

    #[test]
    fn insert_delete_lines_shift_from_cursor() {
        let mut win = Window::new(3, 2, 0, 0, 8);
        win.add_str(b"aabbcc", -1).ok();
        win.set_cursor(1, 0).unwrap();
        win.insert_delete_lines(1).unwrap();
        assert_eq!([text(&win, 0), text(&win, 1), text(&win, 2)], ["aa", "  ", "bb"]);
        win.insert_delete_lines(-1).unwrap();
        assert_eq!([text(&win, 0), text(&win, 1), text(&win, 2)], ["aa", "bb", "  "]);
    }

    #[test]
    fn border_uses_line_drawing_defaults() {
        let mut win = Window::new(3, 3, 0, 0, 8);
        win.border([Cell::from_bits(0); 8]).unwrap();
        assert_eq!(win.cell(0, 0).bits(), ACS_ULCORNER);
        assert_eq!(win.cell(0, 1).bits(), ACS_HLINE);
        assert_eq!(win.cell(1, 2).bits(), ACS_VLINE);
        assert_eq!(win.cell(2, 2).bits(), ACS_LRCORNER);
        assert!(win.cell(1, 1).is_blank());
    }

    #[test]
    fn background_repaint_replaces_old_glyph() {
        let mut win = Window::new(1, 3, 0, 0, 8);
        win.add_char(Cell::from(b'k')).unwrap();
        win.repaint_background(Cell::from(b'-'));
        assert_eq!(text(&win, 0), "k--");
    }

    #[test]
    fn touch_tracking() {
        let mut win = Window::new(3, 3, 0, 0, 8);
        assert!(!win.is_touched());
        win.set_cursor(1, 0).unwrap();
        win.add_char(Cell::from(b'q')).unwrap();
        assert_eq!(win.is_line_touched(1), Some(true));
        assert_eq!(win.is_line_touched(0), Some(false));
        assert_eq!(win.is_line_touched(3), None);
        assert_eq!(win.take_touched(), vec![1]);
        assert!(!win.is_touched());
        assert_eq!(win.touch_range(3, 1, true), Err(Sentinel));
        assert_eq!(win.touch_range(1, i32::MAX, true), Ok(()));
        assert_eq!(win.take_touched(), vec![1, 2]);
        assert_eq!(win.touch_range(0, i32::MIN, true), Err(Sentinel));
    }

    #[test]
    fn huge_counts_are_clamped() {
        let mut win = Window::new(3, 4, 0, 0, 8);
        win.add_str(b"aaaabbbbcccc", -1).ok();
        win.set_cursor(1, 1).unwrap();
        win.hline(Cell::from(b'-'), i32::MAX).unwrap();
        assert_eq!(text(&win, 1), "b---");
        win.vline(Cell::from(b'|'), i32::MAX).unwrap();
        assert_eq!(win.cell(2, 1).glyph(), b'|');

        win.insert_delete_lines(i32::MIN).unwrap();
        assert_eq!([text(&win, 0), text(&win, 1), text(&win, 2)], ["aaaa", "    ", "    "]);

        win.set_cursor(0, 0).unwrap();
        win.insert_delete_lines(i32::MAX).unwrap();
        assert_eq!(text(&win, 0), "    ");

        win.scroll = true;
        win.add_str(b"zz", -1).unwrap();
        assert_eq!(win.scroll(i32::MAX), Ok(()));
        assert_eq!(win.scroll(i32::MIN), Ok(()));
        assert_eq!(text(&win, 0), "    ");
    }
}
