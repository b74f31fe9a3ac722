// ABOUTME: Cell storage shared by windows, and the virtual/physical screen pair.
// ABOUTME: A Surface is a plain row-major grid; Screen tracks which rows an update must send.

use crate::backend::ScreenImage;
use crate::cell::Cell;

/// Row-major grid of cells.
#[derive(Debug, Clone)]
pub(crate) struct Surface {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
}

impl Surface {
    pub(crate) fn new(rows: i32, cols: i32) -> Self {
        let rows = rows.max(0);
        let cols = cols.max(0);
        Self {
            rows,
            cols,
            cells: vec![Cell::BLANK; rows as usize * cols as usize],
        }
    }

    pub(crate) fn rows(&self) -> i32 {
        self.rows
    }

    pub(crate) fn cols(&self) -> i32 {
        self.cols
    }

    fn index(&self, y: i32, x: i32) -> Option<usize> {
        if y < 0 || x < 0 || y >= self.rows || x >= self.cols {
            return None;
        }
        Some(y as usize * self.cols as usize + x as usize)
    }

    pub(crate) fn get(&self, y: i32, x: i32) -> Cell {
        self.index(y, x).map_or(Cell::BLANK, |i| self.cells[i])
    }

    pub(crate) fn set(&mut self, y: i32, x: i32, cell: Cell) {
        if let Some(i) = self.index(y, x) {
            self.cells[i] = cell;
        }
    }

    /// `len` cells of row `y` starting at column `x`, clipped to the grid.
    pub(crate) fn span(&self, y: i32, x: i32, len: i32) -> &[Cell] {
        match self.index(y, x) {
            Some(start) => {
                let len = len.clamp(0, self.cols - x) as usize;
                &self.cells[start..start + len]
            }
            None => &[],
        }
    }

    pub(crate) fn span_mut(&mut self, y: i32, x: i32, len: i32) -> &mut [Cell] {
        match self.index(y, x) {
            Some(start) => {
                let len = len.clamp(0, self.cols - x) as usize;
                &mut self.cells[start..start + len]
            }
            None => &mut [],
        }
    }

    pub(crate) fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// The virtual screen windows refresh into and the physical screen
/// `doupdate` copies it to.
pub(crate) struct Screen {
    newscr: Surface,
    curscr: Surface,
    dirty: Vec<bool>,
    clear_pending: bool,
    new_cursor: (i32, i32),
    cursor: (i32, i32),
    pub(crate) cursor_visibility: i32,
    frames: u64,
    rows_updated: usize,
    pub(crate) bells: u32,
    pub(crate) flashes: u32,
}

impl Screen {
    pub(crate) fn new(rows: i32, cols: i32) -> Self {
        Self {
            newscr: Surface::new(rows, cols),
            curscr: Surface::new(rows, cols),
            dirty: vec![false; rows.max(0) as usize],
            clear_pending: false,
            new_cursor: (0, 0),
            cursor: (0, 0),
            cursor_visibility: 1,
            frames: 0,
            rows_updated: 0,
            bells: 0,
            flashes: 0,
        }
    }

    pub(crate) fn rows(&self) -> i32 {
        self.newscr.rows()
    }

    pub(crate) fn cols(&self) -> i32 {
        self.newscr.cols()
    }

    /// Copy `cells` into the virtual screen at row `y`, column `x`.
    pub(crate) fn stage(&mut self, y: i32, x: i32, cells: &[Cell]) {
        if y < 0 || y >= self.rows() {
            return;
        }
        let mut changed = false;
        for (col, &cell) in (x..).zip(cells) {
            if col < 0 || col >= self.cols() {
                continue;
            }
            if self.newscr.get(y, col) != cell {
                self.newscr.set(y, col, cell);
                changed = true;
            }
        }
        if changed {
            self.dirty[y as usize] = true;
        }
    }

    pub(crate) fn set_cursor(&mut self, y: i32, x: i32) {
        self.new_cursor = (y, x);
    }

    pub(crate) fn request_clear(&mut self) {
        self.clear_pending = true;
    }

    /// Bring the physical screen up to date with the virtual one.
    pub(crate) fn update(&mut self) {
        let mut sent = 0;
        if self.clear_pending {
            self.curscr.fill(Cell::BLANK);
            self.dirty.fill(true);
            self.clear_pending = false;
        }
        let cols = self.cols();
        for y in 0..self.rows() {
            if !std::mem::take(&mut self.dirty[y as usize]) {
                continue;
            }
            let row = self.newscr.span(y, 0, cols).to_vec();
            self.curscr.span_mut(y, 0, cols).copy_from_slice(&row);
            sent += 1;
        }
        self.cursor = self.new_cursor;
        self.rows_updated = sent;
        self.frames += 1;
    }

    pub(crate) fn image(&self) -> ScreenImage {
        ScreenImage {
            rows: self.curscr.rows(),
            cols: self.curscr.cols(),
            cells: self.curscr.cells().to_vec(),
            cursor: self.cursor,
            cursor_visibility: self.cursor_visibility,
            frames: self.frames,
            rows_updated: self.rows_updated,
            bells: self.bells,
            flashes: self.flashes,
        }
    }
}
