// ABOUTME: Fixed-length run of attributed cells used to stage multi-cell line writes.
// ABOUTME: Writes past either end are clipped or dropped, never an error.

use crate::cell::{Attributes, Cell};
use crate::error::{Error, Result};

/// A fixed-length, mutable sequence of packed cells.
///
/// The length is chosen at construction and never changes. All offsets are
/// signed so that host-supplied values can be passed straight through; an
/// offset outside `0..len` never touches memory.
#[derive(Clone, PartialEq, Eq)]
pub struct AttributedBuffer {
    cells: Vec<Cell>,
}

impl AttributedBuffer {
    /// Create a buffer of `length` blank cells.
    pub fn new(length: i64) -> Result<Self> {
        if length < 1 {
            return Err(Error::InvalidLength(length));
        }
        let length = usize::try_from(length).map_err(|_| Error::InvalidLength(length))?;
        Ok(Self {
            cells: vec![Cell::BLANK; length],
        })
    }

    /// Wrap cells read back from a window.
    pub fn from_cells(cells: Vec<Cell>) -> Result<Self> {
        if cells.is_empty() {
            return Err(Error::InvalidLength(0));
        }
        Ok(Self { cells })
    }

    /// Write `glyphs`, each combined with `attr`, starting at `offset`.
    ///
    /// A run that would cross the end is truncated to fit. The (possibly
    /// truncated) run is written `repeat` times back to back; repetition
    /// stops once the next offset reaches the end. A negative offset or a
    /// non-positive `repeat` writes nothing.
    pub fn set_run(&mut self, offset: i64, glyphs: &[u8], attr: u32, repeat: i64) {
        if offset < 0 || glyphs.is_empty() {
            return;
        }
        let len = self.cells.len();
        let mut offset = match usize::try_from(offset) {
            Ok(o) => o,
            Err(_) => return,
        };
        let mut run = glyphs.len();

        for _ in 0..repeat.max(0) {
            if offset >= len {
                break;
            }
            run = run.min(len - offset);
            for (slot, &glyph) in self.cells[offset..offset + run].iter_mut().zip(glyphs) {
                *slot = Cell::from(glyph).with_attr(attr);
            }
            offset += run;
        }
    }

    /// Write `glyph | attr` at `offset`, `offset + 1`, ... for `repeat` cells.
    ///
    /// The first offset outside the buffer stops the whole write; cells
    /// already written stay written.
    pub fn set_cell(&mut self, offset: i64, glyph: Cell, attr: u32, repeat: i64) {
        let cell = glyph.with_attr(attr);
        let mut offset = offset;
        for _ in 0..repeat.max(0) {
            match self.slot_mut(offset) {
                Some(slot) => *slot = cell,
                None => return,
            }
            offset += 1;
        }
    }

    /// Decode the cell at `offset` into `(glyph, attributes, color_pair)`.
    pub fn get(&self, offset: i64) -> Option<(u8, Attributes, u8)> {
        self.cell(offset).map(Cell::unpack)
    }

    /// The packed cell at `offset`.
    pub fn cell(&self, offset: i64) -> Option<Cell> {
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.cells.get(i))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a buffer holds at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Independent deep copy.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Glyph bytes without attributes.
    pub fn text(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.glyph()).collect()
    }

    fn slot_mut(&mut self, offset: i64) -> Option<&mut Cell> {
        usize::try_from(offset)
            .ok()
            .and_then(move |i| self.cells.get_mut(i))
    }
}

impl std::fmt::Debug for AttributedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributedBuffer")
            .field("len", &self.cells.len())
            .field("text", &String::from_utf8_lossy(&self.text()))
            .finish()
    }
}
