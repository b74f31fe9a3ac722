// ABOUTME: Packed representation of one terminal character: glyph, attributes, color pair.
// ABOUTME: Layout matches the curses chtype so attribute words can be OR'ed into cells.

use std::fmt;

use bitflags::bitflags;

use crate::error::{Error, Result};

/// Mask selecting the glyph byte of a packed cell.
pub const A_CHARTEXT: u32 = 0x0000_00ff;
/// Mask selecting the color pair of a packed cell.
pub const A_COLOR: u32 = 0x0000_ff00;
/// Mask selecting everything except the glyph (attributes and color pair).
pub const A_ATTRIBUTES: u32 = 0xffff_ff00;
/// No attributes.
pub const A_NORMAL: u32 = 0;

const COLOR_SHIFT: u32 = 8;

/// Highest color pair index a cell can carry.
pub const MAX_COLOR_PAIR: u8 = u8::MAX;

bitflags! {
    /// Display attributes stored in the upper half of a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attributes: u32 {
        const STANDOUT   = 1 << 16;
        const UNDERLINE  = 1 << 17;
        const REVERSE    = 1 << 18;
        const BLINK      = 1 << 19;
        const DIM        = 1 << 20;
        const BOLD       = 1 << 21;
        const ALTCHARSET = 1 << 22;
        const INVIS      = 1 << 23;
        const PROTECT    = 1 << 24;
    }
}

/// Attribute word selecting color pair `n` (the curses `COLOR_PAIR` macro).
pub const fn color_pair(n: u8) -> u32 {
    (n as u32) << COLOR_SHIFT
}

/// Extract the pair index from an attribute word (the curses `PAIR_NUMBER` macro).
pub const fn pair_number(attr: u32) -> u8 {
    ((attr & A_COLOR) >> COLOR_SHIFT) as u8
}

/// One terminal character packed into a machine word.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell(u32);

impl Cell {
    /// A space with no attributes on the default pair.
    pub const BLANK: Cell = Cell(b' ' as u32);

    /// Pack a glyph, attribute set and color pair.
    pub const fn new(glyph: u8, attrs: Attributes, pair: u8) -> Self {
        Cell(glyph as u32 | attrs.bits() | color_pair(pair))
    }

    /// Reinterpret a raw packed word. Unknown attribute bits are kept.
    pub const fn from_bits(bits: u32) -> Self {
        Cell(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn glyph(self) -> u8 {
        (self.0 & A_CHARTEXT) as u8
    }

    pub const fn attributes(self) -> Attributes {
        Attributes::from_bits_retain(self.0 & A_ATTRIBUTES & !A_COLOR)
    }

    pub const fn color_pair(self) -> u8 {
        pair_number(self.0)
    }

    /// Attribute and color bits without the glyph.
    pub const fn attr_bits(self) -> u32 {
        self.0 & A_ATTRIBUTES
    }

    /// OR the attribute bits of `attr` into this cell. Glyph bits of `attr` are ignored.
    pub const fn with_attr(self, attr: u32) -> Self {
        Cell(self.0 | (attr & A_ATTRIBUTES))
    }

    /// Same attributes and pair, different glyph.
    pub const fn with_glyph(self, glyph: u8) -> Self {
        Cell((self.0 & A_ATTRIBUTES) | glyph as u32)
    }

    /// Replace the color pair, keeping glyph and attributes.
    pub const fn with_pair(self, pair: u8) -> Self {
        Cell((self.0 & !A_COLOR) | color_pair(pair))
    }

    /// Decode into `(glyph, attributes, color_pair)`.
    pub const fn unpack(self) -> (u8, Attributes, u8) {
        (self.glyph(), self.attributes(), self.color_pair())
    }

    pub const fn is_blank(self) -> bool {
        self.0 & A_CHARTEXT == b' ' as u32
    }
}

impl From<u8> for Cell {
    fn from(glyph: u8) -> Self {
        Cell(glyph as u32)
    }
}

impl TryFrom<char> for Cell {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        u8::try_from(u32::from(c))
            .map(Cell::from)
            .map_err(|_| Error::InvalidArgument(format!("glyph {c:?} does not fit in a cell")))
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("glyph", &(self.glyph() as char))
            .field("attributes", &self.attributes())
            .field("color_pair", &self.color_pair())
            .finish()
    }
}
