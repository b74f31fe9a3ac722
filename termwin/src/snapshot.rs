// ABOUTME: Copies the physical screen into a flat C-compatible array of packed cells.
// ABOUTME: The host owns the result until it hands it back to free_snapshot.

use crate::backend::ScreenImage;

/// Cursor information exposed to hosts.
#[repr(C)]
pub struct TermwinCursorInfo {
    pub row: u32,
    pub col: u32,
    pub visibility: u8, // 0=Hidden, 1=Normal, 2=Very visible
    pub visible: bool,
}

/// Snapshot of the physical screen.
/// `cells` holds `rows * cols` packed cells, row-major; `cell_count` is its length.
#[repr(C)]
pub struct TermwinScreenSnapshot {
    pub cells: *mut u32,
    pub cell_count: u32,
    pub rows: u32,
    pub cols: u32,
    pub cursor: TermwinCursorInfo,
    pub frames: u64,
    pub bells: u32,
    pub flashes: u32,
}

pub fn take_snapshot(image: &ScreenImage) -> TermwinScreenSnapshot {
    let cells: Box<[u32]> = image.cells.iter().map(|c| c.bits()).collect();
    let cell_count = cells.len() as u32;
    let cells_ptr = Box::into_raw(cells) as *mut u32;

    let visibility = image.cursor_visibility.clamp(0, 2) as u8;
    TermwinScreenSnapshot {
        cells: cells_ptr,
        cell_count,
        rows: image.rows.max(0) as u32,
        cols: image.cols.max(0) as u32,
        cursor: TermwinCursorInfo {
            row: image.cursor.0.max(0) as u32,
            col: image.cursor.1.max(0) as u32,
            visibility,
            visible: visibility != 0,
        },
        frames: image.frames,
        bells: image.bells,
        flashes: image.flashes,
    }
}

/// Free a snapshot allocated by `take_snapshot` and boxed for the host.
///
/// # Safety
/// `snapshot` must come from `Box::into_raw(Box::new(take_snapshot(..)))`, or be null.
pub unsafe fn free_snapshot(snapshot: *mut TermwinScreenSnapshot) {
    if snapshot.is_null() {
        return;
    }
    let snap = Box::from_raw(snapshot);
    if !snap.cells.is_null() {
        let cells = std::ptr::slice_from_raw_parts_mut(snap.cells, snap.cell_count as usize);
        drop(Box::from_raw(cells));
    }
}
