// ABOUTME: Window handles: shared references to one native window with a single owning close.
// ABOUTME: Every operation checks the handle is open; the last alias dropped releases the window.

use std::fmt;
use std::rc::Rc;

use log::{debug, warn};

use crate::backend::{Backend, NativeResult, WinId};
use crate::buffer::AttributedBuffer;
use crate::cell::{Attributes, Cell, A_NORMAL};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Open,
    Closed,
}

struct HandleInner {
    backend: Rc<dyn Backend>,
    id: WinId,
    state: std::cell::Cell<HandleState>,
    root: bool,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        if self.root || self.state.get() == HandleState::Closed {
            return;
        }
        self.state.set(HandleState::Closed);
        match self.backend.delwin(self.id) {
            Ok(()) => debug!("Finalized window {}", self.id),
            Err(_) => warn!("Finalizer could not release window {}", self.id),
        }
    }
}

/// A reference to one native window.
///
/// Clones are aliases: they share one state, so closing through any alias
/// closes them all. When the last alias is dropped without an explicit
/// `close`, the window is released then. The root handle is never released.
#[derive(Clone)]
pub struct WindowHandle {
    inner: Rc<HandleInner>,
}

impl WindowHandle {
    pub(crate) fn open(backend: Rc<dyn Backend>, id: WinId) -> Self {
        Self::wrap(backend, id, false)
    }

    pub(crate) fn root(backend: Rc<dyn Backend>, id: WinId) -> Self {
        Self::wrap(backend, id, true)
    }

    fn wrap(backend: Rc<dyn Backend>, id: WinId, root: bool) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                backend,
                id,
                state: std::cell::Cell::new(HandleState::Open),
                root,
            }),
        }
    }

    pub fn id(&self) -> WinId {
        self.inner.id
    }

    pub fn state(&self) -> HandleState {
        self.inner.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state() == HandleState::Open
    }

    pub fn is_root(&self) -> bool {
        self.inner.root
    }

    /// Number of live aliases of this handle.
    pub fn alias_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Release the native window. A no-op for the root and for closed handles.
    pub fn close(&self) {
        if self.inner.root || !self.is_open() {
            return;
        }
        self.inner.state.set(HandleState::Closed);
        match self.inner.backend.delwin(self.inner.id) {
            Ok(()) => debug!("Closed window {}", self.inner.id),
            Err(_) => warn!("Native release of window {} failed", self.inner.id),
        }
    }

    fn backend(&self) -> &dyn Backend {
        &*self.inner.backend
    }

    fn check(&self) -> Result<WinId> {
        if self.is_open() {
            Ok(self.inner.id)
        } else {
            Err(Error::ClosedResource)
        }
    }

    /// Check `self` is open and run a native call whose outcome is a boolean.
    fn run(&self, f: impl FnOnce(&dyn Backend, WinId) -> NativeResult) -> Result<bool> {
        let id = self.check()?;
        Ok(f(self.backend(), id).is_ok())
    }

    /// Like `run`, after moving the cursor to `(y, x)`.
    fn run_at(&self, y: i32, x: i32, f: impl FnOnce(&dyn Backend, WinId) -> NativeResult) -> Result<bool> {
        self.run(|b, id| {
            b.wmove(id, y, x)?;
            f(b, id)
        })
    }

    fn query<T>(&self, f: impl FnOnce(&dyn Backend, WinId) -> T) -> Result<T> {
        let id = self.check()?;
        Ok(f(self.backend(), id))
    }

    fn child(&self, id: Option<WinId>) -> Result<WindowHandle> {
        let id = id.ok_or(Error::ResourceExhausted)?;
        debug!("Opened window {id} from {}", self.inner.id);
        Ok(WindowHandle::open(Rc::clone(&self.inner.backend), id))
    }

    // Creation.

    /// Sub-window at absolute screen coordinates.
    pub fn sub(&self, lines: i32, cols: i32, y: i32, x: i32) -> Result<WindowHandle> {
        let id = self.check()?;
        self.child(self.backend().subwin(id, lines, cols, y, x))
    }

    /// Sub-window at coordinates relative to this window.
    pub fn derive(&self, lines: i32, cols: i32, y: i32, x: i32) -> Result<WindowHandle> {
        let id = self.check()?;
        self.child(self.backend().derwin(id, lines, cols, y, x))
    }

    pub fn duplicate(&self) -> Result<WindowHandle> {
        let id = self.check()?;
        self.child(self.backend().dupwin(id))
    }

    // Repositioning.

    pub fn move_window(&self, y: i32, x: i32) -> Result<()> {
        let id = self.check()?;
        self.backend()
            .mvwin(id, y, x)
            .map_err(|_| Error::OperationFailed("mvwin"))
    }

    pub fn move_derived(&self, y: i32, x: i32) -> Result<()> {
        let id = self.check()?;
        self.backend()
            .mvderwin(id, y, x)
            .map_err(|_| Error::OperationFailed("mvderwin"))
    }

    // Structure sync.

    pub fn sync_up(&self) -> Result<()> {
        self.query(|b, id| b.syncup(id))
    }

    pub fn sync_down(&self) -> Result<()> {
        self.query(|b, id| b.syncdown(id))
    }

    pub fn cursor_sync_up(&self) -> Result<()> {
        self.query(|b, id| b.cursyncup(id))
    }

    pub fn set_sync(&self, on: bool) -> Result<bool> {
        self.run(|b, id| b.syncok(id, on))
    }

    // Options.

    pub fn keypad(&self, on: bool) -> Result<bool> {
        self.run(|b, id| b.keypad(id, on))
    }

    pub fn nodelay(&self, on: bool) -> Result<bool> {
        self.run(|b, id| b.nodelay(id, on))
    }

    pub fn timeout(&self, delay_ms: i32) -> Result<()> {
        self.query(|b, id| b.timeout(id, delay_ms))
    }

    pub fn scroll_ok(&self, on: bool) -> Result<bool> {
        self.run(|b, id| b.scrollok(id, on))
    }

    pub fn set_scroll_region(&self, top: i32, bottom: i32) -> Result<bool> {
        self.run(|b, id| b.setscrreg(id, top, bottom))
    }

    pub fn immed_ok(&self, on: bool) -> Result<()> {
        self.query(|b, id| b.immedok(id, on))
    }

    // Cursor and scrolling.

    pub fn move_cursor(&self, y: i32, x: i32) -> Result<bool> {
        self.run(|b, id| b.wmove(id, y, x))
    }

    pub fn scroll(&self, n: i32) -> Result<bool> {
        self.run(|b, id| b.scrl(id, n))
    }

    // Refresh.

    pub fn refresh(&self) -> Result<bool> {
        self.run(|b, id| b.wrefresh(id))
    }

    /// Stage this window for the next `Session::update` without drawing.
    pub fn refresh_deferred(&self) -> Result<bool> {
        self.run(|b, id| b.wnoutrefresh(id))
    }

    pub fn redraw(&self) -> Result<bool> {
        self.run(|b, id| b.redrawwin(id))
    }

    pub fn redraw_lines(&self, start: i32, n: i32) -> Result<bool> {
        self.run(|b, id| b.redrawln(id, start, n))
    }

    // Clearing.

    pub fn erase(&self) -> Result<bool> {
        self.run(|b, id| b.erase(id))
    }

    pub fn clear(&self) -> Result<bool> {
        self.run(|b, id| b.clear(id))
    }

    pub fn clear_to_bottom(&self) -> Result<bool> {
        self.run(|b, id| b.clrtobot(id))
    }

    pub fn clear_to_eol(&self) -> Result<bool> {
        self.run(|b, id| b.clrtoeol(id))
    }

    // Change tracking.

    pub fn touch(&self, changed: bool) -> Result<bool> {
        self.run(|b, id| if changed { b.touchwin(id) } else { b.untouchwin(id) })
    }

    pub fn touch_lines(&self, y: i32, n: i32, changed: bool) -> Result<bool> {
        self.run(|b, id| b.touchln(id, y, n, changed))
    }

    pub fn is_line_touched(&self, y: i32) -> Result<Option<bool>> {
        self.query(|b, id| b.is_linetouched(id, y))
    }

    pub fn is_touched(&self) -> Result<bool> {
        self.query(|b, id| b.is_wintouched(id))
    }

    // Attributes.

    pub fn attr_on(&self, attr: u32) -> Result<bool> {
        self.run(|b, id| b.attron(id, attr))
    }

    pub fn attr_off(&self, attr: u32) -> Result<bool> {
        self.run(|b, id| b.attroff(id, attr))
    }

    pub fn attr_set(&self, attr: u32) -> Result<bool> {
        self.run(|b, id| b.attrset(id, attr))
    }

    pub fn attributes(&self) -> Result<u32> {
        self.query(|b, id| b.attr_get(id))
    }

    pub fn standout(&self) -> Result<bool> {
        self.attr_on(Attributes::STANDOUT.bits())
    }

    pub fn standend(&self) -> Result<bool> {
        self.attr_set(A_NORMAL)
    }

    // Input.

    /// Next key, or `None` when no input is available.
    pub fn get_key(&self) -> Result<Option<i32>> {
        self.query(|b, id| b.getch(id).ok())
    }

    pub fn get_key_at(&self, y: i32, x: i32) -> Result<Option<i32>> {
        self.query(|b, id| b.wmove(id, y, x).and_then(|()| b.getch(id)).ok())
    }

    /// Read a line of at most `n` bytes.
    pub fn get_str(&self, n: i32) -> Result<Option<Vec<u8>>> {
        self.query(|b, id| b.getnstr(id, n).ok())
    }

    pub fn get_str_at(&self, y: i32, x: i32, n: i32) -> Result<Option<Vec<u8>>> {
        self.query(|b, id| b.wmove(id, y, x).and_then(|()| b.getnstr(id, n)).ok())
    }

    // Geometry.

    pub fn cursor(&self) -> Result<(i32, i32)> {
        self.query(|b, id| b.getyx(id))
    }

    /// Position inside the parent, `(-1, -1)` for top-level windows.
    pub fn parent_offset(&self) -> Result<(i32, i32)> {
        self.query(|b, id| b.getparyx(id))
    }

    pub fn origin(&self) -> Result<(i32, i32)> {
        self.query(|b, id| b.getbegyx(id))
    }

    pub fn size(&self) -> Result<(i32, i32)> {
        self.query(|b, id| b.getmaxyx(id))
    }

    // Borders and lines.

    pub fn border(&self, cells: [Cell; 8]) -> Result<bool> {
        self.run(|b, id| b.border(id, cells))
    }

    pub fn draw_box(&self, verch: Cell, horch: Cell) -> Result<bool> {
        self.run(|b, id| b.draw_box(id, verch, horch))
    }

    pub fn hline(&self, ch: Cell, n: i32) -> Result<bool> {
        self.run(|b, id| b.hline(id, ch, n))
    }

    pub fn vline(&self, ch: Cell, n: i32) -> Result<bool> {
        self.run(|b, id| b.vline(id, ch, n))
    }

    pub fn hline_at(&self, y: i32, x: i32, ch: Cell, n: i32) -> Result<bool> {
        self.run_at(y, x, |b, id| b.hline(id, ch, n))
    }

    pub fn vline_at(&self, y: i32, x: i32, ch: Cell, n: i32) -> Result<bool> {
        self.run_at(y, x, |b, id| b.vline(id, ch, n))
    }

    // Output.

    pub fn add_cell(&self, ch: Cell) -> Result<bool> {
        self.run(|b, id| b.addch(id, ch))
    }

    pub fn add_cell_at(&self, y: i32, x: i32, ch: Cell) -> Result<bool> {
        self.run_at(y, x, |b, id| b.addch(id, ch))
    }

    pub fn echo_cell(&self, ch: Cell) -> Result<bool> {
        self.run(|b, id| b.echochar(id, ch))
    }

    /// Copy up to `n` cells of `buffer` (all when `n < 0`) at the cursor.
    pub fn add_cells(&self, buffer: &AttributedBuffer, n: i32) -> Result<bool> {
        self.run(|b, id| b.addchnstr(id, buffer.cells(), n))
    }

    pub fn add_cells_at(&self, y: i32, x: i32, buffer: &AttributedBuffer, n: i32) -> Result<bool> {
        self.run_at(y, x, |b, id| b.addchnstr(id, buffer.cells(), n))
    }

    pub fn add_str(&self, s: &[u8]) -> Result<bool> {
        self.run(|b, id| b.addnstr(id, s, -1))
    }

    pub fn add_str_at(&self, y: i32, x: i32, s: &[u8]) -> Result<bool> {
        self.run_at(y, x, |b, id| b.addnstr(id, s, -1))
    }

    // Background.

    pub fn set_background(&self, ch: Cell) -> Result<()> {
        self.query(|b, id| b.bkgdset(id, ch))
    }

    /// Set the background and repaint the cells that used the old one.
    pub fn background_fill(&self, ch: Cell) -> Result<bool> {
        self.run(|b, id| b.bkgd(id, ch))
    }

    pub fn background(&self) -> Result<Cell> {
        self.query(|b, id| b.getbkgd(id))
    }

    // Overlays.

    pub fn overlay(&self, dst: &WindowHandle) -> Result<bool> {
        let dst = dst.check()?;
        self.run(|b, id| b.overlay(id, dst))
    }

    pub fn overwrite(&self, dst: &WindowHandle) -> Result<bool> {
        let dst = dst.check()?;
        self.run(|b, id| b.overwrite(id, dst))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_to(
        &self,
        dst: &WindowHandle,
        sminrow: i32,
        smincol: i32,
        dminrow: i32,
        dmincol: i32,
        dmaxrow: i32,
        dmaxcol: i32,
        overlay: bool,
    ) -> Result<bool> {
        let dst = dst.check()?;
        self.run(|b, id| {
            b.copywin(id, dst, sminrow, smincol, dminrow, dmincol, dmaxrow, dmaxcol, overlay)
        })
    }

    // Deletion and insertion.

    pub fn delete_char(&self) -> Result<bool> {
        self.run(|b, id| b.delch(id))
    }

    pub fn delete_char_at(&self, y: i32, x: i32) -> Result<bool> {
        self.run_at(y, x, |b, id| b.delch(id))
    }

    pub fn delete_line(&self) -> Result<bool> {
        self.run(|b, id| b.deleteln(id))
    }

    pub fn insert_line(&self) -> Result<bool> {
        self.run(|b, id| b.insertln(id))
    }

    pub fn insert_delete_lines(&self, n: i32) -> Result<bool> {
        self.run(|b, id| b.insdelln(id, n))
    }

    pub fn insert_cell(&self, ch: Cell) -> Result<bool> {
        self.run(|b, id| b.insch(id, ch))
    }

    pub fn insert_cell_at(&self, y: i32, x: i32, ch: Cell) -> Result<bool> {
        self.run_at(y, x, |b, id| b.insch(id, ch))
    }

    pub fn insert_str(&self, s: &[u8]) -> Result<bool> {
        self.insert_nstr(s, -1)
    }

    pub fn insert_str_at(&self, y: i32, x: i32, s: &[u8]) -> Result<bool> {
        self.insert_nstr_at(y, x, s, -1)
    }

    pub fn insert_nstr(&self, s: &[u8], n: i32) -> Result<bool> {
        self.run(|b, id| b.insnstr(id, s, n))
    }

    pub fn insert_nstr_at(&self, y: i32, x: i32, s: &[u8], n: i32) -> Result<bool> {
        self.run_at(y, x, |b, id| b.insnstr(id, s, n))
    }

    // Read-back.

    pub fn cell_at_cursor(&self) -> Result<Cell> {
        self.query(|b, id| b.inch(id))
    }

    pub fn cell_at(&self, y: i32, x: i32) -> Result<Option<Cell>> {
        self.query(|b, id| b.wmove(id, y, x).ok().map(|()| b.inch(id)))
    }

    /// Up to `n` cells from the cursor to the end of the line.
    pub fn cells(&self, n: i32) -> Result<Option<AttributedBuffer>> {
        self.query(|b, id| {
            b.inchnstr(id, n)
                .ok()
                .and_then(|cells| AttributedBuffer::from_cells(cells).ok())
        })
    }

    pub fn cells_at(&self, y: i32, x: i32, n: i32) -> Result<Option<AttributedBuffer>> {
        self.query(|b, id| {
            b.wmove(id, y, x)
                .and_then(|()| b.inchnstr(id, n))
                .ok()
                .and_then(|cells| AttributedBuffer::from_cells(cells).ok())
        })
    }

    pub fn text(&self, n: i32) -> Result<Option<Vec<u8>>> {
        self.query(|b, id| b.innstr(id, n).ok())
    }

    pub fn text_at(&self, y: i32, x: i32, n: i32) -> Result<Option<Vec<u8>>> {
        self.query(|b, id| b.wmove(id, y, x).and_then(|()| b.innstr(id, n)).ok())
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state() {
            HandleState::Closed => write!(f, "window (closed)"),
            HandleState::Open => write!(f, "window ({})", self.inner.id),
        }
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("root", &self.inner.root)
            .finish()
    }
}
