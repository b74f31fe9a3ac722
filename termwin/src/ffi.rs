// ABOUTME: C-compatible FFI functions for scripting hosts embedding the engine.
// ABOUTME: Wraps Session, WindowHandle and AttributedBuffer behind opaque pointers and status codes.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::rc::Rc;
use std::slice;

use crate::backend::{Alignment, Backend};
use crate::buffer::AttributedBuffer;
use crate::cell::Cell;
use crate::config::EngineConfig;
use crate::constants;
use crate::error::{Error, Result};
use crate::headless::Headless;
use crate::host_callback::{HostCallback, TermwinStartupCallback};
use crate::session::Session;
use crate::snapshot::{self, TermwinScreenSnapshot};
use crate::window::WindowHandle;

/// A session together with the in-memory engine driving it.
pub struct FfiSession {
    session: Session,
    engine: Rc<Headless>,
}

impl FfiSession {
    fn new(config: EngineConfig) -> Result<Self> {
        let engine = Rc::new(Headless::new(config)?);
        let backend: Rc<dyn Backend> = engine.clone();
        Ok(Self {
            session: Session::new(backend),
            engine,
        })
    }
}

/// Opaque pointer types handed to the host.
pub type TermwinSessionRef = *mut FfiSession;
pub type TermwinWindowRef = *mut WindowHandle;
pub type TermwinBufferRef = *mut AttributedBuffer;

/// Outcome of a window operation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermwinStatus {
    Ok = 0,
    /// The engine reported failure.
    Failed = 1,
    /// The window handle was closed.
    Closed = 2,
    InvalidArgument = 3,
    /// The engine could not create a window.
    Exhausted = 4,
}

impl From<&Error> for TermwinStatus {
    fn from(e: &Error) -> Self {
        match e {
            Error::ClosedResource => TermwinStatus::Closed,
            Error::InvalidArgument(_) | Error::InvalidLength(_) => TermwinStatus::InvalidArgument,
            Error::ResourceExhausted => TermwinStatus::Exhausted,
            Error::OperationFailed(_) | Error::InitializationFailed => TermwinStatus::Failed,
        }
    }
}

fn status(result: Result<bool>) -> TermwinStatus {
    match result {
        Ok(true) => TermwinStatus::Ok,
        Ok(false) => TermwinStatus::Failed,
        Err(e) => TermwinStatus::from(&e),
    }
}

fn unit_status(result: Result<()>) -> TermwinStatus {
    status(result.map(|()| true))
}

/// Run `op` on the handle behind `win`, or report a null pointer. A panic
/// inside `op` is reported as `Failed` and never unwinds into the host.
unsafe fn with_window(
    win: TermwinWindowRef,
    op: impl FnOnce(&WindowHandle) -> Result<bool>,
) -> TermwinStatus {
    let Some(handle) = win.as_ref() else {
        return TermwinStatus::InvalidArgument;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| op(handle))) {
        Ok(result) => status(result),
        Err(_) => {
            log::error!("Operation on window {} panicked", handle.id());
            TermwinStatus::Failed
        }
    }
}

unsafe fn bytes<'a>(s: *const c_char) -> Option<&'a [u8]> {
    if s.is_null() {
        None
    } else {
        Some(CStr::from_ptr(s).to_bytes())
    }
}

unsafe fn write_pair(pair: (i32, i32), first: *mut c_int, second: *mut c_int) {
    if let Some(first) = first.as_mut() {
        *first = pair.0;
    }
    if let Some(second) = second.as_mut() {
        *second = pair.1;
    }
}

unsafe fn store_window(
    result: Result<WindowHandle>,
    out: *mut TermwinWindowRef,
) -> TermwinStatus {
    if out.is_null() {
        return TermwinStatus::InvalidArgument;
    }
    match result {
        Ok(handle) => {
            *out = Box::into_raw(Box::new(handle));
            TermwinStatus::Ok
        }
        Err(e) => {
            *out = ptr::null_mut();
            TermwinStatus::from(&e)
        }
    }
}

// -- Session --

/// Create a session sized from the environment (`LINES`, `COLUMNS`, `TERM`,
/// then the controlling terminal).
#[no_mangle]
pub extern "C" fn termwin_session_create() -> TermwinSessionRef {
    match FfiSession::new(EngineConfig::from_env()) {
        Ok(session) => Box::into_raw(Box::new(session)),
        Err(_) => ptr::null_mut(),
    }
}

/// Create a session from a JSON `EngineConfig`. Missing fields take defaults.
///
/// # Safety
/// `json` must be a valid null-terminated UTF-8 string.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_create_with_config(
    json: *const c_char,
) -> TermwinSessionRef {
    if json.is_null() {
        return ptr::null_mut();
    }
    let text = match CStr::from_ptr(json).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };
    match EngineConfig::from_json(text).and_then(FfiSession::new) {
        Ok(session) => Box::into_raw(Box::new(session)),
        Err(e) => {
            log::warn!("Rejected engine config: {e}");
            ptr::null_mut()
        }
    }
}

/// Destroy a session. Window pointers still held by the host stay valid to
/// release but the engine behind them is gone once the last one is freed.
///
/// # Safety
/// `session` must be a valid pointer returned by a `termwin_session_create*`, or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_destroy(session: TermwinSessionRef) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Reserve a screen line for `callback`, run during the next initialize.
/// Returns false if the engine refused the reservation.
///
/// # Safety
/// `session` must be valid. `context` is passed back untouched and must stay
/// valid until the callback has run.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_reserve_line(
    session: TermwinSessionRef,
    top: bool,
    callback: TermwinStartupCallback,
    context: *mut c_void,
) -> bool {
    if session.is_null() {
        return false;
    }
    let host = HostCallback::new(callback, context);
    (*session)
        .session
        .reserve_line(Alignment::from_top(top), host.into_startup())
}

/// Initialize the engine, running every reserved-line callback, and return a
/// new handle on the root window (null on failure). Release it with
/// `termwin_window_release`.
///
/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_initialize(session: TermwinSessionRef) -> TermwinWindowRef {
    if session.is_null() {
        return ptr::null_mut();
    }
    match (*session).session.initialize() {
        Ok(root) => Box::into_raw(Box::new(root)),
        Err(_) => ptr::null_mut(),
    }
}

/// A new handle on the root window, or null before initialization.
///
/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_root(session: TermwinSessionRef) -> TermwinWindowRef {
    if session.is_null() {
        return ptr::null_mut();
    }
    match (*session).session.root() {
        Some(root) => Box::into_raw(Box::new(root)),
        None => ptr::null_mut(),
    }
}

/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_end(session: TermwinSessionRef) -> bool {
    !session.is_null() && (*session).session.end()
}

/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_update(session: TermwinSessionRef) -> bool {
    !session.is_null() && (*session).session.update()
}

/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_lines(session: TermwinSessionRef) -> c_int {
    if session.is_null() {
        return 0;
    }
    (*session).session.lines()
}

/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_cols(session: TermwinSessionRef) -> c_int {
    if session.is_null() {
        return 0;
    }
    (*session).session.cols()
}

/// Queue raw input bytes for `termwin_window_get_key`.
///
/// # Safety
/// `session` must be valid. `data` must point to `len` valid bytes.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_feed_input(
    session: TermwinSessionRef,
    data: *const u8,
    len: u32,
) {
    if session.is_null() || data.is_null() {
        return;
    }
    (*session)
        .engine
        .feed_input(slice::from_raw_parts(data, len as usize));
}

/// Take a snapshot of the physical screen.
///
/// The returned pointer must be freed with `termwin_session_snapshot_free`.
///
/// # Safety
/// `session` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_snapshot(
    session: TermwinSessionRef,
) -> *mut TermwinScreenSnapshot {
    if session.is_null() {
        return ptr::null_mut();
    }
    match (*session).engine.screen_image() {
        Some(image) => Box::into_raw(Box::new(snapshot::take_snapshot(&image))),
        None => ptr::null_mut(),
    }
}

/// # Safety
/// `snapshot` must be a pointer returned by `termwin_session_snapshot`, or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_session_snapshot_free(snapshot: *mut TermwinScreenSnapshot) {
    snapshot::free_snapshot(snapshot);
}

// -- Buffers --

/// Create a buffer of `length` blank cells; null if `length < 1`.
#[no_mangle]
pub extern "C" fn termwin_buffer_new(length: i64) -> TermwinBufferRef {
    match AttributedBuffer::new(length) {
        Ok(buffer) => Box::into_raw(Box::new(buffer)),
        Err(_) => ptr::null_mut(),
    }
}

/// # Safety
/// `buffer` must be a pointer returned by this library, or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_buffer_free(buffer: TermwinBufferRef) {
    if !buffer.is_null() {
        drop(Box::from_raw(buffer));
    }
}

/// # Safety
/// `buffer` must be valid. `glyphs` must point to `len` valid bytes.
#[no_mangle]
pub unsafe extern "C" fn termwin_buffer_set_run(
    buffer: TermwinBufferRef,
    offset: i64,
    glyphs: *const u8,
    len: u32,
    attr: u32,
    repeat: i64,
) {
    if buffer.is_null() || glyphs.is_null() {
        return;
    }
    (*buffer).set_run(offset, slice::from_raw_parts(glyphs, len as usize), attr, repeat);
}

/// # Safety
/// `buffer` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_buffer_set_cell(
    buffer: TermwinBufferRef,
    offset: i64,
    cell: u32,
    attr: u32,
    repeat: i64,
) {
    if let Some(buffer) = buffer.as_mut() {
        buffer.set_cell(offset, Cell::from_bits(cell), attr, repeat);
    }
}

/// Read the packed cell at `offset` into `out`. False if out of range.
///
/// # Safety
/// `buffer` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_buffer_get(
    buffer: TermwinBufferRef,
    offset: i64,
    out: *mut u32,
) -> bool {
    let (Some(buffer), Some(out)) = (buffer.as_ref(), out.as_mut()) else {
        return false;
    };
    match buffer.cell(offset) {
        Some(cell) => {
            *out = cell.bits();
            true
        }
        None => false,
    }
}

/// # Safety
/// `buffer` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_buffer_len(buffer: TermwinBufferRef) -> i64 {
    buffer.as_ref().map_or(0, |b| b.len() as i64)
}

/// # Safety
/// `buffer` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_buffer_duplicate(buffer: TermwinBufferRef) -> TermwinBufferRef {
    match buffer.as_ref() {
        Some(b) => Box::into_raw(Box::new(b.duplicate())),
        None => ptr::null_mut(),
    }
}

// -- Window lifetime --

/// Create a top-level window. On success `*out` holds the new handle.
///
/// # Safety
/// `session` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_create(
    session: TermwinSessionRef,
    lines: c_int,
    cols: c_int,
    y: c_int,
    x: c_int,
    out: *mut TermwinWindowRef,
) -> TermwinStatus {
    if session.is_null() {
        return TermwinStatus::InvalidArgument;
    }
    store_window((*session).session.create_window(lines, cols, y, x), out)
}

/// Another handle on the same window. Closing either closes both.
///
/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_retain(win: TermwinWindowRef) -> TermwinWindowRef {
    match win.as_ref() {
        Some(handle) => Box::into_raw(Box::new(handle.clone())),
        None => ptr::null_mut(),
    }
}

/// Drop this handle. The window is released natively once the last handle
/// on it goes, unless it was already closed.
///
/// # Safety
/// `win` must be a pointer returned by this library, or null. It is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_release(win: TermwinWindowRef) {
    if !win.is_null() {
        drop(Box::from_raw(win));
    }
}

/// Close the window now. Idempotent; a no-op on the root window.
///
/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_close(win: TermwinWindowRef) {
    if let Some(handle) = win.as_ref() {
        handle.close();
    }
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_is_open(win: TermwinWindowRef) -> bool {
    win.as_ref().is_some_and(WindowHandle::is_open)
}

/// # Safety
/// `win` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_sub(
    win: TermwinWindowRef,
    lines: c_int,
    cols: c_int,
    y: c_int,
    x: c_int,
    out: *mut TermwinWindowRef,
) -> TermwinStatus {
    match win.as_ref() {
        Some(handle) => store_window(handle.sub(lines, cols, y, x), out),
        None => TermwinStatus::InvalidArgument,
    }
}

/// # Safety
/// `win` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_derive(
    win: TermwinWindowRef,
    lines: c_int,
    cols: c_int,
    y: c_int,
    x: c_int,
    out: *mut TermwinWindowRef,
) -> TermwinStatus {
    match win.as_ref() {
        Some(handle) => store_window(handle.derive(lines, cols, y, x), out),
        None => TermwinStatus::InvalidArgument,
    }
}

/// # Safety
/// `win` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_duplicate(
    win: TermwinWindowRef,
    out: *mut TermwinWindowRef,
) -> TermwinStatus {
    match win.as_ref() {
        Some(handle) => store_window(handle.duplicate(), out),
        None => TermwinStatus::InvalidArgument,
    }
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_move_window(
    win: TermwinWindowRef,
    y: c_int,
    x: c_int,
) -> TermwinStatus {
    with_window(win, |w| w.move_window(y, x).map(|()| true))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_move_derived(
    win: TermwinWindowRef,
    y: c_int,
    x: c_int,
) -> TermwinStatus {
    with_window(win, |w| w.move_derived(y, x).map(|()| true))
}

// -- Drawing --

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_move_cursor(
    win: TermwinWindowRef,
    y: c_int,
    x: c_int,
) -> TermwinStatus {
    with_window(win, |w| w.move_cursor(y, x))
}

/// Write a null-terminated byte string at the cursor.
///
/// # Safety
/// `win` must be valid. `s` must be a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_add_str(
    win: TermwinWindowRef,
    s: *const c_char,
) -> TermwinStatus {
    let Some(s) = bytes(s) else {
        return TermwinStatus::InvalidArgument;
    };
    with_window(win, |w| w.add_str(s))
}

/// # Safety
/// `win` must be valid. `s` must be a valid null-terminated string.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_add_str_at(
    win: TermwinWindowRef,
    y: c_int,
    x: c_int,
    s: *const c_char,
) -> TermwinStatus {
    let Some(s) = bytes(s) else {
        return TermwinStatus::InvalidArgument;
    };
    with_window(win, |w| w.add_str_at(y, x, s))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_add_cell(win: TermwinWindowRef, cell: u32) -> TermwinStatus {
    with_window(win, |w| w.add_cell(Cell::from_bits(cell)))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_add_cell_at(
    win: TermwinWindowRef,
    y: c_int,
    x: c_int,
    cell: u32,
) -> TermwinStatus {
    with_window(win, |w| w.add_cell_at(y, x, Cell::from_bits(cell)))
}

/// Write up to `n` cells of `buffer` (all of it when `n` is negative).
///
/// # Safety
/// `win` and `buffer` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_add_cells(
    win: TermwinWindowRef,
    buffer: TermwinBufferRef,
    n: c_int,
) -> TermwinStatus {
    let Some(buffer) = buffer.as_ref() else {
        return TermwinStatus::InvalidArgument;
    };
    with_window(win, |w| w.add_cells(buffer, n))
}

/// # Safety
/// `win` and `buffer` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_add_cells_at(
    win: TermwinWindowRef,
    y: c_int,
    x: c_int,
    buffer: TermwinBufferRef,
    n: c_int,
) -> TermwinStatus {
    let Some(buffer) = buffer.as_ref() else {
        return TermwinStatus::InvalidArgument;
    };
    with_window(win, |w| w.add_cells_at(y, x, buffer, n))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_erase(win: TermwinWindowRef) -> TermwinStatus {
    with_window(win, WindowHandle::erase)
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_clear(win: TermwinWindowRef) -> TermwinStatus {
    with_window(win, WindowHandle::clear)
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_clear_to_eol(win: TermwinWindowRef) -> TermwinStatus {
    with_window(win, WindowHandle::clear_to_eol)
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_clear_to_bottom(win: TermwinWindowRef) -> TermwinStatus {
    with_window(win, WindowHandle::clear_to_bottom)
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_refresh(win: TermwinWindowRef) -> TermwinStatus {
    with_window(win, WindowHandle::refresh)
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_refresh_deferred(win: TermwinWindowRef) -> TermwinStatus {
    with_window(win, WindowHandle::refresh_deferred)
}

/// Draw a border from 8 packed cells (left, right, top, bottom, then the
/// four corners). A null `cells` or a zero entry uses the line-drawing default.
///
/// # Safety
/// `win` must be valid. `cells` must point to 8 values, or be null.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_border(
    win: TermwinWindowRef,
    cells: *const u32,
) -> TermwinStatus {
    let mut sides = [Cell::from_bits(0); 8];
    if !cells.is_null() {
        for (side, &bits) in sides.iter_mut().zip(slice::from_raw_parts(cells, 8)) {
            *side = Cell::from_bits(bits);
        }
    }
    with_window(win, |w| w.border(sides))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_draw_box(
    win: TermwinWindowRef,
    verch: u32,
    horch: u32,
) -> TermwinStatus {
    with_window(win, |w| w.draw_box(Cell::from_bits(verch), Cell::from_bits(horch)))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_hline(
    win: TermwinWindowRef,
    cell: u32,
    n: c_int,
) -> TermwinStatus {
    with_window(win, |w| w.hline(Cell::from_bits(cell), n))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_vline(
    win: TermwinWindowRef,
    cell: u32,
    n: c_int,
) -> TermwinStatus {
    with_window(win, |w| w.vline(Cell::from_bits(cell), n))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_attr_on(win: TermwinWindowRef, attr: u32) -> TermwinStatus {
    with_window(win, |w| w.attr_on(attr))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_attr_off(win: TermwinWindowRef, attr: u32) -> TermwinStatus {
    with_window(win, |w| w.attr_off(attr))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_attr_set(win: TermwinWindowRef, attr: u32) -> TermwinStatus {
    with_window(win, |w| w.attr_set(attr))
}

// -- Options and input --

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_keypad(win: TermwinWindowRef, on: bool) -> TermwinStatus {
    with_window(win, |w| w.keypad(on))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_nodelay(win: TermwinWindowRef, on: bool) -> TermwinStatus {
    with_window(win, |w| w.nodelay(on))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_timeout(win: TermwinWindowRef, delay_ms: c_int) -> TermwinStatus {
    match win.as_ref() {
        Some(handle) => unit_status(handle.timeout(delay_ms)),
        None => TermwinStatus::InvalidArgument,
    }
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_scroll_ok(win: TermwinWindowRef, on: bool) -> TermwinStatus {
    with_window(win, |w| w.scroll_ok(on))
}

/// # Safety
/// `win` must be valid.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_scroll(win: TermwinWindowRef, n: c_int) -> TermwinStatus {
    with_window(win, |w| w.scroll(n))
}

/// Read one key into `*key`. `Failed` when no input is available.
///
/// # Safety
/// `win` must be valid. `key` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_get_key(
    win: TermwinWindowRef,
    key: *mut c_int,
) -> TermwinStatus {
    let Some(key) = key.as_mut() else {
        return TermwinStatus::InvalidArgument;
    };
    with_window(win, |w| {
        Ok(match w.get_key()? {
            Some(k) => {
                *key = k;
                true
            }
            None => false,
        })
    })
}

// -- Queries --

/// # Safety
/// `win` must be valid. `y` and `x` must be writable or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_cursor(
    win: TermwinWindowRef,
    y: *mut c_int,
    x: *mut c_int,
) -> TermwinStatus {
    with_window(win, |w| {
        write_pair(w.cursor()?, y, x);
        Ok(true)
    })
}

/// # Safety
/// `win` must be valid. `lines` and `cols` must be writable or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_size(
    win: TermwinWindowRef,
    lines: *mut c_int,
    cols: *mut c_int,
) -> TermwinStatus {
    with_window(win, |w| {
        write_pair(w.size()?, lines, cols);
        Ok(true)
    })
}

/// # Safety
/// `win` must be valid. `y` and `x` must be writable or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_origin(
    win: TermwinWindowRef,
    y: *mut c_int,
    x: *mut c_int,
) -> TermwinStatus {
    with_window(win, |w| {
        write_pair(w.origin()?, y, x);
        Ok(true)
    })
}

/// Read up to `n` cells from the cursor into a new buffer stored in `*out`.
///
/// # Safety
/// `win` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_cells(
    win: TermwinWindowRef,
    n: c_int,
    out: *mut TermwinBufferRef,
) -> TermwinStatus {
    let Some(out) = out.as_mut() else {
        return TermwinStatus::InvalidArgument;
    };
    *out = ptr::null_mut();
    with_window(win, |w| {
        Ok(match w.cells(n)? {
            Some(buffer) => {
                *out = Box::into_raw(Box::new(buffer));
                true
            }
            None => false,
        })
    })
}

/// Read up to `n` glyphs from the cursor as a new C string stored in `*out`.
/// Free it with `termwin_string_free`.
///
/// # Safety
/// `win` must be valid. `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_window_text(
    win: TermwinWindowRef,
    n: c_int,
    out: *mut *mut c_char,
) -> TermwinStatus {
    let Some(out) = out.as_mut() else {
        return TermwinStatus::InvalidArgument;
    };
    *out = ptr::null_mut();
    with_window(win, |w| {
        let Some(text) = w.text(n)? else {
            return Ok(false);
        };
        Ok(match CString::new(text) {
            Ok(cstr) => {
                *out = cstr.into_raw();
                true
            }
            Err(_) => false,
        })
    })
}

/// # Safety
/// `s` must be a pointer returned by `termwin_window_text`, or null.
#[no_mangle]
pub unsafe extern "C" fn termwin_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// -- Constants --

/// Look up a named constant (`KEY_F1`, `A_BOLD`, `ACS_HLINE`, ...).
///
/// # Safety
/// `name` must be a valid null-terminated string. `value` must be writable.
#[no_mangle]
pub unsafe extern "C" fn termwin_constant(name: *const c_char, value: *mut i64) -> bool {
    let (Some(name), Some(value)) = (bytes(name), value.as_mut()) else {
        return false;
    };
    let Ok(name) = std::str::from_utf8(name) else {
        return false;
    };
    match constants::lookup(name) {
        Some(v) => {
            *value = v;
            true
        }
        None => false,
    }
}

/// Library version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn termwin_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn session(lines: i32, cols: i32) -> TermwinSessionRef {
        let json = CString::new(format!(r#"{{"lines": {lines}, "cols": {cols}}}"#)).unwrap();
        let session = unsafe { termwin_session_create_with_config(json.as_ptr()) };
        assert!(!session.is_null());
        session
    }

    thread_local! {
        static ORDER: RefCell<Vec<(usize, c_int)>> = RefCell::new(Vec::new());
    }

    extern "C" fn record(context: *mut c_void, window: TermwinWindowRef, cols: c_int) -> c_int {
        ORDER.with(|o| o.borrow_mut().push((context as usize, cols)));
        let label = CString::new(format!("line {}", context as usize)).unwrap();
        unsafe {
            termwin_window_add_str(window, label.as_ptr());
            termwin_window_refresh_deferred(window);
            termwin_window_release(window);
        }
        0
    }

    #[test]
    fn host_callbacks_run_in_registration_order() {
        let s = session(6, 12);
        unsafe {
            assert!(termwin_session_reserve_line(s, true, record, 1 as *mut c_void));
            assert!(termwin_session_reserve_line(s, false, record, 2 as *mut c_void));
            assert!(termwin_session_reserve_line(s, true, record, 3 as *mut c_void));

            let root = termwin_session_initialize(s);
            assert!(!root.is_null());
            assert_eq!(ORDER.with(|o| o.borrow().clone()), vec![(1, 12), (2, 12), (3, 12)]);

            let (mut lines, mut cols) = (0, 0);
            assert_eq!(termwin_window_size(root, &mut lines, &mut cols), TermwinStatus::Ok);
            assert_eq!((lines, cols), (3, 12));
            assert!(termwin_session_update(s));

            let snap = termwin_session_snapshot(s);
            assert!(!snap.is_null());
            let cells = slice::from_raw_parts((*snap).cells, (*snap).cell_count as usize);
            let row0: Vec<u8> = cells[..12].iter().map(|&c| Cell::from_bits(c).glyph()).collect();
            let row5: Vec<u8> = cells[60..].iter().map(|&c| Cell::from_bits(c).glyph()).collect();
            assert_eq!(&row0, b"line 1      ");
            assert_eq!(&row5, b"line 2      ");
            termwin_session_snapshot_free(snap);

            termwin_window_release(root);
            termwin_session_destroy(s);
        }
    }

    #[test]
    fn window_lifecycle_through_raw_pointers() {
        let s = session(10, 20);
        unsafe {
            let root = termwin_session_initialize(s);
            let mut win = ptr::null_mut();
            assert_eq!(termwin_window_create(s, 4, 8, 1, 1, &mut win), TermwinStatus::Ok);
            assert_eq!((*s).engine.window_count(), 2);

            let alias = termwin_window_retain(win);
            termwin_window_release(win);
            assert_eq!((*s).engine.window_count(), 2);
            assert!(termwin_window_is_open(alias));

            termwin_window_close(alias);
            assert!(!termwin_window_is_open(alias));
            assert_eq!((*s).engine.window_count(), 1);
            let text = CString::new("x").unwrap();
            assert_eq!(termwin_window_add_str(alias, text.as_ptr()), TermwinStatus::Closed);
            termwin_window_release(alias);

            let mut big = ptr::null_mut();
            assert_eq!(termwin_window_create(s, 40, 8, 0, 0, &mut big), TermwinStatus::Exhausted);
            assert!(big.is_null());

            termwin_window_close(root);
            assert!(termwin_window_is_open(root));
            termwin_window_release(root);
            termwin_session_destroy(s);
        }
    }

    #[test]
    fn buffers_through_raw_pointers() {
        let s = session(5, 10);
        unsafe {
            assert!(termwin_buffer_new(0).is_null());
            let buf = termwin_buffer_new(4);
            assert_eq!(termwin_buffer_len(buf), 4);
            termwin_buffer_set_run(buf, 1, b"ab".as_ptr(), 2, constants::A_BOLD, 3);
            let mut cell = 0;
            assert!(termwin_buffer_get(buf, 3, &mut cell));
            assert_eq!(Cell::from_bits(cell).glyph(), b'a');
            assert!(!termwin_buffer_get(buf, 4, &mut cell));

            let copy = termwin_buffer_duplicate(buf);
            termwin_buffer_set_cell(buf, 0, b'z' as u32, 0, 1);
            assert!(termwin_buffer_get(copy, 0, &mut cell));
            assert_eq!(Cell::from_bits(cell), Cell::BLANK);

            let root = termwin_session_initialize(s);
            assert_eq!(termwin_window_add_cells(root, buf, -1), TermwinStatus::Ok);
            let mut text = ptr::null_mut();
            assert_eq!(termwin_window_text(root, 4, &mut text), TermwinStatus::Ok);
            assert_eq!(CStr::from_ptr(text).to_bytes(), b"zaba");
            termwin_string_free(text);

            let mut back = ptr::null_mut();
            assert_eq!(termwin_window_cells(root, 4, &mut back), TermwinStatus::Ok);
            assert!(termwin_buffer_get(back, 1, &mut cell));
            assert_eq!(cell & constants::A_BOLD, constants::A_BOLD);

            termwin_buffer_free(back);
            termwin_buffer_free(copy);
            termwin_buffer_free(buf);
            termwin_window_release(root);
            termwin_session_destroy(s);
        }
    }

    #[test]
    fn keys_and_constants() {
        let s = session(5, 10);
        unsafe {
            let root = termwin_session_initialize(s);
            assert_eq!(termwin_window_keypad(root, true), TermwinStatus::Ok);
            let input = b"\x1b[A";
            termwin_session_feed_input(s, input.as_ptr(), input.len() as u32);
            let mut key = 0;
            assert_eq!(termwin_window_get_key(root, &mut key), TermwinStatus::Ok);
            assert_eq!(key, constants::KEY_UP);
            assert_eq!(termwin_window_get_key(root, &mut key), TermwinStatus::Failed);

            let name = CString::new("KEY_UP").unwrap();
            let mut value = 0;
            assert!(termwin_constant(name.as_ptr(), &mut value));
            assert_eq!(value, constants::KEY_UP as i64);
            let missing = CString::new("KEY_NOPE").unwrap();
            assert!(!termwin_constant(missing.as_ptr(), &mut value));

            let version = CStr::from_ptr(termwin_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));

            termwin_window_release(root);
            termwin_session_destroy(s);
        }
    }

    #[test]
    fn null_pointers_are_rejected() {
        unsafe {
            assert_eq!(termwin_window_erase(ptr::null_mut()), TermwinStatus::InvalidArgument);
            assert!(!termwin_window_is_open(ptr::null_mut()));
            assert!(termwin_session_initialize(ptr::null_mut()).is_null());
            assert!(termwin_session_create_with_config(ptr::null()).is_null());
            let bad = CString::new(r#"{"lines": 0}"#).unwrap();
            assert!(termwin_session_create_with_config(bad.as_ptr()).is_null());
            termwin_window_release(ptr::null_mut());
            termwin_buffer_free(ptr::null_mut());
        }
    }

    #[test]
    fn extreme_arguments_report_status() {
        let s = session(5, 10);
        unsafe {
            let root = termwin_session_initialize(s);
            assert_eq!(termwin_window_hline(root, u32::from(b'-'), c_int::MAX), TermwinStatus::Ok);
            assert_eq!(termwin_window_scroll_ok(root, true), TermwinStatus::Ok);
            assert_eq!(termwin_window_scroll(root, c_int::MIN), TermwinStatus::Ok);
            assert_eq!(termwin_window_move_window(root, c_int::MAX, 0), TermwinStatus::Failed);

            let mut sub: TermwinWindowRef = ptr::null_mut();
            assert_eq!(
                termwin_window_derive(root, c_int::MAX, 1, 1, 0, &mut sub),
                TermwinStatus::Exhausted
            );
            assert!(sub.is_null());

            assert_eq!(with_window(root, |_| panic!("drawing failed")), TermwinStatus::Failed);
            assert!(termwin_window_is_open(root));

            termwin_window_release(root);
            termwin_session_destroy(s);

            let huge = CString::new(r#"{"lines": 70000, "cols": 70000}"#).unwrap();
            assert!(termwin_session_create_with_config(huge.as_ptr()).is_null());
        }
    }
}
