// ABOUTME: One engine session: owns the backend, the startup-line registry and the root handle.
// ABOUTME: Entry point for initialization, top-level window creation and terminal-wide settings.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::backend::{Alignment, Backend};
use crate::buffer::AttributedBuffer;
use crate::constants;
use crate::error::{Error, Result};
use crate::registry::{CallbackError, StartupLineRegistry};
use crate::window::WindowHandle;

pub struct Session {
    backend: Rc<dyn Backend>,
    registry: RefCell<StartupLineRegistry>,
    root: RefCell<Option<WindowHandle>>,
}

impl Session {
    pub fn new(backend: Rc<dyn Backend>) -> Self {
        Self {
            backend,
            registry: RefCell::new(StartupLineRegistry::new()),
            root: RefCell::new(None),
        }
    }

    pub fn backend(&self) -> &Rc<dyn Backend> {
        &self.backend
    }

    /// Reserve a screen line for `callback`, run during the next `initialize`.
    /// Returns whether the engine accepted the reservation.
    pub fn reserve_line<F>(&self, alignment: Alignment, callback: F) -> bool
    where
        F: FnMut(WindowHandle, i32) -> std::result::Result<(), CallbackError> + 'static,
    {
        if !self.backend.reserve_line(alignment) {
            warn!("Engine refused a {alignment:?} startup line");
            return false;
        }
        let index = self.registry.borrow_mut().register(alignment, Box::new(callback));
        debug!("Registered startup line {index} ({alignment:?})");
        true
    }

    /// Number of callbacks waiting for the next `initialize`.
    pub fn pending_lines(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Start the engine, running every registered startup-line callback, and
    /// return the root handle. The registry is emptied whatever the outcome.
    pub fn initialize(&self) -> Result<WindowHandle> {
        let registry = std::mem::take(&mut *self.registry.borrow_mut());
        let mut bridge = registry.into_bridge(Rc::clone(&self.backend));
        let root_id = self
            .backend
            .initialize(&mut |win, cols| bridge.dispatch(win, cols));
        debug!("Dispatched {} startup lines", bridge.dispatched());

        let Some(root_id) = root_id else {
            warn!("Engine initialization failed");
            return Err(Error::InitializationFailed);
        };

        let mut slot = self.root.borrow_mut();
        match slot.as_ref() {
            Some(root) if root.id() == root_id => Ok(root.clone()),
            _ => {
                let root = WindowHandle::root(Rc::clone(&self.backend), root_id);
                debug!("Root window {root_id}");
                *slot = Some(root.clone());
                Ok(root)
            }
        }
    }

    pub fn root(&self) -> Option<WindowHandle> {
        self.root.borrow().clone()
    }

    /// Suspend the engine; the next refresh resumes it.
    pub fn end(&self) -> bool {
        self.backend.end().is_ok()
    }

    pub fn is_ended(&self) -> bool {
        self.backend.is_ended()
    }

    pub fn lines(&self) -> i32 {
        self.backend.screen_size().0
    }

    pub fn cols(&self) -> i32 {
        self.backend.screen_size().1
    }

    /// Push everything staged with `refresh_deferred` to the screen.
    pub fn update(&self) -> bool {
        self.backend.doupdate().is_ok()
    }

    pub fn create_window(&self, lines: i32, cols: i32, y: i32, x: i32) -> Result<WindowHandle> {
        let id = self
            .backend
            .newwin(lines, cols, y, x)
            .ok_or(Error::ResourceExhausted)?;
        Ok(WindowHandle::open(Rc::clone(&self.backend), id))
    }

    pub fn new_buffer(&self, length: i64) -> Result<AttributedBuffer> {
        AttributedBuffer::new(length)
    }

    // Color.

    pub fn start_color(&self) -> bool {
        self.backend.start_color().is_ok()
    }

    pub fn has_colors(&self) -> bool {
        self.backend.has_colors()
    }

    pub fn init_pair(&self, pair: i16, fg: i16, bg: i16) -> bool {
        self.backend.init_pair(pair, fg, bg).is_ok()
    }

    pub fn pair_content(&self, pair: i16) -> Option<(i16, i16)> {
        self.backend.pair_content(pair).ok()
    }

    pub fn colors(&self) -> i32 {
        self.backend.colors()
    }

    pub fn color_pairs(&self) -> i32 {
        self.backend.color_pairs()
    }

    // Terminal.

    /// Set cursor visibility (0 hidden, 1 normal, 2 very visible); returns the previous one.
    pub fn cursor_visibility(&self, visibility: i32) -> Option<i32> {
        self.backend.curs_set(visibility).ok()
    }

    pub fn beep(&self) -> bool {
        self.backend.beep().is_ok()
    }

    pub fn flash(&self) -> bool {
        self.backend.flash().is_ok()
    }

    pub fn napms(&self, ms: i32) -> bool {
        self.backend.napms(ms).is_ok()
    }

    pub fn cbreak(&self, on: bool) -> bool {
        self.backend.cbreak(on).is_ok()
    }

    pub fn echo(&self, on: bool) -> bool {
        self.backend.echo(on).is_ok()
    }

    pub fn raw(&self, on: bool) -> bool {
        self.backend.raw(on).is_ok()
    }

    pub fn newline(&self, on: bool) -> bool {
        self.backend.nl(on).is_ok()
    }

    pub fn half_delay(&self, tenths: i32) -> bool {
        self.backend.halfdelay(tenths).is_ok()
    }

    pub fn unget_key(&self, key: i32) -> bool {
        self.backend.ungetch(key).is_ok()
    }

    pub fn flush_input(&self) {
        self.backend.flushinp();
    }

    /// Every named constant the engine exports.
    pub fn constants(&self) -> &'static [(&'static str, i64)] {
        constants::catalog()
    }
}
