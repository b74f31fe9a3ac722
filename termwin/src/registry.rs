// ABOUTME: Startup-line callbacks registered before initialization and the bridge that runs them.
// ABOUTME: Callback failures and panics stop at the bridge; the engine always sees a clean return.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use log::{debug, error, warn};

use crate::backend::{Alignment, Backend, WinId};
use crate::window::WindowHandle;

pub type CallbackError = Box<dyn std::error::Error>;

/// Host code run once for a reserved line: receives the line's window and its width.
pub type StartupCallback = Box<dyn FnMut(WindowHandle, i32) -> Result<(), CallbackError>>;

pub struct StartupEntry {
    pub index: usize,
    pub alignment: Alignment,
    callback: StartupCallback,
}

/// Ordered startup-line callbacks. Indices start at 1 and only grow.
#[derive(Default)]
pub struct StartupLineRegistry {
    entries: Vec<StartupEntry>,
    last_index: usize,
}

impl StartupLineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback and return its index.
    pub fn register(&mut self, alignment: Alignment, callback: StartupCallback) -> usize {
        self.last_index += 1;
        self.entries.push(StartupEntry {
            index: self.last_index,
            alignment,
            callback,
        });
        self.last_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (usize, Alignment)> + '_ {
        self.entries.iter().map(|e| (e.index, e.alignment))
    }

    /// Consume the registry into the closure the engine calls per reserved line.
    pub fn into_bridge(self, backend: Rc<dyn Backend>) -> StartupBridge {
        StartupBridge {
            entries: self.entries,
            cursor: 0,
            backend,
        }
    }
}

/// Dispatches reserved lines to their callbacks in registration order.
pub struct StartupBridge {
    entries: Vec<StartupEntry>,
    cursor: usize,
    backend: Rc<dyn Backend>,
}

impl StartupBridge {
    /// Run the next callback with a fresh handle on `win`. Extra lines with
    /// no callback left are ignored.
    pub fn dispatch(&mut self, win: WinId, cols: i32) {
        let Some(entry) = self.entries.get_mut(self.cursor) else {
            warn!("Reserved line {win} has no callback");
            return;
        };
        self.cursor += 1;

        let handle = WindowHandle::open(Rc::clone(&self.backend), win);
        debug!("Startup line {} -> window {win}, {cols} columns", entry.index);
        let callback = &mut entry.callback;
        match panic::catch_unwind(AssertUnwindSafe(|| callback(handle, cols))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Startup line {} callback failed: {e}", entry.index),
            Err(_) => error!("Startup line {} callback panicked", entry.index),
        }
    }

    /// Lines dispatched so far.
    pub fn dispatched(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::config::EngineConfig;
    use crate::headless::Headless;

    fn engine() -> Rc<dyn Backend> {
        Rc::new(Headless::new(EngineConfig::default()).unwrap())
    }

    #[test]
    fn indices_are_monotonic() {
        let mut registry = StartupLineRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.register(Alignment::Top, Box::new(|_, _| Ok(()))), 1);
        assert_eq!(registry.register(Alignment::Bottom, Box::new(|_, _| Ok(()))), 2);
        let entries: Vec<_> = registry.entries().collect();
        assert_eq!(entries, vec![(1, Alignment::Top), (2, Alignment::Bottom)]);
    }

    #[test]
    fn bridge_runs_callbacks_in_order() {
        let backend = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = StartupLineRegistry::new();
        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            registry.register(
                Alignment::Top,
                Box::new(move |win, cols| {
                    seen.borrow_mut().push((tag, win.is_open(), cols));
                    Ok(())
                }),
            );
        }
        let mut bridge = registry.into_bridge(Rc::clone(&backend));
        for id in 1..=3 {
            bridge.dispatch(WinId(id), 40);
        }
        assert_eq!(bridge.dispatched(), 3);
        assert_eq!(
            *seen.borrow(),
            vec![("a", true, 40), ("b", true, 40), ("c", true, 40)]
        );
    }

    #[test]
    fn failures_and_panics_do_not_stop_dispatch() {
        let backend = engine();
        let reached = Rc::new(RefCell::new(0));
        let mut registry = StartupLineRegistry::new();
        registry.register(Alignment::Top, Box::new(|_, _| Err("no status line".into())));
        registry.register(Alignment::Top, Box::new(|_, _| panic!("callback blew up")));
        let counter = Rc::clone(&reached);
        registry.register(
            Alignment::Bottom,
            Box::new(move |_, _| {
                *counter.borrow_mut() += 1;
                Ok(())
            }),
        );

        let mut bridge = registry.into_bridge(backend);
        for id in 1..=3 {
            bridge.dispatch(WinId(id), 80);
        }
        assert_eq!(*reached.borrow(), 1);
    }

    #[test]
    fn extra_lines_are_ignored() {
        let mut bridge = StartupLineRegistry::new().into_bridge(engine());
        bridge.dispatch(WinId(1), 80);
        assert_eq!(bridge.dispatched(), 0);
    }
}
