// ABOUTME: Adapts a C function pointer plus opaque context into a startup-line callback.
// ABOUTME: The host receives an owned window pointer it must release through the C ABI.

use std::os::raw::{c_int, c_void};

use thiserror::Error;

use crate::registry::CallbackError;
use crate::window::WindowHandle;

/// C function pointer type for startup-line callbacks.
///
/// `window` is a fresh handle owned by the callee; it stays usable until the
/// callee passes it to `termwin_window_release`. A non-zero return is
/// reported as a failure and logged.
pub type TermwinStartupCallback =
    extern "C" fn(context: *mut c_void, window: *mut WindowHandle, cols: c_int) -> c_int;

#[derive(Debug, Error)]
#[error("host callback returned {0}")]
pub struct HostStatus(pub c_int);

/// Holds the callback function pointer and context for dispatching to the host.
pub struct HostCallback {
    callback: TermwinStartupCallback,
    context: *mut c_void,
}

impl HostCallback {
    pub fn new(callback: TermwinStartupCallback, context: *mut c_void) -> Self {
        Self { callback, context }
    }

    pub fn invoke(&self, window: WindowHandle, cols: i32) -> Result<(), CallbackError> {
        let window = Box::into_raw(Box::new(window));
        match (self.callback)(self.context, window, cols) {
            0 => Ok(()),
            code => Err(Box::new(HostStatus(code))),
        }
    }

    pub fn into_startup(self) -> impl FnMut(WindowHandle, i32) -> Result<(), CallbackError> + 'static {
        move |window, cols| self.invoke(window, cols)
    }
}
