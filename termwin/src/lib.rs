// ABOUTME: Entry point for the termwin library: a curses-style windowing engine.
// ABOUTME: Exposes a Rust API (Session, WindowHandle, AttributedBuffer) and C FFI functions for hosts.

pub mod backend;
pub mod buffer;
pub mod cell;
pub mod config;
pub mod constants;
pub mod error;
pub mod ffi;
pub mod headless;
pub mod host_callback;
pub mod input;
pub mod registry;
pub mod session;
pub mod snapshot;
pub mod window;

pub use backend::{Alignment, Backend, WinId};
pub use buffer::AttributedBuffer;
pub use cell::{Attributes, Cell};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use headless::Headless;
pub use registry::{CallbackError, StartupLineRegistry};
pub use session::Session;
pub use window::{HandleState, WindowHandle};
