// ABOUTME: Engine configuration: screen dimensions, color table sizes and tab stops.
// ABOUTME: Loaded from defaults, the controlling terminal, the environment, or a JSON document.

use std::os::fd::RawFd;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest pair table a packed cell can address.
pub const MAX_COLOR_PAIRS: i32 = 256;

/// Largest screen dimension a terminal can report through `TIOCGWINSZ`.
pub const MAX_SCREEN_DIMENSION: i32 = u16::MAX as i32;

/// Largest screen area, in cells, the engine will allocate.
pub const MAX_SCREEN_CELLS: i32 = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lines: i32,
    pub cols: i32,
    pub colors: i32,
    pub color_pairs: i32,
    pub tab_size: i32,
    /// Upper bound on startup-line reservations accepted before `initialize`.
    pub max_reserved_lines: usize,
    pub term_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lines: 24,
            cols: 80,
            colors: 8,
            color_pairs: 64,
            tab_size: 8,
            max_reserved_lines: 5,
            term_name: "dumb".to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by the size of the terminal on stdout, then by
    /// `TERM`, `LINES` and `COLUMNS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some((rows, cols)) = probe_size(libc::STDOUT_FILENO) {
            config.lines = i32::from(rows);
            config.cols = i32::from(cols);
        }
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| Error::InvalidArgument(format!("engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidArgument(format!("engine config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.lines < 1 || self.cols < 1 {
            return Err(Error::InvalidArgument(format!(
                "screen size {}x{} must be positive",
                self.lines, self.cols
            )));
        }
        let area = self.lines.checked_mul(self.cols);
        if self.lines > MAX_SCREEN_DIMENSION
            || self.cols > MAX_SCREEN_DIMENSION
            || !area.is_some_and(|cells| cells <= MAX_SCREEN_CELLS)
        {
            return Err(Error::InvalidArgument(format!(
                "screen size {}x{} exceeds {MAX_SCREEN_DIMENSION} per side or {MAX_SCREEN_CELLS} cells",
                self.lines, self.cols
            )));
        }
        if !(1..=MAX_COLOR_PAIRS).contains(&self.color_pairs) {
            return Err(Error::InvalidArgument(format!(
                "color_pairs {} outside 1..={MAX_COLOR_PAIRS}",
                self.color_pairs
            )));
        }
        if self.colors < 0 {
            return Err(Error::InvalidArgument(format!("colors {} is negative", self.colors)));
        }
        if self.tab_size < 1 {
            return Err(Error::InvalidArgument(format!("tab_size {} must be positive", self.tab_size)));
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(term) = var("TERM").filter(|t| !t.is_empty()) {
            self.term_name = term;
        }
        if let Some(lines) = var("LINES").and_then(|v| v.trim().parse::<i32>().ok()).filter(|&n| n > 0) {
            self.lines = lines;
        }
        if let Some(cols) = var("COLUMNS").and_then(|v| v.trim().parse::<i32>().ok()).filter(|&n| n > 0) {
            self.cols = cols;
        }
    }
}

/// Query the window size of the terminal behind `fd`. `None` when `fd` is not
/// a terminal or reports a zero size.
pub fn probe_size(fd: RawFd) -> Option<(u16, u16)> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let ret = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws as *mut libc::winsize) };
    if ret != 0 || ws.ws_row == 0 || ws.ws_col == 0 {
        return None;
    }
    Some((ws.ws_row, ws.ws_col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::os::fd::AsRawFd;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!((config.lines, config.cols), (24, 80));
        assert_eq!(config.max_reserved_lines, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_round_trip() {
        let mut config = EngineConfig::default();
        config.lines = 40;
        config.term_name = "xterm".into();
        let text = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn json_missing_fields_use_defaults() {
        let config = EngineConfig::from_json(r#"{"cols": 132}"#).unwrap();
        assert_eq!(config.cols, 132);
        assert_eq!(config.lines, 24);
        assert_eq!(config.tab_size, 8);
    }

    #[test]
    fn json_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"lines": 0}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"color_pairs": 300}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"tab_size": 0}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(EngineConfig::from_json("not json"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn oversized_screens_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"lines": 70000, "cols": 70000}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"lines": 2147483647, "cols": 2}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"lines": 60000, "cols": 60000}"#),
            Err(Error::InvalidArgument(_))
        ));
        assert!(EngineConfig::from_json(r#"{"lines": 1000, "cols": 1000}"#).is_ok());

        let vars: HashMap<&str, &str> = [("LINES", "70000"), ("COLUMNS", "70000")].into_iter().collect();
        let mut config = EngineConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
        assert!(crate::headless::Headless::new(config).is_err());
    }

    #[test]
    fn env_overrides_size_and_term() {
        let vars: HashMap<&str, &str> = [("TERM", "vt100"), ("LINES", "30"), ("COLUMNS", "junk")]
            .into_iter()
            .collect();
        let mut config = EngineConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.term_name, "vt100");
        assert_eq!(config.lines, 30);
        assert_eq!(config.cols, 80);
    }

    #[test]
    fn probe_reads_pty_window_size() {
        let pty = rustix_openpty::openpty(None, None).expect("openpty");
        let ws = libc::winsize {
            ws_row: 33,
            ws_col: 101,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        unsafe {
            libc::ioctl(pty.user.as_raw_fd(), libc::TIOCSWINSZ, &ws as *const libc::winsize);
        }
        assert_eq!(probe_size(pty.user.as_raw_fd()), Some((33, 101)));
    }

    #[test]
    fn probe_rejects_non_terminal() {
        let file = std::fs::File::open("/dev/null").unwrap();
        assert_eq!(probe_size(file.as_raw_fd()), None);
    }
}
