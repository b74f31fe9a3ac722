// ABOUTME: Turns raw terminal input into curses key codes and key codes into names.
// ABOUTME: Escape sequences are recognised by feeding them through a vte parser one byte at a time.

use vte::{Params, Parser, Perform};

use crate::cell::Cell;
use crate::constants::{self, *};

const ESC: u8 = 0x1b;

/// Longest escape sequence the decoder will wait for.
const MAX_SEQUENCE: usize = 16;

/// What the parser reported for the bytes fed so far.
#[derive(Default)]
struct Capture {
    csi: Option<(u16, char)>,
    ss3: bool,
    ss3_final: Option<char>,
    esc_final: Option<u8>,
    aborted: bool,
}

impl Perform for Capture {
    fn print(&mut self, c: char) {
        if self.ss3 {
            self.ss3_final = Some(c);
        } else {
            self.aborted = true;
        }
    }

    fn execute(&mut self, _byte: u8) {
        self.aborted = true;
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        if ignore || !intermediates.is_empty() {
            self.aborted = true;
            return;
        }
        let first = params
            .iter()
            .next()
            .and_then(|p| p.first().copied())
            .unwrap_or(0);
        self.csi = Some((first, action));
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if intermediates.is_empty() && byte == b'O' {
            self.ss3 = true;
        } else {
            self.esc_final = Some(byte);
        }
    }
}

/// Decode one key from the front of `bytes`.
///
/// Returns the key code and the number of bytes it used. A recognised escape
/// sequence yields its `KEY_*` code; anything else yields the first byte alone,
/// so an unknown sequence comes back as ESC followed by its plain bytes.
pub fn decode_key(bytes: &[u8]) -> Option<(i32, usize)> {
    let &first = bytes.first()?;
    if first != ESC {
        return Some((i32::from(first), 1));
    }

    let mut parser = Parser::new();
    let mut capture = Capture::default();
    parser.advance(&mut capture, &[ESC]);

    for (i, &byte) in bytes.iter().enumerate().skip(1).take(MAX_SEQUENCE) {
        if byte == ESC {
            break;
        }
        parser.advance(&mut capture, &[byte]);
        if capture.aborted || capture.esc_final.is_some() {
            break;
        }
        let key = match (capture.csi, capture.ss3_final) {
            (Some((param, action)), _) => csi_key(param, action),
            (None, Some(c)) => ss3_key(c),
            (None, None) => continue,
        };
        return Some(key.map_or((i32::from(ESC), 1), |k| (k, i + 1)));
    }

    Some((i32::from(ESC), 1))
}

fn csi_key(param: u16, action: char) -> Option<i32> {
    let key = match action {
        'A' => KEY_UP,
        'B' => KEY_DOWN,
        'C' => KEY_RIGHT,
        'D' => KEY_LEFT,
        'H' => KEY_HOME,
        'F' => KEY_END,
        'Z' => KEY_BTAB,
        '~' => match param {
            1 | 7 => KEY_HOME,
            2 => KEY_IC,
            3 => KEY_DC,
            4 | 8 => KEY_END,
            5 => KEY_PPAGE,
            6 => KEY_NPAGE,
            11..=15 => key_f(i32::from(param) - 10),
            17..=21 => key_f(i32::from(param) - 11),
            23 | 24 => key_f(i32::from(param) - 12),
            _ => return None,
        },
        _ => return None,
    };
    Some(key)
}

fn ss3_key(c: char) -> Option<i32> {
    let key = match c {
        'A' => KEY_UP,
        'B' => KEY_DOWN,
        'C' => KEY_RIGHT,
        'D' => KEY_LEFT,
        'H' => KEY_HOME,
        'F' => KEY_END,
        'M' => KEY_ENTER,
        'P' => KEY_F1,
        'Q' => KEY_F2,
        'R' => KEY_F3,
        'S' => KEY_F4,
        _ => return None,
    };
    Some(key)
}

/// Printable form of a byte: `^X` for controls, `M-` prefix for the upper half.
pub fn unctrl(cell: Cell) -> String {
    let mut out = String::new();
    push_unctrl(&mut out, cell.glyph());
    out
}

fn push_unctrl(out: &mut String, byte: u8) {
    match byte {
        0..=0x1f => {
            out.push('^');
            out.push((byte + 0x40) as char);
        }
        0x7f => out.push_str("^?"),
        0x80..=0xff => {
            out.push_str("M-");
            push_unctrl(out, byte - 0x80);
        }
        _ => out.push(byte as char),
    }
}

/// Name of a key code as curses prints it: `KEY_UP`, `KEY_F(5)`, `^A`, `M-x`.
pub fn keyname(key: i32) -> Option<String> {
    if let Ok(byte) = u8::try_from(key) {
        return Some(unctrl(Cell::from(byte)));
    }
    if (KEY_F0..=key_f(63)).contains(&key) {
        return Some(format!("KEY_F({})", key - KEY_F0));
    }
    constants::catalog()
        .iter()
        .find(|&&(name, value)| name.starts_with("KEY_") && value == i64::from(key))
        .map(|&(name, _)| name.to_string())
}
