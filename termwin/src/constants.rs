// ABOUTME: Named integer constants exported to hosts: colors, attributes, line-drawing glyphs, keys.
// ABOUTME: Values follow the curses numbering so host scripts can reuse existing tables.

pub use crate::cell::{A_ATTRIBUTES, A_CHARTEXT, A_COLOR, A_NORMAL};

use crate::cell::{Attributes, Cell};

const fn acs(c: u8) -> u32 {
    Cell::new(c, Attributes::ALTCHARSET, 0).bits()
}

/// Function key `n` (0..=63).
pub const fn key_f(n: i32) -> i32 {
    KEY_F0 + n
}

macro_rules! catalog {
    (
        reexport { $($re:ident),* $(,)? }
        $($name:ident : $ty:ty = $value:expr;)*
    ) => {
        $(pub const $name: $ty = $value;)*

        /// Every exported constant with its name, in declaration order.
        pub fn catalog() -> &'static [(&'static str, i64)] {
            const TABLE: &[(&str, i64)] = &[
                $((stringify!($re), $re as i64),)*
                $((stringify!($name), $name as i64),)*
            ];
            TABLE
        }
    };
}

catalog! {
    reexport { A_NORMAL, A_CHARTEXT, A_ATTRIBUTES }

    COLOR_BLACK: i16 = 0;
    COLOR_RED: i16 = 1;
    COLOR_GREEN: i16 = 2;
    COLOR_YELLOW: i16 = 3;
    COLOR_BLUE: i16 = 4;
    COLOR_MAGENTA: i16 = 5;
    COLOR_CYAN: i16 = 6;
    COLOR_WHITE: i16 = 7;

    ACS_BLOCK: u32 = acs(b'0');
    ACS_BOARD: u32 = acs(b'h');
    ACS_BTEE: u32 = acs(b'v');
    ACS_TTEE: u32 = acs(b'w');
    ACS_LTEE: u32 = acs(b't');
    ACS_RTEE: u32 = acs(b'u');
    ACS_LLCORNER: u32 = acs(b'm');
    ACS_LRCORNER: u32 = acs(b'j');
    ACS_URCORNER: u32 = acs(b'k');
    ACS_ULCORNER: u32 = acs(b'l');
    ACS_LARROW: u32 = acs(b',');
    ACS_RARROW: u32 = acs(b'+');
    ACS_UARROW: u32 = acs(b'-');
    ACS_DARROW: u32 = acs(b'.');
    ACS_HLINE: u32 = acs(b'q');
    ACS_VLINE: u32 = acs(b'x');
    ACS_BULLET: u32 = acs(b'~');
    ACS_CKBOARD: u32 = acs(b'a');
    ACS_LANTERN: u32 = acs(b'i');
    ACS_DEGREE: u32 = acs(b'f');
    ACS_DIAMOND: u32 = acs(b'`');
    ACS_PLMINUS: u32 = acs(b'g');
    ACS_PLUS: u32 = acs(b'n');
    ACS_S1: u32 = acs(b'o');
    ACS_S9: u32 = acs(b's');

    A_STANDOUT: u32 = Attributes::STANDOUT.bits();
    A_UNDERLINE: u32 = Attributes::UNDERLINE.bits();
    A_REVERSE: u32 = Attributes::REVERSE.bits();
    A_BLINK: u32 = Attributes::BLINK.bits();
    A_DIM: u32 = Attributes::DIM.bits();
    A_BOLD: u32 = Attributes::BOLD.bits();
    A_PROTECT: u32 = Attributes::PROTECT.bits();
    A_INVIS: u32 = Attributes::INVIS.bits();
    A_ALTCHARSET: u32 = Attributes::ALTCHARSET.bits();

    KEY_BREAK: i32 = 0o401;
    KEY_DOWN: i32 = 0o402;
    KEY_UP: i32 = 0o403;
    KEY_LEFT: i32 = 0o404;
    KEY_RIGHT: i32 = 0o405;
    KEY_HOME: i32 = 0o406;
    KEY_BACKSPACE: i32 = 0o407;
    KEY_F0: i32 = 0o410;
    KEY_F1: i32 = KEY_F0 + 1;
    KEY_F2: i32 = KEY_F0 + 2;
    KEY_F3: i32 = KEY_F0 + 3;
    KEY_F4: i32 = KEY_F0 + 4;
    KEY_F5: i32 = KEY_F0 + 5;
    KEY_F6: i32 = KEY_F0 + 6;
    KEY_F7: i32 = KEY_F0 + 7;
    KEY_F8: i32 = KEY_F0 + 8;
    KEY_F9: i32 = KEY_F0 + 9;
    KEY_F10: i32 = KEY_F0 + 10;
    KEY_F11: i32 = KEY_F0 + 11;
    KEY_F12: i32 = KEY_F0 + 12;
    KEY_DL: i32 = 0o510;
    KEY_IL: i32 = 0o511;
    KEY_DC: i32 = 0o512;
    KEY_IC: i32 = 0o513;
    KEY_EIC: i32 = 0o514;
    KEY_CLEAR: i32 = 0o515;
    KEY_EOS: i32 = 0o516;
    KEY_EOL: i32 = 0o517;
    KEY_SF: i32 = 0o520;
    KEY_SR: i32 = 0o521;
    KEY_NPAGE: i32 = 0o522;
    KEY_PPAGE: i32 = 0o523;
    KEY_STAB: i32 = 0o524;
    KEY_CTAB: i32 = 0o525;
    KEY_CATAB: i32 = 0o526;
    KEY_ENTER: i32 = 0o527;
    KEY_SRESET: i32 = 0o530;
    KEY_RESET: i32 = 0o531;
    KEY_PRINT: i32 = 0o532;
    KEY_LL: i32 = 0o533;
    KEY_A1: i32 = 0o534;
    KEY_A3: i32 = 0o535;
    KEY_B2: i32 = 0o536;
    KEY_C1: i32 = 0o537;
    KEY_C3: i32 = 0o540;
    KEY_BTAB: i32 = 0o541;
    KEY_BEG: i32 = 0o542;
    KEY_CANCEL: i32 = 0o543;
    KEY_CLOSE: i32 = 0o544;
    KEY_COMMAND: i32 = 0o545;
    KEY_COPY: i32 = 0o546;
    KEY_CREATE: i32 = 0o547;
    KEY_END: i32 = 0o550;
    KEY_EXIT: i32 = 0o551;
    KEY_FIND: i32 = 0o552;
    KEY_HELP: i32 = 0o553;
    KEY_MARK: i32 = 0o554;
    KEY_MESSAGE: i32 = 0o555;
    KEY_MOVE: i32 = 0o556;
    KEY_NEXT: i32 = 0o557;
    KEY_OPEN: i32 = 0o560;
    KEY_OPTIONS: i32 = 0o561;
    KEY_PREVIOUS: i32 = 0o562;
    KEY_REDO: i32 = 0o563;
    KEY_REFERENCE: i32 = 0o564;
    KEY_REFRESH: i32 = 0o565;
    KEY_REPLACE: i32 = 0o566;
    KEY_RESTART: i32 = 0o567;
    KEY_RESUME: i32 = 0o570;
    KEY_SAVE: i32 = 0o571;
    KEY_SBEG: i32 = 0o572;
    KEY_SCANCEL: i32 = 0o573;
    KEY_SCOMMAND: i32 = 0o574;
    KEY_SCOPY: i32 = 0o575;
    KEY_SCREATE: i32 = 0o576;
    KEY_SDC: i32 = 0o577;
    KEY_SDL: i32 = 0o600;
    KEY_SELECT: i32 = 0o601;
    KEY_SEND: i32 = 0o602;
    KEY_SEOL: i32 = 0o603;
    KEY_SEXIT: i32 = 0o604;
    KEY_SFIND: i32 = 0o605;
    KEY_SHELP: i32 = 0o606;
    KEY_SHOME: i32 = 0o607;
    KEY_SIC: i32 = 0o610;
    KEY_SLEFT: i32 = 0o611;
    KEY_SMESSAGE: i32 = 0o612;
    KEY_SMOVE: i32 = 0o613;
    KEY_SNEXT: i32 = 0o614;
    KEY_SOPTIONS: i32 = 0o615;
    KEY_SPREVIOUS: i32 = 0o616;
    KEY_SPRINT: i32 = 0o617;
    KEY_SREDO: i32 = 0o620;
    KEY_SREPLACE: i32 = 0o621;
    KEY_SRIGHT: i32 = 0o622;
    KEY_SRSUME: i32 = 0o623;
    KEY_SSAVE: i32 = 0o624;
    KEY_SSUSPEND: i32 = 0o625;
    KEY_SUNDO: i32 = 0o626;
    KEY_SUSPEND: i32 = 0o627;
    KEY_UNDO: i32 = 0o630;
    KEY_MOUSE: i32 = 0o631;
    KEY_RESIZE: i32 = 0o632;
}

/// Look up a constant by its exported name.
pub fn lookup(name: &str) -> Option<i64> {
    catalog()
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, v)| v)
}
