//! Byte-at-a-time classification of keyboard input.
//!
//! Two escape conventions are understood: ANSI/VT sequences introduced by ESC,
//! and the Windows console's extended keys introduced by byte 224. Every call
//! to [`KeyInterpreter::feed`] consumes exactly one byte and never waits for
//! more, so a truncated or garbled sequence costs at most the bytes already
//! seen.

pub const BS: u8 = 8; // Backspace
pub const HT: u8 = 9; // Tab, requests expansion
pub const LF: u8 = 10;
pub const CR: u8 = 13;
pub const ESC: u8 = 27;
pub const DEL: u8 = 127;

const CSI: u8 = b'['; // ESC [ opens a control sequence
const SS2: u8 = b'N'; // single shift to G2
const SS3: u8 = b'O'; // single shift to G3
const CSI_UP: u8 = b'A';
const CSI_DOWN: u8 = b'B';
const CSI_RIGHT: u8 = b'C';
const CSI_LEFT: u8 = b'D';
const CSI_TILDE: u8 = b'~';

// Windows console extended keys. Observed, not documented.
pub const WIN_EXT: u8 = 224;
const WIN_UP: u8 = 72;
const WIN_LEFT: u8 = 75;
const WIN_RIGHT: u8 = 77;
const WIN_DOWN: u8 = 80;
const WIN_DEL: u8 = 83;

/// Longest parameter run accepted inside a control sequence.
pub const MAX_CSI_PARAMS: usize = 16;

/// An editing operation requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalEvent {
    Insert(u8),
    DeleteLeft,
    DeleteRight,
    CursorLeft,
    CursorRight,
    HistoryPrev,
    HistoryNext,
    Commit,
    Expand,
}

/// Which single-shift introducer was seen after ESC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    G2,
    G3,
}

impl Charset {
    fn intro(self) -> u8 {
        match self {
            Charset::G2 => SS2,
            Charset::G3 => SS3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EscState {
    #[default]
    Idle,
    SawEscape,
    InCsi(Vec<u8>),
    SawAlternateCharset(Charset),
    SawWindowsExtended,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Byte consumed as part of an unfinished sequence.
    Pending,
    Event(LogicalEvent),
    /// A complete, well-formed sequence with no bound operation.
    Unrecognized(Vec<u8>),
    /// The byte cannot continue the current sequence; the sequence is dropped.
    Malformed(Vec<u8>),
}

#[derive(Debug, Default)]
pub struct KeyInterpreter {
    state: EscState,
}

impl KeyInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EscState {
        &self.state
    }

    /// Drop any partially received sequence.
    pub fn reset(&mut self) {
        self.state = EscState::Idle;
    }

    pub fn feed(&mut self, b: u8) -> Decoded {
        match std::mem::take(&mut self.state) {
            EscState::Idle => self.idle(b),
            EscState::SawEscape => self.after_escape(b),
            EscState::InCsi(params) => self.in_csi(params, b),
            EscState::SawAlternateCharset(cs) => {
                // Single-shift sequences carry no editing meaning for us.
                Decoded::Unrecognized(vec![ESC, cs.intro(), b])
            }
            EscState::SawWindowsExtended => match b {
                WIN_UP => Decoded::Event(LogicalEvent::HistoryPrev),
                WIN_DOWN => Decoded::Event(LogicalEvent::HistoryNext),
                WIN_LEFT => Decoded::Event(LogicalEvent::CursorLeft),
                WIN_RIGHT => Decoded::Event(LogicalEvent::CursorRight),
                WIN_DEL => Decoded::Event(LogicalEvent::DeleteRight),
                _ => Decoded::Unrecognized(vec![WIN_EXT, b]),
            },
        }
    }

    fn idle(&mut self, b: u8) -> Decoded {
        let event = match b {
            CR | LF => LogicalEvent::Commit,
            DEL | BS => LogicalEvent::DeleteLeft,
            HT => LogicalEvent::Expand,
            ESC => {
                self.state = EscState::SawEscape;
                return Decoded::Pending;
            }
            WIN_EXT => {
                self.state = EscState::SawWindowsExtended;
                return Decoded::Pending;
            }
            other => LogicalEvent::Insert(other),
        };
        Decoded::Event(event)
    }

    fn after_escape(&mut self, b: u8) -> Decoded {
        match b {
            CSI => {
                self.state = EscState::InCsi(Vec::new());
                Decoded::Pending
            }
            SS2 => {
                self.state = EscState::SawAlternateCharset(Charset::G2);
                Decoded::Pending
            }
            SS3 => {
                self.state = EscState::SawAlternateCharset(Charset::G3);
                Decoded::Pending
            }
            64..=95 => Decoded::Unrecognized(vec![ESC, b]),
            _ => Decoded::Malformed(vec![ESC, b]),
        }
    }

    fn in_csi(&mut self, mut params: Vec<u8>, b: u8) -> Decoded {
        match b {
            48..=63 => {
                if params.len() >= MAX_CSI_PARAMS {
                    return Decoded::Malformed(csi_bytes(&params, b));
                }
                params.push(b);
                self.state = EscState::InCsi(params);
                Decoded::Pending
            }
            64..=126 => match b {
                CSI_UP => Decoded::Event(LogicalEvent::HistoryPrev),
                CSI_DOWN => Decoded::Event(LogicalEvent::HistoryNext),
                CSI_RIGHT => Decoded::Event(LogicalEvent::CursorRight),
                CSI_LEFT => Decoded::Event(LogicalEvent::CursorLeft),
                CSI_TILDE if params == b"3" => Decoded::Event(LogicalEvent::DeleteRight),
                _ => Decoded::Unrecognized(csi_bytes(&params, b)),
            },
            _ => Decoded::Malformed(csi_bytes(&params, b)),
        }
    }
}

fn csi_bytes(params: &[u8], last: u8) -> Vec<u8> {
    let mut seq = Vec::with_capacity(params.len() + 3);
    seq.extend_from_slice(&[ESC, CSI]);
    seq.extend_from_slice(params);
    seq.push(last);
    seq
}
