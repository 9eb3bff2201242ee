//! Telnet option handling for the console: strips IAC commands from the
//! client's byte stream so the line editor only ever sees keystrokes.

use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const IAC: u8 = 255; // Interpret As Command
const WILL: u8 = 251;
const WONT: u8 = 252;
const DO: u8 = 253;
const DONT: u8 = 254;
const SB: u8 = 250; // Subnegotiation begin
const SE: u8 = 240; // Subnegotiation end

const ECHO: u8 = 1;
const SGA: u8 = 3; // Suppress Go-Ahead
const NAWS: u8 = 31; // Negotiate About Window Size
const LINEMODE: u8 = 34; // Off: we want every keystroke as it is typed

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const NUL: u8 = 0;

/// Subnegotiation payloads longer than this are dropped. NAWS needs four bytes.
const MAX_SB_LEN: usize = 64;

#[derive(Debug, PartialEq, Eq)]
pub enum TelnetIn {
    /// A keystroke byte for the editor
    Data(u8),
    /// Client window size in characters
    Naws { cols: u16, rows: u16 },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TelnetResponse {
    pub event: Option<TelnetIn>,
    /// Negotiation bytes to send back to the client
    pub response: Option<Vec<u8>>,
}

impl TelnetResponse {
    fn data(b: u8) -> Self {
        Self {
            event: Some(TelnetIn::Data(b)),
            response: None,
        }
    }

    fn reply(bytes: Vec<u8>) -> Self {
        Self {
            event: None,
            response: Some(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    /// Saw IAC in the data stream
    Iac,
    /// Saw IAC followed by WILL/WONT/DO/DONT; the option byte comes next
    Option(u8),
    /// Saw IAC SB; the option byte comes next
    SbOption,
    /// Collecting subnegotiation payload
    Sb,
    /// Saw IAC inside a subnegotiation
    SbIac,
}

#[derive(Debug)]
pub struct TelnetMachine {
    state: State,
    sb_opt: u8,
    sb_buf: Vec<u8>,
    /// Payload ran past `MAX_SB_LEN`; discard it at IAC SE.
    sb_overflow: bool,
    /// Last data byte was CR; a following LF or NUL belongs to the same Enter.
    after_cr: bool,
}

impl Default for TelnetMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetMachine {
    pub fn new() -> Self {
        Self {
            state: State::Data,
            sb_opt: 0,
            sb_buf: Vec::with_capacity(16),
            sb_overflow: false,
            after_cr: false,
        }
    }

    /// Character-at-a-time, server-side echo, and ask for the window size.
    pub async fn start_negotiation<W: AsyncWrite + Unpin>(&mut self, w: &mut W) -> std::io::Result<()> {
        let mut out = Vec::with_capacity(15);
        for (cmd, opt) in [(DONT, LINEMODE), (DO, SGA), (WILL, SGA), (WILL, ECHO), (DO, NAWS)] {
            out.extend_from_slice(&[IAC, cmd, opt]);
        }
        w.write_all(&out).await?;
        w.flush().await
    }

    /// Feed one byte received from the client.
    pub fn push(&mut self, b: u8) -> TelnetResponse {
        match self.state {
            State::Data => {
                if b == IAC {
                    self.state = State::Iac;
                    return TelnetResponse::default();
                }
                self.data(b)
            }
            State::Iac => {
                self.state = State::Data;
                match b {
                    IAC => self.data(IAC),
                    WILL | WONT | DO | DONT => {
                        self.state = State::Option(b);
                        TelnetResponse::default()
                    }
                    SB => {
                        self.state = State::SbOption;
                        TelnetResponse::default()
                    }
                    // NOP, GA, break and friends carry nothing for us.
                    _ => TelnetResponse::default(),
                }
            }
            State::Option(cmd) => {
                self.state = State::Data;
                match answer(cmd, b) {
                    Some(bytes) => TelnetResponse::reply(bytes),
                    None => TelnetResponse::default(),
                }
            }
            State::SbOption => {
                self.sb_opt = b;
                self.sb_buf.clear();
                self.sb_overflow = false;
                self.state = State::Sb;
                TelnetResponse::default()
            }
            State::Sb => {
                if b == IAC {
                    self.state = State::SbIac;
                } else {
                    self.collect(b);
                }
                TelnetResponse::default()
            }
            State::SbIac => match b {
                SE => {
                    self.state = State::Data;
                    self.end_subnegotiation()
                }
                IAC => {
                    self.collect(IAC);
                    self.state = State::Sb;
                    TelnetResponse::default()
                }
                _ => {
                    // Broken subnegotiation; drop it.
                    self.state = State::Data;
                    self.sb_buf.clear();
                    TelnetResponse::default()
                }
            },
        }
    }

    fn collect(&mut self, b: u8) {
        if self.sb_overflow {
            return;
        }
        if self.sb_buf.len() >= MAX_SB_LEN {
            tracing::debug!(opt = self.sb_opt, "subnegotiation too long, dropping");
            self.sb_overflow = true;
            self.sb_buf.clear();
            return;
        }
        self.sb_buf.push(b);
    }

    /// CR LF, CR NUL and CR NUL LF are all one Enter.
    fn data(&mut self, b: u8) -> TelnetResponse {
        if self.after_cr {
            match b {
                NUL => return TelnetResponse::default(),
                LF => {
                    self.after_cr = false;
                    return TelnetResponse::default();
                }
                _ => {}
            }
        }
        self.after_cr = b == CR;
        TelnetResponse::data(b)
    }

    fn end_subnegotiation(&mut self) -> TelnetResponse {
        let data = std::mem::take(&mut self.sb_buf);
        if std::mem::take(&mut self.sb_overflow) {
            return TelnetResponse::default();
        }
        if self.sb_opt == NAWS && data.len() >= 4 {
            let cols = u16::from_be_bytes([data[0], data[1]]);
            let rows = u16::from_be_bytes([data[2], data[3]]);
            return TelnetResponse {
                event: Some(TelnetIn::Naws { cols, rows }),
                response: None,
            };
        }
        TelnetResponse::default()
    }
}

/// Our reply to a client's WILL/WONT/DO/DONT for `opt`.
fn answer(cmd: u8, opt: u8) -> Option<Vec<u8>> {
    let reply = match (cmd, opt) {
        (DO, ECHO | SGA) => WILL,
        (DO, NAWS) => return None,
        (DO, _) => WONT,
        (DONT, ECHO | SGA | LINEMODE) => WONT,
        (WILL, SGA | NAWS) => DO,
        (WILL, _) => DONT,
        _ => return None,
    };
    Some(vec![IAC, reply, opt])
}

/// Double every IAC so data bytes are not read as commands by the client.
pub fn escape_iac(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        out.push(b);
        if b == IAC {
            out.push(IAC);
        }
    }
    out
}
