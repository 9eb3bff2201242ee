pub mod sink;
pub mod telnet;

/// What the console sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutFrame {
    /// Bytes produced by the line editor
    Echo(Vec<u8>),
    /// Telnet option negotiation, written verbatim
    Negotiation(Vec<u8>),
    /// A line of console text, terminated with a newline
    Line(String),
    /// Prompt text, no newline
    Prompt(String),
}
