pub mod config;
pub mod error;
pub mod input;
pub mod net;
pub mod session;
pub mod util;

// Convenient re-exports (so call sites can do `rawline::Session`, etc.)
pub use input::completion::{Completer, Completion, SymbolCompleter};
pub use input::history::{History, HistoryPolicy};
pub use input::keys::LogicalEvent;
pub use session::{ByteSink, FnSink, Session, StdoutSink, WriteSink};
