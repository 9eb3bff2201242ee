use crate::error::EditResult;
use crate::input::completion::Completer;
use crate::input::history::{History, HistoryPolicy};
use crate::input::keys::{Decoded, KeyInterpreter, LogicalEvent};
use crate::input::readline::LineEditor;
use std::io::Write;

/// Destination for the bytes the editor sends to the terminal.
///
/// Bytes must be delivered in the order they are submitted.
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Writes straight to the process's stdout. Expects a tty in raw mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ByteSink for StdoutSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(bytes)?;
        out.flush()
    }
}

/// Adapts any [`Write`], flushing after every write.
#[derive(Debug)]
pub struct WriteSink<W>(pub W);

impl<W: Write> ByteSink for WriteSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.0.write_all(bytes)?;
        self.0.flush()
    }
}

/// Adapts a closure.
pub struct FnSink<F>(pub F);

impl<F> ByteSink for FnSink<F>
where
    F: FnMut(&[u8]) -> std::io::Result<()>,
{
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        (self.0)(bytes)
    }
}

impl<F> std::fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnSink")
    }
}

pub type BoxedCompleter = Box<dyn Completer + Send>;

/// One line-editing session: key decoding, the edit buffer and its history,
/// and where the output goes.
///
/// A session is driven by a single reader. Independent connections each get
/// their own session.
pub struct Session<S: ByteSink = StdoutSink> {
    keys: KeyInterpreter,
    editor: LineEditor<S>,
    completer: Option<BoxedCompleter>,
}

impl Default for Session<StdoutSink> {
    fn default() -> Self {
        Self::new(StdoutSink)
    }
}

impl<S: ByteSink> Session<S> {
    pub fn new(sink: S) -> Self {
        Self::with_policy(sink, HistoryPolicy::default())
    }

    pub fn with_policy(sink: S, policy: HistoryPolicy) -> Self {
        Self {
            keys: KeyInterpreter::new(),
            editor: LineEditor::with_policy(sink, policy),
            completer: None,
        }
    }

    /// Set the output sink and completer. Calling it again with equal
    /// arguments leaves the session as it was.
    pub fn configure(&mut self, sink: S, completer: Option<BoxedCompleter>) {
        self.editor.replace_sink(sink);
        self.completer = completer;
    }

    pub fn set_completer(&mut self, completer: impl Completer + Send + 'static) {
        self.completer = Some(Box::new(completer));
    }

    pub fn set_history_policy(&mut self, policy: HistoryPolicy) {
        self.editor.set_history_policy(policy);
    }

    /// Prompt repainted when completion candidates push the line down.
    pub fn set_prompt(&mut self, prompt: impl Into<Vec<u8>>) {
        self.editor.set_prompt(prompt);
    }

    /// Feed one input byte. Returns the line when the user pressed Enter.
    pub fn interpret(&mut self, b: u8) -> EditResult<Option<String>> {
        let event = match self.keys.feed(b) {
            Decoded::Pending => return Ok(None),
            Decoded::Event(event) => event,
            Decoded::Unrecognized(seq) => {
                tracing::debug!(?seq, "ignoring unbound key sequence");
                return Ok(None);
            }
            Decoded::Malformed(seq) => {
                tracing::warn!(?seq, "bad escape sequence");
                return Ok(None);
            }
        };
        tracing::trace!(?event, "key");

        if event == LogicalEvent::Expand {
            let completion = self
                .completer
                .as_mut()
                .and_then(|c| c.complete(self.editor.buffer(), self.editor.cursor()));
            self.editor.apply_completion(completion)?;
            return Ok(None);
        }

        self.editor.apply(event)
    }

    /// Drop the current line and any partial escape sequence.
    pub fn reset(&mut self) {
        self.keys.reset();
        self.editor.reset();
    }

    pub fn history(&self) -> &History {
        self.editor.history()
    }

    pub fn buffer(&self) -> &[u8] {
        self.editor.buffer()
    }

    pub fn cursor(&self) -> usize {
        self.editor.cursor()
    }

    pub fn history_index(&self) -> Option<usize> {
        self.editor.history_index()
    }

    pub fn sink(&self) -> &S {
        self.editor.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.editor.sink_mut()
    }
}

impl<S: ByteSink + std::fmt::Debug> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("keys", &self.keys)
            .field("editor", &self.editor)
            .field("completer", &self.completer.is_some())
            .finish()
    }
}
