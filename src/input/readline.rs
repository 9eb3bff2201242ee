//! The edit buffer and the committed history behind it.
//!
//! At any moment the editor is on a fresh line (`hist_ix == None`), or on a
//! copy of a history entry which may have been edited since it was loaded.
//! Navigating away from an edited copy discards the edits.
//!
//! Every operation writes its screen update to the sink before returning, and
//! the cursor column on screen is assumed to be `cursor`. Nothing reads it back.

use crate::error::{EditError, EditResult};
use crate::input::completion::Completion;
use crate::input::history::{History, HistoryPolicy};
use crate::input::keys::LogicalEvent;
use crate::input::render::{self, BEEP, LineDiff, NEWLINE};
use crate::session::ByteSink;

#[derive(Debug)]
pub struct LineEditor<S> {
    sink: S,
    history: History,
    /// `None` until the first byte is typed or a history entry is loaded.
    buf: Option<Vec<u8>>,
    cursor: usize,
    /// History entry selected by up/down navigation (`None` = fresh line)
    hist_ix: Option<usize>,
    prompt: Vec<u8>,
}

impl<S: ByteSink> LineEditor<S> {
    pub fn new(sink: S) -> Self {
        Self::with_policy(sink, HistoryPolicy::default())
    }

    pub fn with_policy(sink: S, policy: HistoryPolicy) -> Self {
        Self {
            sink,
            history: History::new(policy),
            buf: None,
            cursor: 0,
            hist_ix: None,
            prompt: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Swap the output sink, returning the previous one.
    pub fn replace_sink(&mut self, sink: S) -> S {
        std::mem::replace(&mut self.sink, sink)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Change the history policy. Entries trimmed by a new cap are gone, so a
    /// browsed entry keeps its place if it survived and becomes a fresh line if not.
    pub fn set_history_policy(&mut self, policy: HistoryPolicy) {
        let before = self.history.len();
        self.history.set_policy(policy);
        let dropped = before - self.history.len();
        self.hist_ix = self.hist_ix.and_then(|ix| ix.checked_sub(dropped));
    }

    pub fn prompt(&self) -> &[u8] {
        &self.prompt
    }

    /// Text repainted in front of the line after a completion listing.
    pub fn set_prompt(&mut self, prompt: impl Into<Vec<u8>>) {
        self.prompt = prompt.into();
    }

    pub fn buffer(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history_index(&self) -> Option<usize> {
        self.hist_ix
    }

    /// Run one logical event. `Expand` is not handled here; see [`Self::apply_completion`].
    pub fn apply(&mut self, event: LogicalEvent) -> EditResult<Option<String>> {
        self.check()?;
        match event {
            LogicalEvent::Insert(b) => self.insert(b)?,
            LogicalEvent::DeleteLeft => self.delete_left()?,
            LogicalEvent::DeleteRight => self.delete_right()?,
            LogicalEvent::CursorLeft => self.cursor_left()?,
            LogicalEvent::CursorRight => self.cursor_right()?,
            LogicalEvent::HistoryPrev => self.history_prev()?,
            LogicalEvent::HistoryNext => self.history_next()?,
            LogicalEvent::Commit => return self.commit().map(Some),
            LogicalEvent::Expand => self.beep()?,
        }
        Ok(None)
    }

    fn check(&self) -> EditResult<()> {
        if self.cursor > self.buffer().len() {
            return Err(EditError::Invariant("cursor beyond end of buffer"));
        }
        if let Some(ix) = self.hist_ix
            && ix >= self.history.len()
        {
            return Err(EditError::Invariant("history index out of range"));
        }
        Ok(())
    }

    pub fn insert(&mut self, b: u8) -> EditResult<()> {
        let cursor = self.cursor;
        let buf = self.buf.get_or_insert_with(Vec::new);
        let old_end = buf.len();
        buf.insert(cursor, b);
        self.cursor += 1;

        let out = render::redraw(&LineDiff {
            from: cursor,
            start: cursor,
            old_end,
            tail: &buf[cursor..],
            to: self.cursor,
        });
        self.write(&out)
    }

    pub fn delete_left(&mut self) -> EditResult<()> {
        let Some(buf) = self.buf.as_mut().filter(|_| self.cursor > 0) else {
            return self.beep();
        };
        let old_end = buf.len();
        let from = self.cursor;
        self.cursor -= 1;
        buf.remove(self.cursor);

        let out = render::redraw(&LineDiff {
            from,
            start: self.cursor,
            old_end,
            tail: &buf[self.cursor..],
            to: self.cursor,
        });
        self.write(&out)
    }

    pub fn delete_right(&mut self) -> EditResult<()> {
        let cursor = self.cursor;
        let Some(buf) = self.buf.as_mut().filter(|b| cursor < b.len()) else {
            return self.beep();
        };
        let old_end = buf.len();
        buf.remove(cursor);

        let out = render::redraw(&LineDiff {
            from: cursor,
            start: cursor,
            old_end,
            tail: &buf[cursor..],
            to: cursor,
        });
        self.write(&out)
    }

    pub fn cursor_left(&mut self) -> EditResult<()> {
        if self.cursor == 0 {
            return self.beep();
        }
        self.cursor -= 1;
        self.write(&render::cursor_move(self.cursor + 1, self.cursor))
    }

    pub fn cursor_right(&mut self) -> EditResult<()> {
        if self.cursor >= self.buffer().len() {
            return self.beep();
        }
        self.cursor += 1;
        self.write(&render::cursor_move(self.cursor - 1, self.cursor))
    }

    pub fn history_prev(&mut self) -> EditResult<()> {
        let target = match self.hist_ix {
            None => self.history.last_index(),
            Some(ix) => Some(ix.saturating_sub(1)),
        };
        if target == self.hist_ix {
            return self.beep();
        }
        self.load(target)
    }

    pub fn history_next(&mut self) -> EditResult<()> {
        let target = self
            .hist_ix
            .map(|ix| ix + 1)
            .filter(|&ix| ix < self.history.len());
        if target == self.hist_ix {
            return self.beep();
        }
        self.load(target)
    }

    /// Replace the buffer with a copy of a history entry (or a fresh line for `None`).
    fn load(&mut self, target: Option<usize>) -> EditResult<()> {
        let line = match target {
            Some(ix) => {
                let entry = self
                    .history
                    .get(ix)
                    .ok_or(EditError::Invariant("history index out of range"))?;
                Some(entry.as_bytes().to_vec())
            }
            None => None,
        };
        self.hist_ix = target;
        self.replace_line(line, None)
    }

    /// Swap the whole buffer and repaint it. The cursor goes to `cursor`, or the end.
    fn replace_line(&mut self, line: Option<Vec<u8>>, cursor: Option<usize>) -> EditResult<()> {
        let from = self.cursor;
        let old_len = self.buffer().len();
        self.buf = line;

        let new_len = self.buffer().len();
        self.cursor = cursor.map_or(new_len, |c| c.min(new_len));

        let out = render::redraw(&LineDiff::full(from, old_len, self.buffer(), self.cursor));
        self.write(&out)
    }

    /// Finish the line: record it in history and move to a fresh line.
    pub fn commit(&mut self) -> EditResult<String> {
        let line = self
            .buf
            .take()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        self.cursor = 0;
        self.hist_ix = None;
        self.history.push(line.clone());
        self.write(NEWLINE)?;
        Ok(line)
    }

    /// Apply what a completer returned for the current line.
    pub fn apply_completion(&mut self, completion: Option<Completion>) -> EditResult<()> {
        let Some(Completion {
            line,
            cursor,
            candidates,
        }) = completion
        else {
            return self.beep();
        };

        if candidates.len() > 1 {
            let mut out = Vec::new();
            out.extend_from_slice(NEWLINE);
            out.extend_from_slice(candidates.join("  ").as_bytes());
            out.extend_from_slice(NEWLINE);
            out.extend_from_slice(&self.prompt);
            self.write(&out)?;

            // The line is repainted right after the prompt on a fresh screen line.
            self.buf = Some(line);
            self.cursor = cursor.min(self.buffer().len());
            let out = render::redraw(&LineDiff::full(0, 0, self.buffer(), self.cursor));
            return self.write(&out);
        }

        if line.as_slice() == self.buffer() && cursor == self.cursor {
            return self.beep();
        }
        self.replace_line(Some(line), Some(cursor))
    }

    /// Forget the current line without committing it.
    pub fn reset(&mut self) {
        self.buf = None;
        self.cursor = 0;
        self.hist_ix = None;
    }

    fn beep(&mut self) -> EditResult<()> {
        self.write(BEEP)
    }

    fn write(&mut self, bytes: &[u8]) -> EditResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.sink.write_bytes(bytes).map_err(EditError::Sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> LineEditor<Vec<u8>> {
        LineEditor::new(Vec::new())
    }

    fn typed(text: &[u8]) -> LineEditor<Vec<u8>> {
        let mut ed = editor();
        for &b in text {
            ed.insert(b).unwrap();
        }
        ed.sink_mut().clear();
        ed
    }

    fn output(ed: &mut LineEditor<Vec<u8>>) -> Vec<u8> {
        std::mem::take(ed.sink_mut())
    }

    #[test]
    fn typing_echoes_each_byte() {
        let mut ed = editor();
        ed.insert(b'h').unwrap();
        ed.insert(b'i').unwrap();
        assert_eq!(ed.buffer(), b"hi");
        assert_eq!(ed.cursor(), 2);
        assert_eq!(output(&mut ed), b"hi");
    }

    #[test]
    fn insert_after_moving_left() {
        let mut ed = typed(b"ac");
        ed.cursor_left().unwrap();
        ed.insert(b'b').unwrap();
        assert_eq!(ed.buffer(), b"abc");
        assert_eq!(ed.cursor(), 2);
        assert_eq!(output(&mut ed), b"\x08bc\x08");
    }

    #[test]
    fn delete_left_at_end() {
        let mut ed = typed(b"abc");
        ed.delete_left().unwrap();
        assert_eq!(ed.buffer(), b"ab");
        assert_eq!(ed.cursor(), 2);
        assert_eq!(output(&mut ed), b"\x08\x1b[K");
    }

    #[test]
    fn delete_left_at_start_beeps() {
        let mut ed = editor();
        ed.delete_left().unwrap();
        assert_eq!(ed.buffer(), b"");
        assert_eq!(output(&mut ed), BEEP);

        let mut ed = typed(b"xy");
        ed.cursor_left().unwrap();
        ed.cursor_left().unwrap();
        ed.sink_mut().clear();
        ed.delete_left().unwrap();
        assert_eq!(ed.buffer(), b"xy");
        assert_eq!(ed.cursor(), 0);
        assert_eq!(output(&mut ed), BEEP);
    }

    #[test]
    fn delete_right_in_middle() {
        let mut ed = typed(b"abc");
        ed.cursor_left().unwrap();
        ed.cursor_left().unwrap();
        ed.sink_mut().clear();
        ed.delete_right().unwrap();
        assert_eq!(ed.buffer(), b"ac");
        assert_eq!(ed.cursor(), 1);
        assert_eq!(output(&mut ed), b"\x1b[Kc\x08");
    }

    #[test]
    fn delete_right_at_end_beeps() {
        let mut ed = typed(b"abc");
        ed.delete_right().unwrap();
        assert_eq!(ed.buffer(), b"abc");
        assert_eq!(output(&mut ed), BEEP);
    }

    #[test]
    fn cursor_bounds() {
        let mut ed = typed(b"a");
        ed.cursor_right().unwrap();
        assert_eq!(output(&mut ed), BEEP);
        ed.cursor_left().unwrap();
        assert_eq!(output(&mut ed), b"\x08");
        ed.cursor_left().unwrap();
        assert_eq!(output(&mut ed), BEEP);
        ed.cursor_right().unwrap();
        assert_eq!(output(&mut ed), b"\x1b[C");
        assert_eq!(ed.cursor(), 1);
    }

    #[test]
    fn commit_records_history_and_resets() {
        let mut ed = typed(b"hi");
        assert_eq!(ed.commit().unwrap(), "hi");
        assert_eq!(output(&mut ed), NEWLINE);
        assert_eq!(ed.buffer(), b"");
        assert_eq!(ed.cursor(), 0);
        assert_eq!(ed.history().iter().collect::<Vec<_>>(), vec!["hi"]);

        // A commit on an untouched line yields an empty string, kept by default.
        assert_eq!(ed.commit().unwrap(), "");
        assert_eq!(ed.history().len(), 2);
    }

    #[test]
    fn history_prev_walks_to_oldest_then_beeps() {
        let mut ed = editor();
        for l in [&b"one"[..], b"two", b"three"] {
            for &b in l {
                ed.insert(b).unwrap();
            }
            ed.commit().unwrap();
        }
        ed.sink_mut().clear();

        ed.history_prev().unwrap();
        assert_eq!(ed.buffer(), b"three");
        assert_eq!(ed.history_index(), Some(2));
        ed.history_prev().unwrap();
        ed.history_prev().unwrap();
        assert_eq!(ed.buffer(), b"one");
        assert_eq!(ed.cursor(), 3);
        ed.sink_mut().clear();

        ed.history_prev().unwrap();
        assert_eq!(ed.buffer(), b"one");
        assert_eq!(ed.history_index(), Some(0));
        assert_eq!(output(&mut ed), BEEP);
    }

    #[test]
    fn history_prev_on_empty_history_beeps() {
        let mut ed = typed(b"x");
        ed.history_prev().unwrap();
        assert_eq!(ed.buffer(), b"x");
        assert_eq!(output(&mut ed), BEEP);
    }

    #[test]
    fn history_next_returns_to_fresh_line_once() {
        let mut ed = typed(b"abc");
        ed.commit().unwrap();
        ed.history_prev().unwrap();
        ed.sink_mut().clear();

        ed.history_next().unwrap();
        assert_eq!(ed.buffer(), b"");
        assert_eq!(ed.history_index(), None);
        assert_eq!(output(&mut ed), b"\x1b[3D\x1b[K");

        ed.history_next().unwrap();
        assert_eq!(output(&mut ed), BEEP);
    }

    #[test]
    fn history_load_redraws_full_line() {
        let mut ed = typed(b"abc");
        ed.commit().unwrap();
        ed.sink_mut().clear();
        ed.history_prev().unwrap();
        assert_eq!(ed.buffer(), b"abc");
        assert_eq!(ed.cursor(), 3);
        assert_eq!(output(&mut ed), b"abc");
    }

    #[test]
    fn navigating_discards_edits_to_browsed_entry() {
        let mut ed = typed(b"first");
        ed.commit().unwrap();
        for &b in b"second" {
            ed.insert(b).unwrap();
        }
        ed.commit().unwrap();

        ed.history_prev().unwrap();
        ed.insert(b'!').unwrap();
        assert_eq!(ed.buffer(), b"second!");
        ed.history_prev().unwrap();
        ed.history_next().unwrap();
        assert_eq!(ed.buffer(), b"second");
        assert_eq!(ed.history().get(1), Some("second"));
    }

    #[test]
    fn completion_replaces_line() {
        let mut ed = typed(b"pr");
        ed.apply_completion(Some(Completion {
            line: b"print".to_vec(),
            cursor: 5,
            candidates: Vec::new(),
        }))
        .unwrap();
        assert_eq!(ed.buffer(), b"print");
        assert_eq!(ed.cursor(), 5);
        assert_eq!(output(&mut ed), b"\x1b[2Dprint");
    }

    #[test]
    fn completion_lists_candidates() {
        let mut ed = typed(b"p");
        ed.apply_completion(Some(Completion {
            line: b"p".to_vec(),
            cursor: 1,
            candidates: vec!["print".into(), "pop".into()],
        }))
        .unwrap();
        assert_eq!(output(&mut ed), b"\r\nprint  pop\r\np");
        assert_eq!(ed.cursor(), 1);
    }

    #[test]
    fn completion_listing_repaints_prompt() {
        let mut ed = typed(b"p");
        ed.set_prompt("> ");
        ed.apply_completion(Some(Completion {
            line: b"p".to_vec(),
            cursor: 1,
            candidates: vec!["print".into(), "pop".into()],
        }))
        .unwrap();
        assert_eq!(output(&mut ed), b"\r\nprint  pop\r\n> p");
    }

    #[test]
    fn shrinking_history_while_browsing_keeps_surviving_entry() {
        let mut ed = editor();
        for l in [&b"one"[..], b"two", b"three"] {
            for &b in l {
                ed.insert(b).unwrap();
            }
            ed.commit().unwrap();
        }
        ed.history_prev().unwrap();
        assert_eq!(ed.history_index(), Some(2));

        ed.set_history_policy(HistoryPolicy {
            max_entries: Some(1),
            ..Default::default()
        });
        assert_eq!(ed.history_index(), Some(0));
        assert_eq!(ed.history().get(0), Some("three"));

        ed.apply(LogicalEvent::Insert(b'!')).unwrap();
        assert_eq!(ed.apply(LogicalEvent::Commit).unwrap(), Some("three!".to_string()));
    }

    #[test]
    fn trimming_the_browsed_entry_leaves_a_fresh_line() {
        let mut ed = editor();
        for l in [&b"one"[..], b"two", b"three"] {
            for &b in l {
                ed.insert(b).unwrap();
            }
            ed.commit().unwrap();
        }
        ed.history_prev().unwrap();
        ed.history_prev().unwrap();
        ed.history_prev().unwrap();
        assert_eq!(ed.history_index(), Some(0));

        ed.set_history_policy(HistoryPolicy {
            max_entries: Some(1),
            ..Default::default()
        });
        assert_eq!(ed.history_index(), None);
        assert_eq!(ed.buffer(), b"one");
        assert_eq!(ed.apply(LogicalEvent::Commit).unwrap(), Some("one".to_string()));

        ed.history_prev().unwrap();
        assert_eq!(ed.buffer(), b"one");
        assert_eq!(ed.history_index(), Some(0));
    }

    #[test]
    fn unchanged_or_missing_completion_beeps() {
        let mut ed = typed(b"p");
        ed.apply_completion(None).unwrap();
        assert_eq!(output(&mut ed), BEEP);
        ed.apply_completion(Some(Completion {
            line: b"p".to_vec(),
            cursor: 1,
            candidates: Vec::new(),
        }))
        .unwrap();
        assert_eq!(output(&mut ed), BEEP);
    }

    #[test]
    fn sink_failure_propagates() {
        struct Broken;
        impl ByteSink for Broken {
            fn write_bytes(&mut self, _: &[u8]) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
        }
        let mut ed = LineEditor::new(Broken);
        assert!(matches!(ed.insert(b'a'), Err(EditError::Sink(_))));
    }
}
