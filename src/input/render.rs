//! Terminal control bytes that bring the displayed line in sync with the buffer.
//!
//! Nothing here can ask the terminal where its cursor is. Every movement is
//! relative and starts from the column the editor believes the cursor is on,
//! so the caller's bookkeeping is the only source of truth.

/// Audible bell, sent for edits that cannot be performed.
pub const BEEP: &[u8] = b"\x07";
/// Moves to the start of a fresh line after a commit.
pub const NEWLINE: &[u8] = b"\r\n";
/// Erase from the cursor to the end of the line.
pub const ERASE_EOL: &[u8] = b"\x1b[K";

/// One repaint of the edited line, expressed in columns relative to where
/// editing started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDiff<'a> {
    /// Column the terminal cursor is currently on.
    pub from: usize,
    /// First column whose content changed.
    pub start: usize,
    /// Column just past the last byte currently on screen.
    pub old_end: usize,
    /// New content from `start` to the end of the line.
    pub tail: &'a [u8],
    /// Column the cursor must end up on.
    pub to: usize,
}

impl<'a> LineDiff<'a> {
    /// Repaint of a whole line, replacing `old_len` displayed bytes.
    pub fn full(from: usize, old_len: usize, line: &'a [u8], to: usize) -> Self {
        Self {
            from,
            start: 0,
            old_end: old_len,
            tail: line,
            to,
        }
    }
}

/// Computes the bytes for a repaint. Pure: equal input gives equal output.
pub fn redraw(diff: &LineDiff<'_>) -> Vec<u8> {
    let mut out = Vec::with_capacity(diff.tail.len() + 16);

    push_move(&mut out, diff.from, diff.start);

    let new_end = diff.start + diff.tail.len();
    if diff.old_end > new_end {
        out.extend_from_slice(ERASE_EOL);
    }

    out.extend_from_slice(diff.tail);
    push_move(&mut out, new_end, diff.to);

    out
}

/// Bytes that move the cursor without touching any content.
pub fn cursor_move(from: usize, to: usize) -> Vec<u8> {
    let mut out = Vec::new();
    push_move(&mut out, from, to);
    out
}

fn push_move(out: &mut Vec<u8>, from: usize, to: usize) {
    match from.cmp(&to) {
        std::cmp::Ordering::Equal => {}
        std::cmp::Ordering::Greater => {
            let n = from - to;
            if n == 1 {
                out.push(b'\x08');
            } else {
                out.extend_from_slice(format!("\x1b[{n}D").as_bytes());
            }
        }
        std::cmp::Ordering::Less => {
            let n = to - from;
            if n == 1 {
                out.extend_from_slice(b"\x1b[C");
            } else {
                out.extend_from_slice(format!("\x1b[{n}C").as_bytes());
            }
        }
    }
}
