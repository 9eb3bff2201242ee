use std::collections::BTreeSet;

/// Result of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Replacement line.
    pub line: Vec<u8>,
    /// Cursor within `line`.
    pub cursor: usize,
    /// Alternatives to show the user when the completion is ambiguous.
    pub candidates: Vec<String>,
}

/// Pluggable tab completion.
pub trait Completer {
    /// Returns `None` when nothing can be completed at `cursor`.
    fn complete(&mut self, line: &[u8], cursor: usize) -> Option<Completion>;
}

impl<F> Completer for F
where
    F: FnMut(&[u8], usize) -> Option<Completion>,
{
    fn complete(&mut self, line: &[u8], cursor: usize) -> Option<Completion> {
        self(line, cursor)
    }
}

/// Completes identifiers against a fixed table of known symbols.
#[derive(Debug, Clone, Default)]
pub struct SymbolCompleter {
    symbols: BTreeSet<String>,
}

impl SymbolCompleter {
    pub fn new<I, T>(symbols: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<String>) {
        self.symbols.insert(symbol.into());
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

impl Completer for SymbolCompleter {
    fn complete(&mut self, line: &[u8], cursor: usize) -> Option<Completion> {
        let cursor = cursor.min(line.len());
        let word_start = line[..cursor]
            .iter()
            .rposition(|&b| !is_ident(b))
            .map_or(0, |ix| ix + 1);
        let word = std::str::from_utf8(&line[word_start..cursor]).ok()?;
        if word.is_empty() {
            return None;
        }

        let matches: Vec<&String> = self
            .symbols
            .range(word.to_string()..)
            .take_while(|s| s.starts_with(word))
            .collect();
        let (first, rest) = matches.split_first()?;

        let common = rest.iter().fold(first.as_str(), |acc, s| common_prefix(acc, s));
        if common.len() > word.len() {
            let extra = &common.as_bytes()[word.len()..];
            let mut new_line = Vec::with_capacity(line.len() + extra.len());
            new_line.extend_from_slice(&line[..cursor]);
            new_line.extend_from_slice(extra);
            new_line.extend_from_slice(&line[cursor..]);
            return Some(Completion {
                line: new_line,
                cursor: cursor + extra.len(),
                candidates: Vec::new(),
            });
        }

        let candidates = if rest.is_empty() {
            Vec::new()
        } else {
            matches.iter().map(|s| s.to_string()).collect()
        };
        Some(Completion {
            line: line.to_vec(),
            cursor,
            candidates,
        })
    }
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let n = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .last()
        .map_or(0, |((ix, ca), _)| ix + ca.len_utf8());
    &a[..n]
}
