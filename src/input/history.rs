use serde::Deserialize;

/// Which committed lines are kept.
///
/// The default keeps every commit, blank lines and repeats included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryPolicy {
    /// Drop lines that are empty or whitespace only.
    pub skip_blank: bool,
    /// Drop a line equal to the newest entry.
    pub dedup_consecutive: bool,
    /// Max number of entries to retain; oldest are dropped first.
    pub max_entries: Option<usize>,
}

/// Committed lines, oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    policy: HistoryPolicy,
}

impl History {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &HistoryPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: HistoryPolicy) {
        self.policy = policy;
        self.trim();
    }

    /// Append a committed line, subject to the policy. Returns whether it was kept.
    pub fn push(&mut self, line: String) -> bool {
        if self.policy.skip_blank && line.trim().is_empty() {
            return false;
        }
        if self.policy.dedup_consecutive && self.entries.last() == Some(&line) {
            return false;
        }
        self.entries.push(line);
        self.trim();
        true
    }

    fn trim(&mut self) {
        if let Some(max) = self.policy.max_entries
            && self.entries.len() > max
        {
            let overflow = self.entries.len() - max;
            self.entries.drain(0..overflow);
        }
    }

    pub fn get(&self, ix: usize) -> Option<&str> {
        self.entries.get(ix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.entries.len().checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
