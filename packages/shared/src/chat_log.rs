//! Append-only record of rendered chat lines.
//!
//! The log is a plain owned structure: callers that share it across tasks
//! wrap it in a mutex, so every append is totally ordered by that lock.

use std::collections::VecDeque;

use thiserror::Error;

/// Default maximum number of retained entries
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// What to do when an append would exceed the configured capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Refuse the new entry (the log never forgets)
    #[default]
    Reject,
    /// Drop the oldest entry to make room
    EvictOldest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatLogError {
    #[error("chat log is full ({max} entries)")]
    CapacityExceeded { max: usize },
}

/// One appended chat line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub index: usize,
    pub line: String,
    /// Unix timestamp (milliseconds) of the append
    pub logged_at: i64,
}

#[derive(Debug)]
pub struct ChatLog {
    entries: VecDeque<LogEntry>,
    next_index: usize,
    max_entries: usize,
    policy: OverflowPolicy,
}

impl ChatLog {
    /// Create an empty log. A capacity of zero is raised to one.
    pub fn new(max_entries: usize, policy: OverflowPolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            next_index: 0,
            max_entries: max_entries.max(1),
            policy,
        }
    }

    /// Append a line and return its index.
    ///
    /// Indexes start at 0 and grow by one per successful append, also when
    /// older entries have been evicted.
    pub fn append(&mut self, line: impl Into<String>, logged_at: i64) -> Result<usize, ChatLogError> {
        if self.entries.len() >= self.max_entries {
            match self.policy {
                OverflowPolicy::Reject => {
                    return Err(ChatLogError::CapacityExceeded {
                        max: self.max_entries,
                    });
                }
                OverflowPolicy::EvictOldest => {
                    if let Some(evicted) = self.entries.pop_front() {
                        tracing::debug!("Evicted chat log entry #{}", evicted.index);
                    }
                }
            }
        }

        let index = self.next_index;
        self.entries.push_back(LogEntry {
            index,
            line: line.into(),
            logged_at,
        });
        self.next_index += 1;
        Ok(index)
    }

    /// Look up an entry by the index `append` returned.
    ///
    /// Returns `None` for indexes never handed out or already evicted.
    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        let first = self.entries.front()?.index;
        let offset = index.checked_sub(first)?;
        self.entries.get(offset)
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, OverflowPolicy::default())
    }
}
