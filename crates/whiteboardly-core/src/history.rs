//! Linear undo/redo history over surface snapshots.

use crate::error::EngineResult;
use crate::snapshot::Snapshot;
use tiny_skia::Pixmap;

/// Maximum number of snapshots kept by default.
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// A restore requested by undo/redo that has not been painted yet.
///
/// Decoding can happen anywhere; the result may only be applied while its
/// sequence number is still the history's latest.
#[derive(Debug, Clone)]
pub struct PendingRestore {
    seq: u64,
    snapshot: Snapshot,
}

impl PendingRestore {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Decode the snapshot into pixels ready to paint.
    pub fn decode(self) -> EngineResult<DecodedRestore> {
        let pixmap = self.snapshot.decode()?;
        Ok(DecodedRestore { seq: self.seq, pixmap })
    }
}

/// Decoded pixels of a [`PendingRestore`].
#[derive(Debug, Clone)]
pub struct DecodedRestore {
    pub(crate) seq: u64,
    pub(crate) pixmap: Pixmap,
}

impl DecodedRestore {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Snapshot history with a cursor and a redo buffer.
///
/// Invariants: `cursor` is `None` only while `entries` is empty, otherwise it
/// indexes `entries`; `entries.len() <= max_len`.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    cursor: Option<usize>,
    max_len: usize,
    /// Bumped by every commit, undo, redo and reset.
    seq: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl History {
    /// Create an empty history holding at most `max_len` snapshots.
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            redo: Vec::new(),
            cursor: None,
            max_len: max_len.max(1),
            seq: 0,
        }
    }

    /// Record a completed action.
    ///
    /// Committing behind the tail discards the entries after the cursor and
    /// the redo buffer. When the bound is exceeded the oldest entry is evicted.
    pub fn commit(&mut self, snapshot: Snapshot) -> u64 {
        if let Some(cursor) = self.cursor {
            if cursor + 1 < self.entries.len() {
                self.entries.truncate(cursor + 1);
                self.redo.clear();
            }
        }

        self.entries.push(snapshot);
        let mut cursor = self.entries.len() - 1;

        if self.entries.len() > self.max_len {
            self.entries.remove(0);
            cursor -= 1;
            log::debug!("History full, evicted oldest snapshot (max {})", self.max_len);
        }

        self.cursor = Some(cursor);
        self.seq += 1;
        self.seq
    }

    /// Step back one entry.
    ///
    /// Returns the snapshot to repaint, or `None` if already at the first entry.
    pub fn undo(&mut self) -> Option<PendingRestore> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.redo.push(self.entries[cursor].clone());
        self.cursor = Some(cursor - 1);
        self.seq += 1;
        Some(PendingRestore {
            seq: self.seq,
            snapshot: self.entries[cursor - 1].clone(),
        })
    }

    /// Step forward to the most recently undone entry.
    pub fn redo(&mut self) -> Option<PendingRestore> {
        let snapshot = self.redo.pop()?;
        let cursor = self.cursor.map_or(0, |c| c + 1);
        if cursor < self.entries.len() {
            self.entries[cursor] = snapshot.clone();
        } else {
            self.entries.push(snapshot.clone());
        }
        self.cursor = Some(cursor);
        self.seq += 1;
        Some(PendingRestore { seq: self.seq, snapshot })
    }

    /// Replace the whole history with a single entry.
    pub fn reset_with(&mut self, snapshot: Snapshot) -> u64 {
        self.entries.clear();
        self.redo.clear();
        self.entries.push(snapshot);
        self.cursor = Some(0);
        self.seq += 1;
        self.seq
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// The snapshot the cursor points at.
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Sequence number of the latest history change.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether a restore tagged with `seq` is still the latest request.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.seq
    }
}
