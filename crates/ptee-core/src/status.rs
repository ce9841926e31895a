//! Per-level context table and commit tracking.
//!
//! The table holds the most recent context line at each level. A context at
//! level L invalidates everything nested deeper (all levels above L are
//! removed) and leaves the broader levels below alone. Gaps are legal: a
//! level that was never filled renders as an empty slot so the composed
//! status keeps a predictable shape.

/// Two spaces between per-level entries in the composed status.
const LEVEL_SEPARATOR: &str = "  ";

#[derive(Debug, Default)]
pub struct StatusModel {
    table: Vec<Option<String>>,
    /// Lowest level not yet promoted to permanent output. Levels below this
    /// were already written above the scroll region and must not repeat.
    committed: usize,
}

impl StatusModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a context line at `level`, dropping all deeper levels.
    pub fn set_context(&mut self, level: usize, text: &str) {
        self.table.truncate(level + 1);
        if self.table.len() <= level {
            self.table.resize(level + 1, None);
        }
        self.table[level] = Some(text.to_string());
        self.committed = self.committed.min(level);
    }

    /// The live status string: every slot from level 0 upward, missing
    /// levels contributing empty strings, joined by the level separator.
    pub fn composed(&self) -> String {
        self.table
            .iter()
            .map(|slot| slot.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(LEVEL_SEPARATOR)
    }

    /// Context lines awaiting promotion, ascending by level.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        let start = self.committed.min(self.table.len());
        self.table[start..].iter().filter_map(|slot| slot.as_deref())
    }

    /// Marks everything currently in the table as promoted.
    pub fn mark_committed(&mut self) {
        self.committed = self.table.len();
    }
}
