//! High score and chapter-completion persistence
//!
//! The core only talks to a get/set interface; the storage format is owned by
//! the platform collaborator and is limited to JSON-serializable primitives.

use serde::{Deserialize, Serialize};

/// Completion record for one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub chapter_id: u32,
    pub completed: bool,
    pub best_score: u64,
}

/// All persisted progress, as a single serializable value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Progress {
    pub high_score: u64,
    pub chapters: Vec<ChapterRecord>,
}

impl Progress {
    /// Whether a finished run beats the stored high score
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.high_score
    }

    /// Fold a chapter result in: best score is kept, completion is sticky.
    pub fn merge_chapter(&mut self, record: ChapterRecord) {
        match self
            .chapters
            .iter_mut()
            .find(|r| r.chapter_id == record.chapter_id)
        {
            Some(existing) => {
                existing.completed |= record.completed;
                existing.best_score = existing.best_score.max(record.best_score);
            }
            None => self.chapters.push(record),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_default()
    }
}

/// The interface the session persists through. Implemented by the platform
/// layer (LocalStorage, disk, ...); an in-memory version ships for tests and
/// the demo binary.
pub trait ProgressStore {
    fn load(&self) -> Progress;
    fn save(&mut self, progress: &Progress);
}

/// Volatile store used by tests and the demo bin
#[derive(Debug, Default)]
pub struct InMemoryStore {
    progress: Progress,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for InMemoryStore {
    fn load(&self) -> Progress {
        self.progress.clone()
    }

    fn save(&mut self, progress: &Progress) {
        self.progress = progress.clone();
        log::debug!(
            "progress saved: high score {}, {} chapter records",
            progress.high_score,
            progress.chapters.len()
        );
    }
}
