//! Achievement rules evaluated against ledger counts.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

const DEFAULT_ACHIEVEMENT_DATA: &str = include_str!("../assets/data/achievements.json");

/// Snapshot of the counters achievement predicates read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressCounts {
    pub likes: u32,
    pub tries: u32,
    pub questions: u32,
    pub streak: u32,
}

/// Threshold predicate over a single progression counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "threshold", rename_all = "lowercase")]
pub enum Rule {
    Likes(u32),
    Tries(u32),
    Questions(u32),
    Streak(u32),
}

impl Rule {
    #[must_use]
    pub const fn is_met(self, counts: &ProgressCounts) -> bool {
        match self {
            Self::Likes(n) => counts.likes >= n,
            Self::Tries(n) => counts.tries >= n,
            Self::Questions(n) => counts.questions >= n,
            Self::Streak(n) => counts.streak >= n,
        }
    }
}

/// One achievement: stable id, display title, point reward, unlock rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub points: u64,
    #[serde(flatten)]
    pub rule: Rule,
}

/// Ordered achievement catalogue. Evaluation order is declaration order, so
/// unlock sequences are stable and reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AchievementList {
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
}

impl AchievementList {
    /// Create an empty list (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load an achievement list from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid list.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the embedded default achievement list.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_ACHIEVEMENT_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AchievementDef> {
        self.achievements.iter().find(|def| def.id == id)
    }

    /// Rules newly satisfied by `counts`, in declaration order.
    ///
    /// `already_unlocked` filters ids that were awarded before; re-running
    /// with unchanged counts therefore yields nothing.
    pub fn newly_satisfied<F>(
        &self,
        counts: &ProgressCounts,
        already_unlocked: F,
    ) -> SmallVec<[&AchievementDef; 2]>
    where
        F: Fn(&str) -> bool,
    {
        self.achievements
            .iter()
            .filter(|def| def.rule.is_met(counts))
            .filter(|def| !already_unlocked(&def.id))
            .collect()
    }
}
